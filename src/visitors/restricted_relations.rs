use async_trait::async_trait;
use serde_json::Value;

use super::Policy;
use crate::error::Result;
use crate::permissions::Auth;
use crate::schema::{CREATED_BY_ATTRIBUTE, MORPH_DISCRIMINATOR, UPDATED_BY_ATTRIBUTE};
use crate::traverse::{Mutation, Shape, VisitContext, Visitor};

/// Relations and media whose target the caller may not read
///
/// The whole relation goes, not just its sub-fields. Morph-to values are
/// filtered element by element using each element's `__type`.
pub struct RestrictedRelations {
    auth: Auth,
    policy: Policy,
}

impl RestrictedRelations {
    pub fn new(auth: Auth, policy: Policy) -> Self {
        Self { auth, policy }
    }

    async fn visit_morph_to(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        // Populate/filter values carry no element types to check
        if ctx.shape != Shape::Entity {
            return Ok(());
        }

        let elements = match ctx.value {
            Value::Array(items) => items.as_slice(),
            Value::Object(_) => std::slice::from_ref(ctx.value),
            _ => return Ok(()),
        };

        let mut kept = Vec::with_capacity(elements.len());
        for element in elements {
            let readable = match element.get(MORPH_DISCRIMINATOR).and_then(Value::as_str) {
                Some(target) => self.auth.can_read(target).await,
                None => true,
            };
            if readable {
                kept.push(element.clone());
            } else if self.policy == Policy::Throw {
                return self.policy.apply(ctx, mutation);
            }
        }

        if kept.len() != elements.len() {
            match ctx.value {
                Value::Array(_) => mutation.set(Value::Array(kept)),
                _ => mutation.remove(),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Visitor for RestrictedRelations {
    fn name(&self) -> &'static str {
        self.policy.label("removeRestrictedRelations", "throwRestrictedRelations")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        let Some(attribute) = ctx.attribute else {
            return Ok(());
        };
        if !attribute.is_relation() && !attribute.is_media() {
            return Ok(());
        }

        let is_creator_field = ctx.key == CREATED_BY_ATTRIBUTE || ctx.key == UPDATED_BY_ATTRIBUTE;
        if is_creator_field && ctx.schema.options.populate_creator_fields {
            return Ok(());
        }

        if attribute.is_morph_to_relation() {
            return self.visit_morph_to(ctx, mutation).await;
        }

        let Some(target) = attribute.target_uid() else {
            return Ok(());
        };
        if !self.auth.can_read(target).await {
            return self.policy.apply(ctx, mutation);
        }
        Ok(())
    }
}
