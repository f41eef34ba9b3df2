use async_trait::async_trait;
use serde_json::{Map, Value};

use super::Policy;
use crate::error::Result;
use crate::schema::AttributeKind;
use crate::traverse::{Mutation, Shape, VisitContext, Visitor, POPULATE_FRAGMENT_KEYS};

/// Populate keys that cannot be populated
///
/// Map keys must be relation, media, component or dynamic zone attributes.
/// Fragment keys must be one of the nested query keys, and `on` entries must
/// name a component of the dynamic zone (or a known model for morph-to
/// relations).
pub struct NonPopulatable(pub Policy);

impl NonPopulatable {
    async fn visit_on(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        let Some(parent) = ctx.parent.filter(|parent| parent.is_polymorphic()) else {
            return self.0.apply(ctx, mutation);
        };
        let Value::Object(entries) = ctx.value else {
            return self.0.apply(ctx, mutation);
        };

        let mut kept = Map::with_capacity(entries.len());
        for (uid, fragment) in entries {
            let known = match parent.attribute.as_ref().map(|attribute| &attribute.kind) {
                Some(AttributeKind::Dynamiczone { components }) => components.iter().any(|component| component == uid),
                _ => ctx.models.get_model(uid).is_ok(),
            };
            if known {
                kept.insert(uid.clone(), fragment.clone());
            } else if self.0 == Policy::Throw {
                return self.0.reject(uid, ctx, mutation);
            }
        }

        if kept.len() != entries.len() {
            mutation.set(Value::Object(kept));
        }
        Ok(())
    }
}

#[async_trait]
impl Visitor for NonPopulatable {
    fn name(&self) -> &'static str {
        self.0.label("removeNonPopulatable", "throwNonPopulatable")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        match ctx.shape {
            Shape::Populate if ctx.key.is_empty() => Ok(()),
            Shape::Populate => match ctx.attribute {
                Some(attribute) if attribute.is_populatable() => Ok(()),
                _ => self.0.apply(ctx, mutation),
            },
            Shape::PopulateFragment if ctx.key == "on" => self.visit_on(ctx, mutation).await,
            Shape::PopulateFragment if !POPULATE_FRAGMENT_KEYS.contains(&ctx.key) => self.0.apply(ctx, mutation),
            _ => Ok(()),
        }
    }
}
