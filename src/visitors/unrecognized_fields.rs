use async_trait::async_trait;

use super::Policy;
use crate::error::Result;
use crate::traverse::{Mutation, Shape, VisitContext, Visitor};

/// Root keys that are neither attributes nor registered extra params
///
/// Only used in strict mode; nested levels are not checked.
pub struct UnrecognizedFields {
    allowed_extra: Vec<String>,
    policy: Policy,
}

impl UnrecognizedFields {
    pub fn new(allowed_extra: Vec<String>, policy: Policy) -> Self {
        Self { allowed_extra, policy }
    }
}

#[async_trait]
impl Visitor for UnrecognizedFields {
    fn name(&self) -> &'static str {
        self.policy.label("removeUnrecognizedFields", "throwUnrecognizedFields")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        if ctx.shape != Shape::Entity || !ctx.is_root() || ctx.attribute.is_some() {
            return Ok(());
        }
        if self.allowed_extra.iter().any(|key| key == ctx.key) {
            return Ok(());
        }
        self.policy.apply(ctx, mutation)
    }
}
