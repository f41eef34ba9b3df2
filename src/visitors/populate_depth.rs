use async_trait::async_trait;

use super::Policy;
use crate::error::Result;
use crate::traverse::{Mutation, Shape, VisitContext, Visitor};

/// Populated attributes nested deeper than `max` levels
pub struct PopulateDepth {
    max: usize,
    policy: Policy,
}

impl PopulateDepth {
    pub fn new(max: usize, policy: Policy) -> Self {
        Self { max, policy }
    }
}

#[async_trait]
impl Visitor for PopulateDepth {
    fn name(&self) -> &'static str {
        self.policy.label("removePopulateTooDeep", "throwPopulateTooDeep")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        if ctx.shape != Shape::Populate || ctx.attribute.is_none() {
            return Ok(());
        }
        if ctx.path.attribute_depth() > self.max {
            return self.policy.apply(ctx, mutation);
        }
        Ok(())
    }
}
