use async_trait::async_trait;

use super::Policy;
use crate::error::Result;
use crate::traverse::{Mutation, VisitContext, Visitor};

/// Attribute paths outside a permission allow-list
///
/// `None` keeps everything. A path is kept when it is allowed itself, when it
/// sits under an allowed path, or when an allowed path sits under it (so the
/// walker can reach it). Keys that are not attributes are left alone.
pub struct RestrictedFields {
    allowed: Option<Vec<String>>,
    policy: Policy,
}

impl RestrictedFields {
    pub fn new(allowed: Option<Vec<String>>, policy: Policy) -> Self {
        Self { allowed, policy }
    }

    fn is_allowed(allowed: &[String], path: &str) -> bool {
        allowed.iter().any(|field| {
            field == path || is_nested_under(path, field) || is_nested_under(field, path)
        })
    }
}

fn is_nested_under(path: &str, parent: &str) -> bool {
    path.len() > parent.len() && path.starts_with(parent) && path.as_bytes()[parent.len()] == b'.'
}

#[async_trait]
impl Visitor for RestrictedFields {
    fn name(&self) -> &'static str {
        self.policy.label("removeRestrictedFields", "throwRestrictedFields")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        let Some(allowed) = &self.allowed else {
            return Ok(());
        };
        if ctx.attribute.is_none() {
            return Ok(());
        }
        let Some(path) = ctx.path.attribute.as_deref() else {
            return Ok(());
        };

        if !Self::is_allowed(allowed, path) {
            return self.policy.apply(ctx, mutation);
        }
        Ok(())
    }
}
