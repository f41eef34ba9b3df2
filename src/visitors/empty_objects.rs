use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::traverse::{Mutation, VisitContext, Visitor};

/// Objects with nothing left in them, however deep
fn is_empty_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.values().all(is_empty_object),
        _ => false,
    }
}

/// Cleanup pass: drop keys whose value emptied out during sanitizing
pub struct EmptyObjects;

#[async_trait]
impl Visitor for EmptyObjects {
    fn name(&self) -> &'static str {
        "removeEmptyObjects"
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        if is_empty_object(ctx.value) {
            mutation.remove();
        }
        Ok(())
    }
}
