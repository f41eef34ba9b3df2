use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::schema::{Schema, WILDCARD};
use crate::traverse::{Mutation, Shape, VisitContext, Visitor};

/// Explicit populate map equivalent to `"*"` for `schema`
pub fn expand_wildcard(schema: &Schema) -> Value {
    let expanded: Map<String, Value> = schema
        .populatable_attributes()
        .map(|(name, attribute)| {
            let value = if attribute.is_component() || attribute.is_dynamic_zone() {
                json!({ "populate": WILDCARD })
            } else {
                Value::Bool(true)
            };
            (name.to_string(), value)
        })
        .collect();
    Value::Object(expanded)
}

/// Rewrites `populate: "*"` into one entry per populatable attribute
///
/// Must run first in a populate chain so per-attribute visitors see the
/// expanded keys. Left alone under dynamic zones and morph-to relations,
/// which have no single schema to expand against.
pub struct ExpandWildcardPopulate;

#[async_trait]
impl Visitor for ExpandWildcardPopulate {
    fn name(&self) -> &'static str {
        "expandWildcardPopulate"
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        let applies = match ctx.shape {
            Shape::Populate => ctx.key.is_empty(),
            Shape::PopulateFragment => ctx.key == "populate",
            _ => false,
        };
        if !applies || ctx.value.as_str().map(str::trim) != Some(WILDCARD) {
            return Ok(());
        }
        if ctx.parent.map(|parent| parent.is_polymorphic()).unwrap_or(false) {
            return Ok(());
        }

        mutation.set(expand_wildcard(ctx.schema));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::ARTICLE;
    use crate::traverse::VisitorChain;
    use crate::visitors::test_support::{run, Walk};

    #[tokio::test]
    async fn expands_recursively_through_components() {
        let chain: VisitorChain = vec![Box::new(ExpandWildcardPopulate)];
        let result = run(Walk::Populate, ARTICLE, chain, json!("*")).await.unwrap();

        assert_eq!(
            result,
            json!({
                "seo": { "populate": {} },
                "blocks": { "populate": "*" },
                "author": true,
                "category": true,
                "related": true,
                "cover": true,
                "createdBy": true,
                "updatedBy": true
            })
        );
    }

    #[tokio::test]
    async fn nested_wildcard_uses_target_schema() {
        let chain: VisitorChain = vec![Box::new(ExpandWildcardPopulate)];
        let result = run(Walk::Populate, ARTICLE, chain, json!({ "author": { "populate": "*" } })).await.unwrap();
        assert_eq!(result, json!({ "author": { "populate": { "articles": true } } }));
    }
}
