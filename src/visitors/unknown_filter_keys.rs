use async_trait::async_trait;

use super::Policy;
use crate::error::Result;
use crate::schema::is_id_attribute;
use crate::traverse::{is_operator, Mutation, Shape, VisitContext, Visitor};

/// Filter keys that are neither attributes, identifiers nor operators
pub struct UnknownFilterKeys(pub Policy);

#[async_trait]
impl Visitor for UnknownFilterKeys {
    fn name(&self) -> &'static str {
        self.0.label("removeUnknownFilterKeys", "throwUnknownFilterKeys")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        if ctx.shape != Shape::Filters {
            return Ok(());
        }
        if ctx.attribute.is_some() || is_id_attribute(ctx.key) || is_operator(ctx.key) {
            return Ok(());
        }
        self.0.apply(ctx, mutation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::testing::ARTICLE;
    use crate::traverse::VisitorChain;
    use crate::visitors::test_support::{run, Walk};

    #[tokio::test]
    async fn drops_unknown_keys_and_operators() {
        let chain: VisitorChain = vec![Box::new(UnknownFilterKeys(Policy::Remove))];
        let result = run(
            Walk::Filters,
            ARTICLE,
            chain,
            json!({
                "id": { "$in": [1, 2] },
                "title": { "$containsi": "a" },
                "$or": [{ "nope": 1 }, { "views": { "$gt": 3 } }],
                "author": { "name": { "$eq": "n" }, "$where": "1=1" },
                "nope": true
            }),
        )
        .await
        .unwrap();

        assert_eq!(
            result,
            json!({
                "id": { "$in": [1, 2] },
                "title": { "$containsi": "a" },
                "$or": [{}, { "views": { "$gt": 3 } }],
                "author": { "name": { "$eq": "n" } }
            })
        );
    }
}
