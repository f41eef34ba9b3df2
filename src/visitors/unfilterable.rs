// Attributes that cannot take part in filters or sorting
use async_trait::async_trait;

use super::Policy;
use crate::error::Result;
use crate::traverse::{Mutation, Shape, VisitContext, Visitor};

fn in_query_tree(ctx: &VisitContext<'_>) -> bool {
    matches!(ctx.shape, Shape::Filters | Shape::Sort)
}

/// Dynamic zones have no single schema to filter or sort on
pub struct DynamicZones(pub Policy);

#[async_trait]
impl Visitor for DynamicZones {
    fn name(&self) -> &'static str {
        self.0.label("removeDynamicZones", "throwDynamicZones")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        match ctx.attribute {
            Some(attribute) if in_query_tree(ctx) && attribute.is_dynamic_zone() => self.0.apply(ctx, mutation),
            _ => Ok(()),
        }
    }
}

/// Morph-to relations have no single target to filter or sort on
pub struct MorphToRelations(pub Policy);

#[async_trait]
impl Visitor for MorphToRelations {
    fn name(&self) -> &'static str {
        self.0.label("removeMorphToRelations", "throwMorphToRelations")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        match ctx.attribute {
            Some(attribute) if in_query_tree(ctx) && attribute.is_morph_to_relation() => self.0.apply(ctx, mutation),
            _ => Ok(()),
        }
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
    async fn removed_from_filters_and_sort() {
        let chain = || -> VisitorChain { vec![Box::new(DynamicZones(Policy::Remove)), Box::new(MorphToRelations(Policy::Remove))] };

        let filters = run(
            Walk::Filters,
            ARTICLE,
            chain(),
            json!({ "blocks": { "heading": "h" }, "related": { "id": 1 }, "title": "t" }),
        )
        .await
        .unwrap();
        assert_eq!(filters, json!({ "title": "t" }));

        let sort = run(Walk::Sort, ARTICLE, chain(), json!("blocks.heading:asc,related:desc,title")).await.unwrap();
        assert_eq!(sort, json!("title"));
    }

    #[tokio::test]
    async fn entities_are_untouched() {
        let chain: VisitorChain = vec![Box::new(DynamicZones(Policy::Throw))];
        let data = json!({ "blocks": [] });
        assert_eq!(run(Walk::Entity, ARTICLE, chain, data.clone()).await.unwrap(), data);
    }
}
