use async_trait::async_trait;

use super::Policy;
use crate::error::Result;
use crate::traverse::{Mutation, Shape, VisitContext, Visitor};

/// Keys the walker could not resolve against a schema
///
/// Covers dynamic-zone or morph-to elements whose `__component`/`__type` names
/// no schema the attribute accepts, and sort paths that continue past a scalar
/// attribute. The walker drops those on its own; this visitor lets validate
/// pipelines reject them instead.
pub struct UnresolvedKeys(pub Policy);

#[async_trait]
impl Visitor for UnresolvedKeys {
    fn name(&self) -> &'static str {
        self.0.label("removeUnresolvedKeys", "throwUnresolvedKeys")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        if ctx.shape != Shape::Unresolved {
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
    async fn elements_outside_the_zone_are_dropped() {
        let chain: VisitorChain = vec![Box::new(UnresolvedKeys(Policy::Remove))];
        let result = run(
            Walk::Entity,
            ARTICLE,
            chain,
            json!({
                "blocks": [
                    { "__component": "blocks.quote", "text": "q" },
                    { "__component": "shared.seo", "metaTitle": "m" },
                    { "heading": "no discriminator" }
                ]
            }),
        )
        .await
        .unwrap();

        assert_eq!(result, json!({ "blocks": [{ "__component": "blocks.quote", "text": "q" }] }));
    }

    #[tokio::test]
    async fn validate_names_the_discriminator() {
        let chain: VisitorChain = vec![Box::new(UnresolvedKeys(Policy::Throw))];
        let err = run(Walk::Entity, ARTICLE, chain, json!({ "blocks": [{ "__component": "blocks.nope" }] }))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid key __component");
        let details = &err.as_validation().unwrap().details;
        assert_eq!(details.path.as_deref(), Some("blocks.__component"));
    }

    #[tokio::test]
    async fn sort_past_a_scalar_is_rejected() {
        let chain: VisitorChain = vec![Box::new(UnresolvedKeys(Policy::Throw))];
        let err = run(Walk::Sort, ARTICLE, chain, json!("title.length:asc")).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid key length");
    }
}
