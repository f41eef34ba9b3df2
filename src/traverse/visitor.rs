use async_trait::async_trait;
use serde_json::Value;

use super::context::{Path, Shape, TraverseOptions, VisitContext};
use crate::error::Result;
use crate::schema::Attribute;

/// Policy unit invoked for every key the walker meets
///
/// Visitors never hold per-request mutable state; they only act on the
/// `Mutation` handle for the key being visited. Returning an error aborts
/// the whole traversal (validate pipelines).
#[async_trait]
pub trait Visitor: Send + Sync {
    /// Visitor name for logging and debugging
    fn name(&self) -> &'static str;

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()>;
}

/// Ordered visitor list; order is part of each pipeline's contract
pub type VisitorChain<'a> = Vec<Box<dyn Visitor + 'a>>;

#[derive(Debug, Clone, PartialEq)]
enum KeyAction {
    Remove,
    Set(Value),
}

/// Mutation handle for the key currently being visited
#[derive(Debug, Default)]
pub struct Mutation {
    action: Option<KeyAction>,
}

impl Mutation {
    /// Drop the key from the output; remaining visitors are skipped
    pub fn remove(&mut self) {
        self.action = Some(KeyAction::Remove);
    }

    /// Replace the value for the remaining visitors and the output
    pub fn set(&mut self, value: Value) {
        self.action = Some(KeyAction::Set(value));
    }

    pub fn is_removed(&self) -> bool {
        matches!(self.action, Some(KeyAction::Remove))
    }
}

/// Run every visitor of the chain on one key
///
/// Returns `None` when a visitor removed the key, otherwise the (possibly
/// replaced) value.
pub(crate) async fn run_chain(
    chain: &[Box<dyn Visitor + '_>],
    options: &TraverseOptions<'_>,
    shape: Shape,
    key: &str,
    attribute: Option<&Attribute>,
    path: &Path,
    value: Value,
) -> Result<Option<Value>> {
    let mut current = value;

    for visitor in chain {
        let mut mutation = Mutation::default();
        {
            let ctx = VisitContext {
                key,
                value: &current,
                attribute,
                schema: &options.schema,
                path,
                parent: options.parent.as_ref(),
                shape,
                models: options.models,
            };
            visitor.visit(&ctx, &mut mutation).await?;
        }

        match mutation.action {
            Some(KeyAction::Remove) => {
                if crate::config::CONFIG.sanitize.debug_logging {
                    tracing::debug!(
                        "Visitor {} removed '{}' ({:?}) in {}",
                        visitor.name(),
                        path.raw.as_deref().unwrap_or(key),
                        shape,
                        options.schema.uid
                    );
                }
                return Ok(None);
            }
            Some(KeyAction::Set(value)) => current = value,
            None => {}
        }
    }

    Ok(Some(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::schema::{Schema, SchemaRegistry};

    struct Upper;

    #[async_trait]
    impl Visitor for Upper {
        fn name(&self) -> &'static str {
            "upper"
        }

        async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
            if let Some(text) = ctx.value.as_str() {
                mutation.set(json!(text.to_uppercase()));
            }
            Ok(())
        }
    }

    struct DropUpper;

    #[async_trait]
    impl Visitor for DropUpper {
        fn name(&self) -> &'static str {
            "dropUpper"
        }

        async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
            if ctx.value.as_str().map(|s| s.chars().all(|c| c.is_uppercase())).unwrap_or(false) {
                mutation.remove();
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn set_is_visible_to_later_visitors() {
        let registry = SchemaRegistry::new();
        let options = TraverseOptions::new(Arc::new(Schema::content_type("api::a.a")), &registry);
        let chain: VisitorChain = vec![Box::new(Upper), Box::new(DropUpper)];

        let result = run_chain(&chain, &options, Shape::Entity, "k", None, &Path::root(), json!("abc"))
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn untouched_value_passes_through() {
        let registry = SchemaRegistry::new();
        let options = TraverseOptions::new(Arc::new(Schema::content_type("api::a.a")), &registry);
        let chain: VisitorChain = vec![Box::new(DropUpper)];

        let result = run_chain(&chain, &options, Shape::Entity, "k", None, &Path::root(), json!(1))
            .await
            .unwrap();
        assert_eq!(result, Some(json!(1)));
    }
}
