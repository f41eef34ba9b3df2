use async_trait::async_trait;
use serde_json::Value;

use super::Policy;
use crate::error::Result;
use crate::options::RequestOptions;
use crate::schema::WILDCARD;
use crate::traverse::{Mutation, Shape, TraverseOptions, VisitContext, Visitor};

/// Sub-pipelines applied to the query keys of a populate fragment
///
/// `traverse` carries the fragment's target schema. Implementations return
/// the (possibly sanitized) value, or `None` when nothing is left of it.
#[async_trait]
pub trait NestedQueryPipeline: Send + Sync {
    async fn nested_filters(
        &self,
        filters: Value,
        traverse: TraverseOptions<'_>,
        options: &RequestOptions,
    ) -> Result<Option<Value>>;

    async fn nested_sort(&self, sort: Value, traverse: TraverseOptions<'_>, options: &RequestOptions)
        -> Result<Option<Value>>;

    async fn nested_fields(
        &self,
        fields: Value,
        traverse: TraverseOptions<'_>,
        options: &RequestOptions,
    ) -> Result<Option<Value>>;
}

/// Runs `filters`, `sort` and `fields` of a populate fragment through their
/// pipelines with the fragment's target schema
///
/// Under dynamic zones and morph-to relations there is no single target, so
/// those keys (and any nested populate other than `"*"`) are rejected.
pub struct NestedQuery<'a, P: NestedQueryPipeline> {
    pipeline: &'a P,
    options: &'a RequestOptions,
    policy: Policy,
}

impl<'a, P: NestedQueryPipeline> NestedQuery<'a, P> {
    pub fn new(pipeline: &'a P, options: &'a RequestOptions, policy: Policy) -> Self {
        Self {
            pipeline,
            options,
            policy,
        }
    }
}

#[async_trait]
impl<'a, P: NestedQueryPipeline> Visitor for NestedQuery<'a, P> {
    fn name(&self) -> &'static str {
        self.policy.label("sanitizeNestedQuery", "validateNestedQuery")
    }

    async fn visit(&self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        if ctx.shape != Shape::PopulateFragment {
            return Ok(());
        }

        let polymorphic = ctx.parent.map(|parent| parent.is_polymorphic()).unwrap_or(false);
        if polymorphic {
            let rejected = match ctx.key {
                "filters" | "sort" | "fields" => true,
                "populate" => !(ctx.value.is_boolean() || ctx.value.as_str() == Some(WILDCARD)),
                _ => false,
            };
            if rejected {
                return self.policy.apply(ctx, mutation);
            }
            return Ok(());
        }

        let traverse = TraverseOptions {
            schema: ctx.schema.clone(),
            models: ctx.models,
            path: ctx.path.clone(),
            parent: ctx.parent.cloned(),
        };
        let value = ctx.value.clone();

        let result = match ctx.key {
            "filters" => self.pipeline.nested_filters(value, traverse, self.options).await?,
            "sort" => self.pipeline.nested_sort(value, traverse, self.options).await?,
            "fields" => self.pipeline.nested_fields(value, traverse, self.options).await?,
            _ => return Ok(()),
        };

        match result {
            Some(value) if value != *ctx.value => mutation.set(value),
            Some(_) => {}
            None => mutation.remove(),
        }
        Ok(())
    }
}
