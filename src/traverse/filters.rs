// Query filter tree walker
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};

use super::context::{Shape, TraverseOptions};
use super::visitor::{run_chain, Visitor};
use crate::error::Result;

pub const LOGICAL_OPERATORS: &[&str] = &["$and", "$or", "$not"];

pub const COMPARISON_OPERATORS: &[&str] = &[
    "$eq",
    "$eqi",
    "$ne",
    "$nei",
    "$lt",
    "$lte",
    "$gt",
    "$gte",
    "$in",
    "$notIn",
    "$contains",
    "$notContains",
    "$containsi",
    "$notContainsi",
    "$startsWith",
    "$startsWithi",
    "$endsWith",
    "$endsWithi",
    "$null",
    "$notNull",
    "$between",
];

pub fn is_logical_operator(key: &str) -> bool {
    LOGICAL_OPERATORS.contains(&key)
}

pub fn is_operator(key: &str) -> bool {
    is_logical_operator(key) || COMPARISON_OPERATORS.contains(&key)
}

/// Walk a filter tree with `chain`
///
/// Keys that are not attributes (operators) recurse with the same schema;
/// relation, component and media attributes recurse with their target
/// schema; scalar attributes keep their operator objects untouched.
pub fn traverse_query_filters<'a>(
    chain: &'a [Box<dyn Visitor + 'a>],
    options: TraverseOptions<'a>,
    filters: Value,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        match filters {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(traverse_query_filters(chain, options.clone(), item).await?);
                }
                Ok(Value::Array(out))
            }
            Value::Object(map) => walk_object(chain, options, map).await,
            other => Ok(other),
        }
    }
    .boxed()
}

async fn walk_object<'a>(
    chain: &'a [Box<dyn Visitor + 'a>],
    options: TraverseOptions<'a>,
    map: Map<String, Value>,
) -> Result<Value> {
    let mut out = Map::with_capacity(map.len());

    for (key, value) in map {
        let attribute = options.schema.attribute(&key).cloned();
        let path = options.path.child(&key, attribute.is_some());

        let Some(value) = run_chain(chain, &options, Shape::Filters, &key, attribute.as_ref(), &path, value).await? else {
            continue;
        };

        if value.is_null() {
            out.insert(key, value);
            continue;
        }

        let value = match &attribute {
            None => traverse_query_filters(chain, options.at_path(path), value).await?,
            Some(attribute) if attribute.is_morph_to_relation() => value,
            Some(attribute) => match attribute.target_uid() {
                Some(target) => {
                    let schema = options.models.get_model(target)?;
                    traverse_query_filters(chain, options.descend(&key, Some(attribute), path, schema), value).await?
                }
                None => value,
            },
        };

        out.insert(key, value);
    }

    Ok(Value::Object(out))
}
