// Query fields walker: "a,b" strings or arrays of attribute names
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use super::context::{Shape, TraverseOptions};
use super::visitor::{run_chain, Visitor};
use crate::error::Result;

/// Walk a fields selection with `chain`
///
/// Every entry is visited once with its name as both key and value. No
/// recursion: fields only ever select attributes of the current schema.
pub fn traverse_query_fields<'a>(
    chain: &'a [Box<dyn Visitor + 'a>],
    options: TraverseOptions<'a>,
    fields: Value,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        match fields {
            Value::String(fields) => {
                let names = fields.split(',').map(str::trim).filter(|name| !name.is_empty()).map(str::to_string);
                let kept = walk_names(chain, &options, names).await?;
                Ok(Value::String(kept.join(",")))
            }
            Value::Array(items) => {
                let names = items.into_iter().filter_map(|item| match item {
                    Value::String(name) => Some(name),
                    _ => None,
                });
                let kept = walk_names(chain, &options, names).await?;
                Ok(Value::Array(kept.into_iter().map(Value::String).collect()))
            }
            other => Ok(other),
        }
    }
    .boxed()
}

async fn walk_names<'a>(
    chain: &'a [Box<dyn Visitor + 'a>],
    options: &TraverseOptions<'a>,
    names: impl Iterator<Item = String>,
) -> Result<Vec<String>> {
    let mut kept = Vec::new();

    for name in names {
        let attribute = options.schema.attribute(&name).cloned();
        let path = options.path.child(&name, attribute.is_some());
        let value = Value::String(name.clone());

        let Some(value) = run_chain(chain, options, Shape::Fields, &name, attribute.as_ref(), &path, value).await? else {
            continue;
        };
        match value {
            Value::String(name) if !name.is_empty() => kept.push(name),
            _ => {}
        }
    }

    Ok(kept)
}
