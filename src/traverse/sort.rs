// Query sort walker: "a:asc,b.c:desc" strings, arrays and nested objects
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};

use super::context::{Shape, TraverseOptions};
use super::visitor::{run_chain, Visitor};
use crate::error::Result;

/// Walk a sort value with `chain`
///
/// String tokens `path[:direction]` are visited with the first path segment
/// as key and the rest of the path (if any) as value, then rebuilt. Entries
/// that end up empty are dropped.
pub fn traverse_query_sort<'a>(
    chain: &'a [Box<dyn Visitor + 'a>],
    options: TraverseOptions<'a>,
    sort: Value,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        match sort {
            Value::String(sort) => Ok(Value::String(walk_string(chain, &options, &sort).await?)),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    let item = traverse_query_sort(chain, options.clone(), item).await?;
                    if !is_empty_sort(&item) {
                        out.push(item);
                    }
                }
                Ok(Value::Array(out))
            }
            Value::Object(map) => walk_object(chain, options, map).await,
            other => Ok(other),
        }
    }
    .boxed()
}

pub(crate) fn is_empty_sort(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

async fn walk_string<'a>(chain: &'a [Box<dyn Visitor + 'a>], options: &TraverseOptions<'a>, sort: &str) -> Result<String> {
    let mut kept = Vec::new();
    for token in sort.split(',').map(str::trim).filter(|token| !token.is_empty()) {
        let (path, direction) = match token.split_once(':') {
            Some((path, direction)) => (path.trim(), Some(direction.trim())),
            None => (token, None),
        };

        let path = walk_path(chain, options.clone(), path.to_string()).await?;
        if path.is_empty() {
            continue;
        }
        kept.push(match direction {
            Some(direction) => format!("{}:{}", path, direction),
            None => path,
        });
    }
    Ok(kept.join(","))
}

/// Visit the first segment of a dotted path, recursing into relation targets
///
/// A remainder under anything without a single target schema is visited as a
/// `Shape::Unresolved` key and the whole path dropped.
fn walk_path<'a>(
    chain: &'a [Box<dyn Visitor + 'a>],
    options: TraverseOptions<'a>,
    path: String,
) -> BoxFuture<'a, Result<String>> {
    async move {
        let (root, rest) = match path.split_once('.') {
            Some((root, rest)) => (root.to_string(), Some(rest.to_string())),
            None => (path.clone(), None),
        };
        if root.is_empty() {
            return Ok(String::new());
        }

        let attribute = options.schema.attribute(&root).cloned();
        let child_path = options.path.child(&root, attribute.is_some());
        let value = rest.map(Value::String).unwrap_or(Value::Null);

        let Some(value) = run_chain(chain, &options, Shape::Sort, &root, attribute.as_ref(), &child_path, value).await? else {
            return Ok(String::new());
        };

        let Some(rest) = value.as_str().map(str::to_string) else {
            return Ok(root);
        };

        let target = attribute
            .as_ref()
            .filter(|attribute| !attribute.is_morph_to_relation())
            .and_then(|attribute| attribute.target_uid().map(|uid| (attribute, uid)));
        let rest = match target {
            Some((attribute, uid)) => {
                let schema = options.models.get_model(uid)?;
                let nested = options.descend(&root, Some(attribute), child_path, schema);
                let rest = walk_path(chain, nested, rest).await?;
                if rest.is_empty() {
                    // Nothing left to sort on inside the relation
                    return Ok(String::new());
                }
                rest
            }
            None => {
                // Nothing to resolve the remainder against
                let key = rest.split('.').next().unwrap_or_default();
                let nested = options.descend(&root, attribute.as_ref(), child_path.clone(), options.schema.clone());
                let path = child_path.child(key, false);
                run_chain(chain, &nested, Shape::Unresolved, key, None, &path, Value::String(rest.clone())).await?;
                return Ok(String::new());
            }
        };

        Ok(format!("{}.{}", root, rest))
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

        let Some(value) = run_chain(chain, &options, Shape::Sort, &key, attribute.as_ref(), &path, value).await? else {
            continue;
        };

        let value = match &attribute {
            Some(attribute) if !value.is_null() && !attribute.is_morph_to_relation() => match attribute.target_uid() {
                Some(target) => {
                    let schema = options.models.get_model(target)?;
                    traverse_query_sort(chain, options.descend(&key, Some(attribute), path, schema), value).await?
                }
                None => value,
            },
            _ => value,
        };

        out.insert(key, value);
    }

    Ok(Value::Object(out))
}
