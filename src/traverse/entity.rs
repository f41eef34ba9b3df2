// Entity payload walker: attributes, relations, components, dynamic zones, media
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};

use super::context::{Path, Shape, TraverseOptions};
use super::visitor::{run_chain, Visitor};
use crate::error::{Error, Result};
use crate::schema::{Attribute, AttributeKind, Schema, COMPONENT_DISCRIMINATOR, MORPH_DISCRIMINATOR};

/// Relation write operations accepted in place of a plain relation value
const RELATION_OPERATIONS: &[&str] = &["connect", "disconnect", "set"];

/// Walk an entity payload (or an array of them) with `chain`
pub fn traverse_entity<'a>(
    chain: &'a [Box<dyn Visitor + 'a>],
    options: TraverseOptions<'a>,
    data: Value,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        match data {
            Value::Object(map) => walk_object(chain, options, map).await,
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(traverse_entity(chain, options.clone(), item).await?);
                }
                Ok(Value::Array(out))
            }
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

        let Some(value) = run_chain(chain, &options, Shape::Entity, &key, attribute.as_ref(), &path, value).await? else {
            continue;
        };

        let value = match attribute {
            Some(attribute) if !value.is_null() => {
                walk_attribute(chain, &options, &key, &attribute, path, value).await?
            }
            _ => value,
        };

        out.insert(key, value);
    }

    Ok(Value::Object(out))
}

async fn walk_attribute<'a>(
    chain: &'a [Box<dyn Visitor + 'a>],
    options: &TraverseOptions<'a>,
    key: &str,
    attribute: &Attribute,
    path: Path,
    value: Value,
) -> Result<Value> {
    match &attribute.kind {
        AttributeKind::Relation { relation, .. } if relation.is_morph_to() => {
            let walk = |element| {
                walk_discriminated(chain, options, key, attribute, path.clone(), element, MORPH_DISCRIMINATOR)
            };
            if is_relation_operation(&value) {
                return map_operations(value, |targets| map_elements(targets, &walk)).await;
            }
            map_elements(value, &walk).await
        }
        AttributeKind::Relation { .. } | AttributeKind::Media { .. } | AttributeKind::Component { .. } => {
            let Some(target) = attribute.target_uid() else {
                return Ok(value);
            };
            let schema = options.models.get_model(target)?;
            let nested = options.descend(key, Some(attribute), path, schema);

            if attribute.is_relation() && is_relation_operation(&value) {
                return map_operations(value, |targets| traverse_entity(chain, nested.clone(), targets)).await;
            }
            traverse_entity(chain, nested, value).await
        }
        AttributeKind::Dynamiczone { .. } => {
            map_elements(value, |element| {
                walk_discriminated(chain, options, key, attribute, path.clone(), element, COMPONENT_DISCRIMINATOR)
            })
            .await
        }
        _ => Ok(value),
    }
}

/// Schema named by a polymorphic element's discriminator
///
/// `None` when the discriminator is missing, outside the dynamic zone's
/// component list, or unknown to the model source.
fn resolve_discriminated(
    options: &TraverseOptions<'_>,
    attribute: &Attribute,
    element: &Value,
    discriminator: &str,
) -> Result<Option<Arc<Schema>>> {
    let Some(uid) = element.get(discriminator).and_then(Value::as_str) else {
        return Ok(None);
    };
    if let AttributeKind::Dynamiczone { components } = &attribute.kind {
        if !components.iter().any(|component| component == uid) {
            return Ok(None);
        }
    }

    match options.models.get_model(uid) {
        Ok(schema) => Ok(Some(schema)),
        Err(Error::ModelNotFound(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

/// Walk one polymorphic element using the schema named by its discriminator
///
/// Elements without a usable discriminator are shown to the chain as a
/// `Shape::Unresolved` key and then dropped.
fn walk_discriminated<'a>(
    chain: &'a [Box<dyn Visitor + 'a>],
    options: &TraverseOptions<'a>,
    key: &str,
    attribute: &Attribute,
    path: Path,
    element: Value,
    discriminator: &'static str,
) -> BoxFuture<'a, Result<Option<Value>>> {
    let target = resolve_discriminated(options, attribute, &element, discriminator);
    let element_path = path.child(discriminator, false);
    let nested = options.descend(key, Some(attribute), path, options.schema.clone());

    async move {
        match target? {
            Some(schema) => traverse_entity(chain, TraverseOptions { schema, ..nested }, element).await.map(Some),
            None => {
                let tag = element.get(discriminator).cloned().unwrap_or(Value::Null);
                run_chain(chain, &nested, Shape::Unresolved, discriminator, None, &element_path, tag).await?;
                Ok(None)
            }
        }
    }
    .boxed()
}

fn is_relation_operation(value: &Value) -> bool {
    value
        .as_object()
        .map(|map| RELATION_OPERATIONS.iter().any(|op| map.contains_key(*op)))
        .unwrap_or(false)
}

/// `{connect, disconnect, set}`: walk every listed target with `walk`
async fn map_operations<F, Fut>(value: Value, walk: F) -> Result<Value>
where
    F: Fn(Value) -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    let Value::Object(map) = value else {
        return Ok(value);
    };

    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        let value = if RELATION_OPERATIONS.contains(&key.as_str()) {
            walk(value).await?
        } else {
            value
        };
        out.insert(key, value);
    }
    Ok(Value::Object(out))
}

/// Apply `f` to a single value or to each element of an array
///
/// Dropped array elements are left out; a dropped single value becomes `null`.
async fn map_elements<F, Fut>(value: Value, f: F) -> Result<Value>
where
    F: Fn(Value) -> Fut,
    Fut: Future<Output = Result<Option<Value>>>,
{
    match value {
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if let Some(item) = f(item).await? {
                    out.push(item);
                }
            }
            Ok(Value::Array(out))
        }
        other => Ok(f(other).await?.unwrap_or(Value::Null)),
    }
}
