// Query populate walker: wildcard, dotted strings, arrays and nested fragments
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};

use super::context::{Path, Shape, TraverseOptions};
use super::visitor::{run_chain, Visitor};
use crate::error::Result;
use crate::schema::{Attribute, WILDCARD};

/// Keys allowed inside a nested populate query
pub const POPULATE_FRAGMENT_KEYS: &[&str] = &["fields", "filters", "sort", "populate", "on", "count"];

/// Walk a populate value with `chain`
///
/// The whole value is visited first under the empty key so that wildcard
/// expansion runs before any per-attribute visitor. Returns `Value::Null`
/// when a visitor removed the root.
pub fn traverse_query_populate<'a>(
    chain: &'a [Box<dyn Visitor + 'a>],
    options: TraverseOptions<'a>,
    populate: Value,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        let root_path = options.path.clone();
        let Some(populate) = run_chain(chain, &options, Shape::Populate, "", None, &root_path, populate).await? else {
            return Ok(Value::Null);
        };
        populate_value(chain, options, populate).await
    }
    .boxed()
}

/// Normalize `"a,b.c"` strings and arrays into the object form
///
/// `"*"` and booleans are returned unchanged.
pub fn normalize_populate(value: Value) -> Value {
    match value {
        Value::String(text) if text.trim() == WILDCARD => Value::String(text),
        Value::String(text) => {
            let mut map = Map::new();
            insert_paths(&mut map, &text);
            Value::Object(map)
        }
        Value::Array(items) => {
            let mut map = Map::new();
            for item in items {
                match item {
                    Value::String(text) => insert_paths(&mut map, &text),
                    Value::Object(entries) => {
                        for (key, value) in entries {
                            map.insert(key, value);
                        }
                    }
                    _ => {}
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

fn insert_paths(map: &mut Map<String, Value>, text: &str) {
    for token in text.split(',').map(str::trim).filter(|token| !token.is_empty()) {
        let segments: Vec<&str> = token.split('.').filter(|segment| !segment.is_empty()).collect();
        insert_dotted(map, &segments);
    }
}

fn insert_dotted(map: &mut Map<String, Value>, segments: &[&str]) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        // A deeper path for the same key already implies populating it
        if !map.get(*head).map(Value::is_object).unwrap_or(false) {
            map.insert(head.to_string(), Value::Bool(true));
        }
        return;
    }

    let entry = map.entry(head.to_string()).or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    let Some(fragment) = entry.as_object_mut() else {
        return;
    };

    let nested = fragment.entry("populate").or_insert_with(|| Value::Object(Map::new()));
    if !nested.is_object() {
        *nested = Value::Object(Map::new());
    }
    if let Some(nested) = nested.as_object_mut() {
        insert_dotted(nested, rest);
    }
}

fn populate_value<'a>(
    chain: &'a [Box<dyn Visitor + 'a>],
    options: TraverseOptions<'a>,
    value: Value,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        match normalize_populate(value) {
            Value::Object(map) => populate_map(chain, options, map).await,
            other => Ok(other),
        }
    }
    .boxed()
}

async fn populate_map<'a>(
    chain: &'a [Box<dyn Visitor + 'a>],
    options: TraverseOptions<'a>,
    map: Map<String, Value>,
) -> Result<Value> {
    let mut out = Map::with_capacity(map.len());

    for (key, value) in map {
        let attribute = options.schema.attribute(&key).cloned();
        let path = options.path.child(&key, attribute.is_some());

        let Some(value) = run_chain(chain, &options, Shape::Populate, &key, attribute.as_ref(), &path, value).await? else {
            continue;
        };

        let value = match (&attribute, value) {
            (Some(attribute), Value::Object(fragment)) if attribute.is_populatable() => {
                let nested = fragment_options(&options, &key, attribute, path)?;
                walk_fragment(chain, nested, fragment).await?
            }
            (_, value) => value,
        };

        out.insert(key, value);
    }

    Ok(Value::Object(out))
}

/// Options for the fragment under `key`
///
/// Dynamic zones and morph-to relations have no single target schema; their
/// fragment keys are visited against the current schema instead.
fn fragment_options<'a>(
    options: &TraverseOptions<'a>,
    key: &str,
    attribute: &Attribute,
    path: Path,
) -> Result<TraverseOptions<'a>> {
    let schema = match attribute.target_uid() {
        Some(target) if !attribute.is_morph_to_relation() => options.models.get_model(target)?,
        _ => options.schema.clone(),
    };
    Ok(options.descend(key, Some(attribute), path, schema))
}

fn walk_fragment<'a>(
    chain: &'a [Box<dyn Visitor + 'a>],
    options: TraverseOptions<'a>,
    fragment: Map<String, Value>,
) -> BoxFuture<'a, Result<Value>> {
    async move {
        let polymorphic = options.parent.as_ref().map(|parent| parent.is_polymorphic()).unwrap_or(false);
        let mut out = Map::with_capacity(fragment.len());

        for (key, value) in fragment {
            let path = options.path.child(&key, false);

            let Some(value) = run_chain(chain, &options, Shape::PopulateFragment, &key, None, &path, value).await? else {
                continue;
            };

            let value = match key.as_str() {
                "populate" if !polymorphic => populate_value(chain, options.at_path(path), value).await?,
                "on" => walk_on(chain, &options, path, value).await?,
                _ => value,
            };

            out.insert(key, value);
        }

        Ok(Value::Object(out))
    }
    .boxed()
}

/// `on: {uid: fragment}`: every entry is walked with the schema named by its key
async fn walk_on<'a>(
    chain: &'a [Box<dyn Visitor + 'a>],
    options: &TraverseOptions<'a>,
    path: Path,
    value: Value,
) -> Result<Value> {
    let Value::Object(entries) = value else {
        return Ok(value);
    };

    let mut out = Map::with_capacity(entries.len());
    for (uid, fragment) in entries {
        let fragment = match fragment {
            Value::Object(fragment) => {
                let schema = options.models.get_model(&uid)?;
                let nested = options.descend(&uid, None, path.child(&uid, false), schema);
                walk_fragment(chain, nested, fragment).await?
            }
            other => other,
        };
        out.insert(uid, fragment);
    }
    Ok(Value::Object(out))
}
