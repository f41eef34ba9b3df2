// Sanitize pipelines: silently strip everything the caller may not send or see
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde_json::{Map, Value};

use crate::config::config;
use crate::error::Result;
use crate::extensions::{ExtensionPoint, Extensions};
use crate::options::RequestOptions;
use crate::params::{ExtraParams, ParamSchema, CORE_QUERY_PARAM_KEYS};
use crate::schema::{ModelSource, Schema, DOC_ID_ATTRIBUTE, ID_ATTRIBUTE};
use crate::traverse::{
    traverse_entity, traverse_query_fields, traverse_query_filters, traverse_query_populate, traverse_query_sort,
    TraverseOptions, VisitorChain,
};
use crate::visitors::{
    AdminUserFields, DynamicZones, EmptyObjects, ExpandWildcardPopulate, HiddenFields, MorphToRelations, NestedQuery,
    NestedQueryPipeline, NonPopulatable, NonScalarFields, NonVisibleFields, NonWritableFields, PasswordFields,
    PickAllowedAdminUserFields, Policy, PopulateDepth, PrivateFields, RestrictedFields, RestrictedRelations,
    UnknownFilterKeys, UnrecognizedFields, UnresolvedKeys,
};

const POLICY: Policy = Policy::Remove;

/// Null, blank strings, empty arrays and empty objects carry nothing
pub(crate) fn is_empty_fragment(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn non_empty(value: Value) -> Option<Value> {
    if is_empty_fragment(&value) {
        None
    } else {
        Some(value)
    }
}

/// Sanitize entry points
///
/// Never fails for policy reasons: offending keys are dropped. Errors only
/// come from unknown models or extension sanitizers.
#[derive(Clone)]
pub struct Sanitizers {
    models: Arc<dyn ModelSource>,
    params: Arc<ExtraParams>,
    extensions: Arc<Extensions>,
}

impl Sanitizers {
    pub fn new(models: Arc<dyn ModelSource>, params: Arc<ExtraParams>, extensions: Arc<Extensions>) -> Self {
        Self {
            models,
            params,
            extensions,
        }
    }

    fn traverse(&self, schema: Arc<Schema>) -> TraverseOptions<'_> {
        TraverseOptions::new(schema, self.models.as_ref())
    }

    /// Outbound entity (or list of entities)
    pub async fn output(&self, data: Value, uid: &str, options: &RequestOptions) -> Result<Value> {
        let schema = self.models.get_model(uid)?;
        if config().sanitize.debug_logging {
            tracing::debug!("Sanitizing output for {}", uid);
        }

        match data {
            Value::Array(items) => {
                let sanitized =
                    try_join_all(items.into_iter().map(|item| self.output_entity(item, schema.clone(), options)))
                        .await?;
                Ok(Value::Array(sanitized))
            }
            Value::Null => Ok(Value::Null),
            data => self.output_entity(data, schema, options).await,
        }
    }

    async fn output_entity(&self, data: Value, schema: Arc<Schema>, options: &RequestOptions) -> Result<Value> {
        let mut chain: VisitorChain = vec![
            Box::new(HiddenFields(POLICY)),
            Box::new(NonVisibleFields(POLICY)),
            Box::new(PickAllowedAdminUserFields),
            Box::new(RestrictedFields::new(options.allowed_fields.clone(), POLICY)),
            Box::new(PasswordFields(POLICY)),
            Box::new(PrivateFields(POLICY)),
        ];
        if let Some(auth) = &options.auth {
            chain.push(Box::new(RestrictedRelations::new(auth.clone(), POLICY)));
        }

        let data = traverse_entity(&chain, self.traverse(schema.clone()), data).await?;
        self.extensions.sanitize(ExtensionPoint::Output, data, &schema, options).await
    }

    /// Inbound body (or list of bodies)
    pub async fn input(&self, data: Value, uid: &str, options: &RequestOptions) -> Result<Value> {
        let schema = self.models.get_model(uid)?;
        if config().sanitize.debug_logging {
            tracing::debug!("Sanitizing input for {}", uid);
        }

        match data {
            Value::Array(items) => {
                let sanitized =
                    try_join_all(items.into_iter().map(|item| self.input_entity(item, schema.clone(), options)))
                        .await?;
                Ok(Value::Array(sanitized))
            }
            data => self.input_entity(data, schema, options).await,
        }
    }

    async fn input_entity(&self, data: Value, schema: Arc<Schema>, options: &RequestOptions) -> Result<Value> {
        let Value::Object(mut data) = data else {
            return Ok(data);
        };
        data.retain(|key, _| key != ID_ATTRIBUTE && key != DOC_ID_ATTRIBUTE);

        let extras = self.params.input().applicable(options.route.as_ref());

        let mut chain: VisitorChain = vec![Box::new(NonWritableFields(POLICY)), Box::new(UnresolvedKeys(POLICY))];
        if options.is_strict() {
            chain.push(Box::new(UnrecognizedFields::new(extras.keys().cloned().collect(), POLICY)));
        }
        if let Some(auth) = &options.auth {
            chain.push(Box::new(RestrictedRelations::new(auth.clone(), POLICY)));
        }

        let data = traverse_entity(&chain, self.traverse(schema.clone()), Value::Object(data)).await?;
        let data = self.extensions.sanitize(ExtensionPoint::Input, data, &schema, options).await?;

        Ok(match data {
            Value::Object(data) => Value::Object(parse_extras_or_drop(data, &extras, "input")),
            other => other,
        })
    }

    /// Query string object: `filters`, `sort`, `fields`, `populate`, extras
    pub async fn query(&self, query: Value, uid: &str, options: &RequestOptions) -> Result<Value> {
        let schema = self.models.get_model(uid)?;
        let Value::Object(query) = query else {
            return Ok(query);
        };
        if config().sanitize.debug_logging {
            tracing::debug!("Sanitizing query for {}", uid);
        }

        let mut out = Map::with_capacity(query.len());
        for (key, value) in query {
            let traverse = self.traverse(schema.clone());
            let value = match key.as_str() {
                "filters" => self.filters_in(value, traverse, options).await?,
                "sort" => self.sort_in(value, traverse, options).await?,
                "fields" => self.fields_in(value, traverse, options).await?,
                "populate" => self.populate_in(value, traverse, options).await?,
                _ => Some(value),
            };
            if let Some(value) = value {
                out.insert(key, value);
            }
        }
        clamp_pagination(&mut out);

        let extras = self.params.query().applicable(options.route.as_ref());
        let out = parse_extras_or_drop(out, &extras, "query");
        let out = self.extensions.sanitize(ExtensionPoint::Query, Value::Object(out), &schema, options).await?;

        if !options.is_strict() {
            return Ok(out);
        }
        Ok(match out {
            Value::Object(mut out) => {
                out.retain(|key, _| CORE_QUERY_PARAM_KEYS.contains(&key.as_str()) || extras.contains_key(key));
                Value::Object(out)
            }
            other => other,
        })
    }

    /// `None` when nothing is left of the filters
    pub async fn filters(&self, filters: Value, uid: &str, options: &RequestOptions) -> Result<Option<Value>> {
        let schema = self.models.get_model(uid)?;
        self.filters_in(filters, self.traverse(schema), options).await
    }

    pub async fn sort(&self, sort: Value, uid: &str, options: &RequestOptions) -> Result<Option<Value>> {
        let schema = self.models.get_model(uid)?;
        self.sort_in(sort, self.traverse(schema), options).await
    }

    pub async fn fields(&self, fields: Value, uid: &str, options: &RequestOptions) -> Result<Option<Value>> {
        let schema = self.models.get_model(uid)?;
        self.fields_in(fields, self.traverse(schema), options).await
    }

    pub async fn populate(&self, populate: Value, uid: &str, options: &RequestOptions) -> Result<Option<Value>> {
        let schema = self.models.get_model(uid)?;
        self.populate_in(populate, self.traverse(schema), options).await
    }

    /// Filter/sort chain; both trees follow the same attribute rules
    fn query_tree_chain<'a>(&self, options: &'a RequestOptions) -> VisitorChain<'a> {
        let mut chain: VisitorChain = vec![
            Box::new(UnknownFilterKeys(POLICY)),
            Box::new(HiddenFields(POLICY)),
            Box::new(DynamicZones(POLICY)),
            Box::new(MorphToRelations(POLICY)),
            Box::new(PasswordFields(POLICY)),
            Box::new(PrivateFields(POLICY)),
            Box::new(AdminUserFields(POLICY)),
            Box::new(RestrictedFields::new(options.allowed_fields.clone(), POLICY)),
            Box::new(UnresolvedKeys(POLICY)),
        ];
        if let Some(auth) = &options.auth {
            chain.push(Box::new(RestrictedRelations::new(auth.clone(), POLICY)));
        }
        chain
    }

    async fn filters_in(
        &self,
        filters: Value,
        traverse: TraverseOptions<'_>,
        options: &RequestOptions,
    ) -> Result<Option<Value>> {
        let chain = self.query_tree_chain(options);
        let filters = traverse_query_filters(&chain, traverse.clone(), filters).await?;

        let cleanup: VisitorChain = vec![Box::new(EmptyObjects)];
        let filters = traverse_query_filters(&cleanup, traverse, filters).await?;
        Ok(non_empty(filters))
    }

    async fn sort_in(&self, sort: Value, traverse: TraverseOptions<'_>, options: &RequestOptions) -> Result<Option<Value>> {
        let chain = self.query_tree_chain(options);
        let sort = traverse_query_sort(&chain, traverse.clone(), sort).await?;

        let cleanup: VisitorChain = vec![Box::new(EmptyObjects)];
        let sort = traverse_query_sort(&cleanup, traverse, sort).await?;
        Ok(non_empty(sort))
    }

    async fn fields_in(&self, fields: Value, traverse: TraverseOptions<'_>, options: &RequestOptions) -> Result<Option<Value>> {
        let chain: VisitorChain = vec![
            Box::new(NonScalarFields(POLICY)),
            Box::new(HiddenFields(POLICY)),
            Box::new(PasswordFields(POLICY)),
            Box::new(PrivateFields(POLICY)),
            Box::new(AdminUserFields(POLICY)),
            Box::new(RestrictedFields::new(options.allowed_fields.clone(), POLICY)),
        ];
        let fields = traverse_query_fields(&chain, traverse, fields).await?;
        Ok(non_empty(fields))
    }

    async fn populate_in(
        &self,
        populate: Value,
        traverse: TraverseOptions<'_>,
        options: &RequestOptions,
    ) -> Result<Option<Value>> {
        let mut chain: VisitorChain = vec![Box::new(ExpandWildcardPopulate), Box::new(NonPopulatable(POLICY))];
        if let Some(max) = config().sanitize.max_populate_depth {
            chain.push(Box::new(PopulateDepth::new(max, POLICY)));
        }
        chain.push(Box::new(HiddenFields(POLICY)));
        chain.push(Box::new(PasswordFields(POLICY)));
        chain.push(Box::new(PrivateFields(POLICY)));
        chain.push(Box::new(RestrictedFields::new(options.allowed_fields.clone(), POLICY)));
        if let Some(auth) = &options.auth {
            chain.push(Box::new(RestrictedRelations::new(auth.clone(), POLICY)));
        }
        chain.push(Box::new(NestedQuery::new(self, options, POLICY)));

        let populate = traverse_query_populate(&chain, traverse, populate).await?;
        Ok(non_empty(populate))
    }
}

#[async_trait]
impl NestedQueryPipeline for Sanitizers {
    async fn nested_filters(
        &self,
        filters: Value,
        traverse: TraverseOptions<'_>,
        options: &RequestOptions,
    ) -> Result<Option<Value>> {
        self.filters_in(filters, traverse, options).await
    }

    async fn nested_sort(&self, sort: Value, traverse: TraverseOptions<'_>, options: &RequestOptions) -> Result<Option<Value>> {
        self.sort_in(sort, traverse, options).await
    }

    async fn nested_fields(
        &self,
        fields: Value,
        traverse: TraverseOptions<'_>,
        options: &RequestOptions,
    ) -> Result<Option<Value>> {
        self.fields_in(fields, traverse, options).await
    }
}

/// Replace each present extra key with its normalized value; drop failures
fn parse_extras_or_drop(
    mut data: Map<String, Value>,
    extras: &BTreeMap<String, ParamSchema>,
    category: &str,
) -> Map<String, Value> {
    let mut rejected = Vec::new();
    for (name, schema) in extras {
        let Some(value) = data.get_mut(name) else {
            continue;
        };
        match schema.safe_parse(value) {
            Ok(parsed) => *value = parsed,
            Err(err) => {
                tracing::warn!("Dropping {} param '{}': {}", category, name, err);
                rejected.push(name.as_str());
            }
        }
    }

    if !rejected.is_empty() {
        data.retain(|key, _| !rejected.contains(&key.as_str()));
    }
    data
}

/// Cap `pageSize`/`limit` to the configured maximum
fn clamp_pagination(query: &mut Map<String, Value>) {
    let Some(max) = config().api.rest.max_limit else {
        return;
    };

    let clamp = |map: &mut Map<String, Value>| {
        for key in ["pageSize", "limit"] {
            let Some(value) = map.get_mut(key) else {
                continue;
            };
            let requested = match value {
                Value::Number(number) => number.as_u64(),
                Value::String(text) => text.trim().parse::<u64>().ok(),
                _ => None,
            };
            if requested.map(|requested| requested > max).unwrap_or(false) {
                *value = Value::from(max);
            }
        }
    };

    clamp(query);
    if let Some(Value::Object(pagination)) = query.get_mut("pagination") {
        clamp(pagination);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::testing::{self, deny, ARTICLE, AUTHOR};

    fn sanitizers() -> Sanitizers {
        Sanitizers::new(Arc::new(testing::registry()), Arc::new(ExtraParams::new()), Arc::new(Extensions::new()))
    }

    #[tokio::test]
    async fn output_lists_keep_order() {
        let out = sanitizers()
            .output(
                json!([{ "title": "a", "accessKey": "x" }, { "title": "b", "internalNotes": "x" }]),
                ARTICLE,
                &RequestOptions::new(),
            )
            .await
            .unwrap();
        assert_eq!(out, json!([{ "title": "a" }, { "title": "b" }]));
    }

    #[tokio::test]
    async fn unknown_model_is_an_error() {
        let err = sanitizers().output(json!({}), "api::nope.nope", &RequestOptions::new()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn nested_query_uses_target_schema() {
        let options = RequestOptions::new();
        let populate = sanitizers()
            .populate(
                json!({
                    "author": {
                        "fields": ["name", "internalNotes", "articles"],
                        "filters": { "accessKey": { "$eq": "x" }, "name": { "$eq": "n" } },
                        "sort": "internalNotes:asc"
                    }
                }),
                ARTICLE,
                &options,
            )
            .await
            .unwrap();

        assert_eq!(
            populate,
            Some(json!({
                "author": {
                    "fields": ["name"],
                    "filters": { "name": { "$eq": "n" } }
                }
            }))
        );
    }

    #[tokio::test]
    async fn nested_query_under_dynamic_zone_is_dropped() {
        let populate = sanitizers()
            .populate(json!({ "blocks": { "fields": ["heading"], "populate": "*" } }), ARTICLE, &RequestOptions::new())
            .await
            .unwrap();
        assert_eq!(populate, Some(json!({ "blocks": { "populate": "*" } })));
    }

    #[tokio::test]
    async fn restricted_relations_in_populate() {
        let options = RequestOptions::new().with_auth(deny([AUTHOR]));
        let populate = sanitizers().populate(json!("author,category"), ARTICLE, &options).await.unwrap();
        assert_eq!(populate, Some(json!({ "category": true })));
    }

    #[tokio::test]
    async fn emptied_fragments_are_dropped_from_query() {
        let out = sanitizers()
            .query(
                json!({ "filters": { "internalNotes": { "$eq": "x" } }, "fields": "accessKey", "locale": "en" }),
                ARTICLE,
                &RequestOptions::new().with_strict_params(false),
            )
            .await
            .unwrap();
        assert_eq!(out, json!({ "locale": "en" }));
    }

    #[test]
    fn extras_are_normalized_or_dropped() {
        let extras: BTreeMap<String, ParamSchema> =
            [("rank".to_string(), ParamSchema::integer()), ("preview".to_string(), ParamSchema::boolean())].into();
        let data = json!({ "rank": "7", "preview": "maybe", "other": 1 });
        let Value::Object(data) = data else { unreachable!() };

        assert_eq!(Value::Object(parse_extras_or_drop(data, &extras, "query")), json!({ "rank": 7, "other": 1 }));
    }
}
