// Validate pipelines: same walks as sanitize, but the first violation aborts
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::config;
use crate::error::{ErrorSource, Result, ValidationError};
use crate::extensions::{ExtensionPoint, Extensions};
use crate::options::RequestOptions;
use crate::params::{ExtraParams, ParamSchema, CORE_QUERY_PARAM_KEYS, PAGINATION_KEYS, STATUS_VALUES};
use crate::schema::{ModelSource, Schema, DOC_ID_ATTRIBUTE, ID_ATTRIBUTE};
use crate::traverse::{
    traverse_entity, traverse_query_fields, traverse_query_filters, traverse_query_populate, traverse_query_sort,
    TraverseOptions, VisitorChain,
};
use crate::visitors::{
    AdminUserFields, DynamicZones, ExpandWildcardPopulate, HiddenFields, MorphToRelations, NestedQuery,
    NestedQueryPipeline, NonPopulatable, NonScalarFields, NonWritableFields, PasswordFields, Policy, PopulateDepth,
    PrivateFields, RestrictedFields, RestrictedRelations, UnknownFilterKeys, UnrecognizedFields, UnresolvedKeys,
};

const POLICY: Policy = Policy::Throw;

/// Validate entry points; `Ok(())` means the payload would pass sanitize untouched
#[derive(Clone)]
pub struct Validators {
    models: Arc<dyn ModelSource>,
    params: Arc<ExtraParams>,
    extensions: Arc<Extensions>,
}

impl Validators {
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

    pub async fn input(&self, data: &Value, uid: &str, options: &RequestOptions) -> Result<()> {
        let schema = self.models.get_model(uid)?;

        match data {
            Value::Array(items) => {
                for item in items {
                    self.input_entity(item, schema.clone(), options).await?;
                }
                Ok(())
            }
            data => self.input_entity(data, schema, options).await,
        }
    }

    async fn input_entity(&self, data: &Value, schema: Arc<Schema>, options: &RequestOptions) -> Result<()> {
        let Value::Object(body) = data else {
            return Ok(());
        };

        for key in [ID_ATTRIBUTE, DOC_ID_ATTRIBUTE] {
            if body.contains_key(key) {
                return Err(rejected(key, ErrorSource::Body));
            }
        }

        let extras = self.params.input().applicable(options.route.as_ref());

        let mut chain: VisitorChain = vec![Box::new(NonWritableFields(POLICY)), Box::new(UnresolvedKeys(POLICY))];
        if options.is_strict() {
            chain.push(Box::new(UnrecognizedFields::new(extras.keys().cloned().collect(), POLICY)));
        }
        if let Some(auth) = &options.auth {
            chain.push(Box::new(RestrictedRelations::new(auth.clone(), POLICY)));
        }

        traverse_entity(&chain, self.traverse(schema.clone()), data.clone())
            .await
            .map_err(|err| err.tag(ErrorSource::Body, None))?;
        self.extensions
            .validate(ExtensionPoint::Input, data, &schema, options)
            .await
            .map_err(|err| err.tag(ErrorSource::Body, None))?;

        check_extras(body, &extras, ErrorSource::Body)
    }

    pub async fn query(&self, query: &Value, uid: &str, options: &RequestOptions) -> Result<()> {
        let schema = self.models.get_model(uid)?;
        let Value::Object(params) = query else {
            return Ok(());
        };

        let extras = self.params.query().applicable(options.route.as_ref());
        if options.is_strict() {
            if let Some(key) = params
                .keys()
                .find(|key| !CORE_QUERY_PARAM_KEYS.contains(&key.as_str()) && !extras.contains_key(*key))
            {
                return Err(rejected(key, ErrorSource::Query));
            }
        }

        for (key, value) in params {
            let traverse = self.traverse(schema.clone());
            let result = match key.as_str() {
                "filters" => self.filters_in(value.clone(), traverse, options).await,
                "sort" => self.sort_in(value.clone(), traverse, options).await,
                "fields" => self.fields_in(value.clone(), traverse, options).await,
                "populate" => self.populate_in(value.clone(), traverse, options).await,
                _ => continue,
            };
            result.map_err(|err| err.tag(ErrorSource::Query, Some(key.as_str())))?;
        }

        check_pagination(params)?;
        if let Some(status) = params.get("status") {
            if !status.as_str().map(|status| STATUS_VALUES.contains(&status)).unwrap_or(false) {
                return Err(invalid_value("status", format!("status must be one of: {}", STATUS_VALUES.join(", "))));
            }
        }

        check_extras(params, &extras, ErrorSource::Query)?;
        self.extensions
            .validate(ExtensionPoint::Query, query, &schema, options)
            .await
            .map_err(|err| err.tag(ErrorSource::Query, None))
    }

    pub async fn filters(&self, filters: &Value, uid: &str, options: &RequestOptions) -> Result<()> {
        let schema = self.models.get_model(uid)?;
        self.filters_in(filters.clone(), self.traverse(schema), options).await.map(drop)
    }

    pub async fn sort(&self, sort: &Value, uid: &str, options: &RequestOptions) -> Result<()> {
        let schema = self.models.get_model(uid)?;
        self.sort_in(sort.clone(), self.traverse(schema), options).await.map(drop)
    }

    pub async fn fields(&self, fields: &Value, uid: &str, options: &RequestOptions) -> Result<()> {
        let schema = self.models.get_model(uid)?;
        self.fields_in(fields.clone(), self.traverse(schema), options).await.map(drop)
    }

    pub async fn populate(&self, populate: &Value, uid: &str, options: &RequestOptions) -> Result<()> {
        let schema = self.models.get_model(uid)?;
        self.populate_in(populate.clone(), self.traverse(schema), options).await.map(drop)
    }

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

    async fn filters_in(&self, filters: Value, traverse: TraverseOptions<'_>, options: &RequestOptions) -> Result<Value> {
        let chain = self.query_tree_chain(options);
        traverse_query_filters(&chain, traverse, filters).await
    }

    async fn sort_in(&self, sort: Value, traverse: TraverseOptions<'_>, options: &RequestOptions) -> Result<Value> {
        let chain = self.query_tree_chain(options);
        traverse_query_sort(&chain, traverse, sort).await
    }

    async fn fields_in(&self, fields: Value, traverse: TraverseOptions<'_>, options: &RequestOptions) -> Result<Value> {
        let chain: VisitorChain = vec![
            Box::new(NonScalarFields(POLICY)),
            Box::new(HiddenFields(POLICY)),
            Box::new(PasswordFields(POLICY)),
            Box::new(PrivateFields(POLICY)),
            Box::new(AdminUserFields(POLICY)),
            Box::new(RestrictedFields::new(options.allowed_fields.clone(), POLICY)),
        ];
        traverse_query_fields(&chain, traverse, fields).await
    }

    async fn populate_in(&self, populate: Value, traverse: TraverseOptions<'_>, options: &RequestOptions) -> Result<Value> {
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

        traverse_query_populate(&chain, traverse, populate).await
    }
}

// Nested values come back untouched; a violation surfaces as an error instead
#[async_trait]
impl NestedQueryPipeline for Validators {
    async fn nested_filters(
        &self,
        filters: Value,
        traverse: TraverseOptions<'_>,
        options: &RequestOptions,
    ) -> Result<Option<Value>> {
        self.filters_in(filters.clone(), traverse, options).await?;
        Ok(Some(filters))
    }

    async fn nested_sort(&self, sort: Value, traverse: TraverseOptions<'_>, options: &RequestOptions) -> Result<Option<Value>> {
        self.sort_in(sort.clone(), traverse, options).await?;
        Ok(Some(sort))
    }

    async fn nested_fields(
        &self,
        fields: Value,
        traverse: TraverseOptions<'_>,
        options: &RequestOptions,
    ) -> Result<Option<Value>> {
        self.fields_in(fields.clone(), traverse, options).await?;
        Ok(Some(fields))
    }
}

fn rejected(key: &str, source: ErrorSource) -> crate::error::Error {
    ValidationError::invalid_key(key, Some(key)).with_source(source).into()
}

fn invalid_value(key: &str, message: String) -> crate::error::Error {
    ValidationError::new(message)
        .with_key(key)
        .with_source(ErrorSource::Query)
        .with_param(key)
        .into()
}

fn check_extras(data: &Map<String, Value>, extras: &BTreeMap<String, ParamSchema>, source: ErrorSource) -> Result<()> {
    for (name, schema) in extras {
        let Some(value) = data.get(name) else {
            continue;
        };
        if let Err(err) = schema.safe_parse(value) {
            tracing::warn!("Rejected {:?} param '{}': {}", source, name, err);
            let error = ValidationError::new(format!("Invalid value for {}: {}", name, err))
                .with_key(name.as_str())
                .with_source(source)
                .with_param(name.as_str());
            return Err(error.into());
        }
    }
    Ok(())
}

/// Pagination keys must be non-negative integers within `max_limit`
fn check_pagination(params: &Map<String, Value>) -> Result<()> {
    let check = |map: &Map<String, Value>| -> Result<()> {
        for key in PAGINATION_KEYS {
            let Some(value) = map.get(*key) else {
                continue;
            };
            let parsed = match value {
                Value::Number(number) => number.as_u64(),
                Value::String(text) => text.trim().parse::<u64>().ok(),
                _ => None,
            };
            let Some(parsed) = parsed else {
                return Err(invalid_value(key, format!("{} must be a non-negative integer", key)));
            };

            let capped = matches!(*key, "pageSize" | "limit");
            if let Some(max) = config().api.rest.max_limit.filter(|_| capped) {
                if parsed > max {
                    return Err(invalid_value(key, format!("{} must not exceed {}", key, max)));
                }
            }
        }
        Ok(())
    };

    check(params)?;
    match params.get("pagination") {
        Some(Value::Object(pagination)) => check(pagination),
        Some(_) => Err(invalid_value("pagination", "pagination must be an object".to_string())),
        None => Ok(()),
    }
}
