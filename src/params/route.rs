use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::schema::ParamSchema;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Predicate deciding whether an extra param applies to a route
pub type RouteMatcher = Arc<dyn Fn(&Route) -> bool + Send + Sync>;

/// Route descriptor handed over by the routing layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub method: String,
    pub path: String,
    /// Controller action, e.g. `api::article.article.find`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RouteRequest>,
}

/// Parameter schemas a route declares
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<BTreeMap<String, ParamSchema>>,
    /// Body schema per content type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BTreeMap<String, ParamSchema>>,
}

impl Route {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into().to_uppercase(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = Some(handler.into());
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, schema: ParamSchema) -> Self {
        self.request
            .get_or_insert_with(RouteRequest::default)
            .query
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), schema);
        self
    }

    pub fn with_json_body(mut self, schema: ParamSchema) -> Self {
        self.request
            .get_or_insert_with(RouteRequest::default)
            .body
            .get_or_insert_with(BTreeMap::new)
            .insert(JSON_CONTENT_TYPE.to_string(), schema);
        self
    }

    /// Query params declared on the route
    pub fn query_params(&self) -> impl Iterator<Item = (&String, &ParamSchema)> {
        self.request
            .iter()
            .filter_map(|request| request.query.as_ref())
            .flat_map(|query| query.iter())
    }

    /// Properties of the JSON body object schema, if the route declares one
    pub fn body_params(&self) -> impl Iterator<Item = (&String, &ParamSchema)> {
        self.json_body()
            .into_iter()
            .filter_map(|schema| match schema {
                ParamSchema::Object { properties, .. } => Some(properties.iter()),
                _ => None,
            })
            .flatten()
    }

    pub fn json_body(&self) -> Option<&ParamSchema> {
        self.request.as_ref()?.body.as_ref()?.get(JSON_CONTENT_TYPE)
    }

    pub(crate) fn json_body_mut(&mut self) -> Option<&mut ParamSchema> {
        self.request.as_mut()?.body.as_mut()?.get_mut(JSON_CONTENT_TYPE)
    }

    pub fn is_read(&self) -> bool {
        matches!(self.method.as_str(), "GET" | "HEAD")
    }
}
