// Extra-parameter registry: bootstrap-time registration, frozen afterwards
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::RegistryError;
use super::route::{Route, RouteMatcher};
use super::schema::ParamSchema;
use super::{CORE_QUERY_PARAM_KEYS, RESERVED_INPUT_PARAM_KEYS};

pub type SchemaFactory = Arc<dyn Fn() -> ParamSchema + Send + Sync>;

/// Where a declared param gets its schema from
#[derive(Clone)]
pub enum SchemaSource {
    Schema(ParamSchema),
    /// Built lazily at registration time
    Factory(SchemaFactory),
}

impl SchemaSource {
    fn resolve(&self) -> ParamSchema {
        match self {
            SchemaSource::Schema(schema) => schema.clone(),
            SchemaSource::Factory(factory) => factory(),
        }
    }
}

impl From<ParamSchema> for SchemaSource {
    fn from(schema: ParamSchema) -> Self {
        SchemaSource::Schema(schema)
    }
}

/// A param as handed to `add_query_params` / `add_input_params`
#[derive(Clone)]
pub struct ParamDeclaration {
    pub name: String,
    pub schema: SchemaSource,
    pub match_route: Option<RouteMatcher>,
}

impl ParamDeclaration {
    pub fn new(name: impl Into<String>, schema: impl Into<SchemaSource>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            match_route: None,
        }
    }

    pub fn with_factory<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> ParamSchema + Send + Sync + 'static,
    {
        Self::new(name, SchemaSource::Factory(Arc::new(factory)))
    }

    pub fn match_route<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&Route) -> bool + Send + Sync + 'static,
    {
        self.match_route = Some(Arc::new(matcher));
        self
    }
}

/// A registered extra param
#[derive(Clone)]
pub struct ExtraParam {
    pub name: String,
    pub schema: ParamSchema,
    pub match_route: Option<RouteMatcher>,
}

impl ExtraParam {
    /// Params without a matcher apply everywhere
    pub fn applies_to(&self, route: &Route) -> bool {
        self.match_route.as_ref().map(|matcher| matcher(route)).unwrap_or(true)
    }
}

impl fmt::Debug for ExtraParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtraParam")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("match_route", &self.match_route.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamCategory {
    Query,
    Input,
}

impl fmt::Display for ParamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamCategory::Query => write!(f, "query"),
            ParamCategory::Input => write!(f, "input"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Empty,
    Registering,
    Frozen,
}

/// Registered params of one category, in registration order
#[derive(Debug)]
pub struct ParamRegistry {
    category: ParamCategory,
    state: RegistryState,
    params: Vec<ExtraParam>,
}

impl ParamRegistry {
    pub fn new(category: ParamCategory) -> Self {
        Self {
            category,
            state: RegistryState::Empty,
            params: Vec::new(),
        }
    }

    pub fn category(&self) -> ParamCategory {
        self.category
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    pub fn params(&self) -> &[ExtraParam] {
        &self.params
    }

    pub fn get(&self, name: &str) -> Option<&ExtraParam> {
        self.params.iter().find(|param| param.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn is_reserved(&self, name: &str) -> bool {
        match self.category {
            ParamCategory::Query => RESERVED_INPUT_PARAM_KEYS.contains(&name) || CORE_QUERY_PARAM_KEYS.contains(&name),
            ParamCategory::Input => RESERVED_INPUT_PARAM_KEYS.contains(&name),
        }
    }

    /// Register a batch; nothing is appended unless the whole batch is valid
    pub fn add(&mut self, entries: Vec<ParamDeclaration>) -> Result<(), RegistryError> {
        if self.state == RegistryState::Frozen {
            return Err(RegistryError::Frozen { category: self.category });
        }

        let mut seen: HashSet<String> = self.params.iter().map(|param| param.name.clone()).collect();
        let mut resolved = Vec::with_capacity(entries.len());

        for entry in entries {
            let schema = entry.schema.resolve();

            if self.category == ParamCategory::Query && !schema.is_scalar_or_scalar_array() {
                return Err(RegistryError::NonScalarQueryParam { name: entry.name });
            }
            if self.is_reserved(&entry.name) {
                return Err(RegistryError::Reserved {
                    category: self.category,
                    name: entry.name,
                });
            }
            if !seen.insert(entry.name.clone()) {
                return Err(RegistryError::Duplicate {
                    category: self.category,
                    name: entry.name,
                });
            }

            resolved.push(ExtraParam {
                name: entry.name,
                schema,
                match_route: entry.match_route,
            });
        }

        for param in &resolved {
            tracing::info!("Registered extra {} param '{}'", self.category, param.name);
        }
        self.params.extend(resolved);
        self.state = RegistryState::Registering;
        Ok(())
    }

    pub fn freeze(&mut self) {
        self.state = RegistryState::Frozen;
    }

    /// Params in effect for a request
    ///
    /// Schemas declared on the route come first, then registered params whose
    /// matcher accepts the route. Without a route every registered param applies.
    pub fn applicable(&self, route: Option<&Route>) -> BTreeMap<String, ParamSchema> {
        let mut applicable = BTreeMap::new();

        if let Some(route) = route {
            let declared: Vec<(&String, &ParamSchema)> = match self.category {
                ParamCategory::Query => route.query_params().collect(),
                ParamCategory::Input => route.body_params().collect(),
            };
            for (name, schema) in declared {
                if !self.is_reserved(name) {
                    applicable.insert(name.clone(), schema.clone());
                }
            }
        }

        for param in &self.params {
            if route.map(|route| param.applies_to(route)).unwrap_or(true) {
                applicable.entry(param.name.clone()).or_insert_with(|| param.schema.clone());
            }
        }

        applicable
    }
}

/// Query and input registries, owned by bootstrap and shared once frozen
#[derive(Debug)]
pub struct ExtraParams {
    query: ParamRegistry,
    input: ParamRegistry,
}

impl Default for ExtraParams {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtraParams {
    pub fn new() -> Self {
        Self {
            query: ParamRegistry::new(ParamCategory::Query),
            input: ParamRegistry::new(ParamCategory::Input),
        }
    }

    pub fn add_query_params(&mut self, entries: Vec<ParamDeclaration>) -> Result<(), RegistryError> {
        self.query.add(entries)
    }

    pub fn add_input_params(&mut self, entries: Vec<ParamDeclaration>) -> Result<(), RegistryError> {
        self.input.add(entries)
    }

    /// End of bootstrap; later registrations fail
    pub fn freeze(&mut self) {
        self.query.freeze();
        self.input.freeze();
        tracing::info!(
            "Extra params frozen: {} query, {} input",
            self.query.params().len(),
            self.input.params().len()
        );
    }

    pub fn is_frozen(&self) -> bool {
        self.query.state() == RegistryState::Frozen && self.input.state() == RegistryState::Frozen
    }

    pub fn query(&self) -> &ParamRegistry {
        &self.query
    }

    pub fn input(&self) -> &ParamRegistry {
        &self.input
    }

    /// Merge registered params into the routes they match
    ///
    /// Query params land in `request.query` (created when absent). Input params
    /// land in the properties of the JSON body object schema; routes without
    /// such a body are skipped. Every route is checked for name conflicts
    /// before any of them is modified.
    pub fn apply_extra_params_to_routes(&self, routes: &mut [Route]) -> Result<(), RegistryError> {
        let mut merges = Vec::with_capacity(routes.len());

        for route in routes.iter() {
            let query: Vec<&ExtraParam> = self.query.params().iter().filter(|param| param.applies_to(route)).collect();
            if let Some(param) = query
                .iter()
                .find(|param| route.query_params().any(|(name, _)| *name == param.name))
            {
                return Err(conflict("query", param, route));
            }

            let input: Vec<&ExtraParam> = match route.json_body() {
                Some(ParamSchema::Object { .. }) => {
                    self.input.params().iter().filter(|param| param.applies_to(route)).collect()
                }
                _ => Vec::new(),
            };
            if let Some(param) = input
                .iter()
                .find(|param| route.body_params().any(|(name, _)| *name == param.name))
            {
                return Err(conflict("body", param, route));
            }

            merges.push((query, input));
        }

        for (route, (query, input)) in routes.iter_mut().zip(merges) {
            if !query.is_empty() {
                let declared = route
                    .request
                    .get_or_insert_with(Default::default)
                    .query
                    .get_or_insert_with(BTreeMap::new);
                for param in query {
                    declared.insert(param.name.clone(), param.schema.clone());
                }
            }

            if let Some(ParamSchema::Object { properties, .. }) = route.json_body_mut() {
                for param in input {
                    properties.insert(param.name.clone(), param.schema.clone());
                }
            }
        }

        Ok(())
    }
}

fn conflict(location: &'static str, param: &ExtraParam, route: &Route) -> RegistryError {
    RegistryError::AlreadyExists {
        location,
        name: param.name.clone(),
        method: route.method.clone(),
        path: route.path.clone(),
    }
}
