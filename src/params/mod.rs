// Extra-parameter registry: plugin-declared query/body keys and their validators

pub mod error;
pub mod registry;
pub mod route;
pub mod schema;

pub use error::RegistryError;
pub use registry::{
    ExtraParam, ExtraParams, ParamCategory, ParamDeclaration, ParamRegistry, RegistryState, SchemaFactory, SchemaSource,
};
pub use route::{Route, RouteMatcher, RouteRequest, JSON_CONTENT_TYPE};
pub use schema::{ParamError, ParamSchema};

/// Query keys understood by the content API itself
pub const CORE_QUERY_PARAM_KEYS: &[&str] = &[
    "filters",
    "sort",
    "fields",
    "populate",
    "status",
    "locale",
    "pagination",
    "page",
    "pageSize",
    "start",
    "limit",
    "_q",
    "hasPublishedVersion",
];

/// Names no extra param may take
pub const RESERVED_INPUT_PARAM_KEYS: &[&str] = &["id", "documentId"];

/// Pagination keys, at the top level or under `pagination`
pub const PAGINATION_KEYS: &[&str] = &["page", "pageSize", "start", "limit"];

/// Accepted `status` values
pub const STATUS_VALUES: &[&str] = &["draft", "published"];
