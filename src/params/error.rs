use thiserror::Error;

use super::registry::ParamCategory;

/// Registry misuse; raised synchronously during bootstrap
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Cannot add {category} params: the registry is frozen")]
    Frozen { category: ParamCategory },

    #[error("Cannot add {category} param \"{name}\": the name is reserved")]
    Reserved { category: ParamCategory, name: String },

    #[error("The {category} param \"{name}\" has already been added")]
    Duplicate { category: ParamCategory, name: String },

    #[error("The query param \"{name}\" must be a scalar or an array of scalars")]
    NonScalarQueryParam { name: String },

    #[error("The {location} param \"{name}\" already exists on route {method} {path}")]
    AlreadyExists {
        location: &'static str,
        name: String,
        method: String,
        path: String,
    },
}
