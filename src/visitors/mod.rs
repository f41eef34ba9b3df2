// Visitor library: the policies plugged into the traversal engine
//
// Most visitors take a `Policy`: sanitize pipelines remove the offending key,
// validate pipelines reject the request naming it.

use crate::error::{Result, ValidationError};
use crate::traverse::{Mutation, VisitContext};

pub mod admin_user;
pub mod attribute_flags;
pub mod empty_objects;
pub mod nested_query;
pub mod non_populatable;
pub mod non_scalar_fields;
pub mod populate_depth;
pub mod restricted_fields;
pub mod restricted_relations;
pub mod unfilterable;
pub mod unknown_filter_keys;
pub mod unrecognized_fields;
pub mod unresolved_keys;
pub mod wildcard_populate;

pub use admin_user::{AdminUserFields, PickAllowedAdminUserFields};
pub use attribute_flags::{HiddenFields, NonVisibleFields, NonWritableFields, PasswordFields, PrivateFields};
pub use empty_objects::EmptyObjects;
pub use nested_query::{NestedQuery, NestedQueryPipeline};
pub use non_populatable::NonPopulatable;
pub use non_scalar_fields::NonScalarFields;
pub use populate_depth::PopulateDepth;
pub use restricted_fields::RestrictedFields;
pub use restricted_relations::RestrictedRelations;
pub use unfilterable::{DynamicZones, MorphToRelations};
pub use unknown_filter_keys::UnknownFilterKeys;
pub use unrecognized_fields::UnrecognizedFields;
pub use unresolved_keys::UnresolvedKeys;
pub use wildcard_populate::ExpandWildcardPopulate;

/// What a visitor does with a key it rejects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Remove,
    Throw,
}

impl Policy {
    /// Drop the current key or fail with `Invalid key <k>`
    pub fn apply(self, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        self.reject(ctx.key, ctx, mutation)
    }

    /// Same as `apply` but names `key` in the error (e.g. an entry inside the value)
    pub fn reject(self, key: &str, ctx: &VisitContext<'_>, mutation: &mut Mutation) -> Result<()> {
        match self {
            Policy::Remove => {
                mutation.remove();
                Ok(())
            }
            Policy::Throw => {
                if crate::config::CONFIG.sanitize.debug_logging {
                    tracing::debug!("Rejected key '{}' in {} ({:?})", key, ctx.schema.uid, ctx.shape);
                }
                Err(ValidationError::invalid_key(key, ctx.path.raw.as_deref()).into())
            }
        }
    }

    /// Pick the visitor name matching the policy
    pub(crate) fn label(self, remove: &'static str, throw: &'static str) -> &'static str {
        match self {
            Policy::Remove => remove,
            Policy::Throw => throw,
        }
    }
}
