use std::sync::Arc;

use serde_json::Value;

use crate::schema::{Attribute, ModelSource, Schema};

/// Location of a key inside the walked tree
///
/// `raw` joins every key on the way down (operators and fragment keys
/// included); `attribute` joins only the keys that resolved to attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    pub raw: Option<String>,
    pub attribute: Option<String>,
}

impl Path {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, key: &str, is_attribute: bool) -> Self {
        let join = |base: &Option<String>| match base {
            Some(base) if !base.is_empty() => format!("{}.{}", base, key),
            _ => key.to_string(),
        };

        Self {
            raw: Some(join(&self.raw)),
            attribute: if is_attribute { Some(join(&self.attribute)) } else { self.attribute.clone() },
        }
    }

    /// Number of attribute hops from the root
    pub fn attribute_depth(&self) -> usize {
        self.attribute.as_deref().map(|path| path.split('.').count()).unwrap_or(0)
    }
}

/// Which tree shape the walker is in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Entity,
    Filters,
    Sort,
    Fields,
    /// Keys of a populate map (attribute names)
    Populate,
    /// Keys of a nested populate query (`fields`, `filters`, `sort`, `populate`, `on`, `count`)
    PopulateFragment,
    /// A key no schema resolves: the discriminator of a dynamic-zone or morph-to
    /// element, or a sort path continuing past a scalar. The walker drops what
    /// it belongs to after the chain ran.
    Unresolved,
}

/// The key whose value the walker descended into
#[derive(Debug, Clone)]
pub struct Parent {
    pub key: String,
    pub attribute: Option<Attribute>,
    pub schema: Arc<Schema>,
    pub path: Path,
}

impl Parent {
    /// True when the parent has no single target schema (dynamic zones, morph-to relations)
    pub fn is_polymorphic(&self) -> bool {
        self.attribute
            .as_ref()
            .map(|attribute| attribute.is_dynamic_zone() || attribute.is_morph_to_relation())
            .unwrap_or(false)
    }
}

/// Everything a visitor sees for one key
pub struct VisitContext<'a> {
    pub key: &'a str,
    pub value: &'a Value,
    pub attribute: Option<&'a Attribute>,
    pub schema: &'a Arc<Schema>,
    pub path: &'a Path,
    pub parent: Option<&'a Parent>,
    pub shape: Shape,
    pub models: &'a dyn ModelSource,
}

impl<'a> VisitContext<'a> {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Per-level walk state; cloned and narrowed on every descent
#[derive(Clone)]
pub struct TraverseOptions<'a> {
    pub schema: Arc<Schema>,
    pub models: &'a dyn ModelSource,
    pub path: Path,
    pub parent: Option<Parent>,
}

impl<'a> TraverseOptions<'a> {
    pub fn new(schema: Arc<Schema>, models: &'a dyn ModelSource) -> Self {
        Self {
            schema,
            models,
            path: Path::root(),
            parent: None,
        }
    }

    /// Options for the value stored under `key`, walked with `schema`
    pub(crate) fn descend(&self, key: &str, attribute: Option<&Attribute>, path: Path, schema: Arc<Schema>) -> Self {
        Self {
            parent: Some(Parent {
                key: key.to_string(),
                attribute: attribute.cloned(),
                schema: self.schema.clone(),
                path: self.path.clone(),
            }),
            schema,
            models: self.models,
            path,
        }
    }

    /// Same schema and parent, deeper path (logical operators, arrays)
    pub(crate) fn at_path(&self, path: Path) -> Self {
        Self {
            path,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_paths_track_attributes_separately() {
        let path = Path::root()
            .child("author", true)
            .child("$and", false)
            .child("name", true);

        assert_eq!(path.raw.as_deref(), Some("author.$and.name"));
        assert_eq!(path.attribute.as_deref(), Some("author.name"));
        assert_eq!(path.attribute_depth(), 2);
    }

    #[test]
    fn root_has_no_depth() {
        assert_eq!(Path::root().attribute_depth(), 0);
        assert_eq!(Path::root().child("$or", false).attribute_depth(), 0);
    }
}
