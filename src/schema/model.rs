use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::constants::UPLOAD_FILE_UID;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelKind {
    #[default]
    ContentType,
    Component,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
    OneWay,
    ManyWay,
    MorphOne,
    MorphMany,
    MorphToOne,
    MorphToMany,
}

impl RelationKind {
    /// Polymorphic relations: elements are discriminated by `__type`
    pub fn is_morph_to(&self) -> bool {
        matches!(self, RelationKind::MorphToOne | RelationKind::MorphToMany)
    }

    pub fn is_morph(&self) -> bool {
        matches!(
            self,
            RelationKind::MorphOne
                | RelationKind::MorphMany
                | RelationKind::MorphToOne
                | RelationKind::MorphToMany
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AttributeKind {
    String,
    Text,
    Richtext,
    Email,
    Uid,
    Enumeration,
    Integer,
    Biginteger,
    Float,
    Decimal,
    Boolean,
    Date,
    Datetime,
    Time,
    Timestamp,
    Json,
    Blocks,
    Password,
    Media {
        #[serde(default)]
        multiple: bool,
    },
    Relation {
        relation: RelationKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },
    Component {
        component: String,
        #[serde(default)]
        repeatable: bool,
    },
    Dynamiczone {
        #[serde(default)]
        components: Vec<String>,
    },
}

fn default_true() -> bool {
    true
}

/// One named field of a schema: its kind plus access flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(flatten)]
    pub kind: AttributeKind,
    #[serde(default = "default_true")]
    pub writable: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub required: bool,
}

impl Attribute {
    pub fn new(kind: AttributeKind) -> Self {
        Self {
            kind,
            writable: true,
            visible: true,
            hidden: false,
            private: false,
            required: false,
        }
    }

    pub fn string() -> Self {
        Self::new(AttributeKind::String)
    }

    pub fn integer() -> Self {
        Self::new(AttributeKind::Integer)
    }

    pub fn boolean() -> Self {
        Self::new(AttributeKind::Boolean)
    }

    pub fn password() -> Self {
        Self::new(AttributeKind::Password)
    }

    pub fn media(multiple: bool) -> Self {
        Self::new(AttributeKind::Media { multiple })
    }

    pub fn relation(relation: RelationKind, target: impl Into<String>) -> Self {
        Self::new(AttributeKind::Relation {
            relation,
            target: Some(target.into()),
        })
    }

    pub fn morph_to(relation: RelationKind) -> Self {
        Self::new(AttributeKind::Relation { relation, target: None })
    }

    pub fn component(component: impl Into<String>, repeatable: bool) -> Self {
        Self::new(AttributeKind::Component {
            component: component.into(),
            repeatable,
        })
    }

    pub fn dynamic_zone<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(AttributeKind::Dynamiczone {
            components: components.into_iter().map(Into::into).collect(),
        })
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    pub fn non_writable(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn non_visible(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn is_relation(&self) -> bool {
        matches!(self.kind, AttributeKind::Relation { .. })
    }

    pub fn is_morph_to_relation(&self) -> bool {
        matches!(&self.kind, AttributeKind::Relation { relation, .. } if relation.is_morph_to())
    }

    pub fn is_media(&self) -> bool {
        matches!(self.kind, AttributeKind::Media { .. })
    }

    pub fn is_component(&self) -> bool {
        matches!(self.kind, AttributeKind::Component { .. })
    }

    pub fn is_dynamic_zone(&self) -> bool {
        matches!(self.kind, AttributeKind::Dynamiczone { .. })
    }

    pub fn is_password(&self) -> bool {
        matches!(self.kind, AttributeKind::Password)
    }

    /// Attributes that are reached through `populate`
    pub fn is_populatable(&self) -> bool {
        self.is_relation() || self.is_media() || self.is_component() || self.is_dynamic_zone()
    }

    pub fn is_scalar(&self) -> bool {
        !self.is_populatable()
    }

    /// Uid of the single schema this attribute points to, if there is one
    pub fn target_uid(&self) -> Option<&str> {
        match &self.kind {
            AttributeKind::Relation { relation, target } if !relation.is_morph_to() => target.as_deref(),
            AttributeKind::Component { component, .. } => Some(component.as_str()),
            AttributeKind::Media { .. } => Some(UPLOAD_FILE_UID),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaOptions {
    /// Lets `createdBy`/`updatedBy` skip the restricted-relation check
    #[serde(default)]
    pub populate_creator_fields: bool,
}

/// Declared shape of a content type or component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSchema", into = "RawSchema")]
pub struct Schema {
    pub uid: String,
    pub kind: ModelKind,
    attributes: Vec<(String, Attribute)>,
    pub options: SchemaOptions,
}

impl Schema {
    pub fn new(uid: impl Into<String>, kind: ModelKind) -> Self {
        Self {
            uid: uid.into(),
            kind,
            attributes: Vec::new(),
            options: SchemaOptions::default(),
        }
    }

    pub fn content_type(uid: impl Into<String>) -> Self {
        Self::new(uid, ModelKind::ContentType)
    }

    pub fn component(uid: impl Into<String>) -> Self {
        Self::new(uid, ModelKind::Component)
    }

    /// Adds or replaces an attribute, keeping declaration order
    pub fn with_attribute(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        let name = name.into();
        match self.attributes.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = attribute,
            None => self.attributes.push((name, attribute)),
        }
        self
    }

    pub fn with_options(mut self, options: SchemaOptions) -> Self {
        self.options = options;
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, attribute)| attribute)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(key, attribute)| (key.as_str(), attribute))
    }

    pub fn populatable_attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes().filter(|(_, attribute)| attribute.is_populatable())
    }
}

/// Wire form: attributes as an ordered JSON object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchema {
    uid: String,
    #[serde(default, rename = "modelType")]
    kind: ModelKind,
    #[serde(default)]
    attributes: Map<String, Value>,
    #[serde(default)]
    options: SchemaOptions,
}

impl TryFrom<RawSchema> for Schema {
    type Error = serde_json::Error;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        let attributes = raw
            .attributes
            .into_iter()
            .map(|(name, value)| serde_json::from_value::<Attribute>(value).map(|attribute| (name, attribute)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Schema {
            uid: raw.uid,
            kind: raw.kind,
            attributes,
            options: raw.options,
        })
    }
}

impl From<Schema> for RawSchema {
    fn from(schema: Schema) -> Self {
        let attributes = schema
            .attributes
            .into_iter()
            .filter_map(|(name, attribute)| serde_json::to_value(attribute).ok().map(|value| (name, value)))
            .collect();

        RawSchema {
            uid: schema.uid,
            kind: schema.kind,
            attributes,
            options: schema.options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_attributes_in_declaration_order() {
        let schema: Schema = serde_json::from_value(json!({
            "uid": "api::article.article",
            "attributes": {
                "title": { "type": "string" },
                "secret": { "type": "string", "hidden": true },
                "author": { "type": "relation", "relation": "manyToOne", "target": "api::author.author" },
                "blocks": { "type": "dynamiczone", "components": ["blocks.hero"] },
                "status": { "type": "enumeration", "enum": ["a", "b"] }
            }
        }))
        .unwrap();

        let names: Vec<&str> = schema.attributes().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["title", "secret", "author", "blocks", "status"]);
        assert!(schema.attribute("secret").unwrap().hidden);
        assert!(schema.attribute("title").unwrap().writable);
        assert_eq!(schema.attribute("author").unwrap().target_uid(), Some("api::author.author"));
        assert!(schema.attribute("blocks").unwrap().is_dynamic_zone());
        assert_eq!(schema.kind, ModelKind::ContentType);
    }

    #[test]
    fn morph_to_relations_have_no_target() {
        let attribute = Attribute::morph_to(RelationKind::MorphToMany);
        assert!(attribute.is_morph_to_relation());
        assert_eq!(attribute.target_uid(), None);
    }

    #[test]
    fn media_targets_upload_file() {
        assert_eq!(Attribute::media(false).target_uid(), Some(UPLOAD_FILE_UID));
    }

    #[test]
    fn with_attribute_replaces_existing() {
        let schema = Schema::component("shared.seo")
            .with_attribute("title", Attribute::string())
            .with_attribute("title", Attribute::string().hidden());
        assert_eq!(schema.attributes().count(), 1);
        assert!(schema.attribute("title").unwrap().hidden);
    }
}
