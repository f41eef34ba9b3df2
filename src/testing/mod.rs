use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::permissions::{Ability, Auth};
use crate::schema::{
    Attribute, AttributeKind, ModelSource, RelationKind, Schema, SchemaOptions, SchemaRegistry, ADMIN_USER_UID, UPLOAD_FILE_UID,
};

pub const ARTICLE: &str = "api::article.article";
pub const AUTHOR: &str = "api::author.author";
pub const CATEGORY: &str = "api::category.category";

/// Schemas shared by the unit tests
///
/// `article` has a hidden, a private and a password attribute, a component, a
/// dynamic zone, relations (including to `admin::user`) and media.
pub fn registry() -> SchemaRegistry {
    SchemaRegistry::new()
        .with(
            Schema::content_type(ARTICLE)
                .with_attribute("title", Attribute::string())
                .with_attribute("body", Attribute::new(AttributeKind::Richtext))
                .with_attribute("views", Attribute::integer())
                .with_attribute("internalNotes", Attribute::string().hidden())
                .with_attribute("secretCode", Attribute::string().private())
                .with_attribute("accessKey", Attribute::password())
                .with_attribute("slug", Attribute::string().non_writable())
                .with_attribute("rank", Attribute::integer().non_visible())
                .with_attribute("seo", Attribute::component("shared.seo", false))
                .with_attribute("blocks", Attribute::dynamic_zone(["blocks.hero", "blocks.quote"]))
                .with_attribute("author", Attribute::relation(RelationKind::ManyToOne, AUTHOR))
                .with_attribute("category", Attribute::relation(RelationKind::ManyToOne, CATEGORY))
                .with_attribute("related", Attribute::morph_to(RelationKind::MorphToMany))
                .with_attribute("cover", Attribute::media(false))
                .with_attribute("createdBy", Attribute::relation(RelationKind::OneToOne, ADMIN_USER_UID))
                .with_attribute("updatedBy", Attribute::relation(RelationKind::OneToOne, ADMIN_USER_UID)),
        )
        .with(
            Schema::content_type(AUTHOR)
                .with_attribute("name", Attribute::string())
                .with_attribute("internalNotes", Attribute::string().hidden())
                .with_attribute("accessKey", Attribute::password())
                .with_attribute("articles", Attribute::relation(RelationKind::OneToMany, ARTICLE)),
        )
        .with(Schema::content_type(CATEGORY).with_attribute("label", Attribute::string()))
        .with(
            Schema::component("shared.seo")
                .with_attribute("metaTitle", Attribute::string())
                .with_attribute("internalNotes", Attribute::string().hidden())
                .with_attribute("accessKey", Attribute::password()),
        )
        .with(
            Schema::component("blocks.hero")
                .with_attribute("heading", Attribute::string())
                .with_attribute("accessKey", Attribute::password())
                .with_attribute("image", Attribute::media(false)),
        )
        .with(Schema::component("blocks.quote").with_attribute("text", Attribute::new(AttributeKind::Text)))
        .with(
            Schema::content_type(ADMIN_USER_UID)
                .with_attribute("firstname", Attribute::string())
                .with_attribute("lastname", Attribute::string())
                .with_attribute("username", Attribute::string())
                .with_attribute("email", Attribute::new(AttributeKind::Email))
                .with_attribute("isActive", Attribute::boolean())
                .with_attribute("blocked", Attribute::boolean())
                .with_attribute("password", Attribute::password())
                .with_attribute("resetPasswordToken", Attribute::string())
                .with_attribute("registrationToken", Attribute::string()),
        )
        .with(
            Schema::content_type(UPLOAD_FILE_UID)
                .with_attribute("url", Attribute::string())
                .with_attribute("hash", Attribute::string().hidden()),
        )
}

/// Same as `registry` with creator fields exempt from relation checks
pub fn registry_with_creator_fields() -> SchemaRegistry {
    let registry = registry();
    let article = registry
        .get_model(ARTICLE)
        .map(|schema| (*schema).clone())
        .unwrap_or_else(|_| Schema::content_type(ARTICLE));
    registry.with(article.with_options(SchemaOptions {
        populate_creator_fields: true,
    }))
}

/// Ability that denies reading the listed subjects
pub struct Deny(pub HashSet<String>);

#[async_trait]
impl Ability for Deny {
    async fn can(&self, _action: &str, subject: &str) -> bool {
        !self.0.contains(subject)
    }
}

pub fn deny<I, S>(subjects: I) -> Auth
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Auth::new(Arc::new(Deny(subjects.into_iter().map(Into::into).collect())))
}
