#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use content_guard::extensions::Extensions;
use content_guard::params::ExtraParams;
use content_guard::permissions::{Ability, Auth, FieldRule, PermissionFieldSet};
use content_guard::schema::SchemaRegistry;
use content_guard::ContentApi;

pub const ARTICLE: &str = "api::article.article";
pub const AUTHOR: &str = "api::author.author";
pub const CATEGORY: &str = "api::category.category";

/// Blog-like fixture: articles with components, a dynamic zone, relations,
/// media, a morph-to relation and creator fields
const SCHEMAS: &str = r#"[
  {
    "uid": "api::article.article",
    "attributes": {
      "title": { "type": "string" },
      "body": { "type": "richtext" },
      "views": { "type": "integer" },
      "internalNotes": { "type": "text", "hidden": true },
      "secretCode": { "type": "string", "private": true },
      "accessKey": { "type": "password" },
      "slug": { "type": "uid", "writable": false },
      "rank": { "type": "integer", "visible": false },
      "seo": { "type": "component", "component": "shared.seo" },
      "blocks": { "type": "dynamiczone", "components": ["blocks.hero", "blocks.quote"] },
      "author": { "type": "relation", "relation": "manyToOne", "target": "api::author.author" },
      "category": { "type": "relation", "relation": "manyToOne", "target": "api::category.category" },
      "related": { "type": "relation", "relation": "morphToMany" },
      "cover": { "type": "media" },
      "createdBy": { "type": "relation", "relation": "oneToOne", "target": "admin::user" },
      "updatedBy": { "type": "relation", "relation": "oneToOne", "target": "admin::user" }
    }
  },
  {
    "uid": "api::author.author",
    "attributes": {
      "name": { "type": "string" },
      "internalNotes": { "type": "text", "hidden": true },
      "accessKey": { "type": "password" },
      "articles": { "type": "relation", "relation": "oneToMany", "target": "api::article.article" }
    }
  },
  {
    "uid": "api::category.category",
    "attributes": {
      "label": { "type": "string" }
    }
  },
  {
    "uid": "shared.seo",
    "modelType": "component",
    "attributes": {
      "metaTitle": { "type": "string" },
      "internalNotes": { "type": "text", "hidden": true },
      "accessKey": { "type": "password" }
    }
  },
  {
    "uid": "blocks.hero",
    "modelType": "component",
    "attributes": {
      "heading": { "type": "string" },
      "accessKey": { "type": "password" },
      "image": { "type": "media" }
    }
  },
  {
    "uid": "blocks.quote",
    "modelType": "component",
    "attributes": {
      "text": { "type": "text" }
    }
  },
  {
    "uid": "admin::user",
    "attributes": {
      "firstname": { "type": "string" },
      "lastname": { "type": "string" },
      "username": { "type": "string" },
      "email": { "type": "email" },
      "isActive": { "type": "boolean" },
      "blocked": { "type": "boolean" },
      "password": { "type": "password" },
      "resetPasswordToken": { "type": "string" },
      "registrationToken": { "type": "string" }
    }
  },
  {
    "uid": "plugin::upload.file",
    "attributes": {
      "url": { "type": "string" },
      "hash": { "type": "string", "hidden": true }
    }
  }
]"#;

pub fn registry() -> Arc<SchemaRegistry> {
    let mut registry = SchemaRegistry::new();
    registry.load_json_str(SCHEMAS).expect("fixture schemas parse");
    Arc::new(registry)
}

/// Content API with no extra params or extensions
pub fn api() -> ContentApi {
    ContentApi::with_models(registry())
}

/// Content API over a frozen parameter registry
pub fn api_with_params(mut params: ExtraParams) -> ContentApi {
    params.freeze();
    ContentApi::new(registry(), Arc::new(params), Arc::new(Extensions::new()))
}

/// Ability that can read everything except the listed subjects
pub struct DenySubjects(HashSet<String>);

#[async_trait]
impl Ability for DenySubjects {
    async fn can(&self, _action: &str, subject: &str) -> bool {
        !self.0.contains(subject)
    }
}

pub fn deny(subjects: &[&str]) -> Auth {
    Auth::new(Arc::new(DenySubjects(subjects.iter().map(|subject| subject.to_string()).collect())))
}

/// Ability granting only the listed fields on every subject
pub struct GrantFields(Vec<String>);

#[async_trait]
impl Ability for GrantFields {
    async fn can(&self, _action: &str, _subject: &str) -> bool {
        true
    }

    async fn permitted_fields(&self, _action: &str, _subject: &str) -> PermissionFieldSet {
        PermissionFieldSet::from_rules(&[FieldRule { fields: Some(self.0.clone()) }])
    }
}

pub fn grant_fields(fields: &[&str]) -> Auth {
    Auth::new(Arc::new(GrantFields(fields.iter().map(|field| field.to_string()).collect())))
}
