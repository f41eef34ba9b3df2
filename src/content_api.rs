// Content API facade: one handle over the sanitize and validate pipelines
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::extensions::Extensions;
use crate::options::RequestOptions;
use crate::params::ExtraParams;
use crate::permissions::Auth;
use crate::sanitize::Sanitizers;
use crate::schema::ModelSource;
use crate::validate::Validators;

/// Built once at bootstrap, after extra params are frozen
#[derive(Clone)]
pub struct ContentApi {
    pub sanitize: Sanitizers,
    pub validate: Validators,
}

impl ContentApi {
    pub fn new(models: Arc<dyn ModelSource>, params: Arc<ExtraParams>, extensions: Arc<Extensions>) -> Self {
        if !params.is_frozen() {
            tracing::warn!("Content API built before extra params were frozen");
        }

        Self {
            sanitize: Sanitizers::new(models.clone(), params.clone(), extensions.clone()),
            validate: Validators::new(models, params, extensions),
        }
    }

    /// Content API without extra params or extensions
    pub fn with_models(models: Arc<dyn ModelSource>) -> Self {
        let mut params = ExtraParams::new();
        params.freeze();
        Self::new(models, Arc::new(params), Arc::new(Extensions::new()))
    }

    /// Options carrying `auth` and the field allow-list it grants on `uid`
    pub async fn permission_options(auth: Auth, action: &str, uid: &str) -> RequestOptions {
        let field_set = auth.ability.permitted_fields(action, uid).await;
        let options = RequestOptions::new().with_auth(auth);

        match field_set.allow_list() {
            Some(fields) => options.with_allowed_fields(fields),
            None => options,
        }
    }

    /// Reject an invalid query, then strip what may not pass
    pub async fn query(&self, query: Value, uid: &str, options: &RequestOptions) -> Result<Value> {
        self.validate.query(&query, uid, options).await?;
        self.sanitize.query(query, uid, options).await
    }

    /// Reject an invalid body, then strip what may not pass
    pub async fn input(&self, data: Value, uid: &str, options: &RequestOptions) -> Result<Value> {
        self.validate.input(&data, uid, options).await?;
        self.sanitize.input(data, uid, options).await
    }

    pub async fn output(&self, data: Value, uid: &str, options: &RequestOptions) -> Result<Value> {
        self.sanitize.output(data, uid, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::permissions::{Ability, FieldRule, PermissionFieldSet};
    use crate::testing::{self, ARTICLE};

    struct TitleOnly;

    #[async_trait]
    impl Ability for TitleOnly {
        async fn can(&self, _action: &str, _subject: &str) -> bool {
            true
        }

        async fn permitted_fields(&self, _action: &str, _subject: &str) -> PermissionFieldSet {
            PermissionFieldSet::from_rules(&[FieldRule {
                fields: Some(vec!["title".to_string()]),
            }])
        }
    }

    #[tokio::test]
    async fn permitted_fields_restrict_output() {
        let api = ContentApi::with_models(Arc::new(testing::registry()));
        let options = ContentApi::permission_options(Auth::new(Arc::new(TitleOnly)), "find", ARTICLE).await;

        let out = api
            .output(json!({ "id": 1, "documentId": "d", "title": "t", "views": 3 }), ARTICLE, &options)
            .await
            .unwrap();
        assert_eq!(out, json!({ "id": 1, "documentId": "d", "title": "t" }));
    }

    #[tokio::test]
    async fn query_fails_before_sanitizing() {
        let api = ContentApi::with_models(Arc::new(testing::registry()));
        let err = api
            .query(json!({ "filters": { "internalNotes": "x" } }), ARTICLE, &RequestOptions::new())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
