// HTTP surface over the content API pipelines (`guard serve`)
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::content_api::ContentApi;
use crate::options::{ApiSurface, RequestOptions};

pub mod sanitize;
pub mod validate;

pub type AppState = Arc<ContentApi>;

/// Per-request flags accepted on every pipeline route
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineParams {
    /// Overrides the configured `strict_params`
    pub strict: Option<bool>,
    /// Comma separated allow-list of field paths
    pub fields: Option<String>,
    pub surface: Option<ApiSurface>,
}

impl PipelineParams {
    pub fn request_options(&self) -> RequestOptions {
        let mut options = RequestOptions::new().with_surface(self.surface.unwrap_or_default());
        if let Some(strict) = self.strict {
            options = options.with_strict_params(strict);
        }
        if let Some(fields) = &self.fields {
            options = options.with_allowed_fields(
                fields.split(',').map(str::trim).filter(|field| !field.is_empty()),
            );
        }
        options
    }
}

pub fn router(api: Arc<ContentApi>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/sanitize/output/:uid", post(sanitize::output_post))
        .route("/sanitize/input/:uid", post(sanitize::input_post))
        .route("/sanitize/query/:uid", post(sanitize::query_post))
        .route("/validate/input/:uid", post(validate::input_post))
        .route("/validate/query/:uid", post(validate::query_post))
        .with_state(api)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "content-guard",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /sanitize/{output,input,query}/:uid",
            "POST /validate/{input,query}/:uid"
        ]
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_build_request_options() {
        let params = PipelineParams {
            strict: Some(true),
            fields: Some("title, author.name,".to_string()),
            surface: Some(ApiSurface::Documents),
        };
        let options = params.request_options();

        assert!(options.is_strict());
        assert_eq!(options.surface, ApiSurface::Documents);
        assert_eq!(options.allowed_fields, Some(vec!["title".to_string(), "author.name".to_string()]));
    }
}
