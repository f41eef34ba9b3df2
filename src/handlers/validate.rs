use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use super::{AppState, PipelineParams};
use crate::error::Result;

/// POST /validate/input/:uid
pub async fn input_post(
    State(api): State<AppState>,
    Path(uid): Path<String>,
    Query(params): Query<PipelineParams>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    api.validate.input(&body, &uid, &params.request_options()).await?;
    Ok(Json(json!({ "valid": true })))
}

/// POST /validate/query/:uid
pub async fn query_post(
    State(api): State<AppState>,
    Path(uid): Path<String>,
    Query(params): Query<PipelineParams>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    api.validate.query(&body, &uid, &params.request_options()).await?;
    Ok(Json(json!({ "valid": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{http::StatusCode, response::IntoResponse};

    use crate::content_api::ContentApi;
    use crate::testing::{self, ARTICLE};

    #[tokio::test]
    async fn invalid_input_is_a_bad_request() {
        let state = Arc::new(ContentApi::with_models(Arc::new(testing::registry())));
        let err = input_post(
            State(state),
            Path(ARTICLE.to_string()),
            Query(PipelineParams::default()),
            Json(json!({ "id": 4, "title": "t" })),
        )
        .await
        .unwrap_err();

        let details = &err.as_validation().unwrap().details;
        assert_eq!(details.key.as_deref(), Some("id"));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
