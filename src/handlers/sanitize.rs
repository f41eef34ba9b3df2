use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use super::{AppState, PipelineParams};
use crate::error::Result;

/// POST /sanitize/output/:uid
pub async fn output_post(
    State(api): State<AppState>,
    Path(uid): Path<String>,
    Query(params): Query<PipelineParams>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let options = params.request_options();
    Ok(Json(api.sanitize.output(body, &uid, &options).await?))
}

/// POST /sanitize/input/:uid
pub async fn input_post(
    State(api): State<AppState>,
    Path(uid): Path<String>,
    Query(params): Query<PipelineParams>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let options = params.request_options();
    Ok(Json(api.sanitize.input(body, &uid, &options).await?))
}

/// POST /sanitize/query/:uid, body is the parsed query object
pub async fn query_post(
    State(api): State<AppState>,
    Path(uid): Path<String>,
    Query(params): Query<PipelineParams>,
    Json(body): Json<Value>,
) -> Result<Json<Value>> {
    let options = params.request_options();
    Ok(Json(api.sanitize.query(body, &uid, &options).await?))
}
