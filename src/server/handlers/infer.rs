use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InferRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub num_hops: Option<usize>,
}

/// Runs the multi-hop pipeline. Error-flagged results keep their body but
/// are returned as 500.
pub async fn infer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<InferRequest>,
) -> Result<Response, ApiError> {
    let pipeline = &state.settings.pipeline;
    let top_k = payload.top_k.unwrap_or(pipeline.default_top_k);
    let num_hops = payload.num_hops.unwrap_or(pipeline.num_hops);

    if top_k == 0 || top_k > pipeline.max_top_k {
        return Err(ApiError::BadRequest(format!(
            "top_k must be between 1 and {}",
            pipeline.max_top_k
        )));
    }
    if num_hops == 0 || num_hops > pipeline.max_hops {
        return Err(ApiError::BadRequest(format!(
            "num_hops must be between 1 and {}",
            pipeline.max_hops
        )));
    }

    let result = state
        .orchestrator
        .run(&payload.query, num_hops, top_k)
        .await;

    let status = if result.is_error() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };
    Ok((status, Json(result)).into_response())
}
