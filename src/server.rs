//! HTTP transport layer - thin glue over the grading kernel

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::judge::{ExecutionResult, Judge, Submission};

#[derive(Clone)]
struct AppState {
    judge: Arc<Judge>,
}

/// Response for `POST /run`
#[derive(Debug, Serialize, Deserialize)]
pub struct RunResponse {
    pub results: Vec<ExecutionResult>,
}

pub fn router(judge: Arc<Judge>) -> Router {
    Router::new()
        .route("/run", post(run_submission))
        .with_state(AppState { judge })
}

/// Grade one submission.
///
/// Failures that preclude grading entirely (unsupported language, internal
/// errors) surface as a single synthetic failed result, keeping the
/// response shape uniform for the caller.
async fn run_submission(
    State(state): State<AppState>,
    Json(submission): Json<Submission>,
) -> Json<RunResponse> {
    match state.judge.execute(&submission).await {
        Ok(results) => Json(RunResponse { results }),
        Err(e) => {
            warn!("Failed to grade submission: {:#}", e);
            Json(RunResponse {
                results: vec![ExecutionResult::failure(format!("{:#}", e))],
            })
        }
    }
}
