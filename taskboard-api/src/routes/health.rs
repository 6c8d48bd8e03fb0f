/// Health check endpoint
///
/// Reports whether each service's database answers.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "users": "connected",
///   "boards": "connected",
///   "tasks": "connected"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use taskboard_shared::error::ServiceResult;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` when every store answers, `degraded` otherwise
    pub status: String,

    pub version: String,
    pub users: String,
    pub boards: String,
    pub tasks: String,
}

fn describe(result: &ServiceResult<()>) -> &'static str {
    match result {
        Ok(()) => "connected",
        Err(_) => "disconnected",
    }
}

/// Health check handler
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let (users, boards, tasks) =
        tokio::join!(state.auth.ping(), state.boards.ping(), state.tasks.ping());

    let healthy = users.is_ok() && boards.is_ok() && tasks.is_ok();
    if !healthy {
        tracing::warn!(
            users = describe(&users),
            boards = describe(&boards),
            tasks = describe(&tasks),
            "Health check degraded"
        );
    }

    Ok(Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        users: describe(&users).to_string(),
        boards: describe(&boards).to_string(),
        tasks: describe(&tasks).to_string(),
    }))
}
