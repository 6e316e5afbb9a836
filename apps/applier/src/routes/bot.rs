use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::bot::{BotStatus, RunRequest};
use crate::errors::AppError;
use crate::events::HISTORY_TAIL;
use crate::state::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub status: BotStatus,
    pub max_applications: Option<usize>,
    pub headless: bool,
}

#[derive(Serialize)]
pub struct LogsResponse {
    pub lines: Vec<String>,
    pub total: usize,
}

/// POST /api/v1/bot/start
/// Body is optional: `{ "keyword": "...", "location": "..." }`.
pub async fn handle_start(
    State(state): State<AppState>,
    body: Option<Json<RunRequest>>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let run_id = state.bot.start(request).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "run_id": run_id, "status": "started" })),
    ))
}

/// POST /api/v1/bot/stop
pub async fn handle_stop(State(state): State<AppState>) -> Json<Value> {
    let stopping = state.bot.stop().await;
    Json(json!({ "stopping": stopping }))
}

/// GET /api/v1/bot/status
pub async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.bot.status().await,
        max_applications: state.config.max_applications,
        headless: state.config.headless,
    })
}

/// GET /api/v1/logs
pub async fn handle_logs(State(state): State<AppState>) -> Json<LogsResponse> {
    let logs = state.logs.read().await;
    Json(LogsResponse {
        lines: logs.recent(),
        total: logs.history_len(),
    })
}

/// GET /api/v1/logs/history
pub async fn handle_log_history(State(state): State<AppState>) -> Json<LogsResponse> {
    let logs = state.logs.read().await;
    Json(LogsResponse {
        lines: logs.history_tail(HISTORY_TAIL),
        total: logs.history_len(),
    })
}
