pub mod bot;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Worker lifecycle
        .route("/api/v1/bot/start", post(bot::handle_start))
        .route("/api/v1/bot/stop", post(bot::handle_stop))
        .route("/api/v1/bot/status", get(bot::handle_status))
        // Log stream
        .route("/api/v1/logs", get(bot::handle_logs))
        .route("/api/v1/logs/history", get(bot::handle_log_history))
        .with_state(state)
}
