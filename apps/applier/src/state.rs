use std::sync::Arc;

use crate::bot::BotController;
use crate::config::Config;
use crate::events::SharedLogBuffer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub bot: BotController,
    /// Filled by the display task; handlers only read it.
    pub logs: SharedLogBuffer,
    pub config: Arc<Config>,
}
