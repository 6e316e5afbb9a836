//! Worker lifecycle: one background run at a time, advisory stop, status.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::answers::AnswerResolver;
use crate::browser::webdriver::{LoginCredentials, WebDriverSession};
use crate::config::Config;
use crate::events::EventSink;
use crate::form::FormFiller;
use crate::jobs::{AppliedLog, JobRunner, RunSummary, SearchParams};
use crate::profile::keys;

/// Cooperative cancellation flag, checked between postings and form steps.
/// In-flight browser actions are never interrupted.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error("a run is already in progress")]
    AlreadyRunning,
}

/// Optional per-run search overrides.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunRequest {
    pub keyword: Option<String>,
    pub location: Option<String>,
}

#[async_trait]
pub trait BotRunner: Send + Sync {
    async fn run(&self, request: RunRequest, stop: StopSignal) -> Result<RunSummary>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BotPhase {
    Idle,
    Running,
    Stopping,
    Finished,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct BotStatus {
    pub phase: BotPhase,
    pub run_id: Option<Uuid>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub last_summary: Option<RunSummary>,
    pub last_error: Option<String>,
}

impl Default for BotStatus {
    fn default() -> Self {
        Self {
            phase: BotPhase::Idle,
            run_id: None,
            started_at: None,
            finished_at: None,
            last_summary: None,
            last_error: None,
        }
    }
}

impl BotStatus {
    pub fn is_active(&self) -> bool {
        matches!(self.phase, BotPhase::Running | BotPhase::Stopping)
    }
}

/// Starts runs on a background task and tracks their status.
#[derive(Clone)]
pub struct BotController {
    runner: Arc<dyn BotRunner>,
    sink: Arc<dyn EventSink>,
    status: Arc<RwLock<BotStatus>>,
    stop: Arc<RwLock<StopSignal>>,
}

impl BotController {
    pub fn new(runner: Arc<dyn BotRunner>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            runner,
            sink,
            status: Arc::new(RwLock::new(BotStatus::default())),
            stop: Arc::new(RwLock::new(StopSignal::default())),
        }
    }

    pub async fn start(&self, request: RunRequest) -> Result<Uuid, BotError> {
        let mut status = self.status.write().await;
        if status.is_active() {
            return Err(BotError::AlreadyRunning);
        }

        let run_id = Uuid::new_v4();
        let stop = StopSignal::default();
        *self.stop.write().await = stop.clone();
        *status = BotStatus {
            phase: BotPhase::Running,
            run_id: Some(run_id),
            started_at: Some(Utc::now()),
            ..BotStatus::default()
        };
        drop(status);

        let runner = self.runner.clone();
        let sink = self.sink.clone();
        let shared = self.status.clone();

        tokio::spawn(async move {
            info!(%run_id, "Bot run started");
            sink.emit("Bot started");

            let result = runner.run(request, stop).await;

            let mut status = shared.write().await;
            status.finished_at = Some(Utc::now());
            match result {
                Ok(summary) => {
                    status.phase = BotPhase::Finished;
                    status.last_summary = Some(summary);
                    sink.emit("Bot finished");
                }
                Err(e) => {
                    error!(%run_id, "Bot run failed: {e:#}");
                    status.phase = BotPhase::Failed;
                    status.last_error = Some(format!("{e:#}"));
                    sink.emit(&format!("Bot stopped with error: {e:#}"));
                }
            }
        });

        Ok(run_id)
    }

    /// Advisory: the worker notices at its next checkpoint. Returns whether a
    /// run was active.
    pub async fn stop(&self) -> bool {
        let mut status = self.status.write().await;
        if !status.is_active() {
            return false;
        }
        self.stop.read().await.request();
        status.phase = BotPhase::Stopping;
        self.sink.emit("Stop requested");
        true
    }

    pub async fn status(&self) -> BotStatus {
        self.status.read().await.clone()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LiveBot: WebDriver-backed runner
// ────────────────────────────────────────────────────────────────────────────

/// Production runner: opens a WebDriver session per run and drives the job loop.
pub struct LiveBot {
    config: Arc<Config>,
    resolver: Arc<AnswerResolver>,
    sink: Arc<dyn EventSink>,
}

impl LiveBot {
    pub fn new(config: Arc<Config>, resolver: Arc<AnswerResolver>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            resolver,
            sink,
        }
    }

    fn search_params(&self, request: &RunRequest) -> SearchParams {
        let profile = self.resolver.profile();
        SearchParams {
            keyword: request
                .keyword
                .clone()
                .filter(|k| !k.trim().is_empty())
                .unwrap_or_else(|| profile.value_or(keys::KEYWORD, "")),
            location: request
                .location
                .clone()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| profile.value_or(keys::LOCATION, "")),
        }
    }

    /// Config wins; the profile file is the fallback for both values.
    fn credentials(&self) -> Result<LoginCredentials> {
        let profile = self.resolver.profile();
        let email = self
            .config
            .linkedin_email
            .clone()
            .or_else(|| profile.value(keys::EMAIL).map(str::to_string))
            .context("No login email configured (LINKEDIN_EMAIL or profile EMAIL)")?;
        let password = self
            .config
            .linkedin_password
            .clone()
            .or_else(|| profile.value(keys::PASSWORD).map(str::to_string))
            .context("No login password configured (LINKEDIN_PASSWORD or profile PASSWORD)")?;
        Ok(LoginCredentials { email, password })
    }

    fn resume_path(&self) -> Option<PathBuf> {
        self.resolver.profile().resume_path()
    }
}

#[async_trait]
impl BotRunner for LiveBot {
    async fn run(&self, request: RunRequest, stop: StopSignal) -> Result<RunSummary> {
        let search = self.search_params(&request);
        let credentials = self.credentials().inspect_err(|e| {
            self.sink.emit(&format!("Session failure: {e}"));
        })?;

        let session = WebDriverSession::connect(
            &self.config.webdriver_url,
            self.config.headless,
            credentials,
        )
        .await
        .inspect_err(|e| self.sink.emit(&format!("Session failure: {e}")))
        .context("Failed to start browser session")?;
        let session = Arc::new(session);

        let filler = FormFiller::new(
            self.resolver.clone(),
            self.resume_path(),
            self.sink.clone(),
            stop.clone(),
        );
        let runner = JobRunner::new(
            session.clone(),
            session.clone(),
            filler,
            AppliedLog::new(&self.config.applied_jobs_csv),
            self.sink.clone(),
            stop,
        )
        .with_max_applications(self.config.max_applications);

        let result = runner.run(&search).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close browser session: {e}");
        }

        Ok(result?)
    }
}
