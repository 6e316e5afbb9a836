use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::profile::keys;

/// Which `Embedder` implementation backs semantic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Offline feature hashing.
    Hashing,
    /// OpenAI-compatible `/embeddings` endpoint.
    OpenAi,
}

impl EmbeddingBackend {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "" | "hashing" => Ok(EmbeddingBackend::Hashing),
            "openai" => Ok(EmbeddingBackend::OpenAi),
            other => bail!("EMBEDDING_BACKEND must be 'hashing' or 'openai', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub profile_path: PathBuf,
    pub resume_path: Option<PathBuf>,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_api_key: Option<String>,
    pub embedding_base_url: String,
    pub embedding_model: String,
    pub linkedin_email: Option<String>,
    pub linkedin_password: Option<String>,
    pub search_keyword: Option<String>,
    pub search_location: Option<String>,
    pub webdriver_url: String,
    pub headless: bool,
    pub applied_jobs_csv: PathBuf,
    /// Unbounded when `None`.
    pub max_applications: Option<usize>,
    pub log_poll_interval: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let embedding_backend =
            EmbeddingBackend::parse(&optional_env("EMBEDDING_BACKEND").unwrap_or_default())?;
        let embedding_api_key = optional_env("EMBEDDING_API_KEY");
        if embedding_backend == EmbeddingBackend::OpenAi && embedding_api_key.is_none() {
            bail!("EMBEDDING_API_KEY is required when EMBEDDING_BACKEND=openai");
        }

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            profile_path: PathBuf::from(require_env("PROFILE_PATH")?),
            resume_path: optional_env("RESUME_PATH").map(PathBuf::from),
            embedding_backend,
            embedding_api_key,
            embedding_base_url: optional_env("EMBEDDING_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            embedding_model: optional_env("EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            linkedin_email: optional_env("LINKEDIN_EMAIL"),
            linkedin_password: optional_env("LINKEDIN_PASSWORD"),
            search_keyword: optional_env("JOB_SEARCH_KEYWORD"),
            search_location: optional_env("JOB_SEARCH_LOCATION"),
            webdriver_url: optional_env("WEBDRIVER_URL")
                .unwrap_or_else(|| "http://localhost:9515".to_string()),
            headless: parse_bool(optional_env("HEADLESS").as_deref())
                .context("HEADLESS must be true or false")?,
            applied_jobs_csv: optional_env("APPLIED_JOBS_CSV")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("applied_jobs.csv")),
            max_applications: optional_env("MAX_APPLICATIONS")
                .map(|v| v.parse::<usize>())
                .transpose()
                .context("MAX_APPLICATIONS must be a positive integer")?,
            log_poll_interval: Duration::from_millis(
                optional_env("LOG_POLL_INTERVAL_MS")
                    .unwrap_or_else(|| "2000".to_string())
                    .parse::<u64>()
                    .context("LOG_POLL_INTERVAL_MS must be a number of milliseconds")?
                    .max(1),
            ),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Environment values that replace profile fields at load time. The login
    /// password is not among them; it goes straight to the browser session.
    pub fn profile_overrides(&self) -> Vec<(&'static str, String)> {
        let resume = self
            .resume_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());
        [
            (keys::EMAIL, self.linkedin_email.clone()),
            (keys::KEYWORD, self.search_keyword.clone()),
            (keys::LOCATION, self.search_location.clone()),
            (keys::CV_PATH, resume),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(raw: Option<&str>) -> Result<bool> {
    match raw.map(|v| v.to_lowercase()).as_deref() {
        None => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => bail!("unrecognised boolean '{other}'"),
    }
}
