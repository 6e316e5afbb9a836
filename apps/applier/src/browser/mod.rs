//! Browser-control interfaces consumed by the form engine and the job loop.
//!
//! `FormDriver` covers the active application form, `JobBoard` covers
//! session, search and posting navigation. `WebDriverSession` implements both
//! over the W3C WebDriver protocol.

pub mod scripts;
pub mod webdriver;

use async_trait::async_trait;
use thiserror::Error;

use crate::form::descriptor::{FieldAction, FieldDescriptor};

pub use webdriver::WebDriverSession;

#[derive(Debug, Error)]
pub enum BrowserError {
    /// Element lookup failed. Always non-fatal for the caller.
    #[error("element not found: {0}")]
    NotFound(String),

    /// Login or navigation could not establish a usable session.
    #[error("session failure: {0}")]
    Session(String),

    #[error("webdriver error '{error}' (status {status}): {message}")]
    Protocol {
        status: u16,
        error: String,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("script returned unexpected data: {0}")]
    Script(String),
}

impl BrowserError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BrowserError::NotFound(_))
    }
}

/// Controls the form engine can ask the driver to click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlIntent {
    Review,
    SubmitApplication,
    Submit,
    Continue,
    Next,
    Primary,
}

impl ControlIntent {
    /// Submit search order, most explicit first.
    pub const SUBMIT_PRIORITY: [ControlIntent; 5] = [
        ControlIntent::SubmitApplication,
        ControlIntent::Submit,
        ControlIntent::Continue,
        ControlIntent::Next,
        ControlIntent::Primary,
    ];

    /// Visible button text the control is recognised by; `None` for the
    /// primary-styled button.
    pub fn button_text(self) -> Option<&'static str> {
        match self {
            ControlIntent::Review => Some("Review"),
            ControlIntent::SubmitApplication => Some("Submit application"),
            ControlIntent::Submit => Some("Submit"),
            ControlIntent::Continue => Some("Continue"),
            ControlIntent::Next => Some("Next"),
            ControlIntent::Primary => None,
        }
    }
}

/// Answer for the "save this application?" prompt shown when a form is left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitChoice {
    Discard,
    Save,
}

impl ExitChoice {
    pub fn label(self) -> &'static str {
        match self {
            ExitChoice::Discard => "discard",
            ExitChoice::Save => "save",
        }
    }
}

#[async_trait]
pub trait FormDriver: Send + Sync {
    /// Visible controls in the active form container.
    async fn find_fields(&self) -> Result<Vec<FieldDescriptor>, BrowserError>;

    async fn apply_value(
        &self,
        field: &FieldDescriptor,
        action: &FieldAction,
    ) -> Result<(), BrowserError>;

    /// Opens a dropdown and returns its rendered option texts.
    async fn load_options(&self, field: &FieldDescriptor) -> Result<Vec<String>, BrowserError>;

    async fn read_validation_errors(&self) -> Result<Vec<String>, BrowserError>;

    /// `NotFound` when no enabled, visible control matches.
    async fn click_control(&self, intent: ControlIntent) -> Result<(), BrowserError>;

    async fn is_application_complete(&self) -> Result<bool, BrowserError>;

    /// Another step with empty fields is showing.
    async fn has_pending_fields(&self) -> Result<bool, BrowserError>;

    async fn exit_prompt_visible(&self) -> Result<bool, BrowserError>;

    /// Picks the option for `choice` and confirms the prompt.
    async fn resolve_exit_prompt(&self, choice: ExitChoice) -> Result<(), BrowserError>;
}

#[async_trait]
pub trait JobBoard: Send + Sync {
    /// Logs in. Failure is fatal for the run.
    async fn establish_session(&self) -> Result<(), BrowserError>;

    async fn search(&self, keyword: &str, location: &str) -> Result<(), BrowserError>;

    /// Number of postings currently listed.
    async fn posting_count(&self) -> Result<usize, BrowserError>;

    /// Opens the posting at `index` and returns its title when readable.
    async fn open_posting(&self, index: usize) -> Result<Option<String>, BrowserError>;

    /// Clicks the Easy Apply control. `Ok(false)` when the posting has none.
    async fn open_easy_apply(&self) -> Result<bool, BrowserError>;

    /// Loads further results. `Ok(false)` when nothing new appeared.
    async fn load_more(&self) -> Result<bool, BrowserError>;

    async fn dismiss_overlays(&self) -> Result<(), BrowserError>;
}
