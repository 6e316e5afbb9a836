//! Deterministic doubles for the generator, embedder, event sink and browser.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::browser::{BrowserError, ControlIntent, ExitChoice, FormDriver, JobBoard};
use crate::config::{Config, EmbeddingBackend};
use crate::embeddings::{Embedder, EmbeddingError};
use crate::events::EventSink;
use crate::form::descriptor::{FieldAction, FieldDescriptor};
use crate::llm_client::{LlmError, TextGenerator};

// ── Config ─────────────────────────────────────────────────────────────────

pub fn test_config() -> Config {
    Config {
        anthropic_api_key: "sk-test".to_string(),
        profile_path: PathBuf::from("profile.json"),
        resume_path: Some(PathBuf::from("cv/resume.pdf")),
        embedding_backend: EmbeddingBackend::Hashing,
        embedding_api_key: None,
        embedding_base_url: "https://api.openai.com/v1".to_string(),
        embedding_model: "text-embedding-3-small".to_string(),
        linkedin_email: Some("ayesha@example.com".to_string()),
        linkedin_password: None,
        search_keyword: Some("rust".to_string()),
        search_location: None,
        webdriver_url: "http://localhost:9515".to_string(),
        headless: true,
        applied_jobs_csv: PathBuf::from("applied_jobs.csv"),
        max_applications: None,
        log_poll_interval: Duration::from_secs(2),
        port: 8080,
        rust_log: "info".to_string(),
    }
}

// ── Generator ──────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct StubGenerator {
    reply: Option<String>,
    calls: Mutex<Vec<(String, u32, f32)>>,
}

impl StubGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            calls: Mutex::default(),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `(prompt, max_tokens, temperature)` of the latest call.
    pub fn last_call(&self) -> Option<(String, u32, f32)> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn complete(
        &self,
        prompt: &str,
        _system: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), max_tokens, temperature));
        match &self.reply {
            Some(reply) => Ok(reply.trim().to_string()),
            None => Err(LlmError::Api {
                status: 503,
                message: "overloaded".to_string(),
            }),
        }
    }
}

// ── Embedder ───────────────────────────────────────────────────────────────

/// Returns configured vectors by exact text; anything else embeds to zeros.
#[derive(Default)]
pub struct StubEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    fail: bool,
    seen: Mutex<Vec<String>>,
}

impl StubEmbedder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen_texts(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.seen.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(EmbeddingError::Api {
                status: 500,
                message: "embedding backend down".to_string(),
            });
        }
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| vec![0.0; 3]))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

// ── Event sink ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.count_containing(needle) > 0
    }

    /// Number of lines containing `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.contains(needle))
            .count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

// ── Form driver ────────────────────────────────────────────────────────────

#[derive(Default)]
struct FormState {
    fields: Vec<FieldDescriptor>,
    next_forms: VecDeque<Vec<FieldDescriptor>>,
    applied: Vec<(String, FieldAction)>,
    clicks: Vec<ControlIntent>,
    advancing_clicks: usize,
    validation_reads: usize,
    exit_choice: Option<ExitChoice>,
}

/// In-memory application form.
///
/// Clicking any present control other than Review counts as a submit and
/// swaps in the next queued form. The application reports complete once
/// `complete_after_clicks` submits have happened.
pub struct ScriptedFormDriver {
    state: Mutex<FormState>,
    controls: Vec<ControlIntent>,
    complete_after: Option<usize>,
    errors: Vec<String>,
    exit_prompt: bool,
    failing: HashSet<String>,
}

impl ScriptedFormDriver {
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self {
            state: Mutex::new(FormState {
                fields,
                ..FormState::default()
            }),
            controls: Vec::new(),
            complete_after: None,
            errors: Vec::new(),
            exit_prompt: false,
            failing: HashSet::new(),
        }
    }

    pub fn with_controls(mut self, controls: &[ControlIntent]) -> Self {
        self.controls = controls.to_vec();
        self
    }

    pub fn complete_after_clicks(mut self, clicks: usize) -> Self {
        self.complete_after = Some(clicks);
        self
    }

    /// Every validation read returns these messages.
    pub fn with_persistent_errors(mut self, errors: &[&str]) -> Self {
        self.errors = errors.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_exit_prompt(mut self) -> Self {
        self.exit_prompt = true;
        self
    }

    pub fn then_form(self, fields: Vec<FieldDescriptor>) -> Self {
        self.state.lock().unwrap().next_forms.push_back(fields);
        self
    }

    pub fn failing_on(mut self, handle: &str) -> Self {
        self.failing.insert(handle.to_string());
        self
    }

    pub fn applied(&self) -> Vec<(String, FieldAction)> {
        self.state.lock().unwrap().applied.clone()
    }

    /// Successful clicks only.
    pub fn clicks(&self) -> Vec<ControlIntent> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn validation_reads(&self) -> usize {
        self.state.lock().unwrap().validation_reads
    }

    pub fn exit_choice(&self) -> Option<ExitChoice> {
        self.state.lock().unwrap().exit_choice
    }
}

#[async_trait]
impl FormDriver for ScriptedFormDriver {
    async fn find_fields(&self) -> Result<Vec<FieldDescriptor>, BrowserError> {
        Ok(self.state.lock().unwrap().fields.clone())
    }

    async fn apply_value(
        &self,
        field: &FieldDescriptor,
        action: &FieldAction,
    ) -> Result<(), BrowserError> {
        if self.failing.contains(&field.handle) {
            return Err(BrowserError::Script(format!("element {} is stale", field.handle)));
        }

        let mut state = self.state.lock().unwrap();
        if let Some(target) = state.fields.iter_mut().find(|f| f.handle == field.handle) {
            match action {
                FieldAction::Type(text) => target.current_value = text.clone(),
                FieldAction::Select { text, .. } => target.current_value = text.clone(),
                FieldAction::Check => target.checked = true,
                FieldAction::Upload(_) => {}
            }
        }
        state.applied.push((field.handle.clone(), action.clone()));
        Ok(())
    }

    async fn load_options(&self, field: &FieldDescriptor) -> Result<Vec<String>, BrowserError> {
        Ok(field.options.clone())
    }

    async fn read_validation_errors(&self) -> Result<Vec<String>, BrowserError> {
        self.state.lock().unwrap().validation_reads += 1;
        Ok(self.errors.clone())
    }

    async fn click_control(&self, intent: ControlIntent) -> Result<(), BrowserError> {
        if !self.controls.contains(&intent) {
            return Err(BrowserError::NotFound(format!("{intent:?} button")));
        }
        let mut state = self.state.lock().unwrap();
        state.clicks.push(intent);
        if intent != ControlIntent::Review {
            state.advancing_clicks += 1;
            if let Some(next) = state.next_forms.pop_front() {
                state.fields = next;
            }
        }
        Ok(())
    }

    async fn is_application_complete(&self) -> Result<bool, BrowserError> {
        let clicks = self.state.lock().unwrap().advancing_clicks;
        Ok(self.complete_after.is_some_and(|n| clicks >= n))
    }

    async fn has_pending_fields(&self) -> Result<bool, BrowserError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .fields
            .iter()
            .any(|f| f.kind.is_free_text() && !f.has_value()))
    }

    async fn exit_prompt_visible(&self) -> Result<bool, BrowserError> {
        Ok(self.exit_prompt)
    }

    async fn resolve_exit_prompt(&self, choice: ExitChoice) -> Result<(), BrowserError> {
        self.state.lock().unwrap().exit_choice = Some(choice);
        Ok(())
    }
}

// ── Job board ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct BoardState {
    current: Option<usize>,
    revealed: bool,
    dismissals: usize,
}

/// In-memory search results: `(title, has Easy Apply)` per posting.
#[derive(Default)]
pub struct ScriptedJobBoard {
    postings: Vec<(Option<String>, bool)>,
    initially_visible: Option<usize>,
    fail_session: bool,
    state: Mutex<BoardState>,
}

impl ScriptedJobBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posting(mut self, title: Option<&str>, easy_apply: bool) -> Self {
        self.postings.push((title.map(str::to_string), easy_apply));
        self
    }

    pub fn failing_session(mut self) -> Self {
        self.fail_session = true;
        self
    }

    /// Only the first `n` postings are listed until `load_more` is called.
    pub fn initially_visible(mut self, n: usize) -> Self {
        self.initially_visible = Some(n);
        self
    }

    pub fn dismissals(&self) -> usize {
        self.state.lock().unwrap().dismissals
    }
}

#[async_trait]
impl JobBoard for ScriptedJobBoard {
    async fn establish_session(&self) -> Result<(), BrowserError> {
        if self.fail_session {
            return Err(BrowserError::Session("login rejected".to_string()));
        }
        Ok(())
    }

    async fn search(&self, _keyword: &str, _location: &str) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn posting_count(&self) -> Result<usize, BrowserError> {
        let state = self.state.lock().unwrap();
        Ok(match self.initially_visible {
            Some(n) if !state.revealed => n.min(self.postings.len()),
            _ => self.postings.len(),
        })
    }

    async fn open_posting(&self, index: usize) -> Result<Option<String>, BrowserError> {
        let (title, _) = self
            .postings
            .get(index)
            .ok_or_else(|| BrowserError::NotFound(format!("posting {index}")))?;
        self.state.lock().unwrap().current = Some(index);
        Ok(title.clone())
    }

    async fn open_easy_apply(&self) -> Result<bool, BrowserError> {
        let current = self.state.lock().unwrap().current;
        Ok(current
            .and_then(|i| self.postings.get(i))
            .is_some_and(|(_, easy)| *easy))
    }

    async fn load_more(&self) -> Result<bool, BrowserError> {
        let mut state = self.state.lock().unwrap();
        if self.initially_visible.is_some() && !state.revealed {
            state.revealed = true;
            return Ok(true);
        }
        Ok(false)
    }

    async fn dismiss_overlays(&self) -> Result<(), BrowserError> {
        self.state.lock().unwrap().dismissals += 1;
        Ok(())
    }
}
