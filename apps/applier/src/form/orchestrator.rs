//! Form Fill Orchestrator.
//!
//! One pass through the state machine per form step:
//!
//! ```text
//! SCANNING → FILLING → VALIDATING → SUBMITTING → NEXT_STEP | COMPLETE | FAILED
//!                          │
//!                          └─ errors → numeric repair → FILLING → VALIDATING (once)
//! ```
//!
//! Field-level failures are logged and skipped. Only a blocked or impossible
//! submit ends the attempt as FAILED, and the step cap ends it as COMPLETE.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::answers::{is_not_available, numeric, AnswerResolver};
use crate::bot::StopSignal;
use crate::browser::{BrowserError, ControlIntent, ExitChoice, FormDriver};
use crate::events::EventSink;
use crate::form::classifier::{implies_consent, FieldClassifier, ResolutionStrategy, ResolverPath};
use crate::form::descriptor::{FieldAction, FieldDescriptor, FieldKind};
use crate::form::selection::{self, Selection, SelectionReason};

/// Form steps attempted before assuming the application went through.
pub const MAX_STEPS: usize = 10;

const VALIDATION_KEYWORDS: &[&str] = &[
    "please",
    "required",
    "invalid",
    "enter",
    "must",
    "decimal number",
];

/// Written into a numeric input that still holds no digits after a
/// number-related validation error.
const NUMERIC_REPAIR_FALLBACK: &str = "10";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillState {
    Scanning,
    Filling,
    Validating,
    Submitting,
    NextStep,
    Complete,
    Failed,
    /// Stop requested between steps.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillOutcome {
    pub state: FillState,
    pub steps: usize,
    pub repair_passes: usize,
    pub fields_filled: usize,
}

impl FillOutcome {
    fn new() -> Self {
        Self {
            state: FillState::Scanning,
            steps: 0,
            repair_passes: 0,
            fields_filled: 0,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.state == FillState::Complete
    }
}

#[derive(Debug)]
enum SubmitBlocked {
    Placeholder(String),
    NoControl,
}

pub struct FormFiller {
    resolver: Arc<AnswerResolver>,
    classifier: FieldClassifier,
    resume_path: Option<PathBuf>,
    sink: Arc<dyn EventSink>,
    stop: StopSignal,
}

impl FormFiller {
    pub fn new(
        resolver: Arc<AnswerResolver>,
        resume_path: Option<PathBuf>,
        sink: Arc<dyn EventSink>,
        stop: StopSignal,
    ) -> Self {
        Self {
            resolver,
            classifier: FieldClassifier::new(ResolverPath::Dynamic),
            resume_path,
            sink,
            stop,
        }
    }

    /// Drives an opened application form to a terminal state.
    pub async fn run(&self, driver: &dyn FormDriver) -> FillOutcome {
        let mut outcome = FillOutcome::new();
        let mut submitted = false;

        loop {
            if self.stop.is_requested() {
                self.sink.emit("Stop requested, leaving the form");
                outcome.state = FillState::Cancelled;
                break;
            }
            if outcome.steps >= MAX_STEPS {
                self.sink
                    .emit("Application flow reached the step limit, assuming complete");
                outcome.state = FillState::Complete;
                break;
            }

            outcome.steps += 1;
            outcome.state = FillState::Scanning;
            self.sink
                .emit(&format!("--- Application step {} ---", outcome.steps));

            outcome.state = FillState::Filling;
            outcome.fields_filled += self.fill_visible_fields(driver).await;

            outcome.state = FillState::Validating;
            let errors = self.validation_errors(driver).await;
            if !errors.is_empty() {
                outcome.repair_passes += 1;
                self.repair_pass(driver, &errors, &mut outcome).await;
            }

            outcome.state = FillState::Submitting;
            match self.submit(driver, submitted).await {
                Ok(()) => submitted = true,
                Err(SubmitBlocked::NoControl) if submitted => {
                    self.sink
                        .emit("No more submit buttons found, assuming application complete");
                    outcome.state = FillState::Complete;
                    break;
                }
                Err(SubmitBlocked::NoControl) => {
                    self.sink.emit("Could not find a submit button");
                    outcome.state = FillState::Failed;
                    break;
                }
                Err(SubmitBlocked::Placeholder(label)) => {
                    self.sink.emit(&format!(
                        "Skipping submit: required dropdown '{label}' is unfilled"
                    ));
                    outcome.state = FillState::Failed;
                    break;
                }
            }

            if self.check(driver.is_application_complete().await, "completion check") {
                self.sink.emit("Application completed successfully!");
                outcome.state = FillState::Complete;
                break;
            }

            outcome.state = FillState::NextStep;
            if self.check(driver.has_pending_fields().await, "pending-field check") {
                self.sink.emit("Found another form step with fields to fill");
            }
        }

        self.handle_exit_prompt(driver, outcome.succeeded()).await;
        outcome
    }

    // ── FILLING ────────────────────────────────────────────────────────────

    async fn fill_visible_fields(&self, driver: &dyn FormDriver) -> usize {
        let fields = match driver.find_fields().await {
            Ok(fields) => fields,
            Err(e) => {
                self.sink.emit(&format!("Could not scan form fields: {e}"));
                return 0;
            }
        };
        debug!(count = fields.len(), "Scanned form fields");

        let mut filled = 0;
        for kind in FieldKind::FILL_ORDER {
            for field in fields.iter().filter(|f| f.kind == kind) {
                match self.fill_field(driver, field).await {
                    Ok(true) => filled += 1,
                    Ok(false) => {}
                    Err(e) => self
                        .sink
                        .emit(&format!("Error filling {kind} '{}': {e}", field.label)),
                }
            }
        }
        filled
    }

    /// Returns whether an action was applied.
    async fn fill_field(
        &self,
        driver: &dyn FormDriver,
        field: &FieldDescriptor,
    ) -> Result<bool, BrowserError> {
        let strategy = self.classifier.classify(&field.label, field.kind);

        match strategy {
            ResolutionStrategy::ResumeUpload => return self.upload_resume(driver, field).await,
            ResolutionStrategy::Consent => return self.check_consent(driver, field).await,
            _ => {}
        }

        if field.kind.is_free_text() && field.has_value() {
            return Ok(false);
        }

        let answer = self.answer_for(&strategy, &field.label).await;

        match field.kind {
            FieldKind::Text | FieldKind::Textarea => self.type_answer(driver, field, &answer).await,
            FieldKind::RadioGroup => {
                let chosen = selection::choose_radio(&field.options, &answer);
                self.select(driver, field, &answer, chosen).await
            }
            FieldKind::Dropdown => {
                let options = self.options_for(driver, field).await;
                let chosen = selection::choose_dropdown(&options, &answer);
                self.select(driver, field, &answer, chosen).await
            }
            FieldKind::CustomDropdown => {
                let options = self.options_for(driver, field).await;
                let chosen = selection::choose_custom_dropdown(&options, &answer);
                self.select(driver, field, &answer, chosen).await
            }
            FieldKind::Checkbox | FieldKind::FileUpload => Ok(false),
        }
    }

    async fn answer_for(&self, strategy: &ResolutionStrategy, label: &str) -> String {
        match strategy {
            ResolutionStrategy::Profile { keys, default } => self
                .resolver
                .profile()
                .first_value(keys)
                .unwrap_or(default)
                .to_string(),
            ResolutionStrategy::Delegate(ResolverPath::Dynamic) => self.resolver.resolve(label).await,
            ResolutionStrategy::Delegate(ResolverPath::Generic) => {
                self.resolver.answer_generic(label).await
            }
            ResolutionStrategy::ResumeUpload | ResolutionStrategy::Consent => String::new(),
        }
    }

    async fn type_answer(
        &self,
        driver: &dyn FormDriver,
        field: &FieldDescriptor,
        answer: &str,
    ) -> Result<bool, BrowserError> {
        let answer = answer.trim();
        if answer.is_empty() {
            self.sink
                .emit(&format!("No data found for field: {}", field.label));
            return Ok(false);
        }

        let value = if numeric::is_numeric_label(&field.label) && !numeric::is_plain_number(answer) {
            numeric::coerce_numeric(&field.label, answer)
        } else {
            answer.to_string()
        };

        driver
            .apply_value(field, &FieldAction::Type(value.clone()))
            .await?;
        self.sink
            .emit(&format!("Filling {}: {} = {}", field.kind, field.label, value));
        Ok(true)
    }

    async fn options_for(&self, driver: &dyn FormDriver, field: &FieldDescriptor) -> Vec<String> {
        match driver.load_options(field).await {
            Ok(options) if !options.is_empty() => options,
            Ok(_) => field.options.clone(),
            Err(e) => {
                debug!(label = %field.label, "Could not load options: {e}");
                field.options.clone()
            }
        }
    }

    async fn select(
        &self,
        driver: &dyn FormDriver,
        field: &FieldDescriptor,
        answer: &str,
        chosen: Option<Selection>,
    ) -> Result<bool, BrowserError> {
        let Some(chosen) = chosen else {
            self.sink.emit(&format!(
                "No option of {} '{}' matches '{}', leaving it unselected",
                field.kind, field.label, answer
            ));
            return Ok(false);
        };

        let note = match chosen.reason {
            SelectionReason::Matched => "",
            SelectionReason::YesDefault => " (no confident match, defaulted to Yes)",
            SelectionReason::SecondOption => " (no match, fell back to the second option)",
        };

        driver
            .apply_value(
                field,
                &FieldAction::Select {
                    index: chosen.index,
                    text: chosen.text.clone(),
                },
            )
            .await?;
        self.sink.emit(&format!(
            "Answering {}: {} -> {}{}",
            field.kind, field.label, chosen.text, note
        ));
        Ok(true)
    }

    async fn upload_resume(
        &self,
        driver: &dyn FormDriver,
        field: &FieldDescriptor,
    ) -> Result<bool, BrowserError> {
        let Some(path) = self.resume_path.as_ref() else {
            self.sink.emit("No résumé path configured, skipping file upload");
            return Ok(false);
        };
        let path = if path.is_absolute() {
            path.clone()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.clone())
        };
        driver
            .apply_value(field, &FieldAction::Upload(path.clone()))
            .await?;
        self.sink.emit(&format!("Uploaded file: {}", path.display()));
        Ok(true)
    }

    async fn check_consent(
        &self,
        driver: &dyn FormDriver,
        field: &FieldDescriptor,
    ) -> Result<bool, BrowserError> {
        if field.checked || !implies_consent(&field.label) {
            return Ok(false);
        }
        driver.apply_value(field, &FieldAction::Check).await?;
        self.sink
            .emit(&format!("Checkbox clicked: {}", field.label));
        Ok(true)
    }

    // ── VALIDATING ─────────────────────────────────────────────────────────

    async fn validation_errors(&self, driver: &dyn FormDriver) -> Vec<String> {
        match driver.read_validation_errors().await {
            Ok(messages) => messages
                .into_iter()
                .map(|m| m.trim().to_string())
                .filter(|m| is_validation_message(m))
                .collect(),
            Err(e) => {
                debug!("Could not read validation errors: {e}");
                Vec::new()
            }
        }
    }

    /// Exactly one repair pass: numeric re-extraction, one more fill, one more
    /// validation read. Remaining errors are logged and the step proceeds.
    async fn repair_pass(
        &self,
        driver: &dyn FormDriver,
        errors: &[String],
        outcome: &mut FillOutcome,
    ) {
        for error in errors {
            self.sink.emit(&format!("Validation error: {error}"));
        }

        if errors.iter().any(|e| e.to_lowercase().contains("number")) {
            self.repair_numeric_fields(driver).await;
        }

        outcome.state = FillState::Filling;
        outcome.fields_filled += self.fill_visible_fields(driver).await;

        outcome.state = FillState::Validating;
        let remaining = self.validation_errors(driver).await;
        if !remaining.is_empty() {
            warn!(count = remaining.len(), "Validation errors persist after repair pass");
            self.sink.emit(&format!(
                "{} validation error(s) remain after the repair pass, continuing",
                remaining.len()
            ));
        }
    }

    async fn repair_numeric_fields(&self, driver: &dyn FormDriver) {
        let fields = match driver.find_fields().await {
            Ok(fields) => fields,
            Err(e) => {
                self.sink.emit(&format!("Error fixing numeric fields: {e}"));
                return;
            }
        };

        for field in fields.iter().filter(|f| {
            f.accepts_numeric_repair() && f.has_value() && !numeric::is_plain_number(&f.current_value)
        }) {
            let number = match numeric::first_number(&field.current_value) {
                Some(number) => number,
                None if needs_numeric_fallback(field) => NUMERIC_REPAIR_FALLBACK,
                None => continue,
            };
            match driver
                .apply_value(field, &FieldAction::Type(number.to_string()))
                .await
            {
                Ok(()) => self.sink.emit(&format!(
                    "Fixed numeric field '{}' with value: {number}",
                    field.label
                )),
                Err(e) => self
                    .sink
                    .emit(&format!("Error fixing numeric field '{}': {e}", field.label)),
            }
        }
    }

    // ── SUBMITTING ─────────────────────────────────────────────────────────

    async fn submit(&self, driver: &dyn FormDriver, after_first: bool) -> Result<(), SubmitBlocked> {
        match driver.find_fields().await {
            Ok(fields) => {
                if let Some(field) = fields.iter().find(|f| f.required && f.holds_placeholder()) {
                    return Err(SubmitBlocked::Placeholder(field.label.clone()));
                }
            }
            Err(e) => debug!("Pre-submit rescan failed: {e}"),
        }

        if after_first && driver.click_control(ControlIntent::Review).await.is_ok() {
            self.sink.emit("Clicked Review button");
        }

        for intent in ControlIntent::SUBMIT_PRIORITY {
            match driver.click_control(intent).await {
                Ok(()) => {
                    self.sink.emit(&format!("Clicked {intent:?} button"));
                    return Ok(());
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    self.sink.emit(&format!("Clicking {intent:?} failed: {e}"));
                    continue;
                }
            }
        }
        Err(SubmitBlocked::NoControl)
    }

    async fn handle_exit_prompt(&self, driver: &dyn FormDriver, complete: bool) {
        if !self.check(driver.exit_prompt_visible().await, "exit prompt check") {
            return;
        }
        let choice = if complete {
            ExitChoice::Save
        } else {
            ExitChoice::Discard
        };
        match driver.resolve_exit_prompt(choice).await {
            Ok(()) => self.sink.emit(&format!(
                "Exit prompt resolved ({} application)",
                choice.label()
            )),
            Err(e) => self
                .sink
                .emit(&format!("Could not handle save/discard prompt: {e}")),
        }
    }

    /// Treats a failed browser probe as "no".
    fn check(&self, result: Result<bool, BrowserError>, what: &str) -> bool {
        result.unwrap_or_else(|e| {
            debug!("{what} failed: {e}");
            false
        })
    }
}

pub fn is_validation_message(text: &str) -> bool {
    let lowered = text.to_lowercase();
    !lowered.is_empty() && VALIDATION_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Digit-free values the repair pass may replace outright: the sentinel, or
/// anything in a field that is numeric by type or label.
fn needs_numeric_fallback(field: &FieldDescriptor) -> bool {
    is_not_available(&field.current_value)
        || field.input_type == "number"
        || numeric::is_numeric_label(&field.label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingSink, ScriptedFormDriver, StubEmbedder, StubGenerator};
    use crate::profile::ProfileStore;

    const PROFILE: &str = "FULL_NAME: Ayesha Khan\nEMAIL: ayesha@example.com\nEXPERIENCE_YEARS: 6";

    async fn filler_with(generator: StubGenerator, stop: StopSignal) -> (FormFiller, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let resolver = AnswerResolver::build(
            Arc::new(ProfileStore::from_text_str(PROFILE).unwrap()),
            Arc::new(StubEmbedder::default()),
            Arc::new(generator),
            String::new(),
            sink.clone(),
        )
        .await;
        let filler = FormFiller::new(
            Arc::new(resolver),
            Some(PathBuf::from("/tmp/resume.pdf")),
            sink.clone(),
            stop,
        );
        (filler, sink)
    }

    async fn filler(generator: StubGenerator) -> (FormFiller, Arc<RecordingSink>) {
        filler_with(generator, StopSignal::default()).await
    }

    #[tokio::test]
    async fn test_fills_in_kind_order_and_completes() {
        let driver = ScriptedFormDriver::new(vec![
            FieldDescriptor::new("c1", "I agree to the terms", FieldKind::Checkbox),
            FieldDescriptor::new("t1", "Email address", FieldKind::Text).required(),
            FieldDescriptor::new("r1", "Are you willing to relocate?", FieldKind::RadioGroup)
                .with_options(["Yes", "No"]),
            FieldDescriptor::new("f1", "Upload resume", FieldKind::FileUpload),
        ])
        .with_controls(&[ControlIntent::SubmitApplication])
        .complete_after_clicks(1);

        let (filler, _) = filler(StubGenerator::failing()).await;
        let outcome = filler.run(&driver).await;

        assert_eq!(outcome.state, FillState::Complete);
        assert_eq!(outcome.steps, 1);
        assert_eq!(outcome.fields_filled, 4);

        let order: Vec<String> = driver.applied().into_iter().map(|(handle, _)| handle).collect();
        assert_eq!(order, vec!["r1", "t1", "f1", "c1"]);
        assert_eq!(
            driver.applied()[1].1,
            FieldAction::Type("ayesha@example.com".to_string())
        );
        assert_eq!(driver.clicks(), vec![ControlIntent::SubmitApplication]);
    }

    #[tokio::test]
    async fn test_numeric_label_coerces_free_text_answer() {
        let driver = ScriptedFormDriver::new(vec![FieldDescriptor::new(
            "t1",
            "Number of Kotlin apps shipped",
            FieldKind::Text,
        )])
        .with_controls(&[ControlIntent::Submit])
        .complete_after_clicks(1);

        let (filler, _) = filler(StubGenerator::replying("around 5 years")).await;
        filler.run(&driver).await;

        assert_eq!(driver.applied()[0].1, FieldAction::Type("5".to_string()));
    }

    #[tokio::test]
    async fn test_prefilled_text_is_not_overwritten() {
        let driver = ScriptedFormDriver::new(vec![
            FieldDescriptor::new("t1", "Email address", FieldKind::Text).with_value("other@example.com"),
        ])
        .with_controls(&[ControlIntent::Submit])
        .complete_after_clicks(1);

        let (filler, _) = filler(StubGenerator::failing()).await;
        let outcome = filler.run(&driver).await;

        assert!(driver.applied().is_empty());
        assert_eq!(outcome.fields_filled, 0);
    }

    #[tokio::test]
    async fn test_radio_two_options_unresolved_selects_yes() {
        let driver = ScriptedFormDriver::new(vec![FieldDescriptor::new(
            "r1",
            "Do you hold a valid work permit?",
            FieldKind::RadioGroup,
        )
        .with_options(["No", "Yes"])])
        .with_controls(&[ControlIntent::Submit])
        .complete_after_clicks(1);

        let (filler, sink) = filler(StubGenerator::failing()).await;
        filler.run(&driver).await;

        assert_eq!(
            driver.applied()[0].1,
            FieldAction::Select {
                index: 1,
                text: "Yes".to_string()
            }
        );
        assert!(sink.contains("Answering radio"));
    }

    #[tokio::test]
    async fn test_dropdown_second_option_fallback() {
        let driver = ScriptedFormDriver::new(vec![FieldDescriptor::new(
            "d1",
            "Preferred shift",
            FieldKind::Dropdown,
        )
        .with_options(["Select an option", "Morning", "Evening"])])
        .with_controls(&[ControlIntent::Submit])
        .complete_after_clicks(1);

        let (filler, _) = filler(StubGenerator::failing()).await;
        filler.run(&driver).await;

        assert_eq!(
            driver.applied()[0].1,
            FieldAction::Select {
                index: 1,
                text: "Morning".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_validation_loop_gets_exactly_one_repair_pass() {
        let driver = ScriptedFormDriver::new(vec![FieldDescriptor::new(
            "t1",
            "Kotlin experience",
            FieldKind::Text,
        )
        .with_value("5 years")])
        .with_persistent_errors(&["Enter a decimal number larger than 0.0"])
        .with_controls(&[ControlIntent::Submit])
        .complete_after_clicks(1);

        let (filler, sink) = filler(StubGenerator::failing()).await;
        let outcome = filler.run(&driver).await;

        assert_eq!(outcome.repair_passes, 1);
        assert_eq!(outcome.state, FillState::Complete);
        assert_eq!(driver.validation_reads(), 2);
        assert_eq!(driver.applied()[0].1, FieldAction::Type("5".to_string()));
        assert!(sink.contains("remain after the repair pass"));
    }

    #[tokio::test]
    async fn test_numeric_error_replaces_na_with_fallback_number() {
        let driver = ScriptedFormDriver::new(vec![FieldDescriptor::new(
            "t1",
            "Kotlin experience",
            FieldKind::Text,
        )])
        .with_persistent_errors(&["Enter a whole number between 0 and 99"])
        .with_controls(&[ControlIntent::Submit])
        .complete_after_clicks(1);

        let (filler, sink) = filler(StubGenerator::failing()).await;
        filler.run(&driver).await;

        let applied = driver.applied();
        assert_eq!(applied[0].1, FieldAction::Type("N/A".to_string()));
        assert_eq!(applied[1].1, FieldAction::Type("10".to_string()));
        assert!(sink.contains("Fixed numeric field 'Kotlin experience' with value: 10"));
    }

    #[tokio::test]
    async fn test_numeric_repair_leaves_digit_free_text_alone() {
        let driver = ScriptedFormDriver::new(vec![
            FieldDescriptor::new("t1", "Preferred name", FieldKind::Text).with_value("Ayesha"),
        ])
        .with_persistent_errors(&["Please enter a valid number"])
        .with_controls(&[ControlIntent::Submit])
        .complete_after_clicks(1);

        let (filler, _) = filler(StubGenerator::failing()).await;
        filler.run(&driver).await;

        assert!(driver.applied().is_empty());
    }

    #[tokio::test]
    async fn test_non_validation_messages_are_ignored() {
        let driver = ScriptedFormDriver::new(vec![])
            .with_persistent_errors(&["Saved draft"])
            .with_controls(&[ControlIntent::Submit])
            .complete_after_clicks(1);

        let (filler, _) = filler(StubGenerator::failing()).await;
        let outcome = filler.run(&driver).await;
        assert_eq!(outcome.repair_passes, 0);
    }

    #[tokio::test]
    async fn test_placeholder_dropdown_blocks_submit_and_discards() {
        let driver = ScriptedFormDriver::new(vec![FieldDescriptor::new(
            "d1",
            "Highest degree",
            FieldKind::Dropdown,
        )
        .required()
        .with_value("Select an option")
        .with_options(["Select an option"])])
        .with_controls(&[ControlIntent::Submit])
        .with_exit_prompt();

        let (filler, sink) = filler(StubGenerator::failing()).await;
        let outcome = filler.run(&driver).await;

        assert_eq!(outcome.state, FillState::Failed);
        assert!(driver.clicks().is_empty());
        assert!(sink.contains("Skipping submit: required dropdown 'Highest degree'"));
        assert_eq!(driver.exit_choice(), Some(ExitChoice::Discard));
    }

    #[tokio::test]
    async fn test_missing_submit_on_first_step_fails() {
        let driver = ScriptedFormDriver::new(vec![]);
        let (filler, _) = filler(StubGenerator::failing()).await;
        let outcome = filler.run(&driver).await;
        assert_eq!(outcome.state, FillState::Failed);
        assert_eq!(outcome.steps, 1);
    }

    #[tokio::test]
    async fn test_multi_step_clicks_review_after_first_submit() {
        let driver = ScriptedFormDriver::new(vec![FieldDescriptor::new(
            "t1",
            "Full name",
            FieldKind::Text,
        )])
        .then_form(vec![FieldDescriptor::new("t2", "Mobile phone", FieldKind::Text)])
        .with_controls(&[ControlIntent::Review, ControlIntent::Next, ControlIntent::Submit])
        .complete_after_clicks(2)
        .with_exit_prompt();

        let (filler, _) = filler(StubGenerator::failing()).await;
        let outcome = filler.run(&driver).await;

        assert_eq!(outcome.state, FillState::Complete);
        assert_eq!(outcome.steps, 2);
        assert_eq!(
            driver.clicks(),
            vec![ControlIntent::Submit, ControlIntent::Review, ControlIntent::Submit]
        );
        assert_eq!(driver.exit_choice(), Some(ExitChoice::Save));
    }

    #[tokio::test]
    async fn test_step_cap_assumes_complete() {
        let driver = ScriptedFormDriver::new(vec![]).with_controls(&[ControlIntent::Next]);

        let (filler, _) = filler(StubGenerator::failing()).await;
        let outcome = filler.run(&driver).await;

        assert_eq!(outcome.state, FillState::Complete);
        assert_eq!(outcome.steps, MAX_STEPS);
        assert_eq!(driver.clicks().len(), MAX_STEPS);
    }

    #[tokio::test]
    async fn test_stop_signal_checked_before_step() {
        let stop = StopSignal::default();
        stop.request();
        let driver = ScriptedFormDriver::new(vec![FieldDescriptor::new(
            "t1",
            "Full name",
            FieldKind::Text,
        )])
        .with_controls(&[ControlIntent::Submit]);

        let (filler, _) = filler_with(StubGenerator::failing(), stop).await;
        let outcome = filler.run(&driver).await;

        assert_eq!(outcome.state, FillState::Cancelled);
        assert_eq!(outcome.steps, 0);
        assert!(driver.applied().is_empty());
    }

    #[tokio::test]
    async fn test_field_failure_does_not_abort_step() {
        let driver = ScriptedFormDriver::new(vec![
            FieldDescriptor::new("t1", "Full name", FieldKind::Text),
            FieldDescriptor::new("t2", "Email", FieldKind::Text),
        ])
        .failing_on("t1")
        .with_controls(&[ControlIntent::Submit])
        .complete_after_clicks(1);

        let (filler, sink) = filler(StubGenerator::failing()).await;
        let outcome = filler.run(&driver).await;

        assert_eq!(outcome.fields_filled, 1);
        assert_eq!(outcome.state, FillState::Complete);
        assert!(sink.contains("Error filling input 'Full name'"));
    }

    #[test]
    fn test_validation_keyword_scan() {
        assert!(is_validation_message("Please enter a valid answer"));
        assert!(is_validation_message("Enter a decimal number larger than 0.0"));
        assert!(!is_validation_message("Saved draft"));
        assert!(!is_validation_message(""));
    }
}
