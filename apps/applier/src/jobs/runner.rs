//! Job Loop Controller.
//!
//! Postings are handled strictly one at a time: open, log, look for Easy
//! Apply, run the form engine, dismiss overlays, advance. Only a session
//! failure or the stop flag ends the loop early.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::bot::StopSignal;
use crate::browser::{BrowserError, FormDriver, JobBoard};
use crate::events::EventSink;
use crate::form::{FillState, FormFiller};
use crate::jobs::applied_log::{AppliedLog, ApplicationAttempt};

#[derive(Debug, Clone)]
pub struct SearchParams {
    pub keyword: String,
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub applied: usize,
    pub failed: usize,
    pub skipped: usize,
    pub stopped_early: bool,
}

pub struct JobRunner {
    board: Arc<dyn JobBoard>,
    form: Arc<dyn FormDriver>,
    filler: FormFiller,
    log: AppliedLog,
    sink: Arc<dyn EventSink>,
    stop: StopSignal,
    max_applications: Option<usize>,
}

impl JobRunner {
    pub fn new(
        board: Arc<dyn JobBoard>,
        form: Arc<dyn FormDriver>,
        filler: FormFiller,
        log: AppliedLog,
        sink: Arc<dyn EventSink>,
        stop: StopSignal,
    ) -> Self {
        Self {
            board,
            form,
            filler,
            log,
            sink,
            stop,
            max_applications: None,
        }
    }

    pub fn with_max_applications(mut self, max: Option<usize>) -> Self {
        self.max_applications = max;
        self
    }

    /// Runs the whole loop. `Err` only for a session failure, which has
    /// already been reported through the sink.
    pub async fn run(&self, search: &SearchParams) -> Result<RunSummary, BrowserError> {
        self.sink.emit("Establishing session...");
        if let Err(e) = self.board.establish_session().await {
            self.sink.emit(&format!("Session failure: {e}"));
            return Err(e);
        }

        self.sink.emit(&format!(
            "Searching for '{}' in '{}'",
            search.keyword, search.location
        ));
        if let Err(e) = self.board.search(&search.keyword, &search.location).await {
            self.sink.emit(&format!("Session failure during search: {e}"));
            return Err(e);
        }

        let mut summary = RunSummary::default();
        let mut index = 0;

        loop {
            if self.stop.is_requested() {
                self.sink.emit("Stop requested, ending job loop");
                summary.stopped_early = true;
                break;
            }
            if self.max_applications.is_some_and(|max| summary.processed >= max) {
                self.sink
                    .emit(&format!("Reached the limit of {} postings", summary.processed));
                break;
            }

            if index >= self.posting_count().await {
                let more = self.board.load_more().await.unwrap_or_else(|e| {
                    warn!("Loading more postings failed: {e}");
                    false
                });
                if !more || index >= self.posting_count().await {
                    self.sink.emit("No more job postings to process");
                    break;
                }
            }

            self.process_posting(index, &search.keyword, &mut summary)
                .await;
            index += 1;
        }

        info!(?summary, "Job loop finished");
        self.sink.emit(&format!(
            "Run finished: {} processed, {} applied, {} failed, {} skipped",
            summary.processed, summary.applied, summary.failed, summary.skipped
        ));
        Ok(summary)
    }

    async fn posting_count(&self) -> usize {
        self.board.posting_count().await.unwrap_or_else(|e| {
            warn!("Could not count postings: {e}");
            0
        })
    }

    async fn process_posting(&self, index: usize, keyword: &str, summary: &mut RunSummary) {
        summary.processed += 1;
        let number = index + 1;

        let title = match self.board.open_posting(index).await {
            Ok(Some(title)) if !title.trim().is_empty() => title.trim().to_string(),
            Ok(_) => format!("Job #{number}"),
            Err(e) => {
                self.sink.emit(&format!("Could not open job #{number}: {e}"));
                format!("Job #{number}")
            }
        };
        self.sink.emit(&format!("Opened job #{number}: {title}"));

        if let Err(e) = self.log.append(&ApplicationAttempt::new(&title, keyword)) {
            self.sink.emit(&format!("Could not record '{title}': {e}"));
        }

        match self.board.open_easy_apply().await {
            Ok(true) => {
                let outcome = self.filler.run(self.form.as_ref()).await;
                match outcome.state {
                    FillState::Complete => summary.applied += 1,
                    FillState::Cancelled => {}
                    _ => summary.failed += 1,
                }
                self.sink.emit(&format!(
                    "Finished '{title}': {:?} after {} step(s), {} field(s) filled",
                    outcome.state, outcome.steps, outcome.fields_filled
                ));
            }
            Ok(false) => {
                summary.skipped += 1;
                self.sink
                    .emit(&format!("No Easy Apply on '{title}', skipping"));
            }
            Err(e) if e.is_not_found() => {
                summary.skipped += 1;
                self.sink
                    .emit(&format!("No Easy Apply on '{title}', skipping"));
            }
            Err(e) => {
                summary.failed += 1;
                self.sink
                    .emit(&format!("Easy Apply failed on '{title}': {e}"));
            }
        }

        if let Err(e) = self.board.dismiss_overlays().await {
            warn!("Could not dismiss overlays: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::AnswerResolver;
    use crate::browser::ControlIntent;
    use crate::form::{FieldDescriptor, FieldKind};
    use crate::profile::ProfileStore;
    use crate::test_support::{
        RecordingSink, ScriptedFormDriver, ScriptedJobBoard, StubEmbedder, StubGenerator,
    };

    struct Fixture {
        runner: JobRunner,
        log: AppliedLog,
        board: Arc<ScriptedJobBoard>,
        sink: Arc<RecordingSink>,
        stop: StopSignal,
        _dir: tempfile::TempDir,
    }

    async fn fixture(board: ScriptedJobBoard) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let log = AppliedLog::new(dir.path().join("applied_jobs.csv"));
        let sink = Arc::new(RecordingSink::default());
        let stop = StopSignal::default();

        let resolver = AnswerResolver::build(
            Arc::new(ProfileStore::from_text_str("FULL_NAME: Ayesha Khan").unwrap()),
            Arc::new(StubEmbedder::default()),
            Arc::new(StubGenerator::failing()),
            String::new(),
            sink.clone(),
        )
        .await;
        let filler = FormFiller::new(Arc::new(resolver), None, sink.clone(), stop.clone());

        let form = Arc::new(
            ScriptedFormDriver::new(vec![FieldDescriptor::new(
                "t1",
                "Full name",
                FieldKind::Text,
            )])
            .with_controls(&[ControlIntent::SubmitApplication])
            .complete_after_clicks(1),
        );
        let board = Arc::new(board);

        let runner = JobRunner::new(
            board.clone(),
            form,
            filler,
            log.clone(),
            sink.clone(),
            stop.clone(),
        );

        Fixture {
            runner,
            log,
            board,
            sink,
            stop,
            _dir: dir,
        }
    }

    fn search() -> SearchParams {
        SearchParams {
            keyword: "rust".to_string(),
            location: "Remote".to_string(),
        }
    }

    #[tokio::test]
    async fn test_skipped_posting_still_logged() {
        let board = ScriptedJobBoard::new()
            .posting(Some("Rust Engineer"), true)
            .posting(Some("Platform Engineer"), false)
            .posting(None, true);
        let f = fixture(board).await;

        let summary = f.runner.run(&search()).await.unwrap();

        assert_eq!(summary.processed, 3);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.applied + summary.failed, 2);
        assert!(!summary.stopped_early);

        let rows = f.log.read_all().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].job_title, "Job #3");
        assert!(rows.iter().all(|r| r.search_keyword == "rust"));
        assert_eq!(f.board.dismissals(), 3);
    }

    #[tokio::test]
    async fn test_session_failure_is_fatal_and_reported_once() {
        let f = fixture(ScriptedJobBoard::new().posting(Some("A"), true).failing_session()).await;

        let result = f.runner.run(&search()).await;

        assert!(matches!(result, Err(BrowserError::Session(_))));
        assert_eq!(f.sink.count_containing("Session failure"), 1);
        assert!(f.log.read_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_more_extends_the_list() {
        let board = ScriptedJobBoard::new()
            .posting(Some("A"), false)
            .posting(Some("B"), false)
            .posting(Some("C"), false)
            .initially_visible(2);
        let f = fixture(board).await;

        let summary = f.runner.run(&search()).await.unwrap();

        assert_eq!(summary.processed, 3);
        assert_eq!(summary.skipped, 3);
        assert!(f.sink.contains("No more job postings"));
    }

    #[tokio::test]
    async fn test_max_applications_bounds_the_run() {
        let board = ScriptedJobBoard::new()
            .posting(Some("A"), false)
            .posting(Some("B"), false)
            .posting(Some("C"), false);
        let mut f = fixture(board).await;
        f.runner = f.runner.with_max_applications(Some(2));

        let summary = f.runner.run(&search()).await.unwrap();
        assert_eq!(summary.processed, 2);
        assert_eq!(f.log.read_all().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_stop_flag_checked_between_postings() {
        let f = fixture(ScriptedJobBoard::new().posting(Some("A"), true)).await;
        f.stop.request();

        let summary = f.runner.run(&search()).await.unwrap();
        assert!(summary.stopped_early);
        assert_eq!(summary.processed, 0);
    }
}
