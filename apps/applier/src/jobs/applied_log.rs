//! Append-only CSV log of processed postings.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use csv::WriterBuilder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppliedLogError {
    #[error("applied-jobs log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("applied-jobs log CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One row per posting opened, whether or not the application went through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationAttempt {
    #[serde(rename = "Job Title")]
    pub job_title: String,
    #[serde(rename = "Search Keyword")]
    pub search_keyword: String,
    /// Kept in memory only; the file carries the two columns above.
    #[serde(skip_serializing, default = "Local::now")]
    pub recorded_at: DateTime<Local>,
}

impl ApplicationAttempt {
    pub fn new(job_title: impl Into<String>, search_keyword: impl Into<String>) -> Self {
        Self {
            job_title: job_title.into(),
            search_keyword: search_keyword.into(),
            recorded_at: Local::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppliedLog {
    path: PathBuf,
}

impl AppliedLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a row; the header goes in only when the file is new or empty.
    pub fn append(&self, attempt: &ApplicationAttempt) -> Result<(), AppliedLogError> {
        let needs_header = fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut wtr = WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        wtr.serialize(attempt)?;
        wtr.flush()?;
        Ok(())
    }

    pub fn read_all(&self) -> Result<Vec<ApplicationAttempt>, AppliedLogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut rdr = csv::Reader::from_path(&self.path)?;
        let rows = rdr
            .deserialize::<ApplicationAttempt>()
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let log = AppliedLog::new(dir.path().join("applied_jobs.csv"));

        log.append(&ApplicationAttempt::new("Rust Engineer", "rust")).unwrap();
        log.append(&ApplicationAttempt::new("Backend Developer, Payments", "rust")).unwrap();

        let raw = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(raw.matches("Job Title,Search Keyword").count(), 1);
        assert!(raw.starts_with("Job Title,Search Keyword\n"));
        assert!(raw.contains("\"Backend Developer, Payments\",rust"));
    }

    #[test]
    fn test_header_written_into_empty_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("applied_jobs.csv");
        std::fs::write(&path, "").unwrap();

        let log = AppliedLog::new(&path);
        log.append(&ApplicationAttempt::new("Data Engineer", "python")).unwrap();

        let rows = log.read_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].job_title, "Data Engineer");
        assert_eq!(rows[0].search_keyword, "python");
    }

    #[test]
    fn test_read_all_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = AppliedLog::new(dir.path().join("missing.csv"));
        assert!(log.read_all().unwrap().is_empty());
    }
}
