//! Profile Store — the candidate's named fields, loaded once at startup and
//! shared read-only (`Arc<ProfileStore>`) for the rest of the run.
//!
//! Two input formats are accepted:
//! - JSON intent map: `{ "KEY": { "value": ..., "description": "..." } }` or `{ "KEY": "value" }`
//! - plain text: one `KEY: value` per line, `#` comments and blank lines ignored

pub mod resume;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Well-known profile keys read by the resolver, classifier and job loop.
pub mod keys {
    pub const FULL_NAME: &str = "FULL_NAME";
    pub const EMAIL: &str = "EMAIL";
    pub const PHONE: &str = "PHONE";
    pub const LINKEDIN: &str = "LINKEDIN";
    pub const PASSWORD: &str = "PASSWORD";
    pub const LOCATION: &str = "LOCATION";
    pub const CURRENT_CITY: &str = "CURRENT_CITY";
    pub const STREET_ADDRESS: &str = "STREET_ADDRESS";
    pub const STATE: &str = "STATE";
    pub const COUNTRY: &str = "COUNTRY";
    pub const CV_PATH: &str = "CV_PATH";
    pub const KEYWORD: &str = "KEYWORD";
    pub const SUMMARY: &str = "SUMMARY";
    pub const EXPERIENCE_YEARS: &str = "EXPERIENCE_YEARS";
    pub const CURRENT_SALARY: &str = "CURRENT_SALARY";
    pub const EXPECTED_SALARY: &str = "EXPECTED_SALARY";
    pub const JOINING_DAYS: &str = "JOINING_DAYS";
    pub const EXPECTED_HOURLY_RATE: &str = "EXPECTED_HOURLY_RATE";
    pub const CURRENT_COMPANY: &str = "CURRENT_COMPANY";
    pub const CURRENT_POSITION: &str = "CURRENT_POSITION";
    pub const EDUCATION_LEVEL: &str = "EDUCATION_LEVEL";
    pub const EDUCATION_MASTERS: &str = "EDUCATION_MASTERS";
    pub const EDUCATION_BACHELORS: &str = "EDUCATION_BACHELORS";
    pub const KEY_SKILLS: &str = "KEY_SKILLS";

    /// Credentials only ever go to the login form.
    pub fn is_secret(key: &str) -> bool {
        key == PASSWORD
            || ["_PASSWORD", "_SECRET", "_TOKEN", "_API_KEY"]
                .iter()
                .any(|suffix| key.ends_with(suffix))
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("failed to read profile file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("profile JSON is invalid: {0}")]
    Json(#[from] serde_json::Error),

    #[error("profile JSON must be an object keyed by field name")]
    NotAnObject,

    #[error("invalid profile key '{0}' (expected UPPER_SNAKE_CASE)")]
    InvalidKey(String),

    #[error("duplicate profile key '{0}'")]
    DuplicateKey(String),

    #[error("line {line}: expected 'KEY: value', got '{content}'")]
    Malformed { line: usize, content: String },
}

/// One named fact about the candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileField {
    pub key: String,
    pub value: String,
    /// Human-readable description used for embedding match. Fields without one
    /// are never candidates for the semantic step.
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    fields: HashMap<String, ProfileField>,
}

impl ProfileStore {
    /// Loads a profile from disk. `.json` files are parsed as an intent map,
    /// anything else as `KEY: value` text.
    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_str(&raw)
        } else {
            Self::from_text_str(&raw)
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ProfileError> {
        let root: Value = serde_json::from_str(raw)?;
        let map = root.as_object().ok_or(ProfileError::NotAnObject)?;

        let mut store = Self::default();
        for (raw_key, entry) in map {
            let (value, description) = match entry {
                Value::Object(obj) => (
                    obj.get("value").and_then(value_to_string),
                    obj.get("description")
                        .and_then(|d| d.as_str())
                        .map(str::trim)
                        .filter(|d| !d.is_empty())
                        .map(str::to_string),
                ),
                other => (value_to_string(other), None),
            };

            // Null values carry no information for any resolution step.
            let Some(value) = value else { continue };
            store.insert(raw_key, value, description)?;
        }
        Ok(store)
    }

    pub fn from_text_str(raw: &str) -> Result<Self, ProfileError> {
        let mut store = Self::default();
        for (idx, line) in raw.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once(':').ok_or_else(|| ProfileError::Malformed {
                line: idx + 1,
                content: line.to_string(),
            })?;
            store.insert(key, value.trim().to_string(), None)?;
        }
        Ok(store)
    }

    /// Applies configuration overrides (credentials, search keyword, résumé path).
    /// Existing keys are replaced; the description of a replaced field is kept.
    pub fn with_overrides<I, K>(mut self, overrides: I) -> Result<Self, ProfileError>
    where
        I: IntoIterator<Item = (K, String)>,
        K: AsRef<str>,
    {
        for (raw_key, value) in overrides {
            let key = normalize_key(raw_key.as_ref())?;
            let description = self.fields.get(&key).and_then(|f| f.description.clone());
            self.fields.insert(
                key.clone(),
                ProfileField {
                    key,
                    value,
                    description,
                },
            );
        }
        Ok(self)
    }

    fn insert(
        &mut self,
        raw_key: &str,
        value: String,
        description: Option<String>,
    ) -> Result<(), ProfileError> {
        let key = normalize_key(raw_key)?;
        if self.fields.contains_key(&key) {
            return Err(ProfileError::DuplicateKey(key));
        }
        self.fields.insert(
            key.clone(),
            ProfileField {
                key,
                value,
                description,
            },
        );
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&ProfileField> {
        self.fields.get(key)
    }

    /// Returns the trimmed value for `key`, or `None` if absent or blank.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(|f| f.value.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn value_or(&self, key: &str, default: &str) -> String {
        self.value(key).unwrap_or(default).to_string()
    }

    /// First non-blank value among `keys`, in order.
    pub fn first_value(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.value(k))
    }

    /// Fields sorted by key. Stable order keeps embedding arg-max ties deterministic.
    pub fn fields_sorted(&self) -> Vec<&ProfileField> {
        let mut fields: Vec<&ProfileField> = self.fields.values().collect();
        fields.sort_by(|a, b| a.key.cmp(&b.key));
        fields
    }

    /// `fields_sorted` without secrets; everything that may reach a prompt,
    /// an embedding request or a form field.
    pub fn shareable_fields(&self) -> Vec<&ProfileField> {
        self.fields_sorted()
            .into_iter()
            .filter(|f| !keys::is_secret(&f.key))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Résumé path for uploads and prompt context.
    pub fn resume_path(&self) -> Option<PathBuf> {
        self.value(keys::CV_PATH).map(PathBuf::from)
    }
}

/// Trims, uppercases and snake-cases a key, then enforces `^[A-Z][A-Z0-9_]*$`.
pub fn normalize_key(raw: &str) -> Result<String, ProfileError> {
    let key: String = raw
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect();

    let mut chars = key.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');

    if valid {
        Ok(key)
    } else {
        Err(ProfileError::InvalidKey(raw.trim().to_string()))
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Bool(true) => Some("Yes".to_string()),
        Value::Bool(false) => Some("No".to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}
