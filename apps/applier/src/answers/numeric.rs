//! Numeric extraction and topic defaults for count/years questions.

use once_cell::sync::Lazy;
use regex::Regex;

static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").expect("number pattern is valid"));

/// Label keywords that imply the field wants a bare number.
const NUMERIC_LABEL_KEYWORDS: &[&str] = &["how many", "years of experience", "number of"];

/// The generic profile-context path also treats project counts as numeric.
const NUMERIC_QUESTION_KEYWORDS: &[&str] =
    &["how many", "number of", "years of experience", "projects"];

/// First decimal number in `text`, e.g. `"around 5 years"` → `"5"`.
pub fn first_number(text: &str) -> Option<&str> {
    NUMBER_RE.find(text).map(|m| m.as_str())
}

/// Fallback number when a count question produced no usable digits.
pub fn topic_default(question: &str) -> &'static str {
    let lowered = question.to_lowercase();
    if lowered.contains("react") {
        "3"
    } else if lowered.contains("typescript") {
        "2"
    } else if lowered.contains("full-stack") || lowered.contains("full stack") {
        "5"
    } else {
        "2"
    }
}

pub fn is_numeric_label(label: &str) -> bool {
    let lowered = label.to_lowercase();
    NUMERIC_LABEL_KEYWORDS.iter().any(|k| lowered.contains(k))
}

pub fn is_numeric_question(question: &str) -> bool {
    let lowered = question.to_lowercase();
    NUMERIC_QUESTION_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// True when `value` is already a plain decimal number.
pub fn is_plain_number(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Value to type into a count-style field: the first embedded number, or the
/// topic default derived from the label.
pub fn coerce_numeric(label: &str, value: &str) -> String {
    match first_number(value) {
        Some(n) => n.to_string(),
        None => topic_default(label).to_string(),
    }
}
