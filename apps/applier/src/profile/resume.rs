//! Résumé text used as context for the generative fallback.

use std::path::Path;

use tracing::{info, warn};

use crate::profile::{keys, ProfileStore};

/// Reads the résumé as plain text. PDFs go through `pdf-extract`; any other
/// file is read as UTF-8. On failure a short summary is synthesised from the
/// profile so the fallback prompt never goes out without candidate context.
pub fn load_resume_text(path: &Path, profile: &ProfileStore) -> String {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    let extracted = if is_pdf {
        pdf_extract::extract_text(path).map_err(|e| format!("{e:?}"))
    } else {
        std::fs::read_to_string(path).map_err(|e| e.to_string())
    };

    match extracted {
        Ok(text) if !text.trim().is_empty() => {
            info!(path = %path.display(), chars = text.len(), "Loaded résumé text");
            text
        }
        Ok(_) => {
            warn!(path = %path.display(), "Résumé file has no extractable text, using profile summary");
            fallback_summary(profile)
        }
        Err(e) => {
            warn!(path = %path.display(), "Failed to read résumé ({e}), using profile summary");
            fallback_summary(profile)
        }
    }
}

pub fn fallback_summary(profile: &ProfileStore) -> String {
    if let Some(summary) = profile.value(keys::SUMMARY) {
        return summary.to_string();
    }

    let name = profile.value_or(keys::FULL_NAME, "The candidate");
    let mut summary = match profile.value(keys::CURRENT_POSITION) {
        Some(position) => format!("{name} is a {position}"),
        None => format!("{name} is a professional"),
    };
    if let Some(years) = profile.value(keys::EXPERIENCE_YEARS) {
        summary.push_str(&format!(" with {years} years of experience"));
    }
    if let Some(skills) = profile.value(keys::KEY_SKILLS) {
        summary.push_str(&format!(" in {skills}"));
    }
    summary.push('.');
    summary
}
