//! Precomputed embeddings of profile-field descriptions.

use crate::embeddings::{cosine_similarity, Embedder, EmbeddingError};
use crate::profile::ProfileStore;

#[derive(Debug, Clone)]
struct IndexEntry {
    key: String,
    text: String,
    value: String,
    vector: Vec<f32>,
}

/// Best-scoring profile field for a question.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticMatch {
    pub key: String,
    /// `"<KEY with spaces>: <description>"`, the text that was embedded.
    pub text: String,
    pub value: String,
    pub score: f32,
}

#[derive(Debug, Clone, Default)]
pub struct SemanticIndex {
    entries: Vec<IndexEntry>,
}

impl SemanticIndex {
    /// Embeds every shareable profile field that carries a description.
    /// Fields are visited in key order so ties resolve the same way on every run.
    pub async fn build(
        profile: &ProfileStore,
        embedder: &dyn Embedder,
    ) -> Result<Self, EmbeddingError> {
        let mut entries = Vec::new();

        for field in profile.shareable_fields() {
            let Some(description) = field.description.as_deref().map(str::trim) else {
                continue;
            };
            if description.is_empty() {
                continue;
            }

            let text = format!("{}: {}", field.key.replace('_', " "), description);
            let vector = embedder.embed(&text).await?;
            entries.push(IndexEntry {
                key: field.key.clone(),
                text,
                value: field.value.clone(),
                vector,
            });
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Arg-max cosine similarity; the earliest entry wins ties.
    pub fn best_match(&self, query: &[f32]) -> Option<SemanticMatch> {
        let mut best: Option<(&IndexEntry, f32)> = None;
        for entry in &self.entries {
            let score = cosine_similarity(query, &entry.vector);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((entry, score));
            }
        }

        best.map(|(entry, score)| SemanticMatch {
            key: entry.key.clone(),
            text: entry.text.clone(),
            value: entry.value.clone(),
            score,
        })
    }
}
