//! Embedding interface: text in, fixed-length vector out.
//!
//! Default backend is `HashingEmbedder` (offline, deterministic). The
//! OpenAI-compatible backend is selected via `EMBEDDING_BACKEND=openai`.

pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

pub use openai::OpenAiEmbedder;

/// Dimension of the hashing backend, matching common sentence-embedding models.
pub const HASHING_DIMENSIONS: usize = 384;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("embedding backend returned no vector")]
    Empty,

    #[error("embedding backend misconfigured: {0}")]
    Config(String),
}

/// Deterministic for identical input.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Backend label for logs.
    fn name(&self) -> &'static str;
}

/// Cosine similarity in [-1, 1]. Mismatched lengths or zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

// ────────────────────────────────────────────────────────────────────────────
// HashingEmbedder
// ────────────────────────────────────────────────────────────────────────────

/// Feature-hashing vectorizer over word tokens and character trigrams.
///
/// Words carry weight 1.0, trigrams 0.5; the result is L2-normalised so that
/// `cosine_similarity` reduces to a dot product. Stop words are dropped so
/// that question boilerplate ("what is your ...") does not dominate.
pub struct HashingEmbedder {
    dimensions: usize,
}

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "do", "does", "you", "your", "what", "of", "to", "in",
    "for", "and", "or", "on", "with", "have", "has", "how", "please", "candidate", "s",
];

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dimensions];

        for token in tokenize(text) {
            let slot = (fnv1a(token.as_bytes()) % self.dimensions as u64) as usize;
            vector[slot] += 1.0;

            let padded: Vec<char> = format!(" {token} ").chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                let slot = (fnv1a(trigram.as_bytes()) % self.dimensions as u64) as usize;
                vector[slot] += 0.5;
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(HASHING_DIMENSIONS)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.embed_sync(text))
    }

    fn name(&self) -> &'static str {
        "hashing"
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
}

/// 64-bit FNV-1a. Stable across platforms and releases, unlike `DefaultHasher`.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
