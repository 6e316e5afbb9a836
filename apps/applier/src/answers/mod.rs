//! Answer Resolver: question text in, answer text out.
//!
//! Fallback chain, first hit wins:
//!   1. static rule table (`rules`)
//!   2. semantic match against profile-field descriptions (score >= 0.5)
//!   3. résumé-grounded generative answer
//!
//! Nothing here fails outward. Every failure degrades to the next step and
//! ultimately to the `"N/A"` sentinel.

pub mod numeric;
pub mod prompts;
pub mod rules;
pub mod semantic;

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::embeddings::Embedder;
use crate::events::EventSink;
use crate::llm_client::TextGenerator;
use crate::profile::ProfileStore;

pub use semantic::{SemanticIndex, SemanticMatch};

/// Sentinel for "no confident answer".
pub const NOT_AVAILABLE: &str = "N/A";

/// Minimum cosine similarity for a semantic match to be trusted.
pub const SIMILARITY_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    StaticRule,
    ProfileLookup,
    EmbeddingMatch,
    GenerativeFallback,
    DefaultGuess,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedAnswer {
    pub text: String,
    pub source: AnswerSource,
    /// Similarity score; only meaningful for `EmbeddingMatch`.
    pub confidence: f32,
}

impl ResolvedAnswer {
    pub fn new(text: impl Into<String>, source: AnswerSource) -> Self {
        Self {
            text: text.into(),
            source,
            confidence: 0.0,
        }
    }

    pub fn not_available() -> Self {
        Self::new(NOT_AVAILABLE, AnswerSource::DefaultGuess)
    }
}

/// True for the sentinel and for blank answers.
pub fn is_not_available(text: &str) -> bool {
    let t = text.trim();
    t.is_empty() || t == NOT_AVAILABLE
}

pub struct AnswerResolver {
    profile: Arc<ProfileStore>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn TextGenerator>,
    index: SemanticIndex,
    resume_text: String,
    sink: Arc<dyn EventSink>,
}

impl AnswerResolver {
    /// Builds the resolver and precomputes the semantic index. An index build
    /// failure is reported and leaves the index empty, so questions that miss
    /// the static rules go straight to the generative fallback.
    pub async fn build(
        profile: Arc<ProfileStore>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
        resume_text: String,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let index = match SemanticIndex::build(&profile, embedder.as_ref()).await {
            Ok(index) => {
                debug!(
                    entries = index.len(),
                    backend = embedder.name(),
                    "Semantic index built"
                );
                index
            }
            Err(e) => {
                warn!("Semantic index build failed: {e}");
                sink.emit(&format!("Embedding backend unavailable ({e}); semantic match disabled"));
                SemanticIndex::default()
            }
        };

        Self {
            profile,
            embedder,
            generator,
            index,
            resume_text,
            sink,
        }
    }

    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    /// Form-scanning path. Never fails; `"N/A"` when nothing applies.
    pub async fn resolve(&self, question: &str) -> String {
        self.resolve_detailed(question).await.text
    }

    pub async fn resolve_detailed(&self, question: &str) -> ResolvedAnswer {
        let question = question.trim();
        if question.is_empty() {
            return ResolvedAnswer::not_available();
        }

        if let Some((rule, answer)) = rules::apply(question, &self.profile) {
            debug!(rule, %answer, "Static rule matched");
            return ResolvedAnswer::new(answer, AnswerSource::StaticRule);
        }

        if let Some(hit) = self.semantic_match(question).await {
            self.sink.emit(&format!(
                "Matched: {} -> Score: {:.2} -> Answer: {}",
                hit.text, hit.score, hit.value
            ));
            if hit.score >= SIMILARITY_THRESHOLD && !is_not_available(&hit.value) {
                return ResolvedAnswer {
                    text: hit.value,
                    source: AnswerSource::EmbeddingMatch,
                    confidence: hit.score,
                };
            }
        }

        self.sink.emit("Using generative fallback...");
        self.generate_from_resume(question).await
    }

    /// Generic path: answer from the whole profile as prompt context.
    /// Count questions come back as a bare number.
    pub async fn answer_generic(&self, question: &str) -> String {
        let question = question.trim();
        if question.is_empty() {
            return NOT_AVAILABLE.to_string();
        }

        let is_numeric = numeric::is_numeric_question(question);
        let context = prompts::profile_context(&self.profile);
        let prompt = prompts::profile_answer_prompt(question, &context, is_numeric);

        match self
            .generator
            .complete(
                &prompt,
                prompts::PROFILE_SYSTEM,
                prompts::PROFILE_MAX_TOKENS,
                prompts::PROFILE_TEMPERATURE,
            )
            .await
        {
            Ok(reply) if is_numeric => numeric::coerce_numeric(question, &reply),
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                self.sink.emit(&format!("Error getting AI response: {e}"));
                let lowered = question.to_lowercase();
                if is_numeric || lowered.contains("years") {
                    numeric::topic_default(question).to_string()
                } else {
                    NOT_AVAILABLE.to_string()
                }
            }
        }
    }

    async fn semantic_match(&self, question: &str) -> Option<SemanticMatch> {
        if self.index.is_empty() {
            return None;
        }
        match self.embedder.embed(question).await {
            Ok(vector) => self.index.best_match(&vector),
            Err(e) => {
                self.sink.emit(&format!("Embedding logic error: {e}"));
                None
            }
        }
    }

    async fn generate_from_resume(&self, question: &str) -> ResolvedAnswer {
        let prompt = prompts::resume_answer_prompt(&self.resume_text, question);
        match self
            .generator
            .complete(
                &prompt,
                prompts::RESUME_SYSTEM,
                prompts::RESUME_MAX_TOKENS,
                prompts::RESUME_TEMPERATURE,
            )
            .await
        {
            Ok(reply) if !reply.trim().is_empty() => {
                ResolvedAnswer::new(reply.trim(), AnswerSource::GenerativeFallback)
            }
            Ok(_) => ResolvedAnswer::not_available(),
            Err(e) => {
                self.sink.emit(&format!("Generative fallback failed: {e}"));
                ResolvedAnswer::not_available()
            }
        }
    }
}
