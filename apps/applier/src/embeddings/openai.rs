//! OpenAI-compatible embeddings client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::embeddings::{Embedder, EmbeddingError};

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embedding client for `/embeddings` on any OpenAI-compatible base URL.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String, base_url: &str, model: String) -> Result<Self, EmbeddingError> {
        if api_key.trim().is_empty() {
            return Err(EmbeddingError::Config("missing embedding API key".to_string()));
        }
        if model.trim().is_empty() {
            return Err(EmbeddingError::Config("missing embedding model name".to_string()));
        }

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            endpoint: endpoint_for(base_url),
            model,
            api_key,
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: [text],
        };

        let mut last_error: Option<EmbeddingError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = Duration::from_millis(500 * (1 << (attempt - 1)));
                warn!(
                    "Embedding call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(EmbeddingError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                last_error = Some(EmbeddingError::Api {
                    status: status.as_u16(),
                    message: response.text().await.unwrap_or_default(),
                });
                continue;
            }
            if !status.is_success() {
                return Err(EmbeddingError::Api {
                    status: status.as_u16(),
                    message: response.text().await.unwrap_or_default(),
                });
            }

            let parsed: EmbeddingResponse = response.json().await?;
            return parsed
                .data
                .into_iter()
                .next()
                .map(|d| d.embedding)
                .filter(|v| !v.is_empty())
                .ok_or(EmbeddingError::Empty);
        }

        Err(last_error.unwrap_or(EmbeddingError::Empty))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

fn endpoint_for(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/embeddings") {
        base.to_string()
    } else {
        format!("{base}/embeddings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_appends_embeddings_path() {
        assert_eq!(
            endpoint_for("https://api.openai.com/v1/"),
            "https://api.openai.com/v1/embeddings"
        );
        assert_eq!(
            endpoint_for("http://localhost:1234/v1/embeddings"),
            "http://localhost:1234/v1/embeddings"
        );
    }

    #[test]
    fn test_new_rejects_blank_key() {
        let result = OpenAiEmbedder::new(" ".to_string(), "https://api.openai.com/v1", "m".to_string());
        assert!(matches!(result, Err(EmbeddingError::Config(_))));
    }

    #[test]
    fn test_request_serializes_single_input() {
        let request = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: ["hello"],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["input"][0], "hello");
        assert_eq!(json["model"], "text-embedding-3-small");
    }
}
