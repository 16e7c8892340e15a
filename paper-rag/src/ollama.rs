//! Ollama-backed embedder and generator.
//!
//! This module is only available when the `ollama` feature is enabled. Both
//! clients talk to a local or remote Ollama server over its HTTP API using
//! `reqwest`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::generation::Generator;

/// The default Ollama server address.
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Sampling temperature used for answers; low, to keep answers close to the context.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

const PROVIDER: &str = "Ollama";

fn endpoint(host: &str, path: &str) -> String {
    format!("{}/{path}", host.trim_end_matches('/'))
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Read an error body, preferring Ollama's `{"error": ...}` message.
async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
    format!("API returned {status}: {detail}")
}

// ── Embeddings ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// An [`Embedder`] backed by Ollama's `/api/embed` endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use paper_rag::ollama::OllamaEmbedder;
///
/// let embedder = OllamaEmbedder::new("http://localhost:11434", "all-minilm");
/// let embedding = embedder.embed("hello world").await?;
/// ```
pub struct OllamaEmbedder {
    client: reqwest::Client,
    host: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    /// Create an embedder for `model` served at `host`.
    pub fn new(host: impl Into<String>, model: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), host: host.into(), model: model.into(), dimensions: 0 }
    }

    /// Declare the model's output dimensionality, when known.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    fn err(message: String) -> RagError {
        RagError::Embedding { provider: PROVIDER.into(), message }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| Self::err("API returned empty response".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "embedding batch");

        let response = self
            .client
            .post(endpoint(&self.host, "api/embed"))
            .json(&EmbedRequest { model: &self.model, input: texts.to_vec() })
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                Self::err(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(provider = PROVIDER, %message, "API error");
            return Err(Self::err(message));
        }

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            Self::err(format!("failed to parse response: {e}"))
        })?;

        Ok(parsed.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Generation ─────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// A [`Generator`] backed by Ollama's `/api/generate` endpoint (non-streaming).
pub struct OllamaGenerator {
    client: reqwest::Client,
    host: String,
    model: String,
    temperature: f32,
}

impl OllamaGenerator {
    /// Create a generator for `model` served at `host`.
    pub fn new(host: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            host: host.into(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Override the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn err(message: String) -> RagError {
        RagError::Generation { provider: PROVIDER.into(), message }
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, prompt_len = prompt.len(), "generating");

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature: self.temperature },
        };

        let response = self
            .client
            .post(endpoint(&self.host, "api/generate"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                Self::err(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(provider = PROVIDER, %message, "API error");
            return Err(Self::err(message));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            Self::err(format!("failed to parse response: {e}"))
        })?;

        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        assert_eq!(endpoint("http://h:1/", "api/embed"), "http://h:1/api/embed");
        assert_eq!(endpoint("http://h:1", "api/generate"), "http://h:1/api/generate");
    }

    #[test]
    fn generate_request_shape() {
        let request = GenerateRequest {
            model: "llama3.2:3b",
            prompt: "p",
            stream: false,
            options: GenerateOptions { temperature: 0.1 },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["stream"], false);
        assert_eq!(value["model"], "llama3.2:3b");
        assert!(value["options"]["temperature"].is_number());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_generation_error() {
        let generator = OllamaGenerator::new("http://127.0.0.1:9", "m");
        let err = generator.generate("p").await.unwrap_err();
        assert!(matches!(err, RagError::Generation { .. }));
    }
}
