use serde::{Deserialize, Serialize};

use super::types::LlmGenerate;
use super::{http_client, transport_error, LlmError};
use crate::pipeline::storage::{EmbeddingModel, StorageError};

/// Ollama HTTP client serving both generation and embeddings.
pub struct OllamaClient {
    base_url: String,
    chat_model: String,
    embedding_model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(
        base_url: &str,
        chat_model: &str,
        embedding_model: &str,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            chat_model: chat_model.to_string(),
            embedding_model: embedding_model.to_string(),
            client: http_client(timeout_secs)?,
            timeout_secs,
        })
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, LlmError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| transport_error(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .map_err(|e| LlmError::ResponseParsing(e.to_string()))
    }

    fn embed_inputs(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, LlmError> {
        let body = OllamaEmbedRequest {
            model: &self.embedding_model,
            input: texts,
        };
        let parsed: OllamaEmbedResponse = self.post("/api/embed", &body)?;
        if parsed.embeddings.len() != texts.len() {
            return Err(LlmError::ResponseParsing(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                parsed.embeddings.len()
            )));
        }
        Ok(parsed.embeddings)
    }
}

/// Request body for Ollama /api/generate
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

/// Response body from Ollama /api/generate
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

/// Request body for Ollama /api/embed
#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

/// Response body from Ollama /api/embed
#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

impl LlmGenerate for OllamaClient {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let body = OllamaGenerateRequest {
            model: &self.chat_model,
            prompt,
            system,
            stream: false,
            options: GenerateOptions { temperature: 0.0 },
        };
        tracing::debug!(model = %self.chat_model, prompt_chars = prompt.len(), "Ollama generate");
        let parsed: OllamaGenerateResponse = self.post("/api/generate", &body)?;
        Ok(parsed.response)
    }
}

impl EmbeddingModel for OllamaClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>, StorageError> {
        let mut vectors = self.embed_inputs(&[text])?;
        vectors
            .pop()
            .ok_or_else(|| StorageError::Embedding("empty embedding response".into()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, StorageError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.embed_inputs(texts)?)
    }
}
