//! Azure OpenAI deployment client (chat completions and embeddings).

use serde::{Deserialize, Serialize};

use super::types::LlmGenerate;
use super::{http_client, transport_error, LlmError};
use crate::pipeline::storage::{EmbeddingModel, StorageError};

/// Connection details for one Azure OpenAI resource.
#[derive(Clone)]
pub struct AzureDeployment {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub chat_deployment: String,
    pub embedding_deployment: String,
}

pub struct AzureOpenAiClient {
    deployment: AzureDeployment,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl AzureOpenAiClient {
    pub fn new(mut deployment: AzureDeployment, timeout_secs: u64) -> Result<Self, LlmError> {
        if deployment.api_key.is_empty() {
            return Err(LlmError::Configuration("Azure OpenAI API key is empty".into()));
        }
        deployment.endpoint = deployment.endpoint.trim_end_matches('/').to_string();
        Ok(Self {
            deployment,
            client: http_client(timeout_secs)?,
            timeout_secs,
        })
    }

    fn url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.deployment.endpoint, deployment, operation, self.deployment.api_version
        )
    }

    fn post<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R, LlmError> {
        let response = self
            .client
            .post(url)
            .header("api-key", self.deployment.api_key.as_str())
            .json(body)
            .send()
            .map_err(|e| transport_error(e, &self.deployment.endpoint, self.timeout_secs))?;

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
        let url = self.url(&self.deployment.embedding_deployment, "embeddings");
        let parsed: EmbeddingResponse = self.post(&url, &EmbeddingRequest { input: texts })?;
        ordered_embeddings(parsed, texts.len())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

/// Reorder embeddings by their `index` field and check the count.
fn ordered_embeddings(
    mut response: EmbeddingResponse,
    expected: usize,
) -> Result<Vec<Vec<f32>>, LlmError> {
    if response.data.len() != expected {
        return Err(LlmError::ResponseParsing(format!(
            "expected {} embeddings, got {}",
            expected,
            response.data.len()
        )));
    }
    response.data.sort_by_key(|item| item.index);
    Ok(response.data.into_iter().map(|item| item.embedding).collect())
}

impl LlmGenerate for AzureOpenAiClient {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.0,
        };
        let url = self.url(&self.deployment.chat_deployment, "chat/completions");
        tracing::debug!(deployment = %self.deployment.chat_deployment, "Azure chat completion");

        let parsed: ChatResponse = self.post(&url, &body)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::ResponseParsing("no completion content".into()))
    }
}

impl EmbeddingModel for AzureOpenAiClient {
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
