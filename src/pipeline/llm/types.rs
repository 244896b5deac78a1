use super::LlmError;

/// Text generation backend: one system instruction plus one user prompt,
/// returning the full reply.
pub trait LlmGenerate: Send + Sync {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}
