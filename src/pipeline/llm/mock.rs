use std::sync::{Mutex, PoisonError};

use super::types::LlmGenerate;
use super::LlmError;

/// Deterministic generator for tests and offline runs.
///
/// Replies with the first rule whose needle occurs in the prompt (or the
/// system instruction), else with the default response. Every call is
/// recorded.
pub struct MockLlm {
    default_response: String,
    rules: Vec<(String, String)>,
    failure: Option<String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockLlm {
    pub fn new(response: &str) -> Self {
        Self {
            default_response: response.to_string(),
            rules: Vec::new(),
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A generator whose every call fails as if the backend were down.
    pub fn failing(reason: &str) -> Self {
        let mut mock = Self::new("");
        mock.failure = Some(reason.to_string());
        mock
    }

    pub fn with_reply(mut self, needle: &str, reply: &str) -> Self {
        self.rules.push((needle.to_string(), reply.to_string()));
        self
    }

    /// Recorded `(system, prompt)` pairs, in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl LlmGenerate for MockLlm {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((system.to_string(), prompt.to_string()));

        if let Some(reason) = &self.failure {
            return Err(LlmError::BackendUnavailable(reason.clone()));
        }

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()) || system.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default_response.clone());
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_default_response() {
        let llm = MockLlm::new("test response");
        assert_eq!(llm.generate("system", "prompt").unwrap(), "test response");
    }

    #[test]
    fn first_matching_rule_wins() {
        let llm = MockLlm::new("default")
            .with_reply("classify", "Observational Study")
            .with_reply("class", "never");
        assert_eq!(llm.generate("", "please classify").unwrap(), "Observational Study");
        assert_eq!(llm.generate("", "other").unwrap(), "default");
    }

    #[test]
    fn failing_mock_records_call() {
        let llm = MockLlm::failing("offline");
        assert!(matches!(
            llm.generate("s", "p"),
            Err(LlmError::BackendUnavailable(_))
        ));
        assert_eq!(llm.call_count(), 1);
        assert_eq!(llm.calls()[0], ("s".to_string(), "p".to_string()));
    }
}
