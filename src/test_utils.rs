//! Test utilities for thirdbrain
//!
//! This module provides a scripted completion client, in-memory session
//! stores, and assertion helpers shared by unit tests.

use crate::error::{Result, ThirdBrainError};
use crate::providers::{ChunkCallback, CompletionClient, Message};
use crate::session::SessionStore;
use crate::storage::MemorySnapshotStore;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// System prompt used by test session stores
pub const TEST_SYSTEM_PROMPT: &str = "You are a test assistant.";

/// Completion client that replays a fixed script
///
/// Every call streams the same chunks (or fails with the same error) and
/// records the history it was given.
pub struct ScriptedClient {
    chunks: Vec<String>,
    failure: Option<String>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedClient {
    /// Reply with `chunks`, streamed one by one
    pub fn replying(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call with a transport error
    pub fn failing(reason: &str) -> Self {
        Self {
            chunks: Vec::new(),
            failure: Some(reason.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of completed or failed calls
    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// History passed to the most recent call
    pub fn last_request(&self) -> Option<Vec<Message>> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        messages: &[Message],
        on_chunk: Option<&mut ChunkCallback<'_>>,
    ) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }

        if let Some(reason) = &self.failure {
            return Err(ThirdBrainError::Transport(reason.clone()).into());
        }

        if let Some(callback) = on_chunk {
            for chunk in &self.chunks {
                callback(chunk);
            }
        }
        Ok(self.chunks.concat())
    }
}

/// Session store backed by memory, holding one fresh session
///
/// # Panics
///
/// Panics if the store cannot be created
pub fn memory_session_store() -> SessionStore {
    SessionStore::load(Arc::new(MemorySnapshotStore::new()), TEST_SYSTEM_PROMPT)
        .expect("Failed to create in-memory session store")
}

/// Assert that an error's message contains the expected text
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// A configuration YAML string exercising every section
pub fn test_config_yaml() -> String {
    r#"
model:
  name: llama3.2:latest
  base_url: http://localhost:11434
  endpoint: /api/chat
  stream: false
  timeout_seconds: 30
options:
  temperature: 0.5
  top_p: 0.8
  max_tokens: 512
formatting:
  system_prompt: "You are a test assistant."
  include_system_prompt: true
  include_previous_messages: true
  max_previous_messages: 4
storage:
  path: /tmp/thirdbrain-test.db
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_scripted_client_streams_chunks() {
        let client = ScriptedClient::replying(&["a", "b"]);
        let mut seen = Vec::new();
        let mut on_chunk = |c: &str| seen.push(c.to_string());

        let text = client
            .complete(&[Message::user("x")], Some(&mut on_chunk))
            .await
            .unwrap();

        assert_eq!(text, "ab");
        assert_eq!(seen, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_client_failure() {
        let client = ScriptedClient::failing("boom");
        let result = client.complete(&[], None).await;
        assert_error_contains(result, "boom");
    }

    #[test]
    fn test_memory_session_store_has_one_session() {
        let store = memory_session_store();
        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.system_prompt(), TEST_SYSTEM_PROMPT);
    }

    #[test]
    #[should_panic(expected = "does not contain")]
    fn test_assert_error_contains_wrong_message() {
        let result: Result<()> = Err(ThirdBrainError::Config("different".to_string()).into());
        assert_error_contains(result, "not present");
    }

    #[test]
    fn test_test_config_yaml_parses_and_validates() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert_eq!(config.model.name, "llama3.2:latest");
        assert!(!config.model.stream);
        assert_eq!(config.formatting.max_previous_messages, 4);
        assert!(config.validate().is_ok());
    }
}
