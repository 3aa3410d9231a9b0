//! Chat client abstraction layer.
//!
//! This module provides:
//! - [`ChatClient`] trait for swappable language-model backends
//! - [`ProviderRegistry`] for creating a client from configuration
//! - [`OllamaClient`], the one concrete backend
//!
//! # Adding a New Provider
//!
//! 1. Create a new file (e.g., `openai.rs`)
//! 2. Implement `ChatClient`
//! 3. Add a match arm to `ProviderRegistry::create()`

pub mod ollama;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::Result;

pub use ollama::OllamaClient;

use super::message::Message;

/// Sampling parameters for one chat call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

impl ChatOptions {
    pub const fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self::new(0.2, 512)
    }
}

/// Chat client trait — swappable backend abstraction.
///
/// One call, one reply. Implementations do not retry.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send an ordered conversation and return the raw reply text.
    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<String>;

    /// Model identifier this client talks to.
    fn model(&self) -> &str;
}

/// Provider registry — creates chat clients from configuration.
///
/// # Example
///
/// ```ignore
/// let client = ProviderRegistry::create(&config)?;
/// let reply = client.chat(&messages, ChatOptions::default()).await?;
/// ```
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Create a chat client from configuration.
    ///
    /// Fails before any network activity when the provider is unknown.
    pub fn create(config: &Config) -> Result<Arc<dyn ChatClient>> {
        match config.provider.as_str() {
            "ollama" => {
                let client = OllamaClient::new(&config.base_url, &config.model)?;
                Ok(Arc::new(client))
            }
            other => Err(Error::Config(format!("Unsupported provider: {other}"))),
        }
    }

    /// List available provider names.
    pub fn available() -> &'static [&'static str] {
        &["ollama"]
    }
}

/// One recorded call made against [`FakeChatClient`].
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub options: ChatOptions,
}

/// Scripted chat client for tests: replies in order, records every call.
#[cfg(test)]
pub struct FakeChatClient {
    replies: std::sync::Mutex<std::collections::VecDeque<String>>,
    calls: std::sync::Mutex<Vec<RecordedCall>>,
}

#[cfg(test)]
impl FakeChatClient {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: std::sync::Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ChatClient for FakeChatClient {
    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            options,
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Llm("No more fake replies".to_string()))
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_chat_client() {
        let client = FakeChatClient::new(vec!["Hello!", "World!"]);

        let first = client.chat(&[Message::user("hi")], ChatOptions::default()).await.unwrap();
        assert_eq!(first, "Hello!");

        let second = client.chat(&[], ChatOptions::new(0.1, 300)).await.unwrap();
        assert_eq!(second, "World!");

        assert!(client.chat(&[], ChatOptions::default()).await.is_err());

        let calls = client.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].messages, vec![Message::user("hi")]);
        assert_eq!(calls[1].options, ChatOptions::new(0.1, 300));
    }

    #[test]
    fn test_registry_rejects_unknown_provider() {
        let config = Config {
            provider: "openai".to_string(),
            ..Config::default()
        };
        match ProviderRegistry::create(&config) {
            Err(Error::Config(msg)) => assert!(msg.contains("openai")),
            Err(other) => panic!("expected config error, got {other}"),
            Ok(_) => panic!("expected config error"),
        }
    }

    #[test]
    fn test_registry_creates_ollama() {
        let client = ProviderRegistry::create(&Config::default()).unwrap();
        assert_eq!(client.model(), Config::default().model);
        assert_eq!(ProviderRegistry::available(), &["ollama"]);
    }
}
