//! Ollama chat client implementation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::{ChatClient, ChatOptions};
use crate::agent::message::Message;
use crate::error::Error;
use crate::Result;

/// Hard ceiling on one chat round trip.
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(120);

/// Ollama `/api/chat` client (non-streaming)
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        let client = Client::builder().timeout(CHAT_TIMEOUT).build()?;
        Ok(Self {
            base_url: normalize_base_url(base_url),
            model: model.to_string(),
            client,
        })
    }

    fn build_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    fn build_request(&self, messages: &[Message], options: ChatOptions) -> Value {
        json!({
            "model": self.model,
            "messages": messages,
            "options": {
                "temperature": options.temperature,
                "num_predict": options.max_tokens
            },
            "stream": false
        })
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<String> {
        let request = self.build_request(messages, options);

        debug!(
            "POST {} model={} messages={} temperature={} num_predict={}",
            self.build_url(),
            self.model,
            messages.len(),
            options.temperature,
            options.max_tokens
        );

        let response = self.client.post(self.build_url()).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("Ollama API error ({}): {}", status, error_text)));
        }

        let body: Value = response.json().await?;
        let reply = extract_reply(&body);
        debug!("Ollama replied with {} chars", reply.len());
        Ok(reply)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Pull the reply text out of a chat response.
///
/// Ollama nests it under `message.content`; some compatible servers return a
/// flat `content`. Anything else yields empty text.
fn extract_reply(body: &Value) -> String {
    let content = match body.get("message") {
        Some(message) if message.is_object() => message.get("content"),
        _ => body.get("content"),
    };
    content
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Trim trailing slashes and default to plain HTTP when no scheme is given
/// (`localhost:11434` is a common way to write an Ollama address).
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
