//! Tools module - agent capabilities
//!
//! Tools are external actions the agent can take. Registration (a tool the
//! runner knows about) is separate from permission (a tool the agent's
//! whitelist allows); the agent checks both before anything runs.

mod runner;
pub mod web;

pub use runner::{ToolDefinition, ToolRunner};
pub use web::{FetchArgs, WebFetchTool};

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;

/// Tool trait - interface for all agent tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in plans
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON Schema for parameters
    fn parameters(&self) -> Value;

    /// Execute the tool with given parameters
    async fn execute(&self, params: Value) -> Result<String>;

    /// Convert to tool definition for listing
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Stub tool for tests: returns a fixed reply and counts invocations
#[cfg(test)]
pub struct StubTool {
    pub name: String,
    pub result: String,
    pub calls: std::sync::Arc<std::sync::atomic::AtomicUsize>,
}

#[cfg(test)]
impl StubTool {
    pub fn new(name: &str, result: &str) -> Self {
        Self {
            name: name.to_string(),
            result: result.to_string(),
            calls: Default::default(),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str { &self.name }
    fn description(&self) -> &str { "Stub tool for testing" }
    fn parameters(&self) -> Value { serde_json::json!({"type": "object"}) }

    async fn execute(&self, _params: Value) -> Result<String> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(self.result.clone())
    }
}
