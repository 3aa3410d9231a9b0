//! Tool runner - manages and executes tools

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::web::WebFetchTool;
use super::Tool;
use crate::error::Error;
use crate::Result;

/// Tool definition (name, description, parameter schema)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Tool runner manages registered tools and executes them
pub struct ToolRunner {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRunner {
    /// Create an empty tool runner
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a tool runner with the built-in tools (`web.fetch`)
    pub fn new_with_defaults() -> Result<Self> {
        let mut runner = Self::new();
        runner.register(WebFetchTool::new()?);
        Ok(runner)
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    /// Definitions of every registered tool, sorted by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, params: Value) -> Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| Error::Tool(format!("Unknown tool {}", name)))?;

        debug!("Executing tool {} with args {}", name, params);
        tool.execute(params).await
    }

    /// Check if a tool exists
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List registered tool names, sorted
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new()
    }
}
