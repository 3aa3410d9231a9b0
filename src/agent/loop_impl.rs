//! Agent loop - Sense -> Plan -> Act -> Reflect
//!
//! Each stage is a separate operation so callers can drive the cycle step by
//! step. [`Agent::run`] is the simplified entrypoint (one chat call with
//! memory context); [`Agent::run_cycle`] chains all stages.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, info, warn};

use super::context::{build_messages, build_reflect_messages, PLAN_INSTRUCTION};
use super::llm::{ChatClient, ChatOptions, ProviderRegistry};
use super::message::Message;
use super::schema::{ActionResult, FinalAnswer, Plan};
use crate::config::{Config, LoopMode};
use crate::memory::ShortTermMemory;
use crate::tools::ToolRunner;
use crate::Result;

const PLAN_OPTIONS: ChatOptions = ChatOptions::new(0.1, 300);
const REFLECT_OPTIONS: ChatOptions = ChatOptions::new(0.2, 500);
const DIRECT_OPTIONS: ChatOptions = ChatOptions::new(0.2, 500);

/// A single agent: one system prompt, one whitelist, one memory window.
///
/// Memory sits behind a mutex so one agent can be shared across request
/// handlers. The lock is never held across a backend call.
pub struct Agent {
    system_prompt: String,
    allowed_tools: HashSet<String>,
    client: Arc<dyn ChatClient>,
    tools: Arc<ToolRunner>,
    memory: Mutex<ShortTermMemory>,
}

impl Agent {
    /// Create an agent with the default memory window
    pub fn new<I, S>(
        client: Arc<dyn ChatClient>,
        system_prompt: impl Into<String>,
        allowed_tools: I,
        tools: ToolRunner,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            system_prompt: system_prompt.into(),
            allowed_tools: allowed_tools.into_iter().map(Into::into).collect(),
            client,
            tools: Arc::new(tools),
            memory: Mutex::new(ShortTermMemory::default()),
        }
    }

    /// Build the configured backend client and the built-in tools
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ProviderRegistry::create(config)?;
        let tools = ToolRunner::new_with_defaults()?;

        info!(
            "Agent ready: provider={} model={} tools={:?} window={}",
            config.provider, config.model, config.allowed_tools, config.memory_window
        );

        let agent = Self::new(
            client,
            config.system_prompt.clone(),
            config.allowed_tools.clone(),
            tools,
        );
        Ok(agent.with_memory_window(config.memory_window))
    }

    /// Replace memory with an empty window of `max_messages`
    pub fn with_memory_window(self, max_messages: usize) -> Self {
        Self {
            memory: Mutex::new(ShortTermMemory::new(max_messages)),
            ..self
        }
    }

    /// A sibling agent sharing client, tools and whitelist, with empty memory
    pub fn fork(&self) -> Self {
        let capacity = self.memory().capacity();
        Self {
            system_prompt: self.system_prompt.clone(),
            allowed_tools: self.allowed_tools.clone(),
            client: Arc::clone(&self.client),
            tools: Arc::clone(&self.tools),
            memory: Mutex::new(ShortTermMemory::new(capacity)),
        }
    }

    pub fn is_allowed(&self, tool: &str) -> bool {
        self.allowed_tools.contains(tool)
    }

    /// Snapshot of the memory window
    pub fn memory_context(&self) -> Vec<Message> {
        self.memory().context()
    }

    fn memory(&self) -> MutexGuard<'_, ShortTermMemory> {
        self.memory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remember(&self, user_input: &str, answer: &FinalAnswer) {
        let mut memory = self.memory();
        memory.add(Message::user(user_input));
        memory.add(Message::assistant(answer.summary.clone()));
    }

    /// Ask the model for a plan. Malformed replies yield [`Plan::default`].
    pub async fn plan(&self, user_input: &str) -> Result<Plan> {
        let history = self.memory_context();
        let messages = build_messages(
            &self.system_prompt,
            &history,
            user_input,
            Some(PLAN_INSTRUCTION),
        );

        let raw = self.client.chat(&messages, PLAN_OPTIONS).await?;
        let plan = Plan::from_reply(&raw);
        debug!(
            "Plan: steps={} requires_tool={} tool={:?}",
            plan.steps.len(),
            plan.requires_tool,
            plan.tool_name
        );
        Ok(plan)
    }

    /// Carry out the plan's tool request, if any.
    ///
    /// Nothing is invoked unless the plan requires a tool and that tool is
    /// whitelisted; a tool outside the whitelist comes back as
    /// [`ActionResult::ToolDenied`].
    pub async fn act(&self, plan: &Plan) -> ActionResult {
        if !plan.requires_tool {
            return ActionResult::skipped();
        }

        let name = match plan.tool_name.as_deref() {
            Some(name) if self.is_allowed(name) => name,
            other => {
                let tool = other.unwrap_or("<none>").to_string();
                warn!("Denied tool request: {}", tool);
                return ActionResult::ToolDenied { tool };
            }
        };

        if !self.tools.has(name) {
            return ActionResult::failure(format!("Unknown tool {}", name));
        }

        match self.tools.execute(name, Value::Object(plan.tool_args.clone())).await {
            Ok(data) => {
                debug!("Tool {} succeeded: {} chars", name, data.len());
                ActionResult::success(data)
            }
            Err(e) => {
                debug!("Tool {} failed: {}", name, e);
                ActionResult::failure(e.to_string())
            }
        }
    }

    /// Ask the model to turn the plan and observation into a final answer.
    pub async fn reflect(
        &self,
        user_input: &str,
        plan: &Plan,
        result: &ActionResult,
    ) -> Result<FinalAnswer> {
        let history = self.memory_context();
        let messages = build_reflect_messages(
            &self.system_prompt,
            &history,
            user_input,
            plan,
            &result.observation(),
        )?;

        let raw = self.client.chat(&messages, REFLECT_OPTIONS).await?;
        Ok(FinalAnswer::from_reply(&raw))
    }

    /// Simplified entrypoint: one chat call over memory plus the input.
    ///
    /// The reply becomes the summary as-is; no plan, no tools.
    pub async fn run(&self, user_input: &str) -> Result<FinalAnswer> {
        let history = self.memory_context();
        let messages = build_messages(&self.system_prompt, &history, user_input, None);

        let raw = self.client.chat(&messages, DIRECT_OPTIONS).await?;
        let answer = FinalAnswer::text(raw.trim());

        self.remember(user_input, &answer);
        info!("Answered in direct mode: {} chars", answer.summary.len());
        Ok(answer)
    }

    /// Full cycle: plan, act, reflect. A denied tool ends the turn with
    /// [`crate::Error::ToolDenied`] and leaves memory untouched.
    pub async fn run_cycle(&self, user_input: &str) -> Result<FinalAnswer> {
        let plan = self.plan(user_input).await?;
        let result = self.act(&plan).await.into_result()?;
        let answer = self.reflect(user_input, &plan, &result).await?;

        self.remember(user_input, &answer);
        info!(
            "Answered in cycle mode: tool={:?} ok={} summary={} chars",
            plan.tool_name.as_deref().filter(|_| plan.requires_tool),
            result.is_ok(),
            answer.summary.len()
        );
        Ok(answer)
    }

    /// Dispatch to [`Agent::run`] or [`Agent::run_cycle`]
    pub async fn respond(&self, user_input: &str, mode: LoopMode) -> Result<FinalAnswer> {
        match mode {
            LoopMode::Direct => self.run(user_input).await,
            LoopMode::Cycle => self.run_cycle(user_input).await,
        }
    }
}
