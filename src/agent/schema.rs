//! Structured contracts exchanged between the loop stages.
//!
//! - [`Plan`] is decoded from the planning reply
//! - [`ActionResult`] is the outcome of the act stage
//! - [`FinalAnswer`] is what one agent turn returns to its caller

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// First `{` to last `}`, across newlines.
static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*\}").expect("static pattern compiles"));

/// What the model decided to do for one turn.
///
/// `steps` are advisory only; the loop never executes them. A plan may name
/// a tool the agent is not allowed to use: that is only checked at act time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub steps: Vec<String>,

    #[serde(default)]
    pub requires_tool: bool,

    #[serde(default)]
    pub tool_name: Option<String>,

    #[serde(default)]
    pub tool_args: Map<String, Value>,
}

impl Default for Plan {
    /// The plan used whenever the model reply cannot be decoded.
    fn default() -> Self {
        Self {
            steps: vec!["draft answer".to_string()],
            requires_tool: false,
            tool_name: None,
            tool_args: Map::new(),
        }
    }
}

impl Plan {
    /// Decode a planning reply. Never fails.
    ///
    /// Tries the whole reply first, then the first `{...}` span inside it,
    /// then falls back to [`Plan::default`].
    pub fn from_reply(raw: &str) -> Self {
        if let Ok(plan) = serde_json::from_str::<Plan>(raw) {
            debug!("Plan decoded from full reply");
            return plan;
        }

        if let Some(span) = JSON_OBJECT.find(raw) {
            match serde_json::from_str::<Plan>(span.as_str()) {
                Ok(plan) => {
                    debug!("Plan decoded from embedded object ({} chars)", span.len());
                    return plan;
                }
                Err(e) => warn!("Embedded plan object did not decode: {}", e),
            }
        }

        debug!("Falling back to default plan");
        Plan::default()
    }
}

/// Outcome of the act stage.
///
/// Denial is a variant rather than an error so every act outcome flows back
/// as data; callers that must treat denial as exceptional convert it with
/// [`ActionResult::into_result`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    /// The stage completed. `data` is `None` when no tool was needed.
    Success { data: Option<String> },

    /// A whitelisted tool ran (or was looked up) and failed.
    ToolFailure { error: String },

    /// The requested tool is not in the whitelist. Nothing was invoked.
    ToolDenied { tool: String },
}

impl ActionResult {
    pub fn skipped() -> Self {
        ActionResult::Success { data: None }
    }

    pub fn success(data: impl Into<String>) -> Self {
        ActionResult::Success {
            data: Some(data.into()),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        ActionResult::ToolFailure {
            error: error.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ActionResult::Success { .. })
    }

    pub fn data(&self) -> Option<&str> {
        match self {
            ActionResult::Success { data } => data.as_deref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<String> {
        match self {
            ActionResult::Success { .. } => None,
            ActionResult::ToolFailure { error } => Some(error.clone()),
            ActionResult::ToolDenied { tool } => {
                Some(crate::Error::ToolDenied(tool.clone()).to_string())
            }
        }
    }

    /// Text handed to the reflect stage: the data when present and
    /// non-empty, otherwise the error, otherwise nothing.
    pub fn observation(&self) -> String {
        match self.data() {
            Some(data) if !data.is_empty() => data.to_string(),
            _ => self.error().unwrap_or_default(),
        }
    }

    /// Turn a denial into [`crate::Error::ToolDenied`]; every other outcome passes through.
    pub fn into_result(self) -> crate::Result<Self> {
        match self {
            ActionResult::ToolDenied { tool } => Err(crate::Error::ToolDenied(tool)),
            other => Ok(other),
        }
    }
}

/// Terminal output of one agent turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalAnswer {
    pub summary: String,

    #[serde(default)]
    pub citations: Vec<String>,
}

impl FinalAnswer {
    /// A plain answer with no citations.
    pub fn text(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            citations: vec![],
        }
    }

    /// Decode a reflect reply.
    ///
    /// A reply that is exactly a `{summary, citations}` object is taken as
    /// such. Anything else (prose, partial JSON, JSON embedded in prose) is
    /// kept verbatim as the summary, trimmed.
    pub fn from_reply(raw: &str) -> Self {
        let trimmed = raw.trim();
        match serde_json::from_str::<FinalAnswer>(trimmed) {
            Ok(answer) => answer,
            Err(_) => FinalAnswer::text(trimmed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_from_valid_json() {
        let raw = r#"{"steps":["look it up","answer"],"requires_tool":true,"tool_name":"web.fetch","tool_args":{"url":"https://example.com"}}"#;
        let plan = Plan::from_reply(raw);

        assert_eq!(plan.steps, vec!["look it up", "answer"]);
        assert!(plan.requires_tool);
        assert_eq!(plan.tool_name.as_deref(), Some("web.fetch"));
        assert_eq!(plan.tool_args.get("url"), Some(&json!("https://example.com")));
    }

    #[test]
    fn test_plan_from_prose_falls_back() {
        let plan = Plan::from_reply("I think we should just answer directly.");
        assert_eq!(plan, Plan::default());
        assert_eq!(plan.steps, vec!["draft answer"]);
        assert!(!plan.requires_tool);
        assert!(plan.tool_name.is_none());
        assert!(plan.tool_args.is_empty());
    }

    #[test]
    fn test_plan_embedded_in_prose() {
        let raw = "Sure! Here is the plan:\n```json\n{\"steps\": [\"fetch\"],\n \"requires_tool\": true, \"tool_name\": \"web.fetch\", \"tool_args\": {\"url\": \"https://rust-lang.org\"}}\n```\nLet me know.";
        let plan = Plan::from_reply(raw);

        assert_eq!(plan.steps, vec!["fetch"]);
        assert!(plan.requires_tool);
        assert_eq!(plan.tool_args.get("url"), Some(&json!("https://rust-lang.org")));
    }

    #[test]
    fn test_plan_missing_fields_take_defaults() {
        let plan = Plan::from_reply(r#"{"requires_tool": false}"#);
        assert!(plan.steps.is_empty());
        assert!(plan.tool_name.is_none());
        assert!(plan.tool_args.is_empty());
    }

    #[test]
    fn test_plan_wrong_field_types_fall_back() {
        assert_eq!(Plan::from_reply(r#"{"steps": 3}"#), Plan::default());
        assert_eq!(Plan::from_reply(r#"["not", "an", "object"]"#), Plan::default());
        assert_eq!(Plan::from_reply("prefix {not json at all} suffix"), Plan::default());
    }

    #[test]
    fn test_plan_serializes_nulls() {
        let json = serde_json::to_string(&Plan::default()).unwrap();
        assert_eq!(
            json,
            r#"{"steps":["draft answer"],"requires_tool":false,"tool_name":null,"tool_args":{}}"#
        );
    }

    #[test]
    fn test_action_result_observation() {
        assert_eq!(ActionResult::skipped().observation(), "");
        assert_eq!(ActionResult::success("page text").observation(), "page text");
        assert_eq!(ActionResult::success("").observation(), "");
        assert_eq!(ActionResult::failure("boom").observation(), "boom");

        let denied = ActionResult::ToolDenied { tool: "shell".into() };
        assert!(!denied.is_ok());
        assert_eq!(denied.observation(), "Tool shell not allowed");
    }

    #[test]
    fn test_action_result_into_result() {
        assert!(ActionResult::failure("x").into_result().is_ok());

        let err = ActionResult::ToolDenied { tool: "shell".into() }
            .into_result()
            .unwrap_err();
        assert!(matches!(err, crate::Error::ToolDenied(ref t) if t == "shell"));
    }

    #[test]
    fn test_final_answer_from_reply() {
        let answer = FinalAnswer::from_reply(r#"{"summary":"ok","citations":[]}"#);
        assert_eq!(answer, FinalAnswer::text("ok"));

        let answer = FinalAnswer::from_reply("  Four, because 2+2=4.\n");
        assert_eq!(answer.summary, "Four, because 2+2=4.");
        assert!(answer.citations.is_empty());

        // Embedded JSON is not extracted here
        let raw = r#"Answer: {"summary":"ok"}"#;
        assert_eq!(FinalAnswer::from_reply(raw).summary, raw);
    }
}
