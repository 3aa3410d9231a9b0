//! Prompt assembly for each stage.
//!
//! Every stage starts from the same frame: system prompt, then the memory
//! window, then the user's input. Plan and reflect append an assistant
//! scratch instruction that pins the reply format.

use super::message::Message;
use super::schema::Plan;
use crate::tools::web::truncate_chars;
use crate::Result;

/// Longest tool observation handed to the reflect stage, in characters.
pub const MAX_OBSERVATION_CHARS: usize = 4000;

pub const PLAN_INSTRUCTION: &str = "Decide a short plan. \
Respond ONLY with valid JSON in this exact format: \
{\"steps\":[], \"requires_tool\": true|false, \"tool_name\": null|\"web.fetch\", \"tool_args\": {}}";

pub const REFLECT_INSTRUCTION: &str = "Reflect on the plan and observation. \
Respond ONLY with valid JSON in this exact format: \
{\"summary\": \"your answer here\", \"citations\": []}";

/// `[system] + history + [user]`, plus an optional assistant scratch instruction.
pub fn build_messages(
    system_prompt: &str,
    history: &[Message],
    user: &str,
    scratch: Option<&str>,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(Message::system(system_prompt));
    messages.extend(history.iter().cloned());
    messages.push(Message::user(user));

    if let Some(scratch) = scratch.filter(|s| !s.is_empty()) {
        messages.push(Message::assistant(scratch));
    }

    messages
}

/// Frame for the reflect stage: the plan as an assistant turn, the
/// observation as a tool turn, then the reflect instruction.
pub fn build_reflect_messages(
    system_prompt: &str,
    history: &[Message],
    user: &str,
    plan: &Plan,
    observation: &str,
) -> Result<Vec<Message>> {
    let mut messages = build_messages(system_prompt, history, user, None);
    messages.push(Message::assistant(format!("PLAN: {}", serde_json::to_string(plan)?)));
    messages.push(Message::tool(truncate_chars(observation, MAX_OBSERVATION_CHARS)));
    messages.push(Message::assistant(REFLECT_INSTRUCTION));
    Ok(messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Role;

    #[test]
    fn test_build_messages_frame() {
        let history = vec![Message::user("earlier"), Message::assistant("reply")];
        let messages = build_messages("sys", &history, "now", None);

        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(messages[0].content, "sys");
        assert_eq!(messages[3].content, "now");
    }

    #[test]
    fn test_build_messages_with_scratch() {
        let messages = build_messages("sys", &[], "now", Some(PLAN_INSTRUCTION));
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2], Message::assistant(PLAN_INSTRUCTION));
    }

    #[test]
    fn test_reflect_frame_truncates_observation() {
        let observation = "x".repeat(MAX_OBSERVATION_CHARS * 2);
        let messages =
            build_reflect_messages("sys", &[], "q", &Plan::default(), &observation).unwrap();

        assert_eq!(messages.len(), 5);
        assert!(messages[2].content.starts_with("PLAN: {\"steps\":[\"draft answer\"]"));
        assert_eq!(messages[3].role, Role::Tool);
        assert_eq!(messages[3].content.chars().count(), MAX_OBSERVATION_CHARS);
        assert_eq!(messages[4], Message::assistant(REFLECT_INSTRUCTION));
    }
}
