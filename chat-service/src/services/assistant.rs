//! Prompt assembly and reply generation for the fitness chat assistant.

use super::providers::{GenerationParams, TextProvider};
use crate::models::{MessageRole, UserInfo};
use std::sync::Arc;

pub const FALLBACK_REPLY: &str =
    "I apologize, but I'm having trouble generating a response right now. Please try again.";

/// Number of prior turns included in the prompt.
pub const HISTORY_WINDOW: usize = 10;

#[derive(Clone)]
pub struct AssistantService {
    provider: Arc<dyn TextProvider>,
}

impl AssistantService {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self { provider }
    }

    /// Never fails: provider errors are logged and replaced by [`FALLBACK_REPLY`].
    #[tracing::instrument(skip_all, fields(history_len = history.len()))]
    pub async fn generate_response(
        &self,
        message: &str,
        history: &[(MessageRole, String)],
        user_info: Option<&UserInfo>,
    ) -> String {
        let prompt = build_prompt(message, history, user_info);

        match self
            .provider
            .generate(&prompt, &GenerationParams::default())
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Error generating response: {}", e);
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

/// Renders a float the way the user typed it for whole numbers: `80.0`.
fn format_measure(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

/// The `User context:` block, or an empty string when nothing is known.
pub fn build_context(user_info: Option<&UserInfo>) -> String {
    let Some(info) = user_info else {
        return String::new();
    };

    let mut lines = Vec::new();

    if present(&info.first_name).is_some() || present(&info.last_name).is_some() {
        let name = format!(
            "{} {}",
            present(&info.first_name).unwrap_or(""),
            present(&info.last_name).unwrap_or("")
        );
        lines.push(format!("User's name: {}", name.trim()));
    }
    if let Some(weight) = nonzero(info.weight) {
        lines.push(format!("Current weight: {}kg", format_measure(weight)));
    }
    if let Some(goal) = nonzero(info.weight_goal) {
        lines.push(format!("Weight goal: {}kg", format_measure(goal)));
    }
    if let Some(height) = nonzero(info.height) {
        lines.push(format!("Height: {}cm", format_measure(height)));
    }

    let labelled = [
        ("Occupation", &info.job),
        ("Fitness level", &info.fitness_level),
        ("Fitness goal", &info.fitness_goal),
        ("Health condition", &info.health_condition),
        ("Allergies", &info.allergy),
    ];
    for (label, value) in labelled {
        if let Some(value) = present(value) {
            lines.push(format!("{}: {}", label, value));
        }
    }

    if lines.is_empty() {
        String::new()
    } else {
        format!("User context:\n{}\n\n", lines.join("\n"))
    }
}

pub fn build_prompt(
    message: &str,
    history: &[(MessageRole, String)],
    user_info: Option<&UserInfo>,
) -> String {
    let mut prompt = build_context(user_info);

    if !history.is_empty() {
        let start = history.len().saturating_sub(HISTORY_WINDOW);
        let lines: Vec<String> = history[start..]
            .iter()
            .map(|(role, content)| match role {
                MessageRole::User => format!("User: {}", content),
                MessageRole::Assistant => format!("Assistant: {}", content),
            })
            .collect();
        prompt.push_str("Previous conversation:\n");
        prompt.push_str(&lines.join("\n"));
        prompt.push_str("\n\n");
    }

    prompt.push_str(&format!("User: {}\nAssistant:", message));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockTextProvider;

    #[test]
    fn context_is_empty_without_user_info() {
        assert_eq!(build_context(None), "");
        assert_eq!(build_context(Some(&UserInfo::default())), "");
    }

    #[test]
    fn context_lists_fields_in_order() {
        let info = UserInfo {
            first_name: Some("John".to_string()),
            weight: Some(80.0),
            height: Some(180.5),
            fitness_goal: Some("lose fat".to_string()),
            health_condition: Some("diabetic".to_string()),
            ..Default::default()
        };

        assert_eq!(
            build_context(Some(&info)),
            "User context:\nUser's name: John\nCurrent weight: 80.0kg\nHeight: 180.5cm\n\
             Fitness goal: lose fat\nHealth condition: diabetic\n\n"
        );
    }

    #[test]
    fn last_name_alone_is_trimmed() {
        let info = UserInfo {
            last_name: Some("Doe".to_string()),
            ..Default::default()
        };
        assert_eq!(build_context(Some(&info)), "User context:\nUser's name: Doe\n\n");
    }

    #[test]
    fn prompt_without_history_is_single_turn() {
        assert_eq!(build_prompt("Hello", &[], None), "User: Hello\nAssistant:");
    }

    #[test]
    fn prompt_keeps_last_ten_turns() {
        let history: Vec<(MessageRole, String)> = (0..12)
            .map(|i| {
                let role = if i % 2 == 0 {
                    MessageRole::User
                } else {
                    MessageRole::Assistant
                };
                (role, format!("m{}", i))
            })
            .collect();

        let prompt = build_prompt("next", &history, None);
        assert!(prompt.starts_with("Previous conversation:\nUser: m2\nAssistant: m3\n"));
        assert!(!prompt.contains("m1\n"));
        assert!(prompt.ends_with("Assistant: m11\n\nUser: next\nAssistant:"));
    }

    #[tokio::test]
    async fn provider_failure_returns_apology() {
        let service = AssistantService::new(Arc::new(MockTextProvider::new(false)));
        let reply = service.generate_response("hi", &[], None).await;
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn provider_reply_is_returned() {
        let service = AssistantService::new(Arc::new(MockTextProvider::with_reply("Do squats.")));
        let reply = service.generate_response("hi", &[], None).await;
        assert_eq!(reply, "Do squats.");
    }
}
