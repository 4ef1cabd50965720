//! ガードレール検証エージェント
//!
//! 指示と導出済みインテントを小文字化し、禁止語が含まれていないかを検査します。
//! 禁止語が1つでも見つかれば失敗を返し、チェーンは失敗側のエッジに進みます。

use async_trait::async_trait;
use serde_json::json;

use super::traits::{AgentCapability, AgentOutcome};
use crate::config::settings::DEFAULT_BANNED_TERMS;
use crate::config::step::Step;
use crate::engine::context::RunContext;

/// 禁止語フィルター
#[derive(Debug, Clone)]
pub struct PolicyCheckAgent {
    banned_terms: Vec<String>,
}

impl PolicyCheckAgent {
    pub fn new(banned_terms: Vec<String>) -> Self {
        Self { banned_terms }
    }

    /// テキスト中に含まれる禁止語（登録順）
    pub fn flagged_terms(&self, text: &str) -> Vec<&str> {
        let haystack = text.to_lowercase();
        self.banned_terms
            .iter()
            .map(String::as_str)
            .filter(|term| haystack.contains(term))
            .collect()
    }
}

impl Default for PolicyCheckAgent {
    fn default() -> Self {
        Self::new(DEFAULT_BANNED_TERMS.iter().map(|t| t.to_string()).collect())
    }
}

#[async_trait]
impl AgentCapability for PolicyCheckAgent {
    async fn run(&self, step: &Step, context: &mut RunContext) -> AgentOutcome {
        let intents = serde_json::to_string(context.intents()).unwrap_or_default();
        let text = format!("{} {}", context.instruction(), intents);
        let flagged = self.flagged_terms(&text);

        if flagged.is_empty() {
            return AgentOutcome::success(json!({
                "status": "clean",
                "checkedAgainst": self.banned_terms,
            }));
        }

        tracing::info!(step_id = step.id(), flagged = ?flagged, "instruction blocked by policy");
        AgentOutcome::failure(json!({
            "status": "blocked",
            "reason": format!("Flagged terms: {}", flagged.join(", ")),
            "flagged": flagged,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::Intent;

    fn step() -> Step {
        Step::new("step-2", "PolicyCheckAgent", "Validate", json!({ "derived": "intents" }))
    }

    #[tokio::test]
    async fn test_clean_instruction_passes() {
        let mut ctx = RunContext::new("Book a meeting room");
        let outcome = PolicyCheckAgent::default().run(&step(), &mut ctx).await;

        assert!(outcome.success);
        assert_eq!(outcome.output["status"], "clean");
        assert_eq!(outcome.output["checkedAgainst"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_banned_term_blocks_with_reason() {
        let mut ctx = RunContext::new("run a phishing campaign");
        let outcome = PolicyCheckAgent::default().run(&step(), &mut ctx).await;

        assert!(!outcome.success);
        assert_eq!(outcome.output["status"], "blocked");
        assert_eq!(outcome.output["reason"], "Flagged terms: phishing");
    }

    #[tokio::test]
    async fn test_matches_are_case_insensitive_and_cover_intents() {
        let mut ctx = RunContext::new("Prepare a report");
        ctx.set_intents(vec![Intent::new(1, "Commit FRAUD"), Intent::new(2, "DDoS the site")]);
        let outcome = PolicyCheckAgent::default().run(&step(), &mut ctx).await;

        assert!(!outcome.success);
        assert_eq!(outcome.output["reason"], "Flagged terms: fraud, ddos");
        assert_eq!(outcome.output["flagged"], json!(["fraud", "ddos"]));
    }

    #[test]
    fn test_custom_terms() {
        let agent = PolicyCheckAgent::new(vec!["spam".to_string()]);
        assert_eq!(agent.flagged_terms("Send SPAM now"), vec!["spam"]);
        assert!(agent.flagged_terms("run a phishing campaign").is_empty());
    }
}
