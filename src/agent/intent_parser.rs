//! 指示をインテントとプランに分解するエージェント
//!
//! 指示を `.` と改行で文に分割し、空でない各文を1つのインテントとします。
//! 各インテントには外部呼び出しエージェントが担当するプラン項目が対応します。
//! 導出したインテントとプランは後続ステップのために [`RunContext`] に保存します。

use async_trait::async_trait;
use serde_json::json;

use super::EXTERNAL_SERVICE;
use super::traits::{AgentCapability, AgentOutcome};
use crate::config::step::Step;
use crate::engine::context::{Intent, PlanEntry, RunContext};

/// ルールベースの指示分解エージェント
#[derive(Debug, Clone, Default)]
pub struct IntentParserAgent;

impl IntentParserAgent {
    pub fn new() -> Self {
        Self
    }
}

/// 指示を文に分割（前後の空白を除去し、空の文は捨てる）
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(['.', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[async_trait]
impl AgentCapability for IntentParserAgent {
    async fn run(&self, step: &Step, context: &mut RunContext) -> AgentOutcome {
        let source = step
            .input()
            .get("instruction")
            .and_then(|v| v.as_str())
            .unwrap_or_else(|| context.instruction())
            .to_string();

        let intents: Vec<Intent> = split_sentences(&source)
            .into_iter()
            .enumerate()
            .map(|(idx, sentence)| Intent::new(idx + 1, sentence))
            .collect();

        let plan: Vec<PlanEntry> = intents
            .iter()
            .enumerate()
            .map(|(idx, intent)| PlanEntry {
                order: idx + 1,
                action: intent.summary.clone(),
                owner: EXTERNAL_SERVICE.to_string(),
            })
            .collect();

        tracing::debug!(step_id = step.id(), intents = intents.len(), "instruction parsed");

        let output = json!({
            "intents": intents,
            "plan": plan,
            "note": "Parsed intents with simple rule-based splitter.",
        });
        context.set_intents(intents);
        context.set_plan(plan);

        AgentOutcome::success(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_step(instruction: &str) -> Step {
        Step::new("step-1", "IntentParserAgent", "Parse", json!({ "instruction": instruction }))
    }

    #[test]
    fn test_split_sentences() {
        assert_eq!(split_sentences("Do X. Do Y."), vec!["Do X", "Do Y"]);
        assert_eq!(split_sentences("one\ntwo.\n\n three "), vec!["one", "two", "three"]);
        assert!(split_sentences(" . \n ").is_empty());
    }

    #[tokio::test]
    async fn test_two_sentences_yield_two_plan_entries() {
        let mut ctx = RunContext::new("Do X. Do Y.");
        let outcome = IntentParserAgent::new().run(&parse_step("Do X. Do Y."), &mut ctx).await;

        assert!(outcome.success);
        let plan = outcome.output["plan"].as_array().unwrap();
        assert_eq!(plan.len(), 2);
        for entry in plan {
            assert_eq!(entry["owner"], EXTERNAL_SERVICE);
        }
        assert_eq!(outcome.output["intents"][1]["id"], "intent-2");
        assert_eq!(outcome.output["intents"][1]["summary"], "Do Y");

        assert_eq!(ctx.intents().len(), 2);
        assert_eq!(ctx.plan()[0].order, 1);
        assert_eq!(ctx.plan()[1].action, "Do Y");
    }

    /// 入力に指示がない場合はコンテキストの指示を使う
    #[tokio::test]
    async fn test_falls_back_to_context_instruction() {
        let mut ctx = RunContext::new("Only one");
        let step = Step::new("step-1", "IntentParserAgent", "Parse", json!({}));
        let outcome = IntentParserAgent::new().run(&step, &mut ctx).await;

        assert!(outcome.success);
        assert_eq!(ctx.intents()[0].summary, "Only one");
    }

    /// 文が導出できなくても成功する
    #[tokio::test]
    async fn test_no_sentences_still_succeeds() {
        let mut ctx = RunContext::new("...");
        let outcome = IntentParserAgent::new().run(&parse_step("..."), &mut ctx).await;

        assert!(outcome.success);
        assert!(ctx.intents().is_empty());
        assert_eq!(outcome.output["plan"], json!([]));
    }
}
