//! 外部API呼び出しを模擬するエージェント
//!
//! 疑似レイテンシの後、プランの先頭2項目を「実行」します。
//! 分岐を確認できるよう、設定された確率で失敗を注入します。

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::json;

use super::traits::{AgentCapability, AgentOutcome};
use crate::config::step::Step;
use crate::engine::context::RunContext;

/// 1回の呼び出しで実行するプラン項目数
const EXECUTED_PLAN_ENTRIES: usize = 2;

/// 外部サービス呼び出しの模擬エージェント
#[derive(Debug, Clone)]
pub struct MockExternalServiceAgent {
    latency: Duration,
    failure_rate: f64,
}

impl MockExternalServiceAgent {
    /// 新しいエージェントを生成
    ///
    /// `failure_rate` は 0.0〜1.0 に丸められます。
    pub fn new(latency: Duration, failure_rate: f64) -> Self {
        Self {
            latency,
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }

    /// 失敗しないエージェント
    pub fn reliable(latency: Duration) -> Self {
        Self::new(latency, 0.0)
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    fn should_fail(&self) -> bool {
        self.failure_rate > 0.0 && rand::thread_rng().gen_bool(self.failure_rate)
    }
}

impl Default for MockExternalServiceAgent {
    fn default() -> Self {
        Self::new(Duration::from_millis(150), 0.15)
    }
}

#[async_trait]
impl AgentCapability for MockExternalServiceAgent {
    async fn run(&self, step: &Step, context: &mut RunContext) -> AgentOutcome {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let executed: Vec<_> = context
            .plan()
            .iter()
            .take(EXECUTED_PLAN_ENTRIES)
            .cloned()
            .collect();

        if self.should_fail() {
            tracing::warn!(step_id = step.id(), "mock external service failure injected");
            return AgentOutcome::failure(json!({
                "error": "Mock external service failure",
                "attempted": executed,
            }));
        }

        AgentOutcome::success(json!({
            "executed": executed,
            "note": "Mock external API invocation; deterministic subset of plan executed for demo.",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::PlanEntry;

    fn step() -> Step {
        Step::new("step-3", "MockExternalServiceAgent", "Call", json!({ "plan": "derived plan" }))
    }

    fn context_with_plan(entries: usize) -> RunContext {
        let mut ctx = RunContext::new("x");
        ctx.set_plan(
            (1..=entries)
                .map(|order| PlanEntry {
                    order,
                    action: format!("action {}", order),
                    owner: "MockExternalServiceAgent".to_string(),
                })
                .collect(),
        );
        ctx
    }

    #[tokio::test]
    async fn test_executes_first_two_plan_entries() {
        let mut ctx = context_with_plan(3);
        let outcome = MockExternalServiceAgent::reliable(Duration::ZERO)
            .run(&step(), &mut ctx)
            .await;

        assert!(outcome.success);
        let executed = outcome.output["executed"].as_array().unwrap();
        assert_eq!(executed.len(), 2);
        assert_eq!(executed[1]["action"], "action 2");
    }

    #[tokio::test]
    async fn test_always_fails_at_rate_one() {
        let mut ctx = context_with_plan(1);
        let outcome = MockExternalServiceAgent::new(Duration::ZERO, 1.0)
            .run(&step(), &mut ctx)
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.output["error"], "Mock external service failure");
        assert_eq!(outcome.output["attempted"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_plan() {
        let mut ctx = RunContext::new("x");
        let outcome = MockExternalServiceAgent::reliable(Duration::ZERO)
            .run(&step(), &mut ctx)
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.output["executed"], json!([]));
    }

    #[test]
    fn test_failure_rate_is_clamped() {
        assert_eq!(MockExternalServiceAgent::new(Duration::ZERO, 3.0).failure_rate(), 1.0);
        assert_eq!(MockExternalServiceAgent::new(Duration::ZERO, -1.0).failure_rate(), 0.0);
    }
}
