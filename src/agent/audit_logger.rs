//! ワークフローの状態を要約するエージェント
//!
//! 終端ノード（`step-4` / `step-4-fail`）で使用され、
//! それまでのタイムラインを `[{stepId, status}]` に要約し、
//! 終端に到達する直前のステップを `lastStep` として残します。常に成功します。

use async_trait::async_trait;
use serde_json::{Value, json};

use super::traits::{AgentCapability, AgentOutcome};
use crate::config::step::Step;
use crate::engine::context::RunContext;

#[derive(Debug, Clone, Default)]
pub struct AuditLoggerAgent;

impl AuditLoggerAgent {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AgentCapability for AuditLoggerAgent {
    async fn run(&self, step: &Step, context: &mut RunContext) -> AgentOutcome {
        let summary: Vec<Value> = context
            .timeline()
            .iter()
            .map(|entry| json!({ "stepId": entry.step_id(), "status": entry.status }))
            .collect();
        let last_step = context
            .last_entry()
            .map(|entry| json!({ "stepId": entry.step_id(), "status": entry.status }));

        let halted = step
            .input()
            .get("failure")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let message = if halted {
            "Logged workflow failure and halted for audit trail."
        } else {
            "Logged workflow state for audit trail."
        };

        AgentOutcome::success(json!({
            "summary": summary,
            "lastStep": last_step,
            "halted": halted,
            "message": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::result::{StepStatus, TimelineEntry};

    #[tokio::test]
    async fn test_summarizes_timeline() {
        let mut ctx = RunContext::new("x");
        ctx.record(TimelineEntry::new(
            Step::new("step-1", "IntentParserAgent", "x", Value::Null),
            StepStatus::Success,
            json!({}),
        ));
        ctx.record(TimelineEntry::new(
            Step::new("step-2", "PolicyCheckAgent", "x", Value::Null),
            StepStatus::Failure,
            json!({}),
        ));

        let step = Step::new("step-4-fail", "AuditLoggerAgent", "x", json!({ "failure": true }));
        let outcome = AuditLoggerAgent::new().run(&step, &mut ctx).await;

        assert!(outcome.success);
        assert_eq!(
            outcome.output["summary"],
            json!([
                { "stepId": "step-1", "status": "success" },
                { "stepId": "step-2", "status": "failure" },
            ])
        );
        assert_eq!(outcome.output["halted"], true);
        assert_eq!(
            outcome.output["lastStep"],
            json!({ "stepId": "step-2", "status": "failure" })
        );
    }

    #[tokio::test]
    async fn test_success_terminal_is_not_halted() {
        let mut ctx = RunContext::new("x");
        let step = Step::new("step-4", "AuditLoggerAgent", "x", json!({ "timeline": true }));
        let outcome = AuditLoggerAgent::new().run(&step, &mut ctx).await;

        assert!(outcome.success);
        assert_eq!(outcome.output["halted"], false);
        assert_eq!(outcome.output["summary"], json!([]));
        assert!(outcome.output["lastStep"].is_null());
    }
}
