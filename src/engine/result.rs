//! ワークフロー実行結果の型定義
//!
//! # 主要な型
//!
//! - [`ExecutionResult`][]: 実行全体の結果（ワークフロー、タイムライン、台帳の状態、最終ステータス）
//! - [`TimelineEntry`][]: 1ステップ分の実行記録（追記のみ）
//! - [`ChainState`][]: 台帳側の記録（ワークフローID + トランザクション一覧）
//! - [`StepStatus`][] / [`ExecutionStatus`][]: ステップ・実行全体のステータス
//! - [`RoutingError`][]: 不正なチェーンによる致命的なルーティングエラー
//! - [`ExecutionError`][]: 実行を中断させるエラー（台帳の通信失敗）
//!
//! # 使用例
//!
//! ```rust,no_run
//! use tracebound::engine::result::ExecutionResult;
//!
//! fn handle_result(result: ExecutionResult) {
//!     println!("ワークフロー: {}", result.workflow.id());
//!     println!("最終ステータス: {:?}", result.final_status);
//!     for entry in &result.timeline {
//!         println!("  {}: {:?}", entry.step_id(), entry.status);
//!     }
//!     if let Ok(json) = result.to_json() {
//!         println!("JSON: {}", json);
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::config::step::Step;
use crate::config::workflow::Workflow;
use crate::error::LedgerError;
use crate::ledger::TxHash;

/// ステップ実行ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Failure,
}

impl StepStatus {
    pub fn from_success(success: bool) -> Self {
        if success {
            StepStatus::Success
        } else {
            StepStatus::Failure
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StepStatus::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Success => "success",
            StepStatus::Failure => "failure",
        }
    }
}

/// ワークフロー全体の最終ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Success,
    Failure,
}

impl ExecutionStatus {
    /// タイムラインの**最後の**エントリーから最終ステータスを導出
    ///
    /// 途中のステップが失敗していても、最後のエントリーが成功なら成功です。
    /// タイムラインが空の場合も成功として扱います。
    pub fn from_timeline(timeline: &[TimelineEntry]) -> Self {
        match timeline.last() {
            Some(entry) if entry.status == StepStatus::Failure => ExecutionStatus::Failure,
            _ => ExecutionStatus::Success,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionStatus::Success)
    }
}

/// 実行全体の終了状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// 終端ノードに到達して終了
    Finished,
    /// ルーティングエラーで中断
    Aborted,
}

/// タイムラインのエントリー
///
/// 追記後は変更されません。`step` はルーティングエラーでステップが
/// 解決できなかった場合のみ `None` になります。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    step_id: String,
    pub step: Option<Step>,
    pub status: StepStatus,
    pub output: Value,
}

impl TimelineEntry {
    pub fn new(step: Step, status: StepStatus, output: Value) -> Self {
        Self {
            step_id: step.id().to_string(),
            step: Some(step),
            status,
            output,
        }
    }

    /// ルーティングエラーの失敗エントリーを生成
    pub fn routing_error(step_id: &str, step: Option<Step>, error: &RoutingError) -> Self {
        Self {
            step_id: step_id.to_string(),
            step,
            status: StepStatus::Failure,
            output: error.to_payload(),
        }
    }

    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    /// 台帳に記録するエージェント名（ステップ未解決時は空文字列）
    pub fn agent_name(&self) -> &str {
        self.step.as_ref().map(|s| s.agent_name()).unwrap_or("")
    }
}

/// ルーティングエラー
///
/// 不正なチェーン（存在しないステップID、未登録のエージェント）による致命的な状態です。
/// 例外ではなく、失敗のタイムラインエントリーとして記録されます。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("unknown step '{step_id}'")]
    UnknownStep { step_id: String },

    #[error("missing agent '{agent_name}' for step '{step_id}'")]
    MissingAgent { step_id: String, agent_name: String },
}

impl RoutingError {
    /// タイムラインに記録するペイロード
    pub fn to_payload(&self) -> Value {
        match self {
            RoutingError::UnknownStep { step_id } => json!({
                "error": "routing error",
                "kind": "unknownStep",
                "stepId": step_id,
                "message": self.to_string(),
            }),
            RoutingError::MissingAgent { step_id, agent_name } => json!({
                "error": "routing error",
                "kind": "missingAgent",
                "stepId": step_id,
                "agentName": agent_name,
                "message": self.to_string(),
            }),
        }
    }
}

/// 台帳トランザクションの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Create,
    Step,
    Finalize,
}

/// 台帳トランザクションの記録
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    pub hash: TxHash,
}

/// 台帳側の状態
///
/// `workflow_id` は台帳が無効、または作成時にIDが得られなかった場合 `None` です。
/// トランザクションは因果順（create → step... → finalize）に並びます。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainState {
    pub workflow_id: Option<u64>,
    pub transactions: Vec<ChainTransaction>,
}

impl ChainState {
    pub fn new() -> Self {
        Self::default()
    }

    /// トランザクションを追記
    pub fn record(&mut self, kind: TransactionKind, step_id: Option<&str>, hash: TxHash) {
        self.transactions.push(ChainTransaction {
            kind,
            step_id: step_id.map(str::to_string),
            hash,
        });
    }

    /// 指定種別のトランザクション数
    pub fn count(&self, kind: TransactionKind) -> usize {
        self.transactions.iter().filter(|tx| tx.kind == kind).count()
    }
}

/// ワークフロー実行結果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub workflow: Workflow,
    pub timeline: Vec<TimelineEntry>,
    pub chain: ChainState,
    pub final_status: ExecutionStatus,
    pub state: RunState,
}

impl ExecutionResult {
    /// 結果をJSON形式でシリアライズ
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 最終ステータスが成功かどうか
    pub fn is_success(&self) -> bool {
        self.final_status.is_success()
    }

    /// 実行されたステップIDの一覧（実行順）
    pub fn step_ids(&self) -> Vec<&str> {
        self.timeline.iter().map(|e| e.step_id()).collect()
    }
}

/// 実行エラー
///
/// 実行を中断させ、呼び出し元に伝播するエラーです。
/// エージェントの失敗とルーティングエラーはここに含まれず、タイムラインのデータになります。
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// 台帳呼び出し中のエラー（実行全体にとって致命的）
    #[error("台帳エラー: {0}")]
    Ledger(#[from] LedgerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, status: StepStatus) -> TimelineEntry {
        TimelineEntry::new(Step::new(id, "AuditLoggerAgent", "x", Value::Null), status, json!({}))
    }

    #[test]
    fn test_final_status_follows_last_entry() {
        let timeline = vec![
            entry("step-1", StepStatus::Failure),
            entry("step-4-fail", StepStatus::Success),
        ];
        assert_eq!(ExecutionStatus::from_timeline(&timeline), ExecutionStatus::Success);

        let timeline = vec![
            entry("step-1", StepStatus::Success),
            entry("step-2", StepStatus::Failure),
        ];
        assert_eq!(ExecutionStatus::from_timeline(&timeline), ExecutionStatus::Failure);
    }

    #[test]
    fn test_final_status_of_empty_timeline_is_success() {
        assert_eq!(ExecutionStatus::from_timeline(&[]), ExecutionStatus::Success);
    }

    #[test]
    fn test_routing_error_entry() {
        let error = RoutingError::MissingAgent {
            step_id: "step-1".to_string(),
            agent_name: "GhostAgent".to_string(),
        };
        let step = Step::new("step-1", "GhostAgent", "x", Value::Null);
        let entry = TimelineEntry::routing_error("step-1", Some(step), &error);

        assert_eq!(entry.status, StepStatus::Failure);
        assert_eq!(entry.output["error"], "routing error");
        assert_eq!(entry.output["kind"], "missingAgent");
        assert_eq!(entry.output["agentName"], "GhostAgent");
        assert_eq!(entry.agent_name(), "GhostAgent");
    }

    #[test]
    fn test_unknown_step_entry_has_no_step() {
        let error = RoutingError::UnknownStep { step_id: "nowhere".to_string() };
        let entry = TimelineEntry::routing_error("nowhere", None, &error);

        assert!(entry.step.is_none());
        assert_eq!(entry.step_id(), "nowhere");
        assert_eq!(entry.agent_name(), "");
        assert_eq!(entry.output["kind"], "unknownStep");
    }

    #[test]
    fn test_chain_state_serialization() {
        let mut chain = ChainState::new();
        chain.workflow_id = Some(7);
        chain.record(TransactionKind::Create, None, TxHash::from("0x01"));
        chain.record(TransactionKind::Step, Some("step-1"), TxHash::from("0x02"));

        let value = serde_json::to_value(&chain).unwrap();
        assert_eq!(value["workflowId"], 7);
        assert_eq!(value["transactions"][0]["type"], "create");
        assert!(value["transactions"][0].get("stepId").is_none());
        assert_eq!(value["transactions"][1]["stepId"], "step-1");
        assert_eq!(value["transactions"][1]["hash"], "0x02");
        assert_eq!(chain.count(TransactionKind::Step), 1);
    }

    #[test]
    fn test_disabled_chain_state_serializes_null_id() {
        let value = serde_json::to_value(ChainState::new()).unwrap();
        assert!(value["workflowId"].is_null());
        assert_eq!(value["transactions"], json!([]));
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_value(StepStatus::Success).unwrap(), "success");
        assert_eq!(serde_json::to_value(ExecutionStatus::Failure).unwrap(), "failure");
        assert_eq!(serde_json::to_value(RunState::Aborted).unwrap(), "aborted");
    }
}
