//! 受付境界
//!
//! # 責務
//!
//! - `parse`: 指示からワークフローを構築（実行も台帳呼び出しもしない）
//! - `execute`: 指示からワークフローを構築して実行
//! - `health`: 台帳の設定状態と稼働時間の報告
//!
//! 空または空白のみの指示は、ワークフローを構築する前に
//! [`ServiceError::EmptyInstruction`] として拒否します。
//!
//! [`WorkflowService`] は不変のレジストリとゲートウェイだけを共有するため、
//! 複数の実行を同時に処理できます。

use std::sync::Arc;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::agent::{AgentRegistry, default_registry};
use crate::config::{Settings, Workflow};
use crate::engine::{ExecutionResult, WorkflowExecutor};
use crate::error::ServiceError;
use crate::ledger::LedgerGateway;

/// ヘルスチェックの結果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    /// 台帳ゲートウェイが有効かどうか
    pub onchain: bool,
    pub contract_address: Option<String>,
    pub rpc_configured: bool,
    /// RFC 3339 形式の現在時刻
    pub timestamp: String,
    pub uptime_seconds: u64,
}

/// ワークフローサービス
#[derive(Debug, Clone)]
pub struct WorkflowService {
    executor: WorkflowExecutor,
    rpc_configured: bool,
    started_at: Instant,
}

impl WorkflowService {
    /// 任意のレジストリとゲートウェイからサービスを生成
    pub fn new(registry: AgentRegistry, gateway: LedgerGateway) -> Self {
        Self {
            executor: WorkflowExecutor::new(Arc::new(registry), Arc::new(gateway)),
            rpc_configured: false,
            started_at: Instant::now(),
        }
    }

    /// 設定からサービスを生成
    ///
    /// 組み込みエージェントのレジストリと、設定に応じた台帳ゲートウェイを使用します。
    pub fn from_settings(settings: &Settings) -> Result<Self, ServiceError> {
        let registry = default_registry(&settings.agents);
        let gateway = LedgerGateway::from_settings(&settings.ledger)?;

        let mut executor = WorkflowExecutor::new(Arc::new(registry), Arc::new(gateway));
        if let Some(timeout) = settings.execution.step_timeout {
            executor = executor.with_step_timeout(timeout);
        }

        Ok(Self {
            executor,
            rpc_configured: settings.ledger.rpc_url.is_some(),
            started_at: Instant::now(),
        })
    }

    /// 指示からワークフローを構築（実行しない）
    pub fn parse(&self, instruction: &str) -> Result<Workflow, ServiceError> {
        let instruction = validate_instruction(instruction)?;
        Ok(Workflow::build(instruction))
    }

    /// 指示からワークフローを構築して実行
    pub async fn execute(&self, instruction: &str) -> Result<ExecutionResult, ServiceError> {
        let instruction = validate_instruction(instruction)?;
        Ok(self.executor.execute(instruction).await?)
    }

    /// ヘルスチェック
    ///
    /// `contractAddress` は台帳が有効な場合のみ、接続先から取得します。
    pub fn health(&self) -> HealthReport {
        let gateway = self.executor.gateway();
        HealthReport {
            status: "ok",
            onchain: gateway.is_enabled(),
            contract_address: gateway.target().map(str::to_string),
            rpc_configured: self.rpc_configured,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            uptime_seconds: self.started_at.elapsed().as_secs(),
        }
    }
}

/// 前後の空白を除去し、空なら拒否
fn validate_instruction(instruction: &str) -> Result<&str, ServiceError> {
    let trimmed = instruction.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::EmptyInstruction);
    }
    Ok(trimmed)
}
