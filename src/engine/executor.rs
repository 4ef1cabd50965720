//! ワークフロー実行エンジン
//!
//! # 責務
//!
//! このモジュールは、ステップチェーンをたどる状態機械 `WorkflowExecutor` を提供します。
//! 各ステップのエージェントを呼び出し、タイムラインに記録し、成否に応じて次のステップを決め、
//! 台帳ゲートウェイへの記録を同じ順序で進めます。
//!
//! # 主要な型
//!
//! - [`WorkflowExecutor`][]: ワークフロー実行の中核となる構造体
//!
//! # 実行フロー
//!
//! 1. 台帳にワークフローを作成（有効な場合のみ）
//! 2. エントリーステップから開始
//! 3. 終端に到達するまで繰り返し
//!    - ステップIDとエージェント名を解決（失敗時はルーティングエラーとして中断）
//!    - エージェントを実行
//!    - タイムラインに記録し、台帳にステップを記録
//!    - 成否に応じて次のステップへ
//! 4. **最後の**エントリーから最終ステータスを導出し、台帳のワークフローを最終化
//!
//! エージェントの失敗とルーティングエラーはタイムラインのデータになります。
//! 台帳呼び出しのエラーだけが [`ExecutionError`] として呼び出し元に伝播します。

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::agent::{AgentCapability, AgentOutcome, AgentRegistry};
use crate::config::step::Step;
use crate::config::workflow::Workflow;
use crate::engine::context::RunContext;
use crate::engine::result::{
    ChainState, ExecutionError, ExecutionResult, ExecutionStatus, RoutingError, RunState,
    StepStatus, TimelineEntry, TransactionKind,
};
use crate::ledger::LedgerGateway;

/// ワークフロー実行エンジン
///
/// レジストリとゲートウェイは不変で、複数の実行から同時に共有できます。
/// 実行ごとの状態（[`RunContext`]、[`ChainState`]）は `run` の中で生成され、共有されません。
///
/// # フィールド
///
/// - `registry`: エージェント名 → エージェント
/// - `gateway`: 台帳ゲートウェイ（無効でも可）
/// - `step_timeout`: エージェント呼び出し1回あたりの期限（オプション）
#[derive(Debug, Clone)]
pub struct WorkflowExecutor {
    registry: Arc<AgentRegistry>,
    gateway: Arc<LedgerGateway>,
    step_timeout: Option<Duration>,
}

impl WorkflowExecutor {
    /// 新しいエグゼキューターを生成
    pub fn new(registry: Arc<AgentRegistry>, gateway: Arc<LedgerGateway>) -> Self {
        Self {
            registry,
            gateway,
            step_timeout: None,
        }
    }

    /// エージェント呼び出しの期限を設定
    ///
    /// 期限切れはエージェントの失敗として記録され、失敗側のエッジに進みます。
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    pub fn gateway(&self) -> &LedgerGateway {
        &self.gateway
    }

    /// 指示からワークフローを構築して実行
    pub async fn execute(&self, instruction: &str) -> Result<ExecutionResult, ExecutionError> {
        self.run(Workflow::build(instruction)).await
    }

    /// 任意のステップチェーンを実行
    ///
    /// # 戻り値
    ///
    /// - `Ok(ExecutionResult)`: 終端到達またはルーティングエラーによる中断
    /// - `Err(ExecutionError)`: 台帳呼び出しの失敗（実行全体が失敗）
    pub async fn run(&self, workflow: Workflow) -> Result<ExecutionResult, ExecutionError> {
        let mut context = RunContext::new(workflow.instruction());
        let mut chain = ChainState::new();

        // 1. 台帳にワークフローを作成
        if self.gateway.is_enabled() {
            let receipt = self.gateway.create_workflow(workflow.instruction()).await?;
            if let Some(receipt) = receipt.completed() {
                chain.workflow_id = receipt.workflow_id;
                if let Some(hash) = receipt.tx_hash {
                    chain.record(TransactionKind::Create, None, hash);
                }
            }
        }

        tracing::info!(
            workflow = workflow.id(),
            ledger_workflow_id = ?chain.workflow_id,
            steps = workflow.steps().len(),
            "workflow started"
        );

        // 2. エントリーステップから開始
        let mut current = workflow.entry_step().map(|s| s.id().to_string());
        let mut state = RunState::Finished;

        while let Some(step_id) = current.take() {
            // 3a. ステップの解決
            let Some(step) = workflow.step(&step_id) else {
                let error = RoutingError::UnknownStep { step_id: step_id.clone() };
                tracing::error!(workflow = workflow.id(), step_id = %step_id, "{}", error);
                self.record(&mut context, &mut chain, TimelineEntry::routing_error(&step_id, None, &error))
                    .await?;
                state = RunState::Aborted;
                break;
            };

            // 3b. エージェントの解決
            let Some(agent) = self.registry.get(step.agent_name()) else {
                let error = RoutingError::MissingAgent {
                    step_id: step_id.clone(),
                    agent_name: step.agent_name().to_string(),
                };
                tracing::error!(workflow = workflow.id(), step_id = %step_id, "{}", error);
                self.record(
                    &mut context,
                    &mut chain,
                    TimelineEntry::routing_error(&step_id, Some(step.clone()), &error),
                )
                .await?;
                state = RunState::Aborted;
                break;
            };

            // 3c. エージェントの実行
            tracing::debug!(step_id = step.id(), agent = step.agent_name(), "step started");
            let outcome = self.invoke(agent.as_ref(), step, &mut context).await;

            // 3d-e. タイムラインに記録
            let status = StepStatus::from_success(outcome.success);
            tracing::info!(
                workflow = workflow.id(),
                step_id = step.id(),
                status = status.as_str(),
                "step completed"
            );
            self.record(
                &mut context,
                &mut chain,
                TimelineEntry::new(step.clone(), status, outcome.output),
            )
            .await?;

            // 3f. 次のステップの決定
            current = step.next_step_id(status.is_success()).map(str::to_string);
        }

        // 4. 最後のエントリーから最終ステータスを導出
        let final_status = ExecutionStatus::from_timeline(context.timeline());

        if let Some(workflow_id) = self.ledger_workflow_id(&chain) {
            let receipt = self
                .gateway
                .finalize_workflow(workflow_id, final_status.is_success())
                .await?;
            if let Some(hash) = receipt.completed().and_then(|r| r.tx_hash) {
                chain.record(TransactionKind::Finalize, None, hash);
            }
        }

        tracing::info!(
            workflow = workflow.id(),
            final_status = ?final_status,
            state = ?state,
            transactions = chain.transactions.len(),
            "workflow finished"
        );

        Ok(ExecutionResult {
            workflow,
            timeline: context.into_timeline(),
            chain,
            final_status,
            state,
        })
    }

    /// エージェントを実行（期限付き）
    async fn invoke(
        &self,
        agent: &dyn AgentCapability,
        step: &Step,
        context: &mut RunContext,
    ) -> AgentOutcome {
        match self.step_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, agent.run(step, context)).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(step_id = step.id(), timeout_secs = timeout.as_secs(), "agent timed out");
                    AgentOutcome::failure(json!({
                        "error": "agent timed out",
                        "timeoutSecs": timeout.as_secs(),
                    }))
                }
            },
            None => agent.run(step, context).await,
        }
    }

    /// 台帳に送る対象のワークフローID
    ///
    /// ゲートウェイが無効、または作成時にIDが返らなかった場合は `None` です。
    fn ledger_workflow_id(&self, chain: &ChainState) -> Option<u64> {
        chain.workflow_id.filter(|_| self.gateway.is_enabled())
    }

    /// タイムラインへの追記と台帳へのステップ記録
    ///
    /// 台帳が無効、またはワークフローIDがない場合、台帳には何も送りません。
    async fn record(
        &self,
        context: &mut RunContext,
        chain: &mut ChainState,
        entry: TimelineEntry,
    ) -> Result<(), ExecutionError> {
        if let Some(workflow_id) = self.ledger_workflow_id(chain) {
            let receipt = self
                .gateway
                .log_step(
                    workflow_id,
                    entry.step_id(),
                    entry.agent_name(),
                    entry.status,
                    &entry.output,
                )
                .await?;
            if let Some(hash) = receipt.completed().and_then(|r| r.tx_hash) {
                chain.record(TransactionKind::Step, Some(entry.step_id()), hash);
            }
        }
        context.record(entry);
        Ok(())
    }
}
