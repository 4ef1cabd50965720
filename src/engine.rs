//! ワークフロー実行エンジン
//!
//! # 責務
//!
//! - Workflowオブジェクトを受け取り、エントリーステップからチェーンをたどって実行
//! - 各ステップの成否に応じた次ステップの決定（`onSuccess` / `onFailure`）
//! - ステップ間のデータ受け渡し（[`RunContext`]）
//! - タイムラインの記録と台帳への同期的な記録
//!
//! # モジュール構成
//!
//! - [`executor`][]: ワークフロー実行エンジン本体（状態機械）
//! - [`context`][]: ステップ実行コンテキスト（ステップ間データ受け渡し）
//! - [`result`][]: 実行結果型（タイムライン、台帳の状態、最終ステータス）
//!
//! # 使用例
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tracebound::agent::default_registry;
//! use tracebound::config::AgentSettings;
//! use tracebound::engine::WorkflowExecutor;
//! use tracebound::ledger::LedgerGateway;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1. Executorを生成（台帳なし）
//!     let executor = WorkflowExecutor::new(
//!         Arc::new(default_registry(&AgentSettings::default())),
//!         Arc::new(LedgerGateway::disabled()),
//!     );
//!
//!     // 2. 指示からワークフローを構築して実行
//!     let result = executor.execute("Book a room. Send the invite.").await?;
//!
//!     // 3. 結果を出力
//!     println!("Workflow: {}", result.workflow.id());
//!     println!("Status: {:?}", result.final_status);
//!     for entry in &result.timeline {
//!         println!("  Step {}: {:?}", entry.step_id(), entry.status);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod executor;
pub mod result;

// 公開APIの再エクスポート
pub use context::{Intent, PlanEntry, RunContext};
pub use executor::WorkflowExecutor;
pub use result::{
    ChainState, ChainTransaction, ExecutionError, ExecutionResult, ExecutionStatus, RoutingError,
    RunState, StepStatus, TimelineEntry, TransactionKind,
};
