//! エージェントの共通インターフェース定義
//!
//! # 責務
//!
//! - 1ステップ分の処理を行うエージェントの共通トレイト [`AgentCapability`] を定義
//! - エージェント非依存の結果型 [`AgentOutcome`] を提供
//!
//! # 使用例
//!
//! ```rust
//! use async_trait::async_trait;
//! use serde_json::json;
//! use tracebound::agent::{AgentCapability, AgentOutcome};
//! use tracebound::config::step::Step;
//! use tracebound::engine::context::RunContext;
//!
//! struct EchoAgent;
//!
//! #[async_trait]
//! impl AgentCapability for EchoAgent {
//!     async fn run(&self, step: &Step, context: &mut RunContext) -> AgentOutcome {
//!         AgentOutcome::success(json!({
//!             "step": step.id(),
//!             "instruction": context.instruction(),
//!         }))
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::step::Step;
use crate::engine::context::RunContext;

/// エージェントの共通インターフェース
///
/// # 契約
///
/// - `step` は変更できない（`&Step`）
/// - `context` の成果物は読み書きできるが、タイムラインは読み取りのみ
/// - `success: false` は通常の結果であり、エラーではない
/// - 非同期に待機してよい（外部I/Oの模擬など）
///
/// # 実装要件
///
/// - `Send + Sync`: 並行する複数の実行から共有される
#[async_trait]
pub trait AgentCapability: Send + Sync {
    /// ステップを処理して結果を返す
    async fn run(&self, step: &Step, context: &mut RunContext) -> AgentOutcome;
}

/// エージェントの実行結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub success: bool,
    /// 不透明な出力ペイロード
    pub output: Value,
}

impl AgentOutcome {
    pub fn success(output: Value) -> Self {
        Self { success: true, output }
    }

    pub fn failure(output: Value) -> Self {
        Self {
            success: false,
            output,
        }
    }
}
