//! 外部監査台帳の抽象化レイヤー
//!
//! # 責務
//!
//! - 各状態遷移を追記専用の外部台帳に記録し、改ざん検知可能な監査証跡を残す
//! - 台帳が未設定・到達不能でも実行を継続できるよう、無効状態を通常状態として扱う
//! - ペイロードは内容ハッシュ（コミットメント）として記録し、データ本体は送らない
//!
//! # モジュール構成
//!
//! - `traits` - 共通インターフェース（[`LedgerClient`]トレイト等）
//! - `hash` - ペイロードの正規化と内容ハッシュ
//! - `gateway` - エグゼキューターが使用する [`LedgerGateway`]
//! - `rpc` - JSON-RPC over HTTP の台帳クライアント
//! - `memory` - プロセス内の追記専用台帳（オフライン/テスト用）
//!
//! # 使用例
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tracebound::ledger::{LedgerGateway, MemoryLedger};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = LedgerGateway::new(Arc::new(MemoryLedger::new()));
//!
//!     if let Some(receipt) = gateway.create_workflow("Do X.").await?.completed() {
//!         println!("workflow id: {:?}", receipt.workflow_id);
//!     }
//!     Ok(())
//! }
//! ```

pub mod gateway;
pub mod hash;
pub mod memory;
pub mod rpc;
pub mod traits;

// 公開APIの再エクスポート
pub use gateway::{LedgerCall, LedgerGateway, TxReceipt, WorkflowReceipt};
pub use memory::MemoryLedger;
pub use rpc::RpcLedgerClient;
pub use traits::{
    ContentHash, CreatedWorkflow, LedgerClient, StepRecord, StepStatusCode, TxHash,
    WorkflowStatusCode,
};
