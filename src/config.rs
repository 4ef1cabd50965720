//! 設定とワークフロー定義
//!
//! # モジュール構成
//!
//! - [`step`][]: チェーンのノード [`Step`](step::Step)
//! - [`workflow`][]: ステップの連鎖 [`Workflow`](workflow::Workflow) とその構築
//! - [`settings`][]: TOML 設定ファイルと環境変数による上書き
//! - `dto`: TOML デシリアライズ専用の内部型

mod dto;
pub mod settings;
pub mod step;
pub mod workflow;

pub use settings::{
    AgentSettings, ExecutionSettings, LedgerBackend, LedgerSettings, LoggingSettings, Settings,
};
pub use step::Step;
pub use workflow::Workflow;
