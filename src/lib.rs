//! Tracebound: 監査台帳付きのエージェントワークフロー実行エンジン
//!
//! 自然言語の指示を固定形状のステップチェーンに変換し、各ステップを名前付きエージェントで実行し、
//! ステップの成否に応じて分岐しながら、各状態遷移を追記専用の外部台帳に内容ハッシュとして記録します。
//!
//! # モジュール構成
//!
//! - [`config`]: ステップ・ワークフローの定義と設定ファイル
//! - [`agent`]: エージェントの共通インターフェース、レジストリ、組み込みエージェント
//! - [`ledger`]: 台帳クライアントとゲートウェイ
//! - [`engine`]: 実行コンテキスト、実行結果、エグゼキューター
//! - [`service`]: parse / execute / health の受付境界
//! - [`logging`]: tracing の初期化
//! - [`error`]: エラー型

pub mod agent;
pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod service;

pub use service::{HealthReport, WorkflowService};
