//! エージェント抽象化レイヤー
//!
//! # 責務
//!
//! - ステップを実行する能力（[`AgentCapability`]）の統一インターフェースを提供
//! - エージェント名から実装を引くレジストリ（[`AgentRegistry`]）
//! - 組み込みの4エージェントと、設定からの既定レジストリの生成
//!
//! # モジュール構成
//!
//! - `traits` - 共通インターフェース（[`AgentCapability`]トレイト等）
//! - `registry` - 名前 → エージェントの対応表
//! - `intent_parser` - 指示をインテントとプランに分解
//! - `policy_check` - 禁止語によるガードレール
//! - `external_service` - 外部API呼び出しの模擬（失敗注入付き）
//! - `audit_logger` - タイムラインの要約
//!
//! # 使用例
//!
//! ```rust
//! use tracebound::agent::{default_registry, INTENT_PARSER};
//! use tracebound::config::AgentSettings;
//!
//! let registry = default_registry(&AgentSettings::default());
//! assert!(registry.contains(INTENT_PARSER));
//! assert_eq!(registry.len(), 4);
//! ```

pub mod audit_logger;
pub mod external_service;
pub mod intent_parser;
pub mod policy_check;
pub mod registry;
pub mod traits;

use std::sync::Arc;

// 公開APIの再エクスポート
pub use audit_logger::AuditLoggerAgent;
pub use external_service::MockExternalServiceAgent;
pub use intent_parser::IntentParserAgent;
pub use policy_check::PolicyCheckAgent;
pub use registry::AgentRegistry;
pub use traits::{AgentCapability, AgentOutcome};

use crate::config::AgentSettings;

/// 組み込みエージェントのレジストリ名
pub const INTENT_PARSER: &str = "IntentParserAgent";
pub const POLICY_CHECK: &str = "PolicyCheckAgent";
pub const EXTERNAL_SERVICE: &str = "MockExternalServiceAgent";
pub const AUDIT_LOGGER: &str = "AuditLoggerAgent";

/// 組み込みの4エージェントを登録したレジストリを生成
pub fn default_registry(settings: &AgentSettings) -> AgentRegistry {
    AgentRegistry::new()
        .with(INTENT_PARSER, Arc::new(IntentParserAgent::new()))
        .with(
            POLICY_CHECK,
            Arc::new(PolicyCheckAgent::new(settings.banned_terms.clone())),
        )
        .with(
            EXTERNAL_SERVICE,
            Arc::new(MockExternalServiceAgent::new(
                settings.external_latency,
                settings.external_failure_rate,
            )),
        )
        .with(AUDIT_LOGGER, Arc::new(AuditLoggerAgent::new()))
}
