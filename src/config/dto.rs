//! TOML デシリアライズ用の DTO (Data Transfer Object)
//!
//! # 責務
//!
//! このモジュールは、設定ファイルからのデータ読み込み専用の構造体を提供します。
//! DTO はバリデーション前の「生データ」を表現し、ドメインモデルとは分離されています。
//!
//! ## 設計思想
//!
//! - **単一責務**: TOML のデシリアライズのみを担当
//! - **バリデーション前の状態**: 不正なデータも一旦受け入れる
//! - **カプセル化**: config モジュール内部のみで使用（外部非公開）
//!
//! ## 変換フロー
//!
//! ```text
//! TOML ファイル
//!   ↓ (デシリアライズ)
//! SettingsDto
//!   ↓ (TryFrom でバリデーション)
//! Settings (ドメインモデル)
//! ```

use serde::{Deserialize, Serialize};

/// 設定 DTO
///
/// すべてのセクションは省略可能です。省略された値は既定値で補われます。
///
/// **注**: この構造体は config モジュール内部の実装詳細です。
/// 外部からは [`Settings`](super::settings::Settings) を使用してください。
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct SettingsDto {
    pub(super) ledger: LedgerSettingsDto,
    pub(super) agents: AgentSettingsDto,
    pub(super) execution: ExecutionSettingsDto,
    pub(super) logging: LoggingSettingsDto,
}

/// `[ledger]` セクション DTO
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct LedgerSettingsDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) rpc_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) credential: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) contract_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) call_timeout_secs: Option<u64>,
}

/// `[agents]` セクション DTO
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct AgentSettingsDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) external_failure_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) external_latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) banned_terms: Option<Vec<String>>,
}

/// `[execution]` セクション DTO
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct ExecutionSettingsDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) step_timeout_secs: Option<u64>,
}

/// `[logging]` セクション DTO
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct LoggingSettingsDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) json: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) directory: Option<String>,
}
