//! アプリケーション設定の読み込みと管理を行うモジュール
//!
//! # 責務
//!
//! - TOML 設定ファイルの読み込み（DTO → バリデーション済みドメインモデル）
//! - 環境変数による上書き（`ENABLE_ONCHAIN`, `RPC_URL`, `PRIVATE_KEY`, `CONTRACT_ADDRESS`）
//! - 台帳・エージェント・実行・ログの各設定値の提供
//!
//! # 使用例
//!
//! ```rust
//! use tracebound::config::settings::Settings;
//!
//! let settings = Settings::from_toml(r#"
//! [ledger]
//! backend = "memory"
//!
//! [agents]
//! external_failure_rate = 0.0
//! "#).unwrap();
//!
//! assert!(settings.ledger.is_configured());
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use tracing::level_filters::LevelFilter;

use super::dto::{
    AgentSettingsDto, ExecutionSettingsDto, LedgerSettingsDto, LoggingSettingsDto, SettingsDto,
};
use crate::error::ConfigError;

/// 既定の禁止語リスト
pub const DEFAULT_BANNED_TERMS: [&str; 5] = ["exploit", "fraud", "ddos", "phishing", "ransom"];

const DEFAULT_FAILURE_RATE: f64 = 0.15;
const DEFAULT_LATENCY_MS: u64 = 150;
const DEFAULT_LOG_LEVEL: &str = "info";

/// アプリケーション設定（ドメインモデル）
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub ledger: LedgerSettings,
    pub agents: AgentSettings,
    pub execution: ExecutionSettings,
    pub logging: LoggingSettings,
}

/// 台帳バックエンドの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedgerBackend {
    /// JSON-RPC over HTTP の外部台帳
    #[default]
    Rpc,
    /// プロセス内の台帳（オフライン/デモ用）
    Memory,
}

impl LedgerBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerBackend::Rpc => "rpc",
            LedgerBackend::Memory => "memory",
        }
    }
}

impl FromStr for LedgerBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rpc" => Ok(LedgerBackend::Rpc),
            "memory" => Ok(LedgerBackend::Memory),
            other => Err(ConfigError::Validation(format!(
                "未知の台帳バックエンドです: {}",
                other
            ))),
        }
    }
}

/// 台帳設定
#[derive(Clone)]
pub struct LedgerSettings {
    /// 明示的な有効/無効フラグ
    pub enabled: bool,
    pub backend: LedgerBackend,
    pub rpc_url: Option<String>,
    /// 署名用クレデンシャル
    pub credential: Option<String>,
    pub contract_address: Option<String>,
    /// 台帳呼び出し1回あたりの期限（未設定なら無期限）
    pub call_timeout: Option<Duration>,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: LedgerBackend::Rpc,
            rpc_url: None,
            credential: None,
            contract_address: None,
            call_timeout: None,
        }
    }
}

impl LedgerSettings {
    /// 台帳ゲートウェイを有効にできるだけの設定が揃っているか
    ///
    /// 明示的な無効化と必須値の欠落は同じ扱いになります。
    pub fn is_configured(&self) -> bool {
        if !self.enabled {
            return false;
        }
        match self.backend {
            LedgerBackend::Memory => true,
            LedgerBackend::Rpc => {
                non_empty(&self.rpc_url) && non_empty(&self.credential) && non_empty(&self.contract_address)
            }
        }
    }
}

// クレデンシャルはログに出さない
impl fmt::Debug for LedgerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerSettings")
            .field("enabled", &self.enabled)
            .field("backend", &self.backend)
            .field("rpc_url", &self.rpc_url)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("contract_address", &self.contract_address)
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

/// 組み込みエージェントの設定
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// 外部呼び出しエージェントの失敗確率（0.0〜1.0）
    pub external_failure_rate: f64,
    /// 外部呼び出しエージェントの疑似レイテンシ
    pub external_latency: Duration,
    pub banned_terms: Vec<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            external_failure_rate: DEFAULT_FAILURE_RATE,
            external_latency: Duration::from_millis(DEFAULT_LATENCY_MS),
            banned_terms: DEFAULT_BANNED_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// 実行設定
#[derive(Debug, Clone, Default)]
pub struct ExecutionSettings {
    /// エージェント呼び出し1回あたりの期限（未設定なら無期限）
    pub step_timeout: Option<Duration>,
}

/// ログ設定
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub json: bool,
    /// 日次ローテーションのログファイル出力先
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            json: false,
            directory: None,
        }
    }
}

impl Settings {
    /// TOML ファイルから設定を読み込む
    ///
    /// # 処理フロー
    ///
    /// 1. ファイル読み込み
    /// 2. TOML デシリアライズ → `SettingsDto`
    /// 3. バリデーション & 変換 → [`Settings`]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// TOML 文字列から設定を読み込む
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let dto: SettingsDto = toml::from_str(toml)?;
        Self::try_from(dto)
    }

    /// 設定を TOML 文字列に変換
    ///
    /// クレデンシャルは出力されません。
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let dto = SettingsDto::from(self.clone());
        Ok(toml::to_string(&dto)?)
    }

    /// 環境変数で設定を上書き
    ///
    /// `lookup` は環境変数名から値を引く関数です（テストでは任意のマップを渡せます）。
    ///
    /// - `ENABLE_ONCHAIN`: 文字列 `"false"` のときのみ台帳を無効化
    /// - `RPC_URL` / `PRIVATE_KEY` / `CONTRACT_ADDRESS`: 空でなければ上書き
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(flag) = lookup("ENABLE_ONCHAIN") {
            self.ledger.enabled = flag != "false";
        }
        if let Some(url) = lookup("RPC_URL").filter(|v| !v.is_empty()) {
            self.ledger.rpc_url = Some(url);
        }
        if let Some(key) = lookup("PRIVATE_KEY").filter(|v| !v.is_empty()) {
            self.ledger.credential = Some(key);
        }
        if let Some(address) = lookup("CONTRACT_ADDRESS").filter(|v| !v.is_empty()) {
            self.ledger.contract_address = Some(address);
        }
    }

    /// プロセスの環境変数で上書き
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }
}

/// DTO からドメインモデルへの変換（読み込み方向）
///
/// バリデーションを実施し、不正なデータの場合は [`ConfigError::Validation`] を返します。
impl TryFrom<SettingsDto> for Settings {
    type Error = ConfigError;

    fn try_from(dto: SettingsDto) -> Result<Self, Self::Error> {
        Ok(Self {
            ledger: LedgerSettings::try_from(dto.ledger)?,
            agents: AgentSettings::try_from(dto.agents)?,
            execution: ExecutionSettings::try_from(dto.execution)?,
            logging: LoggingSettings::try_from(dto.logging)?,
        })
    }
}

impl TryFrom<LedgerSettingsDto> for LedgerSettings {
    type Error = ConfigError;

    fn try_from(dto: LedgerSettingsDto) -> Result<Self, Self::Error> {
        let backend = match dto.backend {
            Some(raw) => raw.parse()?,
            None => LedgerBackend::default(),
        };

        Ok(Self {
            enabled: dto.enabled.unwrap_or(true),
            backend,
            rpc_url: dto.rpc_url.filter(|v| !v.is_empty()),
            credential: dto.credential.filter(|v| !v.is_empty()),
            contract_address: dto.contract_address.filter(|v| !v.is_empty()),
            call_timeout: positive_secs("ledger.call_timeout_secs", dto.call_timeout_secs)?,
        })
    }
}

impl TryFrom<AgentSettingsDto> for AgentSettings {
    type Error = ConfigError;

    fn try_from(dto: AgentSettingsDto) -> Result<Self, Self::Error> {
        let defaults = AgentSettings::default();

        let external_failure_rate = dto.external_failure_rate.unwrap_or(defaults.external_failure_rate);
        if !(0.0..=1.0).contains(&external_failure_rate) {
            return Err(ConfigError::Validation(format!(
                "agents.external_failure_rate は 0.0〜1.0 の範囲で指定してください: {}",
                external_failure_rate
            )));
        }

        let banned_terms = match dto.banned_terms {
            Some(terms) => terms
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            None => defaults.banned_terms,
        };

        Ok(Self {
            external_failure_rate,
            external_latency: dto
                .external_latency_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.external_latency),
            banned_terms,
        })
    }
}

impl TryFrom<ExecutionSettingsDto> for ExecutionSettings {
    type Error = ConfigError;

    fn try_from(dto: ExecutionSettingsDto) -> Result<Self, Self::Error> {
        Ok(Self {
            step_timeout: positive_secs("execution.step_timeout_secs", dto.step_timeout_secs)?,
        })
    }
}

impl TryFrom<LoggingSettingsDto> for LoggingSettings {
    type Error = ConfigError;

    fn try_from(dto: LoggingSettingsDto) -> Result<Self, Self::Error> {
        let raw_level = dto.level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        Ok(Self {
            level: parse_level(&raw_level)?,
            json: dto.json.unwrap_or(false),
            directory: dto.directory.map(PathBuf::from),
        })
    }
}

/// ドメインモデルから DTO への変換（書き込み方向）
///
/// バリデーション済みのドメインモデルから DTO を生成するため、
/// この変換は失敗しません（`From` トレイトを使用）。
impl From<Settings> for SettingsDto {
    fn from(settings: Settings) -> Self {
        Self {
            ledger: LedgerSettingsDto {
                enabled: Some(settings.ledger.enabled),
                backend: Some(settings.ledger.backend.as_str().to_string()),
                rpc_url: settings.ledger.rpc_url,
                credential: None,
                contract_address: settings.ledger.contract_address,
                call_timeout_secs: settings.ledger.call_timeout.map(|d| d.as_secs()),
            },
            agents: AgentSettingsDto {
                external_failure_rate: Some(settings.agents.external_failure_rate),
                external_latency_ms: Some(settings.agents.external_latency.as_millis() as u64),
                banned_terms: Some(settings.agents.banned_terms),
            },
            execution: ExecutionSettingsDto {
                step_timeout_secs: settings.execution.step_timeout.map(|d| d.as_secs()),
            },
            logging: LoggingSettingsDto {
                level: Some(settings.logging.level.to_string().to_lowercase()),
                json: Some(settings.logging.json),
                directory: settings
                    .logging
                    .directory
                    .map(|d| d.to_string_lossy().into_owned()),
            },
        }
    }
}

/// ログレベル文字列を解釈
pub fn parse_level(raw: &str) -> Result<LevelFilter, ConfigError> {
    LevelFilter::from_str(raw)
        .map_err(|_| ConfigError::Validation(format!("不正なログレベルです: {}", raw)))
}

fn positive_secs(field: &str, secs: Option<u64>) -> Result<Option<Duration>, ConfigError> {
    match secs {
        Some(0) => Err(ConfigError::Validation(format!(
            "{} は 1 以上で指定してください",
            field
        ))),
        Some(secs) => Ok(Some(Duration::from_secs(secs))),
        None => Ok(None),
    }
}

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}
