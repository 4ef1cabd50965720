//! エラー型の定義
//!
//! このモジュールは、Tracebound 全体で使用されるエラー型を定義します。
//!
//! エージェントが報告する失敗とルーティングエラーはここには含まれません。
//! それらはタイムラインのデータとして記録されます（[`crate::engine::result`] を参照）。

use thiserror::Error;

use crate::engine::result::ExecutionError;

/// 設定関連のエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// ファイルの読み込みに失敗
    #[error("設定ファイルの読み込みに失敗しました: {0}")]
    FileRead(#[from] std::io::Error),

    /// TOML のデシリアライズに失敗
    #[error("TOML のデシリアライズに失敗しました: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    /// TOML のシリアライズに失敗
    #[error("TOML のシリアライズに失敗しました: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// バリデーションエラー
    #[error("設定のバリデーションに失敗しました: {0}")]
    Validation(String),

    /// ロガーの初期化に失敗（既に初期化済みなど）
    #[error("ロガーの初期化に失敗しました: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),
}

/// 台帳（Ledger）呼び出しのエラー
///
/// 台帳呼び出しが開始された後に発生したエラーは、実行全体にとって致命的です。
/// 台帳が無効化されている状態はエラーではなく、
/// [`LedgerCall::Skipped`](crate::ledger::LedgerCall::Skipped) で表現されます。
#[derive(Debug, Error)]
pub enum LedgerError {
    /// HTTP 通信エラー
    #[error("台帳への通信に失敗しました: {0}")]
    Transport(#[from] reqwest::Error),

    /// 2xx 以外の HTTP ステータス
    #[error("台帳が HTTP {status} を返しました: {body}")]
    HttpStatus {
        /// HTTP ステータスコード
        status: u16,
        /// レスポンス本文
        body: String,
    },

    /// JSON-RPC のエラーオブジェクト
    #[error("台帳 RPC エラー (code {code}): {message}")]
    Rpc {
        /// JSON-RPC エラーコード
        code: i64,
        /// エラーメッセージ
        message: String,
    },

    /// 不正なレスポンス
    #[error("台帳のレスポンスが不正です: {0}")]
    InvalidResponse(String),

    /// ペイロードのシリアライズに失敗
    #[error("ペイロードのシリアライズに失敗しました: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 台帳がトランザクションを拒否（コントラクトの revert に相当）
    #[error("台帳がトランザクションを拒否しました: {0}")]
    Rejected(String),

    /// 台帳呼び出しのタイムアウト
    #[error("タイムアウト: 台帳操作 '{operation}' が {timeout_secs}秒以内に完了しませんでした")]
    Timeout {
        /// タイムアウトした操作名
        operation: &'static str,
        /// タイムアウト時間（秒）
        timeout_secs: u64,
    },
}

/// 受付境界（parse / execute）のエラー
#[derive(Debug, Error)]
pub enum ServiceError {
    /// 空または空白のみの指示（クライアントエラー）
    #[error("instruction required")]
    EmptyInstruction,

    /// 実行エラー
    #[error("execution failed: {0}")]
    Execution(#[from] ExecutionError),

    /// 設定エラー
    #[error("設定エラー: {0}")]
    Config(#[from] ConfigError),

    /// 台帳の初期化エラー
    #[error("台帳エラー: {0}")]
    Ledger(#[from] LedgerError),

    /// 結果の JSON 出力に失敗
    #[error("JSON の出力に失敗しました: {0}")]
    Output(#[from] serde_json::Error),
}

impl ServiceError {
    /// クライアント側の入力に起因するエラーかどうか
    pub fn is_client_error(&self) -> bool {
        matches!(self, ServiceError::EmptyInstruction)
    }
}
