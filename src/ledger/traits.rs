//! 外部台帳の共通インターフェース定義
//!
//! # 責務
//!
//! - 追記専用の外部台帳クライアントの共通トレイト [`LedgerClient`] を定義
//! - 台帳に送る値の型（[`ContentHash`], [`TxHash`], ステータスコード）を提供
//!
//! 台帳に送られるのはペイロードそのものではなく、その内容ハッシュ（コミットメント）です。

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::engine::result::StepStatus;
use crate::error::LedgerError;

/// 256ビットの内容ハッシュ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// `0x` 付きの16進文字列
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// 台帳トランザクションの識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TxHash {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TxHash {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 台帳上のステップステータスコード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StepStatusCode {
    Success = 0,
    Failure = 1,
}

impl From<StepStatus> for StepStatusCode {
    fn from(status: StepStatus) -> Self {
        match status {
            StepStatus::Success => StepStatusCode::Success,
            StepStatus::Failure => StepStatusCode::Failure,
        }
    }
}

/// 台帳上のワークフローステータスコード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkflowStatusCode {
    Created = 0,
    Running = 1,
    Completed = 2,
    Failed = 3,
}

impl WorkflowStatusCode {
    /// 最終化時のステータス
    pub fn finalized(success: bool) -> Self {
        if success {
            WorkflowStatusCode::Completed
        } else {
            WorkflowStatusCode::Failed
        }
    }
}

/// ワークフロー作成の結果
///
/// 台帳が作成イベントを返さなかった場合、`workflow_id` は `None` になります。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedWorkflow {
    pub workflow_id: Option<u64>,
    pub tx_hash: Option<TxHash>,
}

/// 台帳に記録するステップ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub step_id: String,
    pub agent_name: String,
    pub status: StepStatusCode,
    pub output_hash: ContentHash,
}

/// 外部台帳の共通インターフェース
///
/// このトレイトを実装することで、任意の追記専用台帳を
/// [`LedgerGateway`](super::gateway::LedgerGateway) に接続できます。
///
/// # 実装要件
///
/// - `Send + Sync`: 並行する複数の実行から共有される
/// - 各呼び出しはトランザクションの確定まで待機してから戻る
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// メタデータのハッシュを記録してワークフローを作成
    async fn create_workflow(&self, metadata_hash: &ContentHash) -> Result<CreatedWorkflow, LedgerError>;

    /// ステップの結果を記録
    async fn record_step(&self, workflow_id: u64, record: &StepRecord) -> Result<Option<TxHash>, LedgerError>;

    /// ワークフローを最終化
    async fn finalize_workflow(
        &self,
        workflow_id: u64,
        status: WorkflowStatusCode,
    ) -> Result<Option<TxHash>, LedgerError>;

    /// 記録先（コントラクトアドレス等）の表示用識別子
    fn target(&self) -> Option<&str> {
        None
    }
}
