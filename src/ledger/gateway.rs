//! 台帳ゲートウェイ
//!
//! # 責務
//!
//! - 外部台帳への3つの操作（作成・ステップ記録・最終化）をエグゼキューターに提供
//! - ペイロードを内容ハッシュに変換してから送信
//! - 未設定時はすべての操作を [`LedgerCall::Skipped`] として扱う
//! - 台帳呼び出しごとの期限（任意）の適用
//!
//! 「未設定」はデモ/オフライン運用での通常状態であり、エラーではありません。
//! 一方、呼び出し開始後の失敗は [`LedgerError`] として呼び出し元に伝播します。

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use super::hash::content_hash;
use super::memory::MemoryLedger;
use super::rpc::RpcLedgerClient;
use super::traits::{LedgerClient, StepRecord, TxHash, WorkflowStatusCode};
use crate::config::settings::{LedgerBackend, LedgerSettings};
use crate::engine::result::StepStatus;
use crate::error::LedgerError;

/// ゲートウェイ操作の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall<T> {
    /// 台帳に記録された
    Completed(T),
    /// ゲートウェイが無効なため何もしなかった
    Skipped,
}

impl<T> LedgerCall<T> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, LedgerCall::Skipped)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            LedgerCall::Completed(value) => Some(value),
            LedgerCall::Skipped => None,
        }
    }
}

/// ワークフロー作成のレシート
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowReceipt {
    pub workflow_id: Option<u64>,
    pub tx_hash: Option<TxHash>,
}

/// ステップ記録・最終化のレシート
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: Option<TxHash>,
}

/// 台帳ゲートウェイ
///
/// クライアントを持たないゲートウェイは無効状態です。
pub struct LedgerGateway {
    client: Option<Arc<dyn LedgerClient>>,
    call_timeout: Option<Duration>,
}

impl LedgerGateway {
    /// 有効なゲートウェイを生成
    pub fn new(client: Arc<dyn LedgerClient>) -> Self {
        Self {
            client: Some(client),
            call_timeout: None,
        }
    }

    /// 無効なゲートウェイを生成
    pub fn disabled() -> Self {
        Self {
            client: None,
            call_timeout: None,
        }
    }

    /// 台帳呼び出しごとの期限を設定
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// 設定からゲートウェイを生成
    ///
    /// 明示的な無効化、または必須値の欠落時は無効なゲートウェイを返します。
    ///
    /// # エラー
    ///
    /// - [`LedgerError::Transport`] - HTTP クライアントの初期化に失敗
    pub fn from_settings(settings: &LedgerSettings) -> Result<Self, LedgerError> {
        if !settings.is_configured() {
            tracing::info!(
                enabled = settings.enabled,
                backend = settings.backend.as_str(),
                "ledger gateway disabled"
            );
            return Ok(Self::disabled());
        }

        let client: Arc<dyn LedgerClient> = match settings.backend {
            LedgerBackend::Memory => Arc::new(MemoryLedger::new()),
            LedgerBackend::Rpc => {
                let (Some(url), Some(credential), Some(contract)) = (
                    settings.rpc_url.as_deref(),
                    settings.credential.as_deref(),
                    settings.contract_address.as_deref(),
                ) else {
                    return Ok(Self::disabled());
                };
                Arc::new(RpcLedgerClient::new(url, credential, contract)?)
            }
        };

        tracing::info!(backend = settings.backend.as_str(), "ledger gateway enabled");
        let gateway = Self::new(client);
        Ok(match settings.call_timeout {
            Some(timeout) => gateway.with_call_timeout(timeout),
            None => gateway,
        })
    }

    /// ゲートウェイが有効かどうか
    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// 記録先（コントラクトアドレス等）
    pub fn target(&self) -> Option<&str> {
        self.client.as_ref().and_then(|c| c.target())
    }

    /// ワークフローを作成
    ///
    /// 台帳には `{instruction}` の内容ハッシュのみが送られます。
    pub async fn create_workflow(&self, instruction: &str) -> Result<LedgerCall<WorkflowReceipt>, LedgerError> {
        let Some(client) = &self.client else {
            return Ok(LedgerCall::Skipped);
        };

        let metadata_hash = content_hash(&json!({ "instruction": instruction }))?;
        let created = self
            .with_deadline("createWorkflow", client.create_workflow(&metadata_hash))
            .await?;

        tracing::debug!(
            workflow_id = ?created.workflow_id,
            tx_hash = ?created.tx_hash,
            "ledger workflow created"
        );
        Ok(LedgerCall::Completed(WorkflowReceipt {
            workflow_id: created.workflow_id,
            tx_hash: created.tx_hash,
        }))
    }

    /// ステップの結果を記録
    pub async fn log_step(
        &self,
        workflow_id: u64,
        step_id: &str,
        agent_name: &str,
        status: StepStatus,
        payload: &Value,
    ) -> Result<LedgerCall<TxReceipt>, LedgerError> {
        let Some(client) = &self.client else {
            return Ok(LedgerCall::Skipped);
        };

        let record = StepRecord {
            step_id: step_id.to_string(),
            agent_name: agent_name.to_string(),
            status: status.into(),
            output_hash: content_hash(payload)?,
        };
        let tx_hash = self
            .with_deadline("logStep", client.record_step(workflow_id, &record))
            .await?;

        tracing::debug!(workflow_id, step_id, tx_hash = ?tx_hash, "ledger step recorded");
        Ok(LedgerCall::Completed(TxReceipt { tx_hash }))
    }

    /// ワークフローを最終化
    pub async fn finalize_workflow(
        &self,
        workflow_id: u64,
        success: bool,
    ) -> Result<LedgerCall<TxReceipt>, LedgerError> {
        let Some(client) = &self.client else {
            return Ok(LedgerCall::Skipped);
        };

        let status = WorkflowStatusCode::finalized(success);
        let tx_hash = self
            .with_deadline("finalizeWorkflow", client.finalize_workflow(workflow_id, status))
            .await?;

        tracing::debug!(workflow_id, success, tx_hash = ?tx_hash, "ledger workflow finalized");
        Ok(LedgerCall::Completed(TxReceipt { tx_hash }))
    }

    /// 期限付きで台帳呼び出しを待機
    async fn with_deadline<T, F>(&self, operation: &'static str, call: F) -> Result<T, LedgerError>
    where
        F: Future<Output = Result<T, LedgerError>>,
    {
        match self.call_timeout {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .map_err(|_| LedgerError::Timeout {
                    operation,
                    timeout_secs: timeout.as_secs(),
                })?,
            None => call.await,
        }
    }
}

impl fmt::Debug for LedgerGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerGateway")
            .field("enabled", &self.is_enabled())
            .field("target", &self.target())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
