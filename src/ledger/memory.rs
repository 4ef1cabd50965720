//! プロセス内の追記専用台帳
//!
//! オフライン/デモ運用とテストで使用します。
//! トランザクションハッシュは直前のハッシュを含めて連鎖させるため、
//! 記録の順序や内容を後から書き換えると以降のハッシュがすべて変わります。
//!
//! 外部台帳のコントラクトと同様に、未知のワークフローや
//! 最終化済みのワークフローへの記録は拒否します。

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use super::hash::content_hash;
use super::traits::{
    ContentHash, CreatedWorkflow, LedgerClient, StepRecord, TxHash, WorkflowStatusCode,
};
use crate::error::LedgerError;

/// 台帳上のワークフロー
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerWorkflow {
    pub id: u64,
    pub metadata_hash: ContentHash,
    pub status: WorkflowStatusCode,
    pub steps: Vec<StepRecord>,
}

/// 台帳上のトランザクション
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerTransaction {
    pub workflow_id: u64,
    pub kind: &'static str,
    pub hash: TxHash,
}

#[derive(Debug, Default)]
struct LedgerState {
    workflows: Vec<LedgerWorkflow>,
    transactions: Vec<LedgerTransaction>,
}

impl LedgerState {
    fn workflow_mut(&mut self, workflow_id: u64) -> Result<&mut LedgerWorkflow, LedgerError> {
        let workflow = self
            .workflows
            .iter_mut()
            .find(|w| w.id == workflow_id)
            .ok_or_else(|| LedgerError::Rejected(format!("unknown workflow {}", workflow_id)))?;

        if matches!(
            workflow.status,
            WorkflowStatusCode::Completed | WorkflowStatusCode::Failed
        ) {
            return Err(LedgerError::Rejected(format!(
                "workflow {} already finalized",
                workflow_id
            )));
        }
        Ok(workflow)
    }

    fn append(
        &mut self,
        workflow_id: u64,
        kind: &'static str,
        commitment: &ContentHash,
    ) -> Result<TxHash, LedgerError> {
        let previous = self
            .transactions
            .last()
            .map(|tx| tx.hash.as_str().to_string())
            .unwrap_or_default();

        let hash = content_hash(&json!({
            "previous": previous,
            "sequence": self.transactions.len(),
            "workflowId": workflow_id,
            "kind": kind,
            "commitment": commitment,
        }))?;

        let tx_hash = TxHash::from(hash.to_hex());
        self.transactions.push(LedgerTransaction {
            workflow_id,
            kind,
            hash: tx_hash.clone(),
        });
        Ok(tx_hash)
    }
}

/// プロセス内の追記専用台帳
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// ワークフローのスナップショットを取得
    pub fn workflow(&self, workflow_id: u64) -> Option<LedgerWorkflow> {
        self.lock()
            .ok()?
            .workflows
            .iter()
            .find(|w| w.id == workflow_id)
            .cloned()
    }

    /// 全トランザクションのスナップショット（記録順）
    pub fn transactions(&self) -> Vec<LedgerTransaction> {
        self.lock()
            .map(|state| state.transactions.clone())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, LedgerState>, LedgerError> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Rejected("memory ledger poisoned".to_string()))
    }
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    async fn create_workflow(&self, metadata_hash: &ContentHash) -> Result<CreatedWorkflow, LedgerError> {
        let mut state = self.lock()?;
        let id = state.workflows.len() as u64 + 1;
        state.workflows.push(LedgerWorkflow {
            id,
            metadata_hash: *metadata_hash,
            status: WorkflowStatusCode::Created,
            steps: Vec::new(),
        });
        let tx_hash = state.append(id, "create", metadata_hash)?;

        Ok(CreatedWorkflow {
            workflow_id: Some(id),
            tx_hash: Some(tx_hash),
        })
    }

    async fn record_step(&self, workflow_id: u64, record: &StepRecord) -> Result<Option<TxHash>, LedgerError> {
        let mut state = self.lock()?;
        let workflow = state.workflow_mut(workflow_id)?;
        workflow.status = WorkflowStatusCode::Running;
        workflow.steps.push(record.clone());

        let tx_hash = state.append(workflow_id, "step", &record.output_hash)?;
        Ok(Some(tx_hash))
    }

    async fn finalize_workflow(
        &self,
        workflow_id: u64,
        status: WorkflowStatusCode,
    ) -> Result<Option<TxHash>, LedgerError> {
        let mut state = self.lock()?;
        let workflow = state.workflow_mut(workflow_id)?;
        workflow.status = status;
        let commitment = workflow.metadata_hash;

        let tx_hash = state.append(workflow_id, "finalize", &commitment)?;
        Ok(Some(tx_hash))
    }

    fn target(&self) -> Option<&str> {
        Some("memory")
    }
}
