//! JSON-RPC 台帳クライアント
//!
//! # 責務
//!
//! - 外部台帳サービスとの JSON-RPC 2.0 over HTTP 通信を担当
//! - [`LedgerClient`] トレイトを実装し、統一インターフェースを提供
//! - JSON-RPC のエラーオブジェクトや HTTP エラーを [`LedgerError`] に変換
//!
//! # メソッド
//!
//! | メソッド | パラメータ | 結果 |
//! |---|---|---|
//! | `ledger_createWorkflow` | `contract`, `metadataHash` | `workflowId`, `txHash` |
//! | `ledger_recordStep` | `contract`, `workflowId`, `stepId`, `agentName`, `status`, `outputHash` | `txHash` |
//! | `ledger_finalizeWorkflow` | `contract`, `workflowId`, `status` | `txHash` |
//!
//! 署名用クレデンシャルは `Authorization: Bearer` ヘッダーで送られます。
//! 各呼び出しはトランザクションの確定後に応答が返ることを前提とします。

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::traits::{
    ContentHash, CreatedWorkflow, LedgerClient, StepRecord, TxHash, WorkflowStatusCode,
};
use crate::error::LedgerError;

const METHOD_CREATE: &str = "ledger_createWorkflow";
const METHOD_RECORD_STEP: &str = "ledger_recordStep";
const METHOD_FINALIZE: &str = "ledger_finalizeWorkflow";

/// JSON-RPC 2.0 リクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: &str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC 2.0 レスポンス
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 エラーオブジェクト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// 結果を取り出して型に変換
    ///
    /// # エラー
    ///
    /// - [`LedgerError::Rpc`] - エラーオブジェクトが含まれている
    /// - [`LedgerError::InvalidResponse`] - 結果がない、または型が合わない
    pub fn into_result<T: DeserializeOwned>(self) -> Result<T, LedgerError> {
        if let Some(error) = self.error {
            return Err(LedgerError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        let result = self
            .result
            .ok_or_else(|| LedgerError::InvalidResponse("result がありません".to_string()))?;
        serde_json::from_value(result)
            .map_err(|e| LedgerError::InvalidResponse(format!("result の形式が不正です: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateWorkflowResult {
    #[serde(default)]
    workflow_id: Option<u64>,
    #[serde(default)]
    tx_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxResult {
    #[serde(default)]
    tx_hash: Option<String>,
}

/// JSON-RPC 台帳クライアント
pub struct RpcLedgerClient {
    http: reqwest::Client,
    endpoint: String,
    credential: String,
    contract_address: String,
    next_id: AtomicU64,
}

impl RpcLedgerClient {
    /// 新しいクライアントを生成
    ///
    /// # エラー
    ///
    /// - [`LedgerError::Transport`] - HTTP クライアントの初期化に失敗
    pub fn new(
        endpoint: impl Into<String>,
        credential: impl Into<String>,
        contract_address: impl Into<String>,
    ) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
            credential: credential.into(),
            contract_address: contract_address.into(),
            next_id: AtomicU64::new(1),
        })
    }

    /// リクエストを組み立てる
    pub fn request(&self, method: &str, params: Value) -> JsonRpcRequest {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        JsonRpcRequest::new(id, method, params)
    }

    fn create_params(&self, metadata_hash: &ContentHash) -> Value {
        json!({
            "contract": self.contract_address,
            "metadataHash": metadata_hash,
        })
    }

    fn record_step_params(&self, workflow_id: u64, record: &StepRecord) -> Value {
        let status = record.status as u8;
        json!({
            "contract": self.contract_address,
            "workflowId": workflow_id,
            "stepId": record.step_id,
            "agentName": record.agent_name,
            "status": status,
            "outputHash": record.output_hash,
        })
    }

    fn finalize_params(&self, workflow_id: u64, status: WorkflowStatusCode) -> Value {
        let code = status as u8;
        json!({
            "contract": self.contract_address,
            "workflowId": workflow_id,
            "status": code,
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        let request = self.request(method, params);
        tracing::trace!(method, id = request.id, "ledger rpc request");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.credential)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body: JsonRpcResponse = response.json().await?;
        body.into_result()
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn create_workflow(&self, metadata_hash: &ContentHash) -> Result<CreatedWorkflow, LedgerError> {
        let result: CreateWorkflowResult = self
            .call(METHOD_CREATE, self.create_params(metadata_hash))
            .await?;
        Ok(CreatedWorkflow {
            workflow_id: result.workflow_id,
            tx_hash: result.tx_hash.map(TxHash::from),
        })
    }

    async fn record_step(&self, workflow_id: u64, record: &StepRecord) -> Result<Option<TxHash>, LedgerError> {
        let result: TxResult = self
            .call(METHOD_RECORD_STEP, self.record_step_params(workflow_id, record))
            .await?;
        Ok(result.tx_hash.map(TxHash::from))
    }

    async fn finalize_workflow(
        &self,
        workflow_id: u64,
        status: WorkflowStatusCode,
    ) -> Result<Option<TxHash>, LedgerError> {
        let result: TxResult = self
            .call(METHOD_FINALIZE, self.finalize_params(workflow_id, status))
            .await?;
        Ok(result.tx_hash.map(TxHash::from))
    }

    fn target(&self) -> Option<&str> {
        Some(&self.contract_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::hash::content_hash;
    use crate::ledger::traits::StepStatusCode;

    fn client() -> RpcLedgerClient {
        RpcLedgerClient::new("http://127.0.0.1:8545", "token", "0xcontract").unwrap()
    }

    #[test]
    fn test_request_ids_increase() {
        let client = client();
        let a = client.request(METHOD_CREATE, json!({}));
        let b = client.request(METHOD_CREATE, json!({}));
        assert_eq!(a.jsonrpc, "2.0");
        assert!(b.id > a.id);
    }

    #[test]
    fn test_record_step_params() {
        let client = client();
        let record = StepRecord {
            step_id: "step-2".to_string(),
            agent_name: "PolicyCheckAgent".to_string(),
            status: StepStatusCode::Failure,
            output_hash: content_hash(&json!({ "status": "blocked" })).unwrap(),
        };
        let params = client.record_step_params(9, &record);

        assert_eq!(params["contract"], "0xcontract");
        assert_eq!(params["workflowId"], 9);
        assert_eq!(params["stepId"], "step-2");
        assert_eq!(params["status"], 1);
        assert_eq!(params["outputHash"], record.output_hash.to_hex());
    }

    #[test]
    fn test_finalize_params() {
        let params = client().finalize_params(3, WorkflowStatusCode::Completed);
        assert_eq!(params["status"], 2);
        assert_eq!(params["workflowId"], 3);
    }

    #[test]
    fn test_into_result_success() {
        let response: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "workflowId": 12, "txHash": "0xabc" }
        }))
        .unwrap();
        let result: CreateWorkflowResult = response.into_result().unwrap();
        assert_eq!(result.workflow_id, Some(12));
        assert_eq!(result.tx_hash.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_into_result_missing_workflow_id() {
        let response: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "txHash": "0xabc" }
        }))
        .unwrap();
        let result: CreateWorkflowResult = response.into_result().unwrap();
        assert!(result.workflow_id.is_none());
    }

    #[test]
    fn test_into_result_rpc_error() {
        let response: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "execution reverted" }
        }))
        .unwrap();
        let err = response.into_result::<TxResult>().unwrap_err();
        match err {
            LedgerError::Rpc { code, message } => {
                assert_eq!(code, -32000);
                assert_eq!(message, "execution reverted");
            }
            other => panic!("Expected Rpc error, got {:?}", other),
        }
    }

    #[test]
    fn test_into_result_without_result() {
        let response: JsonRpcResponse =
            serde_json::from_value(json!({ "jsonrpc": "2.0", "id": 1 })).unwrap();
        assert!(matches!(
            response.into_result::<TxResult>(),
            Err(LedgerError::InvalidResponse(_))
        ));
    }

    mod http {
        use super::*;
        use wiremock::matchers::{body_partial_json, header, method};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn step_record() -> StepRecord {
            StepRecord {
                step_id: "step-1".to_string(),
                agent_name: "IntentParserAgent".to_string(),
                status: StepStatusCode::Success,
                output_hash: content_hash(&json!({ "intents": [] })).unwrap(),
            }
        }

        fn client_for(server: &MockServer) -> RpcLedgerClient {
            RpcLedgerClient::new(server.uri(), "secret-token", "0xcontract").unwrap()
        }

        #[tokio::test]
        async fn test_record_step_over_http() {
            let server = MockServer::start().await;
            let record = step_record();
            Mock::given(method("POST"))
                .and(header("authorization", "Bearer secret-token"))
                .and(body_partial_json(json!({
                    "jsonrpc": "2.0",
                    "method": "ledger_recordStep",
                    "params": {
                        "contract": "0xcontract",
                        "workflowId": 7,
                        "stepId": "step-1",
                        "agentName": "IntentParserAgent",
                        "status": 0,
                        "outputHash": record.output_hash.to_hex(),
                    }
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": { "txHash": "0xfeed" }
                })))
                .expect(1)
                .mount(&server)
                .await;

            let tx_hash = client_for(&server).record_step(7, &record).await.unwrap();
            assert_eq!(tx_hash, Some(TxHash::from("0xfeed")));
        }

        #[tokio::test]
        async fn test_create_workflow_over_http() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(body_partial_json(json!({ "method": "ledger_createWorkflow" })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": { "workflowId": 12, "txHash": "0xabc" }
                })))
                .mount(&server)
                .await;

            let hash = content_hash(&json!({ "instruction": "Do X." })).unwrap();
            let created = client_for(&server).create_workflow(&hash).await.unwrap();
            assert_eq!(created.workflow_id, Some(12));
            assert_eq!(created.tx_hash, Some(TxHash::from("0xabc")));
        }

        #[tokio::test]
        async fn test_server_error_status() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(500).set_body_string("relayer down"))
                .mount(&server)
                .await;

            let err = client_for(&server)
                .finalize_workflow(3, WorkflowStatusCode::Failed)
                .await
                .unwrap_err();
            match err {
                LedgerError::HttpStatus { status, body } => {
                    assert_eq!(status, 500);
                    assert_eq!(body, "relayer down");
                }
                other => panic!("Expected HttpStatus error, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_rpc_error_over_http() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "error": { "code": -32000, "message": "execution reverted" }
                })))
                .mount(&server)
                .await;

            let err = client_for(&server)
                .record_step(7, &step_record())
                .await
                .unwrap_err();
            assert!(matches!(err, LedgerError::Rpc { code: -32000, .. }));
        }
    }

    /// 接続できないエンドポイントは Transport エラーになる
    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client = RpcLedgerClient::new("http://127.0.0.1:9", "token", "0xcontract").unwrap();
        let hash = content_hash(&json!({})).unwrap();
        let err = client.create_workflow(&hash).await.unwrap_err();
        assert!(matches!(err, LedgerError::Transport(_)));
    }
}
