//! ワークフローステップの定義
//!
//! # 責務
//!
//! Workflowを構成するStepの定義体を提供するモジュール
//! アプリケーションに対して、[Step] を提供する。
//!
//! ステップの連鎖はクラス階層ではなく、`on_success` / `on_failure` の
//! エッジを持つ単純なデータとして表現されます。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// ワークフローステップ
///
/// 実行チェーン内の1つのノードを表します。構築後は不変です。
///
/// - `id`: チェーン内で一意なステップID
/// - `agent_name`: エージェントレジストリのキー
/// - `action`: 人間向けの処理内容の説明
/// - `input`: エージェントが消費する内容を記述する不透明なペイロード
/// - `on_success` / `on_failure`: 次のステップID（`None` は終端）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    id: String,
    agent_name: String,
    action: String,
    #[serde(default)]
    input: Value,
    #[serde(default)]
    on_success: Option<String>,
    #[serde(default)]
    on_failure: Option<String>,
}

impl Step {
    /// 新しい終端ステップを生成
    ///
    /// エッジは [`Step::on_success`] / [`Step::on_failure`] で追加します。
    ///
    /// # 例
    ///
    /// ```rust
    /// use tracebound::config::step::Step;
    /// use serde_json::json;
    ///
    /// let step = Step::new("step-1", "IntentParserAgent", "Parse", json!({}))
    ///     .on_success("step-2")
    ///     .on_failure("step-4-fail");
    ///
    /// assert_eq!(step.next_step_id(true), Some("step-2"));
    /// assert_eq!(step.next_step_id(false), Some("step-4-fail"));
    /// ```
    pub fn new(
        id: impl Into<String>,
        agent_name: impl Into<String>,
        action: impl Into<String>,
        input: Value,
    ) -> Self {
        Self {
            id: id.into(),
            agent_name: agent_name.into(),
            action: action.into(),
            input,
            on_success: None,
            on_failure: None,
        }
    }

    /// 成功時の遷移先を設定
    pub fn on_success(mut self, step_id: impl Into<String>) -> Self {
        self.on_success = Some(step_id.into());
        self
    }

    /// 失敗時の遷移先を設定
    pub fn on_failure(mut self, step_id: impl Into<String>) -> Self {
        self.on_failure = Some(step_id.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn input(&self) -> &Value {
        &self.input
    }

    pub fn success_edge(&self) -> Option<&str> {
        self.on_success.as_deref()
    }

    pub fn failure_edge(&self) -> Option<&str> {
        self.on_failure.as_deref()
    }

    /// 出口のエッジを持たないかどうか
    pub fn is_terminal(&self) -> bool {
        self.on_success.is_none() && self.on_failure.is_none()
    }

    /// ステップの結果から次のステップIDを決定
    ///
    /// 成功時は `on_success` のみ、失敗時は `on_failure` のみを参照します。
    /// `None` はチェーンの終端に到達したことを意味します。
    pub fn next_step_id(&self, succeeded: bool) -> Option<&str> {
        if succeeded {
            self.success_edge()
        } else {
            self.failure_edge()
        }
    }
}
