//! Workflow 定義と構築を行うモジュール
//!
//! # 責務
//!
//! このモジュールは、自由記述の指示からステップの連鎖（[`Workflow`]）を
//! 決定的に組み立てる機能を提供します。
//!
//! ## 主な機能
//!
//! - **ワークフロー構築**: [`Workflow::build`] で指示から固定5ノードのチェーンを生成
//! - **ステップ参照**: IDによるステップの解決、エントリーステップ・終端ステップの取得
//! - **構造検証**: [`Workflow::validate`] でエッジの参照先が存在することを確認
//!
//! ## チェーンの形
//!
//! ```text
//! step-1 (parse) → step-2 (validate) → step-3 (externalCall) → step-4 (summarize)
//!    │                 │                    │
//!    └─────────────────┴────────────────────┴──→ step-4-fail (summarize failure)
//! ```
//!
//! `step-4` と `step-4-fail` は出口のエッジを持たない終端ノードです。
//!
//! ## 関連モジュール
//!
//! - [`crate::config::step`]: 各ステップの定義
//! - [`crate::engine::executor`]: ワークフローの実行エンジン

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::step::Step;
use crate::agent::{AUDIT_LOGGER, EXTERNAL_SERVICE, INTENT_PARSER, POLICY_CHECK};
use crate::error::ConfigError;

/// 失敗時に共通で遷移する終端ステップのID
pub const FAILURE_TERMINAL_ID: &str = "step-4-fail";

/// ワークフロー（ステップの連鎖）
///
/// 構築後は不変です。`steps` の並びは定義順であり、
/// 実行順は `on_success` / `on_failure` のグラフで決まります。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    id: String,
    instruction: String,
    steps: Vec<Step>,
}

impl Workflow {
    /// 指示からワークフローを構築
    ///
    /// 生成されるIDを除き、同じ指示からは常に同じ構造のチェーンが得られます。
    /// 指示の内容は検証しません（空の指示は受付境界で拒否されます）。
    ///
    /// # 例
    ///
    /// ```rust
    /// use tracebound::config::workflow::Workflow;
    ///
    /// let workflow = Workflow::build("Do X. Do Y.");
    /// assert_eq!(workflow.steps().len(), 5);
    /// assert_eq!(workflow.entry_step().map(|s| s.id()), Some("step-1"));
    /// ```
    pub fn build(instruction: &str) -> Self {
        let steps = vec![
            Step::new(
                "step-1",
                INTENT_PARSER,
                "Interpret user instruction and derive intents",
                json!({ "instruction": instruction }),
            )
            .on_success("step-2")
            .on_failure(FAILURE_TERMINAL_ID),
            Step::new(
                "step-2",
                POLICY_CHECK,
                "Validate intents against guardrails",
                json!({ "derived": "intents" }),
            )
            .on_success("step-3")
            .on_failure(FAILURE_TERMINAL_ID),
            Step::new(
                "step-3",
                EXTERNAL_SERVICE,
                "Execute mocked external API call",
                json!({ "plan": "derived plan" }),
            )
            .on_success("step-4")
            .on_failure(FAILURE_TERMINAL_ID),
            Step::new(
                "step-4",
                AUDIT_LOGGER,
                "Summarize workflow state",
                json!({ "timeline": true }),
            ),
            Step::new(
                FAILURE_TERMINAL_ID,
                AUDIT_LOGGER,
                "Log failure and halt",
                json!({ "failure": true }),
            ),
        ];

        Self::from_steps(generate_id(), instruction, steps)
    }

    /// 任意のステップ列からワークフローを生成
    ///
    /// 構造の検証は行いません。不正なチェーンは実行時にルーティングエラーとして扱われます。
    pub fn from_steps(id: impl Into<String>, instruction: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            id: id.into(),
            instruction: instruction.into(),
            steps,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// エントリーステップ（定義順の先頭）
    pub fn entry_step(&self) -> Option<&Step> {
        self.steps.first()
    }

    /// IDでステップを解決
    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.id() == step_id)
    }

    /// 出口のエッジを持たないステップ
    pub fn terminal_steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|step| step.is_terminal())
    }

    /// チェーンの構造を検証
    ///
    /// - ステップが1つ以上存在すること
    /// - ステップIDが一意であること
    /// - すべてのエッジが既存のステップIDを参照していること
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::Validation(
                "ワークフローにステップがありません".to_string(),
            ));
        }

        let mut ids = HashSet::new();
        for step in &self.steps {
            if !ids.insert(step.id()) {
                return Err(ConfigError::Validation(format!(
                    "ステップID '{}' が重複しています",
                    step.id()
                )));
            }
        }

        for step in &self.steps {
            for target in [step.success_edge(), step.failure_edge()].into_iter().flatten() {
                if !ids.contains(target) {
                    return Err(ConfigError::Validation(format!(
                        "ステップ '{}' が存在しないステップ '{}' を参照しています",
                        step.id(),
                        target
                    )));
                }
            }
        }

        Ok(())
    }

    /// ワークフローをJSON形式でシリアライズ
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn generate_id() -> String {
    format!("wf-{}", chrono::Utc::now().timestamp_millis())
}
