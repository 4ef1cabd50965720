//! 実行コンテキストの管理
//!
//! # 責務
//!
//! - 1回のワークフロー実行の間、すべてのエージェント呼び出しで共有される状態を保持
//! - 先行ステップが生成した中間成果物（インテント、プラン等）のステップ間受け渡し
//! - タイムラインの読み取り専用ビューの提供
//!
//! # 所有権
//!
//! [`RunContext`] はエグゼキューターが1回の実行のために1つだけ生成し、
//! `&mut` で各エージェントに貸し出します。実行間で共有されることはありません。
//! エージェントは成果物を読み書きできますが、タイムラインへの追記は
//! エグゼキューターのみが行います（`record` は crate 内部に限定）。
//!
//! # 使用例
//!
//! ```rust
//! use tracebound::engine::context::{Intent, RunContext};
//!
//! let mut ctx = RunContext::new("Do X. Do Y.");
//! ctx.set_intents(vec![Intent::new(1, "Do X")]);
//!
//! assert_eq!(ctx.instruction(), "Do X. Do Y.");
//! assert_eq!(ctx.intents().len(), 1);
//! assert!(ctx.timeline().is_empty());
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::result::TimelineEntry;

/// 指示から導出されたインテント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub id: String,
    pub summary: String,
}

impl Intent {
    /// `intent-{ordinal}` 形式のIDでインテントを生成
    pub fn new(ordinal: usize, summary: impl Into<String>) -> Self {
        Self {
            id: format!("intent-{}", ordinal),
            summary: summary.into(),
        }
    }
}

/// 導出されたプランの1項目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub order: usize,
    pub action: String,
    /// この項目を実行するエージェントのレジストリ名
    pub owner: String,
}

/// ワークフロー実行コンテキスト
///
/// # フィールド
///
/// - `instruction`: 元の指示
/// - `intents` / `plan`: 先行ステップが導出した型付きの成果物
/// - `timeline`: これまでのタイムライン（実行順）
#[derive(Debug)]
pub struct RunContext {
    instruction: String,
    intents: Vec<Intent>,
    plan: Vec<PlanEntry>,
    timeline: Vec<TimelineEntry>,
}

impl RunContext {
    /// 新しい実行コンテキストを生成
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            intents: Vec::new(),
            plan: Vec::new(),
            timeline: Vec::new(),
        }
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn set_intents(&mut self, intents: Vec<Intent>) {
        self.intents = intents;
    }

    pub fn plan(&self) -> &[PlanEntry] {
        &self.plan
    }

    pub fn set_plan(&mut self, plan: Vec<PlanEntry>) {
        self.plan = plan;
    }

    /// これまでのタイムライン（読み取り専用）
    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    /// 最後に記録されたエントリー
    pub fn last_entry(&self) -> Option<&TimelineEntry> {
        self.timeline.last()
    }

    /// ステップ完了と結果を記録
    ///
    /// タイムラインは追記のみで、記録済みのエントリーは変更されません。
    pub(crate) fn record(&mut self, entry: TimelineEntry) {
        self.timeline.push(entry);
    }

    /// コンテキストを消費してタイムラインを取り出す
    pub(crate) fn into_timeline(self) -> Vec<TimelineEntry> {
        self.timeline
    }
}
