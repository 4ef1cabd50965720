//! エージェントレジストリ
//!
//! エージェント名から [`AgentCapability`] を引くための対応表です。
//! 実装の差し替えはレジストリへの登録だけで完結し、エグゼキューターには影響しません。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::traits::AgentCapability;

/// エージェント名 → エージェントの対応表
#[derive(Clone, Default)]
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn AgentCapability>>,
}

impl AgentRegistry {
    /// 空のレジストリを生成
    pub fn new() -> Self {
        Self::default()
    }

    /// エージェントを登録（同じ名前は上書き）
    pub fn register(&mut self, name: impl Into<String>, agent: Arc<dyn AgentCapability>) {
        self.agents.insert(name.into(), agent);
    }

    /// ビルダー形式でエージェントを登録
    pub fn with(mut self, name: impl Into<String>, agent: Arc<dyn AgentCapability>) -> Self {
        self.register(name, agent);
        self
    }

    /// 名前からエージェントを解決
    pub fn get(&self, name: &str) -> Option<Arc<dyn AgentCapability>> {
        self.agents.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// 登録済みの名前（昇順）
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.agents.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentOutcome;
    use crate::config::step::Step;
    use crate::engine::context::RunContext;
    use async_trait::async_trait;
    use serde_json::Value;

    struct NoopAgent;

    #[async_trait]
    impl AgentCapability for NoopAgent {
        async fn run(&self, _step: &Step, _context: &mut RunContext) -> AgentOutcome {
            AgentOutcome::success(Value::Null)
        }
    }

    #[test]
    fn test_register_and_get() {
        let registry = AgentRegistry::new().with("NoopAgent", Arc::new(NoopAgent));

        assert!(registry.contains("NoopAgent"));
        assert!(registry.get("NoopAgent").is_some());
        assert!(registry.get("GhostAgent").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_names_are_sorted() {
        let registry = AgentRegistry::new()
            .with("b", Arc::new(NoopAgent))
            .with("a", Arc::new(NoopAgent));
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(format!("{:?}", registry), "AgentRegistry { agents: [\"a\", \"b\"] }");
    }

    #[test]
    fn test_register_overwrites() {
        let mut registry = AgentRegistry::new();
        registry.register("a", Arc::new(NoopAgent));
        registry.register("a", Arc::new(NoopAgent));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_registry() {
        assert!(AgentRegistry::new().is_empty());
    }
}
