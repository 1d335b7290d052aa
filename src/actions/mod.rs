//! Action handlers and the dispatch path
//!
//! Handlers are registered once at startup into an explicit registry;
//! the dispatcher resolves each action of a firing service by its
//! `type` string and isolates per-action failures so one bad action
//! never blocks its siblings or the rest of the cycle.

pub mod list_files;
pub mod mkdir;
pub mod notify;
pub mod run_command;

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;

use crate::context::ContextSnapshot;
use crate::service::{ActionSpec, ServiceDefinition};

/// A single capability: execute one typed action against the current
/// context. Handlers report success or failure; the dispatcher consumes
/// nothing else.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Registry key for this handler
    fn name(&self) -> &str;

    async fn run(&self, spec: &ActionSpec, ctx: &ContextSnapshot) -> Result<()>;
}

/// Mapping from action-type string to handler.
///
/// New action types are added with a registration call; the dispatcher
/// never changes.
pub struct ActionRegistry {
    handlers: RwLock<HashMap<String, Arc<dyn ActionHandler>>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Registry pre-populated with the built-in handlers
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(Arc::new(notify::Notify));
        registry.register(Arc::new(list_files::ListFiles));
        registry.register(Arc::new(mkdir::Mkdir));
        registry.register(Arc::new(run_command::RunCommand));
        registry
    }

    pub fn register(&self, handler: Arc<dyn ActionHandler>) {
        let name = handler.name().to_string();
        self.handlers.write().unwrap().insert(name.clone(), handler);
        log::info!("Registered action handler: {}", name);
    }

    pub fn get(&self, action_type: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.read().unwrap().get(action_type).cloned()
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

lazy_static! {
    /// Global registry used by the daemon; built once at startup
    pub static ref ACTION_REGISTRY: Arc<ActionRegistry> = Arc::new(ActionRegistry::with_defaults());
}

pub fn default_registry() -> Arc<ActionRegistry> {
    ACTION_REGISTRY.clone()
}

/// Per-service dispatch outcome, for diagnostics and tests
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct DispatchSummary {
    pub dispatched: usize,
    pub failed: usize,
    pub unresolved: usize,
}

impl DispatchSummary {
    pub fn attempted(&self) -> usize {
        self.dispatched + self.failed + self.unresolved
    }

    pub fn absorb(&mut self, other: DispatchSummary) {
        self.dispatched += other.dispatched;
        self.failed += other.failed;
        self.unresolved += other.unresolved;
    }
}

/// Run every action of a firing service, strictly in declared order.
///
/// Resolution failures and handler errors are logged with the action
/// type and service name, then skipped. This is the failure-isolation
/// boundary of the runtime.
pub async fn dispatch_service(
    registry: &ActionRegistry,
    service: &ServiceDefinition,
    ctx: &ContextSnapshot,
) -> DispatchSummary {
    let mut summary = DispatchSummary::default();

    for (idx, spec) in service.actions.iter().enumerate() {
        if spec.action_type.is_empty() {
            log::error!(
                "Service '{}': action #{} has no type. Skipping action.",
                service.name,
                idx
            );
            summary.unresolved += 1;
            continue;
        }

        let handler = match registry.get(&spec.action_type) {
            Some(handler) => handler,
            None => {
                log::error!(
                    "Service '{}': unknown action type '{}'. Skipping action.",
                    service.name,
                    spec.action_type
                );
                summary.unresolved += 1;
                continue;
            }
        };

        match handler.run(spec, ctx).await {
            Ok(()) => {
                log::info!(
                    "Service '{}': executed action '{}'",
                    service.name,
                    spec.action_type
                );
                summary.dispatched += 1;
            }
            Err(e) => {
                log::error!(
                    "Service '{}': action '{}' failed: {:#}",
                    service.name,
                    spec.action_type,
                    e
                );
                summary.failed += 1;
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Failing;

    #[async_trait]
    impl ActionHandler for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn run(&self, _spec: &ActionSpec, _ctx: &ContextSnapshot) -> Result<()> {
            bail!("intentional failure")
        }
    }

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl ActionHandler for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        async fn run(&self, _spec: &ActionSpec, _ctx: &ContextSnapshot) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn ctx() -> ContextSnapshot {
        ContextSnapshot::from_parts(Utc::now(), HashMap::new())
    }

    fn service(actions: serde_json::Value) -> ServiceDefinition {
        ServiceDefinition::from_value(json!({"name": "test", "actions": actions})).unwrap()
    }

    #[test]
    fn test_default_registry_has_builtin_handlers() {
        let registry = ActionRegistry::with_defaults();
        for name in ["notify", "list_files", "mkdir", "run_command"] {
            assert!(registry.get(name).is_some(), "missing handler {}", name);
        }
        assert!(registry.get("lock_screen").is_none());
    }

    #[tokio::test]
    async fn test_unknown_type_does_not_block_siblings() {
        let registry = ActionRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        registry.register(Arc::new(Counting(count.clone())));

        let service = service(json!([
            {"type": "no_such_action"},
            {"type": "counting"}
        ]));

        let summary = dispatch_service(&registry, &service, &ctx()).await;
        assert_eq!(summary.unresolved, 1);
        assert_eq!(summary.dispatched, 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handler_failure_does_not_block_siblings() {
        let registry = ActionRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        registry.register(Arc::new(Failing));
        registry.register(Arc::new(Counting(count.clone())));

        let service = service(json!([
            {"type": "failing"},
            {"type": "counting"},
            {"type": "failing"}
        ]));

        let summary = dispatch_service(&registry, &service, &ctx()).await;
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.dispatched, 1);
        assert_eq!(summary.attempted(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_actions_run_in_declared_order() {
        struct Recording(Arc<std::sync::Mutex<Vec<String>>>, &'static str);

        #[async_trait]
        impl ActionHandler for Recording {
            fn name(&self) -> &str {
                self.1
            }

            async fn run(&self, _spec: &ActionSpec, _ctx: &ContextSnapshot) -> Result<()> {
                self.0.lock().unwrap().push(self.1.to_string());
                Ok(())
            }
        }

        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let registry = ActionRegistry::new();
        registry.register(Arc::new(Recording(order.clone(), "first")));
        registry.register(Arc::new(Recording(order.clone(), "second")));

        let service = service(json!([{"type": "second"}, {"type": "first"}, {"type": "second"}]));
        dispatch_service(&registry, &service, &ctx()).await;

        assert_eq!(*order.lock().unwrap(), vec!["second", "first", "second"]);
    }
}
