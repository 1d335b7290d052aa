//! The semantic runtime loop
//!
//! Discovery -> validation -> evaluation -> dispatch, every scan
//! interval, forever. Every failure below configuration level is
//! contained at the granularity it occurred: a bad file, service, or
//! action is logged and skipped, never allowed to abort the cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Notify;
use tokio::time::sleep;

use crate::actions::{dispatch_service, ActionRegistry, DispatchSummary};
use crate::condition;
use crate::config::RuntimeConfig;
use crate::context::{ActivityProbe, ActivityTracker, BatteryProbe, ContextProbe, ContextSnapshot};
use crate::schema::SchemaStore;
use crate::service::{self, ServiceDefinition};

/// Cooperative stop flag, honored at the top of each cycle.
///
/// There is no mid-dispatch cancellation: a service's actions, once
/// started, all attempt to run.
pub struct Shutdown {
    requested: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            requested: AtomicBool::new(false),
            notify: Notify::new(),
        })
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}

/// Per-cycle diagnostics
#[derive(Debug, Default, Clone, Copy)]
pub struct CycleStats {
    pub discovered: usize,
    pub unreadable: usize,
    pub malformed: usize,
    pub invalid: usize,
    pub fired: usize,
    pub dispatch: DispatchSummary,
}

/// The runtime: one logical worker driving the scan cycle
pub struct SemanticRuntime {
    config: RuntimeConfig,
    schema: SchemaStore,
    registry: Arc<ActionRegistry>,
    tracker: Arc<ActivityTracker>,
    probes: Vec<Box<dyn ContextProbe>>,
}

impl SemanticRuntime {
    /// Build a runtime from configuration. Loads the schema document
    /// exactly once; a load failure leaves validation disabled (and
    /// therefore failing closed) until the process restarts.
    pub fn new(config: RuntimeConfig) -> Self {
        let schema = SchemaStore::load(&config.schema_path);
        let tracker = Arc::new(ActivityTracker::new());
        // Startup counts as activity, so idle conditions measure from here
        tracker.record();

        let probes: Vec<Box<dyn ContextProbe>> = vec![
            Box::new(BatteryProbe::default()),
            Box::new(ActivityProbe::new(tracker.clone())),
        ];

        Self {
            config,
            schema,
            registry: crate::actions::default_registry(),
            tracker,
            probes,
        }
    }

    /// Swap the action registry (tests, embedders)
    pub fn with_registry(mut self, registry: Arc<ActionRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Swap the schema store (tests, embedders)
    pub fn with_schema(mut self, schema: SchemaStore) -> Self {
        self.schema = schema;
        self
    }

    pub fn tracker(&self) -> Arc<ActivityTracker> {
        self.tracker.clone()
    }

    /// Run until shutdown is requested. Cancellation takes effect at
    /// the top of a cycle, never inside one.
    pub async fn run(&self, shutdown: Arc<Shutdown>) -> Result<()> {
        log::info!(
            "🚀 Semantic runtime started: services dir {}, scan interval {}s",
            self.config.services_dir.display(),
            self.config.scan_interval_secs
        );
        if self.schema.is_disabled() {
            log::warn!("Running with validation disabled; every service will be skipped");
        }

        loop {
            if shutdown.is_requested() {
                log::info!("Shutdown requested; stopping at cycle boundary");
                return Ok(());
            }

            let stats = self.run_cycle().await;
            log::debug!("Cycle complete: {:?}", stats);

            tokio::select! {
                _ = sleep(self.config.scan_interval()) => {}
                _ = shutdown.notified() => {}
            }
        }
    }

    /// One full scan cycle over the service source directory.
    pub async fn run_cycle(&self) -> CycleStats {
        let mut stats = CycleStats::default();
        let dir = &self.config.services_dir;
        log::info!("Scanning services in {}", dir.display());

        let files = match service::list_service_files(dir) {
            Ok(files) => files,
            Err(e) => {
                log::error!("Failed to list services: {:#}", e);
                return stats;
            }
        };

        if files.is_empty() {
            log::info!("No service files found in {}", dir.display());
            return stats;
        }

        for path in files {
            stats.discovered += 1;
            self.process_service_file(&path, &mut stats).await;
        }

        stats
    }

    /// Load, validate, evaluate, and possibly dispatch one service file.
    /// All failure modes end here, at this file.
    async fn process_service_file(&self, path: &std::path::Path, stats: &mut CycleStats) {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                log::error!("Failed to read service file {}: {}", path.display(), e);
                stats.unreadable += 1;
                return;
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                log::error!("Failed to decode JSON from {}: {}", path.display(), e);
                stats.malformed += 1;
                return;
            }
        };

        let name = service::display_name(&value, path);

        if let Err(e) = self.schema.validate(&value) {
            // The disabled-schema case was already reported loudly at
            // startup; repeating it per service would flood the log.
            if self.schema.is_disabled() {
                log::debug!("Skipping service '{}': validation disabled", name);
            } else {
                log::error!("Schema validation failed for service '{}': {}", name, e);
            }
            stats.invalid += 1;
            return;
        }

        let service = match ServiceDefinition::from_value(value) {
            Ok(service) => service,
            Err(e) => {
                log::error!("Service '{}' could not be decoded: {:#}", name, e);
                stats.invalid += 1;
                return;
            }
        };

        let ctx = ContextSnapshot::capture(&self.probes);

        if !condition::evaluate(&service.condition, &ctx) {
            log::debug!("Condition not met for service '{}'", service.name);
            return;
        }

        log::info!(
            "Condition met for service '{}'; dispatching {} action(s)",
            service.name,
            service.actions.len()
        );
        stats.fired += 1;

        let summary = dispatch_service(&self.registry, &service, &ctx).await;
        if summary.dispatched > 0 {
            self.tracker.record();
        }
        stats.dispatch.absorb(summary);
    }
}
