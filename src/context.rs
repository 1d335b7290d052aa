//! Live system context sampled ahead of condition evaluation

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde_json::Value;

pub const LAST_ACTIVITY_KEY: &str = "last_activity_time";
pub const BATTERY_KEY: &str = "battery_level";

/// One value producer feeding the context snapshot.
///
/// The runtime only needs the name-to-value mapping; how a value is
/// produced (a sensor, a tracker, a fixed simulation) is up to the probe.
pub trait ContextProbe: Send + Sync {
    fn name(&self) -> &str;
    fn sample(&self) -> Value;
}

/// Immutable view of system context for one service evaluation.
///
/// Built fresh before each evaluation and owned by the runtime loop for
/// its duration; nothing mutates it afterwards.
#[derive(Debug, Clone)]
pub struct ContextSnapshot {
    taken_at: DateTime<Utc>,
    values: HashMap<String, Value>,
}

impl ContextSnapshot {
    pub fn capture(probes: &[Box<dyn ContextProbe>]) -> Self {
        let mut values = HashMap::new();
        for probe in probes {
            values.insert(probe.name().to_string(), probe.sample());
        }
        Self {
            taken_at: Utc::now(),
            values,
        }
    }

    pub fn from_parts(taken_at: DateTime<Utc>, values: HashMap<String, Value>) -> Self {
        Self { taken_at, values }
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Seconds without recorded activity, as of the snapshot instant.
    /// None when no activity timestamp was ever recorded.
    pub fn idle_seconds(&self) -> Option<i64> {
        self.values
            .get(LAST_ACTIVITY_KEY)
            .and_then(Value::as_i64)
            .map(|last| self.taken_at.timestamp() - last)
    }
}

/// Simulated battery probe. Reports a fixed level until a real power
/// source is wired in.
pub struct BatteryProbe {
    level: u8,
}

impl BatteryProbe {
    pub fn new(level: u8) -> Self {
        Self { level }
    }
}

impl Default for BatteryProbe {
    fn default() -> Self {
        Self { level: 100 }
    }
}

impl ContextProbe for BatteryProbe {
    fn name(&self) -> &str {
        BATTERY_KEY
    }

    fn sample(&self) -> Value {
        Value::from(self.level)
    }
}

/// Wall-clock time of the most recent dispatched activity.
///
/// Written by the dispatcher after a service fires, read when the next
/// snapshot is taken; a fired action therefore resets idleness starting
/// with the following cycle.
pub struct ActivityTracker {
    last: RwLock<Option<DateTime<Utc>>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self {
            last: RwLock::new(None),
        }
    }

    pub fn record(&self) {
        *self.last.write().unwrap() = Some(Utc::now());
    }

    pub fn set_last_activity(&self, at: DateTime<Utc>) {
        *self.last.write().unwrap() = Some(at);
    }

    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        *self.last.read().unwrap()
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Probe adapter exposing a shared [`ActivityTracker`] to snapshots.
pub struct ActivityProbe {
    tracker: std::sync::Arc<ActivityTracker>,
}

impl ActivityProbe {
    pub fn new(tracker: std::sync::Arc<ActivityTracker>) -> Self {
        Self { tracker }
    }
}

impl ContextProbe for ActivityProbe {
    fn name(&self) -> &str {
        LAST_ACTIVITY_KEY
    }

    fn sample(&self) -> Value {
        match self.tracker.last_activity() {
            Some(at) => Value::from(at.timestamp()),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    #[test]
    fn test_snapshot_captures_probe_values() {
        let tracker = Arc::new(ActivityTracker::new());
        tracker.record();
        let probes: Vec<Box<dyn ContextProbe>> = vec![
            Box::new(BatteryProbe::default()),
            Box::new(ActivityProbe::new(tracker)),
        ];

        let snapshot = ContextSnapshot::capture(&probes);
        assert_eq!(snapshot.get(BATTERY_KEY), Some(&Value::from(100)));
        assert!(snapshot.get(LAST_ACTIVITY_KEY).unwrap().is_i64());
    }

    #[test]
    fn test_idle_seconds_from_timestamps() {
        let now = Utc::now();
        let mut values = HashMap::new();
        values.insert(
            LAST_ACTIVITY_KEY.to_string(),
            Value::from((now - Duration::seconds(42)).timestamp()),
        );
        let snapshot = ContextSnapshot::from_parts(now, values);
        assert_eq!(snapshot.idle_seconds(), Some(42));
    }

    #[test]
    fn test_idle_seconds_without_recorded_activity() {
        let snapshot = ContextSnapshot::from_parts(Utc::now(), HashMap::new());
        assert_eq!(snapshot.idle_seconds(), None);
    }
}
