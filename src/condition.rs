//! Condition grammar for semantic services
//!
//! Deliberately closed: a condition string parses into a tagged variant,
//! never into code to run. Anything outside the grammar is fail-safe
//! false, so a broken or hostile service file can at worst do nothing.

use lazy_static::lazy_static;
use regex::Regex;

use crate::context::ContextSnapshot;

pub const ALWAYS_TRUE: &str = "always_true";

lazy_static! {
    static ref NO_ACTIVITY_RE: Regex = Regex::new(r"^no_activity\s*>\s*(.+?)\s*s$").unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    AlwaysTrue,
    /// Fires once the idle duration strictly exceeds the threshold
    IdleGreaterThan(u64),
    /// Comparison recognized but the threshold did not parse
    MalformedThreshold(String),
    /// Not part of the grammar at all
    Unrecognized(String),
}

impl Condition {
    pub fn parse(expr: &str) -> Condition {
        let expr = expr.trim();
        if expr == ALWAYS_TRUE {
            return Condition::AlwaysTrue;
        }
        if let Some(caps) = NO_ACTIVITY_RE.captures(expr) {
            return match caps[1].parse::<u64>() {
                Ok(seconds) => Condition::IdleGreaterThan(seconds),
                Err(_) => Condition::MalformedThreshold(expr.to_string()),
            };
        }
        Condition::Unrecognized(expr.to_string())
    }
}

/// Evaluate a condition string against a context snapshot.
///
/// Pure over its inputs; the only side effect is logging.
pub fn evaluate(expr: &str, ctx: &ContextSnapshot) -> bool {
    match Condition::parse(expr) {
        Condition::AlwaysTrue => true,
        Condition::IdleGreaterThan(threshold) => match ctx.idle_seconds() {
            Some(idle) => idle > threshold as i64,
            None => {
                log::debug!(
                    "Condition '{}': no activity timestamp in context, treating as not met",
                    expr
                );
                false
            }
        },
        Condition::MalformedThreshold(expr) => {
            log::warn!("Invalid threshold in condition string: '{}'", expr);
            false
        }
        Condition::Unrecognized(expr) => {
            log::warn!("Unknown condition format: '{}'", expr);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LAST_ACTIVITY_KEY;
    use chrono::{Duration, Utc};
    use serde_json::Value;
    use std::collections::HashMap;

    fn ctx_idle_for(seconds: i64) -> ContextSnapshot {
        let now = Utc::now();
        let mut values = HashMap::new();
        values.insert(
            LAST_ACTIVITY_KEY.to_string(),
            Value::from((now - Duration::seconds(seconds)).timestamp()),
        );
        ContextSnapshot::from_parts(now, values)
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(Condition::parse("always_true"), Condition::AlwaysTrue);
        assert_eq!(
            Condition::parse("no_activity > 600s"),
            Condition::IdleGreaterThan(600)
        );
        assert_eq!(
            Condition::parse("no_activity>5s"),
            Condition::IdleGreaterThan(5)
        );
        assert!(matches!(
            Condition::parse("no_activity > -1s"),
            Condition::MalformedThreshold(_)
        ));
        assert!(matches!(
            Condition::parse("no_activity > 1.5s"),
            Condition::MalformedThreshold(_)
        ));
        assert!(matches!(
            Condition::parse("battery_level < 10"),
            Condition::Unrecognized(_)
        ));
    }

    #[test]
    fn test_always_true_for_any_context() {
        assert!(evaluate("always_true", &ctx_idle_for(0)));
        assert!(evaluate(
            "always_true",
            &ContextSnapshot::from_parts(Utc::now(), HashMap::new())
        ));
    }

    #[test]
    fn test_idle_comparison_is_strict() {
        assert!(evaluate("no_activity > 5s", &ctx_idle_for(6)));
        assert!(!evaluate("no_activity > 5s", &ctx_idle_for(5)));
        assert!(!evaluate("no_activity > 5s", &ctx_idle_for(4)));
    }

    #[test]
    fn test_negative_threshold_is_false() {
        assert!(!evaluate("no_activity > -1s", &ctx_idle_for(1000)));
    }

    #[test]
    fn test_unrecognized_condition_is_false() {
        assert!(!evaluate("screen_locked == true", &ctx_idle_for(1000)));
        assert!(!evaluate("", &ctx_idle_for(1000)));
    }

    #[test]
    fn test_missing_activity_timestamp_is_false() {
        let ctx = ContextSnapshot::from_parts(Utc::now(), HashMap::new());
        assert!(!evaluate("no_activity > 5s", &ctx));
    }
}
