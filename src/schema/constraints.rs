//! Constraint definitions for field validation

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Constraints that can be applied to schema fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Constraint {
    /// Minimum string length
    MinLength(usize),

    /// Maximum string length
    MaxLength(usize),

    /// Minimum numeric value
    Min(i64),

    /// Maximum numeric value
    Max(i64),

    /// Regex pattern match
    Pattern(String),

    /// Value must be in this list
    OneOf(Vec<Value>),

    /// Minimum number of array elements
    MinItems(usize),
}

impl Constraint {
    /// Validate a value against this constraint
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match self {
            Constraint::MinLength(min) => {
                if let Value::String(s) = value {
                    if s.len() < *min {
                        return Err(format!("length must be at least {}", min));
                    }
                }
                Ok(())
            }

            Constraint::MaxLength(max) => {
                if let Value::String(s) = value {
                    if s.len() > *max {
                        return Err(format!("length must be at most {}", max));
                    }
                }
                Ok(())
            }

            Constraint::Min(min) => {
                if let Value::Number(n) = value {
                    if let Some(v) = n.as_i64() {
                        if v < *min {
                            return Err(format!("value must be at least {}", min));
                        }
                    }
                }
                Ok(())
            }

            Constraint::Max(max) => {
                if let Value::Number(n) = value {
                    if let Some(v) = n.as_i64() {
                        if v > *max {
                            return Err(format!("value must be at most {}", max));
                        }
                    }
                }
                Ok(())
            }

            Constraint::Pattern(pattern) => {
                if let Value::String(s) = value {
                    let regex = Regex::new(pattern)
                        .map_err(|e| format!("invalid pattern '{}': {}", pattern, e))?;
                    if !regex.is_match(s) {
                        return Err(format!("must match pattern: {}", pattern));
                    }
                }
                Ok(())
            }

            Constraint::OneOf(options) => {
                if !options.contains(value) {
                    return Err(format!("must be one of: {:?}", options));
                }
                Ok(())
            }

            Constraint::MinItems(min) => {
                if let Value::Array(items) = value {
                    if items.len() < *min {
                        return Err(format!("array must have at least {} item(s)", min));
                    }
                }
                Ok(())
            }
        }
    }

    /// Short name used in diagnostics
    pub fn describe(&self) -> String {
        match self {
            Constraint::MinLength(v) => format!("minLength: {}", v),
            Constraint::MaxLength(v) => format!("maxLength: {}", v),
            Constraint::Min(v) => format!("min: {}", v),
            Constraint::Max(v) => format!("max: {}", v),
            Constraint::Pattern(p) => format!("pattern: {}", p),
            Constraint::OneOf(vs) => format!("oneOf: {:?}", vs),
            Constraint::MinItems(v) => format!("minItems: {}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_length_bounds() {
        assert!(Constraint::MinLength(1).validate(&json!("x")).is_ok());
        assert!(Constraint::MinLength(2).validate(&json!("x")).is_err());
        assert!(Constraint::MaxLength(3).validate(&json!("abcd")).is_err());
    }

    #[test]
    fn test_numeric_bounds() {
        assert!(Constraint::Min(0).validate(&json!(5)).is_ok());
        assert!(Constraint::Min(10).validate(&json!(5)).is_err());
        assert!(Constraint::Max(10).validate(&json!(11)).is_err());
    }

    #[test]
    fn test_pattern_uses_real_regex() {
        let c = Constraint::Pattern(r"^[a-z_]+$".to_string());
        assert!(c.validate(&json!("list_files")).is_ok());
        assert!(c.validate(&json!("rm -rf /")).is_err());
    }

    #[test]
    fn test_min_items() {
        assert!(Constraint::MinItems(1).validate(&json!([1])).is_ok());
        assert!(Constraint::MinItems(1).validate(&json!([])).is_err());
    }
}
