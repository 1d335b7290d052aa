//! Service definitions: the declarative unit read from the source directory

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const SERVICE_EXTENSION: &str = "json";

fn default_condition() -> String {
    crate::condition::ALWAYS_TRUE.to_string()
}

/// A declarative service: a condition plus an ordered list of actions.
///
/// Read fresh from disk every cycle; never cached, never mutated, and
/// carrying no fired/not-fired state between cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Diagnostic identifier, not guaranteed unique across files
    pub name: String,
    #[serde(default = "default_condition")]
    pub condition: String,
    /// Dispatch order is declaration order
    pub actions: Vec<ActionSpec>,
}

impl ServiceDefinition {
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).context("service document does not match expected shape")
    }
}

/// One step of a service. Everything beyond `type` is handler-specific
/// payload the runtime passes through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSpec {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl ActionSpec {
    /// String payload field, if present and a string
    pub fn str_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }
}

/// List the service files visible in the source directory.
///
/// Entries that are not regular `.json` files are ignored. The order is
/// whatever the directory listing yields; nothing should depend on it
/// being stable across cycles.
pub fn list_service_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("cannot list {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("cannot read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_file()
            && path.extension().and_then(|e| e.to_str()) == Some(SERVICE_EXTENSION)
        {
            files.push(path);
        }
    }
    Ok(files)
}

/// Name used in diagnostics before the document is fully trusted:
/// the `name` field when it parses, the file name otherwise.
pub fn display_name(value: &Value, path: &Path) -> String {
    value
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string())
        })
}
