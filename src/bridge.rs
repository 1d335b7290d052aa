//! Natural-language bridge to the local model
//!
//! A stateless request/response shim. The prompt is forwarded to the
//! local model process under a deadline; any failure of that process
//! (missing binary, timeout, non-zero exit, unusable output) degrades
//! to a small set of canned service documents instead of reaching the
//! caller. The runtime itself only ever sees the JSON files this
//! module writes into the service source directory.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::BridgeConfig;

pub const SYSTEM_PROMPT: &str = "You are the semantic runtime assistant. Respond ONLY with \
    valid JSON following the semantic service schema. Valid action types: notify, \
    list_files, mkdir, run_command.";

pub struct SemanticBridge {
    config: BridgeConfig,
}

impl SemanticBridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }

    /// Turn a free-text request into a service document.
    ///
    /// Never fails on model trouble: any model-side problem is logged
    /// and answered with a canned document.
    pub async fn interpret(&self, request: &str) -> Value {
        match self.query_model(request).await {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("Local model unavailable ({:#}); using fallback response", e);
                fallback_response(request)
            }
        }
    }

    async fn query_model(&self, request: &str) -> Result<Value> {
        let binary = which::which(&self.config.model_binary)
            .with_context(|| format!("model binary '{}' not found", self.config.model_binary.display()))?;

        let prompt = format!("{}\nUser query: {}", SYSTEM_PROMPT, request);

        let output = timeout(
            self.config.timeout(),
            Command::new(&binary)
                .arg("-m")
                .arg(&self.config.model_path)
                .arg("-p")
                .arg(&prompt)
                .stdin(Stdio::null())
                .output(),
        )
        .await
        .context("model call timed out")?
        .context("failed to run model process")?;

        if !output.status.success() {
            bail!("model process exited with status {}", output.status);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        extract_json(&stdout).context("model output contained no JSON object")
    }

    /// Interpret a request and write the result into the service source
    /// directory, where the next scan cycle will pick it up.
    pub async fn submit(&self, request: &str, services_dir: &Path) -> Result<PathBuf> {
        let doc = self.interpret(request).await;
        let name = doc
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("service");
        let path = services_dir.join(format!("{}.json", sanitize_file_stem(name)));

        tokio::fs::create_dir_all(services_dir)
            .await
            .with_context(|| format!("failed to create {}", services_dir.display()))?;
        tokio::fs::write(&path, serde_json::to_string_pretty(&doc)?)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        log::info!("Wrote service '{}' to {}", name, path.display());
        Ok(path)
    }
}

/// Pull the outermost JSON object out of raw model output, tolerating
/// chatter before and after it.
fn extract_json(raw: &str) -> Option<Value> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

/// Canned responses for when the model is unreachable. Each document
/// satisfies the service schema, so a degraded bridge still produces
/// loadable services.
fn fallback_response(request: &str) -> Value {
    let request_lower = request.to_lowercase();

    if request_lower.contains("/etc")
        && (request_lower.contains("list")
            || request_lower.contains("show")
            || request_lower.contains("content"))
    {
        json!({
            "name": "ShowEtcContent",
            "condition": "always_true",
            "actions": [{"type": "list_files", "path": "/etc"}]
        })
    } else if request_lower.contains("folder") || request_lower.contains("director") {
        json!({
            "name": "MakeDemoDir",
            "condition": "always_true",
            "actions": [{"type": "mkdir", "path": "/tmp/demo_llm"}]
        })
    } else {
        json!({
            "name": "UnknownQueryResponse",
            "condition": "always_true",
            "actions": [{"type": "notify", "message": "Query not recognized by fallback responder."}]
        })
    }
}

fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "service".to_string()
    } else {
        stem
    }
}
