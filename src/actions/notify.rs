//! Notify action: surface a message to the operator

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::ActionHandler;
use crate::context::ContextSnapshot;
use crate::service::ActionSpec;

pub struct Notify;

#[async_trait]
impl ActionHandler for Notify {
    fn name(&self) -> &str {
        "notify"
    }

    async fn run(&self, spec: &ActionSpec, _ctx: &ContextSnapshot) -> Result<()> {
        let message = match spec.str_param("message") {
            Some(message) => message,
            None => bail!("missing or invalid 'message' parameter"),
        };

        log::info!("NOTIFICATION: {}", message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use std::collections::HashMap;

    fn ctx() -> ContextSnapshot {
        ContextSnapshot::from_parts(Utc::now(), HashMap::new())
    }

    #[tokio::test]
    async fn test_notify_requires_message() {
        let spec: ActionSpec =
            serde_json::from_value(json!({"type": "notify", "message": "hello"})).unwrap();
        assert!(Notify.run(&spec, &ctx()).await.is_ok());

        let spec: ActionSpec = serde_json::from_value(json!({"type": "notify"})).unwrap();
        assert!(Notify.run(&spec, &ctx()).await.is_err());
    }
}
