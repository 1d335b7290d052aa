//! Create a directory, parents included. Idempotent: an existing
//! directory is a success, not an error.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use super::ActionHandler;
use crate::context::ContextSnapshot;
use crate::service::ActionSpec;

pub struct Mkdir;

#[async_trait]
impl ActionHandler for Mkdir {
    fn name(&self) -> &str {
        "mkdir"
    }

    async fn run(&self, spec: &ActionSpec, _ctx: &ContextSnapshot) -> Result<()> {
        let path = match spec.str_param("path") {
            Some(path) => path,
            None => bail!("missing or invalid 'path' parameter"),
        };

        tokio::fs::create_dir_all(path)
            .await
            .with_context(|| format!("failed to create directory '{}'", path))?;

        log::info!("Ensured directory exists: {}", path);
        Ok(())
    }
}
