//! List directory contents at a path

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use super::ActionHandler;
use crate::context::ContextSnapshot;
use crate::service::ActionSpec;

pub struct ListFiles;

#[async_trait]
impl ActionHandler for ListFiles {
    fn name(&self) -> &str {
        "list_files"
    }

    async fn run(&self, spec: &ActionSpec, _ctx: &ContextSnapshot) -> Result<()> {
        let path = match spec.str_param("path") {
            Some(path) => path,
            None => bail!("missing or invalid 'path' parameter"),
        };

        // The path is used as given, trailing separator or not; the
        // filesystem decides whether it names a directory.
        let mut entries = tokio::fs::read_dir(path)
            .await
            .with_context(|| format!("failed to list '{}'", path))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("failed to read entry under '{}'", path))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();

        log::info!("Contents of '{}' ({} entries):", path, names.len());
        for name in &names {
            log::info!("  {}", name);
        }
        Ok(())
    }
}
