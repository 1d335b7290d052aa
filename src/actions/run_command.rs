//! Spawn an external command without waiting for it

use std::process::Stdio;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use super::ActionHandler;
use crate::context::ContextSnapshot;
use crate::service::ActionSpec;

pub struct RunCommand;

#[async_trait]
impl ActionHandler for RunCommand {
    fn name(&self) -> &str {
        "run_command"
    }

    async fn run(&self, spec: &ActionSpec, _ctx: &ContextSnapshot) -> Result<()> {
        let command = match spec.str_param("command") {
            Some(command) => command,
            None => bail!("missing or invalid 'command' parameter"),
        };

        // Fire and forget: the dispatcher never observes this command's
        // exit status or output.
        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn command '{}'", command))?;

        log::info!("Spawned command '{}' (pid {:?})", command, child.id());
        Ok(())
    }
}
