//! Subprocess executor: runs `<program> <args...> <ws_id>`

use std::process::Stdio;

use anyhow::{bail, Context};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::WorkstreamExecutor;

/// Executes a workstream by spawning an external command.
///
/// Defaults to `sdp build <ws_id>`.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    program: String,
    args: Vec<String>,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new("sdp", ["build"])
    }
}

impl CommandExecutor {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl WorkstreamExecutor for CommandExecutor {
    async fn execute(&self, ws_id: &str) -> anyhow::Result<()> {
        debug!(program = %self.program, ws_id, "spawning executor");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(ws_id)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("failed to spawn '{}'", self.program))?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            bail!(
                "{} {} {} failed: {}\nOutput: {}",
                self.program,
                self.args.join(" "),
                ws_id,
                output.status,
                combined.trim_end()
            );
        }

        Ok(())
    }
}
