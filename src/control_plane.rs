use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Captured outcome of one CLI invocation. Failures are values, not errors:
/// a missing binary, a non-zero exit and non-UTF8 output all land in
/// `ok`/`stderr` for the caller to branch on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub ok: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Both streams concatenated, for terminal transcripts.
    pub fn combined(&self) -> String {
        let stdout = self.stdout.trim_end();
        let stderr = self.stderr.trim_end();
        match (stdout.is_empty(), stderr.is_empty()) {
            (false, false) => format!("{stdout}\n{stderr}"),
            (false, true) => stdout.to_string(),
            (true, _) => stderr.to_string(),
        }
    }
}

/// Uniform boundary to the external cluster CLI. `execute` never fails the
/// caller; loops and dispatchers stay alive no matter what the CLI does.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn execute(&self, command: &str) -> CommandOutput;
}

/// Runs commands through `sh -c`, capturing both streams.
pub struct ShellControlPlane;

#[async_trait]
impl ControlPlane for ShellControlPlane {
    async fn execute(&self, command: &str) -> CommandOutput {
        debug!(command, "executing control plane command");
        match Command::new("sh").arg("-c").arg(command).output().await {
            Ok(output) => CommandOutput {
                ok: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Err(e) => CommandOutput {
                ok: false,
                stdout: String::new(),
                stderr: format!("failed to spawn command: {e}"),
            },
        }
    }
}
