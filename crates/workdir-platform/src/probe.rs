use async_trait::async_trait;
use log::debug;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[cfg(windows)]
use std::os::windows::process::CommandExt as _;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

pub trait HideWindow {
    fn hide_window(&mut self) -> &mut Self;
}

impl HideWindow for Command {
    #[cfg(windows)]
    fn hide_window(&mut self) -> &mut Self {
        self.creation_flags(CREATE_NO_WINDOW)
    }

    #[cfg(not(windows))]
    fn hide_window(&mut self) -> &mut Self {
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ProbeOutput {
    /// First non-empty stdout line, trimmed.
    #[must_use]
    pub fn first_line(&self) -> Option<&str> {
        self.stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("Failed to start {program}: {details}")]
    Spawn { program: String, details: String },

    #[error("{program} did not answer within {millis} ms")]
    Timeout { program: String, millis: u128 },
}

/// Runs short-lived inspection commands. Never used to run user commands.
#[async_trait]
pub trait CommandProbe: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ProbeOutput, ProbeError>;

    /// Run and keep the output only when the command exited successfully.
    async fn run_ok(&self, program: &str, args: &[&str], timeout: Duration) -> Option<ProbeOutput> {
        match self.run(program, args, timeout).await {
            Ok(output) if output.success => Some(output),
            Ok(output) => {
                debug!(
                    "{program} {} exited unsuccessfully: {}",
                    args.join(" "),
                    output.stderr.trim()
                );
                None
            }
            Err(error) => {
                debug!("{error}");
                None
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

#[async_trait]
impl CommandProbe for SystemProbe {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ProbeOutput, ProbeError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .env("TERM", "dumb")
            .env("NO_COLOR", "1")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .hide_window();

        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(ProbeOutput {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
            Ok(Err(error)) => Err(ProbeError::Spawn {
                program: program.to_string(),
                details: error.to_string(),
            }),
            Err(_) => Err(ProbeError::Timeout {
                program: program.to_string(),
                millis: timeout.as_millis(),
            }),
        }
    }
}
