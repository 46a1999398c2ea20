//! Device adapter backed by an external helper program
//!
//! The helper owns the router's web UI automation (login, navigation, band
//! lock form). It is invoked once per operation:
//!
//! - `<helper> apply <identity>`: lock the bands, exit 0 on success
//! - `<helper> reset`: drop and re-establish the web session
//! - `<helper> status`: print `{"no_service": bool}` on stdout
//!
//! Credentials travel through `ROUTER_URL` / `ROUTER_PASSWORD`, and
//! `--headed` is appended in visual mode.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use shared::Combination;

use super::command::{stderr_summary, ExternalCommand};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::DeviceAdapter;

#[derive(Debug, Deserialize)]
struct StatusReport {
    no_service: bool,
}

/// Real device adapter driving the helper program
pub struct CommandDevice {
    helper: ExternalCommand,
    router_url: String,
    password: Option<String>,
    headed: bool,
}

impl CommandDevice {
    pub fn new(helper: ExternalCommand) -> Self {
        Self {
            helper,
            router_url: "http://192.168.8.1".to_string(),
            password: None,
            headed: false,
        }
    }

    /// Configure router address (fluent API)
    pub fn with_router_url(mut self, router_url: impl Into<String>) -> Self {
        self.router_url = router_url.into();
        self
    }

    /// Configure router password (fluent API)
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    /// Run the helper with a visible browser (fluent API)
    pub fn with_headed(mut self, headed: bool) -> Self {
        self.headed = headed;
        self
    }

    fn command(&self, subcommand: &str) -> Command {
        let mut cmd = self.helper.build();
        cmd.arg(subcommand).env("ROUTER_URL", &self.router_url);
        if let Some(password) = &self.password {
            cmd.env("ROUTER_PASSWORD", password);
        }
        if self.headed {
            cmd.arg("--headed");
        }
        cmd
    }

    /// Failing to start the helper at all means the session cannot be recovered
    async fn output(&self, mut cmd: Command) -> OrchestratorResult<std::process::Output> {
        cmd.output().await.map_err(|e| OrchestratorError::SessionLost {
            message: format!("cannot run device helper '{}': {e}", self.helper.program()),
        })
    }
}

/// Parse the helper's `status` output
fn parse_status(stdout: &str) -> Result<bool, String> {
    serde_json::from_str::<StatusReport>(stdout.trim())
        .map(|report| report.no_service)
        .map_err(|e| format!("unreadable status output: {e}"))
}

#[async_trait]
impl DeviceAdapter for CommandDevice {
    async fn apply_configuration(&self, combination: &Combination) -> OrchestratorResult<()> {
        let mut cmd = self.command("apply");
        cmd.arg(combination.identity());

        let output = self.output(cmd).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(OrchestratorError::DeviceError {
                combination: combination.identity(),
                message: stderr_summary(&output),
            })
        }
    }

    async fn read_no_service_indicator(&self) -> OrchestratorResult<bool> {
        let output = self.output(self.command("status")).await?;
        let device_error = |message: String| OrchestratorError::DeviceError {
            combination: "status".to_string(),
            message,
        };

        if !output.status.success() {
            return Err(device_error(stderr_summary(&output)));
        }
        parse_status(&String::from_utf8_lossy(&output.stdout)).map_err(device_error)
    }

    async fn reset_session(&self) -> OrchestratorResult<()> {
        let output = self.output(self.command("reset")).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(OrchestratorError::DeviceError {
                combination: "reset".to_string(),
                message: stderr_summary(&output),
            })
        }
    }
}
