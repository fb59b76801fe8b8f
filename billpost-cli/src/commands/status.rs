//! `billpost status` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use billpost_core::config::BillpostConfig;

use crate::cli::StatusArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `status` command.
pub async fn execute(
    args: StatusArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = BillpostConfig::load(config_path)
        .await
        .map_err(|e| CliError::Config(e.to_string()))?;

    let report = build_status_report(&config, args.verbose);
    writer.render(&report)?;
    Ok(())
}

fn build_status_report(config: &BillpostConfig, verbose: bool) -> StatusReport {
    let (daemon_running, daemon_pid) = check_daemon_status(&config.general.pid_file);
    let health = if daemon_running { "running" } else { "stopped" };

    let mut modules = vec![
        ModuleStatus {
            name: "auth-guard".to_owned(),
            health: health.to_owned(),
            details: verbose.then(|| {
                format!(
                    "accounts_path={}, token_ttl_secs={}",
                    config.auth.accounts_path, config.auth.token_ttl_secs
                )
            }),
        },
        ModuleStatus {
            name: "dispatch".to_owned(),
            health: health.to_owned(),
            details: verbose.then(|| {
                format!(
                    "max_assign_batch={}, max_proof_bytes={}",
                    config.dispatch.max_assign_batch, config.dispatch.max_proof_bytes
                )
            }),
        },
        ModuleStatus {
            name: "report-generator".to_owned(),
            health: health.to_owned(),
            details: verbose.then(|| format!("max_reports={}", config.report.max_reports)),
        },
    ];

    if config.metrics.enabled {
        modules.push(ModuleStatus {
            name: "metrics".to_owned(),
            health: health.to_owned(),
            details: verbose.then(|| {
                format!("{}:{}{}", config.metrics.listen_addr, config.metrics.port, config.metrics.endpoint)
            }),
        });
    }

    StatusReport {
        daemon_running,
        daemon_pid,
        pid_file: config.general.pid_file.clone(),
        modules,
    }
}

/// Check whether the daemon is alive via its PID file.
///
/// Returns `(running, pid)`. A stale PID file (process gone) reports
/// not-running.
fn check_daemon_status(pid_file: &str) -> (bool, Option<u32>) {
    if pid_file.is_empty() {
        return (false, None);
    }

    let Ok(content) = std::fs::read_to_string(pid_file) else {
        return (false, None);
    };
    let Ok(pid) = content.trim().parse::<u32>() else {
        debug!(pid_file, "pid file contains no valid pid");
        return (false, None);
    };

    (process_alive(pid), Some(pid))
}

#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    // Signal 0 probes liveness without delivering anything
    unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    false
}

/// Daemon status payload.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Whether the daemon process is alive.
    pub daemon_running: bool,
    /// PID read from the PID file, if any.
    pub daemon_pid: Option<u32>,
    /// Configured PID file path (empty when disabled).
    pub pid_file: String,
    /// Per-module configuration summary.
    pub modules: Vec<ModuleStatus>,
}

/// Per-module status line.
#[derive(Debug, Serialize)]
pub struct ModuleStatus {
    pub name: String,
    pub health: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Render for StatusReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        if self.daemon_running {
            writeln!(
                w,
                "Daemon: running (pid {})",
                self.daemon_pid.unwrap_or_default()
            )?;
        } else if self.pid_file.is_empty() {
            writeln!(w, "Daemon: unknown (no pid_file configured)")?;
        } else {
            writeln!(w, "Daemon: stopped")?;
        }

        writeln!(w, "{:<18} {:<10} Details", "Module", "Health")?;
        writeln!(w, "{}", "-".repeat(48))?;
        for module in &self.modules {
            writeln!(
                w,
                "{:<18} {:<10} {}",
                module.name,
                module.health,
                module.details.as_deref().unwrap_or("-"),
            )?;
        }
        Ok(())
    }
}
