//! Service assembly, audit channel wiring, and lifecycle management.
//!
//! The [`Orchestrator`] is the central coordinator of `billpost-daemon`.
//! It loads configuration, loads the principal directory, wires the audit
//! event channels, builds the [`BillpostService`] facade, and runs the
//! main loop (audit logging, uptime reporting, shutdown signals).
//!
//! # Startup Order
//!
//! 1. Validate configuration
//! 2. Install metrics recorder (when enabled)
//! 3. Load principal directory from the accounts file
//! 4. Build the service facade (guard, ledger, engine, tracker, verifier, reports)
//! 5. Write the PID file, spawn audit/uptime tasks, wait for shutdown

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};

use billpost_auth::PrincipalDirectory;
use billpost_core::config::BillpostConfig;
use billpost_core::event::{DeliveryEvent, Event, ReportEvent};
use billpost_core::metrics as m;
use billpost_core::service::Component;

use crate::health::{DaemonHealth, ModuleHealth, aggregate_status};
use crate::metrics_server;
use crate::service::BillpostService;

/// Channel capacity constants.
const DELIVERY_CHANNEL_CAPACITY: usize = 256;
const REPORT_CHANNEL_CAPACITY: usize = 64;

/// The main daemon orchestrator.
///
/// Owns the composed service and the receiving half of the audit
/// channels, and manages startup, health reporting, and graceful
/// shutdown.
pub struct Orchestrator {
    /// Loaded and validated configuration.
    config: BillpostConfig,
    /// The composed request surface.
    service: Arc<BillpostService>,
    /// Shutdown broadcast sender (signals all background tasks).
    shutdown_tx: broadcast::Sender<()>,
    /// Daemon start time (for uptime reporting).
    start_time: Instant,
    /// Delivery audit event receiver (consumed by the audit task).
    delivery_rx: Option<mpsc::Receiver<DeliveryEvent>>,
    /// Report audit event receiver (consumed by the audit task).
    report_rx: Option<mpsc::Receiver<ReportEvent>>,
}

impl Orchestrator {
    /// Load configuration and build the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or parsed
    /// - Configuration validation fails
    /// - The accounts file cannot be loaded
    pub async fn build(config_path: &Path) -> Result<Self> {
        let config = BillpostConfig::load(config_path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?;
        Self::build_from_config(config).await
    }

    /// Build from an already-loaded configuration.
    ///
    /// Useful for testing or when config has already been loaded.
    pub async fn build_from_config(config: BillpostConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

        // Install metrics recorder before component initialization
        if config.metrics.enabled {
            metrics_server::install_metrics_recorder(&config.metrics)?;
            tracing::info!(port = config.metrics.port, "metrics endpoint enabled");
        }

        tracing::debug!("creating audit event channels");
        let (delivery_tx, delivery_rx) =
            mpsc::channel::<DeliveryEvent>(DELIVERY_CHANNEL_CAPACITY);
        let (report_tx, report_rx) = mpsc::channel::<ReportEvent>(REPORT_CHANNEL_CAPACITY);
        let (shutdown_tx, _) = broadcast::channel(16);

        tracing::info!(path = %config.auth.accounts_path, "loading principal directory");
        let directory = Arc::new(
            PrincipalDirectory::load_from_file(&config.auth.accounts_path)
                .await
                .map_err(|e| anyhow::anyhow!("failed to load accounts: {}", e))?,
        );

        let service = Arc::new(
            BillpostService::from_parts(directory, &config, delivery_tx, report_tx)
                .map_err(|e| anyhow::anyhow!("failed to build service: {}", e))?,
        );
        tracing::info!("billpost service initialized");

        Ok(Self {
            config,
            service,
            shutdown_tx,
            start_time: Instant::now(),
            delivery_rx: Some(delivery_rx),
            report_rx: Some(report_rx),
        })
    }

    /// Run the daemon until a shutdown signal arrives.
    ///
    /// Writes the PID file (when configured), spawns the audit-logger
    /// and uptime tasks, and blocks on SIGTERM/SIGINT.
    pub async fn run(&mut self) -> Result<()> {
        if !self.config.general.pid_file.is_empty() {
            write_pid_file(Path::new(&self.config.general.pid_file))?;
        }

        if self.config.metrics.enabled {
            metrics::gauge!(m::DAEMON_BUILD_INFO, "version" => env!("CARGO_PKG_VERSION")).set(1.0);
        }

        // Audit logger task: drain both audit channels into structured logs
        let mut audit_task = None;
        if let (Some(delivery_rx), Some(report_rx)) =
            (self.delivery_rx.take(), self.report_rx.take())
        {
            let shutdown_rx = self.shutdown_tx.subscribe();
            audit_task = Some(spawn_audit_logger(delivery_rx, report_rx, shutdown_rx));
        }

        // Uptime updater task
        let uptime_task = {
            let mut shutdown_rx = self.shutdown_tx.subscribe();
            let start_time = self.start_time;
            let metrics_enabled = self.config.metrics.enabled;
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(15));
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            if metrics_enabled {
                                let uptime_secs = start_time.elapsed().as_secs();
                                #[allow(clippy::cast_precision_loss)]
                                metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);
                            }
                        }
                        _ = shutdown_rx.recv() => break,
                    }
                }
            })
        };

        tracing::info!("billpost-daemon running");
        let signal = wait_for_shutdown_signal().await?;
        tracing::info!(signal, "shutdown signal received");

        // Signal all background tasks and wait for them to drain
        let _ = self.shutdown_tx.send(());
        if let Some(task) = audit_task {
            let _ = task.await;
        }
        let _ = uptime_task.await;

        if !self.config.general.pid_file.is_empty() {
            remove_pid_file(Path::new(&self.config.general.pid_file));
        }

        tracing::info!("billpost-daemon shut down");
        Ok(())
    }

    /// Get the current aggregated health status.
    pub async fn health(&self) -> DaemonHealth {
        let guard = self.service.guard();
        let ledger = self.service.ledger();
        let reports = self.service.report_generator();

        let modules = vec![
            ModuleHealth {
                name: guard.name().to_owned(),
                enabled: true,
                status: guard.health_check().await,
            },
            ModuleHealth {
                name: ledger.name().to_owned(),
                enabled: true,
                status: ledger.health_check().await,
            },
            ModuleHealth {
                name: reports.name().to_owned(),
                enabled: true,
                status: reports.health_check().await,
            },
        ];

        let overall_status = aggregate_status(&modules);
        let uptime_secs = self.start_time.elapsed().as_secs();

        if self.config.metrics.enabled {
            #[allow(clippy::cast_precision_loss)]
            metrics::gauge!(m::DAEMON_UPTIME_SECONDS).set(uptime_secs as f64);
        }

        DaemonHealth {
            status: overall_status,
            uptime_secs,
            modules,
        }
    }

    /// Get a handle to the composed service.
    pub fn service(&self) -> Arc<BillpostService> {
        Arc::clone(&self.service)
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &BillpostConfig {
        &self.config
    }
}

/// Spawn the audit logger task.
///
/// Drains delivery and report audit events into structured logs until
/// both channels close or the shutdown signal arrives.
fn spawn_audit_logger(
    mut delivery_rx: mpsc::Receiver<DeliveryEvent>,
    mut report_rx: mpsc::Receiver<ReportEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = delivery_rx.recv() => match event {
                    Some(event) => {
                        tracing::info!(
                            event_id = event.event_id(),
                            trace = %event.metadata.trace_id,
                            delivery = %event.delivery_id,
                            bill = %event.bill_id,
                            messenger = %event.messenger_id,
                            kind = %event.kind,
                            "delivery audit event"
                        );
                    }
                    None => break,
                },
                event = report_rx.recv() => match event {
                    Some(event) => {
                        tracing::info!(
                            event_id = event.event_id(),
                            report = %event.report_id,
                            date = %event.report_date,
                            total = event.tally.total(),
                            verified = event.tally.verified,
                            rejected = event.tally.rejected,
                            "report audit event"
                        );
                    }
                    None => break,
                },
                _ = shutdown_rx.recv() => {
                    tracing::debug!("audit logger shutting down");
                    break;
                }
            }
        }
    })
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
///
/// Returns the name of the signal that triggered the shutdown.
///
/// # Errors
///
/// Returns an error if signal handlers cannot be installed.
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("failed to install SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("failed to install SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Write the current process PID to a file.
///
/// Used to prevent duplicate daemon instances.
///
/// # Security
///
/// - Uses `create_new(true)` to atomically create file (prevents TOCTOU races)
/// - Verifies the created file is a regular file (prevents symlink attacks)
/// - Creates parent directory with restrictive permissions (0o700)
///
/// # Errors
///
/// Returns an error if the PID file cannot be written.
pub fn write_pid_file(path: &Path) -> Result<()> {
    use std::fs::{self, OpenOptions};
    use std::io::{ErrorKind, Write};

    // Create parent directory with restrictive permissions (0o700)
    if let Some(parent) = path.parent() {
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            let mut builder = fs::DirBuilder::new();
            builder.mode(0o700).recursive(true);
            builder.create(parent)?;
        }
        #[cfg(not(unix))]
        {
            fs::create_dir_all(parent)?;
        }
    }

    let pid = std::process::id();

    // Atomically create file only if it doesn't exist (eliminates TOCTOU race)
    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let existing_pid = fs::read_to_string(path).unwrap_or_else(|_| "unknown".to_owned());
            return Err(anyhow::anyhow!(
                "PID file {} already exists with PID: {}. Is another instance running?",
                path.display(),
                existing_pid.trim()
            ));
        }
        Err(e) => return Err(e.into()),
    };

    // Verify the created file is a regular file (not a symlink or other special file)
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(anyhow::anyhow!(
            "PID file {} is not a regular file",
            path.display()
        ));
    }

    write!(file, "{pid}")?;
    tracing::debug!(path = %path.display(), pid, "PID file written");
    Ok(())
}

/// Remove the PID file, logging (not failing) on error.
pub fn remove_pid_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove PID file");
        }
    } else {
        tracing::debug!(path = %path.display(), "PID file removed");
    }
}
