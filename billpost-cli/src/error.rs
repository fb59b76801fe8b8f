//! CLI-specific error types and exit code mapping

use billpost_core::error::BillpostError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Cannot connect to the daemon (e.g., for `status`).
    #[error("daemon not reachable: {0}")]
    #[allow(dead_code)] // Reserved for future use with daemon health API
    DaemonUnavailable(String),

    /// A lifecycle flow step failed (non-zero exit for scripting).
    #[error("flow step '{step}' failed: {reason}")]
    Flow {
        /// The step that failed (e.g., "assign bills").
        step: String,
        /// Failure detail.
        reason: String,
    },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from billpost-core.
    #[error("{0}")]
    Core(#[from] BillpostError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                         |
    /// |------|---------------------------------|
    /// | 0    | Success                         |
    /// | 1    | General / command error         |
    /// | 2    | Configuration error             |
    /// | 3    | Daemon unreachable              |
    /// | 4    | Flow step failed                |
    /// | 10   | IO error                        |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::DaemonUnavailable(_) => 3,
            Self::Flow { .. } => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<billpost_auth::AuthGuardError> for CliError {
    fn from(e: billpost_auth::AuthGuardError) -> Self {
        Self::Core(e.into())
    }
}

impl From<billpost_dispatch::DispatchError> for CliError {
    fn from(e: billpost_dispatch::DispatchError) -> Self {
        Self::Core(e.into())
    }
}

impl From<billpost_report::ReportGenError> for CliError {
    fn from(e: billpost_report::ReportGenError) -> Self {
        Self::Core(e.into())
    }
}
