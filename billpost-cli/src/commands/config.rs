//! `billpost config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use billpost_core::config::BillpostConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Check => execute_check(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Execute the config check subcommand.
///
/// Attempts to load and validate the configuration file, reporting any errors.
pub async fn execute_check(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let result = BillpostConfig::load(config_path).await;

    let report = match result {
        Ok(_) => ConfigCheckReport {
            source: config_path.display().to_string(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigCheckReport {
            source: config_path.display().to_string(),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Execute the config show subcommand.
///
/// Loads and displays the effective configuration (file + env overrides +
/// defaults). The accounts file itself is never printed — only its path
/// appears in the `auth` section, so no secret material can leak here.
pub async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = BillpostConfig::load(config_path)
        .await
        .map_err(|e| CliError::Config(e.to_string()))?;

    let report = if let Some(section_name) = section {
        let config_toml = match section_name.as_str() {
            "general" => section_toml(&config.general),
            "auth" => section_toml(&config.auth),
            "dispatch" => section_toml(&config.dispatch),
            "report" => section_toml(&config.report),
            "metrics" => section_toml(&config.metrics),
            other => {
                return Err(CliError::Command(format!(
                    "unknown config section '{other}', expected one of: general, auth, dispatch, report, metrics"
                )));
            }
        };
        ConfigShowReport {
            source: config_path.display().to_string(),
            section: Some(section_name),
            config_toml,
        }
    } else {
        ConfigShowReport {
            source: config_path.display().to_string(),
            section: None,
            config_toml: section_toml(&config),
        }
    };

    writer.render(&report)?;
    Ok(())
}

fn section_toml<T: Serialize>(section: &T) -> String {
    toml::to_string_pretty(section).unwrap_or_else(|e| format!("(serialization error: {e})"))
}

/// Validation result payload.
#[derive(Debug, Serialize)]
pub struct ConfigCheckReport {
    /// Path the configuration was loaded from.
    pub source: String,
    /// Whether the configuration passed validation.
    pub valid: bool,
    /// Validation error messages (empty when valid).
    pub errors: Vec<String>,
}

impl Render for ConfigCheckReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Config: {}", self.source)?;
        if self.valid {
            writeln!(w, "Status: OK")?;
        } else {
            writeln!(w, "Status: INVALID")?;
            for error in &self.errors {
                writeln!(w, "  - {error}")?;
            }
        }
        Ok(())
    }
}

/// Effective-configuration payload.
#[derive(Debug, Serialize)]
pub struct ConfigShowReport {
    /// Path the configuration was loaded from.
    pub source: String,
    /// Selected section, or `None` for the whole file.
    pub section: Option<String>,
    /// Pretty-printed TOML of the effective configuration.
    pub config_toml: String,
}

impl Render for ConfigShowReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Config: {}", self.source)?;
        if let Some(section) = &self.section {
            writeln!(w, "Section: [{section}]")?;
        }
        writeln!(w, "{}", self.config_toml)?;
        Ok(())
    }
}
