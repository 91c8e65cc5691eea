//! ---
//! im_section: "01-core-functionality"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Shared primitives and utilities for the meter runtime."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::daily;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, LoggingConfig};

const LOG_ENV: &str = "IDLEMETER_LOG";

static GUARDS: OnceCell<Vec<WorkerGuard>> = OnceCell::new();

/// Available log formats for stdout output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    #[default]
    StructuredJson,
    Pretty,
}

/// Pick the active filter: `IDLEMETER_LOG`, then `RUST_LOG`, then the
/// configured levels. A malformed directive is an error, not a silent fallback.
fn resolve_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let (directive, source) = match std::env::var(LOG_ENV) {
        Ok(directive) => (directive, LOG_ENV),
        Err(_) => match std::env::var(EnvFilter::DEFAULT_ENV) {
            Ok(directive) => (directive, EnvFilter::DEFAULT_ENV),
            Err(_) => (config.directive(), "[logging] levels"),
        },
    };
    EnvFilter::try_new(&directive)
        .with_context(|| format!("invalid log filter '{directive}' from {source}"))
}

/// Install the global subscriber for `service_name`.
///
/// Stdout gets JSON or pretty output per `config.format`; with `file_sink` a
/// daily rolling JSON file named `<prefix>-<service>.log` is kept under
/// `config.directory`. Only the first call installs a subscriber.
pub fn init_tracing(service_name: &str, config: &LoggingConfig) -> Result<()> {
    let filter = resolve_filter(config)?;
    let mut guards = Vec::with_capacity(2);

    let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(stdout_guard);
    let stdout_layer = match config.format {
        LogFormat::StructuredJson => fmt::layer()
            .with_target(false)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .json()
            .with_writer(stdout_writer)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_writer(stdout_writer)
            .boxed(),
    };

    let file_layer = if config.file_sink {
        std::fs::create_dir_all(&config.directory).with_context(|| {
            format!("unable to create log directory {}", config.directory.display())
        })?;
        let prefix = config.file_prefix.as_deref().unwrap_or(service_name);
        let appender = daily(&config.directory, format!("{prefix}-{service_name}.log"));
        let (file_writer, file_guard) = tracing_appender::non_blocking(appender);
        guards.push(file_guard);
        Some(
            fmt::layer()
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .json()
                .with_writer(file_writer)
                .boxed(),
        )
    } else {
        None
    };

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .is_ok();
    if installed {
        let _ = GUARDS.set(guards);
    }
    info!(
        service = %service_name,
        installed,
        file_sink = config.file_sink,
        log_dir = %config.directory.display(),
        "tracing initialised"
    );
    Ok(())
}

/// Install tracing for the meter named in `config`, labelling the log file
/// with the meter name and announcing its quantum.
pub fn init_meter_tracing(config: &AppConfig) -> Result<()> {
    init_tracing(&config.meter.name, &config.logging)?;
    info!(
        meter = %config.meter.name,
        quantum_us = config.meter.quantum_micros(),
        directive = %config.logging.directive(),
        "meter logging ready"
    );
    Ok(())
}
