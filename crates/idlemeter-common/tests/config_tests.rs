//! ---
//! im_section: "01-core-functionality"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Shared primitives and utilities for the meter runtime."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
use std::fs;

use anyhow::Result;
use idlemeter_common::config::AppConfig;
use idlemeter_common::logging::{init_tracing, LogFormat};
use idlemeter_common::LoggingConfig;
use tempfile::tempdir;

#[test]
fn first_existing_candidate_wins() -> Result<()> {
    let dir = tempdir()?;
    let missing = dir.path().join("missing.toml");
    let present = dir.path().join("idlemeter.toml");
    fs::write(&present, "[meter]\nname = \"conveyor\"\nquantum_us = 50\n")?;

    let loaded = AppConfig::load_with_source(&[&missing, &present])?;
    assert_eq!(loaded.source, present);
    assert_eq!(loaded.config.meter.name, "conveyor");
    assert_eq!(loaded.config.meter.quantum_micros(), 50);
    Ok(())
}

#[test]
fn missing_candidates_are_listed_in_error() -> Result<()> {
    let dir = tempdir()?;
    let a = dir.path().join("a.toml");
    let b = dir.path().join("b.toml");
    let err = AppConfig::load(&[&a, &b]).expect_err("nothing to load");
    let message = err.to_string();
    assert!(message.contains("a.toml"));
    assert!(message.contains("b.toml"));
    Ok(())
}

#[test]
fn invalid_file_reports_its_path() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[meter]\nquantum_us = 7\n")?;
    let err = AppConfig::load(&[&path]).expect_err("7us does not divide 1ms");
    assert!(format!("{err:#}").contains("divide one millisecond"));
    Ok(())
}

#[test]
fn tracing_initialises_with_file_sink() -> Result<()> {
    let dir = tempdir()?;
    let config = LoggingConfig {
        directory: dir.path().join("logs"),
        format: LogFormat::Pretty,
        file_prefix: Some("bench".into()),
        ..LoggingConfig::default()
    };
    init_tracing("idlemeter-test", &config)?;
    assert!(config.directory.is_dir());
    Ok(())
}

#[test]
fn stdout_only_logging_creates_no_directory() -> Result<()> {
    let dir = tempdir()?;
    let config = LoggingConfig {
        directory: dir.path().join("unused"),
        file_sink: false,
        ..LoggingConfig::default()
    };
    init_tracing("idlemeter-test", &config)?;
    assert!(!config.directory.exists());
    Ok(())
}
