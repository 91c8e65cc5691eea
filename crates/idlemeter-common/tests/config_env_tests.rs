//! ---
//! im_section: "01-core-functionality"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Shared primitives and utilities for the meter runtime."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
use std::env;
use std::fs;

use anyhow::Result;
use idlemeter_common::config::AppConfig;
use tempfile::tempdir;

#[test]
fn env_override_takes_precedence_over_candidates() -> Result<()> {
    let dir = tempdir()?;
    let candidate = dir.path().join("candidate.toml");
    let override_path = dir.path().join("override.toml");
    fs::write(&candidate, "[meter]\nname = \"candidate\"\n")?;
    fs::write(&override_path, "[meter]\nname = \"override\"\n")?;

    env::set_var(AppConfig::ENV_CONFIG_PATH, &override_path);
    let loaded = AppConfig::load_with_source(&[&candidate]);
    env::remove_var(AppConfig::ENV_CONFIG_PATH);

    let loaded = loaded?;
    assert_eq!(loaded.source, override_path);
    assert_eq!(loaded.config.meter.name, "override");
    Ok(())
}
