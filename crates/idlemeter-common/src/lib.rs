//! ---
//! im_section: "01-core-functionality"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Shared primitives and utilities for the meter runtime."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
//! Core shared primitives for the idlemeter workspace.
//! This crate exposes configuration loading, tracing initialisation, and
//! microsecond time helpers consumed across the workspace.

pub mod config;
pub mod logging;
pub mod time;

pub use config::{
    AppConfig, LoadedAppConfig, LoggingConfig, MeterConfig, MetricsConfig, SimulationConfig,
};
pub use logging::{init_meter_tracing, init_tracing, LogFormat};
pub use time::{MICROS_PER_MILLISECOND, MICROS_PER_SECOND};
