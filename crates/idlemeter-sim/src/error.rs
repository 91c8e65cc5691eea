//! ---
//! im_section: "11-simulation"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Simulation harness helpers and load engines."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
use idlemeter_core::MeterError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimulationError>;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("busy percentage {0} is outside 0..=100")]
    PercentOutOfRange(u8),
    #[error("busy jitter of {0}us is not a valid standard deviation")]
    InvalidJitter(f64),
    #[error("simulated clock read cost of {0}us exceeds one millisecond")]
    ReadCostTooLarge(u32),
    #[error("load schedule is empty")]
    NoSeconds,
    #[error("meter error: {0}")]
    Meter(#[from] MeterError),
    #[error("metrics error: {0}")]
    Metrics(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
