//! ---
//! im_section: "01-core-functionality"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Idle accounting state machine and usage calculation."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MeterError>;

/// Construction-time failures. Recording and reading never fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeterError {
    #[error("idle quantum of {quantum_us}us is outside 1..=1000us")]
    QuantumOutOfRange { quantum_us: u64 },
    #[error("idle quantum of {quantum_us}us does not divide one millisecond")]
    QuantumNotDivisor { quantum_us: u64 },
}
