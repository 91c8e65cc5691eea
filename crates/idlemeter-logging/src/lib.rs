//! ---
//! im_section: "03-logging"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Structured logging adapters and sinks."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
//! Baseline subscriber and context-enriched logging macros for idlemeter callers.
#![warn(missing_docs)]

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

#[doc(hidden)]
pub use tracing;

/// Initialize a baseline tracing subscriber suitable for development and tests.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer())
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone)]
pub struct MeterLogContext<'a> {
    /// Name of the meter the event relates to.
    pub meter: Option<&'a str>,
    /// Completed-second index, when the event is tied to one.
    pub second: Option<u64>,
    /// Idle quantum length in microseconds.
    pub quantum_us: Option<u32>,
    /// Load profile or scenario label driving the meter.
    pub profile: Option<&'a str>,
}

impl<'a> MeterLogContext<'a> {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a meter name.
    pub fn with_meter(mut self, meter: &'a str) -> Self {
        self.meter = Some(meter);
        self
    }

    /// Attach a completed-second index.
    pub fn with_second(mut self, second: u64) -> Self {
        self.second = Some(second);
        self
    }

    /// Attach the idle quantum length.
    pub fn with_quantum(mut self, quantum_us: u32) -> Self {
        self.quantum_us = Some(quantum_us);
        self
    }

    /// Attach a profile label.
    pub fn with_profile(mut self, profile: &'a str) -> Self {
        self.profile = Some(profile);
        self
    }
}

/// High-level outcome used when emitting lifecycle log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEventOutcome {
    /// The operation completed successfully.
    Success,
    /// The operation failed or was aborted.
    Fault,
}

impl SystemEventOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            SystemEventOutcome::Success => "success",
            SystemEventOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized lifecycle event with a success/fault outcome.
pub fn log_system_event(
    context: Option<&MeterLogContext>,
    event: &str,
    message: &str,
    outcome: SystemEventOutcome,
) {
    let default_ctx = MeterLogContext::default();
    let ctx = context.unwrap_or(&default_ctx);
    // `tracing::event!` needs a constant level, hence the two arms.
    match outcome {
        SystemEventOutcome::Success => tracing::event!(
            Level::INFO,
            event,
            outcome = outcome.as_str(),
            meter = ctx.meter.unwrap_or(""),
            second = ctx.second.unwrap_or_default(),
            quantum_us = ctx.quantum_us.unwrap_or_default(),
            profile = ctx.profile.unwrap_or(""),
            message = %message
        ),
        SystemEventOutcome::Fault => tracing::event!(
            Level::ERROR,
            event,
            outcome = outcome.as_str(),
            meter = ctx.meter.unwrap_or(""),
            second = ctx.second.unwrap_or_default(),
            quantum_us = ctx.quantum_us.unwrap_or_default(),
            profile = ctx.profile.unwrap_or(""),
            message = %message
        ),
    }
}
