//! ---
//! im_section: "01-core-functionality"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Idle accounting state machine and usage calculation."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
//! Idle-time accounting for control loops that only have a free-running,
//! wrapping 32-bit microsecond counter to go by.
//!
//! A loop declares idle time by calling [`IdleMeter::wait_idle_quantum`] or
//! [`IdleMeter::wait_idle_milliseconds`]; everything between those calls is
//! counted as busy. Each completed second yields a usage percentage and feeds a
//! running average that skips the first, necessarily partial, second.
//!
//! Interrupt service time that preempts an idle busy-wait is counted as idle.

pub mod boundary;
pub mod clock;
pub mod error;
pub mod meter;
pub mod timestamp;
pub mod usage;

pub use boundary::{split_at_boundary, BoundaryShift, BoundarySplit};
pub use clock::{MicrosClock, SimulatedClock, SystemClock};
pub use error::{MeterError, Result};
pub use meter::{IdleMeter, UsageSnapshot};
pub use timestamp::Timestamp;
pub use usage::{usage_percent, RunningAverage};
