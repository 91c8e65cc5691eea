//! ---
//! im_section: "01-core-functionality"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Shared primitives and utilities for the meter runtime."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
use std::time::{Duration, Instant};

/// Microseconds in one accounting second.
pub const MICROS_PER_SECOND: u32 = 1_000_000;

/// Microseconds in one millisecond.
pub const MICROS_PER_MILLISECOND: u32 = 1_000;

/// Capture an instant suitable for clock anchoring.
pub fn monotonic_now() -> Instant {
    Instant::now()
}

/// Convert a duration into microseconds, saturating at `u64::MAX`.
pub fn duration_to_micros(duration: Duration) -> u64 {
    duration
        .as_secs()
        .saturating_mul(1_000_000)
        .saturating_add(u64::from(duration.subsec_micros()))
}

/// Reduce a wide microsecond count to the 32-bit free-running counter value,
/// i.e. the count modulo 2^32.
pub fn to_counter_micros(micros: u64) -> u32 {
    (micros & u64::from(u32::MAX)) as u32
}
