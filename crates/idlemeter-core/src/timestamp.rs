//! ---
//! im_section: "01-core-functionality"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Idle accounting state machine and usage calculation."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
//! Modular arithmetic over the 32-bit microsecond counter.
//!
//! A [`Timestamp`] is never an absolute epoch. Only forward distances between
//! two readings and positions relative to second boundaries carry meaning, and
//! both are computed modulo 2^32 here rather than through raw integer overflow.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of distinct counter values; the counter returns to 0 after this many
/// microseconds (about 4294.97 s).
pub const WRAP_PERIOD_MICROS: u64 = 1 << 32;

/// Reading of the free-running microsecond counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u32);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    pub const fn from_micros(micros: u32) -> Self {
        Self(micros)
    }

    pub const fn as_micros(self) -> u32 {
        self.0
    }

    /// Forward distance from `earlier` to `self`.
    ///
    /// When the counter went through zero in between, `self` is numerically
    /// smaller and both operands are lifted by 2^32 relative to each other before
    /// subtracting. Distances of 2^32 or more cannot be represented and alias to
    /// their remainder.
    pub fn wrapping_since(self, earlier: Timestamp) -> u32 {
        let later = u64::from(self.0);
        let earlier = u64::from(earlier.0);
        let distance = if later < earlier {
            later + WRAP_PERIOD_MICROS - earlier
        } else {
            later - earlier
        };
        // distance < 2^32 on both branches
        distance as u32
    }

    /// The instant `micros` after `self`, wrapping through zero.
    pub fn offset_by(self, micros: u32) -> Timestamp {
        let sum = (u64::from(self.0) + u64::from(micros)) % WRAP_PERIOD_MICROS;
        Timestamp(sum as u32)
    }

    /// True when reaching `self` from `earlier` required passing through zero.
    pub fn wrapped_since(self, earlier: Timestamp) -> bool {
        self.0 < earlier.0
    }

    /// Wraparound-safe "now is at or past target" test.
    ///
    /// Valid while the two readings are less than 2^31 us (about 35 minutes)
    /// apart, which covers any single idle quantum by a wide margin.
    pub fn has_reached(self, target: Timestamp) -> bool {
        self.wrapping_since(target) < (1 << 31)
    }
}

impl From<u32> for Timestamp {
    fn from(micros: u32) -> Self {
        Self(micros)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_without_wrap_is_plain_difference() {
        let earlier = Timestamp::from_micros(1_000);
        let later = Timestamp::from_micros(1_250);
        assert_eq!(later.wrapping_since(earlier), 250);
        assert!(!later.wrapped_since(earlier));
    }

    #[test]
    fn distance_across_wrap_is_forward_distance() {
        let previous_stop = Timestamp::from_micros(4_294_967_200);
        let start = Timestamp::from_micros(150);
        assert_eq!(start.wrapping_since(previous_stop), 96 + 150);
        assert!(start.wrapped_since(previous_stop));
    }

    #[test]
    fn distance_to_self_is_zero() {
        let ts = Timestamp::from_micros(u32::MAX);
        assert_eq!(ts.wrapping_since(ts), 0);
    }

    #[test]
    fn offset_wraps_through_zero() {
        let ts = Timestamp::from_micros(u32::MAX - 49);
        assert_eq!(ts.offset_by(100), Timestamp::from_micros(50));
        assert_eq!(ts.offset_by(49), Timestamp::from_micros(u32::MAX));
    }

    #[test]
    fn has_reached_survives_wrap() {
        let target = Timestamp::from_micros(20);
        assert!(!Timestamp::from_micros(u32::MAX - 80).has_reached(target));
        assert!(!Timestamp::from_micros(19).has_reached(target));
        assert!(Timestamp::from_micros(20).has_reached(target));
        assert!(Timestamp::from_micros(21).has_reached(target));
    }

    #[test]
    fn display_carries_unit() {
        assert_eq!(Timestamp::from_micros(42).to_string(), "42us");
    }
}
