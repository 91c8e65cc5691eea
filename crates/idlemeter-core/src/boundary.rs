//! ---
//! im_section: "01-core-functionality"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Idle accounting state machine and usage calculation."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
//! Second-boundary bookkeeping.
//!
//! Seconds are laid out on the counter's own timeline, starting at counter
//! value 0. Because 2^32 is not a multiple of 1_000_000, every wrap moves the
//! boundaries relative to the raw counter; [`BoundaryShift`] carries that
//! offset. Only wraps seen between two consecutive readings are counted, so a
//! single interval of 2^32 us or more loses whole wrap periods.

use idlemeter_common::time::MICROS_PER_SECOND;

use crate::timestamp::{Timestamp, WRAP_PERIOD_MICROS};

/// Boundary movement per counter wrap: 1_000_000 - (2^32 mod 1_000_000).
pub const WRAP_BOUNDARY_SHIFT_MICROS: u32 =
    MICROS_PER_SECOND - (WRAP_PERIOD_MICROS % MICROS_PER_SECOND as u64) as u32;

/// Cumulative boundary correction, kept modulo one second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundaryShift {
    micros: u32,
}

impl BoundaryShift {
    pub fn micros(&self) -> u32 {
        self.micros
    }

    /// Account for one observed pass of the counter through zero.
    pub fn record_wrap(&mut self) {
        self.micros = (self.micros + WRAP_BOUNDARY_SHIFT_MICROS) % MICROS_PER_SECOND;
    }

    /// Offset of `ts` from the start of the second it falls in, in `0..1_000_000`.
    pub fn position_in_second(&self, ts: Timestamp) -> u32 {
        let second = u64::from(MICROS_PER_SECOND);
        let shifted = u64::from(ts.as_micros()) + second - u64::from(self.micros);
        (shifted % second) as u32
    }
}

/// How an interval starting at some position in the current second lands on
/// the boundaries that follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundarySplit {
    /// The interval ends before the next boundary.
    Within { micros: u32 },
    /// The interval reaches the next boundary: `head` us finish the current
    /// second, `whole_seconds` complete seconds follow, and `remainder` us land
    /// in the second that is open afterwards.
    Crossing {
        head: u32,
        whole_seconds: u32,
        remainder: u32,
    },
}

/// Distribute `gap` microseconds starting `position` us into the current second.
///
/// An interval that ends exactly on the boundary closes the current second.
pub fn split_at_boundary(position: u32, gap: u32) -> BoundarySplit {
    debug_assert!(position < MICROS_PER_SECOND);
    let to_boundary = MICROS_PER_SECOND - position;
    if gap < to_boundary {
        return BoundarySplit::Within { micros: gap };
    }
    let rest = gap - to_boundary;
    BoundarySplit::Crossing {
        head: to_boundary,
        whole_seconds: rest / MICROS_PER_SECOND,
        remainder: rest % MICROS_PER_SECOND,
    }
}
