//! ---
//! im_section: "01-core-functionality"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Idle accounting state machine and usage calculation."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use idlemeter_common::time::{duration_to_micros, monotonic_now, to_counter_micros};

use crate::timestamp::Timestamp;

/// Source of the free-running 32-bit microsecond counter.
///
/// Readings are monotonic apart from wrapping to zero after 2^32 - 1. A read is
/// not assumed to be free: whatever it costs shows up as busy time.
pub trait MicrosClock {
    fn now(&self) -> Timestamp;
}

impl<C: MicrosClock + ?Sized> MicrosClock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Host clock: microseconds since construction, truncated to 32 bits.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: monotonic_now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MicrosClock for SystemClock {
    fn now(&self) -> Timestamp {
        let elapsed = duration_to_micros(self.origin.elapsed());
        Timestamp::from_micros(to_counter_micros(elapsed))
    }
}

/// Manually driven counter shared between clones.
///
/// Every [`MicrosClock::now`] call returns the current value and then advances
/// it by the configured read cost, so a busy-wait on this clock terminates and
/// the cost of polling is visible to the meter the way it would be on hardware.
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    inner: Arc<SimulatedState>,
}

#[derive(Debug)]
struct SimulatedState {
    micros: AtomicU32,
    read_cost: u32,
    reads: AtomicU64,
}

impl SimulatedClock {
    /// Clock starting at `start` whose reads are free.
    pub fn new(start: u32) -> Self {
        Self::with_read_cost(start, 0)
    }

    /// Clock starting at `start` that advances `read_cost` us per read.
    pub fn with_read_cost(start: u32, read_cost: u32) -> Self {
        Self {
            inner: Arc::new(SimulatedState {
                micros: AtomicU32::new(start),
                read_cost,
                reads: AtomicU64::new(0),
            }),
        }
    }

    /// Current value without charging a read.
    pub fn peek(&self) -> Timestamp {
        Timestamp::from_micros(self.inner.micros.load(Ordering::SeqCst))
    }

    pub fn set(&self, micros: u32) {
        self.inner.micros.store(micros, Ordering::SeqCst);
    }

    /// Move the counter forward, wrapping through zero.
    pub fn advance(&self, micros: u32) {
        self.inner.micros.fetch_add(micros, Ordering::SeqCst);
    }

    /// Number of `now()` calls served so far.
    pub fn reads(&self) -> u64 {
        self.inner.reads.load(Ordering::SeqCst)
    }
}

impl MicrosClock for SimulatedClock {
    fn now(&self) -> Timestamp {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        let value = self
            .inner
            .micros
            .fetch_add(self.inner.read_cost, Ordering::SeqCst);
        Timestamp::from_micros(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_reads_charge_their_cost() {
        let clock = SimulatedClock::with_read_cost(10, 3);
        assert_eq!(clock.now(), Timestamp::from_micros(10));
        assert_eq!(clock.now(), Timestamp::from_micros(13));
        assert_eq!(clock.peek(), Timestamp::from_micros(16));
        assert_eq!(clock.reads(), 2);
    }

    #[test]
    fn simulated_clock_wraps_and_is_shared() {
        let clock = SimulatedClock::new(u32::MAX - 1);
        let handle = clock.clone();
        handle.advance(5);
        assert_eq!(clock.now(), Timestamp::from_micros(3));
        handle.set(7);
        assert_eq!(clock.peek(), Timestamp::from_micros(7));
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock::new();
        let first = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = clock.now();
        assert!(second.wrapping_since(first) >= 1_000);
    }

    #[test]
    fn references_are_clocks() {
        fn read<C: MicrosClock>(clock: C) -> Timestamp {
            clock.now()
        }
        let clock = SimulatedClock::new(99);
        assert_eq!(read(&clock), Timestamp::from_micros(99));
    }
}
