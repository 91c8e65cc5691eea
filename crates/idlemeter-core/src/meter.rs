//! ---
//! im_section: "01-core-functionality"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Idle accounting state machine and usage calculation."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
use idlemeter_common::config::MeterConfig;
use idlemeter_common::time::{MICROS_PER_MILLISECOND, MICROS_PER_SECOND};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::boundary::{split_at_boundary, BoundaryShift, BoundarySplit};
use crate::clock::MicrosClock;
use crate::error::{MeterError, Result};
use crate::timestamp::Timestamp;
use crate::usage::{usage_percent, RunningAverage};

/// Point-in-time copy of the meter's read-only counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub meter: String,
    pub usage_last_second: u8,
    pub usage_average: f64,
    pub seconds_completed: u32,
    pub seconds_total: u64,
    pub idle_micros_last_second: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attribution {
    Busy,
    Idle,
}

/// Busy/idle accountant for a single control loop.
///
/// Time between idle declarations is busy; each declared quantum is idle. The
/// meter has exactly one owner and is advanced only through `&mut self`.
#[derive(Debug)]
pub struct IdleMeter<C> {
    clock: C,
    name: String,
    quantum: u32,
    quanta_per_ms: u32,
    previous_stop: Timestamp,
    shift: BoundaryShift,
    idle_current: u32,
    idle_last: u32,
    usage_last: u8,
    average: RunningAverage,
    seconds_total: u64,
}

impl<C: MicrosClock> IdleMeter<C> {
    /// Build a meter and anchor its first measurement window at `clock.now()`.
    pub fn new(clock: C, config: &MeterConfig) -> Result<Self> {
        let quantum_us = config.quantum_micros();
        let per_ms = u64::from(MICROS_PER_MILLISECOND);
        if quantum_us == 0 || quantum_us > per_ms {
            return Err(MeterError::QuantumOutOfRange { quantum_us });
        }
        if per_ms % quantum_us != 0 {
            return Err(MeterError::QuantumNotDivisor { quantum_us });
        }
        let quantum = quantum_us as u32;
        let previous_stop = clock.now();
        debug!(meter = %config.name, quantum_us = quantum, anchor = %previous_stop, "idle meter created");
        Ok(Self {
            clock,
            name: config.name.clone(),
            quantum,
            quanta_per_ms: MICROS_PER_MILLISECOND / quantum,
            previous_stop,
            shift: BoundaryShift::default(),
            idle_current: 0,
            idle_last: 0,
            usage_last: 0,
            average: RunningAverage::new(),
            seconds_total: 0,
        })
    }

    /// Declare one idle quantum and busy-wait until it has elapsed.
    ///
    /// The quantum is accounted before waiting; any overshoot of the wait shows
    /// up as busy time in the next call.
    pub fn wait_idle_quantum(&mut self) {
        let start = self.clock.now();
        let stop = self.record_idle_quantum_at(start);
        while !self.clock.now().has_reached(stop) {
            std::hint::spin_loop();
        }
    }

    /// Spend roughly `millis` milliseconds in declared idle quanta.
    ///
    /// Only the recorded quanta are guaranteed; wall time may run longer.
    pub fn wait_idle_milliseconds(&mut self, millis: u32) {
        for _ in 0..millis {
            for _ in 0..self.quanta_per_ms {
                self.wait_idle_quantum();
            }
        }
    }

    /// Account busy time up to `clock.now()` without declaring idle time.
    ///
    /// Lets a loop that never idles still close its seconds, however long it
    /// stayed busy. Does nothing while the most recent quantum has not yet
    /// elapsed, i.e. while its stop lies at most one quantum ahead of `now`.
    pub fn refresh(&mut self) {
        let now = self.clock.now();
        if !self.quantum_pending_at(now) {
            self.account_busy_until(now);
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C> IdleMeter<C> {
    /// Record that the quantum starting at `start` is idle, without waiting.
    ///
    /// Everything since the previous stop is counted as busy first. Returns the
    /// instant the quantum ends. `start` must not precede the previous stop.
    pub fn record_idle_quantum_at(&mut self, start: Timestamp) -> Timestamp {
        self.account_busy_until(start);

        let stop = start.offset_by(self.quantum);
        let position = self.shift.position_in_second(start);
        self.distribute(position, self.quantum, Attribution::Idle);
        if stop.wrapped_since(start) {
            self.note_wrap();
        }
        self.previous_stop = stop;
        trace!(meter = %self.name, start = %start, stop = %stop, "idle quantum recorded");
        stop
    }

    /// Count everything from the previous stop up to `until` as busy.
    pub fn account_busy_until(&mut self, until: Timestamp) {
        let gap = until.wrapping_since(self.previous_stop);
        let position = self.shift.position_in_second(self.previous_stop);
        if until.wrapped_since(self.previous_stop) {
            self.note_wrap();
        }
        self.distribute(position, gap, Attribution::Busy);
        self.previous_stop = until;
    }

    /// Usage of the most recently completed second, in `0..=100`.
    pub fn usage_last_second(&self) -> u8 {
        self.usage_last
    }

    /// Mean usage over completed seconds, excluding the first after a reset.
    /// Reads 0 until two seconds have completed.
    pub fn usage_average(&self) -> f64 {
        self.average.value()
    }

    /// Restart the running average. The second in progress is unaffected.
    pub fn reset_average(&mut self) {
        self.average.reset();
        info!(meter = %self.name, "usage average reset");
    }

    /// Seconds completed since construction or the last average reset.
    pub fn seconds_completed(&self) -> u32 {
        self.average.seconds()
    }

    /// Seconds completed since construction, unaffected by resets.
    pub fn seconds_total(&self) -> u64 {
        self.seconds_total
    }

    pub fn idle_micros_last_second(&self) -> u32 {
        self.idle_last
    }

    pub fn idle_micros_current_second(&self) -> u32 {
        self.idle_current
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantum_micros(&self) -> u32 {
        self.quantum
    }

    pub fn quanta_per_millisecond(&self) -> u32 {
        self.quanta_per_ms
    }

    /// End of the most recent measurement window.
    pub fn previous_stop(&self) -> Timestamp {
        self.previous_stop
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            meter: self.name.clone(),
            usage_last_second: self.usage_last,
            usage_average: self.average.value(),
            seconds_completed: self.average.seconds(),
            seconds_total: self.seconds_total,
            idle_micros_last_second: self.idle_last,
        }
    }

    fn quantum_pending_at(&self, now: Timestamp) -> bool {
        let ahead = self.previous_stop.wrapping_since(now);
        ahead != 0 && ahead <= self.quantum
    }

    fn distribute(&mut self, position: u32, micros: u32, attribution: Attribution) {
        let idle = attribution == Attribution::Idle;
        match split_at_boundary(position, micros) {
            BoundarySplit::Within { micros } => {
                if idle {
                    self.idle_current += micros;
                }
            }
            BoundarySplit::Crossing {
                head,
                whole_seconds,
                remainder,
            } => {
                if idle {
                    self.idle_current += head;
                }
                self.close_second();
                for _ in 0..whole_seconds {
                    if idle {
                        self.idle_current = MICROS_PER_SECOND;
                    }
                    self.close_second();
                }
                // busy remainder carries no idle time into the new second
                if idle {
                    self.idle_current = remainder;
                }
            }
        }
    }

    fn close_second(&mut self) {
        self.idle_last = self.idle_current.min(MICROS_PER_SECOND);
        self.idle_current = 0;
        self.usage_last = usage_percent(self.idle_last);
        self.average.fold(self.usage_last);
        self.seconds_total += 1;
        debug!(
            meter = %self.name,
            second = self.seconds_total,
            idle_us = self.idle_last,
            usage = self.usage_last,
            average = self.average.value(),
            "second completed"
        );
    }

    fn note_wrap(&mut self) {
        self.shift.record_wrap();
        debug!(meter = %self.name, shift_us = self.shift.micros(), "microsecond counter wrapped");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::clock::SimulatedClock;

    fn config(quantum_us: u64) -> MeterConfig {
        MeterConfig {
            name: "unit".into(),
            quantum: Duration::from_micros(quantum_us),
        }
    }

    fn meter_at(start: u32) -> IdleMeter<SimulatedClock> {
        IdleMeter::new(SimulatedClock::new(start), &config(100)).expect("valid quantum")
    }

    #[test]
    fn rejects_quantum_outside_range() {
        let err = IdleMeter::new(SimulatedClock::new(0), &config(0)).expect_err("zero quantum");
        assert_eq!(err, MeterError::QuantumOutOfRange { quantum_us: 0 });
        let err = IdleMeter::new(SimulatedClock::new(0), &config(1_500)).expect_err("too long");
        assert_eq!(err, MeterError::QuantumOutOfRange { quantum_us: 1_500 });
    }

    #[test]
    fn rejects_quantum_not_dividing_millisecond() {
        let err = IdleMeter::new(SimulatedClock::new(0), &config(300)).expect_err("300us");
        assert_eq!(err, MeterError::QuantumNotDivisor { quantum_us: 300 });
    }

    #[test]
    fn anchors_at_construction_time() {
        let meter = meter_at(12_345);
        assert_eq!(meter.previous_stop(), Timestamp::from_micros(12_345));
        assert_eq!(meter.quanta_per_millisecond(), 10);
        assert_eq!(meter.usage_last_second(), 0);
        assert_eq!(meter.usage_average(), 0.0);
    }

    #[test]
    fn quantum_inside_second_accumulates_idle() {
        let mut meter = meter_at(0);
        let stop = meter.record_idle_quantum_at(Timestamp::from_micros(500));
        assert_eq!(stop, Timestamp::from_micros(600));
        assert_eq!(meter.idle_micros_current_second(), 100);
        assert_eq!(meter.seconds_completed(), 0);
    }

    #[test]
    fn quantum_straddling_boundary_is_split() {
        let mut meter = meter_at(999_000);
        meter.record_idle_quantum_at(Timestamp::from_micros(999_960));
        assert_eq!(meter.seconds_completed(), 1);
        assert_eq!(meter.idle_micros_last_second(), 40);
        assert_eq!(meter.idle_micros_current_second(), 60);
    }

    #[test]
    fn busy_gap_discards_remainder() {
        let mut meter = meter_at(0);
        meter.record_idle_quantum_at(Timestamp::from_micros(0));
        meter.account_busy_until(Timestamp::from_micros(1_200_000));
        assert_eq!(meter.seconds_completed(), 1);
        assert_eq!(meter.idle_micros_last_second(), 100);
        assert_eq!(meter.idle_micros_current_second(), 0);
    }

    #[test]
    fn long_busy_gap_closes_full_seconds_at_full_usage() {
        let mut meter = meter_at(0);
        meter.record_idle_quantum_at(Timestamp::from_micros(3_500_000));
        assert_eq!(meter.seconds_completed(), 3);
        assert_eq!(meter.usage_last_second(), 100);
        assert_eq!(meter.usage_average(), 100.0);
        assert_eq!(meter.idle_micros_current_second(), 100);
    }

    #[test]
    fn wrap_in_busy_gap_is_measured_forward() {
        let mut meter = meter_at(4_294_967_200);
        meter.record_idle_quantum_at(Timestamp::from_micros(150));
        assert_eq!(meter.seconds_completed(), 0);
        assert_eq!(meter.idle_micros_current_second(), 100);
        assert_eq!(meter.previous_stop(), Timestamp::from_micros(250));
    }

    #[test]
    fn refresh_waits_for_pending_quantum() {
        let clock = SimulatedClock::new(0);
        let mut meter = IdleMeter::new(clock.clone(), &config(100)).expect("valid quantum");
        meter.record_idle_quantum_at(Timestamp::from_micros(999_950));
        clock.set(999_960);
        meter.refresh();
        assert_eq!(meter.previous_stop(), Timestamp::from_micros(1_000_050));
        clock.set(2_000_100);
        meter.refresh();
        assert_eq!(meter.seconds_completed(), 2);
        assert_eq!(meter.usage_last_second(), 100);
    }

    #[test]
    fn refresh_closes_seconds_after_very_long_busy_stretch() {
        let clock = SimulatedClock::new(0);
        let mut meter = IdleMeter::new(clock.clone(), &config(100)).expect("valid quantum");
        // beyond 2^31 us, where a "has reached" comparison turns ambiguous
        clock.set(3_000_000_000);
        meter.refresh();
        assert_eq!(meter.seconds_completed(), 3_000);
        assert_eq!(meter.usage_last_second(), 100);
        assert_eq!(meter.usage_average(), 100.0);
        assert_eq!(meter.previous_stop(), Timestamp::from_micros(3_000_000_000));
    }

    #[test]
    fn refresh_after_long_stretch_across_wrap() {
        let clock = SimulatedClock::new(4_000_000_000);
        let mut meter = IdleMeter::new(clock.clone(), &config(100)).expect("valid quantum");
        // 3_294_967_296us later, through zero
        clock.set(3_000_000_000);
        meter.refresh();
        assert_eq!(meter.seconds_total(), 3_294);
        assert_eq!(meter.usage_last_second(), 100);
    }

    #[test]
    fn snapshot_mirrors_counters() {
        let mut meter = meter_at(0);
        meter.record_idle_quantum_at(Timestamp::from_micros(999_900));
        let snapshot = meter.snapshot();
        assert_eq!(snapshot.meter, "unit");
        assert_eq!(snapshot.seconds_completed, 1);
        assert_eq!(snapshot.seconds_total, 1);
        assert_eq!(snapshot.idle_micros_last_second, 100);
        assert_eq!(snapshot.usage_last_second, 100);
    }
}
