//! ---
//! im_section: "01-core-functionality"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Idle accounting state machine and usage calculation."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
use idlemeter_common::time::MICROS_PER_SECOND;

/// Busy percentage of a completed second: `100 - floor(100 * idle / 1_000_000)`.
///
/// Idle counts above one second are clamped, so the result is always in `0..=100`.
pub fn usage_percent(idle_micros: u32) -> u8 {
    let idle = u64::from(idle_micros.min(MICROS_PER_SECOND));
    let idle_percent = idle * 100 / u64::from(MICROS_PER_SECOND);
    (100 - idle_percent) as u8
}

/// Incremental mean of per-second usage over every completed second except the
/// first one after construction or [`RunningAverage::reset`].
///
/// Measurement never starts on a boundary, so the first second's idle count is
/// partial; it is counted but not averaged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningAverage {
    seconds: u32,
    mean: f64,
}

impl RunningAverage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the usage of the next completed second into the mean.
    pub fn fold(&mut self, usage: u8) {
        self.seconds = self.seconds.saturating_add(1);
        if self.seconds < 2 {
            return;
        }
        let counted = f64::from(self.seconds - 1);
        self.mean = (f64::from(usage) + self.mean * (counted - 1.0)) / counted;
    }

    /// Current mean; 0 until two seconds have completed.
    pub fn value(&self) -> f64 {
        self.mean
    }

    /// Seconds completed since construction or the last reset.
    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_is_floor_of_idle_share() {
        assert_eq!(usage_percent(0), 100);
        assert_eq!(usage_percent(1_000_000), 0);
        assert_eq!(usage_percent(500_000), 50);
        // 100 * 999_999 / 1e6 floors to 99
        assert_eq!(usage_percent(999_999), 1);
        assert_eq!(usage_percent(9_999), 100);
        assert_eq!(usage_percent(10_000), 99);
    }

    #[test]
    fn usage_clamps_oversized_idle() {
        assert_eq!(usage_percent(u32::MAX), 0);
    }

    #[test]
    fn first_second_is_not_averaged() {
        let mut avg = RunningAverage::new();
        avg.fold(10);
        assert_eq!(avg.seconds(), 1);
        assert_eq!(avg.value(), 0.0);
        avg.fold(40);
        assert_eq!(avg.value(), 40.0);
        avg.fold(60);
        assert!((avg.value() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn mean_matches_arithmetic_mean_of_later_seconds() {
        let samples = [97u8, 3, 55, 21, 100, 0, 42, 77];
        let mut avg = RunningAverage::new();
        for usage in samples {
            avg.fold(usage);
        }
        let expected = samples[1..].iter().map(|&u| f64::from(u)).sum::<f64>()
            / (samples.len() - 1) as f64;
        assert!((avg.value() - expected).abs() < 1e-9);
        assert_eq!(avg.seconds(), samples.len() as u32);
    }

    #[test]
    fn reset_restarts_warmup() {
        let mut avg = RunningAverage::new();
        for usage in [20, 30, 40] {
            avg.fold(usage);
        }
        avg.reset();
        assert_eq!(avg.value(), 0.0);
        assert_eq!(avg.seconds(), 0);
        avg.fold(80);
        assert_eq!(avg.value(), 0.0);
        avg.fold(70);
        assert_eq!(avg.value(), 70.0);
    }
}
