//! ---
//! im_section: "03-logging"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Metrics collection utilities."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
use std::sync::Arc;

use anyhow::Result;
use prometheus::{GaugeVec, IntCounterVec, IntGaugeVec, Opts, Registry};
use tracing::debug;

/// Shared registry type used across the workspace.
pub type SharedRegistry = Arc<Registry>;

/// Produce a new shared registry.
pub fn new_registry() -> SharedRegistry {
    Arc::new(Registry::new())
}

/// Gauges and counters mirroring the read-only counters of idle meters,
/// labelled by meter name.
#[derive(Clone, Debug)]
pub struct MeterMetrics {
    registry: SharedRegistry,
    usage_last_second: IntGaugeVec,
    usage_average: GaugeVec,
    seconds_completed: IntCounterVec,
    average_resets: IntCounterVec,
}

impl MeterMetrics {
    pub fn new(registry: SharedRegistry, namespace: &str) -> Result<Self> {
        let usage_last_second = IntGaugeVec::new(
            Opts::new(
                format!("{namespace}_usage_last_second_percent"),
                "Busy percentage of the most recently completed second",
            ),
            &["meter"],
        )?;
        registry.register(Box::new(usage_last_second.clone()))?;

        let usage_average = GaugeVec::new(
            Opts::new(
                format!("{namespace}_usage_average_percent"),
                "Running mean of per-second busy percentage, first second excluded",
            ),
            &["meter"],
        )?;
        registry.register(Box::new(usage_average.clone()))?;

        let seconds_completed = IntCounterVec::new(
            Opts::new(
                format!("{namespace}_seconds_completed_total"),
                "Seconds closed out by the meter",
            ),
            &["meter"],
        )?;
        registry.register(Box::new(seconds_completed.clone()))?;

        let average_resets = IntCounterVec::new(
            Opts::new(
                format!("{namespace}_average_resets_total"),
                "Number of times the running average was reset",
            ),
            &["meter"],
        )?;
        registry.register(Box::new(average_resets.clone()))?;

        debug!(namespace, "meter metrics registered");
        Ok(Self {
            registry,
            usage_last_second,
            usage_average,
            seconds_completed,
            average_resets,
        })
    }

    pub fn registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    /// Publish the latest readings; `newly_completed` is the number of seconds
    /// closed since the previous call.
    pub fn observe(&self, meter: &str, usage: u8, average: f64, newly_completed: u64) {
        self.usage_last_second
            .with_label_values(&[meter])
            .set(i64::from(usage));
        self.usage_average.with_label_values(&[meter]).set(average);
        self.seconds_completed
            .with_label_values(&[meter])
            .inc_by(newly_completed);
    }

    pub fn record_reset(&self, meter: &str) {
        self.average_resets.with_label_values(&[meter]).inc();
        self.usage_average.with_label_values(&[meter]).set(0.0);
    }
}

pub use prometheus;

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(registry: &Registry, name: &str) -> f64 {
        let family = registry
            .gather()
            .into_iter()
            .find(|family| family.get_name() == name)
            .expect("metric family registered");
        let metric = &family.get_metric()[0];
        if metric.has_gauge() {
            metric.get_gauge().get_value()
        } else {
            metric.get_counter().get_value()
        }
    }

    #[test]
    fn observe_updates_all_series() {
        let registry = new_registry();
        let metrics = MeterMetrics::new(registry.clone(), "idlemeter").unwrap();
        metrics.observe("main-loop", 42, 37.5, 3);
        metrics.observe("main-loop", 40, 38.0, 1);

        assert_eq!(sample(&registry, "idlemeter_usage_last_second_percent"), 40.0);
        assert_eq!(sample(&registry, "idlemeter_usage_average_percent"), 38.0);
        assert_eq!(sample(&registry, "idlemeter_seconds_completed_total"), 4.0);
    }

    #[test]
    fn reset_zeroes_average_and_counts() {
        let registry = new_registry();
        let metrics = MeterMetrics::new(registry.clone(), "plant").unwrap();
        metrics.observe("pump", 10, 12.0, 1);
        metrics.record_reset("pump");

        assert_eq!(sample(&registry, "plant_usage_average_percent"), 0.0);
        assert_eq!(sample(&registry, "plant_average_resets_total"), 1.0);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = new_registry();
        let _first = MeterMetrics::new(registry.clone(), "dup").unwrap();
        assert!(MeterMetrics::new(registry, "dup").is_err());
    }
}
