//! ---
//! im_section: "11-simulation"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Simulation harness helpers and load engines."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
use idlemeter_common::config::{AppConfig, MAX_READ_COST_MICROS};
use idlemeter_common::time::MICROS_PER_SECOND;
use idlemeter_core::{IdleMeter, MicrosClock, SimulatedClock};
use idlemeter_logging::{meter_debug, meter_info, MeterLogContext};
use idlemeter_metrics::{MeterMetrics, SharedRegistry};
use rand::prelude::*;
use rand_distr::Normal;

use crate::error::{Result, SimulationError};
use crate::profile::LoadProfile;
use crate::report::SimulationReport;

/// Quanta per cycle; a cycle is `CYCLE_QUANTA * quantum` us long so any whole
/// busy percentage maps onto whole quanta.
const CYCLE_QUANTA: u32 = 100;

/// Plays per-second load profiles against an idle meter on a simulated clock.
///
/// Each cycle is a busy slice of `busy_percent` quanta (plus optional Gaussian
/// jitter) followed by the remaining quanta declared idle. With free clock
/// reads the idle quanta are recorded back to back; with a read cost the
/// meter's real busy-wait runs against the simulated clock.
#[derive(Debug)]
pub struct LoadSimulator {
    clock: SimulatedClock,
    meter: IdleMeter<SimulatedClock>,
    read_cost: u32,
    rng: StdRng,
    jitter: Option<Normal<f64>>,
    metrics: Option<MeterMetrics>,
    reported_total: u64,
    history: Vec<u8>,
}

impl LoadSimulator {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let simulation = &config.simulation;
        if simulation.read_cost_us > MAX_READ_COST_MICROS {
            return Err(SimulationError::ReadCostTooLarge(simulation.read_cost_us));
        }
        let sigma = simulation.busy_jitter_us;
        let jitter = if sigma == 0.0 {
            None
        } else {
            Some(Normal::new(0.0, sigma).map_err(|_| SimulationError::InvalidJitter(sigma))?)
        };
        let clock =
            SimulatedClock::with_read_cost(simulation.clock_origin_us, simulation.read_cost_us);
        let meter = IdleMeter::new(clock.clone(), &config.meter)?;
        meter_info!(
            context = MeterLogContext::new()
                .with_meter(meter.name())
                .with_quantum(meter.quantum_micros()),
            "load simulator ready at origin {}us",
            simulation.clock_origin_us
        );
        Ok(Self {
            clock,
            meter,
            read_cost: simulation.read_cost_us,
            rng: StdRng::seed_from_u64(simulation.random_seed),
            jitter,
            metrics: None,
            reported_total: 0,
            history: Vec::new(),
        })
    }

    /// Publish meter readings into `registry` when metrics are enabled in `config`.
    pub fn attach_metrics(&mut self, config: &AppConfig, registry: SharedRegistry) -> Result<()> {
        if !config.metrics.enabled {
            return Ok(());
        }
        let metrics = MeterMetrics::new(registry, &config.metrics.namespace)
            .map_err(|err| SimulationError::Metrics(format!("{err:#}")))?;
        self.metrics = Some(metrics);
        Ok(())
    }

    pub fn meter(&self) -> &IdleMeter<SimulatedClock> {
        &self.meter
    }

    pub fn clock(&self) -> &SimulatedClock {
        &self.clock
    }

    /// Usage of every second completed so far, in order.
    pub fn history(&self) -> &[u8] {
        &self.history
    }

    /// Simulate at least one second of `profile` load, ending on a cycle edge.
    pub fn run_second(&mut self, profile: LoadProfile) {
        let begin = self.clock.peek();
        let mut cycles = 0u32;
        while self.clock.peek().wrapping_since(begin) < MICROS_PER_SECOND {
            self.run_cycle(profile);
            cycles += 1;
        }
        let label = profile.to_string();
        meter_debug!(
            context = MeterLogContext::new()
                .with_meter(self.meter.name())
                .with_second(self.meter.seconds_total())
                .with_profile(&label),
            "simulated second finished after {} cycles",
            cycles
        );
    }

    /// Run one second per profile, then settle the meter so that a trailing
    /// fully busy second is closed too. The report only covers seconds that
    /// completed during this call; [`LoadSimulator::history`] keeps them all.
    pub fn run(&mut self, profiles: &[LoadProfile]) -> Result<SimulationReport> {
        if profiles.is_empty() {
            return Err(SimulationError::NoSeconds);
        }
        let first = self.history.len();
        for profile in profiles {
            self.run_second(*profile);
        }
        self.meter.refresh();
        self.collect();
        let report = self.report(profiles, first);
        meter_info!(
            context = MeterLogContext::new().with_meter(self.meter.name()),
            "simulation complete: {} seconds, average usage {:.2}%",
            report.per_second_usage.len(),
            report.average_usage
        );
        Ok(report)
    }

    pub fn reset_average(&mut self) {
        self.meter.reset_average();
        if let Some(metrics) = &self.metrics {
            metrics.record_reset(self.meter.name());
        }
    }

    fn run_cycle(&mut self, profile: LoadProfile) {
        let quantum = self.meter.quantum_micros();
        let planned = u32::from(profile.busy_percent()) * quantum;
        let busy = self.jittered(planned, CYCLE_QUANTA * quantum);
        self.clock.advance(busy);

        let idle_quanta = u32::from(profile.idle_percent());
        if idle_quanta == 0 {
            self.meter.refresh();
            self.collect();
            return;
        }
        for _ in 0..idle_quanta {
            if self.read_cost == 0 {
                // free reads would never end a busy-wait; jump straight to the stop
                let start = self.clock.now();
                let stop = self.meter.record_idle_quantum_at(start);
                self.clock.set(stop.as_micros());
            } else {
                self.meter.wait_idle_quantum();
            }
            self.collect();
        }
    }

    fn jittered(&mut self, planned: u32, cycle: u32) -> u32 {
        match self.jitter {
            Some(normal) => {
                let noisy = f64::from(planned) + normal.sample(&mut self.rng);
                noisy.round().clamp(0.0, f64::from(cycle)) as u32
            }
            None => planned,
        }
    }

    /// Record the second closed by the last simulated step, if any. Steps are
    /// far shorter than a second, so at most one closes per step.
    fn collect(&mut self) {
        let total = self.meter.seconds_total();
        let fresh = total - self.reported_total;
        if fresh == 0 {
            return;
        }
        debug_assert_eq!(fresh, 1, "one simulated step closed several seconds");
        let usage = self.meter.usage_last_second();
        self.history.push(usage);
        self.reported_total = total;
        if let Some(metrics) = &self.metrics {
            metrics.observe(self.meter.name(), usage, self.meter.usage_average(), fresh);
        }
    }

    /// Report covering `profiles`, whose seconds start at `history[first]`.
    fn report(&self, profiles: &[LoadProfile], first: usize) -> SimulationReport {
        SimulationReport {
            meter: self.meter.name().to_owned(),
            quantum_us: self.meter.quantum_micros(),
            profile: profiles.to_vec(),
            per_second_usage: self.history[first..].to_vec(),
            average_usage: self.meter.usage_average(),
            seconds_completed: self.meter.seconds_completed(),
        }
    }
}
