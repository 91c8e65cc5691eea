//! ---
//! im_section: "11-simulation"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Simulation harness helpers and load engines."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::profile::LoadProfile;

/// Outcome of a simulated load schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub meter: String,
    pub quantum_us: u32,
    /// Requested busy share, one entry per simulated second.
    pub profile: Vec<LoadProfile>,
    /// Usage the meter reported for each second it completed, in order.
    pub per_second_usage: Vec<u8>,
    pub average_usage: f64,
    /// Seconds completed since the last average reset.
    pub seconds_completed: u32,
}

impl SimulationReport {
    /// Largest gap between requested and measured busy share over the seconds
    /// that line up one to one with the schedule.
    pub fn max_deviation(&self) -> Option<u8> {
        self.profile
            .iter()
            .zip(&self.per_second_usage)
            .map(|(profile, usage)| profile.busy_percent().abs_diff(*usage))
            .max()
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        let json = serde_json::to_vec_pretty(self)?;
        file.write_all(&json)?;
        Ok(())
    }
}
