//! ---
//! im_section: "11-simulation"
//! im_subsection: "module"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Simulation harness helpers and load engines."
//! im_version: "v0.0.0-prealpha"
//! im_owner: "tbd"
//! ---
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};

/// Share of each simulated second spent busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LoadProfile {
    busy_percent: u8,
}

impl LoadProfile {
    pub fn new(busy_percent: u8) -> Result<Self> {
        if busy_percent > 100 {
            return Err(SimulationError::PercentOutOfRange(busy_percent));
        }
        Ok(Self { busy_percent })
    }

    /// Build a per-second schedule, rejecting the first out-of-range entry.
    pub fn schedule(percentages: &[u8]) -> Result<Vec<Self>> {
        percentages.iter().map(|&p| Self::new(p)).collect()
    }

    pub fn busy_percent(&self) -> u8 {
        self.busy_percent
    }

    pub fn idle_percent(&self) -> u8 {
        100 - self.busy_percent
    }
}

impl TryFrom<u8> for LoadProfile {
    type Error = SimulationError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<LoadProfile> for u8 {
    fn from(profile: LoadProfile) -> Self {
        profile.busy_percent
    }
}

impl FromStr for LoadProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        let value: u8 = digits
            .parse()
            .map_err(|_| format!("invalid busy percentage: {}", s))?;
        Self::new(value).map_err(|err| err.to_string())
    }
}

impl fmt::Display for LoadProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}% busy", self.busy_percent)
    }
}
