//! ---
//! im_section: "11-simulation"
//! im_subsection: "01-bootstrap"
//! im_type: "source"
//! im_scope: "code"
//! im_description: "Simulation harness module exports and shared types."
//! im_version: "v0.1.0"
//! im_owner: "tbd"
//! ---
//! Load simulation harness for idle meters.
//!
//! A [`LoadSimulator`] owns a [`idlemeter_core::SimulatedClock`] and an
//! [`idlemeter_core::IdleMeter`] on top of it, and plays back a schedule of
//! per-second [`LoadProfile`]s as alternating busy slices and idle quanta.

pub mod error;
pub mod profile;
pub mod report;
pub mod simulator;

pub use error::{Result, SimulationError};
pub use profile::LoadProfile;
pub use report::SimulationReport;
pub use simulator::LoadSimulator;
