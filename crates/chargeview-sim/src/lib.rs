//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "01-bootstrap"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Simulation module exports for charging-point datasets."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Dataset producers for the chargeview engine: a seeded arrival simulator
//! and a replay source for datasets recorded to disk.

pub mod generator;
pub mod replay;

pub use generator::{ChargingSimulator, DIURNAL_PROFILE};
pub use replay::{load_samples, RecordedDataset};
