//! CivicConnect command-line front end.
//!
//! Exposes the configuration model for integration testing.

pub mod config;

pub use config::{AppConfig, SimulationConfig};
