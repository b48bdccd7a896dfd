//! 2D Ising model Monte Carlo simulation with real-time frame output
//!
//! The core is [`simulation::Simulation`]: an owned lattice stepped by
//! Metropolis or Glauber sweeps, with pull-based frame and statistics queries.
//! [`control`] adds the run state machine and a threaded runner, [`scan`] runs
//! parallel temperature scans.

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod io;
pub mod ising;
pub mod scan;
pub mod simulation;

pub use error::{Result, SimError};
pub use simulation::{Simulation, SimulationOptions};
