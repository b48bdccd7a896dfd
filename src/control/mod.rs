//! Control loop: run state machine, parameter scheduling and snapshots
//!
//! A [`Controller`] owns the simulation and is its only mutator. Sweeps run
//! to completion inside [`Controller::tick`]; frames and statistics are read
//! afterwards, so a reader never sees a half-updated lattice.

mod history;
mod worker;

pub use history::MagnetizationHistory;
pub use worker::{LatestFrame, SimulationWorker, WorkerSettings};

use crate::error::{Result, SimError};
use crate::ising::{FrameBuffer, Observables, Parameter, SimulationParameters, SweepOutcome};
use crate::simulation::Simulation;
use tracing::{debug, info};

/// Run state of the control loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Completed-tick view handed to readers
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub frame: FrameBuffer,
    pub observables: Observables,
    pub parameters: SimulationParameters,
    pub state: RunState,
    pub sweeps: u64,
    /// Mean |m| over samples since the last reset or parameter change
    pub mean_abs_magnetization: f64,
    pub mean_energy: f64,
    pub samples: u64,
}

#[derive(Debug)]
pub struct Controller {
    simulation: Simulation,
    state: RunState,
    sweeps_per_tick: usize,
    pending: Vec<(Parameter, f64)>,
    history: MagnetizationHistory,
}

impl Controller {
    pub fn new(simulation: Simulation, sweeps_per_tick: usize) -> Result<Self> {
        check_sweep_rate(sweeps_per_tick)?;
        Ok(Self {
            simulation,
            state: RunState::Stopped,
            sweeps_per_tick,
            pending: Vec::new(),
            history: MagnetizationHistory::default(),
        })
    }

    pub fn with_history(mut self, history: MagnetizationHistory) -> Self {
        self.history = history;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn history(&self) -> &MagnetizationHistory {
        &self.history
    }

    pub fn sweeps_per_tick(&self) -> usize {
        self.sweeps_per_tick
    }

    pub fn set_sweeps_per_tick(&mut self, sweeps_per_tick: usize) -> Result<()> {
        check_sweep_rate(sweeps_per_tick)?;
        self.sweeps_per_tick = sweeps_per_tick;
        Ok(())
    }

    /// Stopped or Paused -> Running. Starting a running loop is a no-op.
    pub fn start(&mut self) -> Result<()> {
        if self.state != RunState::Running {
            info!("Control loop: {:?} -> Running", self.state);
        }
        self.state = RunState::Running;
        Ok(())
    }

    /// Running -> Paused
    pub fn pause(&mut self) -> Result<()> {
        match self.state {
            RunState::Running => {
                info!("Control loop: Running -> Paused");
                self.state = RunState::Paused;
                self.flush_pending();
                Ok(())
            }
            RunState::Paused => Ok(()),
            RunState::Stopped => Err(SimError::InvalidTransition(
                "cannot pause a stopped simulation".to_string(),
            )),
        }
    }

    /// Any state -> Stopped
    pub fn stop(&mut self) {
        if self.state != RunState::Stopped {
            info!("Control loop: {:?} -> Stopped", self.state);
        }
        self.state = RunState::Stopped;
        self.flush_pending();
    }

    /// Validate and schedule a parameter change.
    ///
    /// While running, changes are queued and applied at the start of the next
    /// tick, between sweeps, or when the loop is paused or stopped. Otherwise
    /// they apply immediately.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        let parameter: Parameter = name.parse()?;
        self.schedule_parameter(parameter, value)
    }

    pub fn schedule_parameter(&mut self, parameter: Parameter, value: f64) -> Result<()> {
        // validate against the parameters the change will actually land on
        let mut effective = self.simulation.parameters();
        for &(p, v) in &self.pending {
            effective = effective.with(p, v)?;
        }
        effective.with(parameter, value)?;

        if self.state == RunState::Running {
            debug!("Queueing {} = {} for the next tick", parameter, value);
            self.pending.push((parameter, value));
            Ok(())
        } else {
            self.simulation.apply_parameter(parameter, value)
        }
    }

    /// Resize the lattice. Rejected while running; on success the loop is
    /// Stopped.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        if self.state == RunState::Running {
            return Err(SimError::ResizeWhileRunning);
        }
        self.simulation.resize(width, height)?;
        self.pending.clear();
        self.history.clear();
        self.state = RunState::Stopped;
        Ok(())
    }

    /// Advance one tick. Only a running loop sweeps; `None` otherwise.
    pub fn tick(&mut self) -> Option<SweepOutcome> {
        if self.state != RunState::Running {
            return None;
        }
        self.flush_pending();
        let outcome = self.simulation.step(self.sweeps_per_tick);
        self.history
            .record(self.simulation.current_statistics().magnetization);
        Some(outcome)
    }

    fn flush_pending(&mut self) {
        for (parameter, value) in self.pending.drain(..) {
            // already validated when queued
            if let Err(err) = self.simulation.apply_parameter(parameter, value) {
                debug!("Dropping queued {} = {}: {}", parameter, value, err);
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let statistics = self.simulation.statistics();
        Snapshot {
            frame: self.simulation.current_frame(),
            observables: self.simulation.current_statistics(),
            parameters: self.simulation.parameters(),
            state: self.state,
            sweeps: self.simulation.sweeps(),
            mean_abs_magnetization: statistics.mean_abs_magnetization(),
            mean_energy: statistics.mean_energy(),
            samples: statistics.sample_count(),
        }
    }

    /// Stop and hand the simulation back.
    pub fn teardown(mut self) -> Simulation {
        self.stop();
        self.simulation
    }
}

fn check_sweep_rate(sweeps_per_tick: usize) -> Result<()> {
    if sweeps_per_tick == 0 {
        return Err(SimError::InvalidSweepRate(sweeps_per_tick));
    }
    Ok(())
}
