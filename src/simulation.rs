//! Owned simulation object: lattice, parameters, stepping and read-out
//!
//! This is the boundary an outer layer (renderer, UI, CLI) talks to. All
//! queries are pull-based; the simulation never calls out.

use crate::error::Result;
use crate::ising::{
    sample, FrameBuffer, FrameProducer, InitialState, Lattice, ObservableTracker, Observables,
    Palette, Parameter, PixelFormat, SimulationParameters, Statistics, SweepOutcome,
    UpdateEngine, UpdateRule, Xoshiro256PlusPlus,
};
use rand::SeedableRng;
use tracing::{debug, info};

/// Settings besides dimensions, physics and seed
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimulationOptions {
    pub initial_state: InitialState,
    pub rule: UpdateRule,
    pub palette: Palette,
    pub format: PixelFormat,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    lattice: Lattice,
    params: SimulationParameters,
    engine: UpdateEngine<Xoshiro256PlusPlus>,
    tracker: ObservableTracker,
    statistics: Statistics,
    producer: FrameProducer,
    initial_state: InitialState,
    sweeps: u64,
}

impl Simulation {
    /// Configure a simulation with the default options (all spins up,
    /// Metropolis, RGBA frames).
    pub fn configure(
        width: usize,
        height: usize,
        temperature: f64,
        field: f64,
        coupling: f64,
        seed: u64,
    ) -> Result<Self> {
        let params = SimulationParameters::new(temperature, field, coupling)?;
        Self::with_options(width, height, params, seed, SimulationOptions::default())
    }

    pub fn with_options(
        width: usize,
        height: usize,
        params: SimulationParameters,
        seed: u64,
        options: SimulationOptions,
    ) -> Result<Self> {
        let rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        Self::with_rng(width, height, params, rng, options)
    }

    /// Build around an already constructed generator, e.g. a substream.
    pub fn with_rng(
        width: usize,
        height: usize,
        params: SimulationParameters,
        rng: Xoshiro256PlusPlus,
        options: SimulationOptions,
    ) -> Result<Self> {
        let mut engine = UpdateEngine::new(options.rule, rng);
        let lattice = Lattice::new(width, height, options.initial_state, engine.rng_mut())?;
        let tracker = ObservableTracker::new(&lattice, &params);

        info!(
            "Configured {}x{} lattice: T={}, h={}, J={}, rule={:?}, init={:?}",
            width,
            height,
            params.temperature(),
            params.field(),
            params.coupling(),
            options.rule,
            options.initial_state
        );

        Ok(Self {
            lattice,
            params,
            engine,
            tracker,
            statistics: Statistics::new(),
            producer: FrameProducer::new(options.palette, options.format),
            initial_state: options.initial_state,
            sweeps: 0,
        })
    }

    /// Run `sweep_count` sweeps, recording one statistics sample per sweep.
    pub fn step(&mut self, sweep_count: usize) -> SweepOutcome {
        let mut total = SweepOutcome::default();
        for _ in 0..sweep_count {
            let outcome = self.engine.sweep(&mut self.lattice, &self.params);
            self.tracker.apply(&outcome);
            self.statistics.record(self.tracker.observables());
            total += outcome;
        }
        self.sweeps += sweep_count as u64;
        total
    }

    /// Change a parameter by name (`temperature`/`t`, `field`/`h`,
    /// `coupling`/`j`). Invalid names or values leave everything untouched.
    pub fn set_parameter(&mut self, name: &str, value: f64) -> Result<()> {
        let parameter: Parameter = name.parse()?;
        self.apply_parameter(parameter, value)
    }

    pub fn apply_parameter(&mut self, parameter: Parameter, value: f64) -> Result<()> {
        let next = self.params.with(parameter, value)?;
        if next == self.params {
            return Ok(());
        }
        debug!("Setting {} to {}", parameter, value);
        self.params = next;
        self.tracker.resync(&self.lattice, &self.params);
        self.statistics.clear();
        Ok(())
    }

    /// Reallocate the lattice; all spin state and statistics are discarded.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        self.lattice
            .resize(width, height, self.initial_state, self.engine.rng_mut())?;
        info!("Resized lattice to {}x{}", width, height);
        self.after_reset();
        Ok(())
    }

    /// Refill the lattice in place with the given initial state.
    pub fn reset(&mut self, init: InitialState) {
        self.initial_state = init;
        self.lattice.reinitialize(init, self.engine.rng_mut());
        self.after_reset();
    }

    fn after_reset(&mut self) {
        self.tracker.resync(&self.lattice, &self.params);
        self.statistics.clear();
        self.sweeps = 0;
    }

    pub fn current_frame(&self) -> FrameBuffer {
        self.producer.render(&self.lattice)
    }

    pub fn render_into(&self, frame: &mut FrameBuffer) {
        self.producer.render_into(&self.lattice, frame);
    }

    /// Energy and magnetization of the current state (incrementally tracked)
    pub fn current_statistics(&self) -> Observables {
        self.tracker.observables()
    }

    /// Observables recomputed from the lattice alone
    pub fn recomputed_statistics(&self) -> Observables {
        sample(&self.lattice, &self.params)
    }

    /// Samples accumulated since the last reset or parameter change
    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn clear_statistics(&mut self) {
        self.statistics.clear();
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn parameters(&self) -> SimulationParameters {
        self.params
    }

    pub fn rule(&self) -> UpdateRule {
        self.engine.rule()
    }

    pub fn set_rule(&mut self, rule: UpdateRule) {
        self.engine.set_rule(rule);
        self.statistics.clear();
    }

    pub fn width(&self) -> usize {
        self.lattice.width()
    }

    pub fn height(&self) -> usize {
        self.lattice.height()
    }

    /// Sweeps completed since configuration, resize or reset
    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }
}
