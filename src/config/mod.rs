//! Configuration management for Ising runs
//!
//! YAML files deserialize into [`Config`], where every field is optional;
//! [`Config::with_defaults`] fills the gaps, command-line [`Args`] override the
//! result and [`Config::validate`] rejects bad values before anything runs.

mod args;

pub use args::{Args, Mode};

use crate::error::{Result, SimError};
use crate::ising::analysis::arange;
use crate::ising::{
    InitialState, Palette, Parameter, PixelFormat, SimulationParameters, UpdateRule,
};
use crate::scan::ScanSetup;
use crate::simulation::SimulationOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    pub mode: Option<Mode>,
    pub seed: Option<u64>,
    #[serde(default)]
    pub lattice: LatticeParams,
    #[serde(default)]
    pub physics: PhysicsParams,
    #[serde(default)]
    pub control: ControlParams,
    #[serde(default)]
    pub render: RenderParams,
    pub scan: Option<ScanParams>,
}

/// Lattice dimensions and initial fill
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LatticeParams {
    pub width: Option<usize>,
    pub height: Option<usize>,
    pub initial_state: Option<InitialState>,
}

/// Physical parameters and update rule
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhysicsParams {
    pub temperature: Option<f64>,
    pub field: Option<f64>,
    pub coupling: Option<f64>,
    pub rule: Option<UpdateRule>,
}

/// Control-loop pacing and scheduled parameter changes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControlParams {
    pub ticks: Option<usize>,
    pub sweeps_per_tick: Option<usize>,
    pub tick_interval_ms: Option<u64>,
    pub report_every: Option<usize>,
    #[serde(default)]
    pub schedule: Vec<ScheduledChange>,
}

/// Set `parameter` to `value` once `tick` ticks have run
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScheduledChange {
    pub tick: usize,
    pub parameter: Parameter,
    pub value: f64,
}

/// Frame output settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RenderParams {
    pub format: Option<PixelFormat>,
    pub palette: Option<Palette>,
}

/// Temperature-scan settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScanParams {
    pub temperatures: Option<Vec<f64>>,
    pub range: Option<TemperatureRange>,
    pub thermalisation_sweeps: Option<usize>,
    pub measurement_sweeps: Option<usize>,
    pub sweeps_between_samples: Option<usize>,
    pub correlation_length: Option<bool>,
}

/// Evenly spaced temperatures, `stop` excluded
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TemperatureRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl Default for LatticeParams {
    fn default() -> Self {
        LatticeParams {
            width: Some(128),
            height: Some(128),
            initial_state: Some(InitialState::Random),
        }
    }
}

impl LatticeParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        self.width = self.width.or(defaults.width);
        self.height = self.height.or(defaults.height);
        self.initial_state = self.initial_state.or(defaults.initial_state);
        self
    }
}

impl Default for PhysicsParams {
    fn default() -> Self {
        PhysicsParams {
            temperature: Some(2.0),
            field: Some(0.0),
            coupling: Some(1.0),
            rule: Some(UpdateRule::Metropolis),
        }
    }
}

impl PhysicsParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        self.temperature = self.temperature.or(defaults.temperature);
        self.field = self.field.or(defaults.field);
        self.coupling = self.coupling.or(defaults.coupling);
        self.rule = self.rule.or(defaults.rule);
        self
    }
}

impl Default for ControlParams {
    fn default() -> Self {
        ControlParams {
            ticks: Some(200),
            sweeps_per_tick: Some(1),
            tick_interval_ms: Some(0),
            report_every: Some(20),
            schedule: Vec::new(),
        }
    }
}

impl ControlParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        self.ticks = self.ticks.or(defaults.ticks);
        self.sweeps_per_tick = self.sweeps_per_tick.or(defaults.sweeps_per_tick);
        self.tick_interval_ms = self.tick_interval_ms.or(defaults.tick_interval_ms);
        self.report_every = self.report_every.or(defaults.report_every);
        self.schedule.sort_by_key(|change| change.tick);
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.unwrap_or(0))
    }
}

impl RenderParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        self.format = self.format.or(Some(PixelFormat::default()));
        self.palette = self.palette.or(Some(Palette::default()));
        self
    }
}

impl ScanParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        self.thermalisation_sweeps = self.thermalisation_sweeps.or(Some(1_000));
        self.measurement_sweeps = self.measurement_sweeps.or(Some(5_000));
        self.sweeps_between_samples = self.sweeps_between_samples.or(Some(10));
        self.correlation_length = self.correlation_length.or(Some(false));
        self
    }

    /// Explicit list first, otherwise the range.
    pub fn resolve_temperatures(&self) -> Result<Vec<f64>> {
        if let Some(temperatures) = &self.temperatures {
            return Ok(temperatures.clone());
        }
        match self.range {
            Some(TemperatureRange { start, stop, step }) => arange(start, stop, step)
                .filter(|temperatures| !temperatures.is_empty())
                .ok_or_else(|| {
                    SimError::InvalidConfig(format!(
                        "temperature range {start}..{stop} with step {step} is empty or inverted"
                    ))
                }),
            None => Err(SimError::InvalidConfig(
                "scan needs either `temperatures` or `range`".to_string(),
            )),
        }
    }
}

impl Config {
    /// Parse YAML text and fill in defaults.
    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yml::Error> {
        Ok(serde_yml::from_str::<Config>(text)?.with_defaults())
    }

    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        self.mode = self.mode.or(Some(Mode::Interactive));
        self.lattice = self.lattice.with_defaults();
        self.physics = self.physics.with_defaults();
        self.control = self.control.with_defaults();
        self.render = self.render.with_defaults();
        self.scan = self.scan.map(ScanParams::with_defaults);
        self
    }

    /// Command-line values take precedence over the file.
    pub fn apply_args(&mut self, args: &Args) {
        self.mode = args.mode.or(self.mode);
        self.seed = args.seed.or(self.seed);
        self.lattice.width = args.width.or(self.lattice.width);
        self.lattice.height = args.height.or(self.lattice.height);
        self.physics.temperature = args.temperature.or(self.physics.temperature);
        self.physics.field = args.field.or(self.physics.field);
        self.physics.coupling = args.coupling.or(self.physics.coupling);
        self.control.ticks = args.ticks.or(self.control.ticks);
        self.control.sweeps_per_tick = args.sweeps_per_tick.or(self.control.sweeps_per_tick);
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        let (width, height) = self.dimensions();
        if width == 0 || height == 0 {
            return Err(SimError::InvalidDimensions { width, height });
        }
        let params = self.parameters()?;

        if self.control.sweeps_per_tick == Some(0) {
            return Err(SimError::InvalidSweepRate(0));
        }
        if self.control.report_every == Some(0) {
            return Err(SimError::InvalidConfig(
                "report_every must be positive".to_string(),
            ));
        }

        // scheduled changes must be valid in the order they will be applied
        let mut scheduled = params;
        for change in &self.control.schedule {
            scheduled = scheduled.with(change.parameter, change.value)?;
        }

        if self.mode == Some(Mode::Scan) {
            self.scan_setup(self.seed.unwrap_or_default())?.validate()?;
        }
        Ok(())
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (
            self.lattice.width.unwrap_or(0),
            self.lattice.height.unwrap_or(0),
        )
    }

    pub fn parameters(&self) -> Result<SimulationParameters> {
        let defaults = PhysicsParams::default();
        SimulationParameters::new(
            self.physics.temperature.or(defaults.temperature).unwrap_or(2.0),
            self.physics.field.or(defaults.field).unwrap_or(0.0),
            self.physics.coupling.or(defaults.coupling).unwrap_or(1.0),
        )
    }

    pub fn simulation_options(&self) -> SimulationOptions {
        SimulationOptions {
            initial_state: self.lattice.initial_state.unwrap_or_default(),
            rule: self.physics.rule.unwrap_or_default(),
            palette: self.render.palette.unwrap_or_default(),
            format: self.render.format.unwrap_or_default(),
        }
    }

    /// Fill in a random seed when none was configured and return the seed in use.
    pub fn resolve_seed(&mut self) -> u64 {
        *self.seed.get_or_insert_with(rand::random)
    }

    /// Scan inputs for the given seed; callers resolve the seed first.
    pub fn scan_setup(&self, seed: u64) -> Result<ScanSetup> {
        let scan = self
            .scan
            .clone()
            .unwrap_or_default()
            .with_defaults();
        let (width, height) = self.dimensions();
        Ok(ScanSetup {
            width,
            height,
            temperatures: scan.resolve_temperatures()?,
            field: self.physics.field.unwrap_or(0.0),
            coupling: self.physics.coupling.unwrap_or(1.0),
            initial_state: self.lattice.initial_state.unwrap_or_default(),
            rule: self.physics.rule.unwrap_or_default(),
            thermalisation_sweeps: scan.thermalisation_sweeps.unwrap_or(0),
            measurement_sweeps: scan.measurement_sweeps.unwrap_or(0),
            sweeps_between_samples: scan.sweeps_between_samples.unwrap_or(1),
            correlation_length: scan.correlation_length.unwrap_or(false),
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gets_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.mode, Some(Mode::Interactive));
        assert_eq!(config.dimensions(), (128, 128));
        assert_eq!(config.physics.temperature, Some(2.0));
        assert_eq!(config.control.sweeps_per_tick, Some(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let yaml = r#"
seed: 9
lattice:
  width: 16
  height: 8
  initial_state: up
physics:
  temperature: 1.5
  rule: glauber
control:
  schedule:
    - tick: 50
      parameter: field
      value: 0.25
    - tick: 10
      parameter: temperature
      value: 3.0
render:
  format: gray8
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.dimensions(), (16, 8));
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.physics.rule, Some(UpdateRule::Glauber));
        assert_eq!(config.physics.field, Some(0.0));
        assert_eq!(config.render.format, Some(PixelFormat::Gray8));
        // schedule is sorted by tick
        assert_eq!(config.control.schedule[0].tick, 10);
        assert_eq!(config.control.schedule[1].parameter, Parameter::Field);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default().with_defaults();
        config.physics.temperature = Some(0.0);
        assert_eq!(
            config.validate(),
            Err(SimError::InvalidTemperature(0.0))
        );

        let mut config = Config::default().with_defaults();
        config.lattice.width = Some(0);
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidDimensions { width: 0, .. })
        ));

        let mut config = Config::default().with_defaults();
        config.physics.coupling = Some(0.0);
        assert_eq!(config.validate(), Err(SimError::InvalidCoupling(0.0)));
    }

    #[test]
    fn test_validate_rejects_bad_schedule() {
        let mut config = Config::default().with_defaults();
        config.control.schedule.push(ScheduledChange {
            tick: 3,
            parameter: Parameter::Temperature,
            value: -1.0,
        });
        assert_eq!(
            config.validate(),
            Err(SimError::InvalidTemperature(-1.0))
        );
    }

    #[test]
    fn test_scan_range_resolution() {
        let yaml = r#"
mode: scan
lattice:
  width: 8
  height: 8
scan:
  range:
    start: 1.0
    stop: 3.0
    step: 0.5
"#;
        let config = Config::from_yaml(yaml).unwrap();
        let setup = config.scan_setup(5).unwrap();
        assert_eq!(setup.seed, 5);
        assert_eq!(setup.temperatures, vec![1.0, 1.5, 2.0, 2.5]);
        assert_eq!(setup.thermalisation_sweeps, 1_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scan_range_with_partial_step() {
        let yaml = "mode: scan\nscan:\n  range: {start: 2.0, stop: 3.0, step: 0.3}\n";
        let config = Config::from_yaml(yaml).unwrap();
        let setup = config.scan_setup(1).unwrap();
        assert_eq!(setup.temperatures.len(), 4);

        // an empty range is reported as a bad range, not a missing list
        let yaml = "mode: scan\nscan:\n  range: {start: 2.0, stop: 2.0, step: 0.1}\n";
        let config = Config::from_yaml(yaml).unwrap();
        assert!(matches!(
            config.scan_setup(1),
            Err(SimError::InvalidConfig(message)) if message.contains("range")
        ));
    }

    #[test]
    fn test_scan_without_temperatures_is_rejected() {
        let config = Config::from_yaml("mode: scan\nscan: {}\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(SimError::InvalidConfig(_))
        ));
    }
}
