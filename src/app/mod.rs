mod report;
mod runner;

pub use runner::{run_interactive, run_temperature_scan};

use crate::config::{Args, Config, Mode};
use crate::io::setup_output;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::fs;
use tracing::info;

pub struct IsingApplication {
    args: Args,
    config: Config,
}

impl IsingApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        Self::from_args(args)
    }

    pub fn from_args(args: Args) -> Result<Self> {
        let mut config = load_config(&args)?;
        config.apply_args(&args);
        config.resolve_seed();
        config
            .validate()
            .wrap_err("Invalid simulation configuration")?;
        Ok(Self { args, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_ref());
        info!("Configuration loaded:\n{:?}", self.config);

        match self.config.mode.unwrap_or_default() {
            Mode::Interactive => {
                run_interactive(&self.config, &self.args)?;
            }
            Mode::Scan => {
                run_temperature_scan(&self.config, &self.args)?;
            }
        }
        Ok(())
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let Some(path) = &args.config_file else {
        return Ok(Config::default().with_defaults());
    };

    let config_content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", path))?;

    Config::from_yaml(&config_content).wrap_err("Failed to parse configuration file")
}
