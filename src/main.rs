//! Ising simulation command-line interface
//!
//! Runs either the interactive control loop or a temperature scan, configured
//! from YAML with command-line overrides.

use color_eyre::eyre::Result;
use ising_sim::app::IsingApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    IsingApplication::from_cli()?.run()
}
