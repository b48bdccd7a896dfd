//! Command-line argument parsing for Ising runs

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

/// What the binary does with the configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Threaded control loop with scheduled parameter changes
    #[default]
    Interactive,
    /// Parallel temperature scan written as CSV
    Scan,
}

/// 2D Ising Monte Carlo simulation with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long)]
    pub config_file: Option<String>,

    /// Run mode (overrides the configuration)
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Override lattice width
    #[arg(long)]
    pub width: Option<usize>,

    /// Override lattice height
    #[arg(long)]
    pub height: Option<usize>,

    /// Override temperature (units of J/k_B)
    #[arg(short = 't', long)]
    pub temperature: Option<f64>,

    /// Override external magnetic field h
    #[arg(long)]
    pub field: Option<f64>,

    /// Override coupling constant J
    #[arg(long)]
    pub coupling: Option<f64>,

    /// Override random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Override number of ticks in interactive mode
    #[arg(long)]
    pub ticks: Option<usize>,

    /// Override sweeps per tick
    #[arg(long)]
    pub sweeps_per_tick: Option<usize>,

    /// Write the final frame to this PPM/PGM file
    #[arg(long)]
    pub frame_output: Option<String>,

    /// Write scan results to this CSV file (default stdout)
    #[arg(long)]
    pub csv_output: Option<String>,

    /// Log file (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,
}
