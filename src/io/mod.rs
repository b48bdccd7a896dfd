//! Input/Output for Ising runs
//!
//! Logging setup and writers for frames and scan tables. Nothing in the
//! simulation core touches the filesystem; only the application layer calls
//! into this module.

mod export;
mod output;

pub use export::{write_frame_pnm, write_frame_pnm_file};
pub use output::setup_output;
