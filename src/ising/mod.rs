pub mod analysis;
pub mod frame;
pub mod lattice;
pub mod params;
pub mod rng;
pub mod statistics;
pub mod update;

pub use frame::{FrameBuffer, FrameProducer, Palette, PixelFormat};
pub use lattice::{InitialState, Lattice, Spin};
pub use params::{Parameter, SimulationParameters};
pub use rng::Xoshiro256PlusPlus;
pub use statistics::{sample, ObservableTracker, Observables, Statistics};
pub use update::{SweepOutcome, UpdateEngine, UpdateRule};

#[cfg(test)]
mod tests;
