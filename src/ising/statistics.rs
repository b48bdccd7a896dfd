use super::lattice::Lattice;
use super::params::SimulationParameters;
use super::update::SweepOutcome;
use itertools::iproduct;
use serde::Serialize;

/// Instantaneous observables of one lattice state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Observables {
    /// Total energy E = -J Σ_bonds s_i s_j - h Σ_i s_i
    pub energy: f64,
    /// Magnetization per site, in [-1, 1]
    pub magnetization: f64,
}

/// Total energy of the lattice
///
/// Each bond is counted once by pairing every site with its right and lower
/// neighbor.
pub fn total_energy(lattice: &Lattice, params: &SimulationParameters) -> f64 {
    let (w, h) = (lattice.width(), lattice.height());
    let mut bonds = 0i64;
    let mut spin_sum = 0i64;

    for (y, x) in iproduct!(0..h, 0..w) {
        let spin = lattice.get(x, y).value() as i64;
        let right = lattice.get(x + 1, y).value() as i64;
        let down = lattice.get(x, y + 1).value() as i64;
        bonds += spin * (right + down);
        spin_sum += spin;
    }

    -params.coupling() * bonds as f64 - params.field() * spin_sum as f64
}

/// Magnetization per site Σ s_i / N
pub fn magnetization(lattice: &Lattice) -> f64 {
    lattice.spin_sum() as f64 / lattice.len() as f64
}

/// Recompute observables from scratch; a pure function of state and parameters.
pub fn sample(lattice: &Lattice, params: &SimulationParameters) -> Observables {
    Observables {
        energy: total_energy(lattice, params),
        magnetization: magnetization(lattice),
    }
}

/// Observables kept up to date from sweep deltas instead of full rescans
///
/// Must be rebuilt with [`ObservableTracker::resync`] whenever the parameters
/// change or the lattice is modified outside the update engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservableTracker {
    energy: f64,
    spin_sum: i64,
    sites: usize,
}

impl ObservableTracker {
    pub fn new(lattice: &Lattice, params: &SimulationParameters) -> Self {
        Self {
            energy: total_energy(lattice, params),
            spin_sum: lattice.spin_sum(),
            sites: lattice.len(),
        }
    }

    pub fn apply(&mut self, outcome: &SweepOutcome) {
        self.energy += outcome.delta_energy;
        self.spin_sum += outcome.delta_magnetization;
    }

    pub fn resync(&mut self, lattice: &Lattice, params: &SimulationParameters) {
        *self = Self::new(lattice, params);
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn spin_sum(&self) -> i64 {
        self.spin_sum
    }

    pub fn observables(&self) -> Observables {
        Observables {
            energy: self.energy,
            magnetization: self.spin_sum as f64 / self.sites as f64,
        }
    }
}

/// Running sums over recorded samples
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Statistics {
    energy_sum: f64,
    energy_sq_sum: f64,
    magnetization_sum: f64,
    abs_magnetization_sum: f64,
    magnetization_sq_sum: f64,
    samples: u64,
}

impl Statistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, observables: Observables) {
        let Observables {
            energy,
            magnetization,
        } = observables;
        self.energy_sum += energy;
        self.energy_sq_sum += energy * energy;
        self.magnetization_sum += magnetization;
        self.abs_magnetization_sum += magnetization.abs();
        self.magnetization_sq_sum += magnetization * magnetization;
        self.samples += 1;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn sample_count(&self) -> u64 {
        self.samples
    }

    pub fn total_energy(&self) -> f64 {
        self.energy_sum
    }

    pub fn total_magnetization(&self) -> f64 {
        self.magnetization_sum
    }

    fn mean(&self, sum: f64) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        sum / self.samples as f64
    }

    pub fn mean_energy(&self) -> f64 {
        self.mean(self.energy_sum)
    }

    pub fn mean_magnetization(&self) -> f64 {
        self.mean(self.magnetization_sum)
    }

    pub fn mean_abs_magnetization(&self) -> f64 {
        self.mean(self.abs_magnetization_sum)
    }

    /// <E^2> - <E>^2
    pub fn energy_variance(&self) -> f64 {
        let mean = self.mean_energy();
        (self.mean(self.energy_sq_sum) - mean * mean).max(0.0)
    }

    /// <m^2> - <|m|>^2 on the per-site magnetization
    pub fn magnetization_variance(&self) -> f64 {
        let mean_abs = self.mean_abs_magnetization();
        (self.mean(self.magnetization_sq_sum) - mean_abs * mean_abs).max(0.0)
    }

    /// Specific heat per site C = (<E^2> - <E>^2) / (T^2 N)
    pub fn specific_heat(&self, temperature: f64, sites: usize) -> f64 {
        if self.samples < 2 {
            return 0.0;
        }
        self.energy_variance() / (temperature * temperature * sites as f64)
    }

    /// Susceptibility per site χ = N (<m^2> - <|m|>^2) / T
    pub fn susceptibility(&self, temperature: f64, sites: usize) -> f64 {
        if self.samples < 2 {
            return 0.0;
        }
        sites as f64 * self.magnetization_variance() / temperature
    }
}
