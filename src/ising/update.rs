use super::lattice::Lattice;
use super::params::SimulationParameters;
use super::rng::unit_f64;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Acceptance rule for a proposed single-spin flip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateRule {
    /// Accept if ΔE <= 0, otherwise with probability exp(-ΔE/T)
    #[default]
    Metropolis,
    /// Heat-bath rule: accept with probability 1 / (1 + exp(ΔE/T))
    Glauber,
}

/// What one or more sweeps did to the lattice
///
/// `delta_magnetization` is the change of the spin sum (not per site), so the
/// outcome can be added onto tracked totals without rounding.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SweepOutcome {
    pub attempted: u64,
    pub accepted: u64,
    pub delta_energy: f64,
    pub delta_magnetization: i64,
}

impl SweepOutcome {
    pub fn acceptance_ratio(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        self.accepted as f64 / self.attempted as f64
    }
}

impl Add for SweepOutcome {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            attempted: self.attempted + rhs.attempted,
            accepted: self.accepted + rhs.accepted,
            delta_energy: self.delta_energy + rhs.delta_energy,
            delta_magnetization: self.delta_magnetization + rhs.delta_magnetization,
        }
    }
}

impl AddAssign for SweepOutcome {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Energy change if the spin at (x, y) were flipped
///
/// ΔE = 2 * J * s_i * (Σ neighbors) + 2 * h * s_i
#[inline(always)]
pub fn delta_energy(lattice: &Lattice, x: usize, y: usize, params: &SimulationParameters) -> f64 {
    let spin = lattice.get(x, y);
    let mut neighbors_sum = lattice.neighbor_sum(x, y);
    // on a single row or column a site is its own neighbor; that bond never changes
    if lattice.width() == 1 {
        neighbors_sum -= 2 * spin.value() as i32;
    }
    if lattice.height() == 1 {
        neighbors_sum -= 2 * spin.value() as i32;
    }
    2.0 * spin.as_f64() * (params.coupling() * neighbors_sum as f64 + params.field())
}

/// Decide whether a move with energy change `delta_e` is accepted.
///
/// Metropolis consumes a random draw only when ΔE > 0; Glauber always does.
#[inline(always)]
pub fn accept<R: RngCore + ?Sized>(
    rule: UpdateRule,
    delta_e: f64,
    temperature: f64,
    rng: &mut R,
) -> bool {
    match rule {
        UpdateRule::Metropolis => {
            delta_e <= 0.0 || unit_f64(rng) < (-delta_e / temperature).exp()
        }
        UpdateRule::Glauber => unit_f64(rng) < 1.0 / (1.0 + (delta_e / temperature).exp()),
    }
}

/// One sweep: one attempted flip per site in row-major order
/// (y = 0..H, x = 0..W).
pub fn sweep<R: RngCore + ?Sized>(
    lattice: &mut Lattice,
    params: &SimulationParameters,
    rule: UpdateRule,
    rng: &mut R,
) -> SweepOutcome {
    let mut outcome = SweepOutcome::default();
    let temperature = params.temperature();

    for y in 0..lattice.height() {
        for x in 0..lattice.width() {
            outcome.attempted += 1;
            let delta_e = delta_energy(lattice, x, y, params);

            if accept(rule, delta_e, temperature, rng) {
                let spin = lattice.flip(x, y);
                outcome.accepted += 1;
                outcome.delta_energy += delta_e;
                outcome.delta_magnetization += 2 * spin.value() as i64;
            }
        }
    }

    outcome
}

/// Stepper owning the injected randomness source
///
/// Parameters are passed per call and stay fixed for the whole sweep.
#[derive(Debug, Clone)]
pub struct UpdateEngine<R: RngCore> {
    rule: UpdateRule,
    rng: R,
}

impl<R: RngCore> UpdateEngine<R> {
    pub fn new(rule: UpdateRule, rng: R) -> Self {
        Self { rule, rng }
    }

    pub fn rule(&self) -> UpdateRule {
        self.rule
    }

    pub fn set_rule(&mut self, rule: UpdateRule) {
        self.rule = rule;
    }

    /// The randomness source, e.g. for random lattice initialisation
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    pub fn sweep(&mut self, lattice: &mut Lattice, params: &SimulationParameters) -> SweepOutcome {
        sweep(lattice, params, self.rule, &mut self.rng)
    }

    /// Run `count` sweeps back to back and sum their outcomes.
    pub fn run(
        &mut self,
        lattice: &mut Lattice,
        params: &SimulationParameters,
        count: usize,
    ) -> SweepOutcome {
        let mut total = SweepOutcome::default();
        for _ in 0..count {
            total += self.sweep(lattice, params);
        }
        total
    }
}
