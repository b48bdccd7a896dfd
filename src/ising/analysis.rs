//! Reference values and derived quantities for the square-lattice Ising model

use super::lattice::Lattice;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Critical temperature of the 2D square-lattice model (Onsager)
/// T_c = 2J / (k_B * ln(1 + √2)) ≈ 2.269 J/k_B
pub fn critical_temperature() -> f64 {
    2.0 / (1.0 + 2.0_f64.sqrt()).ln()
}

/// Magnetization per site at T=0 (all spins aligned)
pub fn magnetization_at_zero_temp() -> f64 {
    1.0
}

/// Energy per site at T=0 with h = 0, in units of J
pub fn energy_per_site_at_zero_temp() -> f64 {
    // 4 aligned neighbors, each bond shared by two sites
    -(coordination_number() as f64) / 2.0
}

/// Number of nearest neighbors on the square lattice
pub fn coordination_number() -> usize {
    4
}

/// Mean-field estimate T_c ≈ z J / k_B
pub fn mean_field_critical_temperature() -> f64 {
    coordination_number() as f64
}

/// Fourier components of the spin field used for the correlation length
///
/// Holds the phases exp(i q x) for q = 2π/W along the x axis.
#[derive(Debug, Clone)]
pub struct StructureFactor {
    kernels: Vec<Complex64>,
}

/// σ(q) at q = 0 and at the smallest nonzero wave vector along x
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinModes {
    pub q0: f64,
    pub qx: Complex64,
}

impl SpinModes {
    /// S(0) = |σ(0)|^2
    pub fn s_q0(&self) -> f64 {
        self.q0 * self.q0
    }

    /// S(q_min) = |σ(q_min)|^2
    pub fn s_qx(&self) -> f64 {
        self.qx.norm_sqr()
    }
}

impl StructureFactor {
    pub fn new(width: usize) -> Self {
        let q = 2.0 * PI / width as f64;
        let kernels = (0..width)
            .map(|x| (Complex64::i() * q * x as f64).exp())
            .collect();
        Self { kernels }
    }

    /// σ(q) = N^{-1/2} Σ_r s_r exp(i q·r) for q = 0 and q = (2π/W, 0)
    pub fn modes(&self, lattice: &Lattice) -> SpinModes {
        debug_assert_eq!(self.kernels.len(), lattice.width());
        let norm = 1.0 / (lattice.len() as f64).sqrt();
        let mut q0 = 0.0;
        let mut qx = Complex64::new(0.0, 0.0);

        for (index, spin) in lattice.spins().iter().enumerate() {
            let s = spin.as_f64();
            q0 += s;
            qx += self.kernels[index % lattice.width()] * s;
        }

        SpinModes {
            q0: q0 * norm,
            qx: qx * norm,
        }
    }
}

/// Second-moment correlation length from averaged S(0) and S(q_min)
///
/// ξ = sqrt(S(0)/S(q_min) - 1) / (2 sin(q_min/2)); `None` when S(q_min) is zero
/// or the ratio is below one.
pub fn correlation_length(s_q0: f64, s_qx: f64, width: usize) -> Option<f64> {
    if s_qx <= 0.0 {
        return None;
    }
    let ratio = s_q0 / s_qx - 1.0;
    if ratio < 0.0 {
        return None;
    }
    let q = 2.0 * PI / width as f64;
    Some(ratio.sqrt() / (2.0 * (q / 2.0).sin()))
}

const ARANGE_TOLERANCE: f64 = 1e-9;

/// Evenly spaced values from `start` towards `stop` (exclusive).
///
/// A trailing partial step still yields a value; `stop` itself is excluded
/// even when rounding puts the last multiple a hair below it. Returns `None`
/// for a zero step or a step pointing away from `stop`.
pub fn arange(start: f64, stop: f64, step: f64) -> Option<Vec<f64>> {
    if step == 0.0 || !step.is_finite() {
        return None;
    }
    if stop == start {
        return Some(Vec::new());
    }
    if step.signum() != (stop - start).signum() {
        return None;
    }
    let count = ((stop - start) / step - ARANGE_TOLERANCE).ceil() as usize;
    Some((0..count).map(|i| start + step * i as f64).collect())
}
