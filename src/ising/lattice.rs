use crate::error::{Result, SimError};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// A two-valued spin at a lattice site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Spin {
    Down = -1,
    Up = 1,
}

impl Spin {
    #[inline(always)]
    pub fn value(self) -> i8 {
        self as i8
    }

    #[inline(always)]
    pub fn as_f64(self) -> f64 {
        self.value() as f64
    }

    #[inline(always)]
    pub fn flipped(self) -> Self {
        match self {
            Spin::Up => Spin::Down,
            Spin::Down => Spin::Up,
        }
    }
}

impl From<Spin> for i8 {
    fn from(spin: Spin) -> Self {
        spin.value()
    }
}

/// How a lattice is filled on creation, reset or resize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialState {
    /// All spins +1 (ordered)
    #[default]
    Up,
    /// All spins -1 (ordered)
    Down,
    /// Each spin independently ±1 with probability 1/2
    Random,
}

/// 2D square lattice of spins with periodic (toroidal) boundaries
///
/// Spins are stored row-major: site (x, y) lives at `y * width + x`. Every
/// site has exactly four neighbors, wrapping at the edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice {
    width: usize,
    height: usize,
    spins: Vec<Spin>,
}

impl Lattice {
    /// Create a lattice filled according to `init`.
    ///
    /// The generator is only drawn from for [`InitialState::Random`].
    pub fn new<R: RngCore + ?Sized>(
        width: usize,
        height: usize,
        init: InitialState,
        rng: &mut R,
    ) -> Result<Self> {
        check_dimensions(width, height)?;
        let mut lattice = Self {
            width,
            height,
            spins: vec![Spin::Up; width * height],
        };
        lattice.reinitialize(init, rng);
        Ok(lattice)
    }

    /// Lattice with every site set to `spin`
    pub fn uniform(width: usize, height: usize, spin: Spin) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            spins: vec![spin; width * height],
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of sites N = W * H
    pub fn len(&self) -> usize {
        self.spins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spins.is_empty()
    }

    /// Row-major view of all spins
    pub fn spins(&self) -> &[Spin] {
        &self.spins
    }

    #[inline(always)]
    fn index(&self, x: usize, y: usize) -> usize {
        (y % self.height) * self.width + (x % self.width)
    }

    /// Spin at (x, y); coordinates past the edge wrap around.
    #[inline(always)]
    pub fn get(&self, x: usize, y: usize) -> Spin {
        self.spins[self.index(x, y)]
    }

    /// Spin at signed coordinates with periodic boundary conditions
    pub fn get_periodic(&self, x: i64, y: i64) -> Spin {
        let x = x.rem_euclid(self.width as i64) as usize;
        let y = y.rem_euclid(self.height as i64) as usize;
        self.spins[y * self.width + x]
    }

    #[inline(always)]
    pub fn set(&mut self, x: usize, y: usize, spin: Spin) {
        let index = self.index(x, y);
        self.spins[index] = spin;
    }

    /// Flip the spin at (x, y) and return its new value.
    #[inline(always)]
    pub fn flip(&mut self, x: usize, y: usize) -> Spin {
        let index = self.index(x, y);
        let flipped = self.spins[index].flipped();
        self.spins[index] = flipped;
        flipped
    }

    /// The four nearest neighbors in the order left, right, up, down
    #[inline(always)]
    pub fn neighbors(&self, x: usize, y: usize) -> [Spin; 4] {
        let x = x % self.width;
        let y = y % self.height;
        let left = (x + self.width - 1) % self.width;
        let right = (x + 1) % self.width;
        let up = (y + self.height - 1) % self.height;
        let down = (y + 1) % self.height;
        [
            self.spins[y * self.width + left],
            self.spins[y * self.width + right],
            self.spins[up * self.width + x],
            self.spins[down * self.width + x],
        ]
    }

    /// Sum of the four neighboring spins, in [-4, 4]
    #[inline(always)]
    pub fn neighbor_sum(&self, x: usize, y: usize) -> i32 {
        self.neighbors(x, y)
            .iter()
            .map(|s| s.value() as i32)
            .sum()
    }

    /// Sum of all spins, in [-N, N]
    pub fn spin_sum(&self) -> i64 {
        self.spins.iter().map(|s| s.value() as i64).sum()
    }

    /// Refill every site, discarding prior state.
    pub fn reinitialize<R: RngCore + ?Sized>(&mut self, init: InitialState, rng: &mut R) {
        match init {
            InitialState::Up => self.spins.fill(Spin::Up),
            InitialState::Down => self.spins.fill(Spin::Down),
            InitialState::Random => self.spins.fill_with(|| random_spin(rng)),
        }
    }

    /// Reallocate with new dimensions. On error the lattice is untouched.
    pub fn resize<R: RngCore + ?Sized>(
        &mut self,
        width: usize,
        height: usize,
        init: InitialState,
        rng: &mut R,
    ) -> Result<()> {
        check_dimensions(width, height)?;
        self.width = width;
        self.height = height;
        self.spins = vec![Spin::Up; width * height];
        self.reinitialize(init, rng);
        Ok(())
    }
}

/// Top bit of one 64-bit draw decides the spin.
fn random_spin<R: RngCore + ?Sized>(rng: &mut R) -> Spin {
    if rng.next_u64() >> 63 == 0 {
        Spin::Up
    } else {
        Spin::Down
    }
}

pub(crate) fn check_dimensions(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(SimError::InvalidDimensions { width, height });
    }
    Ok(())
}
