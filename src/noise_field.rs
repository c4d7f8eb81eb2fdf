//! Seeded continuous 2D noise field.

use noise::{NoiseFn, Simplex};

/// Spatially coherent pseudo-random field over the plane.
///
/// Wraps a seeded simplex generator. The same seed and coordinate always give
/// the same value, and nearby coordinates give similar values.
#[derive(Clone)]
pub struct NoiseField {
    seed: u32,
    simplex: Simplex,
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            simplex: Simplex::new(seed),
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Sample the field. Output is in [-1, 1].
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        self.simplex.get([x, y]).clamp(-1.0, 1.0)
    }
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").field("seed", &self.seed).finish()
    }
}
