//! Seed management for grid synthesis
//!
//! A run is keyed by a single textual seed (e.g. `"amazon-canopy"`). Every
//! seeded field gets its own sub-seed derived from it, so changing how one
//! field consumes randomness never shifts another.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Seeds for all seeded fields of a generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridSeeds {
    /// Master seed hashed from the configured text
    pub master: u64,
    /// Canopy noise field
    pub canopy: u64,
}

impl GridSeeds {
    /// Derive all seeds from the textual run seed.
    ///
    /// Hashing uses `DefaultHasher`, whose output is only stable for one build
    /// of the toolchain. Reruns are byte-identical with the same binary.
    pub fn from_text(text: &str) -> Self {
        Self::from_master(hash_text(text))
    }

    /// Derive all sub-seeds from a numeric master seed.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            canopy: derive_seed(master, "canopy"),
        }
    }

    /// Override the canopy seed, keeping the master for display.
    pub fn with_canopy(mut self, seed: u64) -> Self {
        self.canopy = seed;
        self
    }

    /// The canopy seed narrowed to the width accepted by the noise generators.
    pub fn canopy_u32(&self) -> u32 {
        (self.canopy ^ (self.canopy >> 32)) as u32
    }
}

fn hash_text(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

/// Derive a sub-seed from a master seed and a field name.
fn derive_seed(master: u64, field: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    field.hash(&mut hasher);
    hasher.finish()
}

impl std::fmt::Display for GridSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GridSeeds {{ master: {}, canopy: {} }}", self.master, self.canopy)
    }
}
