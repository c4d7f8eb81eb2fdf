//! Clustered land ownership.
//!
//! Land is split into square clusters of `field_size` cells. Each query
//! rebuilds a generator from the cluster's spatial hash, so every cell of a
//! cluster sees the same draws and therefore the same owner.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Spatial hash primes for the cluster seed
const HASH_PRIME_X: i64 = 73_856_093;
const HASH_PRIME_Y: i64 = 19_349_663;

/// Owner id of unowned land
pub const UNOWNED: u32 = 0;

/// Parameters of the ownership assignment
#[derive(Clone, Debug, PartialEq)]
pub struct OwnershipParams {
    /// Side of a square ownership cluster, in cells
    pub field_size: usize,
    /// Probability a cluster is free land
    pub free_land_chance: f64,
    /// Owners are labeled `1..=total_owners`
    pub total_owners: u32,
}

impl Default for OwnershipParams {
    fn default() -> Self {
        Self {
            field_size: 20,
            free_land_chance: 0.15,
            total_owners: 10,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct OwnershipField {
    params: OwnershipParams,
}

impl OwnershipField {
    pub fn new(params: OwnershipParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &OwnershipParams {
        &self.params
    }

    /// Cluster coordinates containing a cell.
    pub fn cluster_of(&self, x: usize, y: usize) -> (usize, usize) {
        (x / self.params.field_size, y / self.params.field_size)
    }

    /// Owner of the cell at `(x, y)`; [`UNOWNED`] for free land.
    pub fn owner_of(&self, x: usize, y: usize) -> u32 {
        let (cluster_x, cluster_y) = self.cluster_of(x, y);
        let mut rng = ChaCha8Rng::seed_from_u64(cluster_seed(cluster_x, cluster_y) as u64);

        let free_draw: f64 = rng.gen();
        if free_draw < self.params.free_land_chance {
            return UNOWNED;
        }

        let owner_draw: f64 = rng.gen();
        let owner = (owner_draw * self.params.total_owners as f64).floor() as u32 + 1;
        owner.min(self.params.total_owners)
    }
}

/// Spatial hash of a cluster, evaluated in 32-bit two's complement.
pub fn cluster_seed(cluster_x: usize, cluster_y: usize) -> u32 {
    let hx = (cluster_x as i64).wrapping_mul(HASH_PRIME_X) as i32;
    let hy = (cluster_y as i64).wrapping_mul(HASH_PRIME_Y) as i32;
    (hx ^ hy) as u32
}
