//! Per-cell terrain fields: availability, ownership and elevation envelope.
//!
//! Two interchangeable strategies implement [`TerrainField`]. They share the
//! same elevation envelope and differ in which cells are land and who owns
//! them. The strategy for a run is picked once via [`TerrainVariant`].

use serde::{Deserialize, Serialize};

use crate::canopy::canopy_height;
use crate::config::Grid;
use crate::noise_field::NoiseField;
use crate::ownership::{OwnershipField, UNOWNED};
use crate::seeds::GridSeeds;

// Base terrain (meters)
const BASE_ELEVATION: f64 = 10.0;
const WAVE_X_AMPLITUDE: f64 = 5.0;
const WAVE_X_PERIOD: f64 = 30.0;
const WAVE_Y_AMPLITUDE: f64 = 3.0;
const WAVE_Y_PERIOD: f64 = 40.0;
const HILL_HEIGHT: f64 = 20.0;
const HILL_SPREAD: f64 = 40_000.0;

/// Side of a checkerboard block, in cells
const CHECKER_BLOCK: usize = 10;

/// Terrain strategy selector
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TerrainVariant {
    /// Every cell is land, owned in clusters
    #[default]
    Realistic,
    /// 10×10 checkerboard of land, nobody owns anything
    Checkerboard,
}

impl TerrainVariant {
    pub fn all() -> &'static [Self] {
        &[Self::Realistic, Self::Checkerboard]
    }
}

impl std::fmt::Display for TerrainVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Realistic => write!(f, "realistic"),
            Self::Checkerboard => write!(f, "checkerboard"),
        }
    }
}

/// Height range of a cell (meters, unrounded)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Elevation {
    /// Ground level
    pub min_h: f64,
    /// Top of the canopy
    pub max_h: f64,
}

/// What the terrain says about one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellSample {
    /// Not land; carries no owner and no elevation
    Unavailable,
    Land { owner: u32, elevation: Elevation },
}

/// Capability set shared by all terrain strategies.
pub trait TerrainField: Send + Sync {
    fn is_available(&self, x: usize, y: usize) -> bool;

    fn owner_of(&self, x: usize, y: usize) -> u32;

    fn elevation_envelope(&self, x: usize, y: usize) -> Elevation;

    /// Evaluate a cell. Owner and elevation are only computed for land.
    fn sample(&self, x: usize, y: usize) -> CellSample {
        if !self.is_available(x, y) {
            return CellSample::Unavailable;
        }
        CellSample::Land {
            owner: self.owner_of(x, y),
            elevation: self.elevation_envelope(x, y),
        }
    }
}

/// Closed-form ground plus noise canopy, shared by both strategies.
///
/// The hill is centered on the whole grid, so the envelope depends on the
/// grid extent as well as the cell.
#[derive(Clone, Debug)]
pub struct ElevationModel {
    center_x: f64,
    center_y: f64,
    canopy: NoiseField,
}

impl ElevationModel {
    pub fn new(grid: &Grid, canopy: NoiseField) -> Self {
        Self {
            center_x: grid.width as f64 / 2.0,
            center_y: grid.height as f64 / 2.0,
            canopy,
        }
    }

    pub fn wave(&self, x: f64, y: f64) -> f64 {
        (x / WAVE_X_PERIOD).sin() * WAVE_X_AMPLITUDE + (y / WAVE_Y_PERIOD).cos() * WAVE_Y_AMPLITUDE
    }

    /// Single radial bump at the grid center.
    pub fn hill(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        HILL_HEIGHT * (-(dx * dx + dy * dy) / HILL_SPREAD).exp()
    }

    pub fn envelope(&self, x: usize, y: usize) -> Elevation {
        let (fx, fy) = (x as f64, y as f64);
        let min_h = BASE_ELEVATION + self.wave(fx, fy) + self.hill(fx, fy);
        let max_h = min_h + canopy_height(&self.canopy, fx, fy);
        Elevation { min_h, max_h }
    }
}

/// All land, clustered ownership.
#[derive(Clone, Debug)]
pub struct RealisticTerrain {
    elevation: ElevationModel,
    ownership: OwnershipField,
}

impl RealisticTerrain {
    pub fn new(elevation: ElevationModel, ownership: OwnershipField) -> Self {
        Self {
            elevation,
            ownership,
        }
    }
}

impl TerrainField for RealisticTerrain {
    fn is_available(&self, _x: usize, _y: usize) -> bool {
        true
    }

    fn owner_of(&self, x: usize, y: usize) -> u32 {
        self.ownership.owner_of(x, y)
    }

    fn elevation_envelope(&self, x: usize, y: usize) -> Elevation {
        self.elevation.envelope(x, y)
    }
}

/// Checkerboard land, no owners.
#[derive(Clone, Debug)]
pub struct CheckerboardTerrain {
    elevation: ElevationModel,
}

impl CheckerboardTerrain {
    pub fn new(elevation: ElevationModel) -> Self {
        Self { elevation }
    }
}

impl TerrainField for CheckerboardTerrain {
    fn is_available(&self, x: usize, y: usize) -> bool {
        (x / CHECKER_BLOCK + y / CHECKER_BLOCK) % 2 == 0
    }

    fn owner_of(&self, _x: usize, _y: usize) -> u32 {
        UNOWNED
    }

    fn elevation_envelope(&self, x: usize, y: usize) -> Elevation {
        self.elevation.envelope(x, y)
    }
}

/// The strategy wired into a run.
#[derive(Clone, Debug)]
pub enum TerrainModel {
    Realistic(RealisticTerrain),
    Checkerboard(CheckerboardTerrain),
}

impl TerrainModel {
    pub fn new(variant: TerrainVariant, grid: &Grid, seeds: &GridSeeds) -> Self {
        let elevation = ElevationModel::new(grid, NoiseField::new(seeds.canopy_u32()));
        match variant {
            TerrainVariant::Realistic => {
                Self::Realistic(RealisticTerrain::new(elevation, OwnershipField::default()))
            }
            TerrainVariant::Checkerboard => Self::Checkerboard(CheckerboardTerrain::new(elevation)),
        }
    }

    pub fn variant(&self) -> TerrainVariant {
        match self {
            Self::Realistic(_) => TerrainVariant::Realistic,
            Self::Checkerboard(_) => TerrainVariant::Checkerboard,
        }
    }
}

impl TerrainField for TerrainModel {
    fn is_available(&self, x: usize, y: usize) -> bool {
        match self {
            Self::Realistic(t) => t.is_available(x, y),
            Self::Checkerboard(t) => t.is_available(x, y),
        }
    }

    fn owner_of(&self, x: usize, y: usize) -> u32 {
        match self {
            Self::Realistic(t) => t.owner_of(x, y),
            Self::Checkerboard(t) => t.owner_of(x, y),
        }
    }

    fn elevation_envelope(&self, x: usize, y: usize) -> Elevation {
        match self {
            Self::Realistic(t) => t.elevation_envelope(x, y),
            Self::Checkerboard(t) => t.elevation_envelope(x, y),
        }
    }
}
