//! Run configuration.
//!
//! A [`GridConfig`] is what the user supplies (defaults, a JSON file, CLI
//! overrides). [`GridConfig::validate`] turns it into the immutable [`Grid`]
//! geometry the generator works on.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::terrain::TerrainVariant;

/// Default textual seed for the canopy noise
pub const DEFAULT_SEED: &str = "amazon-canopy";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Chunk side in cells
    pub chunk_size: usize,
    /// Longitude of cell (0, 0)
    pub origin_lon: f64,
    /// Latitude of cell (0, 0)
    pub origin_lat: f64,
    /// Textual seed for all seeded fields
    pub seed: String,
    pub terrain_variant: TerrainVariant,
    /// Directory chunk and metadata files are written to
    pub output_dir: PathBuf,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1000,
            chunk_size: 64,
            origin_lon: -74.0,
            origin_lat: 40.7,
            seed: DEFAULT_SEED.to_string(),
            terrain_variant: TerrainVariant::Realistic,
            output_dir: PathBuf::from("output/data64"),
        }
    }
}

impl GridConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Check the configuration and build the grid geometry.
    pub fn validate(&self) -> Result<Grid, ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::Invalid("width must be positive".into()));
        }
        if self.height == 0 {
            return Err(ConfigError::Invalid("height must be positive".into()));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunkSize must be positive".into()));
        }
        if !self.origin_lon.is_finite() || !self.origin_lat.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "origin ({}, {}) must be finite",
                self.origin_lon, self.origin_lat
            )));
        }
        // Longitude scaling divides by cos(lat)
        if self.origin_lat.abs() >= 90.0 {
            return Err(ConfigError::Invalid(format!(
                "originLat {} must lie strictly between -90 and 90",
                self.origin_lat
            )));
        }

        Ok(Grid {
            width: self.width,
            height: self.height,
            chunk_size: self.chunk_size,
            origin_lon: self.origin_lon,
            origin_lat: self.origin_lat,
        })
    }
}

/// Validated grid geometry. Immutable for a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    pub chunk_size: usize,
    pub origin_lon: f64,
    pub origin_lat: f64,
}

impl Grid {
    pub fn total_chunks_x(&self) -> usize {
        self.width.div_ceil(self.chunk_size)
    }

    pub fn total_chunks_y(&self) -> usize {
        self.height.div_ceil(self.chunk_size)
    }

    pub fn total_chunks(&self) -> usize {
        self.total_chunks_x() * self.total_chunks_y()
    }

    /// Cell extent of chunk `(row, col)`, clipped at the grid edges.
    ///
    /// `None` if the chunk lies outside the grid.
    pub fn chunk_bounds(&self, row: usize, col: usize) -> Option<ChunkBounds> {
        if row >= self.total_chunks_y() || col >= self.total_chunks_x() {
            return None;
        }
        let base_x = col * self.chunk_size;
        let base_y = row * self.chunk_size;
        Some(ChunkBounds {
            row,
            col,
            base_x,
            base_y,
            width: self.chunk_size.min(self.width - base_x),
            height: self.chunk_size.min(self.height - base_y),
        })
    }

    /// All chunk bounds in row-major `(row, col)` order.
    pub fn chunks(&self) -> impl Iterator<Item = ChunkBounds> + '_ {
        let cols = self.total_chunks_x();
        (0..self.total_chunks_y())
            .flat_map(move |row| (0..cols).map(move |col| (row, col)))
            .filter_map(move |(row, col)| self.chunk_bounds(row, col))
    }
}

/// Placement of one chunk within the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkBounds {
    pub row: usize,
    pub col: usize,
    /// Global x of the chunk's first cell
    pub base_x: usize,
    /// Global y of the chunk's first cell
    pub base_y: usize,
    pub width: usize,
    pub height: usize,
}

impl ChunkBounds {
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Global coordinates of the chunk's cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let (base_x, base_y, width) = (self.base_x, self.base_y, self.width);
        (0..self.height).flat_map(move |y| (0..width).map(move |x| (base_x + x, base_y + y)))
    }
}
