//! Grid-wide metadata rollup.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::chunk::ChunkSummary;
use crate::config::Grid;
use crate::error::GenerationError;
use crate::projection::CoordinateProjector;

/// File name of the metadata payload
pub const METADATA_FILE: &str = "grid-metadata.json";

/// Lookup structure describing every chunk of a generated grid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub origin_lon: f64,
    pub origin_lat: f64,
    pub width: usize,
    pub height: usize,
    pub chunk_size: usize,
    pub total_chunks_x: usize,
    pub total_chunks_y: usize,
    /// `[minLon, minLat, maxLon, maxLat]`
    pub bounding_box: [f64; 4],
    /// Chunk summaries indexed `[row][col]`
    pub lookup: Vec<Vec<ChunkSummary>>,
}

impl Metadata {
    pub fn summary(&self, row: usize, col: usize) -> Option<&ChunkSummary> {
        self.lookup.get(row).and_then(|r| r.get(col))
    }

    pub fn summaries(&self) -> impl Iterator<Item = &ChunkSummary> {
        self.lookup.iter().flatten()
    }

    /// Fraction of all cells that are available, weighted by chunk size.
    pub fn overall_availability(&self) -> f64 {
        let total = (self.width * self.height) as f64;
        if total == 0.0 {
            return 0.0;
        }
        let mut available = 0.0;
        for (row, cols) in self.lookup.iter().enumerate() {
            for (col, summary) in cols.iter().enumerate() {
                let w = self
                    .chunk_size
                    .min(self.width.saturating_sub(col * self.chunk_size));
                let h = self
                    .chunk_size
                    .min(self.height.saturating_sub(row * self.chunk_size));
                available += summary.availability_rate * (w * h) as f64;
            }
        }
        available / total
    }

    /// Check that the chunk counts and lookup table agree with the grid size.
    pub fn check_shape(&self) -> Result<(), GenerationError> {
        if self.width == 0 || self.height == 0 || self.chunk_size == 0 {
            return Err(GenerationError::Rollup(format!(
                "degenerate grid {}x{} with chunk size {}",
                self.width, self.height, self.chunk_size
            )));
        }
        let cols = self.width.div_ceil(self.chunk_size);
        let rows = self.height.div_ceil(self.chunk_size);
        if (self.total_chunks_x, self.total_chunks_y) != (cols, rows) {
            return Err(GenerationError::Rollup(format!(
                "chunk counts {}x{} do not match a {}x{} grid of {} chunks",
                self.total_chunks_x, self.total_chunks_y, self.width, self.height, self.chunk_size
            )));
        }
        if self.lookup.len() != rows {
            return Err(GenerationError::Rollup(format!(
                "lookup has {} rows, expected {}",
                self.lookup.len(),
                rows
            )));
        }
        if let Some((row, r)) = self.lookup.iter().enumerate().find(|(_, r)| r.len() != cols) {
            return Err(GenerationError::Rollup(format!(
                "lookup row {} has {} columns, expected {}",
                row,
                r.len(),
                cols
            )));
        }
        Ok(())
    }

    /// Lowest and highest height over all chunks with land.
    pub fn height_range(&self) -> Option<(i32, i32)> {
        let min = self.summaries().filter_map(|s| s.min_h).min()?;
        let max = self.summaries().filter_map(|s| s.max_h).max()?;
        Some((min, max))
    }
}

/// Assemble the metadata from per-chunk summaries.
///
/// `summaries` must hold exactly one entry per chunk in row-major order.
pub fn rollup<P: CoordinateProjector>(
    grid: &Grid,
    projector: &P,
    summaries: Vec<ChunkSummary>,
) -> Result<Metadata, GenerationError> {
    let cols = grid.total_chunks_x();
    let rows = grid.total_chunks_y();

    if summaries.len() != rows * cols {
        return Err(GenerationError::Rollup(format!(
            "expected {}x{} = {} chunk summaries, got {}",
            cols,
            rows,
            rows * cols,
            summaries.len()
        )));
    }

    let mut lookup: Vec<Vec<ChunkSummary>> = Vec::with_capacity(rows);
    let mut iter = summaries.into_iter();
    for row in 0..rows {
        let row_summaries: Vec<ChunkSummary> = iter.by_ref().take(cols).collect();
        for (col, summary) in row_summaries.iter().enumerate() {
            let expected = crate::chunk::chunk_file_name(row, col);
            if summary.file != expected {
                return Err(GenerationError::Rollup(format!(
                    "slot r{}c{} holds {}, expected {}",
                    row, col, summary.file, expected
                )));
            }
        }
        lookup.push(row_summaries);
    }

    let (min_lon, min_lat) = projector.cell_to_lon_lat(0.0, 0.0, grid.origin_lon, grid.origin_lat);
    let (max_lon, max_lat) = projector.cell_to_lon_lat(
        grid.width as f64,
        grid.height as f64,
        grid.origin_lon,
        grid.origin_lat,
    );

    Ok(Metadata {
        origin_lon: grid.origin_lon,
        origin_lat: grid.origin_lat,
        width: grid.width,
        height: grid.height,
        chunk_size: grid.chunk_size,
        total_chunks_x: cols,
        total_chunks_y: rows,
        bounding_box: [min_lon, min_lat, max_lon, max_lat],
        lookup,
    })
}

/// Read a metadata file written by a previous run.
///
/// The lookup shape is checked against the grid size before it is returned.
pub fn load_metadata(path: &Path) -> Result<Metadata, GenerationError> {
    let contents = fs::read(path).map_err(|source| crate::storage::SinkError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let metadata: Metadata = serde_json::from_slice(&contents)?;
    metadata.check_shape()?;
    Ok(metadata)
}
