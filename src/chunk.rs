//! Chunk assembly and per-chunk aggregation.
//!
//! A chunk is built from its cells in row-major order. Heights are rounded to
//! whole meters when each cell is built; the chunk extrema are taken over the
//! rounded values of available cells only. Payloads are gzipped JSON.

use std::io::{self, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::config::{ChunkBounds, Grid};
use crate::error::GenerationError;
use crate::projection::CoordinateProjector;
use crate::terrain::{CellSample, TerrainField};

/// One cell as written to a chunk payload.
///
/// `o`, `minH` and `maxH` are absent for unavailable cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Availability flag (1 = land)
    pub a: u8,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub o: Option<u32>,
    #[serde(rename = "minH", skip_serializing_if = "Option::is_none", default)]
    pub min_h: Option<i32>,
    #[serde(rename = "maxH", skip_serializing_if = "Option::is_none", default)]
    pub max_h: Option<i32>,
}

impl Cell {
    pub fn unavailable() -> Self {
        Self {
            a: 0,
            o: None,
            min_h: None,
            max_h: None,
        }
    }

    pub fn from_sample(sample: CellSample) -> Self {
        match sample {
            CellSample::Unavailable => Self::unavailable(),
            CellSample::Land { owner, elevation } => Self {
                a: 1,
                o: Some(owner),
                min_h: Some(round_meters(elevation.min_h)),
                max_h: Some(round_meters(elevation.max_h)),
            },
        }
    }

    pub fn is_available(&self) -> bool {
        self.a == 1
    }

    pub fn is_owned(&self) -> bool {
        self.o.is_some_and(|o| o > 0)
    }
}

/// Round to the nearest meter, halves toward +inf.
pub fn round_meters(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

/// Cells of one chunk plus its geographic anchor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Longitude of the chunk's first cell
    pub lon: f64,
    /// Latitude of the chunk's first cell
    pub lat: f64,
    pub width: usize,
    pub height: usize,
    /// Row-major
    pub cells: Vec<Cell>,
}

/// Rollup of one chunk as stored in the metadata lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkSummary {
    /// File name of the chunk payload
    pub file: String,
    /// Lowest ground over available cells; `None` if none are available
    #[serde(rename = "minH")]
    pub min_h: Option<i32>,
    /// Highest canopy top over available cells; `None` if none are available
    #[serde(rename = "maxH")]
    pub max_h: Option<i32>,
    pub availability_rate: f64,
    pub occupancy_rate: f64,
}

/// Running aggregates while a chunk is filled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkStats {
    pub total: usize,
    pub available: usize,
    pub owned: usize,
    pub min_h: Option<i32>,
    pub max_h: Option<i32>,
}

impl ChunkStats {
    pub fn add(&mut self, cell: &Cell) {
        self.total += 1;
        if !cell.is_available() {
            return;
        }
        self.available += 1;
        if cell.is_owned() {
            self.owned += 1;
        }
        if let Some(h) = cell.min_h {
            self.min_h = Some(self.min_h.map_or(h, |m| m.min(h)));
        }
        if let Some(h) = cell.max_h {
            self.max_h = Some(self.max_h.map_or(h, |m| m.max(h)));
        }
    }

    pub fn from_cells<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Self {
        let mut stats = Self::default();
        for cell in cells {
            stats.add(cell);
        }
        stats
    }

    pub fn availability_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.available as f64 / self.total as f64
    }

    pub fn occupancy_rate(&self) -> f64 {
        self.owned as f64 / self.available.max(1) as f64
    }

    pub fn summary(&self, file: String) -> ChunkSummary {
        ChunkSummary {
            file,
            min_h: self.min_h,
            max_h: self.max_h,
            availability_rate: self.availability_rate(),
            occupancy_rate: self.occupancy_rate(),
        }
    }
}

/// Payload file name for chunk `(row, col)`.
pub fn chunk_file_name(row: usize, col: usize) -> String {
    format!("g-r{}c{}.json.gz", row, col)
}

/// Gzip a serialized payload.
pub fn gzip(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 4), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Serialize a chunk to compact JSON and gzip it.
///
/// Returns the gzipped payload and the size of the raw JSON.
pub fn encode_chunk(chunk: &Chunk) -> Result<(Vec<u8>, usize), GenerationError> {
    let json = serde_json::to_vec(chunk)?;
    let payload = gzip(&json).map_err(GenerationError::Compression)?;
    Ok((payload, json.len()))
}

/// Inverse of [`encode_chunk`].
pub fn decode_chunk(payload: &[u8]) -> Result<Chunk, GenerationError> {
    let mut json = Vec::new();
    GzDecoder::new(payload)
        .read_to_end(&mut json)
        .map_err(GenerationError::Compression)?;
    Ok(serde_json::from_slice(&json)?)
}

/// Builds chunks from a terrain strategy and a projector.
pub struct ChunkAssembler<'a, T: TerrainField, P: CoordinateProjector> {
    grid: &'a Grid,
    terrain: &'a T,
    projector: &'a P,
}

impl<'a, T: TerrainField, P: CoordinateProjector> ChunkAssembler<'a, T, P> {
    pub fn new(grid: &'a Grid, terrain: &'a T, projector: &'a P) -> Self {
        Self {
            grid,
            terrain,
            projector,
        }
    }

    /// Build chunk `(row, col)` and its summary.
    pub fn assemble(
        &self,
        row: usize,
        col: usize,
    ) -> Result<(Chunk, ChunkSummary), GenerationError> {
        let bounds = self
            .grid
            .chunk_bounds(row, col)
            .ok_or(GenerationError::ChunkOutOfRange {
                row,
                col,
                rows: self.grid.total_chunks_y(),
                cols: self.grid.total_chunks_x(),
            })?;
        let (lon, lat) = self.projector.cell_to_lon_lat(
            bounds.base_x as f64,
            bounds.base_y as f64,
            self.grid.origin_lon,
            self.grid.origin_lat,
        );

        let mut cells = Vec::with_capacity(bounds.cell_count());
        let mut stats = ChunkStats::default();
        for (x, y) in bounds.cells() {
            let cell = Cell::from_sample(self.terrain.sample(x, y));
            stats.add(&cell);
            cells.push(cell);
        }

        let summary = stats.summary(chunk_file_name(row, col));
        check_summary(&bounds, &summary)?;

        let chunk = Chunk {
            lon,
            lat,
            width: bounds.width,
            height: bounds.height,
            cells,
        };
        Ok((chunk, summary))
    }
}

/// Reject summaries that can only come from a logic defect.
pub fn check_summary(
    bounds: &ChunkBounds,
    summary: &ChunkSummary,
) -> Result<(), GenerationError> {
    let fail = |detail: String| GenerationError::Aggregation {
        row: bounds.row,
        col: bounds.col,
        detail,
    };

    match (summary.min_h, summary.max_h) {
        (Some(lo), Some(hi)) if lo > hi => {
            return Err(fail(format!("minH {} exceeds maxH {}", lo, hi)));
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(fail("only one height extremum present".to_string()));
        }
        _ => {}
    }
    for (name, rate) in [
        ("availability_rate", summary.availability_rate),
        ("occupancy_rate", summary.occupancy_rate),
    ] {
        if !(0.0..=1.0).contains(&rate) {
            return Err(fail(format!("{} {} outside [0, 1]", name, rate)));
        }
    }
    Ok(())
}

/// Re-derive a summary from a chunk's cells.
pub fn resummarize(chunk: &Chunk, file: String) -> ChunkSummary {
    ChunkStats::from_cells(&chunk.cells).summary(file)
}
