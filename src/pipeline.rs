//! Full generation run: every chunk, then the metadata.
//!
//! Chunks are independent, so they are assembled, serialized, gzipped and
//! handed to the sink in parallel with rayon. The metadata rollup waits for all
//! of them.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::chunk::{encode_chunk, Chunk, ChunkAssembler, ChunkSummary};
use crate::config::{Grid, GridConfig};
use crate::error::GenerationError;
use crate::metadata::{self, Metadata};
use crate::projection::{CoordinateProjector, MetricProjector};
use crate::seeds::GridSeeds;
use crate::storage::PersistenceSink;
use crate::terrain::TerrainModel;

/// Everything fixed for one run.
pub struct Generator<P: CoordinateProjector = MetricProjector> {
    grid: Grid,
    terrain: TerrainModel,
    projector: P,
    seeds: GridSeeds,
}

/// Outcome of a run.
#[derive(Clone, Debug)]
pub struct GenerationReport {
    pub metadata: Metadata,
    pub chunks_written: usize,
    /// Sum of all chunk JSON sizes before compression
    pub raw_chunk_bytes: usize,
    /// Sum of all gzipped chunk payload sizes
    pub chunk_bytes: usize,
    pub metadata_bytes: usize,
}

impl Generator<MetricProjector> {
    pub fn from_config(config: &GridConfig) -> Result<Self, GenerationError> {
        Self::with_projector(config, MetricProjector)
    }
}

impl<P: CoordinateProjector> Generator<P> {
    pub fn with_projector(config: &GridConfig, projector: P) -> Result<Self, GenerationError> {
        let grid = config.validate()?;
        let seeds = GridSeeds::from_text(&config.seed);
        let terrain = TerrainModel::new(config.terrain_variant, &grid, &seeds);
        Ok(Self {
            grid,
            terrain,
            projector,
            seeds,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn terrain(&self) -> &TerrainModel {
        &self.terrain
    }

    pub fn seeds(&self) -> &GridSeeds {
        &self.seeds
    }

    fn assembler(&self) -> ChunkAssembler<'_, TerrainModel, P> {
        ChunkAssembler::new(&self.grid, &self.terrain, &self.projector)
    }

    /// Build one chunk without persisting it.
    pub fn chunk(
        &self,
        row: usize,
        col: usize,
    ) -> Result<(Chunk, ChunkSummary), GenerationError> {
        self.assembler().assemble(row, col)
    }

    /// Build every chunk in memory, row-major.
    pub fn chunks(&self) -> Result<Vec<(Chunk, ChunkSummary)>, GenerationError> {
        let assembler = self.assembler();
        let bounds: Vec<_> = self.grid.chunks().collect();
        bounds
            .par_iter()
            .map(|b| assembler.assemble(b.row, b.col))
            .collect()
    }

    /// Generate, serialize and persist every chunk, then the metadata.
    pub fn run<S: PersistenceSink>(&self, sink: &S) -> Result<GenerationReport, GenerationError> {
        info!(
            width = self.grid.width,
            height = self.grid.height,
            chunk_size = self.grid.chunk_size,
            variant = %self.terrain.variant(),
            "generating {}x{} chunks",
            self.grid.total_chunks_x(),
            self.grid.total_chunks_y()
        );

        let assembler = self.assembler();
        let bounds: Vec<_> = self.grid.chunks().collect();

        // Ordered collect keeps row-major order regardless of scheduling
        let written: Vec<(ChunkSummary, usize, usize)> = bounds
            .par_iter()
            .map(|b| -> Result<(ChunkSummary, usize, usize), GenerationError> {
                let (chunk, summary) = assembler.assemble(b.row, b.col)?;
                let (payload, raw_bytes) = encode_chunk(&chunk)?;
                debug!(
                    row = b.row,
                    col = b.col,
                    raw_bytes,
                    gzip_bytes = payload.len(),
                    "chunk payload"
                );
                sink.write_chunk(b.row, b.col, &summary.file, &payload)?;
                debug!(row = b.row, col = b.col, file = %summary.file, "saved chunk");
                Ok((summary, raw_bytes, payload.len()))
            })
            .collect::<Result<_, _>>()?;

        let chunks_written = written.len();
        let raw_chunk_bytes: usize = written.iter().map(|(_, raw, _)| raw).sum();
        let chunk_bytes: usize = written.iter().map(|(_, _, gz)| gz).sum();
        let summaries = written.into_iter().map(|(s, _, _)| s).collect();

        let metadata = metadata::rollup(&self.grid, &self.projector, summaries)?;
        let payload = serde_json::to_vec_pretty(&metadata)?;
        sink.write_metadata(&payload)?;
        info!(
            chunks = chunks_written,
            raw_chunk_bytes,
            chunk_bytes,
            "saved metadata"
        );

        Ok(GenerationReport {
            metadata,
            chunks_written,
            raw_chunk_bytes,
            chunk_bytes,
            metadata_bytes: payload.len(),
        })
    }
}

/// Validate `config` and run it into `sink` with the default projection.
pub fn generate<S: PersistenceSink>(
    config: &GridConfig,
    sink: &S,
) -> Result<GenerationReport, GenerationError> {
    Generator::from_config(config)?.run(sink)
}

/// True if every available cell of a chunk has `minH <= maxH`.
pub fn elevation_ordered(chunk: &Chunk) -> bool {
    chunk
        .cells
        .iter()
        .filter(|c| c.is_available())
        .all(|c| matches!((c.min_h, c.max_h), (Some(lo), Some(hi)) if lo <= hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{decode_chunk, resummarize};
    use crate::storage::MemorySink;
    use crate::terrain::TerrainVariant;

    fn config(
        width: usize,
        height: usize,
        chunk_size: usize,
        variant: TerrainVariant,
    ) -> GridConfig {
        GridConfig {
            width,
            height,
            chunk_size,
            terrain_variant: variant,
            ..GridConfig::default()
        }
    }

    #[test]
    fn test_run_writes_every_chunk() {
        let sink = MemorySink::new();
        let report = generate(&config(130, 70, 32, TerrainVariant::Realistic), &sink).unwrap();
        assert_eq!(report.chunks_written, 5 * 3);
        assert_eq!(sink.chunk_count(), 15);
        assert!(sink.metadata().is_some());
        assert_eq!(report.metadata.lookup.len(), 3);
        assert!(report.metadata.lookup.iter().all(|r| r.len() == 5));
    }

    #[test]
    fn test_payload_round_trip_matches_summary() {
        let sink = MemorySink::new();
        let report = generate(&config(100, 100, 64, TerrainVariant::Checkerboard), &sink).unwrap();
        for (row, cols) in report.metadata.lookup.iter().enumerate() {
            for (col, summary) in cols.iter().enumerate() {
                let bytes = sink.chunk(row, col).unwrap();
                let chunk = decode_chunk(&bytes).unwrap();
                assert!(summary.file.ends_with(".json.gz"));
                assert_eq!(&resummarize(&chunk, summary.file.clone()), summary);
                assert!(elevation_ordered(&chunk));
            }
        }
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let sink = MemorySink::new();
        let result = generate(&config(0, 10, 4, TerrainVariant::Realistic), &sink);
        assert!(matches!(result, Err(GenerationError::Configuration(_))));
        assert_eq!(sink.chunk_count(), 0);
    }

    #[test]
    fn test_chunks_match_run() {
        let generator =
            Generator::from_config(&config(70, 40, 16, TerrainVariant::Realistic)).unwrap();
        let in_memory = generator.chunks().unwrap();
        let sink = MemorySink::new();
        generator.run(&sink).unwrap();
        let written = sink.chunks();
        assert_eq!(in_memory.len(), written.len());
        for ((chunk, summary), (file, bytes)) in in_memory.iter().zip(written.iter()) {
            assert_eq!(&summary.file, file);
            assert_eq!(&encode_chunk(chunk).unwrap().0, bytes);
        }
    }

    #[test]
    fn test_generator_uses_configured_variant() {
        use crate::terrain::TerrainField;
        let generator =
            Generator::from_config(&config(40, 40, 16, TerrainVariant::Checkerboard)).unwrap();
        assert_eq!(generator.terrain().variant(), TerrainVariant::Checkerboard);
        assert!(generator.terrain().is_available(5, 5));
        assert!(!generator.terrain().is_available(15, 5));
    }

    #[test]
    fn test_runs_are_byte_identical() {
        for variant in TerrainVariant::all() {
            let cfg = config(150, 110, 48, *variant);
            let first = MemorySink::new();
            let second = MemorySink::new();
            generate(&cfg, &first).unwrap();
            generate(&cfg, &second).unwrap();
            assert_eq!(first.chunks(), second.chunks());
            assert_eq!(first.metadata(), second.metadata());
        }
    }

    #[test]
    fn test_seed_changes_canopy_only() {
        let a = MemorySink::new();
        let b = MemorySink::new();
        let mut other = config(64, 64, 64, TerrainVariant::Realistic);
        generate(&other, &a).unwrap();
        other.seed = "boreal-canopy".to_string();
        generate(&other, &b).unwrap();
        let chunk_a = decode_chunk(&a.chunk(0, 0).unwrap()).unwrap();
        let chunk_b = decode_chunk(&b.chunk(0, 0).unwrap()).unwrap();
        assert_ne!(chunk_a.cells, chunk_b.cells);
        for (ca, cb) in chunk_a.cells.iter().zip(&chunk_b.cells) {
            // Ground and ownership do not depend on the seed
            assert_eq!(ca.o, cb.o);
            assert_eq!(ca.min_h, cb.min_h);
        }
    }

    #[test]
    fn test_checkerboard_example() {
        let generator =
            Generator::from_config(&config(100, 100, 64, TerrainVariant::Checkerboard)).unwrap();
        let sink = MemorySink::new();
        let report = generator.run(&sink).unwrap();
        let metadata = &report.metadata;

        assert_eq!(metadata.total_chunks_x, 2);
        assert_eq!(metadata.total_chunks_y, 2);
        assert_eq!(metadata.bounding_box[0], metadata.origin_lon);
        assert_eq!(metadata.bounding_box[1], metadata.origin_lat);
        assert_eq!(metadata.origin_lon, -74.0);

        let (chunk, _) = generator.chunk(0, 0).unwrap();
        assert_eq!(chunk.cells[5 * 64 + 5].a, 1);
        assert_eq!(chunk.cells[5 * 64 + 15].a, 0);
        assert!(metadata.summaries().all(|s| s.occupancy_rate == 0.0));
    }

    #[test]
    fn test_cluster_constant_ownership_in_payloads() {
        let generator =
            Generator::from_config(&config(100, 60, 32, TerrainVariant::Realistic)).unwrap();
        let mut owners = std::collections::HashMap::new();
        for bounds in generator.grid().chunks() {
            let (chunk, _) = generator.chunk(bounds.row, bounds.col).unwrap();
            for ((x, y), cell) in bounds.cells().zip(&chunk.cells) {
                let owner = cell.o.unwrap();
                let previous = owners.entry((x / 20, y / 20)).or_insert(owner);
                assert_eq!(*previous, owner, "cluster ({}, {}) split", x / 20, y / 20);
            }
        }
        assert_eq!(owners.len(), 5 * 3);
    }

    #[test]
    fn test_partition_covers_grid_once() {
        let generator =
            Generator::from_config(&config(100, 70, 32, TerrainVariant::Realistic)).unwrap();
        let chunks = generator.chunks().unwrap();
        assert_eq!(chunks.len(), 4 * 3);
        let total: usize = chunks.iter().map(|(c, _)| c.cells.len()).sum();
        assert_eq!(total, 100 * 70);
        let last = &chunks.last().unwrap().0;
        assert_eq!((last.width, last.height), (100 % 32, 70 % 32));
    }

    #[test]
    fn test_directory_run_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("data");
        let cfg = GridConfig {
            output_dir: out.clone(),
            ..config(80, 80, 64, TerrainVariant::Realistic)
        };
        let sink = crate::storage::DirectorySink::new(&cfg.output_dir);
        let report = generate(&cfg, &sink).unwrap();

        assert_eq!(sink.list_chunks().unwrap(), vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
        let loaded = metadata::load_metadata(&out.join(metadata::METADATA_FILE)).unwrap();
        assert_eq!(loaded.total_chunks_x, report.metadata.total_chunks_x);
        assert_eq!(loaded.lookup.len(), report.metadata.lookup.len());
        for (a, b) in loaded.summaries().zip(report.metadata.summaries()) {
            assert_eq!(a.file, b.file);
            assert_eq!((a.min_h, a.max_h), (b.min_h, b.max_h));
            assert!((a.occupancy_rate - b.occupancy_rate).abs() < 1e-12);
        }
        for (a, b) in loaded.bounding_box.iter().zip(report.metadata.bounding_box.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
        assert_eq!(
            sink.total_size().unwrap() as usize,
            report.chunk_bytes + report.metadata_bytes
        );
        assert!(report.chunk_bytes < report.raw_chunk_bytes);

        // Files on disk decompress back to the summarized chunks
        for summary in report.metadata.summaries() {
            let bytes = std::fs::read(out.join(&summary.file)).unwrap();
            let chunk = decode_chunk(&bytes).unwrap();
            assert_eq!(resummarize(&chunk, summary.file.clone()), *summary);
        }
    }

    #[test]
    fn test_chunk_outside_grid_is_an_error() {
        let generator =
            Generator::from_config(&config(100, 100, 64, TerrainVariant::Realistic)).unwrap();
        assert!(matches!(
            generator.chunk(0, 2),
            Err(GenerationError::ChunkOutOfRange {
                col: 2,
                cols: 2,
                ..
            })
        ));
    }
}
