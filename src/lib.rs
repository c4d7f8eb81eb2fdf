//! Synthetic land-grid generation library
//!
//! Builds a deterministic grid of land cells (availability, ownership,
//! elevation envelope), splits it into chunks, and rolls the chunks up into a
//! single metadata lookup.

pub mod canopy;
pub mod chunk;
pub mod config;
pub mod error;
pub mod metadata;
pub mod noise_field;
pub mod ownership;
pub mod pipeline;
pub mod preview;
pub mod projection;
pub mod seeds;
pub mod storage;
pub mod terrain;

pub use chunk::{Cell, Chunk, ChunkAssembler, ChunkSummary};
pub use config::{Grid, GridConfig};
pub use error::{ConfigError, GenerationError};
pub use metadata::Metadata;
pub use pipeline::{generate, GenerationReport, Generator};
pub use storage::{DirectorySink, MemorySink, PersistenceSink};
pub use terrain::{TerrainField, TerrainModel, TerrainVariant};
