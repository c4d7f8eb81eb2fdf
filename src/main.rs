use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use gridsynth::preview::{self, PreviewMode};
use gridsynth::{DirectorySink, GenerationError, Generator, GridConfig, TerrainVariant};

#[derive(Parser, Debug)]
#[command(name = "gridsynth")]
#[command(about = "Generate a synthetic chunked land grid with ownership and elevation")]
struct Args {
    /// JSON config file (CLI flags override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Width of the grid in cells
    #[arg(short = 'W', long)]
    width: Option<usize>,

    /// Height of the grid in cells
    #[arg(short = 'H', long)]
    height: Option<usize>,

    /// Chunk side in cells
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Longitude of the grid origin
    #[arg(long, allow_hyphen_values = true)]
    origin_lon: Option<f64>,

    /// Latitude of the grid origin
    #[arg(long, allow_hyphen_values = true)]
    origin_lat: Option<f64>,

    /// Textual seed for the canopy noise
    #[arg(short, long)]
    seed: Option<String>,

    /// Terrain strategy
    #[arg(long, value_enum)]
    variant: Option<TerrainVariant>,

    /// Output directory for chunk and metadata files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print an ASCII preview of the chunk lookup when done
    #[arg(long)]
    preview: bool,
}

impl Args {
    fn into_config(self) -> Result<(GridConfig, bool), GenerationError> {
        let mut config = match &self.config {
            Some(path) => GridConfig::from_file(path)?,
            None => GridConfig::default(),
        };

        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(lon) = self.origin_lon {
            config.origin_lon = lon;
        }
        if let Some(lat) = self.origin_lat {
            config.origin_lat = lat;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(variant) = self.variant {
            config.terrain_variant = variant;
        }
        if let Some(output) = self.output {
            config.output_dir = output;
        }

        Ok((config, self.preview))
    }
}

fn run(args: Args) -> Result<(), GenerationError> {
    let (config, show_preview) = args.into_config()?;

    let generator = Generator::from_config(&config)?;
    info!("Seeds: {}", generator.seeds());
    info!(
        "Grid {}x{} cells, chunk {} -> {}x{} chunks, variant {}",
        config.width,
        config.height,
        config.chunk_size,
        generator.grid().total_chunks_x(),
        generator.grid().total_chunks_y(),
        config.terrain_variant
    );

    let sink = DirectorySink::new(&config.output_dir);
    let report = generator.run(&sink)?;

    info!(
        "Wrote {} chunks ({} bytes JSON, {} bytes gzipped) and metadata ({} bytes) to {}",
        report.chunks_written,
        report.raw_chunk_bytes,
        report.chunk_bytes,
        report.metadata_bytes,
        sink.metadata_path().display()
    );
    if let Some((low, high)) = report.metadata.height_range() {
        info!("Height range: {}m to {}m", low, high);
    }
    info!(
        "Land: {:.1}% of cells",
        report.metadata.overall_availability() * 100.0
    );

    if show_preview {
        for mode in [PreviewMode::Occupancy, PreviewMode::Height] {
            println!("{}", preview::legend(mode));
            print!("{}", preview::render_preview(&report.metadata, mode));
            println!();
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Generation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
