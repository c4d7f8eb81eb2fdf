//! Print stats and ASCII previews of a generated grid from its metadata file.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gridsynth::metadata::{load_metadata, METADATA_FILE};
use gridsynth::preview::{legend, render_preview, PreviewMode};

#[derive(Parser, Debug)]
#[command(name = "inspect_grid")]
#[command(about = "Summarize a generated grid from its metadata file")]
struct Args {
    /// Output directory of a run, or the metadata file itself
    #[arg(default_value = "output/data64")]
    path: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let path = if args.path.is_dir() {
        args.path.join(METADATA_FILE)
    } else {
        args.path
    };

    let metadata = match load_metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to load metadata");
            return ExitCode::FAILURE;
        }
    };

    println!("=== GRID {}x{} (chunk {}) ===", metadata.width, metadata.height, metadata.chunk_size);
    println!("Chunks: {} x {}", metadata.total_chunks_x, metadata.total_chunks_y);
    let [min_lon, min_lat, max_lon, max_lat] = metadata.bounding_box;
    println!("Bounds: ({:.6}, {:.6}) to ({:.6}, {:.6})", min_lon, min_lat, max_lon, max_lat);
    println!("Land: {:.1}%", metadata.overall_availability() * 100.0);
    match metadata.height_range() {
        Some((low, high)) => println!("Heights: {}m to {}m", low, high),
        None => println!("Heights: no land"),
    }

    let land_chunks: Vec<_> = metadata.summaries().filter(|s| s.availability_rate > 0.0).collect();
    if !land_chunks.is_empty() {
        let mean_occupancy =
            land_chunks.iter().map(|s| s.occupancy_rate).sum::<f64>() / land_chunks.len() as f64;
        println!("Mean occupancy of land chunks: {:.1}%", mean_occupancy * 100.0);
    }
    println!();

    for mode in PreviewMode::all() {
        println!("{}", legend(*mode));
        print!("{}", render_preview(&metadata, *mode));
        println!();
    }

    ExitCode::SUCCESS
}
