//! ASCII rendering of the chunk lookup.
//!
//! One character per chunk. Row 0 is the southern edge of the grid, so it is
//! printed last.

use crate::chunk::ChunkSummary;
use crate::metadata::Metadata;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewMode {
    /// Share of available land that is owned
    Occupancy,
    /// Share of the chunk that is land
    Availability,
    /// Highest canopy top, scaled over the whole grid
    Height,
}

impl PreviewMode {
    pub fn name(&self) -> &'static str {
        match self {
            PreviewMode::Occupancy => "Occupancy",
            PreviewMode::Availability => "Availability",
            PreviewMode::Height => "Height",
        }
    }

    pub fn all() -> &'static [PreviewMode] {
        &[PreviewMode::Occupancy, PreviewMode::Availability, PreviewMode::Height]
    }
}

/// Character for a rate in [0, 1]
pub fn rate_char(rate: f64) -> char {
    const CHARS: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];
    let idx = (rate.clamp(0.0, 1.0) * (CHARS.len() - 1) as f64).round() as usize;
    CHARS[idx.min(CHARS.len() - 1)]
}

/// Character for a height within `[low, high]`
pub fn height_char(height: i32, low: i32, high: i32) -> char {
    const CHARS: &[char] = &['_', '.', '-', '=', '+', '*', '#', '^', 'A', 'M'];
    let span = (high - low).max(1) as f64;
    let normalized = ((height - low) as f64 / span).clamp(0.0, 1.0);
    let idx = (normalized * (CHARS.len() - 1) as f64) as usize;
    CHARS[idx.min(CHARS.len() - 1)]
}

fn chunk_char(summary: &ChunkSummary, mode: PreviewMode, range: Option<(i32, i32)>) -> char {
    // Chunks without land have nothing to show
    if summary.availability_rate == 0.0 {
        return ' ';
    }
    match mode {
        PreviewMode::Occupancy => rate_char(summary.occupancy_rate),
        PreviewMode::Availability => rate_char(summary.availability_rate),
        PreviewMode::Height => match (summary.max_h, range) {
            (Some(h), Some((low, high))) => height_char(h, low, high),
            _ => '?',
        },
    }
}

/// Render the lookup table, northern row first.
pub fn render_preview(metadata: &Metadata, mode: PreviewMode) -> String {
    let range = metadata.height_range();
    let mut result = String::with_capacity((metadata.total_chunks_x + 1) * metadata.total_chunks_y);

    for row in metadata.lookup.iter().rev() {
        for summary in row {
            result.push(chunk_char(summary, mode, range));
        }
        result.push('\n');
    }

    result
}

pub fn legend(mode: PreviewMode) -> String {
    match mode {
        PreviewMode::Height => {
            "Height: _ (low) . - = + * # ^ A M (high), blank = no land".to_string()
        }
        _ => format!("{}: . (0%) : - = + * # % @ (100%), blank = no land", mode.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_file_name;

    fn summary(row: usize, col: usize, avail: f64, occ: f64, max_h: Option<i32>) -> ChunkSummary {
        ChunkSummary {
            file: chunk_file_name(row, col),
            min_h: max_h.map(|h| h - 40),
            max_h,
            availability_rate: avail,
            occupancy_rate: occ,
        }
    }

    fn metadata() -> Metadata {
        Metadata {
            origin_lon: -74.0,
            origin_lat: 40.7,
            width: 20,
            height: 20,
            chunk_size: 10,
            total_chunks_x: 2,
            total_chunks_y: 2,
            bounding_box: [0.0; 4],
            lookup: vec![
                vec![summary(0, 0, 1.0, 0.0, Some(50)), summary(0, 1, 1.0, 1.0, Some(90))],
                vec![summary(1, 0, 0.0, 0.0, None), summary(1, 1, 0.5, 0.5, Some(70))],
            ],
        }
    }

    #[test]
    fn test_rate_chars() {
        assert_eq!(rate_char(0.0), '.');
        assert_eq!(rate_char(1.0), '@');
        assert_eq!(rate_char(0.5), '+');
        assert_eq!(rate_char(7.0), '@');
    }

    #[test]
    fn test_height_chars() {
        assert_eq!(height_char(10, 10, 100), '_');
        assert_eq!(height_char(100, 10, 100), 'M');
        assert_eq!(height_char(5, 5, 5), '_');
    }

    #[test]
    fn test_render_occupancy() {
        let rendered = render_preview(&metadata(), PreviewMode::Occupancy);
        // Northern row (row 1) first
        assert_eq!(rendered, " +\n.@\n");
    }

    #[test]
    fn test_render_height() {
        let rendered = render_preview(&metadata(), PreviewMode::Height);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with(' '));
        assert_eq!(lines[1].chars().last(), Some('M'));
    }

    #[test]
    fn test_legends() {
        for mode in PreviewMode::all() {
            assert!(legend(*mode).starts_with(mode.name()));
        }
    }
}
