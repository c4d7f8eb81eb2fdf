//! Vegetation canopy height layered on top of the noise field.

use crate::noise_field::NoiseField;

// Canopy height parameters (meters)
pub const MIN_HEIGHT: f64 = 15.0;  // understory and small trees
pub const MAX_HEIGHT: f64 = 70.0;  // emergent trees
pub const VARIATION: f64 = 0.3;    // weight of tree-to-tree jitter

const LARGE_SCALE: f64 = 100.0;
const SMALL_SCALE: f64 = 10.0;

/// Simulated canopy height (meters) at a cell coordinate.
///
/// Blends a large-scale sample (patches of taller trees roughly a hundred
/// cells across) with a small-scale jitter, then maps into
/// [`MIN_HEIGHT`, `MAX_HEIGHT`].
pub fn canopy_height(field: &NoiseField, x: f64, y: f64) -> f64 {
    let large = field.sample(x / LARGE_SCALE, y / LARGE_SCALE);
    let small = field.sample(x / SMALL_SCALE, y / SMALL_SCALE) * VARIATION;

    // [-1, 1] -> [0, 1]
    let normalized = ((large * (1.0 - VARIATION) + small + 1.0) / 2.0).clamp(0.0, 1.0);

    MIN_HEIGHT + normalized * (MAX_HEIGHT - MIN_HEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canopy_within_bounds() {
        let field = NoiseField::new(11);
        for y in (0..1000).step_by(37) {
            for x in (0..1000).step_by(41) {
                let h = canopy_height(&field, x as f64, y as f64);
                assert!(h >= MIN_HEIGHT && h <= MAX_HEIGHT, "canopy {} at ({}, {})", h, x, y);
            }
        }
    }

    #[test]
    fn test_canopy_deterministic() {
        let a = NoiseField::new(5);
        let b = NoiseField::new(5);
        assert_eq!(
            canopy_height(&a, 123.0, 456.0).to_bits(),
            canopy_height(&b, 123.0, 456.0).to_bits()
        );
    }

    #[test]
    fn test_neighbouring_cells_are_similar() {
        // Adjacent cells differ by at most the small-scale share plus a little drift
        let field = NoiseField::new(9);
        let span = MAX_HEIGHT - MIN_HEIGHT;
        for i in 0..200 {
            let x = (i * 13 % 997) as f64;
            let y = (i * 29 % 991) as f64;
            let d = (canopy_height(&field, x, y) - canopy_height(&field, x + 1.0, y)).abs();
            assert!(d < span * 0.5, "canopy jumped by {} at ({}, {})", d, x, y);
        }
    }
}
