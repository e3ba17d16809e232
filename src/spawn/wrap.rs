//! Toroidal column placement.
//!
//! Column `i` of an `R`-wide window always sits on a lattice site `k` (in
//! cells) with `k ≡ i (mod R)`, chosen from the `R` consecutive sites
//! `[c - R/2, c - R/2 + R)` around the anchor's cell `c = floor(anchor / w)`.
//! When the anchor crosses a cell boundary only the column whose site falls
//! out of that range moves, jumping by exactly `R` cells to the other side.
//! Working in integer cells keeps this exact for negative and far-away
//! anchors.

/// Cell containing `coordinate`, rounding toward negative infinity
pub fn anchor_cell(coordinate: f32, cell_size: f32) -> i64 {
    (coordinate / cell_size).floor() as i64
}

/// First lattice site of the window around `anchor_cell`
pub fn window_start(anchor_cell: i64, resolution: usize) -> i64 {
    anchor_cell - (resolution as i64) / 2
}

/// Lattice site occupied by column `index`
pub fn wrapped_cell(anchor_cell: i64, index: usize, resolution: usize) -> i64 {
    let r = resolution as i64;
    let start = window_start(anchor_cell, resolution);
    start + (index as i64 - start).rem_euclid(r)
}

/// World coordinate of column `index` along one horizontal axis
pub fn wrapped_coordinate(anchor: f32, index: usize, resolution: usize, cell_size: f32) -> f32 {
    wrapped_cell(anchor_cell(anchor, cell_size), index, resolution) as f32 * cell_size
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sites(anchor: f32, resolution: usize, cell_size: f32) -> Vec<i64> {
        let c = anchor_cell(anchor, cell_size);
        let mut sites: Vec<i64> = (0..resolution).map(|i| wrapped_cell(c, i, resolution)).collect();
        sites.sort();
        sites
    }

    #[test]
    fn test_anchor_cell_negative() {
        assert_eq!(anchor_cell(0.5, 1.0), 0);
        assert_eq!(anchor_cell(-0.5, 1.0), -1);
        assert_eq!(anchor_cell(-1.0, 0.5), -2);
    }

    #[test]
    fn test_window_is_contiguous_around_anchor() {
        for &anchor in &[0.0, 0.3, 7.9, -0.1, -3.75, -1000.2, 12345.6] {
            for resolution in [2usize, 3, 4, 7, 16] {
                let cell = 0.5;
                let s = sites(anchor, resolution, cell);
                let c = anchor_cell(anchor, cell);
                let start = window_start(c, resolution);
                let expected: Vec<i64> = (start..start + resolution as i64).collect();
                assert_eq!(s, expected, "anchor {anchor} resolution {resolution}");

                // Every column lands in [-W/2, W/2) of the anchor's cell corner
                let width = resolution as f32 * cell;
                let corner = c as f32 * cell;
                for i in 0..resolution {
                    let rel = wrapped_coordinate(anchor, i, resolution, cell) - corner;
                    assert!(rel >= -width / 2.0 - 1e-3 && rel < width / 2.0, "rel {rel}");
                }
            }
        }
    }

    #[test]
    fn test_column_keeps_residue() {
        for i in 0..5 {
            for c in -12..12 {
                assert_eq!((wrapped_cell(c, i, 5) - i as i64).rem_euclid(5), 0);
            }
        }
    }

    #[test]
    fn test_one_cell_step_moves_one_column() {
        let resolution = 6;
        for c in -10..10 {
            let moved: Vec<i64> = (0..resolution)
                .map(|i| wrapped_cell(c + 1, i, resolution) - wrapped_cell(c, i, resolution))
                .filter(|&d| d != 0)
                .collect();
            assert_eq!(moved, vec![resolution as i64]);
        }
    }

    #[test]
    fn test_full_width_jump_moves_every_column() {
        let resolution = 4;
        for i in 0..resolution {
            let before = wrapped_cell(-3, i, resolution);
            let after = wrapped_cell(-3 + resolution as i64, i, resolution);
            assert_eq!(after - before, resolution as i64);
        }
    }
}
