//! Regular-grid height field

use crate::core::types::Vec3;
use super::TerrainSurface;

/// Height field stored as a dense grid of samples.
///
/// Heights are sampled nearest-cell so that a value written with
/// [`TerrainSurface::set_height`] reads back exactly at the same position.
#[derive(Clone, Debug)]
pub struct HeightGrid {
    /// World-space X/Z of cell (0, 0)'s center
    origin_x: f32,
    origin_z: f32,
    cell_size: f32,
    width: usize,
    depth: usize,
    heights: Vec<f32>,
    /// Bumped on every change notification
    generation: u32,
    /// Set by `set_height`, cleared by `notify_heightmap_changed`
    dirty: bool,
    /// Number of individual cell edits since creation
    edit_count: u64,
}

impl HeightGrid {
    /// Flat grid at `height`, with cell (0, 0) centered on `(origin_x, origin_z)`.
    pub fn flat(origin_x: f32, origin_z: f32, cell_size: f32, width: usize, depth: usize, height: f32) -> Self {
        Self {
            origin_x,
            origin_z,
            cell_size,
            width,
            depth,
            heights: vec![height; width * depth],
            generation: 0,
            dirty: false,
            edit_count: 0,
        }
    }

    /// Grid filled by evaluating `f(x, z)` at every cell center
    pub fn from_fn(
        origin_x: f32,
        origin_z: f32,
        cell_size: f32,
        width: usize,
        depth: usize,
        f: impl Fn(f32, f32) -> f32,
    ) -> Self {
        let mut grid = Self::flat(origin_x, origin_z, cell_size, width, depth, 0.0);
        for cz in 0..depth {
            for cx in 0..width {
                let x = origin_x + cx as f32 * cell_size;
                let z = origin_z + cz as f32 * cell_size;
                grid.heights[cz * width + cx] = f(x, z);
            }
        }
        grid
    }

    /// Grid of `width` x `depth` cells centered on the world origin
    pub fn centered(cell_size: f32, width: usize, depth: usize, height: f32) -> Self {
        let origin_x = -(width.saturating_sub(1) as f32) * cell_size * 0.5;
        let origin_z = -(depth.saturating_sub(1) as f32) * cell_size * 0.5;
        Self::flat(origin_x, origin_z, cell_size, width, depth, height)
    }

    /// Nearest cell for a world position, if it lies on the grid
    pub fn cell_at(&self, x: f32, z: f32) -> Option<(usize, usize)> {
        let cx = ((x - self.origin_x) / self.cell_size).round();
        let cz = ((z - self.origin_z) / self.cell_size).round();
        if !cx.is_finite() || !cz.is_finite() || cx < 0.0 || cz < 0.0 {
            return None;
        }
        let (cx, cz) = (cx as usize, cz as usize);
        if cx < self.width && cz < self.depth {
            Some((cx, cz))
        } else {
            None
        }
    }

    /// Nearest cell, clamped onto the grid
    fn clamped_cell(&self, x: f32, z: f32) -> (usize, usize) {
        let max_x = self.width.saturating_sub(1) as f32;
        let max_z = self.depth.saturating_sub(1) as f32;
        let cx = ((x - self.origin_x) / self.cell_size).round().clamp(0.0, max_x);
        let cz = ((z - self.origin_z) / self.cell_size).round().clamp(0.0, max_z);
        (cx as usize, cz as usize)
    }

    /// Height stored in a cell
    pub fn cell_height(&self, cx: usize, cz: usize) -> f32 {
        self.heights[cz * self.width + cx]
    }

    /// Approximate surface normal from central differences
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let eps = self.cell_size;
        let p = Vec3::new(x, 0.0, z);
        let hx0 = self.height(p - Vec3::X * eps);
        let hx1 = self.height(p + Vec3::X * eps);
        let hz0 = self.height(p - Vec3::Z * eps);
        let hz1 = self.height(p + Vec3::Z * eps);
        Vec3::new(hx0 - hx1, 2.0 * eps, hz0 - hz1).normalize()
    }

    /// Lowest stored height
    pub fn min_height(&self) -> f32 {
        self.heights.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// Change generation, bumped once per notification
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Whether edits happened since the last notification
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Total cell edits applied
    pub fn edit_count(&self) -> u64 {
        self.edit_count
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.depth)
    }
}

impl TerrainSurface for HeightGrid {
    fn height(&self, position: Vec3) -> f32 {
        let (cx, cz) = self.clamped_cell(position.x, position.z);
        self.cell_height(cx, cz)
    }

    fn sample(&self, x: f32, z: f32) -> Option<f32> {
        self.cell_at(x, z).map(|(cx, cz)| self.cell_height(cx, cz))
    }

    fn set_height(&mut self, position: Vec3, height: f32) {
        if let Some((cx, cz)) = self.cell_at(position.x, position.z) {
            self.heights[cz * self.width + cx] = height;
            self.dirty = true;
            self.edit_count += 1;
        }
    }

    fn notify_heightmap_changed(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_height() {
        let grid = HeightGrid::centered(1.0, 11, 11, 2.5);
        assert_eq!(grid.height(Vec3::new(3.2, 0.0, -4.9)), 2.5);
        assert_eq!(grid.sample(0.0, 0.0), Some(2.5));
    }

    #[test]
    fn test_sample_outside_is_none() {
        let grid = HeightGrid::centered(1.0, 11, 11, 0.0);
        assert_eq!(grid.sample(50.0, 0.0), None);
        assert_eq!(grid.sample(0.0, -50.0), None);
        // height() clamps to the edge instead
        assert_eq!(grid.height(Vec3::new(50.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_set_height_reads_back() {
        let mut grid = HeightGrid::centered(0.5, 21, 21, 3.0);
        let p = Vec3::new(1.1, 2.0, -0.7);
        grid.set_height(p, 1.8);
        assert_eq!(grid.height(p), 1.8);
        assert!(grid.is_dirty());
        assert_eq!(grid.edit_count(), 1);

        grid.notify_heightmap_changed();
        assert!(!grid.is_dirty());
        assert_eq!(grid.generation(), 1);
    }

    #[test]
    fn test_set_height_outside_ignored() {
        let mut grid = HeightGrid::centered(1.0, 5, 5, 1.0);
        grid.set_height(Vec3::new(100.0, 0.0, 0.0), -5.0);
        assert_eq!(grid.edit_count(), 0);
        assert_eq!(grid.min_height(), 1.0);
    }

    #[test]
    fn test_from_fn_and_normal() {
        let grid = HeightGrid::from_fn(0.0, 0.0, 1.0, 16, 16, |x, _z| x * 0.5);
        assert_eq!(grid.sample(4.0, 3.0), Some(2.0));
        let n = grid.normal_at(8.0, 8.0);
        // Slope rises along +X so the normal leans toward -X
        assert!(n.x < 0.0);
        assert!(n.y > 0.0);
        assert!(n.z.abs() < 1e-6);
    }
}
