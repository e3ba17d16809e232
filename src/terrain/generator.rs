//! Noise-based procedural terrain baking

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use super::height_grid::HeightGrid;

/// Parameters controlling terrain generation
#[derive(Clone, Debug)]
pub struct TerrainParams {
    pub seed: u32,
    pub scale: f32,        // Horizontal scale (larger = smoother)
    pub height_scale: f32, // Vertical scale (max height)
    pub octaves: u32,      // FBM octaves (detail levels)
    pub persistence: f32,  // FBM persistence (0.5 typical)
    pub lacunarity: f32,   // FBM lacunarity (2.0 typical)
    pub base_height: f32,  // Added to every sample
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            scale: 40.0,
            height_scale: 3.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            base_height: 0.0,
        }
    }
}

/// Procedural terrain generator using fractal Brownian motion (FBM)
pub struct TerrainGenerator {
    params: TerrainParams,
    noise: Fbm<Perlin>,
}

impl TerrainGenerator {
    /// Create a new terrain generator with the given parameters
    pub fn new(params: TerrainParams) -> Self {
        let noise = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves as usize)
            .set_persistence(params.persistence as f64)
            .set_lacunarity(params.lacunarity as f64);

        Self { params, noise }
    }

    /// Get terrain parameters
    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Get terrain height at world position (x, z)
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let nx = (x / self.params.scale) as f64;
        let nz = (z / self.params.scale) as f64;

        // Noise is in [-1, 1]; map to [0, height_scale]
        let noise_value = self.noise.get([nx, nz]);
        let normalized = ((noise_value + 1.0) / 2.0).clamp(0.0, 1.0);
        self.params.base_height + (normalized * self.params.height_scale as f64) as f32
    }

    /// Bake a height grid of `width` x `depth` cells centered on the origin
    pub fn bake(&self, cell_size: f32, width: usize, depth: usize) -> HeightGrid {
        let origin_x = -(width.saturating_sub(1) as f32) * cell_size * 0.5;
        let origin_z = -(depth.saturating_sub(1) as f32) * cell_size * 0.5;

        log::info!(
            "Baking {}x{} terrain (cell {:.2}m, seed {})",
            width, depth, cell_size, self.params.seed
        );

        HeightGrid::from_fn(origin_x, origin_z, cell_size, width, depth, |x, z| self.height_at(x, z))
    }
}
