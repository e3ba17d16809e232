//! Height-field terrain the sand field is embedded in.
//!
//! The simulation never owns a terrain implementation; it talks to one through
//! [`TerrainSurface`]. [`HeightGrid`] is the bundled reference surface.

pub mod height_grid;
pub mod generator;

pub use height_grid::HeightGrid;
pub use generator::{TerrainGenerator, TerrainParams};

use crate::core::types::Vec3;

/// Height-field surface queried by probes and lowered by excavation.
pub trait TerrainSurface {
    /// Surface height under the horizontal position of `position`.
    fn height(&self, position: Vec3) -> f32;

    /// Surface height at (x, z), or `None` where the surface does not exist.
    fn sample(&self, x: f32, z: f32) -> Option<f32> {
        Some(self.height(Vec3::new(x, 0.0, z)))
    }

    /// Set the surface height under the horizontal position of `position`.
    fn set_height(&mut self, position: Vec3, height: f32);

    /// Signal that the height field changed since the last notification.
    fn notify_heightmap_changed(&mut self);
}
