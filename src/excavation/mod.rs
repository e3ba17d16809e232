//! Excavation: digger trigger volumes that activate sand and lower the ground.
//!
//! While a digger volume overlaps a particle the particle is activated and the
//! terrain under it is pushed down far enough to clear the particle's minimum
//! extent. Terrain is never raised.

pub mod digger;

pub use digger::DiggerSet;

use crate::core::types::Vec3;
use crate::physics::CollisionLayer;
use crate::sand::Particle;
use crate::terrain::TerrainSurface;

/// Effect of one digger contact on one particle
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExcavationOutcome {
    /// The particle switched from dormant to dynamic
    pub activated: bool,
    /// New terrain height, if the surface was lowered
    pub lowered_to: Option<f32>,
}

/// Height the terrain must not exceed under a particle at `position`
pub fn clearance_height(position: Vec3, min_radius: f32) -> f32 {
    position.y - min_radius
}

/// Apply one tick of digger contact to `particle`.
///
/// Activation is idempotent. The terrain is lowered to exactly
/// `position.y - min_radius` only when the surface exists under the particle
/// and currently lies above that, and the change notification fires once per
/// edit.
pub fn excavate(
    particle: &mut Particle,
    min_radius: f32,
    terrain: &mut dyn TerrainSurface,
    now: f32,
    dynamic_layer: CollisionLayer,
) -> ExcavationOutcome {
    if !particle.is_used() {
        return ExcavationOutcome::default();
    }

    let activated = particle.activate(now, dynamic_layer);

    let position = particle.position();
    let target = clearance_height(position, min_radius);
    // Off the surface there is nothing to lower
    let lowered_to = match terrain.sample(position.x, position.z) {
        Some(current) if current > target => {
            terrain.set_height(position, target);
            terrain.notify_heightmap_changed();
            log::trace!(
                "Particle {} lowered terrain at ({:.2}, {:.2}) from {:.3} to {:.3}",
                particle.id().0, position.x, position.z, current, target
            );
            Some(target)
        }
        _ => None,
    };

    ExcavationOutcome { activated, lowered_to }
}
