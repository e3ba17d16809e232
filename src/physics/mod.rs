//! Rigid-body collaborator contract.
//!
//! The sand field does not integrate motion itself. It pushes particle bodies
//! into a [`PhysicsWorld`], reads their state back, applies forces, and reacts
//! to the contact events each step reports. [`SphereWorld`] is a small
//! reference backend for headless runs.

pub mod layers;
pub mod body;
pub mod contact;
pub mod sphere_world;

pub use layers::{CollisionLayer, LayerMask};
pub use body::{BodyDesc, BodyId, BodyState};
pub use contact::{Collider, ContactEvent, ContactPoint, DiggerId};
pub use sphere_world::{SphereWorld, SphereWorldConfig};

use crate::core::types::Vec3;
use crate::math::{Aabb, Ray, RayHit};
use crate::terrain::TerrainSurface;

/// Rigid-body simulation the sand field runs inside.
///
/// The height-field terrain is passed into probe and step calls so that it
/// stays owned by the caller, which also edits it during excavation.
pub trait PhysicsWorld {
    /// Fixed step the world is advanced with, in seconds
    fn fixed_timestep(&self) -> f32;

    /// Cast a ray against colliders on layers in `mask`
    fn raycast(
        &self,
        ray: &Ray,
        max_distance: f32,
        mask: LayerMask,
        terrain: &dyn TerrainSurface,
    ) -> Option<RayHit>;

    /// Create or update a body from its description
    fn sync_body(&mut self, id: BodyId, desc: &BodyDesc);

    /// Current state of an enabled body
    fn body_state(&self, id: BodyId) -> Option<BodyState>;

    /// Add a force to be applied during the next step
    fn add_force(&mut self, id: BodyId, force: Vec3);

    /// Add a torque to be applied during the next step
    fn add_torque(&mut self, id: BodyId, torque: Vec3);

    /// Create or move a digger trigger volume
    fn set_trigger(&mut self, id: DiggerId, volume: Aabb);

    /// Remove a digger trigger volume
    fn remove_trigger(&mut self, id: DiggerId);

    /// Advance by `dt` and report the contacts that persisted during the step
    fn step(&mut self, dt: f32, terrain: &dyn TerrainSurface) -> Vec<ContactEvent>;
}
