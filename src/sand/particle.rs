//! A single sand grain and its activation lifecycle.
//!
//! Grains start `Dormant`: kinematic, on the static collision layer, parked in
//! a spawn window column. Excavation activates them, after which they are
//! dynamic bodies that balloon from `min_radius` to `max_radius` over
//! `ballooning_time` and then stay `Settled`.

use crate::core::types::{Quat, Vec3};
use crate::physics::{BodyDesc, BodyId, BodyState, CollisionLayer};
use crate::simulation::config::ParticleConfig;
use crate::spawn::ColumnId;

/// Stable pool slot index of a particle
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticleId(pub u32);

impl ParticleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Body mirroring this particle in the physics world
    pub fn body(self) -> BodyId {
        BodyId(self.0)
    }

    pub fn from_body(body: BodyId) -> Self {
        ParticleId(body.0)
    }
}

/// Activation state of a particle
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActivationState {
    /// Embedded in the terrain, kinematic, static layer
    Dormant,
    /// Dynamic and still growing toward `max_radius`
    Growing { activated_at: f32 },
    /// Dynamic with its radius frozen at `max_radius`
    Settled { activated_at: f32 },
}

impl ActivationState {
    pub fn is_dormant(&self) -> bool {
        matches!(self, ActivationState::Dormant)
    }

    /// Time of activation, if activated
    pub fn activated_at(&self) -> Option<f32> {
        match self {
            ActivationState::Dormant => None,
            ActivationState::Growing { activated_at } | ActivationState::Settled { activated_at } => {
                Some(*activated_at)
            }
        }
    }
}

/// Radius of a particle `elapsed` seconds after activation
pub fn grown_radius(elapsed: f32, params: &ParticleConfig) -> f32 {
    let t = if params.ballooning_time > 0.0 {
        (elapsed / params.ballooning_time).clamp(0.0, 1.0)
    } else {
        1.0
    };
    (1.0 - t) * params.min_radius + t * params.max_radius
}

/// A pooled sand grain
#[derive(Clone, Debug)]
pub struct Particle {
    id: ParticleId,
    /// Whether the slot is in use (spawned)
    enabled: bool,
    state: ActivationState,
    position: Vec3,
    orientation: Quat,
    radius: f32,
    mass: f32,
    layer: CollisionLayer,
    /// Column this particle is stacked in while dormant
    column: Option<ColumnId>,
    /// Needs pushing to the physics world
    dirty: bool,
}

impl Particle {
    /// Create a disabled, dormant particle
    pub fn new(id: ParticleId, params: &ParticleConfig, static_layer: CollisionLayer) -> Self {
        Self {
            id,
            enabled: false,
            state: ActivationState::Dormant,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            radius: params.min_radius,
            mass: params.mass,
            layer: static_layer,
            column: None,
            dirty: true,
        }
    }

    pub fn id(&self) -> ParticleId {
        self.id
    }

    /// Spawned and owned by the simulation (in any activation state)
    pub fn is_used(&self) -> bool {
        self.enabled
    }

    /// Activated, i.e. `Growing` or `Settled`
    pub fn is_active(&self) -> bool {
        !self.state.is_dormant()
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn layer(&self) -> CollisionLayer {
        self.layer
    }

    pub fn column(&self) -> Option<ColumnId> {
        self.column
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Enable the slot as a fresh dormant particle.
    pub(crate) fn enable(&mut self, params: &ParticleConfig, static_layer: CollisionLayer) {
        self.enabled = true;
        self.reset(params, static_layer);
    }

    /// Disable the slot and sever its column link
    pub(crate) fn disable(&mut self) {
        self.enabled = false;
        self.column = None;
        self.dirty = true;
    }

    fn reset(&mut self, params: &ParticleConfig, static_layer: CollisionLayer) {
        self.state = ActivationState::Dormant;
        self.radius = params.min_radius;
        self.mass = params.mass;
        self.layer = static_layer;
        self.orientation = Quat::IDENTITY;
        self.column = None;
        self.dirty = true;
    }

    /// Park this particle in `column` at `position`
    pub fn place(&mut self, position: Vec3, column: ColumnId) {
        self.position = position;
        self.orientation = Quat::IDENTITY;
        self.column = Some(column);
        self.dirty = true;
    }

    /// Move a dormant particle horizontally, keeping its height
    pub fn slide_to(&mut self, x: f32, z: f32) {
        if self.is_active() {
            return;
        }
        if self.position.x != x || self.position.z != z || self.orientation != Quat::IDENTITY {
            self.position.x = x;
            self.position.z = z;
            self.orientation = Quat::IDENTITY;
            self.dirty = true;
        }
    }

    /// Switch a dormant particle to dynamic simulation.
    ///
    /// Returns false (and does nothing) if the particle is already active or
    /// not spawned.
    pub fn activate(&mut self, now: f32, dynamic_layer: CollisionLayer) -> bool {
        if !self.enabled || self.is_active() {
            return false;
        }
        self.state = ActivationState::Growing { activated_at: now };
        self.layer = dynamic_layer;
        self.column = None;
        self.dirty = true;
        log::trace!("Activated particle {} at t={:.3}", self.id.0, now);
        true
    }

    /// Advance radius growth to time `now`. Returns true if the radius changed.
    pub fn update_growth(&mut self, now: f32, params: &ParticleConfig) -> bool {
        let ActivationState::Growing { activated_at } = self.state else {
            return false;
        };

        let elapsed = now - activated_at;
        let radius = if elapsed >= params.ballooning_time {
            self.state = ActivationState::Settled { activated_at };
            params.max_radius
        } else {
            // Never shrink, even if the clock was fed a negative delta
            grown_radius(elapsed, params).max(self.radius)
        };

        if radius != self.radius {
            self.radius = radius;
            self.dirty = true;
            true
        } else {
            false
        }
    }

    /// Copy the simulated pose of an active particle
    pub fn sync_from_body(&mut self, state: &BodyState) {
        if self.is_active() {
            self.position = state.position;
            self.orientation = state.orientation;
        }
    }

    /// Description pushed to the physics world
    pub fn body_desc(&self) -> BodyDesc {
        BodyDesc {
            enabled: self.enabled,
            kinematic: !self.is_active(),
            layer: self.layer,
            position: self.position,
            orientation: self.orientation,
            radius: self.radius,
            mass: self.mass,
        }
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}
