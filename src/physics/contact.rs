//! Contact events reported by the physics world

use crate::core::types::Vec3;
use super::body::BodyId;

/// Handle of a digger trigger volume
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiggerId(pub u32);

/// What a body is touching, resolved once when the contact is reported
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collider {
    /// Another sand particle body
    Particle(BodyId),
    /// The height-field terrain
    Terrain,
    /// A digger trigger volume
    Digger(DiggerId),
    /// Any other body known to the host (vehicle hull, tracks, ...)
    External(u32),
}

/// Geometry of a single contact
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactPoint {
    pub point: Vec3,
    /// Unit normal pointing toward the reporting body
    pub normal: Vec3,
}

/// A contact that persisted through a physics step.
///
/// Pair contacts are reported once from each side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ContactEvent {
    /// Solid contact with an impulse exchanged during the step
    Collision {
        body: BodyId,
        other: Collider,
        contact: ContactPoint,
        /// Magnitude of the impulse applied to `body` during the step
        impulse: f32,
    },
    /// Overlap without a solid response (trigger or proximity range)
    Proximity {
        body: BodyId,
        other: Collider,
    },
}

impl ContactEvent {
    /// Body the event is reported for
    pub fn body(&self) -> BodyId {
        match self {
            ContactEvent::Collision { body, .. } | ContactEvent::Proximity { body, .. } => *body,
        }
    }
}
