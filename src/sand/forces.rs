//! Inter-particle force laws.
//!
//! Both laws are scalar approximations evaluated per contact from one
//! particle's point of view; the physics world sums what each side applies.

use crate::core::types::Vec3;
use crate::physics::{BodyState, ContactPoint};

/// Separations below this are treated as coincident and produce no cohesion
pub const MIN_COHESION_SEPARATION: f32 = 1e-6;

/// Cohesive pull on a particle at `position` toward one at `other_position`.
///
/// `-c * d * m1 * m2 / |d|^3` with `d = position - other_position`: directed
/// along `-d`, falling off with `1 / |d|^2`.
pub fn cohesion_force(
    position: Vec3,
    other_position: Vec3,
    mass: f32,
    other_mass: f32,
    coefficient: f32,
) -> Vec3 {
    let d = position - other_position;
    let distance = d.length();
    if distance < MIN_COHESION_SEPARATION {
        return Vec3::ZERO;
    }
    -coefficient * d * (mass * other_mass) / (distance * distance * distance)
}

/// Surface velocity of a body at a contact, with the normal component removed
pub fn tangential_velocity(state: &BodyState, contact: &ContactPoint) -> Vec3 {
    let velocity = state.point_velocity(contact.point);
    velocity - velocity.dot(contact.normal) * contact.normal
}

/// Rolling-resistance torque for a spinning particle in sustained contact.
///
/// `other` is the state of the touching particle when the contact is with a
/// like particle; anything else counts as a stationary frame. Returns `None`
/// when the particle is not spinning or the step is degenerate.
pub fn rolling_friction_torque(
    state: &BodyState,
    other: Option<&BodyState>,
    contact: &ContactPoint,
    impulse: f32,
    fixed_dt: f32,
    coefficient: f32,
) -> Option<Vec3> {
    let spin = state.angular_velocity.length();
    if spin == 0.0 || fixed_dt <= 0.0 {
        return None;
    }

    let mut relative = tangential_velocity(state, contact);
    if let Some(other) = other {
        relative -= tangential_velocity(other, contact);
    }

    let collision_force = impulse / fixed_dt;
    Some(-coefficient * relative.length() * collision_force * state.angular_velocity / spin)
}
