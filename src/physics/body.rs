//! Body handles and state exchanged with the physics world

use crate::core::types::{Quat, Vec3};
use super::layers::CollisionLayer;

/// Handle of a body inside the physics world
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

impl BodyId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Everything the physics world needs to mirror a particle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyDesc {
    /// Disabled bodies take part in nothing
    pub enabled: bool,
    /// Kinematic bodies ignore forces and keep the pose they are given
    pub kinematic: bool,
    pub layer: CollisionLayer,
    pub position: Vec3,
    pub orientation: Quat,
    pub radius: f32,
    pub mass: f32,
}

/// Simulated state of a body
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

impl BodyState {
    /// State of a body at rest
    pub fn at_rest(position: Vec3) -> Self {
        Self {
            position,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
        }
    }

    /// Velocity of the material point at world position `point`
    pub fn point_velocity(&self, point: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(point - self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_velocity_spin_only() {
        let state = BodyState {
            angular_velocity: Vec3::new(0.0, 0.0, 2.0),
            ..BodyState::at_rest(Vec3::ZERO)
        };
        // w x r for r = +X, w = 2Z gives 2Y
        let v = state.point_velocity(Vec3::X);
        assert!((v - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);
    }
}
