//! Registry of digger trigger volumes

use std::collections::BTreeMap;

use crate::math::Aabb;
use crate::physics::{DiggerId, PhysicsWorld};

/// Digger volumes known to the sand field, mirrored into the physics world
/// as trigger volumes.
#[derive(Clone, Debug, Default)]
pub struct DiggerSet {
    volumes: BTreeMap<DiggerId, Aabb>,
}

impl DiggerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or move a digger
    pub fn set(&mut self, id: DiggerId, volume: Aabb, world: &mut dyn PhysicsWorld) {
        if self.volumes.insert(id, volume).is_none() {
            log::debug!("Registered digger {} at {:?}", id.0, volume.center());
        }
        world.set_trigger(id, volume);
    }

    /// Remove a digger. Returns false if it was not registered.
    pub fn remove(&mut self, id: DiggerId, world: &mut dyn PhysicsWorld) -> bool {
        if self.volumes.remove(&id).is_none() {
            return false;
        }
        world.remove_trigger(id);
        log::debug!("Removed digger {}", id.0);
        true
    }

    pub fn get(&self, id: DiggerId) -> Option<&Aabb> {
        self.volumes.get(&id)
    }

    pub fn contains(&self, id: DiggerId) -> bool {
        self.volumes.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DiggerId, &Aabb)> {
        self.volumes.iter().map(|(&id, volume)| (id, volume))
    }

    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec3;
    use crate::physics::{Collider, ContactEvent, SphereWorld};
    use crate::physics::{BodyDesc, BodyId, CollisionLayer};
    use crate::terrain::HeightGrid;

    fn body_at(position: Vec3) -> BodyDesc {
        BodyDesc {
            enabled: true,
            kinematic: true,
            layer: CollisionLayer(8),
            position,
            orientation: crate::core::types::Quat::IDENTITY,
            radius: 0.1,
            mass: 1.0,
        }
    }

    fn digger_hits(world: &mut SphereWorld, terrain: &HeightGrid) -> usize {
        world
            .step(0.02, terrain)
            .iter()
            .filter(|e| matches!(e, ContactEvent::Proximity { other: Collider::Digger(_), .. }))
            .count()
    }

    #[test]
    fn test_set_move_remove() {
        let mut world = SphereWorld::default();
        let terrain = HeightGrid::centered(1.0, 21, 21, -5.0);
        let mut diggers = DiggerSet::new();
        world.sync_body(BodyId(0), &body_at(Vec3::new(0.0, 0.0, 0.0)));

        let id = DiggerId(7);
        diggers.set(id, Aabb::from_center_half_extent(Vec3::ZERO, Vec3::splat(0.5)), &mut world);
        assert!(diggers.contains(id));
        assert_eq!(diggers.len(), 1);
        assert_eq!(digger_hits(&mut world, &terrain), 1);

        // Moving the volume away ends the overlap
        diggers.set(id, Aabb::from_center_half_extent(Vec3::splat(5.0), Vec3::splat(0.5)), &mut world);
        assert_eq!(diggers.len(), 1);
        assert_eq!(digger_hits(&mut world, &terrain), 0);

        diggers.set(id, Aabb::from_center_half_extent(Vec3::ZERO, Vec3::splat(0.5)), &mut world);
        assert!(diggers.remove(id, &mut world));
        assert!(!diggers.remove(id, &mut world));
        assert!(diggers.is_empty());
        assert_eq!(digger_hits(&mut world, &terrain), 0);
    }
}
