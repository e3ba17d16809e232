//! Minimal sphere-only physics backend.
//!
//! Semi-implicit Euler integration, a height-field ground contact, sphere
//! pair contacts with normal and friction impulses, proximity reporting and
//! AABB trigger volumes. Enough to run the sand field headless and to test it
//! end to end; not a general rigid-body engine.

use std::collections::HashMap;

use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::core::types::{Quat, Vec3};
use crate::math::{Aabb, Ray, RayHit};
use crate::terrain::TerrainSurface;
use super::body::{BodyDesc, BodyId, BodyState};
use super::contact::{Collider, ContactEvent, ContactPoint, DiggerId};
use super::layers::{CollisionLayer, LayerMask};
use super::PhysicsWorld;

/// Tuning for [`SphereWorld`]
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereWorldConfig {
    pub gravity: [f32; 3],
    /// Fixed step in seconds
    pub fixed_timestep: f32,
    /// Normal restitution (0 = perfectly inelastic)
    pub restitution: f32,
    /// Coulomb friction coefficient for contacts
    pub friction: f32,
    /// Pairs closer than `(r1 + r2) * proximity_scale` are reported as proximity
    pub proximity_scale: f32,
    /// Layer the height-field terrain collider lives on
    pub terrain_layer: CollisionLayer,
    /// Linear velocity damping per second
    pub linear_damping: f32,
    /// Angular velocity damping per second
    pub angular_damping: f32,
    /// Longest distance a non-vertical probe marches
    pub max_probe_distance: f32,
}

impl Default for SphereWorldConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            fixed_timestep: 0.02,
            restitution: 0.0,
            friction: 0.6,
            proximity_scale: 1.25,
            terrain_layer: CollisionLayer(0),
            linear_damping: 0.0,
            angular_damping: 0.05,
            max_probe_distance: 1000.0,
        }
    }
}

#[derive(Clone, Debug)]
struct SphereBody {
    desc: BodyDesc,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    force: Vec3,
    torque: Vec3,
}

impl SphereBody {
    fn is_dynamic(&self) -> bool {
        self.desc.enabled && !self.desc.kinematic
    }

    fn inv_mass(&self) -> f32 {
        if self.is_dynamic() && self.desc.mass > 0.0 { 1.0 / self.desc.mass } else { 0.0 }
    }

    /// Inverse moment of inertia of a solid sphere
    fn inv_inertia(&self) -> f32 {
        let inertia = 0.4 * self.desc.mass * self.desc.radius * self.desc.radius;
        if self.is_dynamic() && inertia > 0.0 { 1.0 / inertia } else { 0.0 }
    }

    fn point_velocity(&self, point: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(point - self.desc.position)
    }
}

/// Reference physics backend made of spheres over a height field
pub struct SphereWorld {
    config: SphereWorldConfig,
    bodies: Vec<Option<SphereBody>>,
    triggers: HashMap<DiggerId, Aabb>,
    /// Broad-phase cells, rebuilt every step
    cells: HashMap<IVec3, Vec<usize>>,
}

impl SphereWorld {
    pub fn new(config: SphereWorldConfig) -> Self {
        Self {
            config,
            bodies: Vec::new(),
            triggers: HashMap::new(),
            cells: HashMap::new(),
        }
    }

    pub fn config(&self) -> &SphereWorldConfig {
        &self.config
    }

    /// Number of enabled bodies that respond to forces
    pub fn dynamic_count(&self) -> usize {
        self.bodies.iter().flatten().filter(|b| b.is_dynamic()).count()
    }

    /// Overwrite the velocities of a dynamic body
    pub fn set_velocity(&mut self, id: BodyId, linear: Vec3, angular: Vec3) {
        if let Some(Some(body)) = self.bodies.get_mut(id.index()) {
            if body.is_dynamic() {
                body.linear_velocity = linear;
                body.angular_velocity = angular;
            }
        }
    }

    fn gravity(&self) -> Vec3 {
        Vec3::from_array(self.config.gravity)
    }

    fn integrate(&mut self, dt: f32) {
        let gravity = self.gravity();
        let linear_decay = 1.0 / (1.0 + dt * self.config.linear_damping);
        let angular_decay = 1.0 / (1.0 + dt * self.config.angular_damping);

        for body in self.bodies.iter_mut().flatten() {
            if !body.is_dynamic() {
                body.force = Vec3::ZERO;
                body.torque = Vec3::ZERO;
                continue;
            }
            let inv_mass = body.inv_mass();
            let inv_inertia = body.inv_inertia();

            body.linear_velocity += (gravity + body.force * inv_mass) * dt;
            body.angular_velocity += body.torque * inv_inertia * dt;
            body.linear_velocity *= linear_decay;
            body.angular_velocity *= angular_decay;

            body.desc.position += body.linear_velocity * dt;
            let spin = Quat::from_scaled_axis(body.angular_velocity * dt);
            body.desc.orientation = (spin * body.desc.orientation).normalize();

            body.force = Vec3::ZERO;
            body.torque = Vec3::ZERO;
        }
    }

    /// Surface normal of the terrain around (x, z), from central differences
    fn terrain_normal(terrain: &dyn TerrainSurface, x: f32, z: f32, eps: f32) -> Vec3 {
        let h = |dx: f32, dz: f32| terrain.sample(x + dx, z + dz);
        match (h(-eps, 0.0), h(eps, 0.0), h(0.0, -eps), h(0.0, eps)) {
            (Some(x0), Some(x1), Some(z0), Some(z1)) => {
                Vec3::new(x0 - x1, 2.0 * eps, z0 - z1).normalize_or_zero()
            }
            _ => Vec3::Y,
        }
    }

    fn collide_terrain(&mut self, terrain: &dyn TerrainSurface, events: &mut Vec<ContactEvent>) {
        let restitution = self.config.restitution;
        let friction = self.config.friction;

        for (index, slot) in self.bodies.iter_mut().enumerate() {
            let Some(body) = slot else { continue };
            if !body.is_dynamic() {
                continue;
            }
            let p = body.desc.position;
            let r = body.desc.radius;
            let Some(ground) = terrain.sample(p.x, p.z) else { continue };
            let penetration = ground - (p.y - r);
            if penetration <= 0.0 {
                continue;
            }

            let normal = Self::terrain_normal(terrain, p.x, p.z, r.max(1e-3));
            body.desc.position.y += penetration;
            let arm = -normal * r;
            let point = body.desc.position + arm;

            let inv_mass = body.inv_mass();
            let inv_inertia = body.inv_inertia();
            if inv_mass == 0.0 {
                continue;
            }

            let vn = body.point_velocity(point).dot(normal);
            let jn = if vn < 0.0 { -(1.0 + restitution) * vn / inv_mass } else { 0.0 };
            body.linear_velocity += normal * jn * inv_mass;

            // Friction against the slip that remains after the normal impulse
            let vc = body.point_velocity(point);
            let slip = vc - normal * vc.dot(normal);
            let slip_speed = slip.length();
            let mut tangent_impulse = Vec3::ZERO;
            if slip_speed > 1e-6 {
                let k = inv_mass + r * r * inv_inertia;
                let jt = (slip_speed / k).min(friction * jn);
                tangent_impulse = -slip / slip_speed * jt;
                body.linear_velocity += tangent_impulse * inv_mass;
                body.angular_velocity += arm.cross(tangent_impulse) * inv_inertia;
            }

            events.push(ContactEvent::Collision {
                body: BodyId(index as u32),
                other: Collider::Terrain,
                contact: ContactPoint { point, normal },
                impulse: (normal * jn + tangent_impulse).length(),
            });
        }
    }

    fn rebuild_cells(&mut self, cell_size: f32) {
        for list in self.cells.values_mut() {
            list.clear();
        }
        for (index, slot) in self.bodies.iter().enumerate() {
            let Some(body) = slot else { continue };
            if !body.desc.enabled {
                continue;
            }
            let cell = (body.desc.position / cell_size).floor().as_ivec3();
            self.cells.entry(cell).or_default().push(index);
        }
        self.cells.retain(|_, list| !list.is_empty());
    }

    fn collide_pairs(&mut self, events: &mut Vec<ContactEvent>) {
        let scale = self.config.proximity_scale.max(1.0);
        let max_radius = self
            .bodies
            .iter()
            .flatten()
            .filter(|b| b.desc.enabled)
            .map(|b| b.desc.radius)
            .fold(0.0f32, f32::max);
        if max_radius <= 0.0 {
            return;
        }
        let cell_size = 2.0 * max_radius * scale;
        self.rebuild_cells(cell_size);

        let mut pairs = Vec::new();
        for (cell, members) in &self.cells {
            for &i in members {
                for dx in -1..=1 {
                    for dy in -1..=1 {
                        for dz in -1..=1 {
                            let Some(neighbors) = self.cells.get(&(*cell + IVec3::new(dx, dy, dz))) else {
                                continue;
                            };
                            pairs.extend(neighbors.iter().filter(|&&j| j > i).map(|&j| (i, j)));
                        }
                    }
                }
            }
        }

        for (i, j) in pairs {
            self.resolve_pair(i, j, scale, events);
        }
    }

    fn resolve_pair(&mut self, i: usize, j: usize, scale: f32, events: &mut Vec<ContactEvent>) {
        let (Some(a), Some(b)) = (self.bodies[i].clone(), self.bodies[j].clone()) else {
            return;
        };
        // Two kinematic bodies never interact
        if !a.is_dynamic() && !b.is_dynamic() {
            return;
        }

        let offset = a.desc.position - b.desc.position;
        let distance = offset.length();
        let reach = a.desc.radius + b.desc.radius;
        if distance >= reach * scale || distance <= 1e-6 {
            return;
        }

        let (id_a, id_b) = (BodyId(i as u32), BodyId(j as u32));
        events.push(ContactEvent::Proximity { body: id_a, other: Collider::Particle(id_b) });
        events.push(ContactEvent::Proximity { body: id_b, other: Collider::Particle(id_a) });

        if distance >= reach {
            return;
        }

        let (mut a, mut b) = (a, b);
        let normal = offset / distance; // toward a
        let (wa, wb) = (a.inv_mass(), b.inv_mass());
        let (ia, ib) = (a.inv_inertia(), b.inv_inertia());
        if wa + wb <= 0.0 {
            return;
        }

        let penetration = reach - distance;
        let share = penetration / (wa + wb);
        a.desc.position += normal * share * wa;
        b.desc.position -= normal * share * wb;

        let point = a.desc.position - normal * a.desc.radius;
        let arm_a = point - a.desc.position;
        let arm_b = point - b.desc.position;

        let relative = a.point_velocity(point) - b.point_velocity(point);
        let vn = relative.dot(normal);
        let jn = if vn < 0.0 { -(1.0 + self.config.restitution) * vn / (wa + wb) } else { 0.0 };
        a.linear_velocity += normal * jn * wa;
        b.linear_velocity -= normal * jn * wb;

        let relative = a.point_velocity(point) - b.point_velocity(point);
        let slip = relative - normal * relative.dot(normal);
        let slip_speed = slip.length();
        let mut tangent_impulse = Vec3::ZERO;
        if slip_speed > 1e-6 {
            let k = wa + wb
                + a.desc.radius * a.desc.radius * ia
                + b.desc.radius * b.desc.radius * ib;
            let jt = (slip_speed / k).min(self.config.friction * jn);
            tangent_impulse = -slip / slip_speed * jt;
            a.linear_velocity += tangent_impulse * wa;
            b.linear_velocity -= tangent_impulse * wb;
            a.angular_velocity += arm_a.cross(tangent_impulse) * ia;
            b.angular_velocity -= arm_b.cross(tangent_impulse) * ib;
        }

        let impulse = (normal * jn + tangent_impulse).length();
        events.push(ContactEvent::Collision {
            body: id_a,
            other: Collider::Particle(id_b),
            contact: ContactPoint { point, normal },
            impulse,
        });
        events.push(ContactEvent::Collision {
            body: id_b,
            other: Collider::Particle(id_a),
            contact: ContactPoint { point, normal: -normal },
            impulse,
        });

        self.bodies[i] = Some(a);
        self.bodies[j] = Some(b);
    }

    fn overlap_triggers(&self, events: &mut Vec<ContactEvent>) {
        for (&digger, volume) in &self.triggers {
            for (index, slot) in self.bodies.iter().enumerate() {
                let Some(body) = slot else { continue };
                if body.desc.enabled && volume.intersects_sphere(body.desc.position, body.desc.radius) {
                    events.push(ContactEvent::Proximity {
                        body: BodyId(index as u32),
                        other: Collider::Digger(digger),
                    });
                }
            }
        }
    }

    fn raycast_terrain(&self, ray: &Ray, max_distance: f32, terrain: &dyn TerrainSurface) -> Option<RayHit> {
        let o = ray.origin;
        let d = ray.direction;

        // Straight down: closed form
        if d.x.abs() < 1e-6 && d.z.abs() < 1e-6 && d.y < 0.0 {
            let ground = terrain.sample(o.x, o.z)?;
            let distance = o.y - ground;
            if distance < 0.0 || distance > max_distance {
                return None;
            }
            return Some(RayHit {
                point: Vec3::new(o.x, ground, o.z),
                normal: Self::terrain_normal(terrain, o.x, o.z, 0.1),
                distance,
            });
        }

        // General direction: march, then bisect the crossing
        let limit = max_distance.min(self.config.max_probe_distance);
        let step = 0.1;
        let above = |t: f32| {
            let p = ray.at(t);
            terrain.sample(p.x, p.z).map(|h| p.y >= h)
        };
        if above(0.0) != Some(true) {
            return None;
        }
        let mut t0 = 0.0;
        let mut t1 = step;
        while t1 <= limit {
            if above(t1) == Some(false) {
                for _ in 0..16 {
                    let mid = 0.5 * (t0 + t1);
                    if above(mid) == Some(false) { t1 = mid } else { t0 = mid }
                }
                let point = ray.at(t1);
                return Some(RayHit {
                    point,
                    normal: Self::terrain_normal(terrain, point.x, point.z, 0.1),
                    distance: t1,
                });
            }
            t0 = t1;
            t1 += step;
        }
        None
    }

    fn raycast_bodies(&self, ray: &Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        for body in self.bodies.iter().flatten() {
            if !body.desc.enabled || !mask.contains(body.desc.layer) {
                continue;
            }
            let to_center = body.desc.position - ray.origin;
            let along = to_center.dot(ray.direction);
            let closest_sq = to_center.length_squared() - along * along;
            let r2 = body.desc.radius * body.desc.radius;
            if closest_sq > r2 {
                continue;
            }
            let t = along - (r2 - closest_sq).sqrt();
            if t < 0.0 || t > max_distance || best.is_some_and(|hit| hit.distance <= t) {
                continue;
            }
            let point = ray.at(t);
            best = Some(RayHit {
                point,
                normal: (point - body.desc.position).normalize_or_zero(),
                distance: t,
            });
        }
        best
    }
}

impl Default for SphereWorld {
    fn default() -> Self {
        Self::new(SphereWorldConfig::default())
    }
}

impl PhysicsWorld for SphereWorld {
    fn fixed_timestep(&self) -> f32 {
        self.config.fixed_timestep
    }

    fn raycast(
        &self,
        ray: &Ray,
        max_distance: f32,
        mask: LayerMask,
        terrain: &dyn TerrainSurface,
    ) -> Option<RayHit> {
        let terrain_hit = if mask.contains(self.config.terrain_layer) {
            self.raycast_terrain(ray, max_distance, terrain)
        } else {
            None
        };
        let body_hit = self.raycast_bodies(ray, max_distance, mask);
        match (terrain_hit, body_hit) {
            (Some(t), Some(b)) => Some(if b.distance < t.distance { b } else { t }),
            (t, b) => t.or(b),
        }
    }

    fn sync_body(&mut self, id: BodyId, desc: &BodyDesc) {
        let index = id.index();
        if index >= self.bodies.len() {
            self.bodies.resize(index + 1, None);
        }

        let slot = &mut self.bodies[index];
        if let Some(body) = slot.as_mut() {
            let was_dynamic = body.is_dynamic();
            let pose = (body.desc.position, body.desc.orientation);
            body.desc = *desc;
            if was_dynamic && body.is_dynamic() {
                // Simulated pose wins over the mirrored one
                (body.desc.position, body.desc.orientation) = pose;
            } else if !body.is_dynamic() {
                body.linear_velocity = Vec3::ZERO;
                body.angular_velocity = Vec3::ZERO;
            }
        } else {
            *slot = Some(SphereBody {
                desc: *desc,
                linear_velocity: Vec3::ZERO,
                angular_velocity: Vec3::ZERO,
                force: Vec3::ZERO,
                torque: Vec3::ZERO,
            });
        }
    }

    fn body_state(&self, id: BodyId) -> Option<BodyState> {
        let body = self.bodies.get(id.index())?.as_ref()?;
        if !body.desc.enabled {
            return None;
        }
        Some(BodyState {
            position: body.desc.position,
            orientation: body.desc.orientation,
            linear_velocity: body.linear_velocity,
            angular_velocity: body.angular_velocity,
        })
    }

    fn add_force(&mut self, id: BodyId, force: Vec3) {
        if let Some(Some(body)) = self.bodies.get_mut(id.index()) {
            body.force += force;
        }
    }

    fn add_torque(&mut self, id: BodyId, torque: Vec3) {
        if let Some(Some(body)) = self.bodies.get_mut(id.index()) {
            body.torque += torque;
        }
    }

    fn set_trigger(&mut self, id: DiggerId, volume: Aabb) {
        self.triggers.insert(id, volume);
    }

    fn remove_trigger(&mut self, id: DiggerId) {
        self.triggers.remove(&id);
    }

    fn step(&mut self, dt: f32, terrain: &dyn TerrainSurface) -> Vec<ContactEvent> {
        let mut events = Vec::new();
        if dt <= 0.0 {
            return events;
        }
        self.integrate(dt);
        self.collide_pairs(&mut events);
        self.collide_terrain(terrain, &mut events);
        self.overlap_triggers(&mut events);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::HeightGrid;

    fn desc(position: Vec3, kinematic: bool) -> BodyDesc {
        BodyDesc {
            enabled: true,
            kinematic,
            layer: CollisionLayer(1),
            position,
            orientation: Quat::IDENTITY,
            radius: 0.25,
            mass: 1.0,
        }
    }

    #[test]
    fn test_vertical_probe_hits_flat_ground() {
        let world = SphereWorld::default();
        let terrain = HeightGrid::centered(1.0, 21, 21, 2.0);
        let ray = Ray::down(Vec3::new(1.0, 5.0, -3.0));
        let hit = world
            .raycast(&ray, f32::MAX, LayerMask::only(CollisionLayer(0)), &terrain)
            .unwrap();
        assert!((hit.distance - 3.0).abs() < 1e-6);
        assert_eq!(hit.point.y, 2.0);
    }

    #[test]
    fn test_probe_misses_off_terrain_and_wrong_mask() {
        let world = SphereWorld::default();
        let terrain = HeightGrid::centered(1.0, 5, 5, 0.0);
        let off = Ray::down(Vec3::new(40.0, 5.0, 0.0));
        assert!(world.raycast(&off, f32::MAX, LayerMask::ALL, &terrain).is_none());

        let on = Ray::down(Vec3::new(0.0, 5.0, 0.0));
        assert!(world.raycast(&on, f32::MAX, LayerMask::only(CollisionLayer(5)), &terrain).is_none());
    }

    #[test]
    fn test_slanted_probe_hits() {
        let world = SphereWorld::default();
        let terrain = HeightGrid::centered(0.5, 41, 41, 0.0);
        let ray = Ray::new(Vec3::new(-2.0, 2.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        let hit = world.raycast(&ray, 10.0, LayerMask::ALL, &terrain).unwrap();
        assert!(hit.point.y.abs() < 0.01);
        assert!((hit.point.x - 0.0).abs() < 0.05);
    }

    #[test]
    fn test_kinematic_body_does_not_fall() {
        let mut world = SphereWorld::default();
        let terrain = HeightGrid::centered(1.0, 11, 11, -10.0);
        world.sync_body(BodyId(0), &desc(Vec3::new(0.0, 1.0, 0.0), true));
        assert_eq!(world.dynamic_count(), 0);
        for _ in 0..10 {
            world.step(0.02, &terrain);
        }
        assert_eq!(world.body_state(BodyId(0)).unwrap().position.y, 1.0);
    }

    #[test]
    fn test_dynamic_body_lands_on_terrain() {
        let mut world = SphereWorld::default();
        let terrain = HeightGrid::centered(1.0, 11, 11, 0.0);
        world.sync_body(BodyId(0), &desc(Vec3::new(0.0, 1.0, 0.0), false));
        assert_eq!(world.dynamic_count(), 1);

        let mut touched = false;
        for _ in 0..200 {
            let events = world.step(0.02, &terrain);
            touched |= events.iter().any(|e| matches!(
                e,
                ContactEvent::Collision { other: Collider::Terrain, .. }
            ));
        }
        let state = world.body_state(BodyId(0)).unwrap();
        assert!(touched);
        assert!((state.position.y - 0.25).abs() < 0.05);
        assert!(state.linear_velocity.length() < 0.5);
    }

    #[test]
    fn test_overlapping_pair_reports_both_sides() {
        let mut world = SphereWorld::new(SphereWorldConfig {
            gravity: [0.0; 3],
            ..SphereWorldConfig::default()
        });
        let terrain = HeightGrid::centered(1.0, 11, 11, -10.0);
        world.sync_body(BodyId(0), &desc(Vec3::ZERO, false));
        world.sync_body(BodyId(1), &desc(Vec3::new(0.45, 0.0, 0.0), false));
        world.set_velocity(BodyId(0), Vec3::X, Vec3::ZERO);

        let events = world.step(0.01, &terrain);
        let proximity = events
            .iter()
            .filter(|e| matches!(e, ContactEvent::Proximity { other: Collider::Particle(_), .. }))
            .count();
        let collisions: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ContactEvent::Collision { body, impulse, .. } => Some((*body, *impulse)),
                _ => None,
            })
            .collect();
        assert_eq!(proximity, 2);
        assert_eq!(collisions.len(), 2);
        assert!(collisions.iter().all(|&(_, impulse)| impulse > 0.0));
    }

    #[test]
    fn test_trigger_overlap_reported() {
        let mut world = SphereWorld::default();
        let terrain = HeightGrid::centered(1.0, 11, 11, -10.0);
        world.sync_body(BodyId(3), &desc(Vec3::new(0.0, 0.0, 0.0), true));
        world.set_trigger(DiggerId(7), Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5)));

        let events = world.step(0.02, &terrain);
        assert!(events.contains(&ContactEvent::Proximity {
            body: BodyId(3),
            other: Collider::Digger(DiggerId(7)),
        }));

        world.remove_trigger(DiggerId(7));
        assert!(world.step(0.02, &terrain).is_empty());
    }

    #[test]
    fn test_disabled_body_has_no_state() {
        let mut world = SphereWorld::default();
        let mut d = desc(Vec3::ZERO, true);
        world.sync_body(BodyId(0), &d);
        d.enabled = false;
        world.sync_body(BodyId(0), &d);
        assert!(world.body_state(BodyId(0)).is_none());
    }
}
