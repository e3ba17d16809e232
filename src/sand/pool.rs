//! Particle Pool - fixed-capacity storage for sand particles
//!
//! - Every particle is created once, up front, disabled
//! - Slots are handed out lowest index first and never reallocated
//! - Exhaustion is a normal condition: callers simply stop spawning

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::physics::CollisionLayer;
use crate::simulation::config::ParticleConfig;
use super::particle::{Particle, ParticleId};

/// Cumulative pool counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub capacity: usize,
    pub in_use: usize,
    /// Successful acquisitions since creation
    pub acquired: u64,
    /// Releases of dormant particles since creation
    pub released: u64,
    /// Reclaims of activated particles since creation
    pub reclaimed: u64,
    /// Acquisitions that found the pool empty
    pub exhausted: u64,
}

/// Fixed-capacity particle allocator
pub struct ParticlePool {
    particles: Vec<Particle>,
    /// Free slot indices, smallest on top
    free_slots: BinaryHeap<Reverse<u32>>,
    params: ParticleConfig,
    static_layer: CollisionLayer,
    stats: PoolStats,
}

impl ParticlePool {
    /// Preallocate `capacity` disabled particles
    pub fn new(capacity: usize, params: ParticleConfig, static_layer: CollisionLayer) -> Self {
        let particles: Vec<Particle> = (0..capacity as u32)
            .map(|i| Particle::new(ParticleId(i), &params, static_layer))
            .collect();
        let free_slots: BinaryHeap<Reverse<u32>> = (0..capacity as u32).map(Reverse).collect();

        log::info!(
            "Created particle pool: {} slots, radius {:.3}..{:.3}",
            capacity, params.min_radius, params.max_radius
        );

        Self {
            particles,
            free_slots,
            params,
            static_layer,
            stats: PoolStats { capacity, ..PoolStats::default() },
        }
    }

    /// Take the lowest-indexed free slot and enable it as a dormant particle.
    ///
    /// Returns `None` when every slot is in use.
    pub fn acquire(&mut self) -> Option<ParticleId> {
        while let Some(Reverse(index)) = self.free_slots.pop() {
            let particle = &mut self.particles[index as usize];
            // Free list and enabled flag must agree; skip anything stale
            if particle.is_used() {
                log::warn!("Free list held in-use particle {}, skipping", index);
                continue;
            }
            particle.enable(&self.params, self.static_layer);
            self.stats.in_use += 1;
            self.stats.acquired += 1;
            return Some(ParticleId(index));
        }
        self.stats.exhausted += 1;
        None
    }

    /// Return a dormant particle to the pool.
    ///
    /// Active or already free particles are left untouched and `false` is
    /// returned.
    pub fn release(&mut self, id: ParticleId) -> bool {
        let Some(particle) = self.particles.get(id.index()) else {
            return false;
        };
        if !particle.is_used() {
            log::warn!("Release of free particle {} ignored", id.0);
            return false;
        }
        if particle.is_active() {
            log::warn!("Release of active particle {} ignored", id.0);
            return false;
        }
        self.free(id);
        self.stats.released += 1;
        true
    }

    /// Return an activated particle to the pool (window recycling).
    pub fn reclaim(&mut self, id: ParticleId) -> bool {
        let Some(particle) = self.particles.get(id.index()) else {
            return false;
        };
        if !particle.is_used() || !particle.is_active() {
            return false;
        }
        self.free(id);
        self.stats.reclaimed += 1;
        true
    }

    fn free(&mut self, id: ParticleId) {
        self.particles[id.index()].disable();
        self.free_slots.push(Reverse(id.0));
        self.stats.in_use -= 1;
    }

    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(id.index())
    }

    pub fn get_mut(&mut self, id: ParticleId) -> Option<&mut Particle> {
        self.particles.get_mut(id.index())
    }

    /// All particles, used or not
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.particles.iter_mut()
    }

    /// Particles that are spawned and activated
    pub fn active(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.is_used() && p.is_active())
    }

    pub fn params(&self) -> &ParticleConfig {
        &self.params
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// Number of spawned particles
    pub fn in_use(&self) -> usize {
        self.stats.in_use
    }

    pub fn available(&self) -> usize {
        self.capacity() - self.in_use()
    }

    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Pool utilization percentage
    pub fn utilization(&self) -> f32 {
        if self.capacity() == 0 {
            return 0.0;
        }
        self.in_use() as f32 / self.capacity() as f32 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::ColumnId;

    fn pool(capacity: usize) -> ParticlePool {
        ParticlePool::new(capacity, ParticleConfig::default(), CollisionLayer(8))
    }

    #[test]
    fn test_acquire_until_exhausted() {
        let mut pool = pool(3);
        assert_eq!(pool.acquire(), Some(ParticleId(0)));
        assert_eq!(pool.acquire(), Some(ParticleId(1)));
        assert_eq!(pool.acquire(), Some(ParticleId(2)));
        assert_eq!(pool.acquire(), None);
        assert_eq!(pool.in_use(), 3);
        assert_eq!(pool.stats().exhausted, 1);
        assert_eq!(pool.utilization(), 100.0);
    }

    #[test]
    fn test_release_makes_slot_reusable() {
        let mut pool = pool(2);
        let a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();
        assert!(pool.release(a));
        assert!(!pool.get(a).unwrap().is_used());
        assert_eq!(pool.acquire(), Some(a));
        assert_eq!(pool.stats().released, 1);
    }

    #[test]
    fn test_lowest_free_index_first() {
        let mut pool = pool(4);
        for expected in 0..3 {
            assert_eq!(pool.acquire(), Some(ParticleId(expected)));
        }
        // Release order does not matter, the smallest index comes back first
        assert!(pool.release(ParticleId(2)));
        assert!(pool.release(ParticleId(0)));
        assert_eq!(pool.acquire(), Some(ParticleId(0)));
        assert_eq!(pool.acquire(), Some(ParticleId(2)));
        assert_eq!(pool.acquire(), Some(ParticleId(3)));
        assert_eq!(pool.acquire(), None);
    }

    #[test]
    fn test_release_refuses_active_and_free() {
        let mut pool = pool(2);
        let a = pool.acquire().unwrap();
        pool.get_mut(a).unwrap().activate(0.0, CollisionLayer(9));
        assert!(!pool.release(a));
        assert!(pool.get(a).unwrap().is_used());

        // Slot 1 was never handed out
        assert!(!pool.release(ParticleId(1)));
        assert!(!pool.release(ParticleId(99)));
        assert_eq!(pool.in_use(), 1);
    }

    #[test]
    fn test_active_particle_never_reacquired() {
        let mut pool = pool(1);
        let a = pool.acquire().unwrap();
        pool.get_mut(a).unwrap().activate(0.0, CollisionLayer(9));
        assert_eq!(pool.acquire(), None);
        assert_eq!(pool.active().count(), 1);
    }

    #[test]
    fn test_reclaim_active_only() {
        let mut pool = pool(2);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        pool.get_mut(a).unwrap().activate(0.0, CollisionLayer(9));

        assert!(!pool.reclaim(b));
        assert!(pool.reclaim(a));
        assert_eq!(pool.in_use(), 1);
        assert_eq!(pool.stats().reclaimed, 1);

        // Comes back dormant
        let again = pool.acquire().unwrap();
        assert_eq!(again, a);
        assert!(pool.get(again).unwrap().state().is_dormant());
    }

    #[test]
    fn test_release_severs_column() {
        let mut pool = pool(1);
        let a = pool.acquire().unwrap();
        pool.get_mut(a).unwrap().place(glam::Vec3::ZERO, ColumnId(2));
        assert_eq!(pool.get(a).unwrap().column(), Some(ColumnId(2)));
        pool.release(a);
        assert_eq!(pool.get(a).unwrap().column(), None);
    }
}
