//! Sand field driver.
//!
//! [`SandSimulation`] owns the pool, the spawn window and the digger set, and
//! receives the terrain and physics world it runs against at construction.
//! The host calls [`SandSimulation::step_frame`] once per rendered frame and
//! [`SandSimulation::step_physics`] once per fixed physics step, or lets
//! [`SandSimulation::advance`] split a frame into fixed steps for it.

pub mod config;

pub use config::{ForceConfig, LayerConfig, ParticleConfig, PoolConfig, SandConfig, WindowConfig};

use crate::core::types::Vec3;
use crate::core::{Result, SimClock};
use crate::excavation::{self, DiggerSet};
use crate::math::Aabb;
use crate::physics::{BodyState, Collider, ContactEvent, DiggerId, PhysicsWorld};
use crate::sand::{forces, ParticleId, ParticlePool, PoolStats};
use crate::spawn::{SpawnWindow, WindowReport};
use crate::terrain::TerrainSurface;

/// What one frame update did
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameReport {
    pub window: WindowReport,
    /// Active particles whose pose was read back from the physics world
    pub read_back: usize,
    /// Growing particles whose radius changed
    pub grown: usize,
    /// Bodies pushed to the physics world
    pub synced: usize,
}

/// What one or more physics steps did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhysicsReport {
    pub steps: u32,
    /// Contact events reported by the world
    pub contacts: usize,
    /// Particles switched from dormant to dynamic by diggers
    pub activations: usize,
    /// Terrain height edits made by diggers
    pub terrain_edits: usize,
    pub cohesion_applications: usize,
    pub friction_applications: usize,
}

impl PhysicsReport {
    /// Fold another report into this one
    pub fn accumulate(&mut self, other: &PhysicsReport) {
        self.steps += other.steps;
        self.contacts += other.contacts;
        self.activations += other.activations;
        self.terrain_edits += other.terrain_edits;
        self.cohesion_applications += other.cohesion_applications;
        self.friction_applications += other.friction_applications;
    }
}

/// Result of [`SandSimulation::advance`]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AdvanceReport {
    pub physics: PhysicsReport,
    pub frame: FrameReport,
}

/// Sand particle field around a moving anchor
pub struct SandSimulation<T: TerrainSurface, W: PhysicsWorld> {
    config: SandConfig,
    terrain: T,
    world: W,
    pool: ParticlePool,
    window: SpawnWindow,
    diggers: DiggerSet,
    clock: SimClock,
    anchor: Vec3,
}

impl<T: TerrainSurface, W: PhysicsWorld> SandSimulation<T, W> {
    /// Validate `config` and preallocate the particle pool
    pub fn new(config: SandConfig, terrain: T, world: W) -> Result<Self> {
        config.validate()?;

        let pool = ParticlePool::new(
            config.pool.capacity,
            config.particle.clone(),
            config.layers.static_layer,
        );
        let window = SpawnWindow::new(config.window.clone(), config.particle.size);
        let clock = SimClock::new(world.fixed_timestep());

        log::info!(
            "Sand simulation ready: {} particles, {} per column, fixed step {:.4}s",
            config.pool.capacity,
            window.stack_height(),
            clock.fixed_dt()
        );

        Ok(Self {
            config,
            terrain,
            world,
            pool,
            window,
            diggers: DiggerSet::new(),
            clock,
            anchor: Vec3::ZERO,
        })
    }

    pub fn config(&self) -> &SandConfig {
        &self.config
    }

    pub fn terrain(&self) -> &T {
        &self.terrain
    }

    pub fn terrain_mut(&mut self) -> &mut T {
        &mut self.terrain
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn window(&self) -> &SpawnWindow {
        &self.window
    }

    pub fn diggers(&self) -> &DiggerSet {
        &self.diggers
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Simulation time in seconds
    pub fn time(&self) -> f32 {
        self.clock.time()
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    /// Move the reference point the window follows
    pub fn set_anchor(&mut self, anchor: Vec3) {
        self.anchor = anchor;
    }

    /// Create or move a digger volume
    pub fn set_digger(&mut self, id: DiggerId, volume: Aabb) {
        self.diggers.set(id, volume, &mut self.world);
    }

    pub fn remove_digger(&mut self, id: DiggerId) -> bool {
        self.diggers.remove(id, &mut self.world)
    }

    /// Activate a dormant particle now. Returns false if it was not dormant
    /// and spawned.
    pub fn activate(&mut self, id: ParticleId) -> bool {
        let now = self.clock.time();
        let layer = self.config.layers.dynamic_layer;
        let activated = self.pool.get_mut(id).is_some_and(|p| p.activate(now, layer));
        if activated {
            Self::sync_dirty(&mut self.pool, &mut self.world);
        }
        activated
    }

    /// Per-frame pass: advance the clock by `dt`, then run the frame update.
    pub fn step_frame(&mut self, dt: f32) -> FrameReport {
        self.clock.tick_frame(dt);
        self.update_frame()
    }

    /// Per-fixed-step pass: step the world, then react to its contacts.
    ///
    /// Forces computed here are queued on the world and act during the next
    /// step.
    pub fn step_physics(&mut self, dt: f32) -> PhysicsReport {
        let events = self.world.step(dt, &self.terrain);
        self.clock.record_physics_step();

        let mut report = PhysicsReport {
            steps: 1,
            contacts: events.len(),
            ..PhysicsReport::default()
        };
        for event in &events {
            self.handle_contact(event, dt, &mut report);
        }

        Self::sync_dirty(&mut self.pool, &mut self.world);
        report
    }

    /// Run the fixed steps due for a frame of `frame_dt`, then the frame
    /// update.
    pub fn advance(&mut self, frame_dt: f32) -> AdvanceReport {
        let steps = self.clock.advance(frame_dt);
        let fixed_dt = self.clock.fixed_dt();

        let mut physics = PhysicsReport::default();
        for _ in 0..steps {
            physics.accumulate(&self.step_physics(fixed_dt));
        }
        let frame = self.update_frame();

        AdvanceReport { physics, frame }
    }

    fn update_frame(&mut self) -> FrameReport {
        let now = self.clock.time();
        let mut report = FrameReport::default();

        for particle in self.pool.iter_mut() {
            if !particle.is_used() || !particle.is_active() {
                continue;
            }
            if let Some(state) = self.world.body_state(particle.id().body()) {
                particle.sync_from_body(&state);
                report.read_back += 1;
            }
            if particle.update_growth(now, &self.config.particle) {
                report.grown += 1;
            }
        }

        report.window = self.window.update(
            self.anchor,
            &mut self.pool,
            &self.world,
            &self.terrain,
            self.config.layers.terrain_mask,
        );
        report.synced = Self::sync_dirty(&mut self.pool, &mut self.world);
        report
    }

    fn handle_contact(&mut self, event: &ContactEvent, dt: f32, report: &mut PhysicsReport) {
        let id = ParticleId::from_body(event.body());
        let Some(particle) = self.pool.get(id) else { return };
        if !particle.is_used() {
            return;
        }

        match *event {
            ContactEvent::Proximity { other: Collider::Digger(digger), .. } => {
                if !self.diggers.contains(digger) {
                    return;
                }
                let live = self.world.body_state(event.body());
                let Some(particle) = self.pool.get_mut(id) else { return };
                // Dig under the simulated pose, not the one from the last frame
                if let Some(state) = live {
                    particle.sync_from_body(&state);
                }
                let outcome = excavation::excavate(
                    particle,
                    self.config.particle.min_radius,
                    &mut self.terrain,
                    self.clock.time(),
                    self.config.layers.dynamic_layer,
                );
                if outcome.activated {
                    report.activations += 1;
                }
                if outcome.lowered_to.is_some() {
                    report.terrain_edits += 1;
                }
            }
            ContactEvent::Proximity { body, other: Collider::Particle(other) } => {
                if !particle.is_active() || self.config.forces.cohesion == 0.0 {
                    return;
                }
                let other_id = ParticleId::from_body(other);
                let Some(neighbor) = self.pool.get(other_id).filter(|p| p.is_used()) else {
                    return;
                };
                let position = self.body_position(id);
                let other_position = self.body_position(other_id);
                let force = forces::cohesion_force(
                    position,
                    other_position,
                    particle.mass(),
                    neighbor.mass(),
                    self.config.forces.cohesion,
                );
                if force != Vec3::ZERO {
                    self.world.add_force(body, force);
                    report.cohesion_applications += 1;
                }
            }
            ContactEvent::Collision { body, other, contact, impulse } => {
                if !particle.is_active() {
                    return;
                }
                let Some(state) = self.world.body_state(body) else { return };
                let neighbor = match other {
                    Collider::Particle(other) if self.is_used(ParticleId::from_body(other)) => {
                        self.world.body_state(other)
                    }
                    _ => None,
                };
                let torque = forces::rolling_friction_torque(
                    &state,
                    neighbor.as_ref(),
                    &contact,
                    impulse,
                    dt,
                    self.config.forces.rolling_friction,
                );
                if let Some(torque) = torque {
                    self.world.add_torque(body, torque);
                    report.friction_applications += 1;
                }
            }
            ContactEvent::Proximity { .. } => {}
        }
    }

    fn is_used(&self, id: ParticleId) -> bool {
        self.pool.get(id).is_some_and(|p| p.is_used())
    }

    /// Freshest known position of a particle
    fn body_position(&self, id: ParticleId) -> Vec3 {
        self.world
            .body_state(id.body())
            .map(|state: BodyState| state.position)
            .or_else(|| self.pool.get(id).map(|p| p.position()))
            .unwrap_or(Vec3::ZERO)
    }

    /// Push every dirty particle to the physics world
    fn sync_dirty(pool: &mut ParticlePool, world: &mut W) -> usize {
        let mut synced = 0;
        for particle in pool.iter_mut().filter(|p| p.is_dirty()) {
            world.sync_body(particle.id().body(), &particle.body_desc());
            particle.clear_dirty();
            synced += 1;
        }
        synced
    }
}
