//! Granular sand particles: lifecycle, pooling and inter-particle forces

pub mod particle;
pub mod pool;
pub mod forces;

pub use particle::{ActivationState, Particle, ParticleId};
pub use pool::{ParticlePool, PoolStats};
