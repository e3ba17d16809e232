//! Geometric primitives for probes and trigger volumes

pub mod aabb;
pub mod ray;

pub use aabb::Aabb;
pub use ray::{Ray, RayHit};
