//! Sand field configuration.
//!
//! Loaded once at startup and static for the run. Every section has defaults,
//! so a config file only needs to name what it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::physics::{CollisionLayer, LayerMask};

/// Particle pool sizing
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of particles preallocated at startup
    pub capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { capacity: 4096 }
    }
}

/// Spawn window geometry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Columns per side (window is `resolution x resolution`)
    pub resolution: usize,
    /// Side length of the window in meters
    pub width: f32,
    /// How far below the surface columns are stacked
    pub depth: f32,
    /// Height above the anchor the ground probe starts from
    pub probe_height: f32,
    /// Activated particles farther than this outside the window are recycled.
    /// `None` keeps them forever.
    pub recycle_margin: Option<f32>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            resolution: 16,
            width: 8.0,
            depth: 1.0,
            probe_height: 10.0,
            recycle_margin: Some(2.0),
        }
    }
}

/// Per-particle parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Stacking diameter of dormant particles
    pub size: f32,
    /// Radius at activation
    pub min_radius: f32,
    /// Radius once fully grown
    pub max_radius: f32,
    /// Seconds from activation to full radius
    pub ballooning_time: f32,
    pub mass: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            size: 0.25,
            min_radius: 0.05,
            max_radius: 0.125,
            ballooning_time: 0.5,
            mass: 0.02,
        }
    }
}

/// Inter-particle force coefficients
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceConfig {
    pub cohesion: f32,
    pub rolling_friction: f32,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            cohesion: 0.002,
            rolling_friction: 0.1,
        }
    }
}

/// Collision layer assignment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    /// Layer of dormant particles (part of the static ground)
    pub static_layer: CollisionLayer,
    /// Layer of activated particles
    pub dynamic_layer: CollisionLayer,
    /// Layers the ground probe hits
    pub terrain_mask: LayerMask,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            static_layer: CollisionLayer(8),
            dynamic_layer: CollisionLayer(9),
            terrain_mask: LayerMask::only(CollisionLayer(0)),
        }
    }
}

/// Complete sand field configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandConfig {
    pub pool: PoolConfig,
    pub window: WindowConfig,
    pub particle: ParticleConfig,
    pub forces: ForceConfig,
    pub layers: LayerConfig,
}

impl SandConfig {
    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config: SandConfig = serde_json::from_str(&json)?;
        config.validate()?;
        log::info!("Loaded sand config from {}", path.display());
        Ok(config)
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check that the values describe a runnable field
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::Config(msg));

        if self.pool.capacity == 0 {
            return fail("pool.capacity must be at least 1".into());
        }

        let w = &self.window;
        if w.resolution < 2 {
            return fail(format!("window.resolution must be at least 2, got {}", w.resolution));
        }
        if !(w.width > 0.0) || !w.width.is_finite() {
            return fail(format!("window.width must be positive and finite, got {}", w.width));
        }
        if !(w.depth > 0.0) || !w.depth.is_finite() {
            return fail(format!("window.depth must be positive and finite, got {}", w.depth));
        }
        if !w.probe_height.is_finite() {
            return fail("window.probe_height must be finite".into());
        }
        if let Some(margin) = w.recycle_margin {
            if !(margin >= 0.0) || !margin.is_finite() {
                return fail(format!("window.recycle_margin must be finite and not negative, got {margin}"));
            }
        }

        let p = &self.particle;
        if !(p.size > 0.0) || !p.size.is_finite() {
            return fail(format!("particle.size must be positive and finite, got {}", p.size));
        }
        if !(p.min_radius > 0.0) || !p.max_radius.is_finite() || p.min_radius > p.max_radius {
            return fail(format!(
                "particle radii must satisfy 0 < min_radius <= max_radius, got {} / {}",
                p.min_radius, p.max_radius
            ));
        }
        if !(p.ballooning_time >= 0.0) || !p.ballooning_time.is_finite() {
            return fail(format!("particle.ballooning_time must not be negative, got {}", p.ballooning_time));
        }
        if !(p.mass > 0.0) || !p.mass.is_finite() {
            return fail(format!("particle.mass must be positive, got {}", p.mass));
        }

        let f = &self.forces;
        if !(f.cohesion >= 0.0) || !(f.rolling_friction >= 0.0) {
            return fail(format!(
                "force coefficients must not be negative, got cohesion {} / rolling_friction {}",
                f.cohesion, f.rolling_friction
            ));
        }

        if self.layers.static_layer == self.layers.dynamic_layer {
            return fail(format!(
                "static and dynamic layers must differ, both are {}",
                self.layers.static_layer.0
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SandConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases: Vec<fn(&mut SandConfig)> = vec![
            |c| c.pool.capacity = 0,
            |c| c.window.resolution = 1,
            |c| c.window.width = 0.0,
            |c| c.window.depth = -1.0,
            |c| c.window.depth = f32::INFINITY,
            |c| c.window.width = f32::INFINITY,
            |c| c.window.recycle_margin = Some(-0.5),
            |c| c.particle.size = 0.0,
            |c| c.particle.size = f32::NAN,
            |c| c.particle.max_radius = f32::INFINITY,
            |c| c.particle.mass = f32::INFINITY,
            |c| c.particle.min_radius = 0.0,
            |c| c.particle.min_radius = c.particle.max_radius * 2.0,
            |c| c.particle.ballooning_time = -1.0,
            |c| c.particle.mass = 0.0,
            |c| c.forces.cohesion = -0.1,
            |c| c.forces.rolling_friction = f32::NAN,
            |c| c.layers.dynamic_layer = c.layers.static_layer,
        ];
        for (i, mutate) in cases.into_iter().enumerate() {
            let mut config = SandConfig::default();
            mutate(&mut config);
            assert!(
                matches!(config.validate(), Err(Error::Config(_))),
                "case {i} should be rejected"
            );
        }
    }

    #[test]
    fn test_zero_ballooning_time_allowed() {
        let mut config = SandConfig::default();
        config.particle.ballooning_time = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sand.json");

        let mut config = SandConfig::default();
        config.pool.capacity = 123;
        config.window.recycle_margin = None;
        config.forces.cohesion = 0.5;
        config.save(&path).unwrap();

        assert_eq!(SandConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sand.json");
        std::fs::write(&path, r#"{ "window": { "resolution": 8 }, "layers": { "static_layer": 3 } }"#).unwrap();

        let config = SandConfig::load(&path).unwrap();
        assert_eq!(config.window.resolution, 8);
        assert_eq!(config.window.width, WindowConfig::default().width);
        assert_eq!(config.layers.static_layer, CollisionLayer(3));
        assert_eq!(config.pool, PoolConfig::default());
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(SandConfig::load(dir.path().join("missing.json")), Err(Error::Io(_))));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "{ not json").unwrap();
        assert!(matches!(SandConfig::load(&garbage), Err(Error::Json(_))));

        let invalid = dir.path().join("invalid.json");
        std::fs::write(&invalid, r#"{ "pool": { "capacity": 0 } }"#).unwrap();
        assert!(matches!(SandConfig::load(&invalid), Err(Error::Config(_))));
    }
}
