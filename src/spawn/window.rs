//! Spawn window: an R x R grid of particle columns that scrolls with an anchor.
//!
//! Every tick each column recomputes its target site. Columns that moved more
//! than one cell (or never found the ground) are refreshed: their dormant
//! particles go back to the pool, the terrain is probed straight down, and a
//! fresh vertical stack is drawn from the pool. Other columns just slide their
//! dormant particles onto the current target. Cost follows anchor movement,
//! not window size.

use crate::core::types::Vec3;
use crate::math::{Aabb, Ray};
use crate::physics::{LayerMask, PhysicsWorld};
use crate::sand::{ParticleId, ParticlePool};
use crate::simulation::config::WindowConfig;
use crate::terrain::TerrainSurface;
use super::column::{Column, ColumnId};
use super::wrap;

/// What one window update did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowReport {
    /// Columns refreshed this tick
    pub stale_columns: usize,
    /// Refreshed columns whose ground probe missed
    pub probe_misses: usize,
    /// Dormant particles returned to the pool
    pub released: usize,
    /// Particles drawn from the pool
    pub acquired: usize,
    /// Activated particles reclaimed for leaving the window
    pub recycled: usize,
    /// The pool ran dry while stacking
    pub pool_exhausted: bool,
}

impl WindowReport {
    /// Nothing was refreshed, spawned or recycled
    pub fn is_idle(&self) -> bool {
        self.stale_columns == 0 && self.recycled == 0
    }
}

/// Scrolling grid of particle columns
pub struct SpawnWindow {
    config: WindowConfig,
    /// Vertical spacing of stacked particles
    particle_size: f32,
    /// Width of one column cell (`width / resolution`)
    cell_size: f32,
    /// Columns in row-major order, index `i * resolution + j`
    columns: Vec<Column>,
    /// Scratch list of stale column indices
    stale: Vec<usize>,
    anchor: Vec3,
}

impl SpawnWindow {
    /// `config` is expected to have passed `SandConfig::validate`.
    pub fn new(config: WindowConfig, particle_size: f32) -> Self {
        debug_assert!(config.resolution >= 1, "window needs at least one column");
        debug_assert!(config.width.is_finite() && config.width > 0.0);
        debug_assert!(config.depth.is_finite());
        debug_assert!(particle_size.is_finite() && particle_size > 0.0);
        let resolution = config.resolution;
        let cell_size = config.width / resolution as f32;
        let columns = (0..resolution)
            .flat_map(|i| (0..resolution).map(move |j| (i, j)))
            .map(|(i, j)| Column::new(ColumnId((i * resolution + j) as u32), i, j))
            .collect();

        log::info!(
            "Created spawn window: {r}x{r} columns, {:.2}m wide, cell {:.3}m, depth {:.2}m",
            config.width, cell_size, config.depth, r = resolution
        );

        Self {
            config,
            particle_size,
            cell_size,
            columns,
            stale: Vec::with_capacity(resolution * resolution),
            anchor: Vec3::ZERO,
        }
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn resolution(&self) -> usize {
        self.config.resolution
    }

    pub fn width(&self) -> f32 {
        self.config.width
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Anchor position seen by the last update
    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, i: usize, j: usize) -> Option<&Column> {
        if i < self.resolution() && j < self.resolution() {
            self.columns.get(i * self.resolution() + j)
        } else {
            None
        }
    }

    pub fn column_by_id(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.index())
    }

    /// Target site of column (i, j) for an anchor position
    pub fn target_position(&self, anchor: Vec3, i: usize, j: usize) -> Vec3 {
        let r = self.resolution();
        Vec3::new(
            wrap::wrapped_coordinate(anchor.x, i, r, self.cell_size),
            0.0,
            wrap::wrapped_coordinate(anchor.z, j, r, self.cell_size),
        )
    }

    /// Horizontal footprint of the column sites for an anchor position
    pub fn footprint(&self, anchor: Vec3) -> Aabb {
        let r = self.resolution();
        let start_x = wrap::window_start(wrap::anchor_cell(anchor.x, self.cell_size), r);
        let start_z = wrap::window_start(wrap::anchor_cell(anchor.z, self.cell_size), r);
        let last = (r - 1) as i64;
        Aabb::new(
            Vec3::new(start_x as f32 * self.cell_size, f32::NEG_INFINITY, start_z as f32 * self.cell_size),
            Vec3::new(
                (start_x + last) as f32 * self.cell_size,
                f32::INFINITY,
                (start_z + last) as f32 * self.cell_size,
            ),
        )
    }

    /// Depths below the surface at which a column stacks particles
    pub fn stack_depths(&self) -> impl Iterator<Item = f32> + use<> {
        let size = self.particle_size;
        let depth = self.config.depth;
        (0..)
            .map(move |k| size * 0.5 + k as f32 * size)
            .take_while(move |&d| d < depth)
    }

    /// Number of particles a fully stacked column holds
    pub fn stack_height(&self) -> usize {
        self.stack_depths().count()
    }

    /// Run one tick of column tracking around `anchor`.
    pub fn update(
        &mut self,
        anchor: Vec3,
        pool: &mut ParticlePool,
        world: &dyn PhysicsWorld,
        terrain: &dyn TerrainSurface,
        terrain_mask: LayerMask,
    ) -> WindowReport {
        let mut report = WindowReport::default();
        self.anchor = anchor;

        self.prune(pool);

        // Targets and staleness; quiet columns just follow their target
        self.stale.clear();
        for index in 0..self.columns.len() {
            let (i, j) = self.columns[index].grid_coords();
            let target = self.target_position(anchor, i, j);
            let column = &mut self.columns[index];
            column.target = target;

            if column.is_stale(self.cell_size) {
                self.stale.push(index);
            } else {
                for &id in &column.particles {
                    if let Some(particle) = pool.get_mut(id) {
                        particle.slide_to(target.x, target.z);
                    }
                }
            }
        }
        report.stale_columns = self.stale.len();

        // Release everything first so refreshed columns never compete with
        // slots still held by columns refreshed later in the same tick
        for &index in &self.stale {
            let column = &mut self.columns[index];
            column.previous_target = column.target;
            for id in column.particles.drain(..) {
                if pool.release(id) {
                    report.released += 1;
                }
            }
        }

        let depths: Vec<f32> = self.stack_depths().collect();
        for &index in &self.stale {
            let column = &mut self.columns[index];
            let origin = Vec3::new(column.target.x, anchor.y + self.config.probe_height, column.target.z);
            let Some(hit) = world.raycast(&Ray::down(origin), f32::MAX, terrain_mask, terrain) else {
                column.height = None;
                report.probe_misses += 1;
                continue;
            };

            let height = hit.point.y;
            column.height = Some(height);
            if report.pool_exhausted {
                continue;
            }
            for &depth in &depths {
                let Some(id) = pool.acquire() else {
                    report.pool_exhausted = true;
                    break;
                };
                if let Some(particle) = pool.get_mut(id) {
                    particle.place(
                        Vec3::new(column.target.x, height - depth, column.target.z),
                        column.id,
                    );
                }
                column.particles.push(id);
                report.acquired += 1;
            }
        }

        report.recycled = self.recycle(anchor, pool);

        if !report.is_idle() {
            log::debug!(
                "Window tick: {} stale, {} misses, -{} +{} particles, {} recycled{}",
                report.stale_columns,
                report.probe_misses,
                report.released,
                report.acquired,
                report.recycled,
                if report.pool_exhausted { ", pool exhausted" } else { "" }
            );
        }
        report
    }

    /// Drop column entries that no longer belong to the column
    fn prune(&mut self, pool: &ParticlePool) {
        for column in &mut self.columns {
            let id = column.id;
            column.particles.retain(|&pid| {
                pool.get(pid)
                    .is_some_and(|p| p.is_used() && !p.is_active() && p.column() == Some(id))
            });
        }
    }

    /// Reclaim activated particles that drifted out of the window
    fn recycle(&self, anchor: Vec3, pool: &mut ParticlePool) -> usize {
        let Some(margin) = self.config.recycle_margin else {
            return 0;
        };
        let bounds = self.footprint(anchor).expanded(margin);

        let outside: Vec<ParticleId> = pool
            .active()
            .filter(|p| {
                let pos = p.position();
                pos.x < bounds.min.x || pos.x > bounds.max.x || pos.z < bounds.min.z || pos.z > bounds.max.z
            })
            .map(|p| p.id())
            .collect();

        outside.into_iter().filter(|&id| pool.reclaim(id)).count()
    }
}
