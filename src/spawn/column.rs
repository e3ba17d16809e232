//! One cell of the spawn window

use crate::core::types::Vec3;
use crate::sand::ParticleId;

/// Flat index of a column inside its window
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnId(pub u32);

impl ColumnId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A vertical stack of dormant particles at one grid site
#[derive(Clone, Debug)]
pub struct Column {
    pub(crate) id: ColumnId,
    /// Grid coordinates (i along X, j along Z)
    pub(crate) i: usize,
    pub(crate) j: usize,
    /// Where the column should be this tick (y unused)
    pub(crate) target: Vec3,
    /// Target at the last refresh
    pub(crate) previous_target: Vec3,
    /// Surface height from the last probe, `None` if it missed
    pub(crate) height: Option<f32>,
    pub(crate) particles: Vec<ParticleId>,
}

impl Column {
    pub fn new(id: ColumnId, i: usize, j: usize) -> Self {
        Self {
            id,
            i,
            j,
            target: Vec3::ZERO,
            previous_target: Vec3::ZERO,
            height: None,
            particles: Vec::new(),
        }
    }

    pub fn id(&self) -> ColumnId {
        self.id
    }

    pub fn grid_coords(&self) -> (usize, usize) {
        (self.i, self.j)
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn previous_target(&self) -> Vec3 {
        self.previous_target
    }

    pub fn height(&self) -> Option<f32> {
        self.height
    }

    pub fn particles(&self) -> &[ParticleId] {
        &self.particles
    }

    /// Needs re-sampling: moved more than one cell since the last refresh, or
    /// has no valid height
    pub fn is_stale(&self, cell_size: f32) -> bool {
        (self.target - self.previous_target).length_squared() > cell_size * cell_size
            || self.height.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_column_is_stale() {
        let column = Column::new(ColumnId(0), 0, 0);
        assert!(column.is_stale(1.0));
    }

    #[test]
    fn test_stale_threshold_is_strict() {
        let mut column = Column::new(ColumnId(0), 0, 0);
        column.height = Some(0.0);
        column.target = Vec3::new(1.0, 0.0, 0.0);
        assert!(!column.is_stale(1.0));
        column.target = Vec3::new(1.0, 0.0, 0.1);
        assert!(column.is_stale(1.0));
    }
}
