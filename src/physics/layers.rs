//! Collision layers and masks

use serde::{Deserialize, Serialize};

/// Collision layer index (0..32)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionLayer(pub u8);

impl CollisionLayer {
    /// Bit for this layer inside a [`LayerMask`]
    pub fn bit(self) -> u32 {
        1u32.checked_shl(self.0 as u32).unwrap_or(0)
    }
}

/// Set of collision layers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    /// Mask containing a single layer
    pub fn only(layer: CollisionLayer) -> Self {
        LayerMask(layer.bit())
    }

    /// Copy of this mask with `layer` added
    pub fn with(self, layer: CollisionLayer) -> Self {
        LayerMask(self.0 | layer.bit())
    }

    pub fn contains(self, layer: CollisionLayer) -> bool {
        self.0 & layer.bit() != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_contains() {
        let mask = LayerMask::only(CollisionLayer(3)).with(CollisionLayer(8));
        assert!(mask.contains(CollisionLayer(3)));
        assert!(mask.contains(CollisionLayer(8)));
        assert!(!mask.contains(CollisionLayer(0)));
        assert!(!LayerMask::NONE.contains(CollisionLayer(3)));
        assert!(LayerMask::ALL.contains(CollisionLayer(31)));
    }

    #[test]
    fn test_out_of_range_layer_has_no_bit() {
        assert_eq!(CollisionLayer(40).bit(), 0);
    }
}
