use num_traits::{One, PrimInt};
use serde::Deserialize;

use crate::constants::{
    DEFAULT_HULL_LAYER, DEFAULT_GROUND_LAYERS, DEFAULT_SELF_IGNORE_LAYER, DEFAULT_TERRAIN_LAYER,
    LAYER_COUNT,
};

/// Trait implemented by anything that names a single collision layer.
///
/// You choose the backing integer of masks built from it via the associated `Storage`.
pub trait LayerBit {
    type Storage: PrimInt;

    fn layer_index(&self) -> u8;

    fn bit(&self) -> Self::Storage {
        // NOTE: `layer_index()` must be < number of bits in `Storage`.
        Self::Storage::one() << (self.layer_index() as usize)
    }
}

/// One of the 32 host collision layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "u8")]
pub struct Layer(u8);

impl Layer {
    /// Default layer terrain statics are inserted on.
    pub const TERRAIN: Layer = Layer(DEFAULT_TERRAIN_LAYER);

    /// Returns `None` when `index` is outside `0..LAYER_COUNT`.
    pub const fn new(index: u8) -> Option<Self> {
        if index < LAYER_COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn index(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Layer {
    type Error = String;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Layer::new(index).ok_or_else(|| format!("collision layer {index} is out of range"))
    }
}

impl LayerBit for Layer {
    type Storage = u32;

    fn layer_index(&self) -> u8 {
        self.0
    }
}

/// A set of collision layers stored as a bitmask.
#[derive(Default, Copy, Clone, Debug, PartialEq, Eq)]
pub struct LayerMask<T: PrimInt = u32> {
    pub bits: T,
}

impl<T: PrimInt> LayerMask<T> {
    pub fn empty() -> Self {
        Self { bits: T::zero() }
    }

    pub fn from_layers<U: LayerBit<Storage = T> + Copy>(layers: &[U]) -> Self {
        let mut mask = Self::empty();
        for &layer in layers {
            mask.insert(layer);
        }
        mask
    }

    #[must_use]
    pub fn with<U: LayerBit<Storage = T>>(mut self, layer: U) -> Self {
        self.insert(layer);
        self
    }

    pub fn insert<U: LayerBit<Storage = T>>(&mut self, layer: U) {
        self.bits = self.bits | layer.bit();
    }

    pub fn remove<U: LayerBit<Storage = T>>(&mut self, layer: U) {
        self.bits = self.bits & !layer.bit();
    }

    pub fn contains<U: LayerBit<Storage = T>>(&self, layer: U) -> bool {
        (self.bits & layer.bit()) != T::zero()
    }

    pub fn intersects(&self, other: Self) -> bool {
        (self.bits & other.bits) != T::zero()
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    pub fn bits(&self) -> T {
        self.bits
    }

    pub fn is_empty(&self) -> bool {
        self.bits == T::zero()
    }
}

/// Layer configuration injected into the spring pass and the host.
///
/// The host engine decides what the numbers mean; the core only needs to know
/// where to park its own colliders and which layers count as ground.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SuspensionLayers {
    /// Layer own colliders are moved to while rays are cast.
    pub self_ignore: Layer,
    /// Layers a spring ray may hit.
    pub ground_mask: LayerMask,
    /// Layer the hull colliders normally live on.
    pub hull: Layer,
}

impl Default for SuspensionLayers {
    fn default() -> Self {
        let ground: Vec<Layer> = DEFAULT_GROUND_LAYERS.iter().copied().map(Layer).collect();
        Self {
            self_ignore: Layer(DEFAULT_SELF_IGNORE_LAYER),
            ground_mask: LayerMask::from_layers(&ground),
            hull: Layer(DEFAULT_HULL_LAYER),
        }
    }
}
