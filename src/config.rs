use crate::error::{Error, Result};
use crate::LongMap;

// =============================================================================
// Configuration
// =============================================================================

pub const DEFAULT_INITIAL_CAPACITY: usize = 16;
pub const DEFAULT_LOAD_FACTOR: f32 = 0.75;
/// Upper bound on the bucket count; doubling stops here.
pub const MAXIMUM_CAPACITY: usize = 1 << 30;

/// Construction parameters for a [`LongMap`].
///
/// ```rust
/// use longmap::{LongMap, MapConfig};
///
/// let map: LongMap<u32> = MapConfig::new()
///     .with_initial_capacity(64)
///     .with_load_factor(0.5)
///     .build()
///     .unwrap();
/// assert_eq!(map.capacity(), 64);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapConfig {
    initial_capacity: usize,
    load_factor: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of buckets allocated up front. Values above
    /// [`MAXIMUM_CAPACITY`] are clamped when the map is built.
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Ratio of entries to buckets above which the table doubles.
    pub fn with_load_factor(mut self, load_factor: f32) -> Self {
        self.load_factor = load_factor;
        self
    }

    #[inline]
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    #[inline]
    pub fn load_factor(&self) -> f32 {
        self.load_factor
    }

    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 {
            return Err(Error::InvalidCapacity(self.initial_capacity));
        }
        // Also rejects NaN.
        if !(self.load_factor > 0.0) {
            return Err(Error::InvalidLoadFactor(self.load_factor));
        }
        Ok(())
    }

    pub fn build<V>(self) -> Result<LongMap<V>> {
        LongMap::with_config(self)
    }
}
