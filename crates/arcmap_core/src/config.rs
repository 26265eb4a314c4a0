//! Map configuration.

/// Configuration for opening a segmented map.
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Pairs a segment may hold before it becomes eligible for splitting.
    ///
    /// A segment whose interval has shrunk to a single key is exempt and
    /// may grow past the capacity. Zero is permitted: every insert then
    /// splits its segment down to minimal intervals, which hold their
    /// single pair in silent excess.
    pub capacity: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}

impl MapConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the segment capacity.
    #[must_use]
    pub const fn capacity(mut self, value: usize) -> Self {
        self.capacity = value;
        self
    }
}
