//! Engine configuration options.

use crate::math::Wad;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Opening fee charged on notional, paid into the pool. 0.0001 = 1 bp.
    pub opening_fee_rate: Wad,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_events: 100_000,
            opening_fee_rate: Wad::ZERO,
        }
    }
}
