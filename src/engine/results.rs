// 8.0.2: result types and errors for engine operations.

use crate::config::ConfigError;
use crate::error::PricingError;
use crate::math::{SignedWad, Wad};
use crate::spread::SpreadQuote;
use crate::swap::Swap;
use crate::types::SwapId;

#[derive(Debug, Clone, PartialEq)]
pub struct OpenSwapResult {
    pub swap: Swap,
    pub quote: SpreadQuote,
    pub opening_fee: Wad,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CloseSwapResult {
    pub swap: Swap,
    /// Holder's payoff at close, 18 decimals.
    pub payoff: SignedWad,
    /// The same payoff in the asset's own decimals, rounded half up.
    pub settlement_amount: i128,
    pub matured: bool,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Swap {0:?} not found")]
    SwapNotFound(SwapId),

    #[error("Notional must be positive")]
    InvalidNotional,
}
