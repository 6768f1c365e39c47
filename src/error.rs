// 10.0: one error type for the pricing core. every variant is a deterministic,
// non-retryable validation failure. spread saturation is NOT in here, it is a
// normal output (see spread::Component).

use crate::math::Wad;
use crate::types::{AssetId, Timestamp, UpdaterId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("Updater {0:?} does not hold the index updater capability")]
    Unauthorized(UpdaterId),

    #[error("Asset {0} is already registered")]
    AlreadyRegistered(AssetId),

    #[error("Asset {0} is not registered")]
    AssetNotRegistered(AssetId),

    #[error("Stale timestamp for {asset}: update at {requested} is before last update at {last_update}")]
    StaleTimestamp {
        asset: AssetId,
        requested: Timestamp,
        last_update: Timestamp,
    },

    #[error("Batch length mismatch: {assets} assets, {values} values")]
    LengthMismatch { assets: usize, values: usize },

    #[error("Smoothing factor {0} is outside [0, 1]")]
    AlfaOutOfRange(Wad),

    #[error("Variance {0} is above 1.0")]
    VarianceOverflow(Wad),

    #[error("Accrual window for {asset} ends at {requested}, before last update at {last_update}")]
    InvalidAccrualWindow {
        asset: AssetId,
        requested: Timestamp,
        last_update: Timestamp,
    },

    #[error("Liquidity pool balance plus opening fee is zero")]
    ZeroLiquidityDenominator,

    #[error("Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),
}

pub type PricingResult<T> = Result<T, PricingError>;
