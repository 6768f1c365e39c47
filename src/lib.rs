// ipor-core: interest rate swap AMM pricing core.
// index oracle, SOAP valuation and spread pricing as one deterministic library.
// all computation is fixed point with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AssetId, UpdaterId, SwapId, Direction, Timestamp
//   2.x  math.rs: 18 decimal fixed point, 256 bit mul/div, asset decimals
//   3.x  oracle.rs: index accrual, quasi IBT price, EMA/EWMV, shared handle
//   4.x  swap.rs: swap record + in-memory book
//   5.x  soap.rs: per-swap payoffs and SOAP
//   5.4  indicators.rs: O(1) SOAP aggregates per leg
//   6.x  spread.rs: demand + at-par spread components, quotes
//   7.x  config.rs: oracle/spread params, assets, env presets, toml
//   8.x  engine/: facade: index updates, quotes, open/close, valuation
//   10.x error.rs: pricing error taxonomy
//   11.x events.rs: state transition events for audit

// pricing core
pub mod indicators;
pub mod math;
pub mod oracle;
pub mod soap;
pub mod spread;
pub mod swap;
pub mod types;

// coordination
pub mod config;
pub mod engine;
pub mod error;
pub mod events;

// re exports for convenience
pub use engine::*;
pub use error::*;
pub use events::*;
pub use indicators::*;
pub use math::{SignedWad, Wad, SECONDS_PER_YEAR, WAD};
pub use oracle::*;
pub use soap::*;
pub use spread::*;
pub use swap::*;
pub use types::*;
pub use config::{AssetConfig, ConfigError, Environment, OracleParams, PricingConfig, SpreadParams};
