// 8.0: pricing engine facade. coordinates index updates, spread quotes, swap opens
// and closes, and SOAP valuation over the in-memory book.
// deterministic and event-driven with no external I/O. time only moves via set_time.

mod config;
mod core;
mod indexes;
mod results;
mod swaps;
mod valuation;

pub use config::EngineConfig;
pub use core::{AssetState, Engine};
pub use results::{CloseSwapResult, EngineError, OpenSwapResult};
