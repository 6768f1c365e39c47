//! SOAP and pool snapshot queries.

use super::core::Engine;
use super::results::EngineError;
use crate::error::PricingError;
use crate::math::Wad;
use crate::soap::{self, Soap};
use crate::spread::PoolBalanceSnapshot;
use crate::types::{AssetId, Direction};

impl Engine {
    /// Mark-to-market of every open swap on `asset`, at the current time.
    pub fn calculate_soap(&self, asset: AssetId) -> Result<Soap, EngineError> {
        self.asset_state(asset)?;
        Ok(soap::calculate_soap(&self.oracle, asset, self.current_time, self.book.swaps(asset))?)
    }

    /// Same valuation from the per-leg aggregates, without walking the book.
    pub fn indicator_soap(&self, asset: AssetId) -> Result<Soap, EngineError> {
        let state = self.asset_state(asset)?;
        let pay = state.indicators(Direction::PayFixed);
        let receive = state.indicators(Direction::ReceiveFixed);
        if pay.is_empty() && receive.is_empty() {
            return Ok(Soap::default());
        }

        let at = self.current_time;
        let ibt_price = self.oracle.accrued_ibt_price(asset, at)?;
        let pay_fixed = pay.soap(ibt_price, at)?;
        let receive_fixed = receive.soap(ibt_price, at)?;
        let total = pay_fixed
            .checked_add(receive_fixed)
            .ok_or(PricingError::ArithmeticOverflow("soap sum"))?;
        Ok(Soap {
            pay_fixed,
            receive_fixed,
            total,
        })
    }

    pub fn pool_snapshot(&self, asset: AssetId, opening_fee: Wad) -> Result<PoolBalanceSnapshot, EngineError> {
        let state = self.asset_state(asset)?;
        Ok(PoolBalanceSnapshot {
            liquidity_pool_balance: state.liquidity_pool_balance,
            pay_fixed_swaps_notional: state.indicators(Direction::PayFixed).total_notional,
            receive_fixed_swaps_notional: state.indicators(Direction::ReceiveFixed).total_notional,
            opening_fee,
        })
    }
}
