//! Swap quote, open and close operations.

use super::core::Engine;
use super::results::{CloseSwapResult, EngineError, OpenSwapResult};
use crate::error::PricingError;
use crate::events::{EventPayload, SpreadQuotedEvent, SwapClosedEvent, SwapOpenedEvent};
use crate::math::Wad;
use crate::oracle::AccruedIndex;
use crate::soap::swap_payoff;
use crate::spread::SpreadQuote;
use crate::swap::Swap;
use crate::types::{AssetId, Direction, SwapId};
use tracing::{info, warn};

struct PricedSwap {
    quote: SpreadQuote,
    index: AccruedIndex,
    opening_fee: Wad,
}

impl Engine {
    // reads only. the leg soap is walked from the book so the quote sees exact payoffs
    fn price_swap(&self, asset: AssetId, direction: Direction, notional: Wad) -> Result<PricedSwap, EngineError> {
        if notional.is_zero() {
            warn!(%asset, %direction, "swap rejected: zero notional");
            return Err(EngineError::InvalidNotional);
        }

        let opening_fee = notional
            .mul(self.config.opening_fee_rate)
            .ok_or(PricingError::ArithmeticOverflow("opening fee"))?;
        let pool = self.pool_snapshot(asset, opening_fee)?;
        let index = self.oracle.accrued_index(asset, self.current_time)?;
        let soap = self.calculate_soap(asset)?.for_direction(direction);

        let quote = self.spread_model.quote(direction, notional, &pool, &index, soap)?;
        Ok(PricedSwap {
            quote,
            index,
            opening_fee,
        })
    }

    pub fn quote_swap(
        &mut self,
        asset: AssetId,
        direction: Direction,
        notional: Wad,
    ) -> Result<SpreadQuote, EngineError> {
        let priced = self.price_swap(asset, direction, notional)?;
        let quote = priced.quote;

        self.emit_event(EventPayload::SpreadQuoted(SpreadQuotedEvent {
            asset,
            direction,
            notional,
            spread: quote.spread,
            fixed_rate: quote.fixed_rate,
            demand: quote.demand,
            at_par: quote.at_par,
        }));

        Ok(quote)
    }

    // prices, records the swap and rebalances the leg indicators. the opening fee
    // is paid into the pool.
    pub fn open_swap(
        &mut self,
        asset: AssetId,
        direction: Direction,
        notional: Wad,
    ) -> Result<OpenSwapResult, EngineError> {
        let priced = self.price_swap(asset, direction, notional)?;
        let at = self.current_time;

        let swap = Swap::open(
            self.book.peek_swap_id(),
            asset,
            direction,
            notional,
            priced.quote.fixed_rate,
            priced.index.ibt_price,
            at,
            self.swap_tenor_secs,
        )?;

        let state = self.asset_state(asset)?;
        let mut indicators = *state.indicators(direction);
        indicators.rebalance_on_open(&swap)?;
        let new_balance = state
            .liquidity_pool_balance
            .checked_add(priced.opening_fee)
            .ok_or(PricingError::ArithmeticOverflow("liquidity pool balance"))?;

        if let Some(state) = self.assets.get_mut(&asset) {
            *state.indicators_mut(direction) = indicators;
            state.liquidity_pool_balance = new_balance;
        }
        self.book.insert(swap);

        info!(
            swap = swap.id.0,
            %asset,
            %direction,
            notional = %notional,
            fixed_rate = %swap.fixed_rate,
            spread = %priced.quote.spread,
            "swap opened"
        );

        self.emit_event(EventPayload::SwapOpened(SwapOpenedEvent {
            swap_id: swap.id,
            asset,
            direction,
            notional,
            fixed_rate: swap.fixed_rate,
            ibt_quantity: swap.ibt_quantity,
            opening_fee: priced.opening_fee,
        }));

        Ok(OpenSwapResult {
            swap,
            quote: priced.quote,
            opening_fee: priced.opening_fee,
        })
    }

    // values the swap at the current time and removes it. a positive payoff is paid
    // out of the pool, a negative one is collected into it.
    pub fn close_swap(&mut self, swap_id: SwapId) -> Result<CloseSwapResult, EngineError> {
        let swap = *self.book.get(swap_id).ok_or(EngineError::SwapNotFound(swap_id))?;
        let at = self.current_time;
        let overflow = || PricingError::ArithmeticOverflow("swap close");

        let ibt_price = self.oracle.accrued_ibt_price(swap.asset, at)?;
        let payoff = swap_payoff(&swap, ibt_price, at).ok_or_else(overflow)?;

        let state = self.asset_state(swap.asset)?;
        let mut indicators = *state.indicators(swap.direction);
        indicators.rebalance_on_close(&swap, at)?;

        let magnitude = payoff
            .abs()
            .to_asset_amount(state.config.decimals)
            .and_then(|m| i128::try_from(m).ok())
            .ok_or_else(overflow)?;
        let settlement_amount = if payoff.is_negative() { -magnitude } else { magnitude };

        let new_balance = if payoff.is_negative() {
            state
                .liquidity_pool_balance
                .checked_add(payoff.abs())
                .ok_or_else(overflow)?
        } else {
            state.liquidity_pool_balance.saturating_sub(payoff.abs())
        };

        if let Some(state) = self.assets.get_mut(&swap.asset) {
            *state.indicators_mut(swap.direction) = indicators;
            state.liquidity_pool_balance = new_balance;
        }
        self.book.remove(swap_id);

        let matured = swap.is_matured(at);
        info!(swap = swap_id.0, asset = %swap.asset, payoff = %payoff, matured, "swap closed");

        self.emit_event(EventPayload::SwapClosed(SwapClosedEvent {
            swap_id,
            asset: swap.asset,
            payoff,
            matured,
        }));

        Ok(CloseSwapResult {
            swap,
            payoff,
            settlement_amount,
            matured,
        })
    }
}
