// 5.4: SOAP indicators. constant-time SOAP per asset and leg, kept in step with the
// book by rebalancing on every open and close instead of walking every swap.
//
// the fixed leg is tracked as a notional-weighted average rate plus interest already
// accumulated up to the last rebalance. the floating leg needs only the IBT totals.
// matured swaps keep accruing here until they are closed, so this agrees with
// soap::soap_at_price only for books without matured swaps.

use crate::error::{PricingError, PricingResult};
use crate::math::{mul3_div, weighted_average, weighted_average_without, SignedWad, Wad, SECONDS_PER_YEAR, WAD};
use crate::swap::Swap;
use crate::types::{Direction, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoapIndicators {
    pub direction: Direction,
    pub rebalance_timestamp: Timestamp,
    pub total_notional: Wad,
    pub total_ibt_quantity: Wad,
    /// Sum of ibt_quantity * open_ibt_price over the open swaps.
    pub total_open_value: Wad,
    pub average_fixed_rate: Wad,
    pub hypothetical_interest_cumulative: Wad,
}

fn interest(notional: Wad, rate: Wad, period_secs: u64) -> Option<Wad> {
    mul3_div(notional.raw(), rate.raw(), period_secs as u128, SECONDS_PER_YEAR as u128 * WAD).map(Wad::from_raw)
}

impl SoapIndicators {
    pub fn new(direction: Direction, timestamp: Timestamp) -> Self {
        Self {
            direction,
            rebalance_timestamp: timestamp,
            total_notional: Wad::ZERO,
            total_ibt_quantity: Wad::ZERO,
            total_open_value: Wad::ZERO,
            average_fixed_rate: Wad::ZERO,
            hypothetical_interest_cumulative: Wad::ZERO,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_notional.is_zero()
    }

    // fixed interest owed by the whole leg from the last rebalance to `at`
    fn interest_delta(&self, at: Timestamp) -> Option<Wad> {
        interest(
            self.total_notional,
            self.average_fixed_rate,
            self.rebalance_timestamp.seconds_until(at),
        )
    }

    pub fn hypothetical_interest_total(&self, at: Timestamp) -> Option<Wad> {
        self.hypothetical_interest_cumulative.checked_add(self.interest_delta(at)?)
    }

    fn roll_forward(&mut self, at: Timestamp) -> PricingResult<()> {
        self.hypothetical_interest_cumulative = self
            .hypothetical_interest_total(at)
            .ok_or(PricingError::ArithmeticOverflow("hypothetical interest"))?;
        self.rebalance_timestamp = self.rebalance_timestamp.max(at);
        Ok(())
    }

    pub fn rebalance_on_open(&mut self, swap: &Swap) -> PricingResult<()> {
        debug_assert_eq!(swap.direction, self.direction);
        let overflow = || PricingError::ArithmeticOverflow("soap indicators on open");

        self.roll_forward(swap.open_timestamp)?;
        self.average_fixed_rate = Wad::from_raw(
            weighted_average(
                self.total_notional.raw(),
                self.average_fixed_rate.raw(),
                swap.notional.raw(),
                swap.fixed_rate.raw(),
            )
            .ok_or_else(overflow)?,
        );
        self.total_notional = self.total_notional.checked_add(swap.notional).ok_or_else(overflow)?;
        self.total_ibt_quantity = self
            .total_ibt_quantity
            .checked_add(swap.ibt_quantity)
            .ok_or_else(overflow)?;
        let open_value = swap.ibt_quantity.mul(swap.open_ibt_price).ok_or_else(overflow)?;
        self.total_open_value = self.total_open_value.checked_add(open_value).ok_or_else(overflow)?;
        Ok(())
    }

    // removes the swap and the fixed interest it contributed from open to `at`.
    // subtractions saturate: truncated averages can leave a few wei behind.
    pub fn rebalance_on_close(&mut self, swap: &Swap, at: Timestamp) -> PricingResult<()> {
        debug_assert_eq!(swap.direction, self.direction);
        let overflow = || PricingError::ArithmeticOverflow("soap indicators on close");

        self.roll_forward(at)?;
        let contributed = interest(swap.notional, swap.fixed_rate, swap.open_timestamp.seconds_until(at))
            .ok_or_else(overflow)?;
        self.hypothetical_interest_cumulative = self.hypothetical_interest_cumulative.saturating_sub(contributed);

        self.average_fixed_rate = Wad::from_raw(
            weighted_average_without(
                self.total_notional.raw(),
                self.average_fixed_rate.raw(),
                swap.notional.raw().min(self.total_notional.raw()),
                swap.fixed_rate.raw(),
            )
            .ok_or_else(overflow)?,
        );
        self.total_notional = self.total_notional.saturating_sub(swap.notional);
        self.total_ibt_quantity = self.total_ibt_quantity.saturating_sub(swap.ibt_quantity);
        let open_value = swap.ibt_quantity.mul(swap.open_ibt_price).ok_or_else(overflow)?;
        self.total_open_value = self.total_open_value.saturating_sub(open_value);

        if self.total_notional.is_zero() {
            *self = Self::new(self.direction, self.rebalance_timestamp);
        }
        Ok(())
    }

    /// Leg SOAP from the aggregates. sign follows soap::swap_payoff.
    pub fn soap(&self, ibt_price: Wad, at: Timestamp) -> PricingResult<SignedWad> {
        let overflow = || PricingError::ArithmeticOverflow("indicator soap");
        if self.is_empty() {
            return Ok(SignedWad::ZERO);
        }

        let floating_now = self.total_ibt_quantity.mul(ibt_price).ok_or_else(overflow)?;
        let hypothetical = self.hypothetical_interest_total(at).ok_or_else(overflow)?;

        let pay_fixed = floating_now
            .to_signed()
            .and_then(|f| f.checked_sub(self.total_open_value.to_signed()?))
            .and_then(|f| f.checked_sub(hypothetical.to_signed()?))
            .ok_or_else(overflow)?;

        Ok(match self.direction {
            Direction::PayFixed => pay_fixed,
            Direction::ReceiveFixed => pay_fixed.negate(),
        })
    }
}
