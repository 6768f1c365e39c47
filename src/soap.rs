// 5.0: SOAP, sum of all payoffs. marks an open book to market against the accrued
// IBT price. payoffs are from the swap holder's side, so a positive SOAP is what
// the pool would owe if everything closed now.
//
// floating leg = notional + ibt_quantity * (ibt_price - open_ibt_price)
// fixed leg    = notional * (1 + fixed_rate * period / year), period capped at maturity
// pay fixed payoff = floating - fixed, receive fixed payoff = fixed - floating

use crate::error::{PricingError, PricingResult};
use crate::math::{mul3_div, signed_mul_div, SignedWad, Wad, SECONDS_PER_YEAR, WAD};
use crate::oracle::IndexOracle;
use crate::swap::Swap;
use crate::types::{AssetId, Direction, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Soap {
    pub pay_fixed: SignedWad,
    pub receive_fixed: SignedWad,
    pub total: SignedWad,
}

impl Soap {
    pub fn for_direction(&self, direction: Direction) -> SignedWad {
        match direction {
            Direction::PayFixed => self.pay_fixed,
            Direction::ReceiveFixed => self.receive_fixed,
        }
    }
}

// 5.1: notional plus simple fixed interest, one division at 256 bits
pub fn fixed_leg_value(notional: Wad, fixed_rate: Wad, period_secs: u64) -> Option<Wad> {
    let interest = mul3_div(
        notional.raw(),
        fixed_rate.raw(),
        period_secs as u128,
        SECONDS_PER_YEAR as u128 * WAD,
    )?;
    notional.checked_add(Wad::from_raw(interest))
}

pub fn floating_leg_value(swap: &Swap, ibt_price: Wad) -> Option<SignedWad> {
    let price_move = ibt_price.to_signed()?.checked_sub(swap.open_ibt_price.to_signed()?)?;
    let gain = signed_mul_div(price_move.raw(), swap.ibt_quantity.raw(), WAD)?;
    swap.notional.to_signed()?.checked_add(SignedWad::from_raw(gain))
}

// 5.2: single swap payoff. a swap valued at its own open timestamp is exactly par.
pub fn swap_payoff(swap: &Swap, ibt_price: Wad, at: Timestamp) -> Option<SignedWad> {
    let fixed = fixed_leg_value(swap.notional, swap.fixed_rate, swap.accrual_period_secs(at))?;
    let floating = floating_leg_value(swap, ibt_price)?;
    let pay_fixed = floating.checked_sub(fixed.to_signed()?)?;
    match swap.direction {
        Direction::PayFixed => Some(pay_fixed),
        Direction::ReceiveFixed => SignedWad::ZERO.checked_sub(pay_fixed),
    }
}

/// Values a book at an already-known IBT price. Pure; the oracle is not consulted.
pub fn soap_at_price<'a, I>(ibt_price: Wad, at: Timestamp, swaps: I) -> PricingResult<Soap>
where
    I: IntoIterator<Item = &'a Swap>,
{
    let mut soap = Soap::default();
    for swap in swaps {
        let payoff = swap_payoff(swap, ibt_price, at).ok_or(PricingError::ArithmeticOverflow("swap payoff"))?;
        let leg = match swap.direction {
            Direction::PayFixed => &mut soap.pay_fixed,
            Direction::ReceiveFixed => &mut soap.receive_fixed,
        };
        *leg = leg
            .checked_add(payoff)
            .ok_or(PricingError::ArithmeticOverflow("soap sum"))?;
    }
    soap.total = soap
        .pay_fixed
        .checked_add(soap.receive_fixed)
        .ok_or(PricingError::ArithmeticOverflow("soap sum"))?;
    Ok(soap)
}

// 5.3: SOAP for one asset. the IBT price is read once and shared by every swap.
// an empty book is zero at any timestamp, so the oracle window isn't checked for it.
pub fn calculate_soap<'a, I>(
    oracle: &IndexOracle,
    asset: AssetId,
    at: Timestamp,
    swaps: I,
) -> PricingResult<Soap>
where
    I: IntoIterator<Item = &'a Swap>,
{
    oracle.index(asset)?;
    let mut swaps = swaps.into_iter().peekable();
    if swaps.peek().is_none() {
        return Ok(Soap::default());
    }
    let ibt_price = oracle.accrued_ibt_price(asset, at)?;
    soap_at_price(ibt_price, at, swaps)
}
