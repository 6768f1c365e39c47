// 6.0: spread pricing. the premium a new swap pays over the benchmark index.
// 6.1 demand component (utilization, imbalance, soap), 6.2 at-par component
// (ema deviation, variance), 6.3 the quote itself.
//
// every rational term is k / (1 - x). when x reaches 1 the term is Saturated rather
// than divided, so the ceiling is a named case and never a huge quotient.

use crate::error::{PricingError, PricingResult};
use crate::math::{SignedWad, Wad};
use crate::oracle::AccruedIndex;
use crate::types::Direction;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadModel {
    pub spread_max_value: Wad,
    pub kf: Wad,
    pub k_omega: Wad,
    /// Weight of the opposite leg when it is larger than the own leg.
    pub lambda: Wad,
    /// Utilization ceiling M. the kf term saturates at or above it.
    pub max_liquidity_redemption_value: Wad,
    pub k_vol: Wad,
    pub k_hist: Wad,
}

impl Default for SpreadModel {
    fn default() -> Self {
        Self {
            spread_max_value: Wad::from_raw(3_000_000_000_000_000),
            kf: Wad::from_raw(10_000_000_000_000),
            k_omega: Wad::from_raw(50_000_000_000_000),
            lambda: Wad::from_raw(10_000_000_000_000_000),
            max_liquidity_redemption_value: Wad::ONE,
            k_vol: Wad::from_raw(30_000_000_000_000),
            k_hist: Wad::from_raw(300_000_000_000_000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Component {
    Unsaturated(Wad),
    Saturated,
}

impl Component {
    pub fn is_saturated(&self) -> bool {
        matches!(self, Component::Saturated)
    }

    /// The component's contribution, with Saturated standing for `cap`.
    pub fn value_or(&self, cap: Wad) -> Wad {
        match self {
            Component::Unsaturated(v) => *v,
            Component::Saturated => cap,
        }
    }

    pub fn plus(self, other: Component) -> Component {
        match (self, other) {
            (Component::Unsaturated(a), Component::Unsaturated(b)) => Component::Unsaturated(a.saturating_add(b)),
            _ => Component::Saturated,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Unsaturated(v) => write!(f, "{}", v),
            Component::Saturated => write!(f, "saturated"),
        }
    }
}

/// Pool balances at quote time, supplied by the liquidity layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolBalanceSnapshot {
    pub liquidity_pool_balance: Wad,
    pub pay_fixed_swaps_notional: Wad,
    pub receive_fixed_swaps_notional: Wad,
    pub opening_fee: Wad,
}

impl PoolBalanceSnapshot {
    pub fn total_liquidity(&self) -> Wad {
        self.liquidity_pool_balance.saturating_add(self.opening_fee)
    }

    /// (own leg, opposite leg) notionals for a quote in `direction`.
    pub fn legs(&self, direction: Direction) -> (Wad, Wad) {
        match direction {
            Direction::PayFixed => (self.pay_fixed_swaps_notional, self.receive_fixed_swaps_notional),
            Direction::ReceiveFixed => (self.receive_fixed_swaps_notional, self.pay_fixed_swaps_notional),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadQuote {
    pub direction: Direction,
    pub spread: Wad,
    pub fixed_rate: Wad,
    pub demand: Component,
    pub at_par: Component,
    pub adjusted_utilization_rate: Wad,
}

impl SpreadQuote {
    pub fn is_saturated(&self) -> bool {
        self.demand.is_saturated() || self.at_par.is_saturated()
    }
}

// k / (1 - x), Saturated once x reaches 1
fn inverse_term(k: Wad, x: Wad) -> PricingResult<Component> {
    if x >= Wad::ONE {
        return Ok(Component::Saturated);
    }
    k.div(Wad::ONE.saturating_sub(x))
        .map(Component::Unsaturated)
        .ok_or(PricingError::ArithmeticOverflow("spread term"))
}

// 6.1: a larger opposite leg offsets the own leg, weighted by lambda. floored at 0.
pub fn adjusted_utilization_rate(own: Wad, opposite: Wad, lambda: Wad) -> Wad {
    if own >= opposite {
        return own;
    }
    let offset = opposite.saturating_sub(own).mul(lambda).unwrap_or(Wad::MAX);
    own.saturating_sub(offset)
}

impl SpreadModel {
    // kf term: kf / (M - adjusted), saturated at M
    pub fn kf_term(&self, adjusted_utilization: Wad) -> PricingResult<Component> {
        let ceiling = self.max_liquidity_redemption_value;
        if adjusted_utilization >= ceiling {
            return Ok(Component::Saturated);
        }
        self.kf
            .div(ceiling.saturating_sub(adjusted_utilization))
            .map(Component::Unsaturated)
            .ok_or(PricingError::ArithmeticOverflow("kf term"))
    }

    // k_omega term: only a leg soap the pool is losing on raises it.
    // a soap wider than the pool clamps the ratio, which saturates.
    pub fn k_omega_term(&self, soap: SignedWad, total_liquidity: Wad) -> PricingResult<Component> {
        if !soap.is_positive() {
            return Ok(Component::Unsaturated(self.k_omega));
        }
        let ratio = soap
            .abs()
            .saturating_div(total_liquidity)
            .ok_or(PricingError::ZeroLiquidityDenominator)?;
        inverse_term(self.k_omega, ratio)
    }

    // saturated at the utilization ceiling, or once the leg soap has eaten the
    // whole opposite leg notional. otherwise kf + k_omega.
    pub fn demand_component(
        &self,
        adjusted_utilization: Wad,
        soap: SignedWad,
        opposite_notional: Wad,
        total_liquidity: Wad,
    ) -> PricingResult<Component> {
        let kf = self.kf_term(adjusted_utilization)?;
        if kf.is_saturated() {
            return Ok(kf);
        }
        if soap.is_positive() && soap.abs() >= opposite_notional {
            return Ok(Component::Saturated);
        }
        Ok(kf.plus(self.k_omega_term(soap, total_liquidity)?))
    }

    // 6.2: pay fixed is on the wrong side when ema > index, receive fixed when index > ema
    pub fn k_hist_term(&self, direction: Direction, index: &AccruedIndex) -> PricingResult<Component> {
        let ema = index.exponential_moving_average;
        let value = index.index_value;
        let wrong_side = match direction {
            Direction::PayFixed => ema > value,
            Direction::ReceiveFixed => value > ema,
        };
        if !wrong_side {
            return Ok(Component::Unsaturated(self.k_hist));
        }
        let offset = if ema > value { ema.saturating_sub(value) } else { value.saturating_sub(ema) };
        inverse_term(self.k_hist, offset)
    }

    pub fn k_vol_term(&self, ewmv: Wad) -> PricingResult<Component> {
        if ewmv > Wad::ONE {
            warn!(ewmv = %ewmv, "variance above 1.0 on quote input");
            return Err(PricingError::VarianceOverflow(ewmv));
        }
        inverse_term(self.k_vol, ewmv)
    }

    pub fn at_par_component(&self, direction: Direction, index: &AccruedIndex) -> PricingResult<Component> {
        let vol = self.k_vol_term(index.exponential_weighted_moving_variance)?;
        if vol.is_saturated() {
            return Ok(vol);
        }
        Ok(vol.plus(self.k_hist_term(direction, index)?))
    }

    // 6.3: the ceiling is applied once at the end. `soap` is the leg soap for `direction`.
    pub fn quote(
        &self,
        direction: Direction,
        notional: Wad,
        pool: &PoolBalanceSnapshot,
        index: &AccruedIndex,
        soap: SignedWad,
    ) -> PricingResult<SpreadQuote> {
        let total_liquidity = pool.total_liquidity();
        if total_liquidity.is_zero() {
            warn!(%direction, "quote against an empty pool");
            return Err(PricingError::ZeroLiquidityDenominator);
        }

        // rates too wide for 128 bits clamp to MAX, far past any ceiling
        let (own, opposite) = pool.legs(direction);
        let own_rate = own
            .saturating_add(notional)
            .saturating_div(total_liquidity)
            .ok_or(PricingError::ZeroLiquidityDenominator)?;
        let opposite_rate = opposite
            .saturating_div(total_liquidity)
            .ok_or(PricingError::ZeroLiquidityDenominator)?;
        let adjusted = adjusted_utilization_rate(own_rate, opposite_rate, self.lambda);

        let demand = self.demand_component(adjusted, soap, opposite, total_liquidity)?;
        let at_par = self.at_par_component(direction, index)?;

        let spread = demand
            .value_or(self.spread_max_value)
            .saturating_add(at_par.value_or(self.spread_max_value))
            .min(self.spread_max_value);

        let fixed_rate = match direction {
            Direction::PayFixed => index.index_value.saturating_add(spread),
            Direction::ReceiveFixed => index.index_value.saturating_sub(spread),
        };

        debug!(
            %direction,
            utilization = %own_rate,
            adjusted = %adjusted,
            %demand,
            %at_par,
            %spread,
            %fixed_rate,
            "spread quoted"
        );

        Ok(SpreadQuote {
            direction,
            spread,
            fixed_rate,
            demand,
            at_par,
            adjusted_utilization_rate: adjusted,
        })
    }
}
