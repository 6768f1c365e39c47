// 4.0: swap records and the in-memory book. the position ledger proper lives outside
// the pricing core; this is the record layout it shares with valuation, plus a
// plain per-asset collection for anything that needs to hold open swaps.

use crate::error::{PricingError, PricingResult};
use crate::math::Wad;
use crate::types::{AssetId, Direction, SwapId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Swap {
    pub id: SwapId,
    pub asset: AssetId,
    pub direction: Direction,
    pub notional: Wad,
    /// Rate locked at open, spread included.
    pub fixed_rate: Wad,
    /// IBT units bought at open: notional / open_ibt_price. never changes.
    pub ibt_quantity: Wad,
    pub open_ibt_price: Wad,
    pub open_timestamp: Timestamp,
    pub end_timestamp: Timestamp,
}

impl Swap {
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        id: SwapId,
        asset: AssetId,
        direction: Direction,
        notional: Wad,
        fixed_rate: Wad,
        ibt_price: Wad,
        open_timestamp: Timestamp,
        tenor_secs: u64,
    ) -> PricingResult<Self> {
        let ibt_quantity = notional
            .div(ibt_price)
            .ok_or(PricingError::ArithmeticOverflow("ibt quantity"))?;

        Ok(Self {
            id,
            asset,
            direction,
            notional,
            fixed_rate,
            ibt_quantity,
            open_ibt_price: ibt_price,
            open_timestamp,
            end_timestamp: open_timestamp.plus_secs(tenor_secs),
        })
    }

    pub fn tenor_secs(&self) -> u64 {
        self.open_timestamp.seconds_until(self.end_timestamp)
    }

    pub fn is_matured(&self, at: Timestamp) -> bool {
        self.end_timestamp <= at
    }

    /// Seconds of fixed interest owed at `at`, capped at maturity.
    pub fn accrual_period_secs(&self, at: Timestamp) -> u64 {
        self.open_timestamp.seconds_until(at.min(self.end_timestamp))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotionalTotals {
    pub pay_fixed: Wad,
    pub receive_fixed: Wad,
}

impl NotionalTotals {
    pub fn for_direction(&self, direction: Direction) -> Wad {
        match direction {
            Direction::PayFixed => self.pay_fixed,
            Direction::ReceiveFixed => self.receive_fixed,
        }
    }
}

// 4.1: open swaps per asset, ordered by id so valuation always walks them the same way.
#[derive(Debug, Clone, Default)]
pub struct SwapBook {
    swaps: HashMap<AssetId, BTreeMap<SwapId, Swap>>,
    locations: HashMap<SwapId, AssetId>,
    next_id: u64,
}

impl SwapBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_swap_id(&mut self) -> SwapId {
        self.next_id += 1;
        SwapId(self.next_id)
    }

    /// The id `next_swap_id` would hand out, without taking it.
    /// inserting a swap under it takes it.
    pub fn peek_swap_id(&self) -> SwapId {
        SwapId(self.next_id + 1)
    }

    /// Returns the swap previously stored under the same id, if any.
    pub fn insert(&mut self, swap: Swap) -> Option<Swap> {
        self.next_id = self.next_id.max(swap.id.0);
        let previous = self.remove(swap.id);
        self.locations.insert(swap.id, swap.asset);
        self.swaps.entry(swap.asset).or_default().insert(swap.id, swap);
        previous
    }

    pub fn remove(&mut self, id: SwapId) -> Option<Swap> {
        let asset = self.locations.remove(&id)?;
        let by_asset = self.swaps.get_mut(&asset)?;
        let swap = by_asset.remove(&id);
        if by_asset.is_empty() {
            self.swaps.remove(&asset);
        }
        swap
    }

    pub fn get(&self, id: SwapId) -> Option<&Swap> {
        let asset = self.locations.get(&id)?;
        self.swaps.get(asset)?.get(&id)
    }

    pub fn swaps(&self, asset: AssetId) -> impl Iterator<Item = &Swap> {
        self.swaps.get(&asset).into_iter().flat_map(|by_id| by_id.values())
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn notional_totals(&self, asset: AssetId) -> NotionalTotals {
        self.swaps(asset).fold(NotionalTotals::default(), |mut totals, swap| {
            let leg = match swap.direction {
                Direction::PayFixed => &mut totals.pay_fixed,
                Direction::ReceiveFixed => &mut totals.receive_fixed,
            };
            *leg = leg.saturating_add(swap.notional);
            totals
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const USDC: AssetId = AssetId(2);
    const TENOR: u64 = 28 * 86_400;

    fn swap(book: &mut SwapBook, direction: Direction, notional: u64) -> Swap {
        let id = book.next_swap_id();
        Swap::open(
            id,
            USDC,
            direction,
            Wad::from_int(notional),
            Wad::from_decimal(dec!(0.04)).unwrap(),
            Wad::ONE,
            Timestamp(1_000),
            TENOR,
        )
        .unwrap()
    }

    #[test]
    fn open_computes_quantity_and_maturity() {
        let s = Swap::open(
            SwapId(1),
            USDC,
            Direction::PayFixed,
            Wad::from_int(10_000),
            Wad::from_decimal(dec!(0.04)).unwrap(),
            Wad::from_decimal(dec!(1.25)).unwrap(),
            Timestamp(1_000),
            TENOR,
        )
        .unwrap();
        assert_eq!(s.ibt_quantity, Wad::from_int(8_000));
        assert_eq!(s.end_timestamp, Timestamp(1_000 + TENOR));
        assert_eq!(s.tenor_secs(), TENOR);
    }

    #[test]
    fn open_with_zero_price_fails() {
        let result = Swap::open(
            SwapId(1),
            USDC,
            Direction::PayFixed,
            Wad::from_int(1),
            Wad::ZERO,
            Wad::ZERO,
            Timestamp(0),
            TENOR,
        );
        assert!(matches!(result, Err(PricingError::ArithmeticOverflow(_))));
    }

    #[test]
    fn accrual_period_caps_at_maturity() {
        let mut book = SwapBook::new();
        let s = swap(&mut book, Direction::PayFixed, 100);
        assert_eq!(s.accrual_period_secs(Timestamp(1_000)), 0);
        assert_eq!(s.accrual_period_secs(Timestamp(1_500)), 500);
        assert_eq!(s.accrual_period_secs(Timestamp(1_000 + 2 * TENOR)), TENOR);
        assert!(s.is_matured(Timestamp(1_000 + TENOR)));
        assert!(!s.is_matured(Timestamp(999 + TENOR)));
    }

    #[test]
    fn book_insert_remove_and_totals() {
        let mut book = SwapBook::new();
        let a = swap(&mut book, Direction::PayFixed, 100);
        let b = swap(&mut book, Direction::ReceiveFixed, 40);
        let c = swap(&mut book, Direction::PayFixed, 60);
        for s in [a, b, c] {
            assert!(book.insert(s).is_none());
        }

        assert_eq!(book.len(), 3);
        let totals = book.notional_totals(USDC);
        assert_eq!(totals.pay_fixed, Wad::from_int(160));
        assert_eq!(totals.receive_fixed, Wad::from_int(40));

        assert_eq!(book.remove(a.id), Some(a));
        assert_eq!(book.remove(a.id), None);
        assert_eq!(book.notional_totals(USDC).pay_fixed, Wad::from_int(60));
        assert_eq!(book.get(b.id), Some(&b));
    }

    #[test]
    fn book_iterates_in_id_order() {
        let mut book = SwapBook::new();
        let first = swap(&mut book, Direction::PayFixed, 1);
        let second = swap(&mut book, Direction::PayFixed, 2);
        book.insert(second);
        book.insert(first);
        let ids: Vec<SwapId> = book.swaps(USDC).map(|s| s.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn peeked_id_is_taken_only_on_insert() {
        let mut book = SwapBook::new();
        let id = book.peek_swap_id();
        assert_eq!(book.peek_swap_id(), id);

        let s = Swap::open(
            id,
            USDC,
            Direction::PayFixed,
            Wad::from_int(10),
            Wad::from_decimal(dec!(0.04)).unwrap(),
            Wad::ONE,
            Timestamp(1_000),
            TENOR,
        )
        .unwrap();
        book.insert(s);
        assert_eq!(book.peek_swap_id(), SwapId(id.0 + 1));
        assert_eq!(book.next_swap_id(), SwapId(id.0 + 1));
    }

    #[test]
    fn empty_asset_has_no_swaps() {
        let book = SwapBook::new();
        assert_eq!(book.swaps(AssetId(9)).count(), 0);
        assert_eq!(book.notional_totals(AssetId(9)), NotionalTotals::default());
        assert!(book.is_empty());
    }
}
