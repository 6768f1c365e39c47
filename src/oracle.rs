// 3.0: index oracle. one IndexState per asset, advanced by authorized updaters.
// 3.1 accrual, 3.2 moving statistics, 3.3 the keyed store, 3.4 the shared handle.
//
// the IBT price is stored "quasi": multiplied by seconds-per-year, so accruing is
// a plain add of index * elapsed seconds and the only division happens on read.

use crate::error::{PricingError, PricingResult};
use crate::math::{mul3_div, mul_div, mul_div_round, signed_mul_div, SignedWad, Wad, SECONDS_PER_YEAR, WAD, YEAR_IN_SECONDS_WAD};
use crate::types::{AssetId, Timestamp, UpdaterId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Latest snapshot of one asset's benchmark index. No history is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexState {
    pub index_value: Wad,
    pub quasi_ibt_price: Wad,
    pub exponential_moving_average: Wad,
    pub exponential_weighted_moving_variance: Wad,
    pub last_update_timestamp: Timestamp,
}

impl IndexState {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            index_value: Wad::ZERO,
            quasi_ibt_price: Wad::from_raw(YEAR_IN_SECONDS_WAD),
            exponential_moving_average: Wad::ZERO,
            exponential_weighted_moving_variance: Wad::ZERO,
            last_update_timestamp: timestamp,
        }
    }

    pub fn ibt_price(&self) -> Wad {
        quasi_to_ibt_price(self.quasi_ibt_price)
    }
}

/// Read-only view of an index accrued to some timestamp. Input to spread pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccruedIndex {
    pub index_value: Wad,
    pub ibt_price: Wad,
    pub exponential_moving_average: Wad,
    pub exponential_weighted_moving_variance: Wad,
}

impl From<&IndexState> for AccruedIndex {
    fn from(state: &IndexState) -> Self {
        Self {
            index_value: state.index_value,
            ibt_price: state.ibt_price(),
            exponential_moving_average: state.exponential_moving_average,
            exponential_weighted_moving_variance: state.exponential_weighted_moving_variance,
        }
    }
}

// 3.1: simple interest on the quasi price, applied once per call.
pub fn accrue_quasi_ibt_price(quasi_ibt_price: Wad, index_value: Wad, elapsed_secs: u64) -> Option<Wad> {
    let interest = index_value.raw().checked_mul(elapsed_secs as u128)?;
    quasi_ibt_price.checked_add(Wad::from_raw(interest))
}

pub fn quasi_to_ibt_price(quasi_ibt_price: Wad) -> Wad {
    // divisor is a non-zero constant, the quotient is never wider than the input
    Wad::from_raw(mul_div_round(quasi_ibt_price.raw(), 1, SECONDS_PER_YEAR as u128).unwrap_or(0))
}

// 3.2: EMA_new = EMA + alfa * (index - EMA). signed step so a falling index can't underflow.
pub fn calculate_ema(previous_ema: Wad, index_value: Wad, alfa: Wad) -> Option<Wad> {
    let ema = previous_ema.to_signed()?;
    let deviation = index_value.to_signed()?.checked_sub(ema)?;
    let step = signed_mul_div(deviation.raw(), alfa.raw(), WAD)?;
    let next = ema.checked_add(SignedWad::from_raw(step))?;
    Some(next.to_unsigned_floor())
}

// EWMV_new = (1 - alfa) * (EWMV + alfa * (index - EMA_old)^2)
pub fn calculate_ewmv(previous_ewmv: Wad, previous_ema: Wad, index_value: Wad, alfa: Wad) -> Option<Wad> {
    let one_minus_alfa = Wad::ONE.checked_sub(alfa)?;
    let deviation = if index_value >= previous_ema {
        index_value.raw() - previous_ema.raw()
    } else {
        previous_ema.raw() - index_value.raw()
    };
    let weighted_square = mul3_div(alfa.raw(), deviation, deviation, WAD * WAD)?;
    let inner = previous_ewmv.checked_add(Wad::from_raw(weighted_square))?;
    mul_div(inner.raw(), one_minus_alfa.raw(), WAD).map(Wad::from_raw)
}

/// Computes the state an update would produce without storing it.
pub fn next_index_state(
    asset: AssetId,
    current: &IndexState,
    new_index_value: Wad,
    timestamp: Timestamp,
    alfa: Wad,
) -> PricingResult<IndexState> {
    if timestamp < current.last_update_timestamp {
        return Err(PricingError::StaleTimestamp {
            asset,
            requested: timestamp,
            last_update: current.last_update_timestamp,
        });
    }
    if alfa > Wad::ONE {
        return Err(PricingError::AlfaOutOfRange(alfa));
    }

    let elapsed = current.last_update_timestamp.seconds_until(timestamp);
    let quasi_ibt_price = accrue_quasi_ibt_price(current.quasi_ibt_price, current.index_value, elapsed)
        .ok_or(PricingError::ArithmeticOverflow("quasi ibt price accrual"))?;

    let ema = calculate_ema(current.exponential_moving_average, new_index_value, alfa)
        .ok_or(PricingError::ArithmeticOverflow("exponential moving average"))?;

    let ewmv = calculate_ewmv(
        current.exponential_weighted_moving_variance,
        current.exponential_moving_average,
        new_index_value,
        alfa,
    )
    .ok_or(PricingError::ArithmeticOverflow("exponential weighted moving variance"))?;

    if ewmv > Wad::ONE {
        return Err(PricingError::VarianceOverflow(ewmv));
    }

    Ok(IndexState {
        index_value: new_index_value,
        quasi_ibt_price,
        exponential_moving_average: ema,
        exponential_weighted_moving_variance: ewmv,
        last_update_timestamp: timestamp,
    })
}

/** 3.3: keyed store asset -> IndexState. all writes go through &mut self, so a single
owner serializes them; share it through SharedIndexOracle when threads are involved. */
#[derive(Debug, Clone)]
pub struct IndexOracle {
    alfa: Wad,
    indexes: HashMap<AssetId, IndexState>,
    updaters: HashSet<UpdaterId>,
}

impl IndexOracle {
    pub fn new(alfa: Wad) -> Self {
        Self {
            alfa,
            indexes: HashMap::new(),
            updaters: HashSet::new(),
        }
    }

    pub fn alfa(&self) -> Wad {
        self.alfa
    }

    pub fn add_updater(&mut self, updater: UpdaterId) -> bool {
        let added = self.updaters.insert(updater);
        if added {
            info!(updater = updater.0, "index updater granted");
        }
        added
    }

    pub fn remove_updater(&mut self, updater: UpdaterId) -> bool {
        let removed = self.updaters.remove(&updater);
        if removed {
            info!(updater = updater.0, "index updater revoked");
        }
        removed
    }

    pub fn is_updater(&self, updater: UpdaterId) -> bool {
        self.updaters.contains(&updater)
    }

    pub fn register_asset(&mut self, asset: AssetId, timestamp: Timestamp) -> PricingResult<IndexState> {
        self.insert_new(asset, IndexState::new(timestamp))
    }

    /// Registers an asset whose moving statistics are carried over from elsewhere.
    pub fn register_asset_seeded(
        &mut self,
        asset: AssetId,
        timestamp: Timestamp,
        exponential_moving_average: Wad,
        exponential_weighted_moving_variance: Wad,
    ) -> PricingResult<IndexState> {
        if exponential_weighted_moving_variance > Wad::ONE {
            return Err(PricingError::VarianceOverflow(exponential_weighted_moving_variance));
        }
        let state = IndexState {
            exponential_moving_average,
            exponential_weighted_moving_variance,
            ..IndexState::new(timestamp)
        };
        self.insert_new(asset, state)
    }

    fn insert_new(&mut self, asset: AssetId, state: IndexState) -> PricingResult<IndexState> {
        if self.indexes.contains_key(&asset) {
            return Err(PricingError::AlreadyRegistered(asset));
        }
        self.indexes.insert(asset, state);
        info!(%asset, timestamp = state.last_update_timestamp.0, "asset registered");
        Ok(state)
    }

    pub fn is_registered(&self, asset: AssetId) -> bool {
        self.indexes.contains_key(&asset)
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetId> {
        self.indexes.keys()
    }

    pub fn index(&self, asset: AssetId) -> PricingResult<IndexState> {
        self.indexes
            .get(&asset)
            .copied()
            .ok_or(PricingError::AssetNotRegistered(asset))
    }

    fn authorize(&self, caller: UpdaterId) -> PricingResult<()> {
        if self.is_updater(caller) {
            Ok(())
        } else {
            warn!(caller = caller.0, "index update rejected: caller is not an updater");
            Err(PricingError::Unauthorized(caller))
        }
    }

    pub fn update_index(
        &mut self,
        caller: UpdaterId,
        asset: AssetId,
        new_index_value: Wad,
        timestamp: Timestamp,
    ) -> PricingResult<IndexState> {
        self.authorize(caller)?;
        let current = self.index(asset)?;
        let next = next_index_state(asset, &current, new_index_value, timestamp, self.alfa)
            .inspect_err(|e| warn!(%asset, error = %e, "index update rejected"))?;

        self.indexes.insert(asset, next);
        debug!(
            %asset,
            index = %next.index_value,
            ema = %next.exponential_moving_average,
            ewmv = %next.exponential_weighted_moving_variance,
            quasi_ibt_price = %next.quasi_ibt_price,
            timestamp = timestamp.0,
            "index updated"
        );
        Ok(next)
    }

    // all or nothing: every element is computed against a staging copy and only
    // committed once the whole batch succeeded. repeated assets chain in order.
    pub fn update_indexes(
        &mut self,
        caller: UpdaterId,
        assets: &[AssetId],
        values: &[Wad],
        timestamp: Timestamp,
    ) -> PricingResult<Vec<IndexState>> {
        self.authorize(caller)?;
        if assets.len() != values.len() {
            warn!(assets = assets.len(), values = values.len(), "batch index update rejected");
            return Err(PricingError::LengthMismatch {
                assets: assets.len(),
                values: values.len(),
            });
        }

        let mut staged: HashMap<AssetId, IndexState> = HashMap::new();
        let mut results = Vec::with_capacity(assets.len());

        for (&asset, &value) in assets.iter().zip(values) {
            let current = match staged.get(&asset) {
                Some(state) => *state,
                None => self.index(asset)?,
            };
            let next = next_index_state(asset, &current, value, timestamp, self.alfa)
                .inspect_err(|e| warn!(%asset, error = %e, "batch index update rejected"))?;
            staged.insert(asset, next);
            results.push(next);
        }

        debug!(count = results.len(), timestamp = timestamp.0, "batch index update committed");
        self.indexes.extend(staged);
        Ok(results)
    }

    pub fn accrued_quasi_ibt_price(&self, asset: AssetId, at: Timestamp) -> PricingResult<Wad> {
        let state = self.index(asset)?;
        if at < state.last_update_timestamp {
            return Err(PricingError::InvalidAccrualWindow {
                asset,
                requested: at,
                last_update: state.last_update_timestamp,
            });
        }
        let elapsed = state.last_update_timestamp.seconds_until(at);
        accrue_quasi_ibt_price(state.quasi_ibt_price, state.index_value, elapsed)
            .ok_or(PricingError::ArithmeticOverflow("quasi ibt price accrual"))
    }

    pub fn accrued_ibt_price(&self, asset: AssetId, at: Timestamp) -> PricingResult<Wad> {
        self.accrued_quasi_ibt_price(asset, at).map(quasi_to_ibt_price)
    }

    pub fn accrued_index(&self, asset: AssetId, at: Timestamp) -> PricingResult<AccruedIndex> {
        let state = self.index(asset)?;
        let ibt_price = self.accrued_ibt_price(asset, at)?;
        Ok(AccruedIndex {
            ibt_price,
            ..AccruedIndex::from(&state)
        })
    }
}

// 3.4: thread-safe handle. one lock over the whole store keeps batch updates atomic
// and orders concurrent writers for the same asset.
#[derive(Debug, Clone)]
pub struct SharedIndexOracle {
    inner: Arc<RwLock<IndexOracle>>,
}

impl SharedIndexOracle {
    pub fn new(oracle: IndexOracle) -> Self {
        Self {
            inner: Arc::new(RwLock::new(oracle)),
        }
    }

    pub fn add_updater(&self, updater: UpdaterId) -> bool {
        self.inner.write().add_updater(updater)
    }

    pub fn register_asset(&self, asset: AssetId, timestamp: Timestamp) -> PricingResult<IndexState> {
        self.inner.write().register_asset(asset, timestamp)
    }

    pub fn update_index(
        &self,
        caller: UpdaterId,
        asset: AssetId,
        new_index_value: Wad,
        timestamp: Timestamp,
    ) -> PricingResult<IndexState> {
        self.inner.write().update_index(caller, asset, new_index_value, timestamp)
    }

    pub fn update_indexes(
        &self,
        caller: UpdaterId,
        assets: &[AssetId],
        values: &[Wad],
        timestamp: Timestamp,
    ) -> PricingResult<Vec<IndexState>> {
        self.inner.write().update_indexes(caller, assets, values, timestamp)
    }

    pub fn index(&self, asset: AssetId) -> PricingResult<IndexState> {
        self.inner.read().index(asset)
    }

    pub fn accrued_ibt_price(&self, asset: AssetId, at: Timestamp) -> PricingResult<Wad> {
        self.inner.read().accrued_ibt_price(asset, at)
    }

    pub fn accrued_index(&self, asset: AssetId, at: Timestamp) -> PricingResult<AccruedIndex> {
        self.inner.read().accrued_index(asset, at)
    }

    pub fn snapshot(&self) -> IndexOracle {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const DAY: u64 = 86_400;
    const USDT: AssetId = AssetId(1);
    const DAI: AssetId = AssetId(3);
    const UPDATER: UpdaterId = UpdaterId(7);

    fn wad(d: Decimal) -> Wad {
        Wad::from_decimal(d).unwrap()
    }

    fn oracle() -> IndexOracle {
        let mut oracle = IndexOracle::new(wad(dec!(0.01)));
        oracle.add_updater(UPDATER);
        oracle.register_asset(USDT, Timestamp(0)).unwrap();
        oracle
    }

    #[test]
    fn registration_initial_state() {
        let oracle = oracle();
        let state = oracle.index(USDT).unwrap();
        assert_eq!(state.index_value, Wad::ZERO);
        assert_eq!(state.quasi_ibt_price, Wad::from_int(31_536_000));
        assert_eq!(state.ibt_price(), Wad::ONE);
        assert_eq!(state.exponential_moving_average, Wad::ZERO);
        assert_eq!(state.exponential_weighted_moving_variance, Wad::ZERO);
    }

    #[test]
    fn double_registration_fails() {
        let mut oracle = oracle();
        assert_eq!(
            oracle.register_asset(USDT, Timestamp(5)),
            Err(PricingError::AlreadyRegistered(USDT))
        );
    }

    #[test]
    fn unregistered_asset() {
        let oracle = oracle();
        assert_eq!(oracle.index(DAI), Err(PricingError::AssetNotRegistered(DAI)));
    }

    #[test]
    fn quasi_price_accrues_linearly() {
        let quasi = Wad::from_int(31_536_000);
        let once = accrue_quasi_ibt_price(quasi, wad(dec!(0.03)), 25 * DAY).unwrap();
        assert_eq!(once, Wad::from_int(31_600_800));
        let twice = accrue_quasi_ibt_price(once, wad(dec!(0.03)), 25 * DAY).unwrap();
        assert_eq!(twice, Wad::from_int(31_665_600));
    }

    #[test]
    fn ema_vector() {
        let ema = calculate_ema(wad(dec!(0.03)), wad(dec!(0.05)), wad(dec!(0.01))).unwrap();
        assert_eq!(ema, wad(dec!(0.0302)));
    }

    #[test]
    fn ema_falling_index_does_not_underflow() {
        let ema = calculate_ema(wad(dec!(0.05)), wad(dec!(0.03)), wad(dec!(0.01))).unwrap();
        assert_eq!(ema, wad(dec!(0.0498)));
        let ema = calculate_ema(wad(dec!(0.05)), Wad::ZERO, Wad::ONE).unwrap();
        assert_eq!(ema, Wad::ZERO);
    }

    #[test]
    fn ewmv_vector() {
        let ewmv = calculate_ewmv(Wad::ZERO, wad(dec!(0.113)), wad(dec!(0.5)), wad(dec!(0.1))).unwrap();
        assert_eq!(ewmv, wad(dec!(0.01347921)));
    }

    #[test]
    fn update_uses_previous_index_for_accrual() {
        let mut oracle = oracle();
        oracle.update_index(UPDATER, USDT, wad(dec!(0.03)), Timestamp(0)).unwrap();
        let state = oracle.update_index(UPDATER, USDT, wad(dec!(0.05)), Timestamp(25 * DAY)).unwrap();
        // accrued at the old 3%, not the new 5%
        assert_eq!(state.quasi_ibt_price, Wad::from_int(31_600_800));
        assert_eq!(state.index_value, wad(dec!(0.05)));
        assert_eq!(state.last_update_timestamp, Timestamp(25 * DAY));
    }

    #[test]
    fn seeded_registration_feeds_statistics() {
        let mut oracle = IndexOracle::new(wad(dec!(0.1)));
        oracle.add_updater(UPDATER);
        oracle
            .register_asset_seeded(DAI, Timestamp(0), wad(dec!(0.113)), Wad::ZERO)
            .unwrap();
        let state = oracle.update_index(UPDATER, DAI, wad(dec!(0.5)), Timestamp(DAY)).unwrap();
        assert_eq!(state.exponential_weighted_moving_variance, wad(dec!(0.01347921)));
        assert_eq!(state.exponential_moving_average, wad(dec!(0.1517)));
    }

    #[test]
    fn seeded_registration_rejects_variance_above_one() {
        let mut oracle = IndexOracle::new(wad(dec!(0.1)));
        let result = oracle.register_asset_seeded(DAI, Timestamp(0), Wad::ZERO, wad(dec!(1.5)));
        assert!(matches!(result, Err(PricingError::VarianceOverflow(_))));
        assert!(!oracle.is_registered(DAI));
    }

    #[test]
    fn stale_timestamp_rejected() {
        let mut oracle = oracle();
        oracle.update_index(UPDATER, USDT, wad(dec!(0.03)), Timestamp(100)).unwrap();
        let result = oracle.update_index(UPDATER, USDT, wad(dec!(0.04)), Timestamp(99));
        assert!(matches!(result, Err(PricingError::StaleTimestamp { .. })));
        assert_eq!(oracle.index(USDT).unwrap().index_value, wad(dec!(0.03)));
    }

    #[test]
    fn equal_timestamp_accepted() {
        let mut oracle = oracle();
        oracle.update_index(UPDATER, USDT, wad(dec!(0.03)), Timestamp(100)).unwrap();
        let state = oracle.update_index(UPDATER, USDT, wad(dec!(0.04)), Timestamp(100)).unwrap();
        assert_eq!(state.quasi_ibt_price, Wad::from_int(31_536_000));
    }

    #[test]
    fn unauthorized_caller_rejected() {
        let mut oracle = oracle();
        let result = oracle.update_index(UpdaterId(99), USDT, wad(dec!(0.03)), Timestamp(1));
        assert_eq!(result, Err(PricingError::Unauthorized(UpdaterId(99))));

        oracle.remove_updater(UPDATER);
        let result = oracle.update_index(UPDATER, USDT, wad(dec!(0.03)), Timestamp(1));
        assert_eq!(result, Err(PricingError::Unauthorized(UPDATER)));
    }

    #[test]
    fn alfa_above_one_rejected() {
        let mut oracle = IndexOracle::new(wad(dec!(1.01)));
        oracle.add_updater(UPDATER);
        oracle.register_asset(USDT, Timestamp(0)).unwrap();
        let result = oracle.update_index(UPDATER, USDT, wad(dec!(0.03)), Timestamp(1));
        assert_eq!(result, Err(PricingError::AlfaOutOfRange(wad(dec!(1.01)))));
    }

    #[test]
    fn variance_overflow_is_an_error_not_a_clamp() {
        let mut oracle = IndexOracle::new(wad(dec!(0.5)));
        oracle.add_updater(UPDATER);
        oracle.register_asset(USDT, Timestamp(0)).unwrap();
        // 0.5 * (0.5 * 4^2) = 4 > 1
        let result = oracle.update_index(UPDATER, USDT, Wad::from_int(4), Timestamp(1));
        assert!(matches!(result, Err(PricingError::VarianceOverflow(_))));
        assert_eq!(oracle.index(USDT).unwrap(), IndexState::new(Timestamp(0)));
    }

    #[test]
    fn batch_length_mismatch_leaves_state() {
        let mut oracle = oracle();
        oracle.register_asset(DAI, Timestamp(0)).unwrap();
        let before = oracle.clone();
        let result = oracle.update_indexes(UPDATER, &[USDT, DAI], &[wad(dec!(0.03))], Timestamp(10));
        assert_eq!(result, Err(PricingError::LengthMismatch { assets: 2, values: 1 }));
        assert_eq!(oracle.index(USDT), before.index(USDT));
        assert_eq!(oracle.index(DAI), before.index(DAI));
    }

    #[test]
    fn batch_failure_is_all_or_nothing() {
        let mut oracle = oracle();
        oracle.register_asset(DAI, Timestamp(50)).unwrap();
        // USDT is fine at t=20, DAI is stale
        let result = oracle.update_indexes(
            UPDATER,
            &[USDT, DAI],
            &[wad(dec!(0.03)), wad(dec!(0.04))],
            Timestamp(20),
        );
        assert!(matches!(result, Err(PricingError::StaleTimestamp { asset: DAI, .. })));
        assert_eq!(oracle.index(USDT).unwrap().index_value, Wad::ZERO);
    }

    #[test]
    fn batch_applies_every_element() {
        let mut oracle = oracle();
        oracle.register_asset(DAI, Timestamp(0)).unwrap();
        let states = oracle
            .update_indexes(UPDATER, &[USDT, DAI], &[wad(dec!(0.03)), wad(dec!(0.04))], Timestamp(10))
            .unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(oracle.index(USDT).unwrap().index_value, wad(dec!(0.03)));
        assert_eq!(oracle.index(DAI).unwrap().index_value, wad(dec!(0.04)));
    }

    #[test]
    fn accrual_window_before_last_update_fails() {
        let mut oracle = oracle();
        oracle.update_index(UPDATER, USDT, wad(dec!(0.03)), Timestamp(100)).unwrap();
        let result = oracle.accrued_ibt_price(USDT, Timestamp(50));
        assert!(matches!(result, Err(PricingError::InvalidAccrualWindow { .. })));
    }

    #[test]
    fn read_accrual_is_idempotent_and_pure() {
        let mut oracle = oracle();
        oracle.update_index(UPDATER, USDT, wad(dec!(0.03)), Timestamp(0)).unwrap();
        let at = Timestamp(25 * DAY);
        let first = oracle.accrued_quasi_ibt_price(USDT, at).unwrap();
        let second = oracle.accrued_quasi_ibt_price(USDT, at).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Wad::from_int(31_600_800));
        assert_eq!(oracle.index(USDT).unwrap().quasi_ibt_price, Wad::from_int(31_536_000));
    }

    #[test]
    fn accrued_ibt_price_divides_once() {
        let mut oracle = oracle();
        oracle.update_index(UPDATER, USDT, wad(dec!(0.03)), Timestamp(0)).unwrap();
        // a full year at 3% simple interest
        let price = oracle.accrued_ibt_price(USDT, Timestamp(SECONDS_PER_YEAR)).unwrap();
        assert_eq!(price, wad(dec!(1.03)));
    }

    #[test]
    fn accrued_index_carries_statistics() {
        let mut oracle = oracle();
        oracle.update_index(UPDATER, USDT, wad(dec!(0.05)), Timestamp(0)).unwrap();
        let accrued = oracle.accrued_index(USDT, Timestamp(0)).unwrap();
        assert_eq!(accrued.index_value, wad(dec!(0.05)));
        assert_eq!(accrued.exponential_moving_average, wad(dec!(0.0005)));
        assert_eq!(accrued.ibt_price, Wad::ONE);
    }

    #[test]
    fn shared_oracle_orders_concurrent_writers() {
        let shared = SharedIndexOracle::new(oracle());
        let handles: Vec<_> = (1..=8u64)
            .map(|i| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    shared.update_index(UPDATER, USDT, Wad::from_raw(i as u128 * 1_000), Timestamp(i * 10))
                })
            })
            .collect();

        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        // whoever wrote last has the highest timestamp seen so far, so at least one succeeds
        // and every failure is a stale timestamp
        assert!(outcomes.iter().any(|r| r.is_ok()));
        assert!(outcomes
            .iter()
            .all(|r| matches!(r, Ok(_) | Err(PricingError::StaleTimestamp { .. }))));
        let last = shared.index(USDT).unwrap().last_update_timestamp;
        let max_ok = outcomes
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .map(|s| s.last_update_timestamp)
            .max()
            .unwrap();
        assert_eq!(last, max_ok);
    }
}
