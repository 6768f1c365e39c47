// 8.0 engine/core.rs: main engine. holds the oracle, the swap book, per-asset pool state.

use super::config::EngineConfig;
use super::results::EngineError;
use crate::config::{AssetConfig, PricingConfig};
use crate::error::PricingError;
use crate::events::{AssetRegisteredEvent, Event, EventId, EventPayload, LiquidityDepositedEvent, UpdaterEvent};
use crate::indicators::SoapIndicators;
use crate::math::Wad;
use crate::oracle::IndexOracle;
use crate::spread::SpreadModel;
use crate::swap::SwapBook;
use crate::types::{AssetId, Direction, Timestamp, UpdaterId};
use std::collections::HashMap;
use tracing::info;

/// Pool-side state the engine tracks for one asset.
#[derive(Debug, Clone)]
pub struct AssetState {
    pub config: AssetConfig,
    pub liquidity_pool_balance: Wad,
    pub pay_fixed_indicators: SoapIndicators,
    pub receive_fixed_indicators: SoapIndicators,
}

impl AssetState {
    pub fn new(config: AssetConfig, timestamp: Timestamp) -> Self {
        Self {
            config,
            liquidity_pool_balance: Wad::ZERO,
            pay_fixed_indicators: SoapIndicators::new(Direction::PayFixed, timestamp),
            receive_fixed_indicators: SoapIndicators::new(Direction::ReceiveFixed, timestamp),
        }
    }

    pub fn indicators(&self, direction: Direction) -> &SoapIndicators {
        match direction {
            Direction::PayFixed => &self.pay_fixed_indicators,
            Direction::ReceiveFixed => &self.receive_fixed_indicators,
        }
    }

    pub fn indicators_mut(&mut self, direction: Direction) -> &mut SoapIndicators {
        match direction {
            Direction::PayFixed => &mut self.pay_fixed_indicators,
            Direction::ReceiveFixed => &mut self.receive_fixed_indicators,
        }
    }
}

/** 8.1: main engine struct. all state lives here */
#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) oracle: IndexOracle,
    pub(super) spread_model: SpreadModel,
    pub(super) swap_tenor_secs: u64,
    pub(super) assets: HashMap<AssetId, AssetState>,
    pub(super) book: SwapBook,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
}

impl Engine {
    pub fn new(config: EngineConfig, pricing: &PricingConfig) -> Result<Self, EngineError> {
        pricing.validate()?;
        Ok(Self {
            config,
            oracle: IndexOracle::new(pricing.alfa_wad()?),
            spread_model: pricing.spread.to_model()?,
            swap_tenor_secs: pricing.swap_tenor_secs,
            assets: HashMap::new(),
            book: SwapBook::new(),
            events: Vec::new(),
            next_event_id: 1,
            current_time: Timestamp(0),
        })
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, secs: u64) {
        self.current_time = self.current_time.plus_secs(secs);
    }

    pub fn oracle(&self) -> &IndexOracle {
        &self.oracle
    }

    pub fn spread_model(&self) -> &SpreadModel {
        &self.spread_model
    }

    pub fn book(&self) -> &SwapBook {
        &self.book
    }

    pub fn asset(&self, asset: AssetId) -> Option<&AssetState> {
        self.assets.get(&asset)
    }

    pub(super) fn asset_state(&self, asset: AssetId) -> Result<&AssetState, EngineError> {
        self.assets
            .get(&asset)
            .ok_or(EngineError::Pricing(PricingError::AssetNotRegistered(asset)))
    }

    pub fn add_updater(&mut self, updater: UpdaterId) -> bool {
        let added = self.oracle.add_updater(updater);
        if added {
            self.emit_event(EventPayload::UpdaterGranted(UpdaterEvent { updater }));
        }
        added
    }

    pub fn remove_updater(&mut self, updater: UpdaterId) -> bool {
        let removed = self.oracle.remove_updater(updater);
        if removed {
            self.emit_event(EventPayload::UpdaterRevoked(UpdaterEvent { updater }));
        }
        removed
    }

    // registers with the oracle at the current time. the index starts at zero
    // with an IBT price of exactly 1.0
    pub fn register_asset(&mut self, config: AssetConfig) -> Result<(), EngineError> {
        let asset = config.id;
        self.oracle.register_asset(asset, self.current_time)?;

        self.emit_event(EventPayload::AssetRegistered(AssetRegisteredEvent {
            asset,
            symbol: config.symbol.clone(),
            decimals: config.decimals,
        }));
        self.assets.insert(asset, AssetState::new(config, self.current_time));
        Ok(())
    }

    // stand-in for the liquidity layer: quotes need a pool balance to price against
    pub fn deposit_liquidity(&mut self, asset: AssetId, amount: Wad) -> Result<Wad, EngineError> {
        let state = self
            .assets
            .get_mut(&asset)
            .ok_or(EngineError::Pricing(PricingError::AssetNotRegistered(asset)))?;
        let new_balance = state
            .liquidity_pool_balance
            .checked_add(amount)
            .ok_or(PricingError::ArithmeticOverflow("liquidity pool balance"))?;
        state.liquidity_pool_balance = new_balance;
        info!(%asset, amount = %amount, balance = %new_balance, "liquidity deposited");

        self.emit_event(EventPayload::LiquidityDeposited(LiquidityDepositedEvent {
            asset,
            amount,
            new_balance,
        }));
        Ok(new_balance)
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        self.events.push(event);

        if self.events.len() > self.config.max_events {
            let drain_count = self.events.len() - self.config.max_events;
            self.events.drain(0..drain_count);
        }
    }
}
