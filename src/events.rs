// 11.0: every state change in the engine produces an event. used as an audit trail
// and for replaying what the pricing core decided. the EventPayload enum lists all of them.

use crate::math::{SignedWad, Wad};
use crate::spread::Component;
use crate::types::{AssetId, Direction, SwapId, Timestamp, UpdaterId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventPayload {
    // Oracle events
    AssetRegistered(AssetRegisteredEvent),
    UpdaterGranted(UpdaterEvent),
    UpdaterRevoked(UpdaterEvent),
    IndexUpdated(IndexUpdatedEvent),

    // Pool events
    LiquidityDeposited(LiquidityDepositedEvent),

    // Swap events
    SpreadQuoted(SpreadQuotedEvent),
    SwapOpened(SwapOpenedEvent),
    SwapClosed(SwapClosedEvent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRegisteredEvent {
    pub asset: AssetId,
    pub symbol: String,
    pub decimals: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdaterEvent {
    pub updater: UpdaterId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexUpdatedEvent {
    pub asset: AssetId,
    pub index_value: Wad,
    pub ibt_price: Wad,
    pub exponential_moving_average: Wad,
    pub exponential_weighted_moving_variance: Wad,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidityDepositedEvent {
    pub asset: AssetId,
    pub amount: Wad,
    pub new_balance: Wad,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadQuotedEvent {
    pub asset: AssetId,
    pub direction: Direction,
    pub notional: Wad,
    pub spread: Wad,
    pub fixed_rate: Wad,
    pub demand: Component,
    pub at_par: Component,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapOpenedEvent {
    pub swap_id: SwapId,
    pub asset: AssetId,
    pub direction: Direction,
    pub notional: Wad,
    pub fixed_rate: Wad,
    pub ibt_quantity: Wad,
    pub opening_fee: Wad,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapClosedEvent {
    pub swap_id: SwapId,
    pub asset: AssetId,
    // holder's side. positive = the pool paid out
    pub payoff: SignedWad,
    pub matured: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn swap_closed_event() {
        let closed = SwapClosedEvent {
            swap_id: SwapId(4),
            asset: AssetId(3),
            payoff: SignedWad::from_decimal(dec!(-12.5)).unwrap(),
            matured: false,
        };
        assert!(closed.payoff.is_negative()); // holder lost, pool gained
    }

    #[test]
    fn event_serialization() {
        let event = Event::new(
            EventId(1),
            Timestamp(1_700_000_000),
            EventPayload::SpreadQuoted(SpreadQuotedEvent {
                asset: AssetId(1),
                direction: Direction::PayFixed,
                notional: Wad::from_int(10_000),
                spread: Wad::from_decimal(dec!(0.003)).unwrap(),
                fixed_rate: Wad::from_decimal(dec!(0.033)).unwrap(),
                demand: Component::Saturated,
                at_par: Component::Unsaturated(Wad::from_decimal(dec!(0.00033)).unwrap()),
            }),
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
