//! Index update operations.

use super::core::Engine;
use super::results::EngineError;
use crate::events::{EventPayload, IndexUpdatedEvent};
use crate::math::Wad;
use crate::oracle::IndexState;
use crate::types::{AssetId, UpdaterId};

impl Engine {
    /// Publish a new index value for one asset at the engine's current time.
    pub fn update_index(
        &mut self,
        caller: UpdaterId,
        asset: AssetId,
        index_value: Wad,
    ) -> Result<IndexState, EngineError> {
        let state = self.oracle.update_index(caller, asset, index_value, self.current_time)?;
        self.emit_index_updated(asset, &state);
        Ok(state)
    }

    /// Batch variant. Nothing is applied unless every element succeeds.
    pub fn update_indexes(
        &mut self,
        caller: UpdaterId,
        assets: &[AssetId],
        values: &[Wad],
    ) -> Result<Vec<IndexState>, EngineError> {
        let states = self.oracle.update_indexes(caller, assets, values, self.current_time)?;
        for (asset, state) in assets.iter().zip(&states) {
            self.emit_index_updated(*asset, state);
        }
        Ok(states)
    }

    fn emit_index_updated(&mut self, asset: AssetId, state: &IndexState) {
        self.emit_event(EventPayload::IndexUpdated(IndexUpdatedEvent {
            asset,
            index_value: state.index_value,
            ibt_price: state.ibt_price(),
            exponential_moving_average: state.exponential_moving_average,
            exponential_weighted_moving_variance: state.exponential_weighted_moving_variance,
        }));
    }
}
