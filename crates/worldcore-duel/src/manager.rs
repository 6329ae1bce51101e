//! Duel room manager: the duel-arena specialization of the slot allocator.

use std::sync::Arc;

use worldcore_pool::CancellationToken;
use worldcore_protocol::{DuelSlotState, EntityId, ViewSink, ViewUpdate};

use crate::{
    DuelConfig, DuelError, DuelParams, DuelRoom, ExclusiveSlotAllocator, SlotOutcome,
};

/// Hands out the server's designated duel areas.
///
/// The number of areas comes from [`DuelConfig::area_count`] and never
/// changes. A participant can be in at most one duel at a time.
pub struct DuelRoomManager {
    config: DuelConfig,
    rooms: ExclusiveSlotAllocator<DuelRoom>,
}

impl DuelRoomManager {
    pub fn new(config: DuelConfig) -> Self {
        let rooms = ExclusiveSlotAllocator::new("duel", config.area_count);
        Self { config, rooms }
    }

    /// Claims a free duel area for `challenger` vs `opponent`.
    ///
    /// The room starts in [`DuelState::Preparing`](crate::DuelState::Preparing).
    ///
    /// # Errors
    /// - [`DuelError::SelfDuel`] if both ids are the same.
    /// - [`DuelError::AlreadyInDuel`] if either side already holds a room.
    ///   Checked inside the allocation critical section, so two racing
    ///   challenges cannot both seat the same player.
    pub async fn create_room(
        &self,
        challenger: EntityId,
        opponent: EntityId,
        cancel: &CancellationToken,
    ) -> Result<SlotOutcome<DuelRoom>, DuelError> {
        if challenger == opponent {
            return Err(DuelError::SelfDuel(challenger));
        }

        let params = DuelParams {
            challenger,
            opponent,
            max_score: self.config.max_score,
        };
        self.rooms
            .get_free_slot_checked(params, cancel, |slots| {
                for room in slots.iter().flatten() {
                    for participant in [challenger, opponent] {
                        if room.involves(participant) {
                            return Err(DuelError::AlreadyInDuel(participant, room.index()));
                        }
                    }
                }
                Ok(())
            })
            .await
    }

    /// Frees the room's area for the next duel.
    ///
    /// # Panics
    /// If the room was already released.
    pub fn release(&self, room: &DuelRoom) {
        self.rooms.release_slot(room);
    }

    /// The duel in area `index`, if any. Out-of-range indices yield `None`.
    pub fn room(&self, index: usize) -> Option<Arc<DuelRoom>> {
        self.rooms.get_by_index(index)
    }

    /// The duel `participant` is currently fighting in.
    pub fn room_of(&self, participant: EntityId) -> Option<Arc<DuelRoom>> {
        self.rooms
            .occupied()
            .into_iter()
            .find(|room| room.involves(participant))
    }

    /// Occupancy of every area, in index order.
    pub fn occupancy(&self) -> Vec<DuelSlotState> {
        self.rooms
            .slots()
            .into_iter()
            .enumerate()
            .map(|(index, slot)| DuelSlotState {
                index,
                participants: slot.map(|room| room.participants()),
            })
            .collect()
    }

    /// Pushes the current occupancy to `sink` (e.g. the duel-board UI of a
    /// player standing at the arena entrance).
    pub fn broadcast_occupancy(&self, sink: &dyn ViewSink) {
        sink.push_state(ViewUpdate::DuelOccupancy(self.occupancy()));
    }

    pub fn max_room_count(&self) -> usize {
        self.rooms.max_slot_count()
    }

    pub fn active_room_count(&self) -> usize {
        self.rooms.occupied_count()
    }

    pub fn config(&self) -> &DuelConfig {
        &self.config
    }
}
