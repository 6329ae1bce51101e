//! The observer-side contract: where view updates go.
//!
//! The world core never talks to a network connection directly. It hands
//! updates to a [`ViewSink`], and whoever owns the sink (usually the
//! player's connection handler) decides how to encode and ship them.

use tokio::sync::mpsc;

use crate::{EntityId, MoveType, Point, ViewUpdate};

/// Receives view updates for one observer.
///
/// Sinks are called while the AOI engine holds the locks of the buckets
/// involved in the change, so implementations must return quickly and
/// must never call back into the engine. Handing the update to a channel
/// is the expected shape.
///
/// Only [`push_state`](Self::push_state) is required; the other methods
/// wrap their arguments into a [`ViewUpdate`] and forward to it.
pub trait ViewSink: Send + Sync + 'static {
    /// Pushes an arbitrary state update to the observer.
    fn push_state(&self, update: ViewUpdate);

    /// The given entities are now in scope.
    fn entities_entered(&self, entities: &[EntityId]) {
        self.push_state(ViewUpdate::EntitiesEntered(entities.to_vec()));
    }

    /// The given entities went out of scope.
    fn entities_left(&self, entities: &[EntityId]) {
        self.push_state(ViewUpdate::EntitiesLeft(entities.to_vec()));
    }

    /// An already known entity moved.
    fn entity_moved(&self, entity: EntityId, to: Point, move_type: MoveType) {
        self.push_state(ViewUpdate::EntityMoved {
            entity,
            to,
            move_type,
        });
    }
}

/// Channel sender for delivering view updates to a connection handler.
pub type ViewSender = mpsc::UnboundedSender<ViewUpdate>;

/// A closed receiver means the observer's connection is gone; the update
/// is dropped silently, the observer will be unregistered by its owner.
impl ViewSink for ViewSender {
    fn push_state(&self, update: ViewUpdate) {
        let _ = self.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_forwards_updates_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        tx.entities_entered(&[EntityId(1)]);
        tx.entity_moved(EntityId(1), Point::new(2, 2), MoveType::Instant);
        tx.entities_left(&[EntityId(1)]);

        assert_eq!(
            rx.try_recv().unwrap(),
            ViewUpdate::EntitiesEntered(vec![EntityId(1)])
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            ViewUpdate::EntityMoved { move_type: MoveType::Instant, .. }
        ));
        assert_eq!(
            rx.try_recv().unwrap(),
            ViewUpdate::EntitiesLeft(vec![EntityId(1)])
        );
    }

    #[test]
    fn test_channel_sink_with_dropped_receiver_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        tx.entities_entered(&[EntityId(9)]);
    }
}
