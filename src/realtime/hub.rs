// Conduct rooms and the global channel

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::realtime::events::ServerEvent;

const DEFAULT_CAPACITY: usize = 256;

/// Cheap to clone; every clone shares the same rooms.
#[derive(Debug, Clone)]
pub struct RealtimeHub {
    rooms: Arc<RwLock<HashMap<i64, broadcast::Sender<ServerEvent>>>>,
    global: broadcast::Sender<ServerEvent>,
    capacity: usize,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (global, _rx) = broadcast::channel(capacity);
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            global,
            capacity,
        }
    }

    /// Joins the conduct room, creating it on first use.
    pub async fn subscribe(&self, conduct_id: i64) -> broadcast::Receiver<ServerEvent> {
        if let Some(room) = self.rooms.read().await.get(&conduct_id) {
            return room.subscribe();
        }

        let mut rooms = self.rooms.write().await;
        rooms
            .entry(conduct_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub fn subscribe_global(&self) -> broadcast::Receiver<ServerEvent> {
        self.global.subscribe()
    }

    /// Sends to everyone in the conduct room. Returns how many receivers got it.
    pub async fn emit_to_conduct(&self, conduct_id: i64, event: ServerEvent) -> usize {
        let rooms = self.rooms.read().await;
        let Some(room) = rooms.get(&conduct_id) else {
            debug!(conduct_id, event = event.name(), "No listeners in conduct room");
            return 0;
        };

        let name: &'static str = event.name();
        match room.send(event) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!(conduct_id, event = name, "Conduct room has no active receivers");
                0
            }
        }
    }

    pub fn emit_global(&self, event: ServerEvent) -> usize {
        self.global.send(event).unwrap_or(0)
    }

    /// Drops rooms nobody listens to anymore.
    pub async fn prune(&self, conduct_id: i64) {
        let mut rooms = self.rooms.write().await;
        if rooms.get(&conduct_id).is_some_and(|room| room.receiver_count() == 0) {
            rooms.remove(&conduct_id);
        }
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn removed(user: &str) -> ServerEvent {
        ServerEvent::UserRemoved { user: user.to_string() }
    }

    #[tokio::test]
    async fn events_reach_only_their_room() {
        let hub: RealtimeHub = RealtimeHub::default();
        let mut first = hub.subscribe(1).await;
        let mut second = hub.subscribe(2).await;

        assert_eq!(hub.emit_to_conduct(1, removed("alpha")).await, 1);

        match first.recv().await.unwrap() {
            ServerEvent::UserRemoved { user } => assert_eq!(user, "alpha"),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(second.try_recv().is_err());
    }

    #[tokio::test]
    async fn emitting_to_an_empty_room_is_not_an_error() {
        let hub: RealtimeHub = RealtimeHub::default();
        assert_eq!(hub.emit_to_conduct(99, removed("ghost")).await, 0);
    }

    #[tokio::test]
    async fn global_events_reach_every_subscriber() {
        let hub: RealtimeHub = RealtimeHub::default();
        let mut a = hub.subscribe_global();
        let mut b = hub.subscribe_global();

        assert_eq!(hub.emit_global(removed("bravo")), 2);
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[tokio::test]
    async fn prune_removes_abandoned_rooms() {
        let hub: RealtimeHub = RealtimeHub::default();
        let rx = hub.subscribe(5).await;
        hub.prune(5).await;
        assert_eq!(hub.room_count().await, 1);

        drop(rx);
        hub.prune(5).await;
        assert_eq!(hub.room_count().await, 0);
    }
}
