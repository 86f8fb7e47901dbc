//! Presence tracking for Parlor.
//!
//! A participant is present from registration until the sweeper evicts it.
//! Heartbeats are the only way to stay present.

use crate::clock::Clock;
use crate::error::ChatError;
use crate::router::MessageRouter;
use parlor_protocol::{Participant, ARRIVAL_NOTICE};
use parlor_store::{ParticipantFilter, ParticipantPatch, Store};
use std::sync::Arc;
use tracing::{debug, trace};

/// Registers participants and refreshes their liveness.
#[derive(Debug, Clone)]
pub struct PresenceManager {
    store: Store,
    router: MessageRouter,
    clock: Arc<dyn Clock>,
}

impl PresenceManager {
    /// Create a presence manager.
    #[must_use]
    pub fn new(store: Store, router: MessageRouter, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            router,
            clock,
        }
    }

    /// Register a new participant and announce the arrival.
    ///
    /// Name lookup is exact and case-sensitive. The store's uniqueness
    /// constraint settles concurrent registrations of the same name.
    ///
    /// # Errors
    ///
    /// - `Validation` if `name` is empty
    /// - `Conflict` if the name is taken
    /// - `Store` if the store fails
    pub async fn register(&self, name: &str) -> Result<(), ChatError> {
        if name.trim().is_empty() {
            return Err(ChatError::Validation("name is required".to_string()));
        }

        let filter = ParticipantFilter::by_name(name);
        if self.store.participants.find_one(&filter).await?.is_some() {
            return Err(ChatError::Conflict(name.to_string()));
        }

        let participant = Participant::new(name, self.clock.now_millis());
        self.store.participants.insert(participant).await?;
        self.router.emit_status(name, ARRIVAL_NOTICE).await?;

        debug!(participant = %name, "Presence: participant joined");
        Ok(())
    }

    /// All current participants, in registration order.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the store fails.
    pub async fn list(&self) -> Result<Vec<Participant>, ChatError> {
        let participants = self
            .store
            .participants
            .find_all(&ParticipantFilter::All)
            .await?;
        trace!(count = participants.len(), "Listed participants");
        Ok(participants)
    }

    /// Number of current participants.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the store fails.
    pub async fn count(&self) -> Result<u64, ChatError> {
        Ok(self.store.participants.count(&ParticipantFilter::All).await?)
    }

    /// Refresh a participant's last-seen time.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `name` is empty or not registered
    /// - `Store` if the store fails
    pub async fn heartbeat(&self, name: &str) -> Result<(), ChatError> {
        if name.is_empty() {
            return Err(ChatError::NotFound("participant name is required".into()));
        }

        let now = self.clock.now_millis();
        let matched = self
            .store
            .participants
            .update(&ParticipantFilter::by_name(name), &ParticipantPatch::touch(now))
            .await?;
        if matched == 0 {
            return Err(ChatError::NotFound(format!("participant {}", name)));
        }

        trace!(participant = %name, last_seen = now, "Presence: heartbeat");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use parlor_protocol::{MessageKind, BROADCAST};
    use parlor_store::{MemoryStore, MessageFilter};
    use std::time::Duration;

    fn presence() -> (PresenceManager, Store, Arc<ManualClock>) {
        let store = Store::from_shared(Arc::new(MemoryStore::new()));
        let clock = Arc::new(ManualClock::new(1_000_000));
        let router = MessageRouter::new(store.clone(), clock.clone());
        (
            PresenceManager::new(store.clone(), router, clock.clone()),
            store,
            clock,
        )
    }

    #[tokio::test]
    async fn test_register_announces_arrival() {
        let (presence, store, _) = presence();

        presence.register("Alice").await.unwrap();

        let participants = presence.list().await.unwrap();
        assert_eq!(participants, vec![Participant::new("Alice", 1_000_000)]);

        let messages = store.messages.find(&MessageFilter::All, None).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].from, "Alice");
        assert_eq!(messages[0].to, BROADCAST);
        assert_eq!(messages[0].text, ARRIVAL_NOTICE);
        assert_eq!(messages[0].kind, MessageKind::Status);
    }

    #[tokio::test]
    async fn test_register_rejects_empty_name() {
        let (presence, store, _) = presence();

        assert!(matches!(presence.register("").await, Err(ChatError::Validation(_))));
        assert!(matches!(presence.register("   ").await, Err(ChatError::Validation(_))));
        assert_eq!(presence.count().await.unwrap(), 0);

        let messages = store.messages.find(&MessageFilter::All, None).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_register_twice_conflicts() {
        let (presence, store, _) = presence();

        presence.register("Alice").await.unwrap();
        assert!(matches!(
            presence.register("Alice").await,
            Err(ChatError::Conflict(ref name)) if name == "Alice"
        ));

        assert_eq!(presence.count().await.unwrap(), 1);
        let messages = store.messages.find(&MessageFilter::All, None).await.unwrap();
        assert_eq!(messages.len(), 1);

        // Exact match only.
        presence.register("alice").await.unwrap();
        assert_eq!(presence.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_registrations_yield_one_participant() {
        let (presence, _, _) = presence();

        let attempts: Vec<_> = (0..16)
            .map(|_| {
                let presence = presence.clone();
                tokio::spawn(async move { presence.register("Alice").await })
            })
            .collect();

        let mut successes = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(()) => successes += 1,
                Err(ChatError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {}", other),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(presence.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_heartbeat_only_touches_last_seen() {
        let (presence, _, clock) = presence();
        presence.register("Alice").await.unwrap();

        for _ in 0..3 {
            clock.advance(Duration::from_secs(5));
            presence.heartbeat("Alice").await.unwrap();
        }

        let participants = presence.list().await.unwrap();
        assert_eq!(participants, vec![Participant::new("Alice", 1_015_000)]);
    }

    #[tokio::test]
    async fn test_heartbeat_unknown_is_not_found() {
        let (presence, _, _) = presence();

        assert!(matches!(presence.heartbeat("Ghost").await, Err(ChatError::NotFound(_))));
        assert!(matches!(presence.heartbeat("").await, Err(ChatError::NotFound(_))));

        let unnamed = presence.heartbeat("").await.unwrap_err().to_string();
        assert_eq!(unnamed, "Not found: participant name is required");
        let unknown = presence.heartbeat("Ghost").await.unwrap_err().to_string();
        assert_eq!(unknown, "Not found: participant Ghost");
        assert_eq!(presence.count().await.unwrap(), 0);
    }
}
