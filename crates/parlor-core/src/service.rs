//! Wiring of the core components over one store and one clock.

use crate::clock::Clock;
use crate::presence::PresenceManager;
use crate::router::MessageRouter;
use crate::sweeper::{ExpirationSweeper, SweeperConfig};
use parlor_store::Store;
use std::sync::Arc;

/// The presence manager, message router, and sweeper sharing a store.
#[derive(Debug, Clone)]
pub struct ChatService {
    /// Participant registration and heartbeats.
    pub presence: PresenceManager,
    /// Message creation and reads.
    pub router: MessageRouter,
    /// Inactivity eviction.
    pub sweeper: ExpirationSweeper,
}

impl ChatService {
    /// Build all components over `store`.
    #[must_use]
    pub fn new(store: Store, clock: Arc<dyn Clock>, sweeper_config: SweeperConfig) -> Self {
        let router = MessageRouter::new(store.clone(), clock.clone());
        let presence = PresenceManager::new(store.clone(), router.clone(), clock.clone());
        let sweeper = ExpirationSweeper::new(store, router.clone(), clock, sweeper_config);
        Self {
            presence,
            router,
            sweeper,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use parlor_protocol::{MessageKind, ARRIVAL_NOTICE, BROADCAST};
    use parlor_store::MemoryStore;
    use std::time::Duration;

    fn service() -> (ChatService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let store = Store::from_shared(Arc::new(MemoryStore::new()));
        (
            ChatService::new(store, clock.clone(), SweeperConfig::default()),
            clock,
        )
    }

    #[tokio::test]
    async fn test_register_send_and_read_back() {
        let (chat, _) = service();

        chat.presence.register("Alice").await.unwrap();
        chat.router.send("Alice", BROADCAST, "hi", "message").await.unwrap();

        let messages = chat.router.list("Alice", Some(10)).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].kind, MessageKind::Status);
        assert_eq!(messages[0].text, ARRIVAL_NOTICE);
        assert_eq!(messages[1].kind, MessageKind::Message);
        assert_eq!(messages[1].text, "hi");
    }

    #[tokio::test]
    async fn test_evicted_sender_can_no_longer_send() {
        let (chat, clock) = service();

        chat.presence.register("Bob").await.unwrap();
        clock.advance(Duration::from_secs(30));
        chat.sweeper.run_cycle().await.unwrap();

        assert!(chat.router.send("Bob", BROADCAST, "still here?", "message").await.is_err());

        // Messages outlive the sender's presence.
        let history = chat.router.list("Carol", None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|m| m.from == "Bob"));

        // The name is free again.
        chat.presence.register("Bob").await.unwrap();
    }
}
