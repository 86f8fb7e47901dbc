//! Shared fixtures for Parlor benchmarks.

use parlor_core::{ChatService, ManualClock, SweeperConfig};
use parlor_protocol::BROADCAST;
use parlor_store::{MemoryStore, Store};
use std::sync::Arc;

/// Start time of every fixture clock.
pub const START_MILLIS: u64 = 1_700_000_000_000;

/// A chat service over an empty in-memory store.
#[must_use]
pub fn empty_service() -> (ChatService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START_MILLIS));
    let store = Store::from_shared(Arc::new(MemoryStore::new()));
    let service = ChatService::new(store, clock.clone(), SweeperConfig::default());
    (service, clock)
}

/// A chat service with `participants` registered (`user-0`, `user-1`, ...)
/// and `messages` sent round-robin by them.
///
/// Every tenth message is private, addressed to the next participant.
pub async fn populated_service(
    participants: usize,
    messages: usize,
) -> (ChatService, Arc<ManualClock>) {
    let (service, clock) = empty_service();
    let participants = participants.max(1);

    for i in 0..participants {
        service
            .presence
            .register(&user(i))
            .await
            .expect("fixture registration");
    }

    for i in 0..messages {
        let from = user(i % participants);
        let (to, kind) = if i % 10 == 0 {
            (user((i + 1) % participants), "private_message")
        } else {
            (BROADCAST.to_string(), "message")
        };
        service
            .router
            .send(&from, &to, "hello there", kind)
            .await
            .expect("fixture message");
    }

    (service, clock)
}

/// Fixture participant name.
#[must_use]
pub fn user(i: usize) -> String {
    format!("user-{}", i)
}
