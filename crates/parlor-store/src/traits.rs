//! Store abstraction traits for Parlor.
//!
//! These traits define the operations the core needs from a durable store.
//! No transactional guarantee is assumed across the two collections.

use async_trait::async_trait;
use parlor_protocol::{Message, Participant};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::filter::{MessageFilter, ParticipantFilter, ParticipantPatch};

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same unique key already exists.
    #[error("Duplicate key: {0}")]
    Conflict(String),

    /// The backend could not serve the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Snapshot encoding or decoding failed.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] parlor_protocol::ProtocolError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The participants collection.
///
/// Backends must enforce uniqueness of `name` on insert.
#[async_trait]
pub trait ParticipantStore: Send + Sync {
    /// Find the first participant matching the filter.
    async fn find_one(&self, filter: &ParticipantFilter) -> Result<Option<Participant>, StoreError>;

    /// Find all participants matching the filter, in insertion order.
    async fn find_all(&self, filter: &ParticipantFilter) -> Result<Vec<Participant>, StoreError>;

    /// Insert a participant.
    ///
    /// Returns `StoreError::Conflict` if the name is already taken.
    async fn insert(&self, record: Participant) -> Result<(), StoreError>;

    /// Apply a patch to every matching participant.
    ///
    /// Returns the number of matched participants.
    async fn update(
        &self,
        filter: &ParticipantFilter,
        patch: &ParticipantPatch,
    ) -> Result<u64, StoreError>;

    /// Delete every matching participant.
    ///
    /// The filter is evaluated at deletion time. Returns the number removed.
    async fn delete_many(&self, filter: &ParticipantFilter) -> Result<u64, StoreError>;

    /// Count matching participants.
    async fn count(&self, filter: &ParticipantFilter) -> Result<u64, StoreError> {
        Ok(self.find_all(filter).await?.len() as u64)
    }
}

/// The messages collection. Append-only.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message.
    async fn insert(&self, record: Message) -> Result<(), StoreError>;

    /// Append several messages in one call.
    async fn insert_many(&self, records: Vec<Message>) -> Result<(), StoreError>;

    /// Find matching messages in creation order.
    ///
    /// With a limit, only the last `limit` matches are returned.
    async fn find(
        &self,
        filter: &MessageFilter,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, StoreError>;
}

/// Handle to both collections, passed explicitly to every component.
#[derive(Clone)]
pub struct Store {
    /// Participants collection.
    pub participants: Arc<dyn ParticipantStore>,
    /// Messages collection.
    pub messages: Arc<dyn MessageStore>,
}

impl Store {
    /// Create a handle from two collections.
    #[must_use]
    pub fn new(participants: Arc<dyn ParticipantStore>, messages: Arc<dyn MessageStore>) -> Self {
        Self {
            participants,
            messages,
        }
    }

    /// Create a handle from a backend that serves both collections.
    #[must_use]
    pub fn from_shared<S>(backend: Arc<S>) -> Self
    where
        S: ParticipantStore + MessageStore + 'static,
    {
        Self {
            participants: backend.clone(),
            messages: backend,
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}
