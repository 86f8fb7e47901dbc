//! In-memory store backend.
//!
//! Participants live in a `DashMap` keyed by name, so the uniqueness check
//! and the insert are one atomic entry operation. Messages are an
//! append-only log behind a `RwLock`.
//!
//! The whole store can be captured as a `Snapshot` and written to disk, which
//! lets a server keep its state across restarts.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parlor_protocol::{codec, Message, Participant, Snapshot};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};

use crate::filter::{MessageFilter, ParticipantFilter, ParticipantPatch};
use crate::traits::{MessageStore, ParticipantStore, StoreError};

/// A participant with its insertion sequence number.
#[derive(Debug, Clone)]
struct Slot {
    seq: u64,
    record: Participant,
}

/// In-memory implementation of both collections.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Participants indexed by name.
    participants: DashMap<String, Slot>,
    /// Next insertion sequence number.
    next_seq: AtomicU64,
    /// Message log in creation order.
    messages: RwLock<Vec<Message>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated from a snapshot.
    ///
    /// Duplicate participant names keep their first occurrence.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let messages = snapshot.messages.len();
        let store = Self {
            messages: RwLock::new(snapshot.messages),
            ..Self::default()
        };
        for participant in snapshot.participants {
            let name = participant.name.clone();
            if !store.insert_slot(participant) {
                warn!(participant = %name, "Skipping duplicate participant in snapshot");
            }
        }
        debug!(
            participants = store.participants.len(),
            messages,
            "Restored store from snapshot"
        );
        store
    }

    /// Capture the current contents.
    pub async fn snapshot(&self) -> Snapshot {
        let messages = self.messages.read().await.clone();
        Snapshot::new(self.ordered(&ParticipantFilter::All), messages)
    }

    /// Load a store from a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let snapshot = codec::decode(&data)?;
        info!(path = %path.display(), "Loaded store snapshot");
        Ok(Self::from_snapshot(snapshot))
    }

    /// Write the current contents to a snapshot file.
    ///
    /// The snapshot is written to a sibling temporary file first and then
    /// renamed over `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or any file operation fails.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let encoded = codec::encode(&self.snapshot().await)?;

        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &encoded).await?;
        tokio::fs::rename(&tmp, path).await?;

        info!(path = %path.display(), bytes = encoded.len(), "Saved store snapshot");
        Ok(())
    }

    /// Insert unless the name is taken. Returns `true` if inserted.
    fn insert_slot(&self, record: Participant) -> bool {
        match self.participants.entry(record.name.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                vacant.insert(Slot { seq, record });
                true
            }
        }
    }

    /// Matching participants sorted by insertion order.
    fn ordered(&self, filter: &ParticipantFilter) -> Vec<Participant> {
        let mut slots: Vec<Slot> = match filter {
            ParticipantFilter::Name(name) => self
                .participants
                .get(name)
                .map(|slot| slot.value().clone())
                .into_iter()
                .collect(),
            _ => self
                .participants
                .iter()
                .filter(|entry| filter.matches(&entry.record))
                .map(|entry| entry.value().clone())
                .collect(),
        };
        slots.sort_by_key(|slot| slot.seq);
        slots.into_iter().map(|slot| slot.record).collect()
    }
}

#[async_trait]
impl ParticipantStore for MemoryStore {
    async fn find_one(&self, filter: &ParticipantFilter) -> Result<Option<Participant>, StoreError> {
        Ok(self.ordered(filter).into_iter().next())
    }

    async fn find_all(&self, filter: &ParticipantFilter) -> Result<Vec<Participant>, StoreError> {
        Ok(self.ordered(filter))
    }

    async fn insert(&self, record: Participant) -> Result<(), StoreError> {
        let name = record.name.clone();
        if self.insert_slot(record) {
            trace!(participant = %name, "Inserted participant");
            Ok(())
        } else {
            Err(StoreError::Conflict(name))
        }
    }

    async fn update(
        &self,
        filter: &ParticipantFilter,
        patch: &ParticipantPatch,
    ) -> Result<u64, StoreError> {
        let matched = match filter {
            ParticipantFilter::Name(name) => match self.participants.get_mut(name) {
                Some(mut slot) => {
                    patch.apply(&mut slot.record);
                    1
                }
                None => 0,
            },
            _ => {
                let mut matched = 0;
                for mut slot in self.participants.iter_mut() {
                    if filter.matches(&slot.record) {
                        patch.apply(&mut slot.record);
                        matched += 1;
                    }
                }
                matched
            }
        };
        trace!(?filter, matched, "Updated participants");
        Ok(matched)
    }

    async fn delete_many(&self, filter: &ParticipantFilter) -> Result<u64, StoreError> {
        let mut removed = 0;
        self.participants.retain(|_, slot| {
            if filter.matches(&slot.record) {
                removed += 1;
                false
            } else {
                true
            }
        });
        trace!(?filter, removed, "Deleted participants");
        Ok(removed)
    }

    async fn count(&self, filter: &ParticipantFilter) -> Result<u64, StoreError> {
        let count = match filter {
            ParticipantFilter::All => self.participants.len(),
            _ => self
                .participants
                .iter()
                .filter(|entry| filter.matches(&entry.record))
                .count(),
        };
        Ok(count as u64)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert(&self, record: Message) -> Result<(), StoreError> {
        self.messages.write().await.push(record);
        Ok(())
    }

    async fn insert_many(&self, records: Vec<Message>) -> Result<(), StoreError> {
        let count = records.len();
        self.messages.write().await.extend(records);
        trace!(count, "Inserted messages");
        Ok(())
    }

    async fn find(
        &self,
        filter: &MessageFilter,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, StoreError> {
        let log = self.messages.read().await;
        let found = match limit {
            Some(limit) => {
                let mut newest: Vec<Message> = log
                    .iter()
                    .rev()
                    .filter(|message| filter.matches(message))
                    .take(limit)
                    .cloned()
                    .collect();
                newest.reverse();
                newest
            }
            None => log
                .iter()
                .filter(|message| filter.matches(message))
                .cloned()
                .collect(),
        };
        Ok(found)
    }
}
