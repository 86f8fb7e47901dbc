//! # parlor-store
//!
//! Durable store abstraction for the Parlor chat backend.
//!
//! The store holds two collections:
//!
//! - **Participants** - Unique by name, queried by name or staleness
//! - **Messages** - Append-only, queried by visibility
//!
//! ## Store Abstraction
//!
//! The core only talks to the `ParticipantStore` and `MessageStore` traits
//! through a `Store` handle, so any backend can be injected.
//!
//! ```rust,ignore
//! use parlor_store::{MemoryStore, Store};
//!
//! let store = Store::from_shared(Arc::new(MemoryStore::new()));
//! let everyone = store.participants.find_all(&ParticipantFilter::All).await?;
//! ```

pub mod filter;
pub mod traits;

#[cfg(feature = "memory")]
pub mod memory;

pub use filter::{MessageFilter, ParticipantFilter, ParticipantPatch};
pub use traits::{MessageStore, ParticipantStore, Store, StoreError};

#[cfg(feature = "memory")]
pub use memory::MemoryStore;
