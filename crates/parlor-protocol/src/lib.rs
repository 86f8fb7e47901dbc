//! # parlor-protocol
//!
//! Records and wire types shared by every Parlor crate.
//!
//! This crate defines the data model of the chat backend, the JSON bodies
//! exchanged over HTTP, and the MessagePack codec used to persist store
//! snapshots.
//!
//! ## Records
//!
//! - `Participant` - A registered presence, keyed by name
//! - `Message` - A broadcast, private, or status message
//!
//! ## Example
//!
//! ```rust
//! use parlor_protocol::{codec, Message, MessageKind, Snapshot, BROADCAST};
//!
//! let message = Message::new("Alice", BROADCAST, "hi", MessageKind::Message, "2024-05-01T13:45:10Z");
//! assert!(message.is_visible_to("Carol"));
//!
//! let snapshot = Snapshot::new(Vec::new(), vec![message]);
//! let encoded = codec::encode(&snapshot).unwrap();
//! let decoded = codec::decode(&encoded).unwrap();
//! assert_eq!(decoded.messages.len(), 1);
//! ```

pub mod api;
pub mod codec;
pub mod records;
pub mod version;

pub use codec::{decode, encode, ProtocolError, Snapshot};
pub use records::{Message, MessageKind, Participant, ARRIVAL_NOTICE, BROADCAST, DEPARTURE_NOTICE};
pub use version::{Version, SNAPSHOT_VERSION};
