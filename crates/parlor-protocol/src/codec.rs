//! Snapshot codec.
//!
//! Snapshots are MessagePack-encoded with a length prefix, so a truncated
//! file is detected before deserialization is attempted.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::records::{Message, Participant};
use crate::version::{Version, SNAPSHOT_VERSION};

/// Maximum encoded snapshot size (256 MiB).
pub const MAX_SNAPSHOT_SIZE: usize = 256 * 1024 * 1024;

/// Length prefix size in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Snapshot exceeds maximum size.
    #[error("Snapshot size {0} exceeds maximum {MAX_SNAPSHOT_SIZE}")]
    TooLarge(usize),

    /// Not enough data to decode.
    #[error("Incomplete snapshot: need {0} more bytes")]
    Incomplete(usize),

    /// Written by an incompatible format version.
    #[error("Incompatible snapshot version {found}, expected {expected}")]
    IncompatibleVersion { found: Version, expected: Version },

    /// MessagePack encoding error.
    #[error("Encoding error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// MessagePack decoding error.
    #[error("Decoding error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Full contents of a store at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version the snapshot was written with.
    pub version: Version,
    /// Participants in insertion order.
    pub participants: Vec<Participant>,
    /// Messages in creation order.
    pub messages: Vec<Message>,
}

impl Snapshot {
    /// Create a snapshot at the current format version.
    #[must_use]
    pub fn new(participants: Vec<Participant>, messages: Vec<Message>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            participants,
            messages,
        }
    }
}

/// Encode a snapshot to bytes.
///
/// The encoded format is:
/// - 4 bytes: Big-endian length prefix
/// - N bytes: MessagePack-encoded snapshot
///
/// # Errors
///
/// Returns an error if the snapshot is too large or encoding fails.
pub fn encode(snapshot: &Snapshot) -> Result<Bytes, ProtocolError> {
    let payload = rmp_serde::to_vec_named(snapshot)?;

    if payload.len() > MAX_SNAPSHOT_SIZE {
        return Err(ProtocolError::TooLarge(payload.len()));
    }

    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.put_u32(payload.len() as u32);
    buf.extend_from_slice(&payload);

    Ok(buf.freeze())
}

/// Decode a snapshot from bytes.
///
/// # Errors
///
/// Returns an error if the data is incomplete, too large, invalid, or was
/// written by an incompatible format version.
pub fn decode(data: &[u8]) -> Result<Snapshot, ProtocolError> {
    if data.len() < LENGTH_PREFIX_SIZE {
        return Err(ProtocolError::Incomplete(LENGTH_PREFIX_SIZE - data.len()));
    }

    let length = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;

    if length > MAX_SNAPSHOT_SIZE {
        return Err(ProtocolError::TooLarge(length));
    }

    let total_size = LENGTH_PREFIX_SIZE + length;
    if data.len() < total_size {
        return Err(ProtocolError::Incomplete(total_size - data.len()));
    }

    let snapshot: Snapshot = rmp_serde::from_slice(&data[LENGTH_PREFIX_SIZE..total_size])?;
    if !snapshot.version.is_compatible_with(&SNAPSHOT_VERSION) {
        return Err(ProtocolError::IncompatibleVersion {
            found: snapshot.version,
            expected: SNAPSHOT_VERSION,
        });
    }

    Ok(snapshot)
}
