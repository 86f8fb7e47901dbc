//! Stored records for Parlor.
//!
//! Participants and messages are the only two record types. Messages refer to
//! participants by name only, so a message may outlive its sender.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The `to` value meaning "visible to every participant".
pub const BROADCAST: &str = "Todos";

/// Status text recorded when a participant registers.
pub const ARRIVAL_NOTICE: &str = "entra na sala...";

/// Status text recorded when a participant is evicted for inactivity.
pub const DEPARTURE_NOTICE: &str = "sai da sala...";

/// A registered presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Unique participant name.
    pub name: String,
    /// Last registration or heartbeat, in milliseconds since the Unix epoch.
    #[serde(rename = "lastStatus")]
    pub last_seen: u64,
}

impl Participant {
    /// Create a participant last seen at `last_seen`.
    #[must_use]
    pub fn new(name: impl Into<String>, last_seen: u64) -> Self {
        Self {
            name: name.into(),
            last_seen,
        }
    }

    /// Whether the participant's last activity is at or before `cutoff`.
    #[must_use]
    pub fn is_stale_at(&self, cutoff: u64) -> bool {
        self.last_seen <= cutoff
    }
}

/// Message variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Public message.
    Message,
    /// Message addressed to one participant.
    PrivateMessage,
    /// System-generated join or departure notice.
    Status,
}

impl MessageKind {
    /// Wire name of the variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Message => "message",
            MessageKind::PrivateMessage => "private_message",
            MessageKind::Status => "status",
        }
    }

    /// Whether clients may send this kind. Status is reserved for the system.
    #[must_use]
    pub fn is_user_sendable(&self) -> bool {
        !matches!(self, MessageKind::Status)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(MessageKind::Message),
            "private_message" => Ok(MessageKind::PrivateMessage),
            "status" => Ok(MessageKind::Status),
            _ => Err("Invalid message type"),
        }
    }
}

/// A chat message. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Sender name, or the subject of a status message.
    pub from: String,
    /// `BROADCAST` or a participant name.
    pub to: String,
    /// Message body.
    pub text: String,
    /// Message variant.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Formatted wall-clock creation time.
    pub time: String,
}

impl Message {
    /// Create a new message.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        text: impl Into<String>,
        kind: MessageKind,
        time: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            text: text.into(),
            kind,
            time: time.into(),
        }
    }

    /// Create a broadcast status message about `subject`.
    #[must_use]
    pub fn status(subject: impl Into<String>, text: impl Into<String>, time: impl Into<String>) -> Self {
        Self::new(subject, BROADCAST, text, MessageKind::Status, time)
    }

    /// Whether the message is addressed to everyone.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.to == BROADCAST
    }

    /// Whether `requester` may read this message.
    ///
    /// A message is visible when it is a broadcast, when it is addressed to
    /// the requester, or when the requester sent it.
    #[must_use]
    pub fn is_visible_to(&self, requester: &str) -> bool {
        self.is_broadcast() || self.to == requester || self.from == requester
    }
}
