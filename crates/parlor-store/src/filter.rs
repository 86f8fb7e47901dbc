//! Query filters and patches.
//!
//! Filters are evaluated by the backend. A backend may use them as index
//! hints (e.g. name lookups) but must return exactly the records for which
//! `matches` holds.

use parlor_protocol::{Message, Participant};

/// Selects participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantFilter {
    /// Every participant.
    All,
    /// The participant with exactly this name (case-sensitive).
    Name(String),
    /// Participants whose last activity is at or before the cutoff (ms).
    LastSeenAtOrBefore(u64),
}

impl ParticipantFilter {
    /// Filter on an exact name.
    #[must_use]
    pub fn by_name(name: impl Into<String>) -> Self {
        ParticipantFilter::Name(name.into())
    }

    /// Filter on staleness at `cutoff`.
    #[must_use]
    pub fn stale_at(cutoff: u64) -> Self {
        ParticipantFilter::LastSeenAtOrBefore(cutoff)
    }

    /// Check whether a participant matches this filter.
    #[must_use]
    pub fn matches(&self, participant: &Participant) -> bool {
        match self {
            ParticipantFilter::All => true,
            ParticipantFilter::Name(name) => participant.name == *name,
            ParticipantFilter::LastSeenAtOrBefore(cutoff) => participant.is_stale_at(*cutoff),
        }
    }
}

/// Partial update of a participant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantPatch {
    /// New last-seen timestamp (ms).
    pub last_seen: Option<u64>,
}

impl ParticipantPatch {
    /// Patch that only refreshes `last_seen`.
    #[must_use]
    pub fn touch(now: u64) -> Self {
        Self {
            last_seen: Some(now),
        }
    }

    /// Apply the patch in place.
    pub fn apply(&self, participant: &mut Participant) {
        if let Some(last_seen) = self.last_seen {
            participant.last_seen = last_seen;
        }
    }
}

/// Selects messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageFilter {
    /// Every message.
    All,
    /// Messages the named participant may read.
    VisibleTo(String),
}

impl MessageFilter {
    /// Filter on visibility for `requester`.
    #[must_use]
    pub fn visible_to(requester: impl Into<String>) -> Self {
        MessageFilter::VisibleTo(requester.into())
    }

    /// Check whether a message matches this filter.
    #[must_use]
    pub fn matches(&self, message: &Message) -> bool {
        match self {
            MessageFilter::All => true,
            MessageFilter::VisibleTo(requester) => message.is_visible_to(requester),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_protocol::{MessageKind, BROADCAST};

    #[test]
    fn test_name_filter_is_exact() {
        let alice = Participant::new("Alice", 0);
        assert!(ParticipantFilter::by_name("Alice").matches(&alice));
        assert!(!ParticipantFilter::by_name("alice").matches(&alice));
        assert!(!ParticipantFilter::by_name("Alice ").matches(&alice));
    }

    #[test]
    fn test_stale_filter_boundary() {
        let filter = ParticipantFilter::stale_at(10_000);
        assert!(filter.matches(&Participant::new("a", 9_999)));
        assert!(filter.matches(&Participant::new("b", 10_000)));
        assert!(!filter.matches(&Participant::new("c", 10_001)));
    }

    #[test]
    fn test_patch_touch() {
        let mut alice = Participant::new("Alice", 5);
        ParticipantPatch::touch(42).apply(&mut alice);
        assert_eq!(alice, Participant::new("Alice", 42));

        ParticipantPatch::default().apply(&mut alice);
        assert_eq!(alice.last_seen, 42);
    }

    #[test]
    fn test_visibility_filter() {
        let filter = MessageFilter::visible_to("Carol");
        let public = Message::new("Bob", BROADCAST, "hi", MessageKind::Message, "t");
        let private = Message::new("Bob", "Alice", "psst", MessageKind::PrivateMessage, "t");

        assert!(filter.matches(&public));
        assert!(!filter.matches(&private));
        assert!(MessageFilter::All.matches(&private));
    }
}
