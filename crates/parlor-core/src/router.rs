//! Message router for Parlor.
//!
//! The router creates messages, checks that senders hold an active presence,
//! and answers visibility-filtered reads. It keeps no state between calls:
//! every read goes back to the store.

use crate::clock::{format_time, Clock};
use crate::error::ChatError;
use parlor_protocol::{Message, MessageKind, BROADCAST};
use parlor_store::{MessageFilter, ParticipantFilter, Store};
use std::sync::Arc;
use tracing::{debug, trace};

/// Parse the textual `limit` of a message read.
///
/// Absent means unbounded. Anything other than a positive integer is a
/// validation error.
///
/// # Errors
///
/// Returns `ChatError::Validation` for non-numeric, zero, or negative values.
pub fn parse_limit(raw: Option<&str>) -> Result<Option<usize>, ChatError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().parse::<usize>() {
        Ok(limit) if limit > 0 => Ok(Some(limit)),
        _ => Err(ChatError::Validation(format!(
            "limit must be a positive integer, got {:?}",
            raw
        ))),
    }
}

fn require(field: &str, value: &str) -> Result<(), ChatError> {
    if value.trim().is_empty() {
        return Err(ChatError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Creates and reads messages.
#[derive(Debug, Clone)]
pub struct MessageRouter {
    store: Store,
    clock: Arc<dyn Clock>,
}

impl MessageRouter {
    /// Create a router over the given store.
    #[must_use]
    pub fn new(store: Store, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Send a message on behalf of a registered participant.
    ///
    /// `kind` must be `message` or `private_message`; status messages are
    /// reserved for the system.
    ///
    /// # Errors
    ///
    /// - `Validation` if a field is empty or `kind` is not user-sendable
    /// - `UnauthorizedSender` if `from` is not a registered participant
    /// - `Store` if the store fails
    pub async fn send(&self, from: &str, to: &str, text: &str, kind: &str) -> Result<(), ChatError> {
        require("from", from)?;
        require("to", to)?;
        require("text", text)?;
        require("type", kind)?;

        let kind: MessageKind = kind
            .parse()
            .map_err(|e: &str| ChatError::Validation(e.to_string()))?;
        if !kind.is_user_sendable() {
            return Err(ChatError::Validation(format!(
                "type must be message or private_message, got {}",
                kind
            )));
        }

        let sender = self
            .store
            .participants
            .find_one(&ParticipantFilter::by_name(from))
            .await?;
        if sender.is_none() {
            return Err(ChatError::UnauthorizedSender(from.to_string()));
        }

        let message = Message::new(from, to, text, kind, self.now());
        self.store.messages.insert(message).await?;

        debug!(from = %from, to = %to, kind = %kind, "Message sent");
        Ok(())
    }

    /// Messages visible to `requester`, oldest first.
    ///
    /// A message is visible when it is broadcast, addressed to the requester,
    /// or sent by the requester. With a limit, only the newest `limit`
    /// visible messages are returned.
    ///
    /// # Errors
    ///
    /// - `Validation` if `limit` is zero
    /// - `Store` if the store fails
    pub async fn list(&self, requester: &str, limit: Option<usize>) -> Result<Vec<Message>, ChatError> {
        if limit == Some(0) {
            return Err(ChatError::Validation(
                "limit must be a positive integer, got 0".to_string(),
            ));
        }

        let messages = self
            .store
            .messages
            .find(&MessageFilter::visible_to(requester), limit)
            .await?;

        trace!(requester = %requester, ?limit, count = messages.len(), "Listed messages");
        Ok(messages)
    }

    /// Record a broadcast status message about `subject`.
    ///
    /// No presence check is made: the subject may already be gone.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the store fails.
    pub async fn emit_status(&self, subject: &str, text: &str) -> Result<(), ChatError> {
        let message = Message::status(subject, text, self.now());
        self.store.messages.insert(message).await?;
        debug!(subject = %subject, text = %text, to = BROADCAST, "Status emitted");
        Ok(())
    }

    /// Record one status message per subject in a single batch.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the store fails.
    pub async fn emit_statuses<I, S>(&self, subjects: I, text: &str) -> Result<usize, ChatError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let time = self.now();
        let batch: Vec<Message> = subjects
            .into_iter()
            .map(|subject| Message::status(subject, text, time.clone()))
            .collect();
        let count = batch.len();
        if count > 0 {
            self.store.messages.insert_many(batch).await?;
            debug!(count, text = %text, "Status batch emitted");
        }
        Ok(count)
    }

    fn now(&self) -> String {
        format_time(self.clock.now_millis())
    }
}
