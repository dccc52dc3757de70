//! Send-pipeline events and listeners.
//!
//! A host mail pipeline fires one of two events right before a message is
//! transmitted. Both carry an [`Email`], which is either a structured MIME
//! message or an opaque raw one. Listeners only act on MIME messages.
//!
//! # Example
//!
//! ```ignore
//! use mailinline::{Config, Inliner, MessageSending, SendListener};
//!
//! let listeners: Vec<Box<dyn SendListener>> = vec![Box::new(Inliner::new(&Config::new())?)];
//!
//! let mut event = MessageSending::new(message);
//! for listener in &listeners {
//!     listener.on_sending(&mut event)?;
//! }
//! ```

use mailinline_mime::Message;

use crate::error::Result;

/// Pre-rendered message the pipeline sends as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    content: String,
}

impl RawMessage {
    /// Wraps already rendered message text.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Message text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.content
    }
}

/// Message carried by a send event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Email {
    /// Structured message with a part tree.
    Mime(Message),
    /// Opaque message without a part tree.
    Raw(RawMessage),
}

impl Email {
    /// Returns the MIME message, if this is one.
    #[must_use]
    pub const fn as_mime(&self) -> Option<&Message> {
        match self {
            Self::Mime(message) => Some(message),
            Self::Raw(_) => None,
        }
    }

    /// Returns the MIME message mutably, if this is one.
    pub const fn as_mime_mut(&mut self) -> Option<&mut Message> {
        match self {
            Self::Mime(message) => Some(message),
            Self::Raw(_) => None,
        }
    }
}

impl From<Message> for Email {
    fn from(message: Message) -> Self {
        Self::Mime(message)
    }
}

impl From<RawMessage> for Email {
    fn from(message: RawMessage) -> Self {
        Self::Raw(message)
    }
}

/// Fired before the message is handed to a transport.
#[derive(Debug, Clone)]
pub struct MessageSending {
    /// Message about to be sent. Listeners may modify it.
    pub message: Email,
}

impl MessageSending {
    /// Creates the event.
    #[must_use]
    pub fn new(message: impl Into<Email>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Fired by a transport right before transmission.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    message: Email,
    transport: String,
    queued: bool,
}

impl MessageEvent {
    /// Creates the event for the named transport.
    #[must_use]
    pub fn new(message: impl Into<Email>, transport: impl Into<String>, queued: bool) -> Self {
        Self {
            message: message.into(),
            transport: transport.into(),
            queued,
        }
    }

    /// Message about to be sent.
    #[must_use]
    pub const fn message(&self) -> &Email {
        &self.message
    }

    /// Message about to be sent, for modification.
    pub const fn message_mut(&mut self) -> &mut Email {
        &mut self.message
    }

    /// Name of the transport sending the message.
    #[must_use]
    pub fn transport(&self) -> &str {
        &self.transport
    }

    /// Whether the message is being queued rather than sent directly.
    #[must_use]
    pub const fn is_queued(&self) -> bool {
        self.queued
    }

    /// Consumes the event and returns the message.
    #[must_use]
    pub fn into_message(self) -> Email {
        self.message
    }
}

/// Subscriber to send-pipeline events.
///
/// Listeners are shared by every sending thread, so they must be
/// `Send + Sync`. Both callbacks default to doing nothing.
pub trait SendListener: Send + Sync {
    /// Called for [`MessageSending`].
    ///
    /// # Errors
    ///
    /// An error aborts the send.
    fn on_sending(&self, event: &mut MessageSending) -> Result<()> {
        let _ = event;
        Ok(())
    }

    /// Called for [`MessageEvent`].
    ///
    /// # Errors
    ///
    /// An error aborts the send.
    fn on_message(&self, event: &mut MessageEvent) -> Result<()> {
        let _ = event;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailinline_mime::Headers;

    #[test]
    fn test_email_discriminant() {
        let mut mime = Email::from(Message::new(Headers::new()));
        assert!(mime.as_mime().is_some());
        assert!(mime.as_mime_mut().is_some());

        let mut raw = Email::from(RawMessage::new("Subject: x\r\n\r\nbody"));
        assert!(raw.as_mime().is_none());
        assert!(raw.as_mime_mut().is_none());
    }

    #[test]
    fn test_message_event_accessors() {
        let event = MessageEvent::new(RawMessage::new("x"), "smtp", true);
        assert_eq!(event.transport(), "smtp");
        assert!(event.is_queued());
        assert_eq!(event.into_message(), Email::Raw(RawMessage::new("x")));
    }

    #[test]
    fn test_default_listener_is_noop() {
        struct Silent;
        impl SendListener for Silent {}

        let mut event = MessageSending::new(RawMessage::new("x"));
        assert!(Silent.on_sending(&mut event).is_ok());
        assert_eq!(event.message.as_mime(), None);
    }
}
