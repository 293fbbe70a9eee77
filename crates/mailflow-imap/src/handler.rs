//! Unsolicited response handling.
//!
//! Servers may send untagged data at any time (RFC 9051 section 7). Mailbox
//! updates and status responses that no in-flight command claims are passed
//! to a [`ResponseHandler`] owned by the connection's reader task.
//!
//! # Example
//!
//! ```
//! use mailflow_imap::handler::ResponseHandler;
//!
//! struct Counter {
//!     exists: u32,
//! }
//!
//! impl ResponseHandler for Counter {
//!     fn on_exists(&mut self, count: u32) {
//!         self.exists = count;
//!     }
//! }
//! ```

use tokio::sync::mpsc;

use crate::parser::UntaggedResponse;
use crate::types::{Flags, SeqNum};

/// Handler for unsolicited server responses.
///
/// Every method has a no-op default. Callbacks run on the reader task, so
/// they should return quickly.
pub trait ResponseHandler: Send {
    /// Called when the message count changes (EXISTS response).
    fn on_exists(&mut self, count: u32) {
        let _ = count;
    }

    /// Called when a message is expunged (EXPUNGE response).
    ///
    /// The sequence number refers to the message's position before removal.
    fn on_expunge(&mut self, seq: SeqNum) {
        let _ = seq;
    }

    /// Called when the available flags for the mailbox change.
    fn on_flags(&mut self, flags: &Flags) {
        let _ = flags;
    }

    /// Called when the recent count changes.
    fn on_recent(&mut self, count: u32) {
        let _ = count;
    }

    /// Called when the server is closing the connection (BYE response).
    fn on_bye(&mut self, text: &str) {
        let _ = text;
    }

    /// Called when the server sends an ALERT response code.
    ///
    /// ALERT text must be shown to the user (RFC 9051 section 7.1).
    fn on_alert(&mut self, text: &str) {
        let _ = text;
    }

    /// Called for untagged OK responses with informational text.
    fn on_ok(&mut self, text: &str) {
        let _ = text;
    }

    /// Called for untagged NO responses (warnings).
    fn on_no(&mut self, text: &str) {
        let _ = text;
    }

    /// Called for untagged BAD responses.
    fn on_bad(&mut self, text: &str) {
        let _ = text;
    }
}

/// Routes an unclaimed response to the matching callback.
///
/// Returns `false` if the handler has no callback for the response.
pub(crate) fn dispatch(handler: &mut dyn ResponseHandler, response: &UntaggedResponse) -> bool {
    match response {
        UntaggedResponse::Exists(count) => handler.on_exists(*count),
        UntaggedResponse::Recent(count) => handler.on_recent(*count),
        UntaggedResponse::Expunge(seq) => handler.on_expunge(*seq),
        UntaggedResponse::Flags(flags) => handler.on_flags(flags),
        UntaggedResponse::Ok { text, .. } => handler.on_ok(text),
        UntaggedResponse::No { text, .. } => handler.on_no(text),
        UntaggedResponse::Bad { text, .. } => handler.on_bad(text),
        UntaggedResponse::Bye { text, .. } => handler.on_bye(text),
        _ => return false,
    }
    true
}

/// A no-op handler that ignores all unsolicited responses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl ResponseHandler for NoopHandler {}

/// A handler that logs unsolicited responses using tracing.
///
/// This is the default handler of a new connection.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ResponseHandler for LoggingHandler {
    fn on_exists(&mut self, count: u32) {
        tracing::debug!(count, "EXISTS");
    }

    fn on_expunge(&mut self, seq: SeqNum) {
        tracing::debug!(seq = seq.get(), "EXPUNGE");
    }

    fn on_flags(&mut self, flags: &Flags) {
        tracing::debug!(?flags, "FLAGS");
    }

    fn on_recent(&mut self, count: u32) {
        tracing::debug!(count, "RECENT");
    }

    fn on_bye(&mut self, text: &str) {
        tracing::info!(text, "BYE");
    }

    fn on_alert(&mut self, text: &str) {
        tracing::warn!(text, "ALERT");
    }

    fn on_ok(&mut self, text: &str) {
        tracing::trace!(text, "OK");
    }

    fn on_no(&mut self, text: &str) {
        tracing::warn!(text, "NO");
    }

    fn on_bad(&mut self, text: &str) {
        tracing::error!(text, "BAD");
    }
}

/// Unsolicited event, as forwarded by [`ChannelHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnsolicitedEvent {
    /// Message count changed.
    Exists(u32),
    /// Message expunged.
    Expunge(SeqNum),
    /// Available flags changed.
    Flags(Flags),
    /// Recent count changed.
    Recent(u32),
    /// Server closing connection.
    Bye(String),
    /// Alert message.
    Alert(String),
    /// OK status.
    Ok(String),
    /// NO status.
    No(String),
    /// BAD status.
    Bad(String),
}

/// A handler that forwards events over a channel.
///
/// Lets another task observe unsolicited data while the reader task owns the
/// handler.
#[derive(Debug, Clone)]
pub struct ChannelHandler {
    sender: mpsc::UnboundedSender<UnsolicitedEvent>,
}

impl ChannelHandler {
    /// Creates a handler and the receiving end of its event channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UnsolicitedEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn send(&self, event: UnsolicitedEvent) {
        // The receiver going away just means nobody listens any more.
        let _ = self.sender.send(event);
    }
}

impl ResponseHandler for ChannelHandler {
    fn on_exists(&mut self, count: u32) {
        self.send(UnsolicitedEvent::Exists(count));
    }

    fn on_expunge(&mut self, seq: SeqNum) {
        self.send(UnsolicitedEvent::Expunge(seq));
    }

    fn on_flags(&mut self, flags: &Flags) {
        self.send(UnsolicitedEvent::Flags(flags.clone()));
    }

    fn on_recent(&mut self, count: u32) {
        self.send(UnsolicitedEvent::Recent(count));
    }

    fn on_bye(&mut self, text: &str) {
        self.send(UnsolicitedEvent::Bye(text.to_string()));
    }

    fn on_alert(&mut self, text: &str) {
        self.send(UnsolicitedEvent::Alert(text.to_string()));
    }

    fn on_ok(&mut self, text: &str) {
        self.send(UnsolicitedEvent::Ok(text.to_string()));
    }

    fn on_no(&mut self, text: &str) {
        self.send(UnsolicitedEvent::No(text.to_string()));
    }

    fn on_bad(&mut self, text: &str) {
        self.send(UnsolicitedEvent::Bad(text.to_string()));
    }
}
