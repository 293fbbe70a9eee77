//! Error types for the IMAP engine.

use std::time::Duration;

use thiserror::Error;

use crate::protocol::StateKind;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TLS handshake or encryption error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// Protocol parsing error.
    #[error("Parse error at position {position}: {message}")]
    Parse {
        /// Byte position where the error occurred.
        position: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// Command is not permitted in the current connection state.
    ///
    /// Raised locally; the command never reaches the wire.
    #[error("{command} is not permitted in the {state} state")]
    State {
        /// Name of the rejected command.
        command: &'static str,
        /// State the connection was in.
        state: StateKind,
    },

    /// A rights string contained a character outside the rights alphabet.
    #[error("Invalid rights {rights:?}: unknown right {right:?}")]
    InvalidRights {
        /// The rejected rights string.
        rights: String,
        /// The first offending character.
        right: char,
    },

    /// The mailbox named by the command does not exist.
    #[error("Mailbox does not exist: {0}")]
    MailboxNotFound(String),

    /// Server returned NO response.
    #[error("Server returned NO: {0}")]
    No(String),

    /// Server returned BAD response.
    #[error("Server returned BAD: {0}")]
    Bad(String),

    /// Server sent BYE (disconnecting).
    #[error("Server sent BYE: {0}")]
    Bye(String),

    /// The connection closed before the command completed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// The server completed a tag that no pending command owns.
    #[error("Unexpected tag in tagged completion: {0}")]
    UnexpectedTag(String),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl Error {
    /// Returns `true` if the error was reported by the server
    /// (`NO`, `BAD` or a missing mailbox).
    #[must_use]
    pub const fn is_server_rejection(&self) -> bool {
        matches!(self, Self::No(_) | Self::Bad(_) | Self::MailboxNotFound(_))
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
