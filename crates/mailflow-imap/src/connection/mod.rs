//! IMAP connection management.
//!
//! This module provides connection handling for IMAP servers, including:
//! - Configuration (host, port, security mode, pipelining)
//! - TLS/plaintext stream abstraction
//! - Framed I/O for IMAP protocol
//! - The pipelined [`Client`] and its [`CommandFuture`]s

mod client;
mod config;
mod framed;
mod future;
mod shared;
mod stream;

pub use client::Client;
pub use config::{Config, ConfigBuilder, DEFAULT_TAG_PREFIX, Security};
pub use framed::{FramedReader, FramedWriter};
pub use future::CommandFuture;
pub(crate) use shared::Shared;
pub use stream::{ImapStream, connect, create_tls_connector};
