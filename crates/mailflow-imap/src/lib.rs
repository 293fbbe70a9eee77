//! # mailflow-imap
//!
//! A pipelined IMAP client engine (RFC 9051 / RFC 3501) with RFC 4314
//! access control commands.
//!
//! ## Features
//!
//! - **Pipelining with tag correlation**: commands are issued from `&self`,
//!   written in tag order, and completed out of order by their tags
//! - **Runtime state machine**: every command is checked against the
//!   connection state before it is written
//! - **Response routing**: untagged data reaches the command that asked for
//!   it; the rest updates state or goes to a [`ResponseHandler`]
//! - **ACL commands**: SETACL, DELETEACL, GETACL, MYRIGHTS and LISTRIGHTS
//!   over a compact [`RightSet`]
//! - **TLS via rustls**: secure connections without OpenSSL dependency
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailflow_imap::{Client, Config, RightModification};
//!
//! #[tokio::main]
//! async fn main() -> mailflow_imap::Result<()> {
//!     let client = Client::connect(&Config::new("imap.example.com")).await?;
//!     client.login("user@example.com", "password").await?;
//!
//!     // Both commands are on the wire before either completes.
//!     let grant = client.set_acl("Shared", "bob", RightModification::Add, "lr".parse()?);
//!     let mine = client.my_rights("Shared");
//!     grant.await?;
//!     println!("my rights: {}", mine.await?.rights);
//!
//!     client.logout().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//!                  greeting OK                 greeting PREAUTH
//!                      │                              │
//!                      ▼                              │
//! ┌─────────────────────┐                             │
//! │  NotAuthenticated   │ ── LOGIN OK ──┐             │
//! └─────────────────────┘               ▼             ▼
//!                             ┌─────────────────────────┐
//!                             │      Authenticated      │
//!                             └─────────────────────────┘
//!                               │ SELECT/EXAMINE OK   ▲ CLOSE, UNSELECT,
//!                               ▼                     │ failed SELECT,
//!                             ┌─────────────────────────┐ OK [CLOSED]
//!                             │        Selected         │
//!                             └─────────────────────────┘
//!
//!          any state ── LOGOUT OK or BYE ──▶ Logout (terminal)
//! ```
//!
//! ## Modules
//!
//! - [`acl`]: RFC 4314 access control commands
//! - [`command`]: command model and argument encoding
//! - [`connection`]: configuration, transport and the pipelined client
//! - [`handler`]: unsolicited response callbacks
//! - [`parser`]: sans-I/O response parser
//! - [`pipeline`]: pipelining policy and tag correlation
//! - [`protocol`]: connection state machine
//! - [`types`]: core IMAP types (rights, mailboxes, flags, etc.)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod acl;
pub mod command;
pub mod connection;
mod error;
pub mod handler;
pub mod parser;
pub mod pipeline;
pub mod protocol;
mod router;
pub mod types;

pub use acl::{AclData, ListRightsData, MyRightsData};
pub use command::{Command, TagGenerator};
pub use connection::{Client, CommandFuture, Config, ConfigBuilder, ImapStream, Security};
pub use error::{Error, Result};
pub use handler::{ChannelHandler, LoggingHandler, NoopHandler, ResponseHandler, UnsolicitedEvent};
pub use parser::{Response, ResponseParser, UntaggedResponse};
pub use pipeline::{Completion, PipelineConfig, PipelineSafety};
pub use protocol::{ConnectionState, SelectedState, StateKind};
pub use types::{
    Capability, Flag, Flags, Mailbox, MailboxStatus, ResponseCode, Right, RightModification,
    RightSet, Status, Tag,
};

/// IMAP protocol version supported.
pub const IMAP_VERSION: &str = "IMAP4rev2";
