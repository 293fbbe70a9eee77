//! Core IMAP types.
//!
//! Value types shared by the command model, the parser and the connection
//! engine. [`RightSet`] is the RFC 4314 access-rights value; the rest model
//! tags, mailboxes, flags and response codes.

#![allow(clippy::missing_const_for_fn)]

mod capability;
mod flags;
mod identifiers;
mod mailbox;
mod response_code;
mod rights;

pub use capability::{Capability, Status};
pub use flags::{Flag, Flags};
pub use identifiers::{SeqNum, Tag, Uid, UidValidity};
pub use mailbox::{Mailbox, MailboxStatus};
pub use response_code::ResponseCode;
pub use rights::{Right, RightModification, RightSet};
