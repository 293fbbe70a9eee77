//! Response codes.

use super::{Capability, Flag, SeqNum, Uid, UidValidity};

/// Bracketed response code carried by a status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// ALERT: text that must be shown to the user.
    Alert,
    /// CAPABILITY list embedded in a status response.
    Capability(Vec<Capability>),
    /// PARSE: the server failed to parse a message.
    Parse,
    /// PERMANENTFLAGS: flags that can be changed permanently.
    PermanentFlags(Vec<Flag>),
    /// READ-ONLY: mailbox selected as read-only.
    ReadOnly,
    /// READ-WRITE: mailbox selected as read-write.
    ReadWrite,
    /// TRYCREATE: target mailbox does not exist but could be created.
    TryCreate,
    /// NONEXISTENT (RFC 5530): the mailbox does not exist.
    NonExistent,
    /// NOPERM (RFC 5530): the principal lacks the required right.
    NoPerm,
    /// CLOSED (RFC 7162): the previously selected mailbox is now closed.
    Closed,
    /// UIDNEXT: next UID to be assigned.
    UidNext(Uid),
    /// UIDVALIDITY: unique identifier validity value.
    UidValidity(UidValidity),
    /// UNSEEN: first unseen message sequence number.
    Unseen(SeqNum),
    /// HIGHESTMODSEQ: highest mod-sequence value.
    HighestModSeq(u64),
    /// Unknown response code.
    Unknown(String),
}

impl ResponseCode {
    /// Returns `true` for codes that report a missing mailbox.
    #[must_use]
    pub const fn is_missing_mailbox(&self) -> bool {
        matches!(self, Self::NonExistent | Self::TryCreate)
    }
}
