//! Response data types.

use crate::types::{Capability, Flags, Mailbox, ResponseCode, RightSet, SeqNum};

/// Untagged server data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// `* OK`.
    Ok {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* NO`.
    No {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* BAD`.
    Bad {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* PREAUTH` greeting.
    PreAuth {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* BYE`.
    Bye {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* CAPABILITY`.
    Capability(Vec<Capability>),
    /// `* FLAGS`.
    Flags(Flags),
    /// `* n EXISTS`.
    Exists(u32),
    /// `* n RECENT`.
    Recent(u32),
    /// `* n EXPUNGE`.
    Expunge(SeqNum),
    /// `* ACL` (RFC 4314 section 3.6).
    Acl {
        /// Mailbox the list applies to.
        mailbox: Mailbox,
        /// Identifier and rights pairs in wire order.
        entries: Vec<(String, RightSet)>,
    },
    /// `* LISTRIGHTS` (RFC 4314 section 3.7).
    ListRights {
        /// Mailbox the answer applies to.
        mailbox: Mailbox,
        /// Identifier that was asked about.
        identifier: String,
        /// Rights always granted to the identifier.
        required: RightSet,
        /// Groups of rights that can be granted, each all-or-nothing.
        optional: Vec<RightSet>,
    },
    /// `* MYRIGHTS` (RFC 4314 section 3.8).
    MyRights {
        /// Mailbox the rights apply to.
        mailbox: Mailbox,
        /// Rights of the authenticated user.
        rights: RightSet,
    },
    /// Any other untagged response, kept unparsed.
    Other {
        /// Response keyword (upper-cased), e.g. `LIST` or `FETCH`.
        name: String,
        /// Rest of the line.
        text: String,
    },
}

/// Classification of untagged responses used for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// `* OK`.
    Ok,
    /// `* NO`.
    No,
    /// `* BAD`.
    Bad,
    /// `* PREAUTH`.
    PreAuth,
    /// `* BYE`.
    Bye,
    /// `* CAPABILITY`.
    Capability,
    /// `* FLAGS`.
    Flags,
    /// `* n EXISTS`.
    Exists,
    /// `* n RECENT`.
    Recent,
    /// `* n EXPUNGE`.
    Expunge,
    /// `* ACL`.
    Acl,
    /// `* LISTRIGHTS`.
    ListRights,
    /// `* MYRIGHTS`.
    MyRights,
    /// Anything else.
    Other,
}

impl ResponseKind {
    /// Maps the keyword of an untagged response to its kind.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_uppercase().as_str() {
            "OK" => Self::Ok,
            "NO" => Self::No,
            "BAD" => Self::Bad,
            "PREAUTH" => Self::PreAuth,
            "BYE" => Self::Bye,
            "CAPABILITY" => Self::Capability,
            "FLAGS" => Self::Flags,
            "EXISTS" => Self::Exists,
            "RECENT" => Self::Recent,
            "EXPUNGE" => Self::Expunge,
            "ACL" => Self::Acl,
            "LISTRIGHTS" => Self::ListRights,
            "MYRIGHTS" => Self::MyRights,
            _ => Self::Other,
        }
    }
}

impl UntaggedResponse {
    /// Returns the routing kind of this response.
    #[must_use]
    pub const fn kind(&self) -> ResponseKind {
        match self {
            Self::Ok { .. } => ResponseKind::Ok,
            Self::No { .. } => ResponseKind::No,
            Self::Bad { .. } => ResponseKind::Bad,
            Self::PreAuth { .. } => ResponseKind::PreAuth,
            Self::Bye { .. } => ResponseKind::Bye,
            Self::Capability(_) => ResponseKind::Capability,
            Self::Flags(_) => ResponseKind::Flags,
            Self::Exists(_) => ResponseKind::Exists,
            Self::Recent(_) => ResponseKind::Recent,
            Self::Expunge(_) => ResponseKind::Expunge,
            Self::Acl { .. } => ResponseKind::Acl,
            Self::ListRights { .. } => ResponseKind::ListRights,
            Self::MyRights { .. } => ResponseKind::MyRights,
            Self::Other { .. } => ResponseKind::Other,
        }
    }

    /// Returns the mailbox the response names, if it names one.
    #[must_use]
    pub const fn mailbox(&self) -> Option<&Mailbox> {
        match self {
            Self::Acl { mailbox, .. }
            | Self::ListRights { mailbox, .. }
            | Self::MyRights { mailbox, .. } => Some(mailbox),
            _ => None,
        }
    }

    /// Returns the response code of a status response.
    #[must_use]
    pub const fn code(&self) -> Option<&ResponseCode> {
        match self {
            Self::Ok { code, .. }
            | Self::No { code, .. }
            | Self::Bad { code, .. }
            | Self::PreAuth { code, .. }
            | Self::Bye { code, .. } => code.as_ref(),
            _ => None,
        }
    }
}
