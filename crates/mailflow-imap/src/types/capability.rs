//! Server capabilities and response status.

/// Response status from a tagged or untagged status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting (pre-authenticated).
    PreAuth,
    /// Server is closing connection.
    Bye,
}

impl Status {
    /// Returns true if this is a successful status.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }

    /// Returns the status keyword as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::No => "NO",
            Self::Bad => "BAD",
            Self::PreAuth => "PREAUTH",
            Self::Bye => "BYE",
        }
    }
}

/// Server capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// `IMAP4rev2` (RFC 9051)
    Imap4Rev2,
    /// ACL extension (RFC 4314)
    Acl,
    /// Additional rights advertised with `RIGHTS=` (RFC 4314 section 2.1)
    Rights(String),
    /// LITERAL+ extension (RFC 7888)
    LiteralPlus,
    /// LITERAL- extension (RFC 7888)
    LiteralMinus,
    /// UNSELECT command (RFC 3691)
    Unselect,
    /// IDLE command support (RFC 2177)
    Idle,
    /// STARTTLS support
    StartTls,
    /// LOGIN disabled
    LoginDisabled,
    /// AUTH mechanism
    Auth(String),
    /// Unknown capability
    Unknown(String),
}

impl Capability {
    /// Parses a capability string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IMAP4REV2" => Self::Imap4Rev2,
            "ACL" => Self::Acl,
            "LITERAL+" => Self::LiteralPlus,
            "LITERAL-" => Self::LiteralMinus,
            "UNSELECT" => Self::Unselect,
            "IDLE" => Self::Idle,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            _ if upper.starts_with("AUTH=") => Self::Auth(s[5..].to_string()),
            _ if upper.starts_with("RIGHTS=") => Self::Rights(s[7..].to_string()),
            _ => Self::Unknown(s.to_string()),
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::Imap4Rev2 => write!(f, "IMAP4rev2"),
            Self::Acl => write!(f, "ACL"),
            Self::Rights(extra) => write!(f, "RIGHTS={extra}"),
            Self::LiteralPlus => write!(f, "LITERAL+"),
            Self::LiteralMinus => write!(f, "LITERAL-"),
            Self::Unselect => write!(f, "UNSELECT"),
            Self::Idle => write!(f, "IDLE"),
            Self::StartTls => write!(f, "STARTTLS"),
            Self::LoginDisabled => write!(f, "LOGINDISABLED"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_ok() {
        assert!(Status::Ok.is_ok());
        assert!(Status::PreAuth.is_ok());
        assert!(!Status::No.is_ok());
        assert!(!Status::Bad.is_ok());
        assert!(!Status::Bye.is_ok());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Capability::parse("imap4rev1"), Capability::Imap4Rev1);
        assert_eq!(Capability::parse("acl"), Capability::Acl);
        assert_eq!(Capability::parse("Literal+"), Capability::LiteralPlus);
    }

    #[test]
    fn parse_parameterised() {
        assert_eq!(
            Capability::parse("AUTH=PLAIN"),
            Capability::Auth("PLAIN".to_string())
        );
        assert_eq!(
            Capability::parse("RIGHTS=texk"),
            Capability::Rights("texk".to_string())
        );
    }

    #[test]
    fn parse_unknown_keeps_original_case() {
        assert_eq!(
            Capability::parse("XSomething"),
            Capability::Unknown("XSomething".to_string())
        );
    }

    #[test]
    fn display_matches_wire_form() {
        assert_eq!(Capability::Acl.to_string(), "ACL");
        assert_eq!(Capability::Rights("texk".into()).to_string(), "RIGHTS=texk");
        assert_eq!(Capability::LiteralPlus.to_string(), "LITERAL+");
    }
}
