//! Parsing of client command lines.
//!
//! Commands parse into the client's own [`Command`] model, so both ends of
//! a test agree on names, arguments and permitted states.

use mailflow_imap::parser::lexer::is_astring_char;
use mailflow_imap::parser::Lexer;
use mailflow_imap::{Command, Mailbox, RightModification};

/// A command line the server could not make sense of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Tag of the line, when one could be read.
    pub tag: Option<String>,
    /// Text for the `BAD` response.
    pub reason: String,
}

impl Rejection {
    fn new(tag: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            tag: tag.map(str::to_string),
            reason: reason.into(),
        }
    }
}

/// Parses one framed command, literals inlined.
pub fn parse(line: &[u8]) -> Result<(String, Command), Rejection> {
    let mut lexer = Lexer::new(line);
    let tag = read_tag(&mut lexer).ok_or_else(|| Rejection::new(None, "Missing tag"))?;
    let tagged = |reason: String| Rejection::new(Some(tag.as_str()), reason);

    lexer
        .expect_space()
        .map_err(|_| tagged("Missing command".into()))?;
    let name = lexer
        .read_atom_string()
        .map_err(|_| tagged("Missing command".into()))?
        .to_ascii_uppercase();

    let command = arguments(&mut lexer, &name).map_err(tagged)?;
    match lexer.next_token() {
        Ok(token) if token.ends_line() => Ok((tag, command)),
        _ => Err(tagged(format!("Unexpected arguments to {name}"))),
    }
}

/// A tag is any run of astring characters except `+`.
fn read_tag(lexer: &mut Lexer<'_>) -> Option<String> {
    let mut tag = Vec::new();
    while let Some(b) = lexer.peek() {
        if !is_astring_char(b) || b == b'+' {
            break;
        }
        tag.push(b);
        lexer.advance();
    }
    if tag.is_empty() {
        return None;
    }
    String::from_utf8(tag).ok()
}

fn arguments(lexer: &mut Lexer<'_>, name: &str) -> Result<Command, String> {
    let mut arg = || -> Result<String, String> {
        let invalid = |_| format!("Missing or invalid argument to {name}");
        lexer.expect_space().map_err(invalid)?;
        lexer.read_astring().map_err(invalid)
    };

    let command = match name {
        "CAPABILITY" => Command::Capability,
        "NOOP" => Command::Noop,
        "LOGOUT" => Command::Logout,
        "CLOSE" => Command::Close,
        "UNSELECT" => Command::Unselect,
        "LOGIN" => Command::Login {
            username: arg()?,
            password: arg()?,
        },
        "SELECT" => Command::Select {
            mailbox: Mailbox::new(arg()?),
        },
        "EXAMINE" => Command::Examine {
            mailbox: Mailbox::new(arg()?),
        },
        "CREATE" => Command::Create {
            mailbox: Mailbox::new(arg()?),
        },
        "DELETE" => Command::Delete {
            mailbox: Mailbox::new(arg()?),
        },
        "SETACL" => {
            let mailbox = Mailbox::new(arg()?);
            let identifier = arg()?;
            let (modification, rights) = RightModification::split_prefix(&arg()?)
                .map_err(|err| format!("Invalid rights: {err}"))?;
            Command::SetAcl {
                mailbox,
                identifier,
                modification,
                rights,
            }
        }
        "DELETEACL" => Command::DeleteAcl {
            mailbox: Mailbox::new(arg()?),
            identifier: arg()?,
        },
        "GETACL" => Command::GetAcl {
            mailbox: Mailbox::new(arg()?),
        },
        "LISTRIGHTS" => Command::ListRights {
            mailbox: Mailbox::new(arg()?),
            identifier: arg()?,
        },
        "MYRIGHTS" => Command::MyRights {
            mailbox: Mailbox::new(arg()?),
        },
        _ => return Err(format!("Unknown command {name}")),
    };
    Ok(command)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mailflow_imap::RightSet;

    use super::*;

    #[test]
    fn parses_acl_commands() {
        let (tag, command) = parse(b"M0007 SETACL MyFolder testuser -iwc\r\n").unwrap();
        assert_eq!(tag, "M0007");
        assert_eq!(
            command,
            Command::SetAcl {
                mailbox: Mailbox::new("MyFolder"),
                identifier: "testuser".into(),
                modification: RightModification::Remove,
                rights: "iwc".parse().unwrap(),
            }
        );

        let (_, command) = parse(b"a1 listrights \"My Folder\" anyone\r\n").unwrap();
        assert_eq!(
            command,
            Command::ListRights {
                mailbox: Mailbox::new("My Folder"),
                identifier: "anyone".into(),
            }
        );
    }

    #[test]
    fn empty_rights_replace() {
        let (_, command) = parse(b"M0001 SETACL BibiMailbox testuser \"\"\r\n").unwrap();
        match command {
            Command::SetAcl {
                modification,
                rights,
                ..
            } => {
                assert_eq!(modification, RightModification::Replace);
                assert_eq!(rights, RightSet::EMPTY);
            }
            other => panic!("expected SETACL, got {other:?}"),
        }
    }

    #[test]
    fn literal_arguments_are_inlined() {
        let (_, command) = parse("M0001 LOGIN {5}\r\nj\u{f6}rg pw\r\n".as_bytes()).unwrap();
        assert_eq!(
            command,
            Command::Login {
                username: "j\u{f6}rg".into(),
                password: "pw".into(),
            }
        );
    }

    #[test]
    fn rejections_keep_the_tag() {
        let err = parse(b"M0001 FROBNICATE\r\n").unwrap_err();
        assert_eq!(err.tag.as_deref(), Some("M0001"));
        assert!(err.reason.contains("FROBNICATE"));

        let err = parse(b"M0002 GETACL\r\n").unwrap_err();
        assert_eq!(err.tag.as_deref(), Some("M0002"));

        let err = parse(b"M0003 NOOP extra\r\n").unwrap_err();
        assert!(err.reason.contains("NOOP"));

        let err = parse(b"M0004 SETACL Box fred lrz\r\n").unwrap_err();
        assert!(err.reason.starts_with("Invalid rights"));

        let err = parse(b"\r\n").unwrap_err();
        assert_eq!(err.tag, None);
    }
}
