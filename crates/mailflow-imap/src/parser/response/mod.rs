//! IMAP response parser.

#![allow(clippy::missing_errors_doc)]

mod helpers;
mod types;

pub use types::{ResponseKind, UntaggedResponse};

use crate::parser::lexer::{Lexer, Token};
use crate::types::{Mailbox, ResponseCode, SeqNum, Status, Tag};
use crate::{Error, Result};

use helpers::{
    parse_acl_data, parse_capability_data, parse_flag_list, parse_listrights_data,
    parse_myrights_data, parse_response_code, read_text_until_crlf,
};

/// A parsed IMAP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Tagged response (command completion).
    Tagged {
        /// The command tag.
        tag: Tag,
        /// Response status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Untagged response (server data).
    Untagged(UntaggedResponse),
    /// Continuation request.
    Continuation {
        /// Optional text/data.
        text: Option<String>,
    },
}

/// Response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one complete response unit.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => Self::parse_untagged(&mut lexer),
            Token::Plus => Ok(Self::parse_continuation(&mut lexer)),
            Token::Atom(tag) => Self::parse_tagged(&mut lexer, tag),
            token => Err(Error::Parse {
                position: 0,
                message: format!("Expected *, +, or tag, got {token:?}"),
            }),
        }
    }

    /// Identifies an untagged response without parsing its data.
    ///
    /// Returns the routing kind and, for ACL data, the mailbox named, so a
    /// line that fails [`ResponseParser::parse`] can still be charged to the
    /// command waiting for it. Returns `None` for anything not untagged.
    #[must_use]
    pub fn identify_untagged(input: &[u8]) -> Option<(ResponseKind, Option<Mailbox>)> {
        let mut lexer = Lexer::new(input);
        if !matches!(lexer.next_token(), Ok(Token::Asterisk)) {
            return None;
        }
        lexer.expect_space().ok()?;
        let kind = match lexer.next_token().ok()? {
            Token::Atom(keyword) => ResponseKind::from_keyword(keyword),
            Token::Number(_) => {
                lexer.expect_space().ok()?;
                ResponseKind::from_keyword(lexer.read_atom_string().ok()?)
            }
            _ => return None,
        };
        let mailbox = match kind {
            ResponseKind::Acl | ResponseKind::ListRights | ResponseKind::MyRights => lexer
                .expect_space()
                .and_then(|()| lexer.read_astring())
                .ok()
                .map(Mailbox::new),
            _ => None,
        };
        Some((kind, mailbox))
    }

    fn parse_tagged(lexer: &mut Lexer<'_>, tag: &str) -> Result<Response> {
        lexer.expect_space()?;
        let status = Self::parse_status(lexer)?;
        let (code, text) = Self::parse_resp_text(lexer)?;

        Ok(Response::Tagged {
            tag: Tag::new(tag),
            status,
            code,
            text,
        })
    }

    fn parse_untagged(lexer: &mut Lexer<'_>) -> Result<Response> {
        lexer.expect_space()?;

        let untagged = match lexer.next_token()? {
            Token::Atom(s) => {
                let upper = s.to_uppercase();
                match upper.as_str() {
                    "OK" | "NO" | "BAD" | "PREAUTH" | "BYE" => {
                        let (code, text) = Self::parse_resp_text(lexer)?;
                        match upper.as_str() {
                            "OK" => UntaggedResponse::Ok { code, text },
                            "NO" => UntaggedResponse::No { code, text },
                            "BAD" => UntaggedResponse::Bad { code, text },
                            "PREAUTH" => UntaggedResponse::PreAuth { code, text },
                            _ => UntaggedResponse::Bye { code, text },
                        }
                    }
                    "CAPABILITY" => UntaggedResponse::Capability(parse_capability_data(lexer)?),
                    "FLAGS" => {
                        lexer.expect_space()?;
                        UntaggedResponse::Flags(parse_flag_list(lexer)?)
                    }
                    "ACL" => {
                        lexer.expect_space()?;
                        let (mailbox, entries) = parse_acl_data(lexer)?;
                        UntaggedResponse::Acl { mailbox, entries }
                    }
                    "LISTRIGHTS" => {
                        lexer.expect_space()?;
                        let (mailbox, identifier, required, optional) =
                            parse_listrights_data(lexer)?;
                        UntaggedResponse::ListRights {
                            mailbox,
                            identifier,
                            required,
                            optional,
                        }
                    }
                    "MYRIGHTS" => {
                        lexer.expect_space()?;
                        let (mailbox, rights) = parse_myrights_data(lexer)?;
                        UntaggedResponse::MyRights { mailbox, rights }
                    }
                    _ => Self::other(lexer, upper),
                }
            }
            Token::Number(n) => {
                lexer.expect_space()?;
                let keyword = lexer.read_atom_string()?.to_uppercase();
                match keyword.as_str() {
                    "EXISTS" => UntaggedResponse::Exists(n),
                    "RECENT" => UntaggedResponse::Recent(n),
                    "EXPUNGE" => UntaggedResponse::Expunge(
                        SeqNum::new(n).ok_or_else(|| lexer.error("Invalid sequence number 0"))?,
                    ),
                    _ => Self::other(lexer, keyword),
                }
            }
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("Unexpected token in untagged response: {token:?}"),
                });
            }
        };

        Ok(Response::Untagged(untagged))
    }

    fn other(lexer: &mut Lexer<'_>, name: String) -> UntaggedResponse {
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }
        let text = read_text_until_crlf(lexer);
        UntaggedResponse::Other { name, text }
    }

    fn parse_continuation(lexer: &mut Lexer<'_>) -> Response {
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }
        let text = read_text_until_crlf(lexer);

        Response::Continuation {
            text: if text.is_empty() { None } else { Some(text) },
        }
    }

    fn parse_status(lexer: &mut Lexer<'_>) -> Result<Status> {
        let s = lexer.read_atom_string()?;
        match s.to_uppercase().as_str() {
            "OK" => Ok(Status::Ok),
            "NO" => Ok(Status::No),
            "BAD" => Ok(Status::Bad),
            "PREAUTH" => Ok(Status::PreAuth),
            "BYE" => Ok(Status::Bye),
            _ => Err(lexer.error(&format!("Invalid status: {s}"))),
        }
    }

    /// Parses `[SP] ["[" code "]" SP] text`.
    ///
    /// Some servers omit the text after the status, so the leading space is
    /// optional.
    fn parse_resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }

        let code = if lexer.peek() == Some(b'[') {
            Some(parse_response_code(lexer)?)
        } else {
            None
        };

        if lexer.peek() == Some(b' ') {
            lexer.advance();
        }

        Ok((code, read_text_until_crlf(lexer)))
    }
}
