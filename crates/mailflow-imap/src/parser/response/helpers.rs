//! Parser helper functions.

use crate::parser::lexer::{Lexer, Token};
use crate::types::{
    Capability, Flag, Flags, Mailbox, ResponseCode, RightSet, SeqNum, Uid, UidValidity,
};
use crate::{Error, Result};

/// Parses a bracketed response code.
pub fn parse_response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(Token::LBracket)?;

    let atom = lexer.read_atom_string()?;
    let upper = atom.to_uppercase();

    let code = match upper.as_str() {
        "ALERT" => ResponseCode::Alert,
        "PARSE" => ResponseCode::Parse,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "TRYCREATE" => ResponseCode::TryCreate,
        "NONEXISTENT" => ResponseCode::NonExistent,
        "NOPERM" => ResponseCode::NoPerm,
        "CLOSED" => ResponseCode::Closed,
        "UIDNEXT" => {
            lexer.expect_space()?;
            let n = lexer.read_number()?;
            ResponseCode::UidNext(Uid::new(n).ok_or_else(|| lexer.error("Invalid UID 0"))?)
        }
        "UIDVALIDITY" => {
            lexer.expect_space()?;
            let n = lexer.read_number()?;
            ResponseCode::UidValidity(
                UidValidity::new(n).ok_or_else(|| lexer.error("Invalid UIDVALIDITY 0"))?,
            )
        }
        "UNSEEN" => {
            lexer.expect_space()?;
            let n = lexer.read_number()?;
            ResponseCode::Unseen(
                SeqNum::new(n).ok_or_else(|| lexer.error("Invalid sequence number 0"))?,
            )
        }
        "HIGHESTMODSEQ" => {
            lexer.expect_space()?;
            ResponseCode::HighestModSeq(parse_u64(lexer)?)
        }
        "CAPABILITY" => ResponseCode::Capability(parse_capability_data(lexer)?),
        "PERMANENTFLAGS" => {
            lexer.expect_space()?;
            ResponseCode::PermanentFlags(parse_flag_list(lexer)?.into_iter().collect())
        }
        _ => ResponseCode::Unknown(atom.to_string()),
    };

    // Codes may carry arguments we do not model.
    while lexer.peek() != Some(b']') && !lexer.at_line_end() {
        lexer.advance();
    }
    lexer.expect(Token::RBracket)?;

    Ok(code)
}

/// Reads a 64-bit number, e.g. a mod-sequence that overflows `u32`.
fn parse_u64(lexer: &mut Lexer<'_>) -> Result<u64> {
    let digits = lexer
        .remaining()
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    let value = std::str::from_utf8(&lexer.remaining()[..digits])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| lexer.error("Expected 64-bit number"))?;
    lexer.skip(digits);
    Ok(value)
}

/// Parses space-separated capability atoms.
pub fn parse_capability_data(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut caps = Vec::new();

    while lexer.peek() == Some(b' ') {
        lexer.advance();
        if let Token::Atom(s) = lexer.next_token()? {
            caps.push(Capability::parse(s));
        }
    }

    Ok(caps)
}

/// Parses a parenthesised flag list.
pub fn parse_flag_list(lexer: &mut Lexer<'_>) -> Result<Flags> {
    lexer.expect(Token::LParen)?;

    let mut flags = Flags::new();

    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom("\\") if lexer.peek() == Some(b'*') => {
                lexer.advance();
                flags.insert(Flag::MayCreate);
            }
            Token::Atom(s) => flags.insert(Flag::parse(s)),
            token => {
                return Err(Error::Parse {
                    position: lexer.position(),
                    message: format!("Unexpected token in flag list: {token:?}"),
                });
            }
        }
    }

    Ok(flags)
}

/// Reads a rights string argument.
fn read_rights(lexer: &mut Lexer<'_>) -> Result<RightSet> {
    lexer.read_astring()?.parse()
}

/// Parses `mailbox *(SP identifier SP rights)`.
pub fn parse_acl_data(lexer: &mut Lexer<'_>) -> Result<(Mailbox, Vec<(String, RightSet)>)> {
    let mailbox = Mailbox::new(lexer.read_astring()?);
    let mut entries = Vec::new();

    while lexer.peek() == Some(b' ') {
        lexer.advance();
        if lexer.at_line_end() {
            break;
        }
        let identifier = lexer.read_astring()?;
        lexer.expect_space()?;
        entries.push((identifier, read_rights(lexer)?));
    }

    Ok((mailbox, entries))
}

/// Parses `mailbox SP identifier SP required *(SP optional)`.
pub fn parse_listrights_data(
    lexer: &mut Lexer<'_>,
) -> Result<(Mailbox, String, RightSet, Vec<RightSet>)> {
    let mailbox = Mailbox::new(lexer.read_astring()?);
    lexer.expect_space()?;
    let identifier = lexer.read_astring()?;
    lexer.expect_space()?;
    let required = read_rights(lexer)?;

    let mut optional = Vec::new();
    while lexer.peek() == Some(b' ') {
        lexer.advance();
        if lexer.at_line_end() {
            break;
        }
        optional.push(read_rights(lexer)?);
    }

    Ok((mailbox, identifier, required, optional))
}

/// Parses `mailbox SP rights`.
pub fn parse_myrights_data(lexer: &mut Lexer<'_>) -> Result<(Mailbox, RightSet)> {
    let mailbox = Mailbox::new(lexer.read_astring()?);
    lexer.expect_space()?;
    Ok((mailbox, read_rights(lexer)?))
}

/// Reads text until CRLF.
pub fn read_text_until_crlf(lexer: &mut Lexer<'_>) -> String {
    let remaining = lexer.remaining();

    let end = remaining
        .windows(2)
        .position(|w| w == b"\r\n")
        .unwrap_or(remaining.len());

    lexer.skip(end);
    if lexer.peek() == Some(b'\r') {
        lexer.skip(2);
    }

    String::from_utf8_lossy(&remaining[..end]).to_string()
}
