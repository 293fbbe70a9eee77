//! IMAP lexer.
//!
//! Breaks one framed response (or, on the server side, one framed command)
//! into tokens. Literals must already be inlined after their `{n}` prefix,
//! which is what the framed reader produces.

#![allow(clippy::missing_errors_doc)]

mod token;

pub use token::Token;

use crate::{Error, Result};

/// IMAP lexer state.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Returns the current position in the input.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the remaining input.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }

    /// Returns true if at end of input.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peeks at the current byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Peeks at the byte at offset from current position.
    #[must_use]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Advances by one byte and returns it.
    pub fn advance(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Skips n bytes.
    pub fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    /// Returns `true` if the next bytes are CRLF or the input is exhausted.
    #[must_use]
    pub fn at_line_end(&self) -> bool {
        self.is_eof() || (self.peek() == Some(b'\r') && self.peek_at(1) == Some(b'\n'))
    }

    /// Reads the next token.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        match byte {
            b'\r' => {
                if self.peek_at(1) == Some(b'\n') {
                    self.skip(2);
                    Ok(Token::Crlf)
                } else {
                    Err(self.error("Expected LF after CR"))
                }
            }
            b' ' => {
                self.advance();
                Ok(Token::Space)
            }
            b'(' => {
                self.advance();
                Ok(Token::LParen)
            }
            b')' => {
                self.advance();
                Ok(Token::RParen)
            }
            b'[' => {
                self.advance();
                Ok(Token::LBracket)
            }
            b']' => {
                self.advance();
                Ok(Token::RBracket)
            }
            b'*' => {
                self.advance();
                Ok(Token::Asterisk)
            }
            b'+' => {
                self.advance();
                Ok(Token::Plus)
            }
            b'"' => self.read_quoted_string(),
            b'{' => self.read_literal(),
            b'0'..=b'9' => self.read_number_or_atom(),
            _ if is_atom_char(byte) => self.read_atom(),
            _ => Err(self.error(&format!("Unexpected character: {byte:#04x}"))),
        }
    }

    fn read_quoted_string(&mut self) -> Result<Token<'a>> {
        self.advance();

        let mut result = Vec::new();
        loop {
            match self.advance() {
                Some(b'"') => break,
                Some(b'\\') => match self.advance() {
                    Some(c @ (b'"' | b'\\')) => result.push(c),
                    Some(c) => return Err(self.error(&format!("Invalid escape: \\{c}"))),
                    None => return Err(self.error("Unexpected EOF in quoted string")),
                },
                Some(b'\r' | b'\n') | None => {
                    return Err(self.error("Unterminated quoted string"));
                }
                Some(c) => result.push(c),
            }
        }

        let s =
            String::from_utf8(result).map_err(|_| self.error("Invalid UTF-8 in quoted string"))?;
        Ok(Token::QuotedString(s))
    }

    /// Reads `{n}\r\n<n bytes>` or the non-synchronizing `{n+}\r\n<n bytes>`.
    fn read_literal(&mut self) -> Result<Token<'a>> {
        self.advance();

        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
        }
        let digits = std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("Invalid literal size"))?;
        let size: usize = digits
            .parse()
            .map_err(|_| self.error("Invalid literal size number"))?;

        if self.peek() == Some(b'+') {
            self.advance();
        }
        if self.advance() != Some(b'}') {
            return Err(self.error("Expected } after literal size"));
        }
        if self.advance() != Some(b'\r') || self.advance() != Some(b'\n') {
            return Err(self.error("Expected CRLF after literal size"));
        }
        if self.pos + size > self.input.len() {
            return Err(self.error("Incomplete literal data"));
        }

        let input = self.input;
        let data = &input[self.pos..self.pos + size];
        self.skip(size);
        Ok(Token::Literal(data))
    }

    fn read_number_or_atom(&mut self) -> Result<Token<'a>> {
        let s = self.take_while(is_atom_char)?;
        if s.bytes().all(|b| b.is_ascii_digit()) {
            let n: u32 = s.parse().map_err(|_| self.error("Number too large"))?;
            Ok(Token::Number(n))
        } else {
            Ok(Token::Atom(s))
        }
    }

    fn read_atom(&mut self) -> Result<Token<'a>> {
        let s = self.take_while(is_atom_char)?;
        if s.eq_ignore_ascii_case("NIL") {
            Ok(Token::Nil)
        } else {
            Ok(Token::Atom(s))
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> Result<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("Invalid UTF-8 in atom"))
    }

    /// Creates a parse error at the current position.
    pub(crate) fn error(&self, message: &str) -> Error {
        Error::Parse {
            position: self.pos,
            message: message.to_string(),
        }
    }

    /// Expects and consumes a specific token.
    #[allow(clippy::needless_pass_by_value)]
    pub fn expect(&mut self, expected: Token<'_>) -> Result<()> {
        let token = self.next_token()?;
        if std::mem::discriminant(&token) == std::mem::discriminant(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("Expected {expected:?}, got {token:?}")))
        }
    }

    /// Expects and consumes a space.
    pub fn expect_space(&mut self) -> Result<()> {
        self.expect(Token::Space)
    }

    /// Reads an astring (atom, quoted string or literal).
    ///
    /// Bare astrings are read byte-wise, so identifiers such as `123` or
    /// rights strings such as `+lr` come back verbatim.
    pub fn read_astring(&mut self) -> Result<String> {
        match self.peek() {
            Some(b'"' | b'{') => match self.next_token()? {
                Token::QuotedString(s) => Ok(s),
                Token::Literal(data) => std::str::from_utf8(data)
                    .map(str::to_string)
                    .map_err(|_| self.error("Invalid UTF-8 in literal")),
                token => Err(self.error(&format!("Expected astring, got {token:?}"))),
            },
            Some(b) if is_astring_char(b) => {
                Ok(self.take_while(is_astring_char)?.to_string())
            }
            Some(b) => Err(self.error(&format!("Expected astring, got byte {b:#04x}"))),
            None => Err(self.error("Expected astring, got end of input")),
        }
    }

    /// Reads a number.
    pub fn read_number(&mut self) -> Result<u32> {
        match self.next_token()? {
            Token::Number(n) => Ok(n),
            token => Err(self.error(&format!("Expected number, got {token:?}"))),
        }
    }

    /// Reads an atom.
    pub fn read_atom_string(&mut self) -> Result<&'a str> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s),
            token => Err(self.error(&format!("Expected atom, got {token:?}"))),
        }
    }
}

/// Returns true if the byte is a valid atom character.
///
/// `\` is accepted so flags like `\Seen` lex as one atom.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    matches!(b,
        0x21 | 0x23..=0x24 | 0x26..=0x27 |  // ! # $ & '
        0x2B..=0x5A |                       // + , - . / 0-9 : ; < = > ? @ A-Z
        0x5C |                              // \
        0x5E..=0x7A |                       // ^ _ ` a-z
        0x7C |                              // |
        0x7E                                // ~
    )
}

/// Returns true if the byte may appear in a bare astring.
#[must_use]
pub const fn is_astring_char(b: u8) -> bool {
    (is_atom_char(b) && b != b'\\') || b == b']'
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tagged_response_tokens() {
        let mut lexer = Lexer::new(b"M0001 OK GETACL completed\r\n");

        assert_eq!(lexer.next_token().unwrap(), Token::Atom("M0001"));
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("OK"));
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("GETACL"));
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("completed"));
        assert_eq!(lexer.next_token().unwrap(), Token::Crlf);
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn numbers_and_brackets() {
        let mut lexer = Lexer::new(b"[UIDNEXT 100]");

        assert_eq!(lexer.next_token().unwrap(), Token::LBracket);
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("UIDNEXT"));
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Number(100));
        assert_eq!(lexer.next_token().unwrap(), Token::RBracket);
    }

    #[test]
    fn quoted_string_with_escapes() {
        let mut lexer = Lexer::new(b"\"say \\\"hi\\\"\"");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::QuotedString("say \"hi\"".to_string())
        );
    }

    #[test]
    fn unterminated_quoted_string_fails() {
        let mut lexer = Lexer::new(b"\"open\r\n");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn nil_is_case_insensitive() {
        let mut lexer = Lexer::new(b"nil");
        assert_eq!(lexer.next_token().unwrap(), Token::Nil);
    }

    #[test]
    fn synchronizing_and_non_synchronizing_literals() {
        let mut lexer = Lexer::new(b"{5}\r\nhello {3+}\r\nabc");
        assert_eq!(lexer.next_token().unwrap(), Token::Literal(b"hello"));
        assert_eq!(lexer.next_token().unwrap(), Token::Space);
        assert_eq!(lexer.next_token().unwrap(), Token::Literal(b"abc"));
    }

    #[test]
    fn truncated_literal_fails() {
        let mut lexer = Lexer::new(b"{10}\r\nshort");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn astring_reads_prefixed_rights_and_numeric_identifiers() {
        let mut lexer = Lexer::new(b"+lrw 123 \"two words\" {4}\r\nab c");
        assert_eq!(lexer.read_astring().unwrap(), "+lrw");
        lexer.expect_space().unwrap();
        assert_eq!(lexer.read_astring().unwrap(), "123");
        lexer.expect_space().unwrap();
        assert_eq!(lexer.read_astring().unwrap(), "two words");
        lexer.expect_space().unwrap();
        assert_eq!(lexer.read_astring().unwrap(), "ab c");
        assert!(lexer.is_eof());
    }

    #[test]
    fn astring_rejects_parenthesis() {
        let mut lexer = Lexer::new(b"(x)");
        assert!(lexer.read_astring().is_err());
    }

    #[test]
    fn atom_char_classes() {
        assert!(is_atom_char(b'A'));
        assert!(is_atom_char(b'\\'));
        assert!(is_atom_char(b'+'));
        assert!(!is_atom_char(b'"'));
        assert!(!is_atom_char(b'%'));
        assert!(!is_atom_char(b' '));
        assert!(!is_atom_char(b'{'));
        assert!(!is_atom_char(b']'));
        assert!(is_astring_char(b']'));
        assert!(!is_astring_char(b'\\'));
    }
}
