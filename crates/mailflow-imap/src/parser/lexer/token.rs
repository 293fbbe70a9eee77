//! Tokens produced by the [`Lexer`](super::Lexer).

/// One lexical unit of a framed line.
///
/// Atoms and literals borrow from the input; quoted strings are unescaped
/// into an owned string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Run of atom characters that is neither a number nor `NIL`.
    Atom(&'a str),
    /// `"..."` with escapes removed.
    QuotedString(String),
    /// Payload of `{n}` or `{n+}`.
    Literal(&'a [u8]),
    /// Run of digits that fits in a `u32`.
    Number(u32),
    /// `NIL`, any case.
    Nil,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// ` `
    Space,
    /// `*`, the untagged prefix.
    Asterisk,
    /// `+`, the continuation prefix.
    Plus,
    /// `\r\n`
    Crlf,
    /// No input left.
    Eof,
}

impl Token<'_> {
    /// Returns `true` for CRLF or end of input.
    #[must_use]
    pub const fn ends_line(&self) -> bool {
        matches!(self, Self::Crlf | Self::Eof)
    }
}
