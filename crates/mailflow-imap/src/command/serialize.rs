//! Command serialization.

use crate::protocol::Transmit;
use crate::types::{Mailbox, Tag};

/// Incremental command encoder.
///
/// Arguments that cannot travel as an atom or quoted string are sent as
/// literals. With `LITERAL+` the literal is non-synchronizing and stays in
/// the current part; otherwise the encoder starts a new part that the writer
/// sends only after the server's continuation request.
#[derive(Debug)]
pub struct Encoder {
    parts: Vec<Vec<u8>>,
    current: Vec<u8>,
    literal_plus: bool,
}

impl Encoder {
    /// Starts a command line with its tag and name.
    #[must_use]
    pub fn new(tag: &Tag, name: &str, literal_plus: bool) -> Self {
        let mut current = Vec::with_capacity(64);
        current.extend_from_slice(tag.as_str().as_bytes());
        current.push(b' ');
        current.extend_from_slice(name.as_bytes());
        Self {
            parts: Vec::new(),
            current,
            literal_plus,
        }
    }

    /// Appends `SP astring`.
    pub fn astring(&mut self, s: &str) -> &mut Self {
        self.current.push(b' ');
        write_astring(self, s.as_bytes());
        self
    }

    /// Appends `SP mailbox`.
    pub fn mailbox(&mut self, mailbox: &Mailbox) -> &mut Self {
        self.astring(mailbox.as_str())
    }

    /// Terminates the line and returns the encoded command.
    #[must_use]
    pub fn finish(mut self) -> Transmit {
        self.current.extend_from_slice(b"\r\n");
        self.parts.push(self.current);
        Transmit::from_parts(self.parts)
    }

    fn literal(&mut self, data: &[u8]) {
        let marker = if self.literal_plus { "+" } else { "" };
        self.current
            .extend_from_slice(format!("{{{}{marker}}}\r\n", data.len()).as_bytes());
        if !self.literal_plus {
            self.parts.push(std::mem::take(&mut self.current));
        }
        self.current.extend_from_slice(data);
    }
}

/// Writes an astring as an atom, a quoted string or a literal.
fn write_astring(encoder: &mut Encoder, s: &[u8]) {
    if s.iter().any(|&b| needs_literal(b)) {
        encoder.literal(s);
    } else if s.is_empty() || s.iter().any(|&b| needs_quoting(b)) {
        let buf = &mut encoder.current;
        buf.push(b'"');
        for &b in s {
            if b == b'"' || b == b'\\' {
                buf.push(b'\\');
            }
            buf.push(b);
        }
        buf.push(b'"');
    } else {
        encoder.current.extend_from_slice(s);
    }
}

/// Returns true if the byte cannot appear in an atom.
const fn needs_quoting(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*' | b']'
    ) || b < 0x20
        || b == 0x7F
}

/// Returns true if the byte cannot appear in a quoted string.
const fn needs_literal(b: u8) -> bool {
    matches!(b, b'\r' | b'\n' | 0) || b >= 0x80
}
