//! Encoded outgoing command data.

#![allow(clippy::missing_const_for_fn)]

/// One encoded command, ready for the writer.
///
/// A command without synchronizing literals is a single part. Each
/// synchronizing literal splits the command: the writer sends a part, waits
/// for the server's continuation request, then sends the next part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmit {
    parts: Vec<Vec<u8>>,
}

impl Transmit {
    /// Creates a single-part transmit.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { parts: vec![data] }
    }

    /// Creates a transmit from its parts.
    #[must_use]
    pub fn from_parts(parts: Vec<Vec<u8>>) -> Self {
        Self { parts }
    }

    /// Returns the parts in send order.
    #[must_use]
    pub fn parts(&self) -> &[Vec<u8>] {
        &self.parts
    }

    /// Consumes the transmit, returning its parts.
    #[must_use]
    pub fn into_parts(self) -> Vec<Vec<u8>> {
        self.parts
    }

    /// Returns `true` if the writer must wait for continuation requests.
    #[must_use]
    pub fn needs_continuation(&self) -> bool {
        self.parts.len() > 1
    }

    /// Returns the total number of bytes across all parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.iter().map(Vec::len).sum()
    }

    /// Returns `true` if there is nothing to send.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns all bytes concatenated, as they appear on the wire.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.parts.concat()
    }
}

impl From<&str> for Transmit {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_part() {
        let t = Transmit::from("M0001 NOOP\r\n");
        assert!(!t.needs_continuation());
        assert_eq!(t.len(), 12);
        assert_eq!(t.parts().len(), 1);
    }

    #[test]
    fn multi_part_concatenates() {
        let t = Transmit::from_parts(vec![b"A {3}\r\n".to_vec(), b"abc\r\n".to_vec()]);
        assert!(t.needs_continuation());
        assert_eq!(t.to_bytes(), b"A {3}\r\nabc\r\n");
        assert!(!t.is_empty());
    }
}
