//! IMAP command tag generator.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::Tag;
use crate::{Error, Result};

/// Tag generator for IMAP commands.
///
/// Produces `M0001`, `M0002`, ... from a 64-bit counter. Tags are never
/// reissued: once the counter is exhausted every call fails instead of
/// wrapping around.
#[derive(Debug)]
pub struct TagGenerator {
    counter: AtomicU64,
    prefix: char,
}

impl TagGenerator {
    /// Creates a new tag generator with the given prefix.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self {
            counter: AtomicU64::new(1),
            prefix,
        }
    }

    /// Allocates the next tag.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] once the tag space is exhausted.
    pub fn next_tag(&self) -> Result<Tag> {
        let n = self
            .counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_add(1))
            .map_err(|_| Error::Protocol("tag space exhausted on this connection".to_string()))?;
        Ok(Tag(format!("{}{n:04}", self.prefix)))
    }

}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('M')
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn sequential_zero_padded_tags() {
        let generator = TagGenerator::default();
        assert_eq!(generator.next_tag().unwrap().as_str(), "M0001");
        assert_eq!(generator.next_tag().unwrap().as_str(), "M0002");
        assert_eq!(generator.counter.load(Ordering::Acquire), 3);
    }

    #[test]
    fn custom_prefix_and_wide_numbers() {
        let generator = TagGenerator::new('X');
        generator.counter.store(12_345, Ordering::Relaxed);
        assert_eq!(generator.next_tag().unwrap().as_str(), "X12345");
    }

    #[test]
    fn tags_are_unique() {
        let generator = TagGenerator::default();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(generator.next_tag().unwrap()));
        }
    }

    #[test]
    fn exhaustion_is_an_error_not_a_wrap() {
        let generator = TagGenerator::default();
        generator.counter.store(u64::MAX, Ordering::Relaxed);
        assert!(matches!(generator.next_tag(), Err(Error::Protocol(_))));
        assert!(matches!(generator.next_tag(), Err(Error::Protocol(_))));
    }
}
