//! Access-control rights (RFC 4314).
//!
//! A [`RightSet`] is a set of single-character rights held by an
//! identifier on a mailbox. It is stored as a bitset, so equality, union and
//! difference never depend on the order the characters arrived in.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// A single access right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Right {
    /// `l`: mailbox is visible to LIST.
    Lookup,
    /// `r`: SELECT, FETCH, SEARCH and COPY from the mailbox.
    Read,
    /// `s`: keep seen state across sessions.
    Seen,
    /// `w`: set flags other than `\Seen` and `\Deleted`.
    Write,
    /// `i`: APPEND and COPY into the mailbox.
    Insert,
    /// `p`: send mail to the submission address for the mailbox.
    Post,
    /// `k`: create child mailboxes.
    CreateMailbox,
    /// `x`: delete or rename the mailbox.
    DeleteMailbox,
    /// `t`: set or clear `\Deleted`.
    DeleteMessage,
    /// `e`: EXPUNGE.
    Expunge,
    /// `a`: administer the mailbox ACL.
    Administer,
    /// `c`: obsolete RFC 2086 create right.
    LegacyCreate,
    /// `d`: obsolete RFC 2086 delete right.
    LegacyDelete,
}

impl Right {
    /// Every right in canonical order.
    pub const ALL: [Self; 13] = [
        Self::Lookup,
        Self::Read,
        Self::Seen,
        Self::Write,
        Self::Insert,
        Self::Post,
        Self::CreateMailbox,
        Self::DeleteMailbox,
        Self::DeleteMessage,
        Self::Expunge,
        Self::Administer,
        Self::LegacyCreate,
        Self::LegacyDelete,
    ];

    /// Maps a rights character to its right.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'l' => Self::Lookup,
            'r' => Self::Read,
            's' => Self::Seen,
            'w' => Self::Write,
            'i' => Self::Insert,
            'p' => Self::Post,
            'k' => Self::CreateMailbox,
            'x' => Self::DeleteMailbox,
            't' => Self::DeleteMessage,
            'e' => Self::Expunge,
            'a' => Self::Administer,
            'c' => Self::LegacyCreate,
            'd' => Self::LegacyDelete,
            _ => return None,
        })
    }

    /// Returns the wire character for this right.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Lookup => 'l',
            Self::Read => 'r',
            Self::Seen => 's',
            Self::Write => 'w',
            Self::Insert => 'i',
            Self::Post => 'p',
            Self::CreateMailbox => 'k',
            Self::DeleteMailbox => 'x',
            Self::DeleteMessage => 't',
            Self::Expunge => 'e',
            Self::Administer => 'a',
            Self::LegacyCreate => 'c',
            Self::LegacyDelete => 'd',
        }
    }

    const fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl fmt::Display for Right {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// An immutable set of rights.
///
/// ```
/// use mailflow_imap::RightSet;
///
/// let held: RightSet = "ailw".parse().unwrap();
/// let granted = held.union("rwi".parse().unwrap());
/// assert_eq!(granted.to_string(), "lrwia");
/// assert_eq!(granted, "ailwr".parse().unwrap());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RightSet(u16);

impl RightSet {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self::EMPTY
    }

    /// Every right, including the obsolete `c` and `d`.
    #[must_use]
    pub const fn all() -> Self {
        Self((1 << Right::ALL.len()) - 1)
    }

    /// The eleven rights defined by RFC 4314 (`lrswipkxtea`).
    #[must_use]
    pub const fn rfc4314() -> Self {
        Self(Self::all().0 & !(Right::LegacyCreate.bit() | Right::LegacyDelete.bit()))
    }

    /// Creates a set holding exactly one right.
    #[must_use]
    pub const fn single(right: Right) -> Self {
        Self(right.bit())
    }

    /// Returns `true` if `right` is in the set.
    #[must_use]
    pub const fn contains(self, right: Right) -> bool {
        self.0 & right.bit() != 0
    }

    /// Returns `true` if every right of `other` is in the set.
    #[must_use]
    pub const fn contains_all(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the set with `other` added.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns the set with `other` removed; absent rights are ignored.
    #[must_use]
    pub const fn subtract(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Returns the rights held by both sets.
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Returns the set with `right` added.
    #[must_use]
    pub const fn with(self, right: Right) -> Self {
        Self(self.0 | right.bit())
    }

    /// Returns `true` if the set holds no rights.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the number of rights in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the rights in canonical order.
    pub fn iter(self) -> impl Iterator<Item = Right> {
        Right::ALL.into_iter().filter(move |r| self.contains(*r))
    }
}

impl FromStr for RightSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.chars().try_fold(Self::EMPTY, |set, c| {
            Right::from_char(c)
                .map(|right| set.with(right))
                .ok_or_else(|| Error::InvalidRights {
                    rights: s.to_string(),
                    right: c,
                })
        })
    }
}

impl FromIterator<Right> for RightSet {
    fn from_iter<I: IntoIterator<Item = Right>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl fmt::Display for RightSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.iter().try_for_each(|r| write!(f, "{}", r.as_char()))
    }
}

impl fmt::Debug for RightSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RightSet({self})")
    }
}

/// How a SETACL rights string combines with the stored rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RightModification {
    /// Replace the stored rights (no prefix).
    #[default]
    Replace,
    /// Add to the stored rights (`+` prefix).
    Add,
    /// Remove from the stored rights (`-` prefix).
    Remove,
}

impl RightModification {
    /// Returns the wire prefix.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Replace => "",
            Self::Add => "+",
            Self::Remove => "-",
        }
    }

    /// Computes the rights stored after applying `given` to `current`.
    #[must_use]
    pub const fn apply(self, current: RightSet, given: RightSet) -> RightSet {
        match self {
            Self::Replace => given,
            Self::Add => current.union(given),
            Self::Remove => current.subtract(given),
        }
    }

    /// Splits a prefixed rights string into its mode and rights.
    pub fn split_prefix(s: &str) -> Result<(Self, RightSet)> {
        let (mode, rest) = if let Some(rest) = s.strip_prefix('+') {
            (Self::Add, rest)
        } else if let Some(rest) = s.strip_prefix('-') {
            (Self::Remove, rest)
        } else {
            (Self::Replace, s)
        };
        Ok((mode, rest.parse()?))
    }
}
