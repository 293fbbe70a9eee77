//! Flags a mailbox announces on SELECT.

use std::fmt;

/// One entry of a `FLAGS` list or a `PERMANENTFLAGS` code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// `\Seen`
    Seen,
    /// `\Answered`
    Answered,
    /// `\Flagged`
    Flagged,
    /// `\Deleted`
    Deleted,
    /// `\Draft`
    Draft,
    /// `\Recent` (IMAP4rev1 only)
    Recent,
    /// `\*`: new keywords may be created.
    MayCreate,
    /// Any other flag, spelled as the server sent it.
    Keyword(String),
}

/// Wire spelling of every flag that is not a keyword.
const SYSTEM: [(&str, Flag); 7] = [
    ("\\Seen", Flag::Seen),
    ("\\Answered", Flag::Answered),
    ("\\Flagged", Flag::Flagged),
    ("\\Deleted", Flag::Deleted),
    ("\\Draft", Flag::Draft),
    ("\\Recent", Flag::Recent),
    ("\\*", Flag::MayCreate),
];

impl Flag {
    /// Maps a flag atom to its flag. System flags match in any case.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        SYSTEM
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map_or_else(|| Self::Keyword(s.to_string()), |(_, flag)| flag.clone())
    }

    /// Returns the wire spelling.
    #[must_use]
    pub fn as_str(&self) -> &str {
        if let Self::Keyword(keyword) = self {
            return keyword;
        }
        SYSTEM
            .iter()
            .find(|(_, flag)| flag == self)
            .map_or("", |(name, _)| name)
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distinct flags in the order the server listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags(Vec<Flag>);

impl Flags {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends `flag` if it is not listed yet.
    pub fn insert(&mut self, flag: Flag) {
        if !self.contains(&flag) {
            self.0.push(flag);
        }
    }

    /// Returns `true` if `flag` is listed.
    #[must_use]
    pub fn contains(&self, flag: &Flag) -> bool {
        self.0.contains(flag)
    }

    /// Iterates in listing order.
    pub fn iter(&self) -> std::slice::Iter<'_, Flag> {
        self.0.iter()
    }

    /// Number of distinct flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing is listed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), |mut flags, flag| {
            flags.insert(flag);
            flags
        })
    }
}

impl IntoIterator for Flags {
    type Item = Flag;
    type IntoIter = std::vec::IntoIter<Flag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Flags {
    type Item = &'a Flag;
    type IntoIter = std::slice::Iter<'a, Flag>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
