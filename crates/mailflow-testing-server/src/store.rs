//! Accounts, mailboxes and their access control lists.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use mailflow_imap::{Right, RightModification, RightSet};

/// Identifier whose rights apply to every user.
pub const ANYONE: &str = "anyone";

/// Why the store refused an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// The mailbox does not exist, or the user holds no rights on it.
    NonExistent,
    /// The user lacks the named right.
    NoPerm(Right),
    /// CREATE named a mailbox that already exists.
    AlreadyExists,
    /// The operation is never allowed on this mailbox.
    Cannot(&'static str),
    /// LOGIN with an unknown user or wrong password.
    AuthenticationFailed,
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonExistent => f.write_str("[NONEXISTENT] No such mailbox"),
            Self::NoPerm(right) => write!(f, "[NOPERM] Right '{}' required", right.as_char()),
            Self::AlreadyExists => f.write_str("[ALREADYEXISTS] Mailbox already exists"),
            Self::Cannot(what) => write!(f, "[CANNOT] {what}"),
            Self::AuthenticationFailed => {
                f.write_str("[AUTHENTICATIONFAILED] Invalid credentials")
            }
        }
    }
}

pub type Outcome<T> = std::result::Result<T, Refusal>;

/// Mailboxes are either an account's own INBOX or a name shared by all
/// accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Inbox(String),
    Named(String),
}

impl Key {
    fn resolve(user: &str, name: &str) -> Self {
        if name.eq_ignore_ascii_case("INBOX") {
            Self::Inbox(user.to_string())
        } else {
            Self::Named(name.to_string())
        }
    }
}

#[derive(Debug)]
struct Folder {
    owner: String,
    uid_validity: u32,
    acl: BTreeMap<String, RightSet>,
}

impl Folder {
    fn rights_of(&self, user: &str) -> RightSet {
        let own = self.acl.get(user).copied().unwrap_or_default();
        let anyone = self.acl.get(ANYONE).copied().unwrap_or_default();
        own.union(anyone)
    }
}

/// What SELECT or EXAMINE reports about a mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opened {
    pub uid_validity: u32,
    pub read_only: bool,
}

/// Rights LISTRIGHTS reports for one identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grantable {
    pub required: RightSet,
    pub optional: Vec<RightSet>,
}

/// State shared by every session of one server.
#[derive(Debug)]
pub struct Store {
    accounts: HashMap<String, String>,
    folders: HashMap<Key, Folder>,
    next_uid_validity: u32,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            accounts: HashMap::new(),
            folders: HashMap::new(),
            next_uid_validity: 1,
        }
    }
}

impl Store {
    /// Adds an account with its own INBOX.
    pub fn add_account(&mut self, user: &str, password: &str) {
        self.accounts.insert(user.to_string(), password.to_string());
        let key = Key::Inbox(user.to_string());
        if !self.folders.contains_key(&key) {
            self.insert(key, user);
        }
    }

    pub fn authenticate(&self, user: &str, password: &str) -> Outcome<()> {
        match self.accounts.get(user) {
            Some(stored) if stored == password => Ok(()),
            _ => Err(Refusal::AuthenticationFailed),
        }
    }

    pub fn create(&mut self, user: &str, name: &str) -> Outcome<()> {
        let key = Key::resolve(user, name);
        if self.folders.contains_key(&key) {
            return Err(Refusal::AlreadyExists);
        }
        self.insert(key, user);
        Ok(())
    }

    pub fn delete(&mut self, user: &str, name: &str) -> Outcome<()> {
        let key = Key::resolve(user, name);
        if matches!(key, Key::Inbox(_)) {
            self.visible(user, &key)?;
            return Err(Refusal::Cannot("INBOX cannot be deleted"));
        }
        require(self.visible(user, &key)?, Right::DeleteMailbox)?;
        self.folders.remove(&key);
        Ok(())
    }

    pub fn open(&self, user: &str, name: &str, read_only: bool) -> Outcome<Opened> {
        let key = Key::resolve(user, name);
        let rights = self.visible(user, &key)?;
        require(rights, Right::Read)?;
        let uid_validity = self.folders.get(&key).map_or(0, |f| f.uid_validity);
        Ok(Opened {
            uid_validity,
            // Without 's', 'w' or 't' nothing in the mailbox can change.
            read_only: read_only
                || !(rights.contains(Right::Write)
                    || rights.contains(Right::Seen)
                    || rights.contains(Right::DeleteMessage)),
        })
    }

    pub fn set_acl(
        &mut self,
        user: &str,
        name: &str,
        identifier: &str,
        modification: RightModification,
        rights: RightSet,
    ) -> Outcome<()> {
        let folder = self.administered(user, name)?;
        let current = folder.acl.get(identifier).copied().unwrap_or_default();
        let updated = modification.apply(current, rights);
        if updated.is_empty() {
            folder.acl.remove(identifier);
        } else {
            folder.acl.insert(identifier.to_string(), updated);
        }
        Ok(())
    }

    pub fn delete_acl(&mut self, user: &str, name: &str, identifier: &str) -> Outcome<()> {
        self.administered(user, name)?.acl.remove(identifier);
        Ok(())
    }

    /// Entries in identifier order.
    pub fn get_acl(&mut self, user: &str, name: &str) -> Outcome<Vec<(String, RightSet)>> {
        let folder = self.administered(user, name)?;
        Ok(folder
            .acl
            .iter()
            .map(|(identifier, rights)| (identifier.clone(), *rights))
            .collect())
    }

    /// The owner always holds every right; anyone else may be granted each
    /// right on its own.
    pub fn list_rights(&mut self, user: &str, name: &str, identifier: &str) -> Outcome<Grantable> {
        let folder = self.administered(user, name)?;
        if folder.owner == identifier {
            return Ok(Grantable {
                required: RightSet::rfc4314(),
                optional: Vec::new(),
            });
        }
        Ok(Grantable {
            required: RightSet::EMPTY,
            optional: RightSet::rfc4314().iter().map(RightSet::single).collect(),
        })
    }

    pub fn my_rights(&self, user: &str, name: &str) -> Outcome<RightSet> {
        self.visible(user, &Key::resolve(user, name))
    }

    fn insert(&mut self, key: Key, owner: &str) {
        let mut acl = BTreeMap::new();
        acl.insert(owner.to_string(), RightSet::rfc4314());
        let uid_validity = self.next_uid_validity;
        self.next_uid_validity += 1;
        self.folders.insert(
            key,
            Folder {
                owner: owner.to_string(),
                uid_validity,
                acl,
            },
        );
    }

    /// Rights `user` holds on an existing mailbox. A mailbox the user holds
    /// no rights on is reported as missing.
    fn visible(&self, user: &str, key: &Key) -> Outcome<RightSet> {
        let rights = self
            .folders
            .get(key)
            .ok_or(Refusal::NonExistent)?
            .rights_of(user);
        if rights.is_empty() {
            Err(Refusal::NonExistent)
        } else {
            Ok(rights)
        }
    }

    fn administered(&mut self, user: &str, name: &str) -> Outcome<&mut Folder> {
        let key = Key::resolve(user, name);
        require(self.visible(user, &key)?, Right::Administer)?;
        self.folders.get_mut(&key).ok_or(Refusal::NonExistent)
    }
}

const fn require(rights: RightSet, right: Right) -> Outcome<()> {
    if rights.contains(right) {
        Ok(())
    } else {
        Err(Refusal::NoPerm(right))
    }
}
