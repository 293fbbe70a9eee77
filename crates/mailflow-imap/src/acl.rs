//! Access control list commands (RFC 4314).
//!
//! Each call submits one command and returns a [`CommandFuture`] that
//! resolves after the tagged completion, with every matching untagged
//! response collected.
//!
//! ```no_run
//! use mailflow_imap::types::RightModification;
//! use mailflow_imap::{Client, Config};
//!
//! # async fn demo() -> mailflow_imap::Result<()> {
//! let client = Client::connect(&Config::new("imap.example.com")).await?;
//! client.login("fred", "secret").await?;
//!
//! let rights = "lrwi".parse()?;
//! client
//!     .set_acl("Shared", "bob", RightModification::Add, rights)
//!     .await?;
//! let acl = client.get_acl("Shared").await?;
//! println!("bob has {}", acl.rights["bob"]);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use crate::command::Command;
use crate::connection::{Client, CommandFuture};
use crate::parser::UntaggedResponse;
use crate::pipeline::Completion;
use crate::types::{Mailbox, RightModification, RightSet};
use crate::{Error, Result};

/// The access control list of one mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AclData {
    /// Mailbox the list belongs to.
    pub mailbox: Mailbox,
    /// Rights granted to each identifier.
    pub rights: HashMap<String, RightSet>,
}

/// The rights the logged-in user holds on one mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MyRightsData {
    /// Mailbox queried.
    pub mailbox: Mailbox,
    /// Rights held.
    pub rights: RightSet,
}

/// The rights that may be granted to an identifier on one mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRightsData {
    /// Mailbox queried.
    pub mailbox: Mailbox,
    /// Identifier queried.
    pub identifier: String,
    /// Rights always granted.
    pub required: RightSet,
    /// Groups of rights that may be granted, each group as a whole.
    pub optional: Vec<RightSet>,
}

impl ListRightsData {
    /// Every right that may be granted.
    #[must_use]
    pub fn grantable(&self) -> RightSet {
        self.optional
            .iter()
            .fold(self.required, |all, group| all.union(*group))
    }
}

impl Client {
    /// Changes the rights `identifier` holds on `mailbox` (SETACL).
    ///
    /// # Errors
    ///
    /// The future fails with [`Error::MailboxNotFound`] if the mailbox does
    /// not exist, or with [`Error::No`] / [`Error::Bad`] if the server
    /// refuses the change.
    pub fn set_acl(
        &self,
        mailbox: impl Into<Mailbox>,
        identifier: &str,
        modification: RightModification,
        rights: RightSet,
    ) -> CommandFuture<()> {
        self.submit(Command::SetAcl {
            mailbox: mailbox.into(),
            identifier: identifier.to_string(),
            modification,
            rights,
        })
        .map(|_| Ok(()))
    }

    /// Removes `identifier` from the access control list (DELETEACL).
    ///
    /// Removing an identifier that has no entry succeeds.
    pub fn delete_acl(&self, mailbox: impl Into<Mailbox>, identifier: &str) -> CommandFuture<()> {
        self.submit(Command::DeleteAcl {
            mailbox: mailbox.into(),
            identifier: identifier.to_string(),
        })
        .map(|_| Ok(()))
    }

    /// Fetches the access control list of `mailbox` (GETACL).
    ///
    /// # Errors
    ///
    /// The future fails with [`Error::InvalidRights`] or [`Error::Parse`]
    /// if any ACL line for this command cannot be read; no partial list is
    /// returned.
    pub fn get_acl(&self, mailbox: impl Into<Mailbox>) -> CommandFuture<AclData> {
        self.submit(Command::GetAcl {
            mailbox: mailbox.into(),
        })
        .map(collect_acl)
    }

    /// Fetches the rights the logged-in user holds on `mailbox` (MYRIGHTS).
    ///
    /// # Errors
    ///
    /// The future fails with [`Error::Protocol`] if the server completes the
    /// command without reporting any rights, and with
    /// [`Error::InvalidRights`] if the rights it reports cannot be read.
    pub fn my_rights(&self, mailbox: impl Into<Mailbox>) -> CommandFuture<MyRightsData> {
        self.submit(Command::MyRights {
            mailbox: mailbox.into(),
        })
        .map(collect_my_rights)
    }

    /// Fetches the rights that may be granted to `identifier` (LISTRIGHTS).
    ///
    /// # Errors
    ///
    /// The future fails with [`Error::Protocol`] if the server completes the
    /// command without a LISTRIGHTS response.
    pub fn list_rights(
        &self,
        mailbox: impl Into<Mailbox>,
        identifier: &str,
    ) -> CommandFuture<ListRightsData> {
        self.submit(Command::ListRights {
            mailbox: mailbox.into(),
            identifier: identifier.to_string(),
        })
        .map(collect_list_rights)
    }
}

/// Mailbox the completion belongs to; responses for other mailboxes are
/// dropped, since the server answered a different query.
fn target(completion: &Completion) -> Mailbox {
    completion.mailbox.clone().unwrap_or_default()
}

fn for_target(target: &Mailbox, mailbox: &Mailbox) -> bool {
    let matches = target.matches(mailbox.as_str());
    if !matches {
        tracing::warn!(expected = %target, got = %mailbox, "ignoring data for another mailbox");
    }
    matches
}

#[allow(clippy::unnecessary_wraps, clippy::needless_pass_by_value)]
fn collect_acl(completion: Completion) -> Result<AclData> {
    let mailbox = target(&completion);
    let mut rights = HashMap::new();
    for response in completion.responses {
        if let UntaggedResponse::Acl {
            mailbox: named,
            entries,
        } = response
        {
            if for_target(&mailbox, &named) {
                rights.extend(entries);
            }
        }
    }
    Ok(AclData { mailbox, rights })
}

fn collect_my_rights(completion: Completion) -> Result<MyRightsData> {
    let mailbox = target(&completion);
    completion
        .responses
        .into_iter()
        .rev()
        .find_map(|response| match response {
            UntaggedResponse::MyRights {
                mailbox: named,
                rights,
            } if for_target(&mailbox, &named) => Some(rights),
            _ => None,
        })
        .map(|rights| MyRightsData {
            mailbox: mailbox.clone(),
            rights,
        })
        .ok_or_else(|| Error::Protocol(format!("MYRIGHTS {mailbox} completed without rights")))
}

fn collect_list_rights(completion: Completion) -> Result<ListRightsData> {
    let mailbox = target(&completion);
    completion
        .responses
        .into_iter()
        .rev()
        .find_map(|response| match response {
            UntaggedResponse::ListRights {
                mailbox: named,
                identifier,
                required,
                optional,
            } if for_target(&mailbox, &named) => Some(ListRightsData {
                mailbox: named,
                identifier,
                required,
                optional,
            }),
            _ => None,
        })
        .ok_or_else(|| Error::Protocol(format!("LISTRIGHTS {mailbox} completed without data")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Status, Tag};

    fn completion(mailbox: &str, responses: Vec<UntaggedResponse>) -> Completion {
        Completion {
            tag: Tag::new("M0001"),
            status: Status::Ok,
            code: None,
            text: String::new(),
            mailbox: Some(Mailbox::new(mailbox)),
            responses,
        }
    }

    fn rights(s: &str) -> RightSet {
        s.parse().unwrap()
    }

    #[test]
    fn acl_merges_every_response() {
        let done = completion(
            "MyFolder",
            vec![
                UntaggedResponse::Acl {
                    mailbox: Mailbox::new("MyFolder"),
                    entries: vec![("fred".into(), rights("lrswi"))],
                },
                UntaggedResponse::Acl {
                    mailbox: Mailbox::new("MyFolder"),
                    entries: vec![("anyone".into(), rights("l"))],
                },
                UntaggedResponse::Acl {
                    mailbox: Mailbox::new("Other"),
                    entries: vec![("eve".into(), rights("a"))],
                },
            ],
        );
        let acl = collect_acl(done).unwrap();
        assert_eq!(acl.mailbox, Mailbox::new("MyFolder"));
        assert_eq!(acl.rights.len(), 2);
        assert_eq!(acl.rights["fred"], rights("lrswi"));
        assert_eq!(acl.rights["anyone"], rights("l"));
    }

    #[test]
    fn acl_without_data_is_empty() {
        let acl = collect_acl(completion("MyFolder", Vec::new())).unwrap();
        assert!(acl.rights.is_empty());
    }

    #[test]
    fn my_rights_requires_data() {
        let err = collect_my_rights(completion("INBOX", Vec::new())).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));

        let done = completion(
            "inbox",
            vec![UntaggedResponse::MyRights {
                mailbox: Mailbox::inbox(),
                rights: rights("lrswipkxtecda"),
            }],
        );
        let mine = collect_my_rights(done).unwrap();
        assert_eq!(mine.rights, RightSet::all());
    }

    #[test]
    fn list_rights_grantable_union() {
        let done = completion(
            "MyFolder",
            vec![UntaggedResponse::ListRights {
                mailbox: Mailbox::new("MyFolder"),
                identifier: "smith".into(),
                required: RightSet::EMPTY,
                optional: vec![rights("l"), rights("rs"), rights("w")],
            }],
        );
        let listed = collect_list_rights(done).unwrap();
        assert_eq!(listed.identifier, "smith");
        assert_eq!(listed.grantable(), rights("lrsw"));
    }
}
