//! IMAP command model.
//!
//! A [`Command`] knows its wire name, how to encode its arguments, which
//! untagged response kinds it absorbs, the states it may be issued from and
//! the state transition its completion causes.

mod serialize;
mod tag_generator;

use crate::parser::{ResponseKind, UntaggedResponse};
use crate::pipeline::Completion;
use crate::protocol::{SelectedState, StateSet, Transition, Transmit};
use crate::types::{Mailbox, MailboxStatus, ResponseCode, RightModification, RightSet, Status, Tag};

pub use serialize::Encoder;
pub use tag_generator::TagGenerator;

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// CAPABILITY.
    Capability,
    /// NOOP.
    Noop,
    /// LOGOUT.
    Logout,
    /// LOGIN.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// SELECT.
    Select {
        /// Mailbox to select.
        mailbox: Mailbox,
    },
    /// EXAMINE (read-only SELECT).
    Examine {
        /// Mailbox to examine.
        mailbox: Mailbox,
    },
    /// CREATE.
    Create {
        /// Mailbox to create.
        mailbox: Mailbox,
    },
    /// DELETE.
    Delete {
        /// Mailbox to delete.
        mailbox: Mailbox,
    },
    /// CLOSE.
    Close,
    /// UNSELECT (RFC 3691).
    Unselect,
    /// SETACL (RFC 4314).
    SetAcl {
        /// Mailbox whose ACL changes.
        mailbox: Mailbox,
        /// Identifier whose rights change.
        identifier: String,
        /// How `rights` combines with the stored rights.
        modification: RightModification,
        /// Rights to apply.
        rights: RightSet,
    },
    /// DELETEACL (RFC 4314).
    DeleteAcl {
        /// Mailbox whose ACL changes.
        mailbox: Mailbox,
        /// Identifier to remove.
        identifier: String,
    },
    /// GETACL (RFC 4314).
    GetAcl {
        /// Mailbox to query.
        mailbox: Mailbox,
    },
    /// LISTRIGHTS (RFC 4314).
    ListRights {
        /// Mailbox to query.
        mailbox: Mailbox,
        /// Identifier to query.
        identifier: String,
    },
    /// MYRIGHTS (RFC 4314).
    MyRights {
        /// Mailbox to query.
        mailbox: Mailbox,
    },
}

impl Command {
    /// Returns the command name as written on the wire.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Capability => "CAPABILITY",
            Self::Noop => "NOOP",
            Self::Logout => "LOGOUT",
            Self::Login { .. } => "LOGIN",
            Self::Select { .. } => "SELECT",
            Self::Examine { .. } => "EXAMINE",
            Self::Create { .. } => "CREATE",
            Self::Delete { .. } => "DELETE",
            Self::Close => "CLOSE",
            Self::Unselect => "UNSELECT",
            Self::SetAcl { .. } => "SETACL",
            Self::DeleteAcl { .. } => "DELETEACL",
            Self::GetAcl { .. } => "GETACL",
            Self::ListRights { .. } => "LISTRIGHTS",
            Self::MyRights { .. } => "MYRIGHTS",
        }
    }

    /// States this command may be issued from.
    #[must_use]
    pub const fn permitted_states(&self) -> StateSet {
        match self {
            Self::Capability | Self::Noop | Self::Logout => StateSet::ANY,
            Self::Login { .. } => StateSet::NOT_AUTHENTICATED,
            Self::Close | Self::Unselect => StateSet::SELECTED,
            Self::Select { .. }
            | Self::Examine { .. }
            | Self::Create { .. }
            | Self::Delete { .. }
            | Self::SetAcl { .. }
            | Self::DeleteAcl { .. }
            | Self::GetAcl { .. }
            | Self::ListRights { .. }
            | Self::MyRights { .. } => StateSet::AUTHENTICATED,
        }
    }

    /// Untagged response kinds this command absorbs while in flight.
    #[must_use]
    pub const fn interests(&self) -> &'static [ResponseKind] {
        match self {
            Self::Capability => &[ResponseKind::Capability],
            Self::Select { .. } | Self::Examine { .. } => &[
                ResponseKind::Exists,
                ResponseKind::Recent,
                ResponseKind::Flags,
                ResponseKind::Ok,
            ],
            Self::GetAcl { .. } => &[ResponseKind::Acl],
            Self::ListRights { .. } => &[ResponseKind::ListRights],
            Self::MyRights { .. } => &[ResponseKind::MyRights],
            _ => &[],
        }
    }

    /// Returns `true` if this command absorbs responses of `kind`.
    #[must_use]
    pub fn wants(&self, kind: ResponseKind) -> bool {
        self.interests().contains(&kind)
    }

    /// Mailbox the command operates on, if any.
    #[must_use]
    pub const fn target_mailbox(&self) -> Option<&Mailbox> {
        match self {
            Self::Select { mailbox }
            | Self::Examine { mailbox }
            | Self::Create { mailbox }
            | Self::Delete { mailbox }
            | Self::SetAcl { mailbox, .. }
            | Self::DeleteAcl { mailbox, .. }
            | Self::GetAcl { mailbox }
            | Self::ListRights { mailbox, .. }
            | Self::MyRights { mailbox } => Some(mailbox),
            _ => None,
        }
    }

    /// Encodes the command under `tag`.
    #[must_use]
    pub fn encode(&self, tag: &Tag, literal_plus: bool) -> Transmit {
        let mut encoder = Encoder::new(tag, self.name(), literal_plus);
        match self {
            Self::Capability | Self::Noop | Self::Logout | Self::Close | Self::Unselect => {}
            Self::Login { username, password } => {
                encoder.astring(username).astring(password);
            }
            Self::Select { mailbox }
            | Self::Examine { mailbox }
            | Self::Create { mailbox }
            | Self::Delete { mailbox }
            | Self::GetAcl { mailbox }
            | Self::MyRights { mailbox } => {
                encoder.mailbox(mailbox);
            }
            Self::SetAcl {
                mailbox,
                identifier,
                modification,
                rights,
            } => {
                let rights = format!("{}{rights}", modification.prefix());
                encoder.mailbox(mailbox).astring(identifier).astring(&rights);
            }
            Self::DeleteAcl {
                mailbox,
                identifier,
            }
            | Self::ListRights {
                mailbox,
                identifier,
            } => {
                encoder.mailbox(mailbox).astring(identifier);
            }
        }
        encoder.finish()
    }

    /// Computes the state change caused by this command's completion.
    #[must_use]
    pub fn transition(&self, completion: &Completion) -> Transition {
        let ok = completion.status == Status::Ok;
        match self {
            Self::Login { .. } if ok => Transition::Authenticate,
            Self::Select { mailbox } | Self::Examine { mailbox } if ok => {
                let read_only = matches!(self, Self::Examine { .. })
                    || completion.code == Some(ResponseCode::ReadOnly);
                Transition::Select(SelectedState {
                    mailbox: mailbox.clone(),
                    read_only,
                    status: status_from(&completion.responses),
                })
            }
            // A failed SELECT leaves no mailbox selected.
            Self::Select { .. } | Self::Examine { .. } if completion.status == Status::No => {
                Transition::Deselect
            }
            Self::Close | Self::Unselect if ok => Transition::Deselect,
            Self::Delete { mailbox } if ok => Transition::DeselectIf(mailbox.clone()),
            Self::Logout if ok => Transition::Logout,
            _ => Transition::None,
        }
    }
}

pub(crate) fn status_from(responses: &[UntaggedResponse]) -> MailboxStatus {
    let mut status = MailboxStatus::default();
    for response in responses {
        crate::protocol::absorb_status(&mut status, response);
    }
    status
}
