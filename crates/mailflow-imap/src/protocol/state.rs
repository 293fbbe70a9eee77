//! Connection state machine.

use std::fmt;

use crate::parser::UntaggedResponse;
use crate::types::{Flags, Mailbox, MailboxStatus, ResponseCode};

/// Protocol state as defined by RFC 9051.
///
/// ```text
/// NotAuthenticated ── LOGIN / PREAUTH ──→ Authenticated
/// Authenticated ── SELECT / EXAMINE ──→ Selected
/// Selected ── CLOSE / UNSELECT / failed SELECT / [CLOSED] ──→ Authenticated
/// any ── LOGOUT / BYE ──→ Logout (terminal)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Waiting for credentials.
    #[default]
    NotAuthenticated,
    /// Logged in, no mailbox selected.
    Authenticated,
    /// A mailbox is open.
    Selected(SelectedState),
    /// The connection is closing; no further commands are accepted.
    Logout,
}

/// State carried while a mailbox is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedState {
    /// Selected mailbox.
    pub mailbox: Mailbox,
    /// Whether the mailbox was opened read-only.
    pub read_only: bool,
    /// Attributes accumulated from untagged data.
    pub status: MailboxStatus,
}

impl ConnectionState {
    /// Returns the state discriminant.
    #[must_use]
    pub const fn kind(&self) -> StateKind {
        match self {
            Self::NotAuthenticated => StateKind::NotAuthenticated,
            Self::Authenticated => StateKind::Authenticated,
            Self::Selected(_) => StateKind::Selected,
            Self::Logout => StateKind::Logout,
        }
    }

    /// Returns `true` if logged in (authenticated or selected).
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated | Self::Selected(_))
    }

    /// Returns the selected mailbox, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<&SelectedState> {
        match self {
            Self::Selected(state) => Some(state),
            _ => None,
        }
    }

    /// Applies the transition of a completed command.
    pub fn apply(&mut self, transition: Transition) {
        let next = match transition {
            Transition::None => return,
            Transition::Authenticate => Self::Authenticated,
            Transition::Select(selected) => Self::Selected(selected),
            Transition::Deselect => match self {
                Self::Selected(_) => Self::Authenticated,
                _ => return,
            },
            Transition::DeselectIf(mailbox) => match self {
                Self::Selected(state) if state.mailbox.matches(mailbox.as_str()) => {
                    Self::Authenticated
                }
                _ => return,
            },
            Transition::Logout => Self::Logout,
        };

        // Logout is terminal.
        if *self == Self::Logout {
            return;
        }
        tracing::debug!(from = %self.kind(), to = %next.kind(), "state transition");
        *self = next;
    }

    /// Folds unsolicited mailbox data into the selected state.
    ///
    /// Returns `false` when the response does not affect connection state.
    pub fn absorb(&mut self, response: &UntaggedResponse) -> bool {
        if let UntaggedResponse::Ok {
            code: Some(ResponseCode::Closed),
            ..
        } = response
        {
            self.apply(Transition::Deselect);
            return true;
        }
        match self {
            Self::Selected(state) => absorb_status(&mut state.status, response),
            _ => false,
        }
    }
}

/// Applies one untagged response to a mailbox status.
///
/// Returns `false` when the response carries no mailbox attribute.
pub(crate) fn absorb_status(status: &mut MailboxStatus, response: &UntaggedResponse) -> bool {
    match response {
        UntaggedResponse::Exists(n) => status.exists = *n,
        UntaggedResponse::Recent(n) => status.recent = *n,
        UntaggedResponse::Expunge(_) => status.exists = status.exists.saturating_sub(1),
        UntaggedResponse::Flags(flags) => status.flags = flags.clone(),
        UntaggedResponse::Ok {
            code: Some(code), ..
        } => match code {
            ResponseCode::UidValidity(v) => status.uid_validity = Some(*v),
            ResponseCode::UidNext(uid) => status.uid_next = Some(*uid),
            ResponseCode::Unseen(seq) => status.unseen = Some(*seq),
            ResponseCode::HighestModSeq(n) => status.highest_mod_seq = Some(*n),
            ResponseCode::PermanentFlags(flags) => {
                status.permanent_flags = flags.iter().cloned().collect::<Flags>();
            }
            _ => return false,
        },
        _ => return false,
    }
    true
}

/// State discriminant, used in errors and the permitted-state table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    /// See [`ConnectionState::NotAuthenticated`].
    NotAuthenticated,
    /// See [`ConnectionState::Authenticated`].
    Authenticated,
    /// See [`ConnectionState::Selected`].
    Selected,
    /// See [`ConnectionState::Logout`].
    Logout,
}

impl StateKind {
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotAuthenticated => "not authenticated",
            Self::Authenticated => "authenticated",
            Self::Selected => "selected",
            Self::Logout => "logout",
        })
    }
}

/// A set of states a command may be issued from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSet(u8);

impl StateSet {
    /// Not authenticated only.
    pub const NOT_AUTHENTICATED: Self = Self(StateKind::NotAuthenticated.bit());
    /// Selected only.
    pub const SELECTED: Self = Self(StateKind::Selected.bit());
    /// Authenticated or selected.
    pub const AUTHENTICATED: Self =
        Self(StateKind::Authenticated.bit() | StateKind::Selected.bit());
    /// Every state except logout.
    pub const ANY: Self = Self(
        StateKind::NotAuthenticated.bit()
            | StateKind::Authenticated.bit()
            | StateKind::Selected.bit(),
    );

    /// Returns `true` if `kind` is in the set.
    #[must_use]
    pub const fn contains(self, kind: StateKind) -> bool {
        self.0 & kind.bit() != 0
    }
}

/// Effect of a completed command on the connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// No change.
    None,
    /// Enter the authenticated state.
    Authenticate,
    /// Enter the selected state.
    Select(SelectedState),
    /// Leave the selected state, if in it.
    Deselect,
    /// Leave the selected state if the named mailbox is the selected one.
    DeselectIf(Mailbox),
    /// Enter the logout state.
    Logout,
}
