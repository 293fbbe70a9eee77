//! Command pipelining and tag correlation.
//!
//! IMAP allows sending several commands before their completions arrive
//! (RFC 9051 section 5.5). The [`Pipeline`] owns every command the
//! connection has accepted but not yet resolved:
//!
//! - a FIFO queue of commands waiting for the pipeline policy to let them
//!   onto the wire
//! - the in-flight map, keyed by tag, of commands already handed to the
//!   writer
//! - the commands whose synchronizing literals still wait for continuation
//!   requests
//!
//! ## Pipeline policy
//!
//! A command goes on the wire immediately when nothing is in flight.
//! Otherwise it is written only when pipelining is enabled, the depth limit
//! allows it, it and every in-flight command are pipeline-safe, and it has
//! no synchronizing literal (unless [`PipelineConfig::allow_literals`]).
//! Waiting commands leave the queue strictly in submission order.

#![allow(clippy::missing_const_for_fn)]

use std::collections::{HashMap, VecDeque};

use tokio::sync::oneshot;

use crate::command::Command;
use crate::parser::{ResponseKind, UntaggedResponse};
use crate::protocol::{ConnectionState, Transmit};
use crate::types::{Mailbox, ResponseCode, Status, Tag};
use crate::{Error, Result};

/// Default maximum pipeline depth.
pub const DEFAULT_MAX_DEPTH: usize = 4;

/// Maximum allowed pipeline depth.
pub const MAX_PIPELINE_DEPTH: usize = 16;

/// Configuration for command pipelining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Maximum number of commands in flight at once.
    pub max_depth: usize,

    /// Whether to pipeline at all.
    pub enabled: bool,

    /// Whether commands with synchronizing literals may join a pipeline.
    pub allow_literals: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            enabled: true,
            allow_literals: false,
        }
    }
}

impl PipelineConfig {
    /// Creates a new pipeline configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum pipeline depth, clamped to `1..=MAX_PIPELINE_DEPTH`.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.clamp(1, MAX_PIPELINE_DEPTH);
        self
    }

    /// Enables or disables pipelining.
    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Allows pipelining commands with synchronizing literals.
    #[must_use]
    pub fn allow_literals(mut self, allow: bool) -> Self {
        self.allow_literals = allow;
        self
    }
}

/// Classification of commands for pipelining safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineSafety {
    /// Read-only query; safe to pipeline.
    Safe,

    /// Changes server data but not connection state; may be pipelined.
    Caution,

    /// Changes connection state; must run alone.
    Unsafe,
}

impl Command {
    /// Returns whether this command can be safely pipelined.
    #[must_use]
    pub const fn pipeline_safety(&self) -> PipelineSafety {
        match self {
            Self::Noop
            | Self::Capability
            | Self::GetAcl { .. }
            | Self::ListRights { .. }
            | Self::MyRights { .. } => PipelineSafety::Safe,

            Self::SetAcl { .. } | Self::DeleteAcl { .. } | Self::Create { .. } => {
                PipelineSafety::Caution
            }

            Self::Login { .. }
            | Self::Logout
            | Self::Select { .. }
            | Self::Examine { .. }
            | Self::Close
            | Self::Unselect
            | Self::Delete { .. } => PipelineSafety::Unsafe,
        }
    }

    /// Returns `true` if this command can be pipelined.
    #[must_use]
    pub const fn is_pipelineable(&self) -> bool {
        !matches!(self.pipeline_safety(), PipelineSafety::Unsafe)
    }
}

/// The outcome of one command, as delivered by its tagged completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Tag of the completed command.
    pub tag: Tag,
    /// Completion status.
    pub status: Status,
    /// Response code of the completion line.
    pub code: Option<ResponseCode>,
    /// Human-readable completion text.
    pub text: String,
    /// Mailbox the command targeted, if any.
    pub mailbox: Option<Mailbox>,
    /// Untagged data absorbed by the command, in arrival order.
    pub responses: Vec<UntaggedResponse>,
}

impl Completion {
    /// Converts a failed completion into the matching error.
    ///
    /// # Errors
    ///
    /// - [`Error::MailboxNotFound`] for `NO [NONEXISTENT]` or `NO [TRYCREATE]`
    /// - [`Error::No`], [`Error::Bad`] or [`Error::Bye`] otherwise
    pub fn into_result(self) -> Result<Self> {
        match self.status {
            Status::Ok | Status::PreAuth => Ok(self),
            Status::No => match (&self.code, self.mailbox) {
                (Some(code), Some(mailbox)) if code.is_missing_mailbox() => {
                    Err(Error::MailboxNotFound(mailbox.0))
                }
                _ => Err(Error::No(self.text)),
            },
            Status::Bad => Err(Error::Bad(self.text)),
            Status::Bye => Err(Error::Bye(self.text)),
        }
    }
}

/// One-shot handle through which a command's outcome is delivered.
pub type Responder = oneshot::Sender<Result<Completion>>;

/// A command accepted by the pipeline and not yet resolved.
#[derive(Debug)]
pub struct PendingCommand {
    /// Tag assigned at submission.
    pub tag: Tag,
    /// The command itself.
    pub command: Command,
    /// Encoded form, taken when the command is written.
    transmit: Option<Transmit>,
    /// Untagged data absorbed so far.
    pub responses: Vec<UntaggedResponse>,
    failure: Option<Error>,
    seq: u64,
    literal: bool,
    responder: Responder,
}

impl PendingCommand {
    /// Wraps an encoded command and its responder.
    #[must_use]
    pub fn new(tag: Tag, command: Command, transmit: Transmit, responder: Responder) -> Self {
        Self {
            tag,
            command,
            literal: transmit.needs_continuation(),
            transmit: Some(transmit),
            responses: Vec::new(),
            failure: None,
            seq: 0,
            responder,
        }
    }

    /// Returns `true` if the command carries a synchronizing literal.
    #[must_use]
    pub fn has_literal(&self) -> bool {
        self.literal
    }

    /// Builds the completion for this command, consuming its absorbed data.
    #[must_use]
    pub fn complete(
        &mut self,
        status: Status,
        code: Option<ResponseCode>,
        text: String,
    ) -> Completion {
        Completion {
            tag: self.tag.clone(),
            status,
            code,
            text,
            mailbox: self.command.target_mailbox().cloned(),
            responses: std::mem::take(&mut self.responses),
        }
    }

    /// Records that data meant for this command could not be read. The
    /// first failure is kept and replaces a successful completion.
    pub fn fail(&mut self, error: Error) {
        if self.failure.is_none() {
            self.failure = Some(error);
        }
    }

    /// Delivers the outcome of the tagged completion.
    pub fn settle(mut self, completion: Completion) {
        let result = match (completion.into_result(), self.failure.take()) {
            (Ok(_), Some(error)) => Err(error),
            (result, _) => result,
        };
        self.fulfil(result);
    }

    /// Delivers the outcome. An abandoned future simply drops it.
    pub fn fulfil(self, result: Result<Completion>) {
        if self.responder.send(result).is_err() {
            tracing::debug!(tag = %self.tag, "result discarded; caller abandoned the command");
        }
    }
}

/// A command released to the writer.
#[derive(Debug)]
pub struct Outbound {
    /// Tag of the command.
    pub tag: Tag,
    /// Bytes to write.
    pub transmit: Transmit,
}

/// Command pipeline manager.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    queue: VecDeque<PendingCommand>,
    in_flight: HashMap<Tag, PendingCommand>,
    literals: VecDeque<(Tag, usize)>,
    next_seq: u64,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            queue: VecDeque::new(),
            in_flight: HashMap::new(),
            literals: VecDeque::new(),
            next_seq: 0,
        }
    }

    /// Returns the pipeline configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Returns the number of commands waiting to be written.
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.queue.len()
    }

    /// Returns the number of commands written and awaiting completion.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Checks if a tag is currently in flight.
    #[must_use]
    pub fn is_in_flight(&self, tag: &Tag) -> bool {
        self.in_flight.contains_key(tag)
    }

    /// Returns `true` if the policy lets `pending` onto the wire now.
    fn can_send(&self, pending: &PendingCommand) -> bool {
        if self.in_flight.is_empty() {
            return true;
        }
        self.config.enabled
            && self.in_flight.len() < self.config.max_depth
            && pending.command.is_pipelineable()
            && self.in_flight.values().all(|p| p.command.is_pipelineable())
            && (!pending.has_literal() || self.config.allow_literals)
    }

    /// Accepts a command.
    ///
    /// Returns the bytes to write when the command may go on the wire now;
    /// otherwise the command waits behind earlier submissions.
    pub fn submit(&mut self, mut pending: PendingCommand) -> Option<Outbound> {
        pending.seq = self.next_seq;
        self.next_seq += 1;

        if self.queue.is_empty() && self.can_send(&pending) {
            Some(self.dispatch(pending))
        } else {
            tracing::debug!(
                tag = %pending.tag,
                command = pending.command.name(),
                queued = self.queue.len() + 1,
                "command queued"
            );
            self.queue.push_back(pending);
            None
        }
    }

    fn dispatch(&mut self, mut pending: PendingCommand) -> Outbound {
        let transmit = pending
            .transmit
            .take()
            .unwrap_or_else(|| Transmit::from_parts(Vec::new()));
        if transmit.needs_continuation() {
            self.literals
                .push_back((pending.tag.clone(), transmit.parts().len() - 1));
        }
        let tag = pending.tag.clone();
        tracing::debug!(%tag, command = pending.command.name(), "command dispatched");
        self.in_flight.insert(tag.clone(), pending);
        Outbound { tag, transmit }
    }

    /// Releases queued commands the policy now allows.
    ///
    /// Each released command is re-checked against `state`; commands no
    /// longer permitted are returned separately, unwritten.
    pub fn drain_ready(
        &mut self,
        state: &ConnectionState,
    ) -> (Vec<Outbound>, Vec<PendingCommand>) {
        let mut ready = Vec::new();
        let mut rejected = Vec::new();

        while let Some(front) = self.queue.front() {
            if !front
                .command
                .permitted_states()
                .contains(state.kind())
            {
                if let Some(pending) = self.queue.pop_front() {
                    rejected.push(pending);
                }
                continue;
            }
            if !self.can_send(front) {
                break;
            }
            if let Some(pending) = self.queue.pop_front() {
                ready.push(self.dispatch(pending));
            }
        }

        (ready, rejected)
    }

    /// Removes the in-flight command owning `tag`.
    ///
    /// The second value is `true` if the command was still waiting for a
    /// continuation request; the writer must then drop its remaining parts.
    pub fn resolve(&mut self, tag: &Tag) -> Option<(PendingCommand, bool)> {
        let pending = self.in_flight.remove(tag)?;
        let aborted = match self.literals.iter().position(|(t, _)| t == tag) {
            Some(pos) => {
                self.literals.remove(pos);
                true
            }
            None => false,
        };
        Some((pending, aborted))
    }

    /// Finds the in-flight command that should absorb an untagged response.
    ///
    /// Candidates are commands declaring interest in `kind`. Candidates
    /// whose target mailbox matches `mailbox` win, the oldest first, since
    /// the server answers them in submission order. Without a mailbox match
    /// the most recently submitted candidate wins.
    pub fn claimant_mut(
        &mut self,
        kind: ResponseKind,
        mailbox: Option<&Mailbox>,
    ) -> Option<&mut PendingCommand> {
        let matches_mailbox = |p: &PendingCommand| match (mailbox, p.command.target_mailbox()) {
            (Some(wanted), Some(target)) => target.matches(wanted.as_str()),
            _ => false,
        };
        self.in_flight
            .values_mut()
            .filter(|p| p.command.wants(kind))
            .max_by_key(|p| {
                let matched = matches_mailbox(p);
                let order = if matched { u64::MAX - p.seq } else { p.seq };
                (matched, order)
            })
    }

    /// Consumes one continuation request.
    ///
    /// Returns the tag of the command whose next literal may now be sent, or
    /// `None` if no command is waiting for one.
    pub fn continuation(&mut self) -> Option<Tag> {
        let (tag, remaining) = self.literals.front_mut()?;
        let tag = tag.clone();
        *remaining -= 1;
        if *remaining == 0 {
            self.literals.pop_front();
        }
        Some(tag)
    }

    /// Removes every queued and in-flight command, oldest first.
    pub fn fail_all(&mut self) -> Vec<PendingCommand> {
        let mut all: Vec<_> = self
            .in_flight
            .drain()
            .map(|(_, p)| p)
            .chain(self.queue.drain(..))
            .collect();
        all.sort_by_key(|p| p.seq);
        self.literals.clear();
        all
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::protocol::SelectedState;
    use crate::types::MailboxStatus;

    fn pending(tag: &str, command: Command) -> (PendingCommand, oneshot::Receiver<Result<Completion>>) {
        let tag = Tag::new(tag);
        let transmit = command.encode(&tag, false);
        let (tx, rx) = oneshot::channel();
        (PendingCommand::new(tag, command, transmit, tx), rx)
    }

    fn getacl(mailbox: &str) -> Command {
        Command::GetAcl {
            mailbox: Mailbox::new(mailbox),
        }
    }

    fn select(mailbox: &str) -> Command {
        Command::Select {
            mailbox: Mailbox::new(mailbox),
        }
    }

    #[test]
    fn config_defaults_and_clamping() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.enabled);
        assert!(!config.allow_literals);
        assert_eq!(PipelineConfig::new().max_depth(100).max_depth, MAX_PIPELINE_DEPTH);
        assert_eq!(PipelineConfig::new().max_depth(0).max_depth, 1);
    }

    #[test]
    fn first_command_is_always_dispatched() {
        let mut pipeline = Pipeline::new(PipelineConfig::new().enabled(false));
        let (p, _rx) = pending("M0001", select("INBOX"));
        let out = pipeline.submit(p).unwrap();
        assert_eq!(out.tag.as_str(), "M0001");
        assert!(pipeline.is_in_flight(&Tag::new("M0001")));
    }

    #[test]
    fn safe_commands_pipeline_up_to_depth() {
        let mut pipeline = Pipeline::new(PipelineConfig::new().max_depth(2));
        let (a, _ra) = pending("M0001", getacl("A"));
        let (b, _rb) = pending("M0002", getacl("B"));
        let (c, _rc) = pending("M0003", getacl("C"));
        assert!(pipeline.submit(a).is_some());
        assert!(pipeline.submit(b).is_some());
        assert!(pipeline.submit(c).is_none());
        assert_eq!(pipeline.in_flight_count(), 2);
        assert_eq!(pipeline.queued_count(), 1);
    }

    #[test]
    fn unsafe_command_waits_and_blocks_followers() {
        let mut pipeline = Pipeline::default();
        let (a, _ra) = pending("M0001", getacl("A"));
        let (b, _rb) = pending("M0002", select("INBOX"));
        let (c, _rc) = pending("M0003", Command::Noop);
        assert!(pipeline.submit(a).is_some());
        assert!(pipeline.submit(b).is_none());
        // FIFO: NOOP may not overtake the queued SELECT.
        assert!(pipeline.submit(c).is_none());

        let _ = pipeline.resolve(&Tag::new("M0001")).unwrap();
        let (ready, rejected) = pipeline.drain_ready(&ConnectionState::Authenticated);
        assert!(rejected.is_empty());
        let tags: Vec<_> = ready.iter().map(|o| o.tag.as_str().to_string()).collect();
        assert_eq!(tags, vec!["M0002"]);

        let _ = pipeline.resolve(&Tag::new("M0002")).unwrap();
        let state = ConnectionState::Selected(SelectedState {
            mailbox: Mailbox::inbox(),
            read_only: false,
            status: MailboxStatus::default(),
        });
        let (ready, _) = pipeline.drain_ready(&state);
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].tag.as_str(), "M0003");
    }

    #[test]
    fn disabled_pipelining_sends_one_at_a_time() {
        let mut pipeline = Pipeline::new(PipelineConfig::new().enabled(false));
        let (a, _ra) = pending("M0001", Command::Noop);
        let (b, _rb) = pending("M0002", Command::Noop);
        assert!(pipeline.submit(a).is_some());
        assert!(pipeline.submit(b).is_none());
    }

    #[test]
    fn literal_commands_wait_unless_allowed() {
        let literal_acl = || Command::GetAcl {
            mailbox: Mailbox::new("Entw\u{fc}rfe"),
        };

        let mut pipeline = Pipeline::default();
        let (a, _ra) = pending("M0001", Command::Noop);
        let (b, _rb) = pending("M0002", literal_acl());
        assert!(b.has_literal());
        assert!(pipeline.submit(a).is_some());
        assert!(pipeline.submit(b).is_none());

        let mut pipeline = Pipeline::new(PipelineConfig::new().allow_literals(true));
        let (a, _ra) = pending("M0001", Command::Noop);
        let (b, _rb) = pending("M0002", literal_acl());
        assert!(pipeline.submit(a).is_some());
        assert!(pipeline.submit(b).is_some());
    }

    #[test]
    fn queued_command_rejected_when_state_changed() {
        let mut pipeline = Pipeline::default();
        let (logout, _r1) = pending("M0001", Command::Logout);
        let (acl, _r2) = pending("M0002", getacl("INBOX"));
        assert!(pipeline.submit(logout).is_some());
        assert!(pipeline.submit(acl).is_none());

        let _ = pipeline.resolve(&Tag::new("M0001")).unwrap();
        let (ready, rejected) = pipeline.drain_ready(&ConnectionState::Logout);
        assert!(ready.is_empty());
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].tag.as_str(), "M0002");
    }

    #[test]
    fn resolve_is_once_per_tag() {
        let mut pipeline = Pipeline::default();
        let (a, _ra) = pending("M0001", Command::Noop);
        pipeline.submit(a);
        assert!(pipeline.resolve(&Tag::new("M0001")).is_some());
        assert!(pipeline.resolve(&Tag::new("M0001")).is_none());
        assert!(pipeline.resolve(&Tag::new("X9999")).is_none());
    }

    #[test]
    fn claimant_prefers_matching_mailbox_then_newest() {
        let mut pipeline = Pipeline::default();
        for (tag, mailbox) in [("M0001", "A"), ("M0002", "B"), ("M0003", "C")] {
            let (p, _rx) = pending(tag, getacl(mailbox));
            pipeline.submit(p);
        }

        let b = Mailbox::new("B");
        let claimant = pipeline.claimant_mut(ResponseKind::Acl, Some(&b)).unwrap();
        assert_eq!(claimant.tag.as_str(), "M0002");

        let other = Mailbox::new("Z");
        let claimant = pipeline.claimant_mut(ResponseKind::Acl, Some(&other)).unwrap();
        assert_eq!(claimant.tag.as_str(), "M0003");

        assert!(pipeline.claimant_mut(ResponseKind::MyRights, None).is_none());
    }

    #[test]
    fn same_mailbox_claimant_is_the_oldest() {
        let mut pipeline = Pipeline::default();
        for tag in ["M0001", "M0002"] {
            let (p, _rx) = pending(tag, getacl("A"));
            pipeline.submit(p);
        }

        let a = Mailbox::new("A");
        let claimant = pipeline.claimant_mut(ResponseKind::Acl, Some(&a)).unwrap();
        assert_eq!(claimant.tag.as_str(), "M0001");

        let _ = pipeline.resolve(&Tag::new("M0001")).unwrap();
        let claimant = pipeline.claimant_mut(ResponseKind::Acl, Some(&a)).unwrap();
        assert_eq!(claimant.tag.as_str(), "M0002");
    }

    #[test]
    fn recorded_failure_replaces_success_but_not_server_errors() {
        let (mut p, rx) = pending("M0001", getacl("A"));
        p.fail(Error::Protocol("first".into()));
        p.fail(Error::Protocol("second".into()));
        let completion = p.complete(Status::Ok, None, "done".into());
        p.settle(completion);
        match rx.blocking_recv().unwrap() {
            Err(Error::Protocol(text)) => assert_eq!(text, "first"),
            other => panic!("expected the recorded failure, got {other:?}"),
        }

        let (mut p, rx) = pending("M0002", getacl("A"));
        p.fail(Error::Protocol("ignored".into()));
        let completion = p.complete(Status::No, Some(ResponseCode::NoPerm), "denied".into());
        p.settle(completion);
        assert!(matches!(rx.blocking_recv().unwrap(), Err(Error::No(text)) if text == "denied"));
    }

    #[test]
    fn continuation_accounting() {
        let mut pipeline = Pipeline::default();
        let command = Command::Login {
            username: "\u{e9}".into(),
            password: "\u{e8}".into(),
        };
        let (p, _rx) = pending("M0001", command);
        let out = pipeline.submit(p).unwrap();
        assert_eq!(out.transmit.parts().len(), 3);

        assert_eq!(pipeline.continuation().unwrap().as_str(), "M0001");
        assert_eq!(pipeline.continuation().unwrap().as_str(), "M0001");
        assert!(pipeline.continuation().is_none());
    }

    #[test]
    fn completion_during_literal_reports_abort() {
        let mut pipeline = Pipeline::default();
        let command = Command::Login {
            username: "\u{e9}".into(),
            password: "pw".into(),
        };
        let (p, _rx) = pending("M0001", command);
        pipeline.submit(p);
        let (_, aborted) = pipeline.resolve(&Tag::new("M0001")).unwrap();
        assert!(aborted);
        assert!(pipeline.continuation().is_none());
    }

    #[test]
    fn fail_all_returns_everything_in_submission_order() {
        let mut pipeline = Pipeline::new(PipelineConfig::new().max_depth(1));
        for tag in ["M0001", "M0002", "M0003"] {
            let (p, _rx) = pending(tag, Command::Noop);
            pipeline.submit(p);
        }
        let all = pipeline.fail_all();
        let tags: Vec<_> = all.iter().map(|p| p.tag.as_str()).collect();
        assert_eq!(tags, vec!["M0001", "M0002", "M0003"]);
        assert_eq!(pipeline.in_flight_count(), 0);
        assert_eq!(pipeline.queued_count(), 0);
    }

    #[test]
    fn no_with_nonexistent_maps_to_mailbox_not_found() {
        let (mut p, _rx) = pending("M0001", getacl("BibiMailbox"));
        let completion = p.complete(
            Status::No,
            Some(ResponseCode::NonExistent),
            "no such mailbox".into(),
        );
        match completion.into_result() {
            Err(Error::MailboxNotFound(name)) => assert_eq!(name, "BibiMailbox"),
            other => panic!("expected MailboxNotFound, got {other:?}"),
        }
    }

    #[test]
    fn plain_no_and_bad_map_to_server_errors() {
        let (mut p, _rx) = pending("M0001", getacl("INBOX"));
        let no = p.complete(Status::No, Some(ResponseCode::NoPerm), "denied".into());
        assert!(matches!(no.into_result(), Err(Error::No(text)) if text == "denied"));
        let bad = p.complete(Status::Bad, None, "syntax".into());
        assert!(matches!(bad.into_result(), Err(Error::Bad(text)) if text == "syntax"));
    }

    #[test]
    fn pipeline_safety_classes() {
        assert_eq!(Command::Noop.pipeline_safety(), PipelineSafety::Safe);
        assert_eq!(getacl("INBOX").pipeline_safety(), PipelineSafety::Safe);
        assert!(Command::SetAcl {
            mailbox: Mailbox::inbox(),
            identifier: "u".into(),
            modification: crate::types::RightModification::Add,
            rights: crate::types::RightSet::EMPTY,
        }
        .is_pipelineable());
        assert_eq!(select("INBOX").pipeline_safety(), PipelineSafety::Unsafe);
        assert!(!Command::Logout.is_pipelineable());
    }
}
