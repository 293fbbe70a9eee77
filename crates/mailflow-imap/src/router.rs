//! Response routing.
//!
//! The [`ResponseRouter`] runs on the connection's reader task and sees every
//! server response in arrival order:
//!
//! - tagged completions resolve the pending command owning the tag, apply
//!   its state transition and release queued commands
//! - untagged data goes to the in-flight command that asked for it, or is
//!   folded into connection state and passed to the [`ResponseHandler`]
//! - continuation requests let the writer send the next literal

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::command::Command;
use crate::connection::Shared;
use crate::handler::{self, ResponseHandler};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::protocol::Transition;
use crate::types::{ResponseCode, Status, Tag};
use crate::{Error, Result};

/// Instruction from the router to a writer waiting on a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WriterSignal {
    /// The server asked for the next literal of this command.
    Continue(Tag),
    /// The command completed; drop its unsent parts.
    Abort(Tag),
}

/// Dispatches parsed responses to pending commands, state and handler.
pub(crate) struct ResponseRouter {
    shared: Arc<Shared>,
    handler: Box<dyn ResponseHandler>,
    signals: mpsc::UnboundedSender<WriterSignal>,
    strict_tags: bool,
}

impl ResponseRouter {
    pub(crate) fn new(
        shared: Arc<Shared>,
        handler: Box<dyn ResponseHandler>,
        signals: mpsc::UnboundedSender<WriterSignal>,
        strict_tags: bool,
    ) -> Self {
        Self {
            shared,
            handler,
            signals,
            strict_tags,
        }
    }

    /// Routes one response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedTag`] for an unknown tag when strict tag
    /// checking is on; the caller closes the connection.
    pub(crate) fn route(&mut self, response: Response) -> Result<()> {
        match response {
            Response::Tagged {
                tag,
                status,
                code,
                text,
            } => self.tagged(tag, status, code, text),
            Response::Untagged(untagged) => {
                self.untagged(untagged);
                Ok(())
            }
            Response::Continuation { .. } => {
                self.continuation();
                Ok(())
            }
        }
    }

    fn tagged(
        &mut self,
        tag: Tag,
        status: Status,
        code: Option<ResponseCode>,
        text: String,
    ) -> Result<()> {
        if code == Some(ResponseCode::Alert) {
            self.handler.on_alert(&text);
        }

        let mut guard = self.shared.lock();
        let inner = &mut *guard;
        let Some((mut pending, aborted)) = inner.pipeline.resolve(&tag) else {
            tracing::warn!(%tag, ?status, "completion for unknown tag");
            if self.strict_tags {
                return Err(Error::UnexpectedTag(tag.0));
            }
            return Ok(());
        };
        if aborted {
            tracing::debug!(%tag, "completion arrived before literal was sent");
            let _ = self.signals.send(WriterSignal::Abort(tag.clone()));
        }

        let completion = pending.complete(status, code, text);
        inner.state.apply(pending.command.transition(&completion));

        if let Some(ResponseCode::Capability(caps)) = &completion.code {
            inner.capabilities.clone_from(caps);
        }
        if matches!(pending.command, Command::Capability) {
            for response in &completion.responses {
                if let UntaggedResponse::Capability(caps) = response {
                    inner.capabilities.clone_from(caps);
                }
            }
        }

        tracing::debug!(
            %tag,
            command = pending.command.name(),
            status = status.as_str(),
            "command resolved"
        );
        pending.settle(completion);
        inner.release();
        Ok(())
    }

    fn untagged(&mut self, response: UntaggedResponse) {
        if let Some(text) = alert_text(&response) {
            self.handler.on_alert(text);
        }

        let folded = {
            let mut guard = self.shared.lock();
            let inner = &mut *guard;

            if let Some(pending) = inner
                .pipeline
                .claimant_mut(response.kind(), response.mailbox())
            {
                tracing::trace!(tag = %pending.tag, kind = ?response.kind(), "response claimed");
                pending.responses.push(response);
                return;
            }

            match &response {
                UntaggedResponse::Capability(caps) => {
                    inner.capabilities.clone_from(caps);
                    true
                }
                UntaggedResponse::Ok {
                    code: Some(ResponseCode::Capability(caps)),
                    ..
                } => {
                    inner.capabilities.clone_from(caps);
                    true
                }
                UntaggedResponse::Bye { text, .. } => {
                    tracing::info!(text, "server said BYE");
                    inner.state.apply(Transition::Logout);
                    true
                }
                other => inner.state.absorb(other),
            }
        };

        let handled = handler::dispatch(self.handler.as_mut(), &response);
        if !folded && !handled {
            tracing::debug!(kind = ?response.kind(), "discarding unclaimed response");
        }
    }

    fn continuation(&self) {
        let tag = self.shared.lock().pipeline.continuation();
        match tag {
            Some(tag) => {
                tracing::trace!(%tag, "continuation request");
                let _ = self.signals.send(WriterSignal::Continue(tag));
            }
            None => tracing::warn!("unexpected continuation request"),
        }
    }

    /// Handles a response that failed to parse.
    ///
    /// If it starts with the tag of an in-flight command, that command fails
    /// with the parse error instead of waiting forever. Untagged data goes
    /// to the command that would have claimed it, which then fails when it
    /// completes rather than succeeding without that data.
    pub(crate) fn unparseable(&self, raw: &[u8], error: Error) {
        let line = String::from_utf8_lossy(raw);
        tracing::warn!(%error, line = %line.trim_end(), "dropping unparseable response");

        if let Some((kind, mailbox)) = ResponseParser::identify_untagged(raw) {
            let mut guard = self.shared.lock();
            if let Some(pending) = guard.pipeline.claimant_mut(kind, mailbox.as_ref()) {
                tracing::debug!(tag = %pending.tag, ?kind, "unreadable data fails its command");
                pending.fail(error);
            }
            return;
        }

        let Some(tag) = line.split(' ').next().filter(|t| !t.is_empty()) else {
            return;
        };
        let tag = Tag::new(tag);
        let mut guard = self.shared.lock();
        let inner = &mut *guard;
        if let Some((pending, aborted)) = inner.pipeline.resolve(&tag) {
            if aborted {
                let _ = self.signals.send(WriterSignal::Abort(tag));
            }
            pending.fulfil(Err(error));
            inner.release();
        }
    }

    /// Ends routing; every unresolved command fails.
    pub(crate) fn close(&self, reason: Option<&Error>) {
        self.shared.close(reason);
    }
}

fn alert_text(response: &UntaggedResponse) -> Option<&str> {
    match response {
        UntaggedResponse::Ok {
            code: Some(ResponseCode::Alert),
            text,
        }
        | UntaggedResponse::No {
            code: Some(ResponseCode::Alert),
            text,
        }
        | UntaggedResponse::Bad {
            code: Some(ResponseCode::Alert),
            text,
        }
        | UntaggedResponse::Bye {
            code: Some(ResponseCode::Alert),
            text,
        } => Some(text),
        _ => None,
    }
}
