//! Connection state shared by the client handles and the reader task.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, oneshot};

use crate::command::{Command, TagGenerator};
use crate::pipeline::{Completion, Outbound, PendingCommand, Pipeline, PipelineConfig};
use crate::protocol::ConnectionState;
use crate::types::Capability;
use crate::{Error, Result};

use super::future::CommandFuture;

/// Everything guarded by the connection mutex.
#[derive(Debug)]
pub(crate) struct Inner {
    pub(crate) state: ConnectionState,
    pub(crate) pipeline: Pipeline,
    pub(crate) capabilities: Vec<Capability>,
    tags: TagGenerator,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
    closed: bool,
}

impl Inner {
    /// Hands a released command to the writer task.
    fn send(&self, outbound: Outbound) {
        match &self.outbound {
            Some(writer) => {
                if writer.send(outbound).is_err() {
                    tracing::warn!("writer task is gone; command will fail on close");
                }
            }
            None => tracing::warn!(tag = %outbound.tag, "command released after close"),
        }
    }

    /// Releases queued commands after a completion freed pipeline room.
    pub(crate) fn release(&mut self) {
        let (ready, rejected) = self.pipeline.drain_ready(&self.state);
        for outbound in ready {
            self.send(outbound);
        }
        for pending in rejected {
            let error = Error::State {
                command: pending.command.name(),
                state: self.state.kind(),
            };
            tracing::debug!(tag = %pending.tag, %error, "queued command rejected");
            pending.fulfil(Err(error));
        }
    }
}

/// Shared connection state.
#[derive(Debug)]
pub(crate) struct Shared {
    inner: Mutex<Inner>,
}

impl Shared {
    pub(crate) fn new(
        state: ConnectionState,
        capabilities: Vec<Capability>,
        tag_prefix: char,
        pipeline: PipelineConfig,
        outbound: mpsc::UnboundedSender<Outbound>,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state,
                pipeline: Pipeline::new(pipeline),
                capabilities,
                tags: TagGenerator::new(tag_prefix),
                outbound: Some(outbound),
                closed: false,
            }),
        }
    }

    /// Locks the shared state.
    ///
    /// Critical sections never panic midway, so a poisoned lock still holds
    /// consistent data.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accepts a command for sending.
    ///
    /// State check, tag allocation, pending-set insertion and hand-off to
    /// the writer happen under one lock, so wire order equals tag order.
    pub(crate) fn submit(&self, command: Command) -> CommandFuture<Completion> {
        let (responder, receiver) = oneshot::channel();
        let mut inner = self.lock();

        match Self::admit(&inner, &command) {
            Ok(()) => {}
            Err(error) => {
                tracing::debug!(command = command.name(), %error, "command rejected locally");
                let _ = responder.send(Err(error));
                return CommandFuture::new(None, receiver);
            }
        }
        let tag = match inner.tags.next_tag() {
            Ok(tag) => tag,
            Err(error) => {
                let _ = responder.send(Err(error));
                return CommandFuture::new(None, receiver);
            }
        };

        let literal_plus = inner.capabilities.contains(&Capability::LiteralPlus);
        let transmit = command.encode(&tag, literal_plus);
        tracing::debug!(%tag, command = command.name(), "command submitted");

        let pending = PendingCommand::new(tag.clone(), command, transmit, responder);
        if let Some(outbound) = inner.pipeline.submit(pending) {
            inner.send(outbound);
        }
        CommandFuture::new(Some(tag), receiver)
    }

    fn admit(inner: &Inner, command: &Command) -> Result<()> {
        let state = inner.state.kind();
        if !command.permitted_states().contains(state) {
            return Err(Error::State {
                command: command.name(),
                state,
            });
        }
        if inner.closed {
            return Err(Error::ConnectionClosed);
        }
        Ok(())
    }

    /// Marks the connection closed and fails every unresolved command.
    pub(crate) fn close(&self, reason: Option<&Error>) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        inner.closed = true;
        inner.outbound = None;

        let pending = inner.pipeline.fail_all();
        match reason {
            Some(error) => {
                tracing::warn!(%error, pending = pending.len(), "connection lost");
            }
            None if !pending.is_empty() || inner.state != ConnectionState::Logout => {
                tracing::warn!(pending = pending.len(), "connection closed by server");
            }
            None => tracing::debug!("connection closed"),
        }
        for command in pending {
            command.fulfil(Err(Error::ConnectionClosed));
        }
    }

    /// Returns `true` once the transport has closed.
    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
