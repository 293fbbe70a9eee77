//! The asynchronous IMAP client.
//!
//! A [`Client`] is a cheap, cloneable handle to one connection. Each
//! connection runs two tasks:
//!
//! - the reader, which frames and parses server responses and hands them to
//!   the response router
//! - the writer, which writes released commands in order and waits for
//!   continuation requests between literal parts
//!
//! All command methods take `&self` and return a [`CommandFuture`] without
//! waiting; commands may be issued concurrently from several tasks.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use super::config::Config;
use super::framed::{FramedReader, FramedWriter};
use super::future::CommandFuture;
use super::shared::Shared;
use super::stream;
use crate::command::{self, Command};
use crate::handler::{LoggingHandler, ResponseHandler};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::pipeline::{Completion, Outbound};
use crate::protocol::ConnectionState;
use crate::router::{ResponseRouter, WriterSignal};
use crate::types::{Capability, Mailbox, MailboxStatus, ResponseCode};
use crate::{Error, Result};

/// Handle to an IMAP connection.
#[derive(Debug, Clone)]
pub struct Client {
    shared: Arc<Shared>,
}

impl Client {
    /// Connects to the server named by `config` and reads its greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection, TLS handshake or greeting fails.
    pub async fn connect(config: &Config) -> Result<Self> {
        let stream = stream::connect(config).await?;
        Self::from_stream(stream, config).await
    }

    /// Starts a client over an already-open stream.
    ///
    /// Unsolicited responses are logged through [`LoggingHandler`].
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting cannot be read, is `BYE`, or is not
    /// a greeting at all.
    pub async fn from_stream<S>(stream: S, config: &Config) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::with_handler(stream, config, LoggingHandler).await
    }

    /// Starts a client over an already-open stream with a custom handler
    /// for unsolicited responses.
    ///
    /// # Errors
    ///
    /// See [`Client::from_stream`].
    pub async fn with_handler<S, H>(stream: S, config: &Config, handler: H) -> Result<Self>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
        H: ResponseHandler + 'static,
    {
        let (read_half, write_half) = tokio::io::split(stream);
        let mut reader = FramedReader::new(read_half);
        let (state, capabilities) = read_greeting(&mut reader).await?;
        tracing::debug!(state = %state.kind(), ?capabilities, "greeting received");

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::new(
            state,
            capabilities,
            config.tag_prefix,
            config.pipeline.clone(),
            outbound_tx,
        ));

        let router = ResponseRouter::new(
            Arc::clone(&shared),
            Box::new(handler),
            signal_tx,
            config.strict_tags,
        );
        tokio::spawn(read_loop(reader, router));
        tokio::spawn(write_loop(
            FramedWriter::new(write_half),
            outbound_rx,
            signal_rx,
            Arc::clone(&shared),
        ));

        Ok(Self { shared })
    }

    /// Submits a command.
    ///
    /// The command is checked against the current state, tagged and queued
    /// or written before this returns. A command not permitted in the
    /// current state resolves with [`Error::State`] and is never sent.
    pub fn submit(&self, command: Command) -> CommandFuture<Completion> {
        self.shared.submit(command)
    }

    /// Returns a snapshot of the connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.lock().state.clone()
    }

    /// Returns the capabilities last announced by the server.
    #[must_use]
    pub fn capabilities(&self) -> Vec<Capability> {
        self.shared.lock().capabilities.clone()
    }

    /// Checks if the server announced a capability.
    #[must_use]
    pub fn has_capability(&self, capability: &Capability) -> bool {
        self.shared.lock().capabilities.contains(capability)
    }

    /// Returns `true` once the transport has closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Requests the server's capabilities.
    pub fn capability(&self) -> CommandFuture<Vec<Capability>> {
        self.submit(Command::Capability).map(|completion| {
            completion
                .responses
                .into_iter()
                .rev()
                .find_map(|response| match response {
                    UntaggedResponse::Capability(caps) => Some(caps),
                    _ => None,
                })
                .ok_or_else(|| Error::Protocol("CAPABILITY completed without data".to_string()))
        })
    }

    /// Sends NOOP, giving the server a chance to report mailbox changes.
    pub fn noop(&self) -> CommandFuture<()> {
        self.submit(Command::Noop).map(discard)
    }

    /// Logs in with a username and password.
    pub fn login(&self, username: &str, password: &str) -> CommandFuture<()> {
        self.submit(Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        })
        .map(discard)
    }

    /// Logs out. The connection ends in the logout state.
    pub fn logout(&self) -> CommandFuture<()> {
        self.submit(Command::Logout).map(discard)
    }

    /// Selects a mailbox for read-write access.
    pub fn select(&self, mailbox: impl Into<Mailbox>) -> CommandFuture<MailboxStatus> {
        self.submit(Command::Select {
            mailbox: mailbox.into(),
        })
        .map(selected_status)
    }

    /// Selects a mailbox read-only.
    pub fn examine(&self, mailbox: impl Into<Mailbox>) -> CommandFuture<MailboxStatus> {
        self.submit(Command::Examine {
            mailbox: mailbox.into(),
        })
        .map(selected_status)
    }

    /// Creates a mailbox.
    pub fn create(&self, mailbox: impl Into<Mailbox>) -> CommandFuture<()> {
        self.submit(Command::Create {
            mailbox: mailbox.into(),
        })
        .map(discard)
    }

    /// Deletes a mailbox.
    pub fn delete(&self, mailbox: impl Into<Mailbox>) -> CommandFuture<()> {
        self.submit(Command::Delete {
            mailbox: mailbox.into(),
        })
        .map(discard)
    }

    /// Closes the selected mailbox.
    pub fn close(&self) -> CommandFuture<()> {
        self.submit(Command::Close).map(discard)
    }

    /// Leaves the selected mailbox without expunging (RFC 3691).
    pub fn unselect(&self) -> CommandFuture<()> {
        self.submit(Command::Unselect).map(discard)
    }
}

#[allow(clippy::unnecessary_wraps, clippy::needless_pass_by_value)]
fn discard(_: Completion) -> Result<()> {
    Ok(())
}

#[allow(clippy::unnecessary_wraps, clippy::needless_pass_by_value)]
fn selected_status(completion: Completion) -> Result<MailboxStatus> {
    Ok(command::status_from(&completion.responses))
}

/// Reads the server greeting and derives the initial state from it.
async fn read_greeting<R>(reader: &mut FramedReader<R>) -> Result<(ConnectionState, Vec<Capability>)>
where
    R: AsyncRead + Unpin,
{
    let raw = reader
        .read_response()
        .await?
        .ok_or(Error::ConnectionClosed)?;

    let capabilities = |code: Option<ResponseCode>| match code {
        Some(ResponseCode::Capability(caps)) => caps,
        _ => Vec::new(),
    };
    match ResponseParser::parse(&raw)? {
        Response::Untagged(UntaggedResponse::Ok { code, .. }) => {
            Ok((ConnectionState::NotAuthenticated, capabilities(code)))
        }
        Response::Untagged(UntaggedResponse::PreAuth { code, .. }) => {
            Ok((ConnectionState::Authenticated, capabilities(code)))
        }
        Response::Untagged(UntaggedResponse::Bye { text, .. }) => Err(Error::Bye(text)),
        other => Err(Error::Protocol(format!("unexpected greeting: {other:?}"))),
    }
}

async fn read_loop<R>(mut reader: FramedReader<R>, mut router: ResponseRouter)
where
    R: AsyncRead + Unpin,
{
    let reason = loop {
        match reader.read_response().await {
            Ok(Some(raw)) => match ResponseParser::parse(&raw) {
                Ok(response) => {
                    if let Err(error) = router.route(response) {
                        break Some(error);
                    }
                }
                Err(error) => router.unparseable(&raw, error),
            },
            Ok(None) => break None,
            Err(error) => break Some(error),
        }
    };
    router.close(reason.as_ref());
}

async fn write_loop<W>(
    writer: FramedWriter<W>,
    outbound: mpsc::UnboundedReceiver<Outbound>,
    signals: mpsc::UnboundedReceiver<WriterSignal>,
    shared: Arc<Shared>,
) where
    W: AsyncWrite + Unpin,
{
    if let Err(error) = write_commands(writer, outbound, signals).await {
        shared.close(Some(&error));
    }
}

async fn write_commands<W>(
    mut writer: FramedWriter<W>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    mut signals: mpsc::UnboundedReceiver<WriterSignal>,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(Outbound { tag, transmit }) = outbound.recv().await {
        let mut parts = transmit.into_parts().into_iter();
        if let Some(first) = parts.next() {
            writer.write_part(&first).await?;
        }

        'parts: for part in parts {
            loop {
                match signals.recv().await {
                    Some(WriterSignal::Continue(t)) if t == tag => break,
                    Some(WriterSignal::Abort(t)) if t == tag => break 'parts,
                    Some(stale) => tracing::trace!(?stale, "ignoring stale writer signal"),
                    None => return Ok(()),
                }
            }
            writer.write_part(&part).await?;
        }
    }
    writer.shutdown().await
}
