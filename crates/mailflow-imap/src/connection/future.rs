//! Futures returned by command submission.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::pipeline::Completion;
use crate::types::Tag;
use crate::{Error, Result};

/// The eventual outcome of one submitted command.
///
/// The command is already queued or written when this value exists; polling
/// only waits for its completion. Dropping the future abandons the result
/// without cancelling the command.
#[must_use = "the command is sent regardless; drop the future to ignore its outcome"]
#[derive(Debug)]
pub struct CommandFuture<T> {
    tag: Option<Tag>,
    receiver: oneshot::Receiver<Result<Completion>>,
    extract: fn(Completion) -> Result<T>,
}

impl CommandFuture<Completion> {
    pub(crate) fn new(tag: Option<Tag>, receiver: oneshot::Receiver<Result<Completion>>) -> Self {
        Self {
            tag,
            receiver,
            extract: Ok,
        }
    }

    /// Converts the successful completion into a typed result.
    pub(crate) fn map<U>(self, extract: fn(Completion) -> Result<U>) -> CommandFuture<U> {
        CommandFuture {
            tag: self.tag,
            receiver: self.receiver,
            extract,
        }
    }
}

impl<T> CommandFuture<T> {
    /// Tag assigned to the command, or `None` if it was rejected before
    /// reaching the pipeline.
    #[must_use]
    pub const fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }
}

impl<T> Future for CommandFuture<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(Ok(completion))) => Poll::Ready((this.extract)(completion)),
            Poll::Ready(Ok(Err(error))) => Poll::Ready(Err(error)),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::ConnectionClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Status;

    fn completion() -> Completion {
        Completion {
            tag: Tag::new("M0001"),
            status: Status::Ok,
            code: None,
            text: "done".into(),
            mailbox: None,
            responses: Vec::new(),
        }
    }

    #[tokio::test]
    async fn resolves_with_extracted_value() {
        let (tx, rx) = oneshot::channel();
        let future = CommandFuture::new(Some(Tag::new("M0001")), rx).map(|c| Ok(c.text));
        assert_eq!(future.tag().unwrap().as_str(), "M0001");
        tx.send(Ok(completion())).unwrap();
        assert_eq!(future.await.unwrap(), "done");
    }

    #[tokio::test]
    async fn dropped_sender_is_connection_closed() {
        let (tx, rx) = oneshot::channel::<Result<Completion>>();
        let future = CommandFuture::new(None, rx);
        drop(tx);
        assert!(matches!(future.await, Err(Error::ConnectionClosed)));
    }

    #[tokio::test]
    async fn errors_pass_through() {
        let (tx, rx) = oneshot::channel();
        let future = CommandFuture::new(None, rx);
        tx.send(Err(Error::No("denied".into()))).unwrap();
        assert!(matches!(future.await, Err(Error::No(text)) if text == "denied"));
    }
}
