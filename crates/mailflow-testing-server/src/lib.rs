//! # mailflow-testing-server
//!
//! An in-memory IMAP server for exercising `mailflow-imap` clients without
//! a network. It speaks the same command subset the client does, with
//! RFC 4314 access control lists:
//!
//! - CAPABILITY, NOOP, LOGIN, LOGOUT
//! - SELECT, EXAMINE, CLOSE, UNSELECT, CREATE, DELETE
//! - SETACL, DELETEACL, GETACL, LISTRIGHTS, MYRIGHTS
//!
//! Each account owns its `INBOX`; every other mailbox name is shared by all
//! accounts and belongs to whoever created it. Creators receive every
//! RFC 4314 right. A mailbox on which a user holds no rights looks missing
//! to that user (`NO [NONEXISTENT]`), and ACL commands need the `a` right
//! (`NO [NOPERM]`).
//!
//! ```no_run
//! use mailflow_testing_server::Server;
//!
//! # async fn demo() -> mailflow_imap::Result<()> {
//! let server = Server::new().with_account("fred", "secret");
//! let client = server.login("fred", "secret").await?;
//! client.create("Shared").await?;
//! let acl = client.get_acl("Shared").await?;
//! assert!(acl.rights.contains_key("fred"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod command;
mod session;
mod store;

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use mailflow_imap::{Client, Config};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::session::{Options, Session};
use crate::store::Store;

pub use crate::store::ANYONE;

/// Buffer size of the in-memory pipe behind [`Server::connect`].
const PIPE_CAPACITY: usize = 64 * 1024;

/// A shared in-memory mail store served over any byte stream.
///
/// Clones share accounts and mailboxes, so several clients connected to
/// clones of one server see each other's changes.
#[derive(Debug, Clone)]
pub struct Server {
    store: Arc<Mutex<Store>>,
    options: Options,
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

impl Server {
    /// Creates a server with no accounts that advertises `LITERAL+`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
            options: Options { literal_plus: true },
        }
    }

    /// Adds an account, with its own `INBOX`.
    #[must_use]
    pub fn with_account(self, username: &str, password: &str) -> Self {
        self.add_account(username, password);
        self
    }

    /// Adds an account to a running server.
    pub fn add_account(&self, username: &str, password: &str) {
        self.store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add_account(username, password);
    }

    /// Sets whether `LITERAL+` is advertised. Without it clients must wait
    /// for a continuation request before each literal.
    #[must_use]
    pub const fn literal_plus(mut self, enabled: bool) -> Self {
        self.options.literal_plus = enabled;
        self
    }

    /// Serves one connection until the client logs out or disconnects.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream fails or the client sends a literal
    /// that is too large.
    pub async fn serve<S>(&self, stream: S) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite,
    {
        Session::new(stream, Arc::clone(&self.store), self.options)
            .run()
            .await
    }

    /// Serves one connection on a new task.
    pub fn spawn<S>(&self, stream: S) -> JoinHandle<io::Result<()>>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let server = self.clone();
        tokio::spawn(async move {
            let served = server.serve(stream).await;
            if let Err(err) = &served {
                warn!(%err, "session failed");
            }
            served
        })
    }

    /// Connects a new client over an in-memory pipe.
    ///
    /// # Errors
    ///
    /// Returns an error if the client rejects the greeting.
    pub async fn connect(&self) -> mailflow_imap::Result<Client> {
        self.connect_with(&Config::default()).await
    }

    /// Connects a new client with the given configuration. Only the tag
    /// prefix, tag strictness and pipeline settings apply; there is no
    /// transport to configure.
    ///
    /// # Errors
    ///
    /// Returns an error if the client rejects the greeting.
    pub async fn connect_with(&self, config: &Config) -> mailflow_imap::Result<Client> {
        let (client_io, server_io) = tokio::io::duplex(PIPE_CAPACITY);
        self.spawn(server_io);
        debug!("client connected over in-memory pipe");
        Client::from_stream(client_io, config).await
    }

    /// Connects a new client and logs in.
    ///
    /// # Errors
    ///
    /// Returns [`mailflow_imap::Error::No`] if the credentials are wrong.
    pub async fn login(&self, username: &str, password: &str) -> mailflow_imap::Result<Client> {
        let client = self.connect().await?;
        client.login(username, password).await?;
        Ok(client)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mailflow_imap::{Capability, Error, StateKind};

    use super::*;

    #[tokio::test]
    async fn greeting_advertises_acl() {
        let server = Server::new().with_account("fred", "secret");
        let client = server.connect().await.unwrap();
        assert_eq!(client.state().kind(), StateKind::NotAuthenticated);
        assert!(client.has_capability(&Capability::Acl));
        assert!(client.has_capability(&Capability::LiteralPlus));
    }

    #[tokio::test]
    async fn wrong_password_is_refused() {
        let server = Server::new().with_account("fred", "secret");
        let client = server.connect().await.unwrap();
        assert!(matches!(
            client.login("fred", "guess").await,
            Err(Error::No(_))
        ));
        assert_eq!(client.state().kind(), StateKind::NotAuthenticated);
    }

    #[tokio::test]
    async fn clones_share_the_store() {
        let server = Server::new().with_account("fred", "secret");
        let other = server.clone();
        other.add_account("bob", "builder");

        let fred = server.login("fred", "secret").await.unwrap();
        fred.create("Shared").await.unwrap();
        let bob = other.login("bob", "builder").await.unwrap();
        assert!(matches!(
            bob.create("Shared").await,
            Err(Error::No(_))
        ));
    }
}
