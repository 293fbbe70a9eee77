//! One client connection: framing, state and responses.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use mailflow_imap::parser::lexer::is_astring_char;
use mailflow_imap::{Command, Mailbox, RightSet, StateKind};
use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
    WriteHalf,
};
use tracing::{debug, trace};

use crate::command::{self, Rejection};
use crate::store::{Outcome, Store};

/// Largest literal a client may send.
const MAX_LITERAL: usize = 1 << 20;

const FLAGS: &str = r"\Answered \Flagged \Deleted \Seen \Draft";

/// Behaviour switches shared by every session of one server.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub literal_plus: bool,
}

impl Options {
    fn capabilities(self) -> String {
        let mut caps = String::from("IMAP4rev1 ACL RIGHTS=texk UNSELECT");
        if self.literal_plus {
            caps.push_str(" LITERAL+");
        }
        caps
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    NotAuthenticated,
    Authenticated { user: String },
    Selected { user: String, mailbox: String },
    Logout,
}

impl Phase {
    const fn kind(&self) -> StateKind {
        match self {
            Self::NotAuthenticated => StateKind::NotAuthenticated,
            Self::Authenticated { .. } => StateKind::Authenticated,
            Self::Selected { .. } => StateKind::Selected,
            Self::Logout => StateKind::Logout,
        }
    }

    /// Logged-in user; empty before LOGIN, which no ACL grants rights to.
    fn user(&self) -> String {
        match self {
            Self::Authenticated { user } | Self::Selected { user, .. } => user.clone(),
            Self::NotAuthenticated | Self::Logout => String::new(),
        }
    }
}

pub struct Session<S> {
    reader: BufReader<ReadHalf<S>>,
    writer: WriteHalf<S>,
    store: Arc<Mutex<Store>>,
    options: Options,
    phase: Phase,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite,
{
    pub fn new(stream: S, store: Arc<Mutex<Store>>, options: Options) -> Self {
        let (read, writer) = tokio::io::split(stream);
        Self {
            reader: BufReader::new(read),
            writer,
            store,
            options,
            phase: Phase::NotAuthenticated,
        }
    }

    /// Greets the client and answers commands until LOGOUT or end of input.
    pub async fn run(mut self) -> io::Result<()> {
        let greeting = format!(
            "* OK [CAPABILITY {}] mailflow testing server ready\r\n",
            self.options.capabilities()
        );
        self.send(greeting.as_bytes()).await?;

        while let Some(line) = self.read_command().await? {
            let response = match command::parse(&line) {
                Ok((tag, command)) => self.execute(&tag, command),
                Err(Rejection { tag, reason }) => {
                    debug!(%reason, "rejecting command line");
                    format!("{} BAD {reason}\r\n", tag.as_deref().unwrap_or("*")).into_bytes()
                }
            };
            self.send(&response).await?;
            if self.phase == Phase::Logout {
                break;
            }
        }

        debug!("session finished");
        // The client may already have gone away.
        let _ = self.writer.shutdown().await;
        Ok(())
    }

    /// Reads one command with its literals inlined. Returns `None` at end
    /// of input between commands.
    async fn read_command(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut command = Vec::new();
        loop {
            let start = command.len();
            if self.reader.read_until(b'\n', &mut command).await? == 0 {
                return if command.is_empty() {
                    Ok(None)
                } else {
                    Err(io::ErrorKind::UnexpectedEof.into())
                };
            }
            trace!(line = %String::from_utf8_lossy(&command[start..]).trim_end(), "C:");

            let Some((len, synchronizing)) = literal_announcement(&command[start..]) else {
                return Ok(Some(command));
            };
            if len > MAX_LITERAL {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("literal of {len} bytes exceeds {MAX_LITERAL}"),
                ));
            }
            if synchronizing {
                self.send(b"+ Ready for literal data\r\n").await?;
            }
            let mut data = vec![0; len];
            self.reader.read_exact(&mut data).await?;
            command.extend_from_slice(&data);
        }
    }

    async fn send(&mut self, data: &[u8]) -> io::Result<()> {
        trace!(data = %String::from_utf8_lossy(data).trim_end(), "S:");
        self.writer.write_all(data).await?;
        self.writer.flush().await
    }

    /// Runs one command, returning every response line it produced.
    fn execute(&mut self, tag: &str, command: Command) -> Vec<u8> {
        let name = command.name();
        let state = self.phase.kind();
        if !command.permitted_states().contains(state) {
            debug!(tag, command = name, %state, "command not allowed");
            return format!("{tag} BAD {name} not allowed in the {state} state\r\n").into_bytes();
        }

        debug!(tag, command = name, "executing");
        let mut out = Vec::new();
        match self.apply(command, &mut out) {
            Ok(text) => out.extend_from_slice(format!("{tag} OK {text}\r\n").as_bytes()),
            Err(refusal) => {
                debug!(tag, command = name, %refusal, "refused");
                out.extend_from_slice(format!("{tag} NO {refusal}\r\n").as_bytes());
            }
        }
        out
    }

    /// Applies a permitted command, writing untagged data to `out` and
    /// returning the text of the tagged OK.
    fn apply(&mut self, command: Command, out: &mut Vec<u8>) -> Outcome<String> {
        let user = self.phase.user();
        let store = Arc::clone(&self.store);
        let mut store = store.lock().unwrap_or_else(PoisonError::into_inner);
        let done = |name: &str| format!("{name} completed");

        match command {
            Command::Capability => {
                out.extend_from_slice(
                    format!("* CAPABILITY {}\r\n", self.options.capabilities()).as_bytes(),
                );
                Ok(done("CAPABILITY"))
            }
            Command::Noop => Ok(done("NOOP")),
            Command::Logout => {
                out.extend_from_slice(b"* BYE mailflow testing server logging out\r\n");
                self.phase = Phase::Logout;
                Ok(done("LOGOUT"))
            }
            Command::Login { username, password } => {
                store.authenticate(&username, &password)?;
                self.phase = Phase::Authenticated { user: username };
                Ok(format!(
                    "[CAPABILITY {}] LOGIN completed",
                    self.options.capabilities()
                ))
            }
            Command::Select { mailbox } => self.open(&store, user, &mailbox, false, out),
            Command::Examine { mailbox } => self.open(&store, user, &mailbox, true, out),
            Command::Create { mailbox } => {
                store.create(&user, mailbox.as_str())?;
                Ok(done("CREATE"))
            }
            Command::Delete { mailbox } => {
                store.delete(&user, mailbox.as_str())?;
                if matches!(&self.phase, Phase::Selected { mailbox: open, .. } if *open == canonical(&mailbox))
                {
                    self.phase = Phase::Authenticated { user };
                }
                Ok(done("DELETE"))
            }
            Command::Close => {
                self.phase = Phase::Authenticated { user };
                Ok(done("CLOSE"))
            }
            Command::Unselect => {
                self.phase = Phase::Authenticated { user };
                Ok(done("UNSELECT"))
            }
            Command::SetAcl {
                mailbox,
                identifier,
                modification,
                rights,
            } => {
                store.set_acl(&user, mailbox.as_str(), &identifier, modification, rights)?;
                Ok(done("SETACL"))
            }
            Command::DeleteAcl {
                mailbox,
                identifier,
            } => {
                store.delete_acl(&user, mailbox.as_str(), &identifier)?;
                Ok(done("DELETEACL"))
            }
            Command::GetAcl { mailbox } => {
                let entries = store.get_acl(&user, mailbox.as_str())?;
                out.extend_from_slice(b"* ACL ");
                push_mailbox(out, &mailbox);
                for (identifier, rights) in entries {
                    out.push(b' ');
                    push_astring(out, &identifier);
                    out.push(b' ');
                    push_rights(out, rights);
                }
                out.extend_from_slice(b"\r\n");
                Ok(done("GETACL"))
            }
            Command::ListRights {
                mailbox,
                identifier,
            } => {
                let grantable = store.list_rights(&user, mailbox.as_str(), &identifier)?;
                out.extend_from_slice(b"* LISTRIGHTS ");
                push_mailbox(out, &mailbox);
                out.push(b' ');
                push_astring(out, &identifier);
                out.push(b' ');
                push_rights(out, grantable.required);
                for group in grantable.optional {
                    out.push(b' ');
                    push_rights(out, group);
                }
                out.extend_from_slice(b"\r\n");
                Ok(done("LISTRIGHTS"))
            }
            Command::MyRights { mailbox } => {
                let rights = store.my_rights(&user, mailbox.as_str())?;
                out.extend_from_slice(b"* MYRIGHTS ");
                push_mailbox(out, &mailbox);
                out.push(b' ');
                push_rights(out, rights);
                out.extend_from_slice(b"\r\n");
                Ok(done("MYRIGHTS"))
            }
        }
    }

    /// SELECT or EXAMINE. A failed attempt leaves no mailbox selected.
    fn open(
        &mut self,
        store: &Store,
        user: String,
        mailbox: &Mailbox,
        examine: bool,
        out: &mut Vec<u8>,
    ) -> Outcome<String> {
        let name = if examine { "EXAMINE" } else { "SELECT" };
        let opened = store.open(&user, mailbox.as_str(), examine);
        self.phase = Phase::Authenticated { user };
        let opened = opened?;

        out.extend_from_slice(format!("* FLAGS ({FLAGS})\r\n").as_bytes());
        out.extend_from_slice(b"* 0 EXISTS\r\n* 0 RECENT\r\n");
        out.extend_from_slice(
            format!("* OK [UIDVALIDITY {}] UIDs valid\r\n", opened.uid_validity).as_bytes(),
        );
        out.extend_from_slice(b"* OK [UIDNEXT 1] Predicted next UID\r\n");

        self.phase = Phase::Selected {
            user: self.phase.user(),
            mailbox: canonical(mailbox),
        };
        let access = if opened.read_only {
            "READ-ONLY"
        } else {
            "READ-WRITE"
        };
        Ok(format!("[{access}] {name} completed"))
    }
}

/// Parses a trailing `{n}` or `{n+}`, returning the length and whether the
/// client waits for a continuation request.
fn literal_announcement(line: &[u8]) -> Option<(usize, bool)> {
    let line = line
        .strip_suffix(b"\r\n")
        .or_else(|| line.strip_suffix(b"\n"))?;
    let inner = line.strip_suffix(b"}")?;
    let open = inner.iter().rposition(|&b| b == b'{')?;
    let size = &inner[open + 1..];
    let (digits, synchronizing) = match size.strip_suffix(b"+") {
        Some(digits) => (digits, false),
        None => (size, true),
    };
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits)
        .ok()?
        .parse()
        .ok()
        .map(|len| (len, synchronizing))
}

/// Mailbox names are echoed as sent, except that INBOX is normalised.
fn canonical(mailbox: &Mailbox) -> String {
    if mailbox.matches("INBOX") {
        "INBOX".to_string()
    } else {
        mailbox.as_str().to_string()
    }
}

fn push_mailbox(out: &mut Vec<u8>, mailbox: &Mailbox) {
    push_astring(out, &canonical(mailbox));
}

fn push_rights(out: &mut Vec<u8>, rights: RightSet) {
    push_astring(out, &rights.to_string());
}

/// Writes an atom where possible, a quoted string for other printable
/// ASCII, and a literal for anything else.
fn push_astring(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    if !bytes.is_empty() && bytes.iter().all(|&b| is_astring_char(b)) {
        out.extend_from_slice(bytes);
    } else if bytes
        .iter()
        .any(|&b| b == b'\r' || b == b'\n' || b == 0 || b >= 0x80)
    {
        out.extend_from_slice(format!("{{{}}}\r\n", bytes.len()).as_bytes());
        out.extend_from_slice(bytes);
    } else {
        out.push(b'"');
        for &b in bytes {
            if b == b'"' || b == b'\\' {
                out.push(b'\\');
            }
            out.push(b);
        }
        out.push(b'"');
    }
}
