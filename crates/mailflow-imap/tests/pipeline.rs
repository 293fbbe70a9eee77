//! Wire-level tests of pipelining, tag correlation and routing.
//!
//! Each test plays the server side of an in-memory duplex pipe from a
//! script, so the exact bytes the client writes are checked.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use mailflow_imap::{
    ChannelHandler, Client, Config, ConnectionState, Error, Mailbox, PipelineConfig,
    RightModification, RightSet, StateKind, UnsolicitedEvent,
};
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};

struct Script {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl Script {
    async fn start(greeting: &str) -> (Client, Self) {
        Self::start_with(greeting, &Config::default()).await
    }

    async fn start_with(greeting: &str, config: &Config) -> (Client, Self) {
        let (client_io, server_io) = tokio::io::duplex(64 * 1024);
        let (read, mut writer) = tokio::io::split(server_io);
        writer.write_all(greeting.as_bytes()).await.unwrap();
        let client = Client::from_stream(client_io, config).await.unwrap();
        let script = Self {
            lines: BufReader::new(read).lines(),
            writer,
        };
        (client, script)
    }

    async fn recv(&mut self) -> String {
        tokio::time::timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("client wrote nothing")
            .unwrap()
            .unwrap()
    }

    async fn expect(&mut self, line: &str) {
        assert_eq!(self.recv().await, line);
    }

    async fn expect_silence(&mut self) {
        let waited = tokio::time::timeout(Duration::from_millis(100), self.lines.next_line()).await;
        assert!(waited.is_err(), "client wrote {waited:?}");
    }

    async fn send(&mut self, data: &str) {
        self.writer.write_all(data.as_bytes()).await.unwrap();
    }
}

fn rights(s: &str) -> RightSet {
    s.parse().unwrap()
}

#[tokio::test]
async fn pipelined_queries_resolve_out_of_order() {
    let (client, mut server) = Script::start("* PREAUTH ready\r\n").await;

    let a = client.get_acl("A");
    let b = client.my_rights("B");
    let c = client.get_acl("C");
    server.expect("M0001 GETACL A").await;
    server.expect("M0002 MYRIGHTS B").await;
    server.expect("M0003 GETACL C").await;

    server
        .send(concat!(
            "* ACL C carol lr\r\n",
            "M0003 OK done\r\n",
            "* MYRIGHTS B lrswi\r\n",
            "* ACL A alice lrswipkxtea\r\n",
            "M0002 OK done\r\n",
            "M0001 OK done\r\n",
        ))
        .await;

    let c = c.await.unwrap();
    assert_eq!(c.rights["carol"], rights("lr"));
    assert_eq!(b.await.unwrap().rights, rights("lrswi"));
    let a = a.await.unwrap();
    assert_eq!(a.mailbox, Mailbox::new("A"));
    assert_eq!(a.rights["alice"], rights("lrswipkxtea"));
}

#[tokio::test]
async fn concurrent_tasks_each_get_their_own_answers() {
    const GRANTED: [&str; 4] = ["lr", "lrs", "lrsw", "lrswi"];

    let config = Config::builder("localhost")
        .pipeline(PipelineConfig::new().max_depth(8))
        .build();
    let (client, mut server) = Script::start_with("* PREAUTH ready\r\n", &config).await;

    let tasks: Vec<_> = (0..GRANTED.len())
        .map(|n| {
            let client = client.clone();
            tokio::spawn(async move {
                let mailbox = format!("Box{n}");
                let (acl, mine) = tokio::join!(
                    client.get_acl(mailbox.as_str()),
                    client.my_rights(mailbox.as_str())
                );
                (n, acl.unwrap(), mine.unwrap())
            })
        })
        .collect();

    let mut requests = Vec::new();
    for _ in 0..2 * GRANTED.len() {
        requests.push(server.recv().await);
    }
    let mut reply = String::new();
    for request in requests.iter().rev() {
        let words: Vec<_> = request.split(' ').collect();
        let [tag, command, mailbox] = words[..] else {
            panic!("unexpected request {request}");
        };
        let n: usize = mailbox.trim_start_matches("Box").parse().unwrap();
        match command {
            "GETACL" => reply.push_str(&format!("* ACL {mailbox} user{n} lr\r\n")),
            "MYRIGHTS" => reply.push_str(&format!("* MYRIGHTS {mailbox} {}\r\n", GRANTED[n])),
            other => panic!("unexpected command {other}"),
        }
        reply.push_str(&format!("{tag} OK done\r\n"));
    }
    server.send(&reply).await;

    for task in tasks {
        let (n, acl, mine) = task.await.unwrap();
        assert_eq!(acl.mailbox, Mailbox::new(format!("Box{n}")));
        assert_eq!(acl.rights.len(), 1);
        assert_eq!(acl.rights[&format!("user{n}")], rights("lr"));
        assert_eq!(mine.mailbox, Mailbox::new(format!("Box{n}")));
        assert_eq!(mine.rights, rights(GRANTED[n]));
    }
}

#[tokio::test]
async fn unreadable_rights_fail_the_command() {
    let (client, mut server) = Script::start("* PREAUTH ready\r\n").await;

    let acl = client.get_acl("A");
    let mine = client.my_rights("A");
    server.expect("M0001 GETACL A").await;
    server.expect("M0002 MYRIGHTS A").await;
    server
        .send(concat!(
            "* ACL A alice lr bob lr9\r\n",
            "M0001 OK done\r\n",
            "* MYRIGHTS A lr9\r\n",
            "M0002 OK done\r\n",
        ))
        .await;

    match acl.await {
        Err(Error::InvalidRights { rights, right }) => {
            assert_eq!(rights, "lr9");
            assert_eq!(right, '9');
        }
        other => panic!("expected InvalidRights, got {other:?}"),
    }
    assert!(matches!(
        mine.await,
        Err(Error::InvalidRights { right: '9', .. })
    ));

    let noop = client.noop();
    server.expect("M0003 NOOP").await;
    server.send("M0003 OK done\r\n").await;
    noop.await.unwrap();
}

#[tokio::test]
async fn same_mailbox_queries_are_answered_in_order() {
    let (client, mut server) = Script::start("* PREAUTH ready\r\n").await;

    let first = client.get_acl("A");
    let second = client.get_acl("A");
    server.expect("M0001 GETACL A").await;
    server.expect("M0002 GETACL A").await;
    server
        .send(concat!(
            "* ACL A alice lr\r\n",
            "M0001 OK done\r\n",
            "* ACL A alice lr bob lrs\r\n",
            "M0002 OK done\r\n",
        ))
        .await;

    assert_eq!(first.await.unwrap().rights.len(), 1);
    let second = second.await.unwrap();
    assert_eq!(second.rights.len(), 2);
    assert_eq!(second.rights["bob"], rights("lrs"));
}

#[tokio::test]
async fn state_changing_command_waits_for_the_pipeline_to_drain() {
    let (client, mut server) = Script::start("* PREAUTH ready\r\n").await;

    let acl = client.get_acl("INBOX");
    let select = client.select("INBOX");
    let mine = client.my_rights("INBOX");
    server.expect("M0001 GETACL INBOX").await;
    server.expect_silence().await;

    server.send("M0001 OK done\r\n").await;
    server.expect("M0002 SELECT INBOX").await;
    server.expect_silence().await;

    server
        .send("* 5 EXISTS\r\n* OK [UIDVALIDITY 42] ok\r\nM0002 OK [READ-WRITE] selected\r\n")
        .await;
    server.expect("M0003 MYRIGHTS INBOX").await;
    server.send("* MYRIGHTS INBOX lrs\r\nM0003 OK done\r\n").await;

    acl.await.unwrap();
    let status = select.await.unwrap();
    assert_eq!(status.exists, 5);
    assert_eq!(status.uid_validity.unwrap().get(), 42);
    assert_eq!(mine.await.unwrap().rights, rights("lrs"));
    assert_eq!(client.state().kind(), StateKind::Selected);
}

#[tokio::test]
async fn depth_limit_holds_commands_back() {
    let config = Config::builder("localhost")
        .pipeline(PipelineConfig::new().max_depth(2))
        .build();
    let (client, mut server) = Script::start_with("* PREAUTH ready\r\n", &config).await;

    let futures: Vec<_> = (0..3).map(|_| client.noop()).collect();
    server.expect("M0001 NOOP").await;
    server.expect("M0002 NOOP").await;
    server.expect_silence().await;

    server.send("M0001 OK done\r\n").await;
    server.expect("M0003 NOOP").await;
    server.send("M0002 OK done\r\nM0003 OK done\r\n").await;
    for future in futures {
        future.await.unwrap();
    }
}

#[tokio::test]
async fn rejected_command_is_never_written() {
    let (client, mut server) = Script::start("* OK ready\r\n").await;

    let err = client.get_acl("INBOX").await.unwrap_err();
    assert!(matches!(
        err,
        Error::State {
            command: "GETACL",
            state: StateKind::NotAuthenticated
        }
    ));

    // The rejected command consumed no tag and sent no bytes.
    let noop = client.noop();
    server.expect("M0001 NOOP").await;
    server.send("M0001 OK done\r\n").await;
    noop.await.unwrap();
}

#[tokio::test]
async fn synchronizing_literal_waits_for_continuation() {
    let (client, mut server) = Script::start("* OK ready\r\n").await;

    let login = client.login("j\u{f6}rg", "pw");
    server.expect("M0001 LOGIN {5}").await;
    server.expect_silence().await;

    server.send("+ go ahead\r\n").await;
    server.expect("j\u{f6}rg pw").await;
    server.send("M0001 OK logged in\r\n").await;
    login.await.unwrap();
    assert!(client.state().is_authenticated());
}

#[tokio::test]
async fn rejected_literal_skips_the_rest_of_the_command() {
    let (client, mut server) = Script::start("* OK ready\r\n").await;

    let login = client.login("j\u{f6}rg", "pw");
    server.expect("M0001 LOGIN {5}").await;
    server.send("M0001 NO [AUTHENTICATIONFAILED] no such user\r\n").await;
    assert!(matches!(login.await, Err(Error::No(_))));

    let noop = client.noop();
    server.expect("M0002 NOOP").await;
    server.send("M0002 OK done\r\n").await;
    noop.await.unwrap();
}

#[tokio::test]
async fn literal_plus_sends_in_one_piece() {
    let (client, mut server) =
        Script::start("* OK [CAPABILITY IMAP4rev1 LITERAL+] ready\r\n").await;

    let login = client.login("j\u{f6}rg", "pw");
    server.expect("M0001 LOGIN {5+}").await;
    server.expect("j\u{f6}rg pw").await;
    server.send("M0001 OK logged in\r\n").await;
    login.await.unwrap();
}

#[tokio::test]
async fn unknown_tag_does_not_disturb_pending_commands() {
    let (client, mut server) = Script::start("* PREAUTH ready\r\n").await;

    let acl = client.get_acl("INBOX");
    server.expect("M0001 GETACL INBOX").await;
    server
        .send("Z0042 OK stray\r\n* ACL INBOX fred lr\r\nM0001 OK done\r\n")
        .await;
    assert_eq!(acl.await.unwrap().rights["fred"], rights("lr"));
}

#[tokio::test]
async fn strict_tags_close_the_connection() {
    let config = Config::builder("localhost").strict_tags(true).build();
    let (client, mut server) = Script::start_with("* PREAUTH ready\r\n", &config).await;

    let acl = client.get_acl("INBOX");
    server.expect("M0001 GETACL INBOX").await;
    server.send("Z0042 OK stray\r\n").await;
    assert!(matches!(acl.await, Err(Error::ConnectionClosed)));
    assert!(client.is_closed());
}

#[tokio::test]
async fn transport_loss_fails_every_pending_command() {
    let (client, mut server) = Script::start("* PREAUTH ready\r\n").await;

    let acl = client.get_acl("A");
    let select = client.select("B");
    server.expect("M0001 GETACL A").await;
    drop(server);

    assert!(matches!(acl.await, Err(Error::ConnectionClosed)));
    assert!(matches!(select.await, Err(Error::ConnectionClosed)));
    assert!(matches!(
        client.noop().await,
        Err(Error::ConnectionClosed)
    ));
}

#[tokio::test]
async fn missing_mailbox_maps_to_its_own_error() {
    let (client, mut server) = Script::start("* PREAUTH ready\r\n").await;

    let set = client.set_acl(
        "BibiMailbox",
        "testuser",
        RightModification::Replace,
        RightSet::EMPTY,
    );
    server
        .expect("M0001 SETACL BibiMailbox testuser \"\"")
        .await;
    server
        .send("M0001 NO [NONEXISTENT] mailbox does not exist\r\n")
        .await;
    match set.await {
        Err(Error::MailboxNotFound(name)) => assert_eq!(name, "BibiMailbox"),
        other => panic!("expected MailboxNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn unclaimed_data_reaches_the_handler() {
    let (handler, mut events) = ChannelHandler::new();
    let (client_io, server_io) = tokio::io::duplex(4096);
    let (read, mut writer) = tokio::io::split(server_io);
    writer.write_all(b"* PREAUTH ready\r\n").await.unwrap();
    let client = Client::with_handler(client_io, &Config::default(), handler)
        .await
        .unwrap();
    let mut lines = BufReader::new(read).lines();

    let select = client.select("INBOX");
    assert_eq!(lines.next_line().await.unwrap().unwrap(), "M0001 SELECT INBOX");
    writer
        .write_all(b"* 2 EXISTS\r\nM0001 OK selected\r\n")
        .await
        .unwrap();
    select.await.unwrap();

    writer
        .write_all(b"* 3 EXISTS\r\n* OK [ALERT] going down soon\r\n")
        .await
        .unwrap();
    assert_eq!(events.recv().await.unwrap(), UnsolicitedEvent::Exists(3));
    assert_eq!(
        events.recv().await.unwrap(),
        UnsolicitedEvent::Alert("going down soon".into())
    );
    match client.state() {
        ConnectionState::Selected(selected) => assert_eq!(selected.status.exists, 3),
        other => panic!("expected Selected, got {other:?}"),
    }
}

#[tokio::test]
async fn commands_after_logout_are_rejected() {
    let (client, mut server) = Script::start("* PREAUTH ready\r\n").await;

    let logout = client.logout();
    server.expect("M0001 LOGOUT").await;
    server.send("* BYE bye\r\nM0001 OK done\r\n").await;
    logout.await.unwrap();

    assert!(matches!(
        client.get_acl("INBOX").await,
        Err(Error::State {
            state: StateKind::Logout,
            ..
        })
    ));
}
