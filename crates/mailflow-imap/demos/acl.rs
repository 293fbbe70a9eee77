//! Inspects and edits the ACL of a mailbox on a live server.
//!
//! ```text
//! MAILFLOW_HOST=imap.example.com MAILFLOW_USER=fred MAILFLOW_PASSWORD=secret \
//!     cargo run -p mailflow-imap --example acl -- Shared bob +lr
//! ```
//!
//! Arguments: mailbox, then optionally an identifier and a rights change
//! (`+rights` adds, `-rights` removes, plain rights replace).
//! Set `MAILFLOW_PLAIN=1` to connect without TLS on port 143.

use std::env;

use anyhow::{Context, bail};
use mailflow_imap::{Client, Config, RightModification, Security};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "acl=info,mailflow_imap=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = env::var("MAILFLOW_HOST").context("MAILFLOW_HOST is not set")?;
    let user = env::var("MAILFLOW_USER").context("MAILFLOW_USER is not set")?;
    let password = env::var("MAILFLOW_PASSWORD").context("MAILFLOW_PASSWORD is not set")?;
    let security = if env::var_os("MAILFLOW_PLAIN").is_some() {
        Security::None
    } else {
        Security::Implicit
    };
    let mut builder = Config::builder(&host).security(security);
    if let Ok(port) = env::var("MAILFLOW_PORT") {
        builder = builder.port(port.parse().context("MAILFLOW_PORT is not a port")?);
    }
    let config = builder.build();

    let mut args = env::args().skip(1);
    let Some(mailbox) = args.next() else {
        bail!("usage: acl <mailbox> [<identifier> <rights>]");
    };

    info!(%host, port = config.port, "connecting");
    let client = Client::connect(&config).await?;
    client.login(&user, &password).await?;

    if let (Some(identifier), Some(change)) = (args.next(), args.next()) {
        let (modification, rights) = RightModification::split_prefix(&change)?;
        client
            .set_acl(mailbox.as_str(), &identifier, modification, rights)
            .await?;
        info!(%identifier, %change, "ACL updated");
    }

    // Issued together; the pipeline sends all three before any completes.
    let acl = client.get_acl(mailbox.as_str());
    let mine = client.my_rights(mailbox.as_str());
    let anyone = client.list_rights(mailbox.as_str(), "anyone");

    let acl = acl.await?;
    let mut entries: Vec<_> = acl.rights.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    println!("ACL of {}:", acl.mailbox);
    for (identifier, rights) in entries {
        println!("  {identifier:<24} {rights}");
    }
    println!("my rights: {}", mine.await?.rights);
    match anyone.await {
        Ok(listed) => println!("grantable to anyone: {}", listed.grantable()),
        Err(err) => println!("LISTRIGHTS unavailable: {err}"),
    }

    client.logout().await?;
    Ok(())
}
