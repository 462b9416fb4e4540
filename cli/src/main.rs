mod app;
mod config;
mod input;
mod transcript_printer;

use std::sync::Arc;

use anyhow::Context;
use clap::CommandFactory;
use clap::FromArgMatches;
use clap::Parser;
use interio_chat::ChatSession;
use interio_chat::HttpChatBackend;
use interio_chat::TimeRandomIds;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use crate::config::BACKEND_URL_ENV;
use crate::config::ConfigStore;

/// Seeded as the first assistant message of every session.
const GREETING: &str = "Hello! I'm the interio AI assistant. Tell me the purpose of the space, \
the mood you want, and your budget, and I'll recommend a tailored layout and products right away.";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Chat with the interio interior-design assistant from the terminal"
)]
struct Cli {
    /// Backend base URL; requests go to `<base-url>/chat`.
    ///
    /// Falls back to `base_url` in `~/.interio/config.toml`, then to http://localhost:8001.
    #[arg(long, env = BACKEND_URL_ENV)]
    base_url: Option<String>,

    /// Start with an empty transcript instead of the welcome message.
    #[arg(long)]
    no_greeting: bool,
}

fn parse_cli() -> Cli {
    let matches = Cli::command()
        .version(interio_chat::INTERIO_VERSION)
        .get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = parse_cli();
    init_tracing();

    let store = match ConfigStore::new_default() {
        Ok(store) => Some(store),
        Err(err) => {
            tracing::warn!("config file unavailable: {err:#}");
            None
        }
    };
    let chat_config = config::resolve_chat_config(cli.base_url.as_deref(), store.as_ref());
    let backend = HttpChatBackend::new(&chat_config).context("build HTTP client")?;
    tracing::info!("using chat endpoint {}", backend.endpoint());

    let mut session = ChatSession::new(TimeRandomIds);
    if !cli.no_greeting {
        session = session.with_greeting(GREETING);
    }

    let stdin = BufReader::new(tokio::io::stdin());
    app::run(session, Arc::new(backend), stdin, std::io::stdout())
        .await
        .context("chat session")
}
