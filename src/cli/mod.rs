//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the
//! appropriate commands.

use std::error::Error;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::ui::chat_loop::run_chat;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    " ",
    env!("VERGEN_GIT_SHA"),
    ", built ",
    env!("VERGEN_BUILD_TIMESTAMP"),
    ")"
);

#[derive(Parser)]
#[command(name = "chatelet")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "A terminal chat client for an AI-Gateway-fronted chat worker")]
#[command(
    long_about = "Chatelet is a full-screen terminal chat client that talks to a remote chat \
worker fronted by an AI gateway and shows which model and provider served each reply.\n\n\
Environment Variables:\n\
  CF_ACCESS_JWT       Ambient access token, attached as CF-Access-JWT-Assertion when set\n\
  CHATELET_TRACE_LOG  File to write tracing diagnostics to (stdout belongs to the TUI)\n\n\
Controls:\n\
  Type                Enter your message in the focused field\n\
  Tab                 Switch between the username and message fields\n\
  Enter               Send the message\n\
  Esc                 Clear the message field\n\
  Up/Down/Mouse       Scroll through chat history\n\
  Ctrl+C              Quit"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Chat worker URL (overrides the configured endpoint)
    #[arg(short = 'e', long, global = true, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Username sent with each message (overrides the configured one)
    #[arg(short = 'u', long, global = true, value_name = "NAME")]
    pub username: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Set configuration values
    Set {
        /// Configuration key to set (endpoint, username, markdown)
        key: String,
        /// Value to set for the key
        value: String,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset (endpoint, username, markdown)
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let args = Args::parse();

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let config = Config::load()?;
            let endpoint = config.resolve_endpoint(args.endpoint.as_deref());
            let username = config.resolve_username(args.username.as_deref());
            let markdown_enabled = config.markdown.unwrap_or(true);
            run_chat(endpoint, username, markdown_enabled).await
        }
        Commands::Set { key, value } => {
            let mut config = Config::load()?;
            match key.as_str() {
                "endpoint" => config.endpoint = Some(value.clone()),
                "username" => config.username = Some(value.clone()),
                "markdown" => {
                    let enabled: bool = value
                        .parse()
                        .map_err(|_| format!("markdown expects true or false, got: {value}"))?;
                    config.markdown = Some(enabled);
                }
                _ => {
                    eprintln!("❌ Unknown config key: {key}");
                    std::process::exit(1);
                }
            }
            config.save()?;
            println!("✅ Set {key} to: {value}");
            Ok(())
        }
        Commands::Unset { key } => {
            let mut config = Config::load()?;
            match key.as_str() {
                "endpoint" => config.endpoint = None,
                "username" => config.username = None,
                "markdown" => config.markdown = None,
                _ => {
                    eprintln!("❌ Unknown config key: {key}");
                    std::process::exit(1);
                }
            }
            config.save()?;
            println!("✅ Unset {key}");
            Ok(())
        }
    }
}

/// Route tracing output to a file when `CHATELET_TRACE_LOG` names one; the
/// terminal itself is owned by the TUI, so there is no stdout logging.
fn init_tracing() {
    let Ok(path) = std::env::var("CHATELET_TRACE_LOG") else {
        return;
    };
    let Ok(file) = std::fs::File::create(&path) else {
        eprintln!("⚠️  Could not open trace log at {path}");
        return;
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chatelet=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init();
}
