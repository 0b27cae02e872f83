//! wx-webhook - Weixin official account webhook tool
//!
//! Verifies and decodes callback payloads offline and manages the
//! account's custom menu.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wx_webhook::api::Menu;
use wx_webhook::config::Config;
use wx_webhook::{RawRequest, Webhook};

#[derive(Parser)]
#[command(name = "wx-webhook")]
#[command(about = "Weixin official account webhook adapter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file
    Init {
        #[arg(long)]
        app_id: String,

        #[arg(long)]
        app_secret: String,

        /// Token shared with the platform for callback signatures
        #[arg(long)]
        token: String,

        /// 43-character EncodingAESKey (enables encrypted mode)
        #[arg(long)]
        aes_key: Option<String>,

        /// Override the management API base URL
        #[arg(long)]
        api_base: Option<String>,

        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Answer a URL verification request
    Verify {
        /// Query string of the verification GET
        query: String,
    },

    /// Authenticate and decode a callback body
    Parse {
        /// Query string of the callback POST
        query: String,

        /// File holding the request body (stdin if omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Also print the response body for a text reply with this content
        #[arg(long)]
        reply_text: Option<String>,
    },

    /// Fetch an access token and show when it will be renewed
    Token,

    /// Manage the custom menu
    Menu {
        #[command(subcommand)]
        action: MenuAction,
    },
}

#[derive(Subcommand)]
enum MenuAction {
    /// Print the current menu as JSON
    Get,
    /// Create the menu from a JSON file
    Create { file: PathBuf },
    /// Delete the menu
    Delete,
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn read_body(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut body = Vec::new();
            std::io::stdin()
                .read_to_end(&mut body)
                .context("Failed to read request body from stdin")?;
            Ok(body)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Init {
            app_id,
            app_secret,
            token,
            aes_key,
            api_base,
            force,
        } => {
            let path = match cli.config {
                Some(path) => path,
                None => Config::default_path()?,
            };
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists. Use --force to overwrite.",
                    path.display()
                );
            }
            let config = Config {
                app_id,
                app_secret,
                token,
                encoding_aes_key: aes_key,
                api_base,
                timeout_secs: None,
            };
            config.validate()?;
            config.save_to(&path)?;
            println!("Config written to {}", path.display());
        }
        Commands::Verify { query } => {
            let config = load_config(cli.config.as_ref())?;
            let webhook = Webhook::new(config.webhook_config()?);
            let raw = RawRequest::from_query(&query, Vec::new());
            let echo = webhook
                .verify_url(&raw)
                .context("URL verification rejected")?;
            println!("{}", echo);
        }
        Commands::Parse {
            query,
            file,
            reply_text,
        } => {
            let config = load_config(cli.config.as_ref())?;
            let webhook = Webhook::new(config.webhook_config()?);
            let raw = RawRequest::from_query(&query, read_body(file.as_ref())?);

            let request = webhook
                .authenticate_and_parse(&raw)
                .context("Callback rejected")?;
            println!("{}", serde_json::to_string_pretty(&request)?);

            if let Some(content) = reply_text {
                let mut reply = webhook.build_reply(&request);
                reply.text(content);
                let body = webhook.respond(&reply, &raw)?;
                println!();
                println!("{}", String::from_utf8_lossy(&body));
            }
        }
        Commands::Token => {
            let config = load_config(cli.config.as_ref())?;
            let client = config.api_client()?;
            tracing::info!("Requesting access token...");
            let credential = client.credentials().ensure_valid().await?;
            let renew_at = chrono::DateTime::from_timestamp(credential.expires_at as i64, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| credential.expires_at.to_string());
            println!("Access token: valid");
            println!("  renew at:   {}", renew_at);
        }
        Commands::Menu { action } => {
            let config = load_config(cli.config.as_ref())?;
            let client = config.api_client()?;
            match action {
                MenuAction::Get => {
                    let menu = client.get_menu().await?;
                    println!("{}", serde_json::to_string_pretty(&menu)?);
                }
                MenuAction::Create { file } => {
                    let content = std::fs::read_to_string(&file)
                        .with_context(|| format!("Failed to read {}", file.display()))?;
                    let menu: Menu =
                        serde_json::from_str(&content).context("Failed to parse menu JSON")?;
                    client.create_menu(&menu).await?;
                    println!("Menu created.");
                }
                MenuAction::Delete => {
                    client.delete_menu().await?;
                    println!("Menu deleted.");
                }
            }
        }
    }

    Ok(())
}
