use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bookmark_archiver::archive::Archiver;
use bookmark_archiver::config::Config;
use bookmark_archiver::meta;

#[derive(Parser)]
#[command(name = "bookmark-archiver", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Archive the content behind a bookmark and print its public URL.
    Archive {
        /// Bookmark title; becomes the archived file's name.
        #[arg(long)]
        name: String,
        /// Source URL to fetch.
        #[arg(long)]
        url: String,
        /// Declared category: articles, comics, podcasts, or videos.
        #[arg(long = "media-type")]
        media_type: String,
    },
    /// Look up provider metadata for a URL and print it as JSON.
    Lookup {
        /// Provider URL (GitHub repo, Scryfall card, question, etc.).
        url: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Command::Archive {
            name,
            url,
            media_type,
        } => {
            let archiver = Archiver::new(&config)?;
            let public_url = archiver.archive(&name, &url, &media_type).await?;
            println!("{public_url}");
        }
        Command::Lookup { url } => {
            let record = meta::lookup(&config, &url).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bookmark_archiver=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    Ok(())
}
