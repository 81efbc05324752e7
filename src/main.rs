// Main entry point for the terminal YouTube search-and-play front end

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use crusty_queue::config::Config;
use crusty_queue::logging;
use crusty_queue::ui::app::MusicPlayerApp;

#[derive(Parser)]
#[command(name = "crusty-queue", version, about)]
struct Args {
    /// Use the built-in sample songs instead of searching online
    #[arg(long)]
    offline: bool,

    /// Search for this instead of a random startup query
    #[arg(long, short)]
    query: Option<String>,

    /// Config file (defaults to <config dir>/crusty-queue/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _log_guard = logging::init()?;

    let mut config = Config::load(args.config.as_deref()).context("loading config")?;
    if args.offline {
        config.offline = true;
    }
    info!(offline = config.offline, api_key = config.api_key.is_some(), "starting");

    let app = MusicPlayerApp::new(config);
    app.run(args.query).await
}
