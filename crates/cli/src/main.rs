mod app;
mod render;

use std::{
    fs::{self, OpenOptions},
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gamedex_core::{
    browse::SortOrder,
    config::{self, AppConfig},
    Route,
};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Browse the RAWG video game catalog from the terminal.
#[derive(Debug, Parser)]
#[command(name = "gamedex", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Trending titles, a mixed selection, recent games and genres.
    Home,
    /// Every game, paged on the server.
    Games {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Highest user-rated games.
    Popular {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Games released during the last year.
    NewReleases {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Games ranked by critic score.
    TopRated {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Shuffled mix of popular games and new releases.
    Recommended {
        /// Seed for the shuffle; defaults to the current time.
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// All genres.
    Genres,
    /// Games in one genre.
    Genre {
        id: u64,
        #[arg(long, default_value = "rating")]
        sort: SortOrder,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Details for one game.
    Show { id: u64 },
    /// Search by title.
    Search {
        text: String,
        /// Additional result pages to load.
        #[arg(long, default_value_t = 0)]
        more: u32,
    },
    /// Live suggestions: loaded games whose name contains the text.
    Suggest { text: String },
    /// Recent searches.
    History,
    /// Open an application path such as `/games/3498` or `/search?q=zelda`.
    Open { route: Route },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    init_logging(&config)?;

    let mut app = app::App::new(&config)?;
    app.run(cli.command).await
}

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_path = log_dir.join("gamedex.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
