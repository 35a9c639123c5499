mod app;
mod bubbles;
mod feed;
mod util;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use app::AppConfig;
use bubbles::prepare::RankRange;
use bubbles::profile::{ProfileKind, load_profile_overrides};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON token feed: an array of tokens or `{ "tokens": [...] }`.
    #[arg(long)]
    tokens: PathBuf,
    #[arg(long, value_enum, default_value_t = ProfileKind::Desktop)]
    profile: ProfileKind,
    /// JSON file overriding individual layout profile fields.
    #[arg(long)]
    profile_file: Option<PathBuf>,
    /// Seconds between feed reloads; 0 disables polling.
    #[arg(long, default_value_t = 60)]
    poll_secs: u64,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long = "favorite")]
    favorites: Vec<String>,
    #[arg(long, default_value_t = 1)]
    range_start: usize,
    #[arg(long, default_value_t = 100)]
    range_end: usize,
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();

    let overrides = args
        .profile_file
        .as_deref()
        .map(load_profile_overrides)
        .transpose()
        .context("failed to load layout profile overrides")?;

    let config = AppConfig {
        tokens_path: args.tokens,
        profile_kind: args.profile,
        overrides,
        poll_interval: (args.poll_secs > 0).then(|| Duration::from_secs(args.poll_secs)),
        seed: args.seed,
        favorites: args.favorites.into_iter().collect(),
        range: RankRange::new(args.range_start, args.range_end),
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1320.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "risk-bubbles",
        options,
        Box::new(move |cc| Ok(Box::new(app::RiskBubblesApp::new(cc, config)))),
    )
    .map_err(|error| anyhow!("failed to run the bubble map window: {error}"))
}
