use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use eframe::egui::{self, Context};
use tracing::{info, warn};

use crate::bubbles::engine::{ForceLayoutEngine, LayoutSnapshot};
use crate::bubbles::interaction::BubbleInteractionController;
use crate::bubbles::prepare::{EmptyLayout, LayoutRequest, RankRange};
use crate::bubbles::profile::{ProfileKind, ProfileOverrides};
use crate::bubbles::tracker::ResponsiveContainerTracker;
use crate::feed::{TokenFeed, load_token_feed};

mod chart;
mod render_utils;
mod ui;

/// Startup settings gathered from the command line.
pub struct AppConfig {
    pub tokens_path: PathBuf,
    pub profile_kind: ProfileKind,
    pub overrides: Option<ProfileOverrides>,
    /// `None` disables periodic reloads.
    pub poll_interval: Option<Duration>,
    pub seed: u64,
    pub favorites: HashSet<String>,
    pub range: RankRange,
}

type FeedResult = Result<TokenFeed, String>;

pub struct RiskBubblesApp {
    config: AppConfig,
    state: AppState,
    reload_rx: Option<Receiver<FeedResult>>,
    last_load: Instant,
}

enum AppState {
    Loading { rx: Receiver<FeedResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    feed: TokenFeed,
    profile_kind: ProfileKind,
    overrides: Option<ProfileOverrides>,
    request: LayoutRequest,
    search: String,
    highlight: String,
    highlight_cache: Option<HighlightCache>,
    engine: ForceLayoutEngine,
    tracker: ResponsiveContainerTracker,
    interaction: BubbleInteractionController,
    layout_dirty: bool,
    empty: Option<EmptyLayout>,
    snapshot: Option<LayoutSnapshot>,
}

struct HighlightCache {
    query: String,
    generation: u64,
    matches: Arc<HashSet<usize>>,
}

impl RiskBubblesApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let state = Self::start_load(config.tokens_path.clone());
        Self {
            config,
            state,
            reload_rx: None,
            last_load: Instant::now(),
        }
    }

    fn spawn_load(path: PathBuf) -> Receiver<FeedResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_token_feed(&path).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(path: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(path),
        }
    }
}

impl eframe::App for RiskBubblesApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(feed)) => {
                        self.last_load = Instant::now();
                        let model = ViewModel::new(feed, &self.config);
                        transition = Some(AppState::Ready(Box::new(model)));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading token feed...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load the token feed");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.config.tokens_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                let poll_due = self
                    .config
                    .poll_interval
                    .is_some_and(|interval| self.last_load.elapsed() >= interval);
                if (reload_requested || poll_due) && self.reload_rx.is_none() {
                    self.last_load = Instant::now();
                    self.reload_rx = Some(Self::spawn_load(self.config.tokens_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(feed)) => {
                            info!(tokens = feed.len(), "token feed refreshed");
                            model.replace_feed(feed);
                        }
                        Ok(Err(error)) => {
                            warn!(%error, "token feed reload failed, keeping the previous data");
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint_after(Duration::from_millis(100));
                        }
                        Err(TryRecvError::Disconnected) => {
                            warn!("token feed reload worker disconnected");
                        }
                    }
                }

                if let Some(interval) = self.config.poll_interval {
                    ctx.request_repaint_after(interval.saturating_sub(self.last_load.elapsed()));
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }

        if matches!(self.state, AppState::Loading { .. }) {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
