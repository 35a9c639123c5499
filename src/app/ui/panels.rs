use eframe::egui::{self, Align, Context, Layout};

use crate::bubbles::engine::{ForceLayoutEngine, LayoutPhase, SettleReason};
use crate::bubbles::interaction::BubbleInteractionController;
use crate::bubbles::prepare::LayoutRequest;
use crate::bubbles::profile::{LayoutProfile, ProfileKind};
use crate::bubbles::tracker::ResponsiveContainerTracker;
use crate::feed::TokenFeed;

use super::super::{AppConfig, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(feed: TokenFeed, config: &AppConfig) -> Self {
        let profile = LayoutProfile::resolve(config.profile_kind, config.overrides.as_ref());

        Self {
            feed,
            profile_kind: config.profile_kind,
            overrides: config.overrides.clone(),
            request: LayoutRequest {
                range: config.range,
                favorites: config.favorites.clone(),
                favorites_only: false,
                search_prefix: None,
                seed: config.seed,
            },
            search: String::new(),
            highlight: String::new(),
            highlight_cache: None,
            tracker: ResponsiveContainerTracker::new(profile.container_height),
            engine: ForceLayoutEngine::new(profile),
            interaction: BubbleInteractionController::default(),
            layout_dirty: true,
            empty: None,
            snapshot: None,
        }
    }

    /// New feed data restarts the layout; the open overlay keeps its snapshot of the token.
    pub(in crate::app) fn replace_feed(&mut self, feed: TokenFeed) {
        self.feed = feed;
        self.layout_dirty = true;
    }

    pub(in crate::app) fn set_profile_kind(&mut self, kind: ProfileKind) {
        if self.profile_kind == kind {
            return;
        }

        self.profile_kind = kind;
        let profile = LayoutProfile::resolve(kind, self.overrides.as_ref());
        self.tracker.set_height(profile.container_height);
        self.engine.set_profile(profile);
        self.layout_dirty = true;
    }

    fn layout_status_text(&self) -> &'static str {
        if self.empty.is_some() {
            return "nothing to lay out";
        }

        match self.engine.phase() {
            None => "idle",
            Some(LayoutPhase::Seeded) => "waiting for chart size",
            Some(LayoutPhase::Relaxing) => "relaxing",
            Some(LayoutPhase::Settled(SettleReason::TimedOut)) => "settled (time cap)",
            Some(LayoutPhase::Settled(_)) => "settled",
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("risk-bubbles");
                    ui.separator();
                    ui.label(format!("feed: {}", self.feed.source));
                    ui.label(format!("tokens: {}", self.feed.len()));
                    ui.label(format!("profile: {}", self.profile_kind.label()));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if is_reloading {
                            ui.spinner();
                        }
                        ui.label(format!(
                            "bubbles: {}  |  layout: {}",
                            self.engine.items().len(),
                            self.layout_status_text()
                        ));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| self.draw_controls(ui, reload_requested, is_reloading));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_chart(ui));

        self.draw_details(ctx);
    }
}

impl Drop for ViewModel {
    fn drop(&mut self) {
        self.engine.dispose();
        self.tracker.detach();
    }
}
