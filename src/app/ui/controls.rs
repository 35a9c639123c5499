use eframe::egui::{self, RichText, Ui};

use crate::bubbles::profile::ProfileKind;
use crate::bubbles::risk::{RiskBand, color_for};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_controls(
        &mut self,
        ui: &mut Ui,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        ui.heading("Bubble Map");
        ui.separator();
        ui.add_space(4.0);

        let mut kind = self.profile_kind;
        ui.horizontal(|ui| {
            ui.label("Profile");
            ui.selectable_value(&mut kind, ProfileKind::Desktop, ProfileKind::Desktop.label())
                .on_hover_text("Tall chart, relaxes until the layout converges.");
            ui.selectable_value(&mut kind, ProfileKind::Compact, ProfileKind::Compact.label())
                .on_hover_text("Shorter chart with a wall-clock cap on relaxation.");
        });
        self.set_profile_kind(kind);

        ui.separator();
        ui.label(RichText::new("Rank range").strong());
        let max_rank = self.feed.len().max(1);
        let mut range = self.request.range;
        let start_changed = ui
            .add(egui::Slider::new(&mut range.start, 1..=max_rank).text("from"))
            .changed();
        let end_changed = ui
            .add(egui::Slider::new(&mut range.end, 1..=max_rank).text("to"))
            .changed();
        if start_changed || end_changed {
            self.request.range = range;
            self.layout_dirty = true;
        }

        ui.separator();
        if ui
            .checkbox(&mut self.request.favorites_only, "Favorites only")
            .changed()
        {
            self.layout_dirty = true;
        }

        ui.add_space(4.0);
        ui.label("Symbol prefix")
            .on_hover_text("Only lay out tokens whose symbol starts with this text.");
        if ui.text_edit_singleline(&mut self.search).changed() {
            self.request.search_prefix = Some(self.search.clone());
            self.layout_dirty = true;
        }

        ui.add_space(4.0);
        ui.label("Highlight")
            .on_hover_text("Outline bubbles whose symbol or name fuzzy-matches, without re-running the layout.");
        ui.text_edit_singleline(&mut self.highlight);

        ui.separator();
        ui.horizontal_wrapped(|ui| {
            if ui
                .button("Settle now")
                .on_hover_text("Run the remaining relaxation steps immediately.")
                .clicked()
                && let Some(snapshot) = self.engine.settle()
            {
                self.snapshot = Some(snapshot);
            }
            if ui.button("Re-run layout").clicked() {
                self.layout_dirty = true;
            }
            let reload_button = ui.add_enabled(!is_reloading, egui::Button::new("Reload feed"));
            if reload_button.clicked() {
                *reload_requested = true;
            }
        });

        ui.separator();
        ui.label(RichText::new("Risk bands").strong());
        for band in RiskBand::ALL {
            let (low, _) = band.bounds();
            ui.horizontal(|ui| {
                ui.colored_label(color_for(low, false).border, "●");
                ui.label(band.label());
            });
        }

        ui.separator();
        ui.label(RichText::new(format!("Favorites ({})", self.request.favorites.len())).strong());
        if self.request.favorites.is_empty() {
            ui.label("Open a token to add it to favorites.");
            return;
        }

        let mut favorites = self.request.favorites.iter().cloned().collect::<Vec<_>>();
        favorites.sort_unstable();
        let mut removed = None;
        for symbol in &favorites {
            ui.horizontal(|ui| {
                ui.label(symbol.as_str());
                if ui.small_button("remove").clicked() {
                    removed = Some(symbol.clone());
                }
            });
        }
        if let Some(symbol) = removed {
            self.request.favorites.remove(&symbol);
            self.layout_dirty = true;
        }
    }
}
