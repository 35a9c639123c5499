use eframe::egui::{self, Color32, Context, Key, RichText};

use crate::bubbles::risk::RiskBand;
use crate::util::{format_percent, format_price};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ctx: &Context) {
        let Some(selected) = self.interaction.selected().cloned() else {
            return;
        };

        let meta = &selected.meta;
        let is_favorite = self.request.favorites.contains(&selected.symbol);
        let mut open = !ctx.input(|input| input.key_pressed(Key::Escape));
        let mut toggle_favorite = false;

        egui::Window::new(meta.name.as_deref().unwrap_or(&selected.symbol))
            .id(egui::Id::new("token_details"))
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.label(RichText::new(selected.symbol.as_str()).strong());
                if let Some(rank) = meta.rank {
                    ui.small(format!("rank #{rank}"));
                }
                ui.add_space(6.0);

                let price = meta.price.map(format_price).unwrap_or_else(|| "n/a".to_owned());
                ui.label(format!("Price: {price}"));
                ui.label(format!("Risk score: {:.0} / 100", selected.risk));
                ui.label(format!("Band: {}", RiskBand::from_risk(selected.risk).label()));

                if !meta.percent_changes.is_empty() {
                    ui.separator();
                    ui.label(RichText::new("Price change").strong());
                    egui::Grid::new("price_changes").striped(true).show(ui, |ui| {
                        for (window, change) in &meta.percent_changes {
                            let color = if *change >= 0.0 {
                                Color32::from_rgb(96, 204, 120)
                            } else {
                                Color32::from_rgb(232, 98, 88)
                            };
                            ui.label(window.as_str());
                            ui.colored_label(color, format_percent(*change));
                            ui.end_row();
                        }
                    });
                }

                ui.separator();
                ui.label(RichText::new("Warnings").strong());
                if meta.warnings.is_empty() {
                    ui.label("None reported.");
                } else {
                    for warning in &meta.warnings {
                        ui.label(format!("- {warning}"));
                    }
                }

                if let Some(icon) = &meta.icon_url {
                    ui.add_space(4.0);
                    ui.small(icon.as_str());
                }

                ui.separator();
                let label = if is_favorite {
                    "Remove from favorites"
                } else {
                    "Add to favorites"
                };
                if ui.button(label).clicked() {
                    toggle_favorite = true;
                }
            });

        if toggle_favorite {
            if is_favorite {
                self.request.favorites.remove(&selected.symbol);
            } else {
                self.request.favorites.insert(selected.symbol.clone());
            }
            self.layout_dirty = true;
        }

        if !open {
            self.interaction.on_overlay_closed();
        }
    }
}
