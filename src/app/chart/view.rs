use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{
    self, Align2, Color32, CursorIcon, FontId, Painter, Pos2, Sense, Stroke, Ui, vec2,
};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::bubbles::engine::LayoutEvent;
use crate::bubbles::interaction::hit_test;
use crate::bubbles::prepare::RenderItem;

use super::super::render_utils::{blend_color, draw_background, draw_band_guides};
use super::super::{HighlightCache, ViewModel};

const GLOW_LAYERS: usize = 4;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

#[derive(Clone, Copy)]
struct BubbleEmphasis {
    hovered: bool,
    selected: bool,
    highlighted: bool,
}

fn paint_bubble(painter: &Painter, center: Pos2, item: &RenderItem, emphasis: BubbleEmphasis) {
    let radius = item.radius;
    let colors = item.colors;

    painter.circle_filled(center, radius, colors.background);

    // Stacked translucent discs offset toward the top-left stand in for a radial gradient.
    let glow_origin = center + vec2(-radius * 0.28, -radius * 0.28);
    for layer in 0..GLOW_LAYERS {
        let t = layer as f32 / GLOW_LAYERS as f32;
        let layer_center = glow_origin + (center - glow_origin) * (t * 0.5);
        painter.circle_filled(
            layer_center,
            radius * (0.62 - t * 0.36),
            colors.gradient.gamma_multiply(0.35 + t * 0.25),
        );
    }

    let border = if emphasis.hovered {
        blend_color(colors.border, Color32::WHITE, 0.35)
    } else {
        colors.border
    };
    painter.circle_stroke(center, radius, Stroke::new(1.5, border));

    if emphasis.highlighted {
        painter.circle_stroke(
            center,
            radius + 3.0,
            Stroke::new(1.8, Color32::from_rgb(103, 196, 255)),
        );
    }
    if emphasis.selected {
        painter.circle_stroke(
            center,
            radius + 5.0,
            Stroke::new(2.2, Color32::from_rgb(245, 206, 93)),
        );
    }

    let font_size = (radius * 0.42).clamp(9.0, 16.0);
    painter.text(
        center,
        Align2::CENTER_CENTER,
        item.symbol.as_str(),
        FontId::proportional(font_size),
        Color32::from_gray(240),
    );
}

impl ViewModel {
    fn cached_highlight_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.highlight.trim();
        if query.is_empty() {
            return None;
        }
        let generation = self.engine.generation()?;

        if let Some(cached) = &self.highlight_cache
            && cached.generation == generation
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .engine
            .items()
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let name_matches = item
                    .meta
                    .name
                    .as_deref()
                    .is_some_and(|name| fuzzy_match_score(&matcher, name, query).is_some());
                (name_matches || fuzzy_match_score(&matcher, &item.symbol, query).is_some())
                    .then_some(index)
            })
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.highlight_cache = Some(HighlightCache {
            query: query.to_owned(),
            generation,
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }

    pub(in crate::app) fn draw_chart(&mut self, ui: &mut Ui) {
        egui::ScrollArea::vertical()
            .id_salt("chart_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| self.draw_chart_surface(ui));
    }

    fn draw_chart_surface(&mut self, ui: &mut Ui) {
        if let Some(size) = self.tracker.observe(ui.available_width())
            && !self.layout_dirty
            && self.engine.set_container(size).is_some()
        {
            self.snapshot = self.engine.snapshot();
        }
        if self.layout_dirty {
            self.rebuild_layout();
        }

        let height = self.engine.profile().container_height;
        let (rect, response) =
            ui.allocate_exact_size(vec2(ui.available_width(), height), Sense::click());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect);
        draw_band_guides(&painter, rect, self.engine.profile());

        if let Some(reason) = self.empty {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                reason.message(),
                FontId::proportional(16.0),
                Color32::from_gray(200),
            );
            return;
        }

        let frame_delta_seconds = ui.ctx().input(|input| input.stable_dt).max(0.0);
        match self.engine.tick(frame_delta_seconds) {
            LayoutEvent::Frame(snapshot) => {
                self.snapshot = Some(snapshot);
                ui.ctx().request_repaint();
            }
            LayoutEvent::Settled(snapshot) => self.snapshot = Some(snapshot),
            LayoutEvent::Waiting => {
                painter.text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    "Waiting for the chart to get a size...",
                    FontId::proportional(14.0),
                    Color32::from_gray(180),
                );
                return;
            }
            LayoutEvent::Idle => {}
        }

        let highlight = self.cached_highlight_matches();
        let Some(snapshot) = self.snapshot.as_ref() else {
            return;
        };
        if Some(snapshot.generation) != self.engine.generation() {
            return;
        }

        let items = self.engine.items();
        let hovered = response
            .hover_pos()
            .and_then(|pointer| hit_test(&snapshot.positions, items, pointer - rect.min));
        if hovered.is_some() {
            ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
        }

        for (index, (item, position)) in items.iter().zip(&snapshot.positions).enumerate() {
            let emphasis = BubbleEmphasis {
                hovered: hovered == Some(index),
                selected: self.interaction.is_selected(&item.symbol),
                highlighted: highlight
                    .as_ref()
                    .is_some_and(|matches| matches.contains(&index)),
            };
            paint_bubble(&painter, rect.min + *position, item, emphasis);
        }

        if response.clicked()
            && let Some(index) = hovered
        {
            self.interaction.on_bubble_activated(&items[index]);
        }
    }
}
