use std::sync::Arc;

use eframe::egui::Vec2;

use crate::feed::TokenMeta;

use super::prepare::RenderItem;

/// The token whose detail overlay is open.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectedToken {
    pub symbol: String,
    pub risk: f32,
    pub meta: Arc<TokenMeta>,
}

/// Holds at most one selection. Never touches layout state.
#[derive(Default)]
pub struct BubbleInteractionController {
    selected: Option<SelectedToken>,
}

impl BubbleInteractionController {
    pub fn on_bubble_activated(&mut self, item: &RenderItem) {
        self.selected = Some(SelectedToken {
            symbol: item.symbol.clone(),
            risk: item.risk,
            meta: Arc::clone(&item.meta),
        });
    }

    pub fn on_overlay_closed(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&SelectedToken> {
        self.selected.as_ref()
    }

    pub fn is_overlay_open(&self) -> bool {
        self.selected.is_some()
    }

    pub fn is_selected(&self, symbol: &str) -> bool {
        self.selected
            .as_ref()
            .is_some_and(|selected| selected.symbol == symbol)
    }
}

/// Index of the closest bubble whose circle contains `pointer`.
pub fn hit_test(positions: &[Vec2], items: &[RenderItem], pointer: Vec2) -> Option<usize> {
    positions
        .iter()
        .zip(items)
        .enumerate()
        .filter_map(|(index, (position, item))| {
            let distance = (*position - pointer).length();
            (distance <= item.radius).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}
