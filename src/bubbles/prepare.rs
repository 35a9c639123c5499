use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;

use eframe::egui::{Vec2, vec2};
use tracing::warn;

use crate::feed::{TokenMeta, TokenRecord};
use crate::util::{seeded_pair, seeded_unit};

use super::ContainerSize;
use super::profile::LayoutProfile;
use super::risk::{BubbleColors, color_for, sanitize_risk, vertical_target};

const SEED_JITTER_FRACTION: f32 = 0.05;
const SEED_JITTER_MAX: f32 = 24.0;
const FALLBACK_SIZE_MIN: f32 = 0.5;
const FALLBACK_SIZE_SPAN: f32 = 0.5;
/// Share of the container the bubbles may cover before their radii shrink.
const FIT_COVERAGE: f32 = 0.5;

/// Inclusive, 1-based window over the ranked token list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankRange {
    pub start: usize,
    pub end: usize,
}

impl Default for RankRange {
    fn default() -> Self {
        Self { start: 1, end: 100 }
    }
}

impl RankRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-based slice bounds for a list of `len` records.
    pub fn slice_bounds(self, len: usize) -> Range<usize> {
        let (low, high) = if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };
        let low = low.max(1).min(len + 1);
        let high = high.min(len);
        (low - 1)..high.max(low - 1)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutRequest {
    pub range: RankRange,
    pub favorites: HashSet<String>,
    pub favorites_only: bool,
    pub search_prefix: Option<String>,
    pub seed: u64,
}

impl LayoutRequest {
    fn search_prefix(&self) -> Option<String> {
        self.search_prefix
            .as_deref()
            .map(str::trim)
            .filter(|prefix| !prefix.is_empty())
            .map(str::to_lowercase)
    }
}

#[derive(Clone, Debug)]
pub struct RenderItem {
    pub symbol: String,
    pub risk: f32,
    pub size_factor: f32,
    pub radius: f32,
    pub position: Vec2,
    pub is_favorite: bool,
    pub colors: BubbleColors,
    /// Seeded value in `[-1, 1]` used to spread initial x positions.
    pub seed_jitter: f32,
    pub meta: Arc<TokenMeta>,
}

/// Why a layout pass produced nothing to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyLayout {
    NoData,
    NoFavorites,
    NoFavoritesInRange,
    NoSearchMatches,
}

impl EmptyLayout {
    pub fn message(self) -> &'static str {
        match self {
            Self::NoData => "No token data for the selected range.",
            Self::NoFavorites => "No favorites yet. Open a token and star it to pin it here.",
            Self::NoFavoritesInRange => "None of your favorites are in the selected range.",
            Self::NoSearchMatches => "No tokens match the current search.",
        }
    }
}

#[derive(Clone, Debug)]
pub enum PreparedLayout {
    Items(Vec<RenderItem>),
    Empty(EmptyLayout),
}

pub fn sanitize_size_factor(raw: Option<f64>, seed: u64, symbol: &str) -> f32 {
    match raw {
        Some(value) if value.is_finite() && value > 0.0 && (value as f32) > 0.0 => value as f32,
        _ => FALLBACK_SIZE_MIN + seeded_unit(seed, symbol) * FALLBACK_SIZE_SPAN,
    }
}

pub fn radius_for(size_factor: f32, profile: &LayoutProfile) -> f32 {
    let radius = size_factor * profile.radius_scale;
    if radius.is_finite() {
        radius.clamp(profile.min_radius, profile.max_radius)
    } else {
        profile.max_radius
    }
}

/// Recomputes radii from size factors for this container. When the set would
/// cover more than half of it, every radius shrinks by the same factor, still
/// clamped to the profile bounds. Returns the factor applied, if any.
pub fn fit_radii(items: &mut [RenderItem], container: ContainerSize, profile: &LayoutProfile) -> Option<f32> {
    for item in items.iter_mut() {
        item.radius = radius_for(item.size_factor, profile);
    }

    let covered = items
        .iter()
        .map(|item| std::f32::consts::PI * item.radius * item.radius)
        .sum::<f32>();
    let budget = FIT_COVERAGE * container.width * container.height;
    if !(covered > budget && budget > 0.0) {
        return None;
    }

    let scale = (budget / covered).sqrt();
    for item in items.iter_mut() {
        item.radius = (item.radius * scale).clamp(profile.min_radius, profile.max_radius);
    }
    Some(scale)
}

/// Initial position: horizontally near the centre, vertically on the risk band.
pub fn seed_position(item: &RenderItem, container: ContainerSize, profile: &LayoutProfile) -> Vec2 {
    let spread = (container.width * SEED_JITTER_FRACTION).min(SEED_JITTER_MAX);
    vec2(
        container.width * 0.5 + item.seed_jitter * spread,
        vertical_target(item.risk, container.height, profile),
    )
}

pub fn prepare(
    records: &[TokenRecord],
    request: &LayoutRequest,
    container: Option<ContainerSize>,
    profile: &LayoutProfile,
) -> PreparedLayout {
    if records.is_empty() {
        return PreparedLayout::Empty(EmptyLayout::NoData);
    }
    if request.favorites_only && request.favorites.is_empty() {
        return PreparedLayout::Empty(EmptyLayout::NoFavorites);
    }

    let windowed = &records[request.range.slice_bounds(records.len())];
    if windowed.is_empty() {
        return PreparedLayout::Empty(EmptyLayout::NoData);
    }

    let favorites_pass = windowed
        .iter()
        .filter(|record| !request.favorites_only || request.favorites.contains(&record.symbol))
        .collect::<Vec<_>>();
    if favorites_pass.is_empty() {
        return PreparedLayout::Empty(EmptyLayout::NoFavoritesInRange);
    }

    let prefix = request.search_prefix();
    let survivors = favorites_pass
        .into_iter()
        .filter(|record| {
            prefix
                .as_deref()
                .is_none_or(|prefix| record.symbol.to_lowercase().starts_with(prefix))
        })
        .collect::<Vec<_>>();
    if survivors.is_empty() {
        return PreparedLayout::Empty(EmptyLayout::NoSearchMatches);
    }

    let container = container.filter(ContainerSize::is_usable);
    let items = survivors
        .into_iter()
        .map(|record| {
            let risk = sanitize_risk(record.risk);
            let size_factor = sanitize_size_factor(record.bubble_size, request.seed, &record.symbol);
            let is_favorite = request.favorites.contains(&record.symbol);
            let mut item = RenderItem {
                symbol: record.symbol.clone(),
                risk,
                size_factor,
                radius: radius_for(size_factor, profile),
                position: Vec2::ZERO,
                is_favorite,
                colors: color_for(risk, is_favorite),
                seed_jitter: seeded_pair(request.seed, &record.symbol).0,
                meta: Arc::clone(&record.meta),
            };

            if let Some(container) = container {
                item.position = seed_position(&item, container, profile);
                if !item.position.x.is_finite() || !item.position.y.is_finite() {
                    warn!(
                        symbol = %item.symbol,
                        x = item.position.x,
                        y = item.position.y,
                        "seeded a non-finite bubble position, falling back to the centre"
                    );
                    item.position = container.center();
                }
            }
            item
        })
        .collect();

    PreparedLayout::Items(items)
}
