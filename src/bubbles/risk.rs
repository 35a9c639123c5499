//! Risk score to vertical band and colour mapping.
//!
//! Scores are clamped into `[10, 100]` before anything else looks at them;
//! missing or NaN scores read as 50.

use eframe::egui::Color32;

use crate::util::seeded_pair;

use super::profile::LayoutProfile;

pub const MIN_RISK: f32 = 10.0;
pub const MAX_RISK: f32 = 100.0;
pub const DEFAULT_RISK: f32 = 50.0;

/// Total share of the effective height an item may drift inside its band.
/// Kept below the smallest gap between band fractions so tiers never swap.
const INTRA_BAND_SPAN: f32 = 0.035;
const BAND_JITTER_SEED: u64 = 0x6a09_e667_f3bc_c908;

const LOW_RISK_RGB: [f32; 3] = [30.0, 255.0, 30.0];
const HIGH_RISK_RGB: [f32; 3] = [255.0, 0.0, 0.0];
const BORDER_ALPHA: f32 = 0.9;
const BACKGROUND_ALPHA: f32 = 0.35;
const GRADIENT_ALPHA: f32 = 0.6;

pub fn sanitize_risk(raw: Option<f64>) -> f32 {
    match raw {
        Some(value) if !value.is_nan() => value.clamp(MIN_RISK as f64, MAX_RISK as f64) as f32,
        _ => DEFAULT_RISK,
    }
}

pub fn clamp_risk(risk: f32) -> f32 {
    if risk.is_nan() {
        DEFAULT_RISK
    } else {
        risk.clamp(MIN_RISK, MAX_RISK)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RiskBand {
    Extreme,
    High,
    Elevated,
    Moderate,
    Low,
}

impl RiskBand {
    pub const ALL: [RiskBand; 5] = [
        RiskBand::Extreme,
        RiskBand::High,
        RiskBand::Elevated,
        RiskBand::Moderate,
        RiskBand::Low,
    ];

    pub fn from_risk(risk: f32) -> Self {
        let risk = clamp_risk(risk);
        if risk >= 90.0 {
            Self::Extreme
        } else if risk >= 80.0 {
            Self::High
        } else if risk >= 70.0 {
            Self::Elevated
        } else if risk >= 60.0 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    /// Inclusive lower bound and exclusive upper bound (the top band includes 100).
    pub fn bounds(self) -> (f32, f32) {
        match self {
            Self::Extreme => (90.0, MAX_RISK),
            Self::High => (80.0, 90.0),
            Self::Elevated => (70.0, 80.0),
            Self::Moderate => (60.0, 70.0),
            Self::Low => (MIN_RISK, 60.0),
        }
    }

    pub fn fraction(self, profile: &LayoutProfile) -> f32 {
        match self {
            Self::Extreme => 0.21,
            Self::High => 0.34,
            Self::Elevated => 0.44,
            Self::Moderate => 0.56,
            Self::Low => profile.low_band_fraction,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Extreme => "Extreme risk (90+)",
            Self::High => "High risk (80-89)",
            Self::Elevated => "Elevated (70-79)",
            Self::Moderate => "Moderate (60-69)",
            Self::Low => "Lower risk (<60)",
        }
    }
}

/// Offset from the top of the container for the band containing `risk`.
pub fn band_position(risk: f32, effective_height: f32, profile: &LayoutProfile) -> f32 {
    profile.top_padding + RiskBand::from_risk(risk).fraction(profile) * effective_height
}

/// Band position plus a small gradient inside the band: lower scores sit lower.
pub fn vertical_target(risk: f32, container_height: f32, profile: &LayoutProfile) -> f32 {
    let risk = clamp_risk(risk);
    let effective_height = profile.effective_height(container_height);
    let band = RiskBand::from_risk(risk);
    let (low, high) = band.bounds();
    let t = ((risk - low) / (high - low)).clamp(0.0, 1.0);
    band_position(risk, effective_height, profile) + (0.5 - t) * INTRA_BAND_SPAN * effective_height
}

/// Deterministic horizontal offset in `[-1, 1]` for a risk score.
pub fn horizontal_jitter(risk: f32) -> f32 {
    let bucket = (clamp_risk(risk) * 10.0).round() as u32;
    seeded_pair(BAND_JITTER_SEED, bucket).0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BubbleColors {
    pub border: Color32,
    pub background: Color32,
    pub gradient: Color32,
}

pub fn favorite_colors() -> BubbleColors {
    BubbleColors {
        border: Color32::from_rgba_unmultiplied(255, 215, 0, 242),
        background: Color32::from_rgba_unmultiplied(255, 215, 0, 89),
        gradient: Color32::from_rgba_unmultiplied(255, 236, 139, 166),
    }
}

fn lerp_color(t: f32, alpha: f32) -> Color32 {
    let channel = |index: usize| {
        let low = LOW_RISK_RGB[index];
        let high = HIGH_RISK_RGB[index];
        (low + (high - low) * t).round().clamp(0.0, 255.0) as u8
    };
    let alpha = (alpha * 255.0).round().clamp(0.0, 255.0) as u8;
    Color32::from_rgba_unmultiplied(channel(0), channel(1), channel(2), alpha)
}

pub fn color_for(risk: f32, is_favorite: bool) -> BubbleColors {
    if is_favorite {
        return favorite_colors();
    }

    let t = (clamp_risk(risk) - MIN_RISK) / (MAX_RISK - MIN_RISK);
    BubbleColors {
        border: lerp_color(t, BORDER_ALPHA),
        background: lerp_color(t, BACKGROUND_ALPHA),
        gradient: lerp_color(t, GRADIENT_ALPHA),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn missing_and_nan_scores_default_to_fifty() {
        assert_eq!(sanitize_risk(None), DEFAULT_RISK);
        assert_eq!(sanitize_risk(Some(f64::NAN)), DEFAULT_RISK);
        assert_eq!(clamp_risk(f32::NAN), DEFAULT_RISK);
    }

    #[test]
    fn out_of_range_scores_clamp() {
        assert_eq!(sanitize_risk(Some(-5.0)), MIN_RISK);
        assert_eq!(sanitize_risk(Some(0.0)), MIN_RISK);
        assert_eq!(sanitize_risk(Some(250.0)), MAX_RISK);
        assert_eq!(sanitize_risk(Some(f64::INFINITY)), MAX_RISK);
        assert_eq!(sanitize_risk(Some(f64::NEG_INFINITY)), MIN_RISK);
        assert_eq!(sanitize_risk(Some(73.5)), 73.5);
    }

    proptest! {
        #[test]
        fn sanitized_scores_are_always_in_range(raw in proptest::option::of(proptest::num::f64::ANY)) {
            let risk = sanitize_risk(raw);
            prop_assert!(!risk.is_nan());
            prop_assert!((MIN_RISK..=MAX_RISK).contains(&risk));
        }
    }

    #[test]
    fn band_offsets_grow_as_risk_falls() {
        let profile = LayoutProfile::desktop();
        let offsets = [95.0, 85.0, 75.0, 65.0, 50.0]
            .map(|risk| band_position(risk, 520.0, &profile));

        for pair in offsets.windows(2) {
            assert!(pair[0] < pair[1], "{offsets:?}");
        }
    }

    #[test]
    fn band_boundaries_close_on_the_lower_end() {
        assert_eq!(RiskBand::from_risk(90.0), RiskBand::Extreme);
        assert_eq!(RiskBand::from_risk(89.999), RiskBand::High);
        assert_eq!(RiskBand::from_risk(80.0), RiskBand::High);
        assert_eq!(RiskBand::from_risk(60.0), RiskBand::Moderate);
        assert_eq!(RiskBand::from_risk(59.99), RiskBand::Low);
        assert_eq!(RiskBand::from_risk(100.0), RiskBand::Extreme);
        assert_eq!(RiskBand::from_risk(-40.0), RiskBand::Low);

        let profile = LayoutProfile::desktop();
        assert!((band_position(90.0, 100.0, &profile) - 61.0).abs() < 1e-3);
        assert!((band_position(89.999, 100.0, &profile) - 74.0).abs() < 1e-3);
    }

    #[test]
    fn compact_profile_only_moves_the_low_band() {
        let desktop = LayoutProfile::desktop();
        let compact = LayoutProfile::compact();

        for band in RiskBand::ALL {
            if band == RiskBand::Low {
                assert_eq!(band.fraction(&desktop), 0.70);
                assert_eq!(band.fraction(&compact), 0.60);
            } else {
                assert_eq!(band.fraction(&desktop), band.fraction(&compact));
            }
        }
    }

    #[test]
    fn vertical_targets_are_strictly_ordered_by_risk() {
        for profile in [LayoutProfile::desktop(), LayoutProfile::compact()] {
            let mut previous = f32::NEG_INFINITY;
            let mut risk = MAX_RISK;
            while risk >= MIN_RISK {
                let target = vertical_target(risk, 600.0, &profile);
                assert!(target > previous, "risk {risk} target {target} previous {previous}");
                previous = target;
                risk -= 0.5;
            }
        }
    }

    #[test]
    fn favorites_override_risk_colouring() {
        assert_eq!(color_for(95.0, true), favorite_colors());
        assert_eq!(color_for(10.0, true), favorite_colors());
    }

    #[test]
    fn high_risk_is_red_and_low_risk_is_green() {
        let high = color_for(95.0, false);
        assert!(high.border.r() > high.border.g());
        assert!(high.background.r() > high.background.g());
        assert!(high.gradient.r() > high.gradient.g());

        let low = color_for(10.0, false);
        assert!(low.border.g() > low.border.r());
        assert!(low.background.g() > low.background.r());
        assert!(low.gradient.g() > low.gradient.r());
    }

    #[test]
    fn each_colour_layer_keeps_its_own_alpha() {
        let colors = color_for(55.0, false);
        assert!(colors.border.a() > colors.gradient.a());
        assert!(colors.gradient.a() > colors.background.a());
    }

    #[test]
    fn horizontal_jitter_is_bounded_and_repeatable() {
        for risk in [10.0, 33.3, 50.0, 89.9, 100.0] {
            let jitter = horizontal_jitter(risk);
            assert!((-1.0..=1.0).contains(&jitter));
            assert_eq!(jitter, horizontal_jitter(risk));
        }
    }
}
