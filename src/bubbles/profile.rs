use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Lowest usable settle threshold; alpha decays geometrically and must be able to reach it.
pub const MIN_ALPHA: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ProfileKind {
    Desktop,
    Compact,
}

impl ProfileKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Desktop => "Desktop",
            Self::Compact => "Compact",
        }
    }
}

/// Tuning constants for one chart layout. Desktop and compact share the
/// engine and differ only in these values.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutProfile {
    pub container_height: f32,
    pub top_padding: f32,
    pub bottom_padding: f32,
    pub low_band_fraction: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub radius_scale: f32,
    pub collision_padding: f32,
    pub alpha_decay: f32,
    pub alpha_min: f32,
    /// Fraction of velocity kept from one step to the next.
    pub velocity_retention: f32,
    pub settle_timeout_secs: Option<f32>,
    pub horizontal_pull_scale: f32,
    pub horizontal_spread: f32,
    pub repulsion_scale: f32,
    pub collision_iterations: usize,
}

impl LayoutProfile {
    pub fn desktop() -> Self {
        Self {
            container_height: 820.0,
            top_padding: 40.0,
            bottom_padding: 40.0,
            low_band_fraction: 0.70,
            min_radius: 18.0,
            max_radius: 46.0,
            radius_scale: 52.0,
            collision_padding: 2.0,
            alpha_decay: 0.01,
            alpha_min: 0.001,
            velocity_retention: 0.3,
            settle_timeout_secs: None,
            horizontal_pull_scale: 60.0,
            horizontal_spread: 0.32,
            repulsion_scale: 3.0,
            collision_iterations: 2,
        }
    }

    pub fn compact() -> Self {
        Self {
            container_height: 620.0,
            top_padding: 24.0,
            bottom_padding: 28.0,
            low_band_fraction: 0.60,
            min_radius: 12.0,
            max_radius: 30.0,
            radius_scale: 36.0,
            collision_padding: 2.0,
            alpha_decay: 0.02,
            alpha_min: 0.001,
            velocity_retention: 0.3,
            settle_timeout_secs: Some(8.0),
            horizontal_pull_scale: 45.0,
            horizontal_spread: 0.36,
            repulsion_scale: 2.0,
            collision_iterations: 2,
        }
    }

    pub fn preset(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Desktop => Self::desktop(),
            ProfileKind::Compact => Self::compact(),
        }
    }

    pub fn resolve(kind: ProfileKind, overrides: Option<&ProfileOverrides>) -> Self {
        let mut profile = Self::preset(kind);
        if let Some(overrides) = overrides {
            overrides.apply(&mut profile);
        }
        profile
    }

    pub fn effective_height(&self, container_height: f32) -> f32 {
        (container_height - self.top_padding - self.bottom_padding).max(0.0)
    }
}

/// Partial profile read from JSON; unset fields keep the preset value.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileOverrides {
    pub container_height: Option<f32>,
    pub top_padding: Option<f32>,
    pub bottom_padding: Option<f32>,
    pub low_band_fraction: Option<f32>,
    pub min_radius: Option<f32>,
    pub max_radius: Option<f32>,
    pub radius_scale: Option<f32>,
    pub collision_padding: Option<f32>,
    pub alpha_decay: Option<f32>,
    pub alpha_min: Option<f32>,
    pub velocity_retention: Option<f32>,
    pub settle_timeout_secs: Option<f32>,
    pub horizontal_pull_scale: Option<f32>,
    pub horizontal_spread: Option<f32>,
    pub repulsion_scale: Option<f32>,
    pub collision_iterations: Option<usize>,
}

impl ProfileOverrides {
    fn apply(&self, profile: &mut LayoutProfile) {
        fn set<T: Copy>(target: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *target = value;
            }
        }

        set(&mut profile.container_height, self.container_height);
        set(&mut profile.top_padding, self.top_padding);
        set(&mut profile.bottom_padding, self.bottom_padding);
        set(&mut profile.low_band_fraction, self.low_band_fraction);
        set(&mut profile.min_radius, self.min_radius);
        set(&mut profile.max_radius, self.max_radius);
        set(&mut profile.radius_scale, self.radius_scale);
        set(&mut profile.collision_padding, self.collision_padding);
        set(&mut profile.alpha_decay, self.alpha_decay);
        set(&mut profile.alpha_min, self.alpha_min);
        set(&mut profile.velocity_retention, self.velocity_retention);
        set(&mut profile.horizontal_pull_scale, self.horizontal_pull_scale);
        set(&mut profile.horizontal_spread, self.horizontal_spread);
        set(&mut profile.repulsion_scale, self.repulsion_scale);
        set(&mut profile.collision_iterations, self.collision_iterations);
        if let Some(timeout) = self.settle_timeout_secs {
            profile.settle_timeout_secs = (timeout > 0.0).then_some(timeout);
        }
        if profile.max_radius < profile.min_radius {
            profile.max_radius = profile.min_radius;
        }
        if profile.alpha_min.is_nan() || profile.alpha_min < MIN_ALPHA {
            profile.alpha_min = MIN_ALPHA;
        }
    }
}

pub fn load_profile_overrides(path: &Path) -> Result<ProfileOverrides> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read profile file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("invalid profile overrides in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_differ_in_the_low_band_and_timing() {
        let desktop = LayoutProfile::desktop();
        let compact = LayoutProfile::compact();

        assert_eq!(desktop.low_band_fraction, 0.70);
        assert_eq!(compact.low_band_fraction, 0.60);
        assert!(desktop.alpha_decay < compact.alpha_decay);
        assert_eq!(desktop.settle_timeout_secs, None);
        assert_eq!(compact.settle_timeout_secs, Some(8.0));
    }

    #[test]
    fn overrides_replace_only_the_fields_they_name() {
        let overrides: ProfileOverrides =
            serde_json::from_str(r#"{"containerHeight":700,"settleTimeoutSecs":5}"#).unwrap();
        let profile = LayoutProfile::resolve(ProfileKind::Desktop, Some(&overrides));

        assert_eq!(profile.container_height, 700.0);
        assert_eq!(profile.settle_timeout_secs, Some(5.0));
        assert_eq!(profile.max_radius, LayoutProfile::desktop().max_radius);
    }

    #[test]
    fn zero_timeout_disables_the_cap_and_radius_bounds_stay_ordered() {
        let overrides = ProfileOverrides {
            settle_timeout_secs: Some(0.0),
            max_radius: Some(4.0),
            ..ProfileOverrides::default()
        };
        let profile = LayoutProfile::resolve(ProfileKind::Compact, Some(&overrides));

        assert_eq!(profile.settle_timeout_secs, None);
        assert_eq!(profile.max_radius, profile.min_radius);
    }

    #[test]
    fn unknown_override_keys_are_rejected() {
        assert!(serde_json::from_str::<ProfileOverrides>(r#"{"gravity":1}"#).is_err());
    }

    #[test]
    fn effective_height_never_goes_negative() {
        let profile = LayoutProfile::desktop();
        assert_eq!(profile.effective_height(600.0), 520.0);
        assert_eq!(profile.effective_height(10.0), 0.0);
    }

    #[test]
    fn settle_threshold_is_kept_above_zero() {
        for raw in [r#"{"alphaMin":0}"#, r#"{"alphaMin":-0.5}"#] {
            let overrides: ProfileOverrides = serde_json::from_str(raw).unwrap();
            let profile = LayoutProfile::resolve(ProfileKind::Desktop, Some(&overrides));
            assert_eq!(profile.alpha_min, MIN_ALPHA);
        }

        let overrides: ProfileOverrides = serde_json::from_str(r#"{"alphaMin":0.01}"#).unwrap();
        let profile = LayoutProfile::resolve(ProfileKind::Desktop, Some(&overrides));
        assert_eq!(profile.alpha_min, 0.01);
    }
}
