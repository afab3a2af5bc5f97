//! Reader tuning knobs loaded from a JSON settings file.

use std::fs;
use std::path::Path;

use anyhow::{Context, ensure};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::types::ReadingMode;

/// Page-mode tap zones as fractions of the canvas width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TapZones {
    /// Taps left of this fraction go to the previous page.
    pub previous_fraction: f32,
    /// Taps right of this fraction go to the next page.
    pub next_fraction: f32,
}

impl Default for TapZones {
    fn default() -> Self {
        Self { previous_fraction: 0.3, next_fraction: 0.7 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZoomLimits {
    pub min_scale: f32,
    pub max_scale: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min_scale: 1.0, max_scale: 5.0 }
    }
}

impl ZoomLimits {
    /// Limits that are safe to clamp and divide by: finite, positive and ordered. Swapped bounds
    /// are reordered; anything else falls back to the defaults.
    pub fn normalized(self) -> Self {
        let (min_scale, max_scale) = if self.min_scale <= self.max_scale {
            (self.min_scale, self.max_scale)
        } else {
            (self.max_scale, self.min_scale)
        };

        if min_scale.is_finite() && max_scale.is_finite() && min_scale > 0.0 {
            Self { min_scale, max_scale }
        } else {
            Self::default()
        }
    }
}

/// Appearance of panel highlight borders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlayStyle {
    pub stroke_width: f32,
    /// Alpha for non-current panels when every panel is outlined.
    pub dimmed_alpha: f32,
    pub badge_radius: f32,
    /// Offset of the badge centre from the panel's top-left corner.
    pub badge_inset: f32,
    /// The badge is only drawn once the highlight is more opaque than this.
    pub badge_min_alpha: f32,
    pub show_all_panels: bool,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            stroke_width: 3.0,
            dimmed_alpha: 0.3,
            badge_radius: 20.0,
            badge_inset: 30.0,
            badge_min_alpha: 0.5,
            show_all_panels: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReaderConfig {
    pub initial_reading_mode: ReadingMode,
    pub tap_zones: TapZones,
    /// Delay before the reader chrome hides itself, in milliseconds.
    pub auto_hide_ms: u64,
    pub zoom: ZoomLimits,
    pub overlay: OverlayStyle,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            initial_reading_mode: ReadingMode::Page,
            tap_zones: TapZones::default(),
            auto_hide_ms: 3_000,
            zoom: ZoomLimits::default(),
            overlay: OverlayStyle::default(),
        }
    }
}

impl ReaderConfig {
    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(
                    target: "config",
                    path = %path.display(),
                    "no reader config, using defaults"
                );
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("reading config at {}", path.display()));
            }
        };

        Self::from_json_slice(&bytes)
            .with_context(|| format!("loading config at {}", path.display()))
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let config: Self = serde_json::from_slice(bytes).context("parsing reader config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let TapZones { previous_fraction, next_fraction } = self.tap_zones;
        ensure!(
            (0.0..=1.0).contains(&previous_fraction)
                && (0.0..=1.0).contains(&next_fraction)
                && previous_fraction <= next_fraction,
            "tap zones must satisfy 0 <= previous ({previous_fraction}) <= next ({next_fraction})"
        );

        let ZoomLimits { min_scale, max_scale } = self.zoom;
        ensure!(
            min_scale > 0.0 && min_scale <= max_scale,
            "zoom limits must satisfy 0 < min ({min_scale}) <= max ({max_scale})"
        );
        ensure!(
            (0.0..=1.0).contains(&self.overlay.dimmed_alpha),
            "overlay dimmed alpha {} outside [0, 1]",
            self.overlay.dimmed_alpha
        );
        Ok(())
    }
}
