//! Tunable configuration for a card.
//!
//! Every section has defaults matching the standard card layout, so a JSON
//! config file only needs the values it overrides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{CardError, CardResult};
use crate::model::{Framing, Offset, Size};

/// Top-level card configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardConfig {
    pub viewport: ViewportConfig,
    pub retry: RetryConfig,
    pub sampler: SamplerConfig,
    pub framing: FramingTable,
    pub throttle: ThrottleConfig,
    pub export: ExportConfig,
    pub upload: UploadConfig,
    /// Prefix of static assets such as element backgrounds.
    pub asset_base: String,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            retry: RetryConfig::default(),
            sampler: SamplerConfig::default(),
            framing: FramingTable::default(),
            throttle: ThrottleConfig::default(),
            export: ExportConfig::default(),
            upload: UploadConfig::default(),
            asset_base: String::new(),
        }
    }
}

impl CardConfig {
    /// Load and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> CardResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: CardConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CardResult<()> {
        self.viewport.validate()?;
        if self.sampler.gradient_steps == 0 {
            return Err(CardError::InvalidConfig(
                "sampler.gradient_steps must be at least 1".to_string(),
            ));
        }
        if !(self.upload.quality_factor > 0.0) {
            return Err(CardError::InvalidConfig(
                "upload.quality_factor must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logical sizes of the two canvases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Character canvas size before layout scaling.
    pub character: Size,
    /// Background canvas size before layout scaling.
    pub background: Size,
    /// Multiplies both canvas sizes and the gacha crop nudges.
    pub layout_scale: f32,
    /// Device pixels per logical pixel.
    pub pixel_density: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            character: Size::new(500.0, 485.0),
            background: Size::new(1200.0, 485.0),
            layout_scale: 1.0,
            pixel_density: 2.0,
        }
    }
}

impl ViewportConfig {
    pub fn validate(&self) -> CardResult<()> {
        if self.character.is_empty() || self.background.is_empty() {
            return Err(CardError::InvalidConfig(
                "viewport sizes must be positive".to_string(),
            ));
        }
        if !(self.layout_scale > 0.0) || !(self.pixel_density > 0.0) {
            return Err(CardError::InvalidConfig(
                "layout_scale and pixel_density must be positive".to_string(),
            ));
        }
        if self.background.width <= self.character.width {
            return Err(CardError::InvalidConfig(format!(
                "background width {} must exceed character width {}",
                self.background.width, self.character.width
            )));
        }
        Ok(())
    }

    /// Logical character viewport after layout scaling.
    pub fn character_size(&self) -> Size {
        self.character.scaled(self.layout_scale)
    }

    /// Logical background viewport after layout scaling.
    pub fn background_size(&self) -> Size {
        self.background.scaled(self.layout_scale)
    }

    /// Device pixel dimensions of a logical size.
    pub fn device_size(&self, logical: Size) -> (u32, u32) {
        (
            (logical.width * self.pixel_density).round().max(1.0) as u32,
            (logical.height * self.pixel_density).round().max(1.0) as u32,
        )
    }
}

/// Bounded retry with a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts after the first one.
    pub max_retries: usize,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            delay_ms: 10,
        }
    }
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Edge strip sampling and gradient synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Distance of the sampled column from the right edge, in device pixels.
    pub sample_inset: u32,
    pub gradient_steps: usize,
    /// Alpha of every stop in the translucent gradient.
    pub translucent_alpha: u8,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            sample_inset: 25,
            gradient_steps: 2,
            translucent_alpha: 0x55,
        }
    }
}

/// Gacha crop framing: one entry per specially framed character plus a fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingTable {
    pub named: BTreeMap<String, Framing>,
    pub fallback: Framing,
}

impl Default for FramingTable {
    fn default() -> Self {
        let mut named = BTreeMap::new();
        named.insert(
            "Traveler".to_string(),
            Framing {
                nudge: Offset::new(-100.0, 30.0),
                freedom: Offset::new(160.0, 370.0),
            },
        );
        Self {
            named,
            fallback: Framing {
                nudge: Offset::new(-130.0, -82.0),
                freedom: Offset::new(510.0, 158.0),
            },
        }
    }
}

impl FramingTable {
    /// Framing for `character`, with the nudge already multiplied by `layout_scale`.
    pub fn resolve(&self, character: &str, layout_scale: f32) -> Framing {
        let framing = self.named.get(character).unwrap_or(&self.fallback);
        Framing {
            nudge: framing.nudge.scaled(layout_scale),
            freedom: framing.freedom,
        }
    }
}

/// Repaint throttle intervals during drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub touch_ms: u64,
    pub mouse_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            touch_ms: 33,
            mouse_ms: 17,
        }
    }
}

/// A pixel correction applied to overlay elements of one class during capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNudge {
    pub class: String,
    #[serde(default)]
    pub dx: f32,
    #[serde(default)]
    pub dy: f32,
}

impl SnapshotNudge {
    pub fn new(class: &str, dx: f32, dy: f32) -> Self {
        Self {
            class: class.to_string(),
            dx,
            dy,
        }
    }
}

/// Snapshot layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Top-left of the character canvas inside the card, in logical pixels.
    pub character_origin: Offset,
    pub nudges: Vec<SnapshotNudge>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            character_origin: Offset::default(),
            nudges: vec![
                SnapshotNudge::new("talent-display-value-span", 0.0, -1.0),
                SnapshotNudge::new("roll-list-member-text", 0.0, -1.0),
                SnapshotNudge::new("roll-list-member-icon", 0.0, 1.0),
                SnapshotNudge::new("compact-artifact-main-stat", 0.0, -1.0),
                SnapshotNudge::new("lb-badge", 0.0, -1.0),
                SnapshotNudge::new("compact-artifact-crit-value", 0.0, -1.0),
                SnapshotNudge::new("table-stat-row", 0.0, -1.0),
                SnapshotNudge::new("compact-artifact-substat", 0.0, -1.0),
                SnapshotNudge::new("roll-dots", -3.0, -1.0),
            ],
        }
    }
}

/// Portrait upload endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub api_base: String,
    /// Uploaded files are rescaled to cover this many times the character viewport.
    pub quality_factor: f32,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5033".to_string(),
            quality_factor: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        CardConfig::default().validate().unwrap();
    }

    #[test]
    fn test_background_must_be_wider() {
        let viewport = ViewportConfig {
            background: Size::new(400.0, 485.0),
            ..Default::default()
        };
        assert!(matches!(
            viewport.validate(),
            Err(CardError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_device_size() {
        let viewport = ViewportConfig::default();
        assert_eq!(viewport.device_size(viewport.character_size()), (1000, 970));
        assert_eq!(viewport.device_size(viewport.background_size()), (2400, 970));
    }

    #[test]
    fn test_framing_resolve_scales_nudge() {
        let table = FramingTable::default();
        let traveler = table.resolve("Traveler", 0.5);
        assert_eq!(traveler.nudge, Offset::new(-50.0, 15.0));
        assert_eq!(traveler.freedom, Offset::new(160.0, 370.0));
        let other = table.resolve("Furina", 1.0);
        assert_eq!(other.nudge, Offset::new(-130.0, -82.0));
    }

    #[test]
    fn test_from_json_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sampler": {{"sample_inset": 40}}, "asset_base": "/assets"}}"#
        )
        .unwrap();
        let config = CardConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.sampler.sample_inset, 40);
        assert_eq!(config.sampler.gradient_steps, 2);
        assert_eq!(config.asset_base, "/assets");
        assert_eq!(config.retry, RetryConfig::default());
    }

    #[test]
    fn test_from_json_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"sampler": {{"gradient_steps": 0}}}}"#).unwrap();
        assert!(CardConfig::from_json_file(file.path()).is_err());
    }
}
