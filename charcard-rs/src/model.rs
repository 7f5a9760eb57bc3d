//! Typed inputs of a card: portrait source, background choice and view transform.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::CardError;

/// A width/height pair in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Multiply both dimensions by `factor`.
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// A 2D offset in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset {
    pub x: f32,
    pub y: f32,
}

impl Offset {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

impl std::ops::Add for Offset {
    type Output = Offset;

    fn add(self, rhs: Offset) -> Offset {
        Offset::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Offset {
    type Output = Offset;

    fn sub(self, rhs: Offset) -> Offset {
        Offset::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Where an image comes from, before it is fetched and decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageRef {
    /// `http(s)://`, `file://`, `data:` URI or a bare filesystem path.
    Url(String),
    /// Encoded image bytes already held in memory.
    Bytes(Arc<[u8]>),
}

impl ImageRef {
    /// Short description used in log messages.
    pub fn describe(&self) -> String {
        match self {
            ImageRef::Url(url) if url.starts_with("data:") => "data URI".to_string(),
            ImageRef::Url(url) => url.clone(),
            ImageRef::Bytes(bytes) => format!("{} in-memory bytes", bytes.len()),
        }
    }
}

/// The portrait painted on the character canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum PortraitSource {
    /// Game-sourced splash art, framed with the gacha crop.
    GameArt(String),
    /// A portrait previously uploaded and stored server-side.
    CustomUrl(String),
    /// A user upload held in memory as an encoded image.
    Encoded(Arc<[u8]>),
}

impl PortraitSource {
    pub fn is_game_art(&self) -> bool {
        matches!(self, PortraitSource::GameArt(_))
    }

    pub fn image_ref(&self) -> ImageRef {
        match self {
            PortraitSource::GameArt(url) | PortraitSource::CustomUrl(url) => {
                ImageRef::Url(url.clone())
            }
            PortraitSource::Encoded(bytes) => ImageRef::Bytes(bytes.clone()),
        }
    }
}

/// Element themes with a dedicated static background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Pyro,
    Hydro,
    Anemo,
    Electro,
    Dendro,
    Cryo,
    Geo,
}

impl Element {
    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Pyro => "pyro",
            Element::Hydro => "hydro",
            Element::Anemo => "anemo",
            Element::Electro => "electro",
            Element::Dendro => "dendro",
            Element::Cryo => "cryo",
            Element::Geo => "geo",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Element {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "pyro" => Element::Pyro,
            "hydro" => Element::Hydro,
            "anemo" => Element::Anemo,
            "electro" => Element::Electro,
            "dendro" => Element::Dendro,
            "cryo" => Element::Cryo,
            "geo" => Element::Geo,
            other => {
                return Err(CardError::InvalidConfig(format!(
                    "unknown element: {other}"
                )))
            }
        })
    }
}

/// Logical height of namecard artwork; it is aligned to the canvas bottom.
pub const NAMECARD_HEIGHT: f32 = 572.0;

/// The themed picture painted on the background canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundChoice {
    /// Static element-themed background.
    Element(Element),
    /// Illustrated namecard background.
    Namecard { url: String },
}

impl BackgroundChoice {
    /// Resolve the image location against the asset base.
    pub fn image_ref(&self, asset_base: &str) -> ImageRef {
        match self {
            BackgroundChoice::Element(element) => ImageRef::Url(format!(
                "{}/elementalBackgrounds/{}-bg.jpg",
                asset_base.trim_end_matches('/'),
                element
            )),
            BackgroundChoice::Namecard { url } => ImageRef::Url(url.clone()),
        }
    }

    pub fn is_namecard(&self) -> bool {
        matches!(self, BackgroundChoice::Namecard { .. })
    }
}

/// User-controlled zoom and pan of the portrait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    pub zoom: f32,
    /// `None` means centered.
    pub pan: Option<Offset>,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: None,
        }
    }
}

/// Per-character framing of game art.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Framing {
    /// Offset added to the centered position, before layout scaling.
    pub nudge: Offset,
    /// Maximum pan magnitude per axis.
    pub freedom: Offset,
}

/// How a portrait is fitted to the character viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementMode {
    /// Cover the viewport and center.
    Default,
    /// Cover an inflated viewport, then nudge by the character framing.
    GachaCrop(Framing),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("pyro", Element::Pyro)]
    #[case("Hydro", Element::Hydro)]
    #[case(" geo ", Element::Geo)]
    fn test_parse_element(#[case] input: &str, #[case] expected: Element) {
        assert_eq!(input.parse::<Element>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_element() {
        assert!("plasma".parse::<Element>().is_err());
    }

    #[test]
    fn test_element_background_path() {
        let choice = BackgroundChoice::Element(Element::Cryo);
        assert_eq!(
            choice.image_ref("https://cdn.test/"),
            ImageRef::Url("https://cdn.test/elementalBackgrounds/cryo-bg.jpg".to_string())
        );
    }

    #[test]
    fn test_portrait_image_ref() {
        let bytes: Arc<[u8]> = Arc::from(vec![1u8, 2, 3]);
        assert_eq!(
            PortraitSource::Encoded(bytes.clone()).image_ref(),
            ImageRef::Bytes(bytes)
        );
        assert!(PortraitSource::GameArt("a.png".into()).is_game_art());
        assert!(!PortraitSource::CustomUrl("a.png".into()).is_game_art());
    }
}
