//! Plain value types shared by the catalog and the parsers.

use derive_more::{Constructor, Display};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Pixel rectangle
#[derive(Constructor, Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Same size, moved by `(dx, dy)`
    pub fn offset(self, dx: i32, dy: i32) -> Rect {
        Rect {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..self
        }
    }
}

/// Kind of a catalog entry, taken from the manifest tag name
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "lowercase"))]
pub enum ItemType {
    #[display("image")]
    Image,
    #[display("movieclip")]
    MovieClip,
    #[display("sound")]
    Sound,
    #[display("font")]
    Font,
    #[display("component")]
    Component,
    #[display("atlas")]
    Atlas,
    #[display("misc")]
    Misc,
}

impl ItemType {
    /// Map a manifest tag to its item type, `None` for tags outside the known set
    pub fn from_tag(tag: &str) -> Option<ItemType> {
        Some(match tag {
            "image" => ItemType::Image,
            "movieclip" => ItemType::MovieClip,
            "sound" => ItemType::Sound,
            "font" => ItemType::Font,
            "component" => ItemType::Component,
            "atlas" => ItemType::Atlas,
            "misc" => ItemType::Misc,
            _ => return None,
        })
    }
}

/// How an image stretches when drawn larger than its declared size
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(rename_all = "lowercase"))]
pub enum ScaleMode {
    #[default]
    None,
    /// 9-slice scaling around the grid rectangle
    NineGrid(Rect),
    /// Repeat the image instead of stretching it
    Tile,
}

/// Settings the manifest carries for image items only
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ImageOptions {
    pub scale: ScaleMode,
    pub smoothing: bool,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            scale: ScaleMode::None,
            smoothing: true,
        }
    }
}

/// Parse a comma separated list of integers, missing or malformed entries become 0.
pub(crate) fn parse_ints<const N: usize>(value: &str) -> [i32; N] {
    let mut out = [0; N];
    for (slot, part) in out.iter_mut().zip(value.split(',')) {
        *slot = part.trim().parse().unwrap_or_default();
    }
    out
}
