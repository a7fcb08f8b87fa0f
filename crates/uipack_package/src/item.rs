//! Catalog entries and their resolved payloads.

use std::{
    cell::OnceCell,
    fmt::{self, Debug},
    rc::Rc,
};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::backend::Backend;
use crate::font::BitmapFont;
use crate::movieclip::MovieClip;
use crate::tree::Node;
use crate::types::{ImageOptions, ItemType, Rect, ScaleMode};

/// What the manifest declares about an item
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ItemInfo {
    pub id: String,
    pub name: Option<String>,
    pub item_type: ItemType,
    pub file: Option<String>,
    pub width: i32,
    pub height: i32,
    /// Only present on [`ItemType::Image`] items
    pub image: Option<ImageOptions>,
}

/// Resolved payload of an item, the variant follows the item type
pub enum Asset<B: Backend> {
    /// Images and atlases
    Texture(B::Texture),
    Sound(B::Sound),
    Font(Rc<BitmapFont<B::Texture>>),
    MovieClip(MovieClip<B::Texture>),
    /// Parsed component descriptor
    Component(Node),
    /// Anything else, as raw bytes
    Blob(Vec<u8>),
}

impl<B: Backend> Debug for Asset<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Asset::Texture(_) => f.write_str("Texture"),
            Asset::Sound(_) => f.write_str("Sound"),
            Asset::Font(font) => write!(f, "Font({})", font.id()),
            Asset::MovieClip(clip) => write!(f, "MovieClip({} frames)", clip.frames().len()),
            Asset::Component(node) => write!(f, "Component(<{}>)", node.tag()),
            Asset::Blob(data) => write!(f, "Blob({} bytes)", data.len()),
        }
    }
}

impl<B: Backend> Asset<B> {
    pub fn as_texture(&self) -> Option<&B::Texture> {
        match self {
            Asset::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    pub fn as_sound(&self) -> Option<&B::Sound> {
        match self {
            Asset::Sound(sound) => Some(sound),
            _ => None,
        }
    }

    pub fn as_font(&self) -> Option<&Rc<BitmapFont<B::Texture>>> {
        match self {
            Asset::Font(font) => Some(font),
            _ => None,
        }
    }

    pub fn as_movie_clip(&self) -> Option<&MovieClip<B::Texture>> {
        match self {
            Asset::MovieClip(clip) => Some(clip),
            _ => None,
        }
    }

    pub fn as_component(&self) -> Option<&Node> {
        match self {
            Asset::Component(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Asset::Blob(data) => Some(data.as_slice()),
            _ => None,
        }
    }
}

/// One catalog entry of a package
///
/// The payload is resolved on first request through
/// [`Package::get_item_asset`](crate::package::Package::get_item_asset) and cached for the
/// lifetime of the package.
pub struct PackageItem<B: Backend> {
    info: ItemInfo,
    asset: OnceCell<Option<Asset<B>>>,
}

impl<B: Backend> Debug for PackageItem<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PackageItem")
            .field("info", &self.info)
            .field("decoded", &self.is_decoded())
            .finish()
    }
}

impl<B: Backend> PackageItem<B> {
    pub(crate) fn new(info: ItemInfo) -> Self {
        Self {
            info,
            asset: OnceCell::new(),
        }
    }

    pub fn info(&self) -> &ItemInfo {
        &self.info
    }

    pub fn id(&self) -> &str {
        &self.info.id
    }

    pub fn name(&self) -> Option<&str> {
        self.info.name.as_deref()
    }

    pub fn item_type(&self) -> ItemType {
        self.info.item_type
    }

    pub fn file(&self) -> Option<&str> {
        self.info.file.as_deref()
    }

    pub fn width(&self) -> i32 {
        self.info.width
    }

    pub fn height(&self) -> i32 {
        self.info.height
    }

    pub fn scale_mode(&self) -> ScaleMode {
        self.info.image.map(|image| image.scale).unwrap_or_default()
    }

    pub fn scale9_grid(&self) -> Option<Rect> {
        match self.scale_mode() {
            ScaleMode::NineGrid(grid) => Some(grid),
            _ => None,
        }
    }

    pub fn scale_by_tile(&self) -> bool {
        self.scale_mode() == ScaleMode::Tile
    }

    pub fn smoothing(&self) -> bool {
        self.info.image.map_or(true, |image| image.smoothing)
    }

    /// Whether the payload has been resolved, successfully or not
    pub fn is_decoded(&self) -> bool {
        self.asset.get().is_some()
    }

    pub(crate) fn cell(&self) -> &OnceCell<Option<Asset<B>>> {
        &self.asset
    }

    /// The cached payload, without resolving it
    pub(crate) fn cached(&self) -> Option<&Asset<B>> {
        self.asset.get().and_then(Option::as_ref)
    }
}
