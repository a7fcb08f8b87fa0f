//! Loading of packed UI asset bundles.
//!
//! A package is one compressed archive (see [`uipack_archive`]) holding a resource manifest, a
//! sprite index and per-item descriptors. Loading a package builds its item catalog; the
//! payload of each item is resolved through a [`Backend`] on first request and cached.
//!
//! | File              | Content                                                 |
//! |-------------------|---------------------------------------------------------|
//! | `package.xml`     | Package id, name and item catalog, see [`manifest`]     |
//! | `sprites.bytes`   | Atlas regions of images and frames, see [`sprites`]     |
//! | `<itemId>.fnt`    | Bitmap font descriptor, see [`font`]                    |
//! | `<itemId>.xml`    | Component layout or movie clip frame table              |
//!
//! Atlas images, sounds and other raw blobs are not part of the archive. The backend loads them
//! under `<sourceKey>@<name>`.

pub mod backend;
pub mod error;
pub mod font;
pub mod item;
pub mod manifest;
pub mod movieclip;
pub mod package;
pub mod registry;
pub mod sprites;
pub mod tree;
pub mod types;

pub use backend::{Backend, FileBackend, ObjectFactory, TextureRef, PACKAGE_EXTENSION};
pub use font::{BitmapFont, Glyph};
pub use item::{Asset, ItemInfo, PackageItem};
pub use movieclip::{Frame, MovieClip};
pub use package::{LoadOptions, Package};
pub use registry::Registry;
pub use types::{ItemType, Rect, ScaleMode};
