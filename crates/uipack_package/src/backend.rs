//! Seams to the outside world: blob loading, texture surfaces and object construction.

use std::{
    path::{Path, PathBuf},
    rc::Rc,
};

use tracing::{debug, trace};

use crate::item::{Asset, PackageItem};
use crate::types::Rect;

/// File extension of package archives on disk
pub const PACKAGE_EXTENSION: &str = "fui";

/// Resource loading and texture surfaces used while resolving package items.
///
/// Blob keys are `<packageSourceKey>@<subKey>`, except for the package archive itself which is
/// loaded by its bare source key. Every lookup reports a miss as `None`.
pub trait Backend {
    /// Handle to a texture or to a region of one
    type Texture: Clone;

    /// Handle to decoded audio
    type Sound;

    /// Raw bytes stored under `key`
    fn load_bytes(&self, key: &str) -> Option<Vec<u8>>;

    /// Image stored under `key`, as a texture
    fn load_texture(&self, key: &str) -> Option<Self::Texture>;

    /// Audio stored under `key`
    fn load_sound(&self, key: &str) -> Option<Self::Sound>;

    /// A view on `region` of `source`. The region is relative to `source`, which may itself be
    /// a view.
    fn sub_texture(&self, source: &Self::Texture, region: Rect) -> Option<Self::Texture>;

    /// Release a texture created while resolving an item
    fn dispose_texture(&self, texture: &Self::Texture);
}

/// Builds live objects out of package items.
///
/// This is the only bridge to a UI object framework. The package hands over the item together
/// with its resolved asset (the parsed descriptor for components) and never inspects the object.
pub trait ObjectFactory<B: Backend> {
    type Object;

    /// A fresh object for `item`, `None` when the item has no object form
    fn new_object(&self, item: &PackageItem<B>) -> Option<Self::Object>;

    /// Populate `object` from the item it was created for
    fn construct_from_resource(
        &self,
        object: &mut Self::Object,
        item: &PackageItem<B>,
        asset: Option<&Asset<B>>,
    );
}

/// Texture handle of [`FileBackend`]: the blob key plus an optional region inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRef {
    pub key: Rc<str>,
    pub region: Option<Rect>,
}

/// Headless backend reading blobs from files in one directory.
///
/// A key maps to the file of the same name inside the root. Package source keys may leave out
/// the `.fui` extension. Textures are never decoded, so disposing them is a no-op.
#[derive(Debug, Clone)]
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, key: &str) -> Option<PathBuf> {
        let path = self.root.join(key);
        if path.is_file() {
            return Some(path);
        }

        let path = self.root.join(format!("{key}.{PACKAGE_EXTENSION}"));
        path.is_file().then_some(path)
    }
}

impl Backend for FileBackend {
    type Texture = TextureRef;
    type Sound = Vec<u8>;

    fn load_bytes(&self, key: &str) -> Option<Vec<u8>> {
        let path = self.locate(key)?;
        std::fs::read(&path)
            .inspect_err(|e| debug!(path = %path.display(), "unable to read blob: {e}"))
            .ok()
    }

    fn load_texture(&self, key: &str) -> Option<TextureRef> {
        self.locate(key).map(|_| TextureRef {
            key: key.into(),
            region: None,
        })
    }

    fn load_sound(&self, key: &str) -> Option<Vec<u8>> {
        self.load_bytes(key)
    }

    fn sub_texture(&self, source: &TextureRef, region: Rect) -> Option<TextureRef> {
        let region = match source.region {
            Some(parent) => region.offset(parent.x, parent.y),
            None => region,
        };
        Some(TextureRef {
            key: source.key.clone(),
            region: Some(region),
        })
    }

    fn dispose_texture(&self, texture: &TextureRef) {
        trace!(key = %texture.key, "dispose texture");
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use crate::backend::{Backend, FileBackend, TextureRef};
    use crate::types::Rect;

    #[test]
    fn sub_textures_compose_offsets() {
        let backend = FileBackend::new(".");
        let atlas = TextureRef {
            key: Rc::from("pkg@atlas0.png"),
            region: None,
        };

        let sprite = backend.sub_texture(&atlas, Rect::new(10, 20, 30, 40));
        assert_eq!(
            sprite.as_ref().and_then(|t| t.region),
            Some(Rect::new(10, 20, 30, 40))
        );

        let glyph = sprite.and_then(|s| backend.sub_texture(&s, Rect::new(1, 2, 3, 4)));
        assert_eq!(
            glyph,
            Some(TextureRef {
                key: Rc::from("pkg@atlas0.png"),
                region: Some(Rect::new(11, 22, 3, 4)),
            })
        );
    }

    #[test]
    fn missing_files_are_misses() {
        let backend = FileBackend::new("/nonexistent/uipack");
        assert!(backend.load_bytes("pkg").is_none());
        assert!(backend.load_texture("pkg@atlas0.png").is_none());
    }
}
