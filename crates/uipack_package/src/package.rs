//! Loaded packages and lazy item resolution.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt::{self, Debug},
    rc::Rc,
};

use bon::Builder;
use indexmap::IndexMap;
use tracing::{debug, instrument, trace, warn};
use uipack_archive::{CompressionMethod, PackageArchive};

use crate::backend::{Backend, ObjectFactory};
use crate::error::{Error, Result};
use crate::font::{BitmapFont, GlyphImage, GlyphSource, OutlineAtlas};
use crate::item::{Asset, PackageItem};
use crate::manifest::Manifest;
use crate::movieclip::MovieClip;
use crate::sprites::{AtlasSprite, SpriteIndex};
use crate::tree::Node;
use crate::types::{ItemType, Rect};

/// Scheme prefix of item URLs
pub const URL_SCHEME: &str = "ui://";

/// Archive entry holding the resource manifest
pub const MANIFEST_FILE: &str = "package.xml";

/// Archive entry holding the sprite index
pub const SPRITES_FILE: &str = "sprites.bytes";

/// Options for how packages are decoded
#[derive(Debug, Clone, Copy, Default, Builder)]
pub struct LoadOptions {
    /// The compression method of the archive blob
    #[builder(default)]
    pub compression: CompressionMethod,
}

/// Builds an object when a component item should not go through the factory
pub type Constructor<'a, B, O> = &'a dyn Fn(&PackageItem<B>) -> O;

/// One loaded package: its catalog, sprite index and virtual files.
///
/// Item payloads are resolved on first request and cached until the package is disposed.
pub struct Package<B: Backend> {
    id: String,
    name: String,
    source_key: String,
    custom_id: RefCell<Option<String>>,
    archive: PackageArchive,
    sprites: SpriteIndex,
    items: IndexMap<String, PackageItem<B>>,
    names: HashMap<String, String>,
    backend: Rc<B>,
    constructing: Rc<Cell<u32>>,
    disposed: Cell<bool>,
}

impl<B: Backend> Debug for Package<B> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Package")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("source_key", &self.source_key)
            .field("custom_id", &self.custom_id.borrow())
            .field("items", &self.items.len())
            .field("disposed", &self.disposed.get())
            .finish_non_exhaustive()
    }
}

impl<B: Backend> Package<B> {
    /// Load the package stored under `source_key`.
    ///
    /// Fonts are resolved right away, everything else on first request.
    #[instrument(skip(backend, options), err)]
    pub fn load(source_key: &str, backend: Rc<B>, options: &LoadOptions) -> Result<Package<B>> {
        let compressed = backend
            .load_bytes(source_key)
            .ok_or_else(|| Error::PackageNotFound(source_key.to_owned()))?;
        let archive = PackageArchive::new(&compressed, options.compression)?;
        Self::from_archive(source_key, archive, backend)
    }

    /// Build a package out of an already decoded archive.
    pub fn from_archive(
        source_key: &str,
        archive: PackageArchive,
        backend: Rc<B>,
    ) -> Result<Package<B>> {
        let sprites = match archive.text(SPRITES_FILE) {
            Some(text) => SpriteIndex::parse(&text),
            None => {
                debug!("package has no sprite index");
                SpriteIndex::default()
            }
        };

        let Manifest { id, name, items } = match archive.text(MANIFEST_FILE) {
            Some(text) => Manifest::parse(&text)?,
            None => return Err(Error::MissingFile(MANIFEST_FILE.to_owned())),
        };

        let mut catalog = IndexMap::with_capacity(items.len());
        let mut names = HashMap::new();
        for info in items {
            if let Some(item_name) = &info.name {
                if let Some(previous) = names.insert(item_name.clone(), info.id.clone()) {
                    warn!(name = %item_name, %previous, id = %info.id, "duplicate item name, keeping the later one");
                }
            }
            let item_id = info.id.clone();
            if catalog.insert(item_id.clone(), PackageItem::new(info)).is_some() {
                warn!(id = %item_id, "duplicate item id, keeping the later one");
            }
        }

        let package = Package {
            id,
            name,
            source_key: source_key.to_owned(),
            custom_id: RefCell::new(None),
            archive,
            sprites,
            items: catalog,
            names,
            backend,
            constructing: Rc::new(Cell::new(0)),
            disposed: Cell::new(false),
        };

        let fonts = package
            .items
            .values()
            .filter(|item| item.item_type() == ItemType::Font)
            .filter_map(|item| package.get_item_asset(item.id()))
            .count();
        debug!(id = %package.id, name = %package.name, items = package.items.len(), fonts, "loaded package");

        Ok(package)
    }

    /// Share the construction depth counter of a registry
    pub(crate) fn with_constructing(mut self, counter: Rc<Cell<u32>>) -> Self {
        self.constructing = counter;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key the package was loaded from
    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    /// Secondary key the package is registered under, if any
    pub fn custom_id(&self) -> Option<String> {
        self.custom_id.borrow().clone()
    }

    /// Replace the alias, returning the previous one
    pub(crate) fn replace_custom_id(&self, alias: Option<String>) -> Option<String> {
        self.custom_id.replace(alias)
    }

    /// Build `"ui://" + package id + item id`
    pub fn item_url(&self, item: &PackageItem<B>) -> String {
        format!("{URL_SCHEME}{}{}", self.id, item.id())
    }

    pub fn get_item(&self, item_id: &str) -> Option<&PackageItem<B>> {
        self.items.get(item_id)
    }

    pub fn get_item_by_name(&self, name: &str) -> Option<&PackageItem<B>> {
        self.names.get(name).and_then(|id| self.items.get(id))
    }

    /// All items, in manifest order
    pub fn items(&self) -> impl Iterator<Item = &PackageItem<B>> {
        self.items.values()
    }

    pub fn sprite(&self, key: &str) -> Option<&AtlasSprite> {
        self.sprites.get(key)
    }

    /// The decoded virtual files
    pub fn archive(&self) -> &PackageArchive {
        &self.archive
    }

    /// Fonts resolved by this package
    pub fn fonts(&self) -> impl Iterator<Item = &Rc<BitmapFont<B::Texture>>> {
        self.items
            .values()
            .filter_map(PackageItem::cached)
            .filter_map(Asset::as_font)
    }

    /// Resolve the payload of `item_id`, at most once per item.
    ///
    /// Misses and resolution failures are logged and yield `None`, which is cached as well.
    pub fn get_item_asset(&self, item_id: &str) -> Option<&Asset<B>> {
        if self.disposed.get() {
            trace!(item_id, "package disposed");
            return None;
        }

        let item = self.items.get(item_id)?;
        if let Some(asset) = item.cell().get() {
            trace!(item_id, "cache hit");
            return asset.as_ref();
        }

        item.cell().get_or_init(|| self.resolve(item)).as_ref()
    }

    /// Resolve the payload of the item called `name`
    pub fn get_item_asset_by_name(&self, name: &str) -> Result<Option<&Asset<B>>> {
        let item = self
            .get_item_by_name(name)
            .ok_or_else(|| Error::ResourceNotFound(name.to_owned()))?;
        Ok(self.get_item_asset(item.id()))
    }

    #[instrument(skip_all, fields(package = %self.id, item = %item.id(), kind = %item.item_type()))]
    fn resolve(&self, item: &PackageItem<B>) -> Option<Asset<B>> {
        let asset = match item.item_type() {
            ItemType::Image => {
                let Some(sprite) = self.sprites.get(item.id()) else {
                    warn!("image has no sprite");
                    return None;
                };
                self.sprite_texture(sprite).map(Asset::Texture)
            }
            ItemType::Atlas => {
                let file = item
                    .file()
                    .filter(|file| !file.is_empty())
                    .map(|file| file.rsplit(['/', '\\']).next().unwrap_or(file).to_owned())
                    .unwrap_or_else(|| format!("{}.png", item.id()));
                self.backend
                    .load_texture(&self.blob_key(&file))
                    .map(Asset::Texture)
            }
            ItemType::Sound => self
                .backend
                .load_sound(&self.blob_key(item.id()))
                .map(Asset::Sound),
            ItemType::Font => {
                let text = self.descriptor(&format!("{}.fnt", item.id()))?;
                let source = PackageGlyphs {
                    package: self,
                    item,
                };
                Some(Asset::Font(Rc::new(BitmapFont::parse(
                    self.item_url(item),
                    &text,
                    &source,
                ))))
            }
            ItemType::MovieClip => {
                let root = self.tree(&format!("{}.xml", item.id()))?;
                Some(Asset::MovieClip(MovieClip::from_tree(&root, |index| {
                    self.sprites
                        .frame(item.id(), index)
                        .and_then(|sprite| self.sprite_texture(sprite))
                })))
            }
            ItemType::Component => self
                .tree(&format!("{}.xml", item.id()))
                .map(Asset::Component),
            ItemType::Misc => self
                .backend
                .load_bytes(&self.blob_key(item.id()))
                .map(Asset::Blob),
        };

        match &asset {
            Some(asset) => debug!(?asset, "resolved"),
            None => warn!("unable to resolve item"),
        }
        asset
    }

    fn blob_key(&self, sub_key: &str) -> String {
        format!("{}@{sub_key}", self.source_key)
    }

    fn descriptor(&self, file: &str) -> Option<String> {
        let text = self.archive.text(file).map(|text| text.into_owned());
        if text.is_none() {
            warn!(file, "descriptor missing from archive");
        }
        text
    }

    fn tree(&self, file: &str) -> Option<Node> {
        let text = self.descriptor(file)?;
        Node::parse(&text)
            .inspect_err(|e| warn!(file, "unable to parse descriptor: {e}"))
            .ok()
    }

    /// Texture of the atlas item `atlas_id`
    fn atlas_texture(&self, atlas_id: &str) -> Option<&B::Texture> {
        match self.items.get(atlas_id).map(PackageItem::item_type) {
            Some(ItemType::Atlas) => self.get_item_asset(atlas_id)?.as_texture(),
            Some(other) => {
                warn!(atlas_id, %other, "sprite host is not an atlas");
                None
            }
            None => {
                warn!(atlas_id, "sprite host is not in the catalog");
                None
            }
        }
    }

    fn sprite_texture(&self, sprite: &AtlasSprite) -> Option<B::Texture> {
        let atlas = self.atlas_texture(&sprite.atlas)?;
        self.backend.sub_texture(atlas, sprite.rect)
    }

    /// Create the object for the item called `name`
    pub fn create_object<F: ObjectFactory<B>>(
        &self,
        name: &str,
        factory: &F,
        constructor: Option<Constructor<'_, B, F::Object>>,
    ) -> Option<F::Object> {
        let item = self.get_item_by_name(name)?;
        self.create_object2(item, factory, constructor)
    }

    /// Create the object for `item`.
    ///
    /// `constructor` replaces the factory for component items only.
    pub fn create_object2<F: ObjectFactory<B>>(
        &self,
        item: &PackageItem<B>,
        factory: &F,
        constructor: Option<Constructor<'_, B, F::Object>>,
    ) -> Option<F::Object> {
        let mut object = match constructor {
            Some(constructor) if item.item_type() == ItemType::Component => constructor(item),
            _ => factory.new_object(item)?,
        };

        let asset = self.get_item_asset(item.id());
        self.constructing.set(self.constructing.get() + 1);
        factory.construct_from_resource(&mut object, item, asset);
        self.constructing.set(self.constructing.get() - 1);

        Some(object)
    }

    /// Depth of object constructions in progress
    pub fn constructing(&self) -> u32 {
        self.constructing.get()
    }

    /// Release every texture resolved so far. Later asset requests yield `None`.
    #[instrument(skip(self), fields(id = %self.id))]
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }

        let mut released = 0;
        let mut release = |texture: &B::Texture| {
            self.backend.dispose_texture(texture);
            released += 1;
        };

        for asset in self.items.values().filter_map(PackageItem::cached) {
            match asset {
                Asset::Texture(texture) => release(texture),
                Asset::MovieClip(clip) => clip
                    .frames()
                    .iter()
                    .filter_map(|frame| frame.texture.as_ref())
                    .for_each(&mut release),
                Asset::Font(font) => font.owned_textures().for_each(&mut release),
                Asset::Sound(_) | Asset::Component(_) | Asset::Blob(_) => {}
            }
        }

        debug!(released, "disposed package");
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }
}

/// Glyph textures of one font item, drawn from its package
struct PackageGlyphs<'a, B: Backend> {
    package: &'a Package<B>,
    item: &'a PackageItem<B>,
}

impl<B: Backend> GlyphSource for PackageGlyphs<'_, B> {
    type Texture = B::Texture;

    fn outline_atlas(&self) -> Option<OutlineAtlas<B::Texture>> {
        let sprite = self.package.sprites.get(self.item.id())?;
        Some(OutlineAtlas {
            offset_x: sprite.rect.x,
            offset_y: sprite.rect.y,
            texture: self.package.atlas_texture(&sprite.atlas).cloned(),
        })
    }

    fn glyph_image(&self, item_id: &str) -> Option<GlyphImage<B::Texture>> {
        let image = self.package.items.get(item_id)?;
        if image.item_type() != ItemType::Image {
            warn!(item_id, kind = %image.item_type(), "glyph image is not an image item");
            return None;
        }

        Some(GlyphImage {
            width: image.width(),
            height: image.height(),
            texture: self
                .package
                .get_item_asset(item_id)
                .and_then(Asset::as_texture)
                .cloned(),
        })
    }

    fn sub_texture(&self, source: &B::Texture, region: Rect) -> Option<B::Texture> {
        self.package.backend.sub_texture(source, region)
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use uipack_archive::PackageArchive;

    use crate::backend::FileBackend;
    use crate::error::{Error, Result};
    use crate::package::{LoadOptions, Package};
    use crate::types::Rect;

    fn record(name: &str, payload: &str) -> String {
        format!("{name}|{}|{payload}", payload.len())
    }

    fn archive(records: &[(&str, &str)]) -> Result<PackageArchive> {
        let data: String = records.iter().map(|(n, p)| record(n, p)).collect();
        Ok(PackageArchive::from_decompressed(data.into_bytes())?)
    }

    const MANIFEST: &str = r#"<packageDescription id="abcd1234" name="Basics">
  <resources>
    <atlas id="atlas0" file="img/atlas0.png"/>
    <image id="n1" name="button" size="40,32"/>
    <image id="n2" name="button"/>
    <image id="n3" name="orphan"/>
    <image id="n4" name="hosted_by_image"/>
    <component id="n5" name="Main"/>
    <component id="n6" name="Broken"/>
  </resources>
</packageDescription>"#;

    fn package() -> Result<Package<FileBackend>> {
        let archive = archive(&[
            ("sprites.bytes", "header\nn1 0 2 4 40 32\nn2 0 50 0 8 8\nn4 -1 0 0 1 1\n"),
            ("package.xml", MANIFEST),
            ("n5.xml", r#"<component size="800,600"><displayList/></component>"#),
            ("n6.xml", "<component>"),
        ])?;
        Package::from_archive("basics", archive, Rc::new(FileBackend::new("/nonexistent")))
    }

    #[test]
    fn catalog_lookups() -> Result<()> {
        let package = package()?;
        assert_eq!(package.id(), "abcd1234");
        assert_eq!(package.name(), "Basics");
        assert_eq!(package.source_key(), "basics");
        assert_eq!(package.custom_id(), None);
        assert_eq!(package.items().count(), 7);

        // later names win
        assert_eq!(package.get_item_by_name("button").map(|i| i.id()), Some("n2"));
        assert_eq!(
            package.sprite("n1").map(|s| (s.atlas.as_str(), s.rect)),
            Some(("atlas0", Rect::new(2, 4, 40, 32)))
        );
        assert_eq!(
            package.get_item("n1").map(|item| package.item_url(item)),
            Some("ui://abcd1234n1".to_owned())
        );
        assert!(package.archive().get("n5.xml").is_some());

        Ok(())
    }

    #[test]
    fn missing_atlas_blob_yields_none_once() -> Result<()> {
        let package = package()?;
        assert!(package.get_item_asset("n1").is_none());
        assert!(package.get_item("n1").is_some_and(|item| item.is_decoded()));
        assert!(package.get_item("atlas0").is_some_and(|item| item.is_decoded()));
        assert!(package.get_item_asset("n1").is_none());
        Ok(())
    }

    #[test]
    fn unresolvable_images() -> Result<()> {
        let package = package()?;
        assert!(package.get_item_asset("n3").is_none());
        assert!(package.get_item_asset("n4").is_none());
        assert!(package.get_item_asset("missing").is_none());
        Ok(())
    }

    #[test]
    fn components_parse_their_descriptor() -> Result<()> {
        let package = package()?;

        let tag = package
            .get_item_asset_by_name("Main")?
            .and_then(|asset| asset.as_component())
            .map(|node| node.tag().to_owned());
        assert_eq!(tag.as_deref(), Some("component"));

        assert!(package.get_item_asset_by_name("Broken")?.is_none());
        assert!(matches!(
            package.get_item_asset_by_name("Nope"),
            Err(Error::ResourceNotFound(name)) if name == "Nope"
        ));

        Ok(())
    }

    #[test]
    fn dispose_hides_assets() -> Result<()> {
        let package = package()?;
        assert!(package.get_item_asset("n5").is_some());

        package.dispose();
        assert!(package.is_disposed());
        assert!(package.get_item_asset("n5").is_none());

        package.dispose();
        Ok(())
    }

    #[test]
    fn manifest_is_required() -> Result<()> {
        let result = Package::from_archive(
            "basics",
            archive(&[("sprites.bytes", "header\n")])?,
            Rc::new(FileBackend::new("/nonexistent")),
        );
        assert!(matches!(result, Err(Error::MissingFile(file)) if file == "package.xml"));
        Ok(())
    }

    #[test]
    fn unknown_source_key() {
        let result = Package::load(
            "nowhere",
            Rc::new(FileBackend::new("/nonexistent")),
            &LoadOptions::default(),
        );
        assert!(matches!(result, Err(Error::PackageNotFound(key)) if key == "nowhere"));
    }
}
