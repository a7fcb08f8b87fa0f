//! Registry of loaded packages and their fonts.

use std::{cell::Cell, collections::HashMap, rc::Rc};

use tracing::{debug, info, instrument, warn};

use crate::backend::{Backend, ObjectFactory};
use crate::error::{Error, Result};
use crate::font::BitmapFont;
use crate::item::PackageItem;
use crate::package::{Constructor, LoadOptions, Package, URL_SCHEME};

/// Width of the package id inside an item URL
const PACKAGE_ID_LEN: usize = 8;

/// Packages addressable by id, alias and name, plus every font they define.
///
/// ```no_run
/// use uipack_package::{FileBackend, Registry};
///
/// fn list_items() -> uipack_package::error::Result<()> {
///     let mut registry = Registry::new(FileBackend::new("assets/ui"));
///     let package = registry.add_package("Basics")?;
///
///     for item in package.items() {
///         println!("{} {}", item.item_type(), package.item_url(item));
///     }
///
///     Ok(())
/// }
/// ```
pub struct Registry<B: Backend> {
    backend: Rc<B>,
    options: LoadOptions,
    by_id: HashMap<String, Rc<Package<B>>>,
    by_name: HashMap<String, Rc<Package<B>>>,
    fonts: HashMap<String, Rc<BitmapFont<B::Texture>>>,
    constructing: Rc<Cell<u32>>,
}

impl<B: Backend> Registry<B> {
    pub fn new(backend: B) -> Self {
        Self::with_options(backend, LoadOptions::default())
    }

    pub fn with_options(backend: B, options: LoadOptions) -> Self {
        Self {
            backend: Rc::new(backend),
            options,
            by_id: HashMap::new(),
            by_name: HashMap::new(),
            fonts: HashMap::new(),
            constructing: Rc::new(Cell::new(0)),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load the package stored under `source_key` and register it.
    ///
    /// The package is reachable by its id, by its name, and by `source_key` as its alias.
    #[instrument(skip(self), err)]
    pub fn add_package(&mut self, source_key: &str) -> Result<Rc<Package<B>>> {
        let package = Package::load(source_key, self.backend.clone(), &self.options)?
            .with_constructing(self.constructing.clone());

        let taken = self
            .by_id
            .get(package.id())
            .is_some_and(|bound| bound.id() == package.id());
        if taken {
            package.dispose();
            return Err(Error::DuplicatePackage(package.id().to_owned()));
        }

        let package = Rc::new(package);
        if let Some(other) = self.by_id.insert(package.id().to_owned(), package.clone()) {
            debug!(alias = package.id(), from = other.id(), "id takes over alias");
            other.replace_custom_id(None);
        }
        if let Some(previous) = self
            .by_name
            .insert(package.name().to_owned(), package.clone())
        {
            warn!(name = package.name(), previous = previous.id(), "package name reused");
        }
        if self.bind_alias(&package, Some(source_key)).is_err() {
            warn!(source_key, "source key is the id of another package, not bound as alias");
        }

        for font in package.fonts() {
            self.fonts.insert(font.id().to_owned(), font.clone());
        }

        info!(id = package.id(), name = package.name(), "added package");
        Ok(package)
    }

    /// Dispose the package registered under `id` (or its alias) and drop every binding to it.
    #[instrument(skip(self), err)]
    pub fn remove_package(&mut self, id: &str) -> Result<()> {
        let package = self
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| Error::PackageNotFound(id.to_owned()))?;

        for font in package.fonts() {
            self.fonts.remove(font.id());
        }
        package.dispose();

        self.release_alias(&package);
        self.by_id.remove(package.id());
        if self
            .by_name
            .get(package.name())
            .is_some_and(|named| Rc::ptr_eq(named, &package))
        {
            self.by_name.remove(package.name());
        }

        info!(id = package.id(), "removed package");
        Ok(())
    }

    /// The package registered under `id`, either its own id or its alias
    pub fn get_by_id(&self, id: &str) -> Option<&Rc<Package<B>>> {
        self.by_id.get(id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Rc<Package<B>>> {
        self.by_name.get(name)
    }

    /// Every registered package once
    pub fn packages(&self) -> impl Iterator<Item = &Rc<Package<B>>> {
        self.by_id
            .iter()
            .filter(|(key, package)| key.as_str() == package.id())
            .map(|(_, package)| package)
    }

    /// Rebind the alias of the package registered under `id`.
    ///
    /// An alias equal to another package's id fails with [`Error::DuplicatePackage`]
    /// and changes nothing. An alias held by another package moves over.
    pub fn set_custom_id(&mut self, id: &str, alias: Option<&str>) -> Result<()> {
        let package = self
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| Error::PackageNotFound(id.to_owned()))?;
        self.bind_alias(&package, alias)
    }

    fn release_alias(&mut self, package: &Rc<Package<B>>) {
        let Some(old) = package.replace_custom_id(None) else {
            return;
        };
        let bound_here = self
            .by_id
            .get(&old)
            .is_some_and(|bound| Rc::ptr_eq(bound, package));
        if old != package.id() && bound_here {
            self.by_id.remove(&old);
        }
    }

    fn bind_alias(&mut self, package: &Rc<Package<B>>, alias: Option<&str>) -> Result<()> {
        let Some(alias) = alias else {
            self.release_alias(package);
            return Ok(());
        };

        let holder = self
            .by_id
            .get(alias)
            .filter(|other| !Rc::ptr_eq(*other, package))
            .cloned();
        if holder.as_ref().is_some_and(|other| other.id() == alias) {
            return Err(Error::DuplicatePackage(alias.to_owned()));
        }

        self.release_alias(package);
        if let Some(other) = holder {
            debug!(alias, from = other.id(), "moving alias");
            other.replace_custom_id(None);
        }

        package.replace_custom_id(Some(alias.to_owned()));
        self.by_id.insert(alias.to_owned(), package.clone());
        Ok(())
    }

    /// `"ui://" + package id + item id` of the named resource
    pub fn get_item_url(&self, package_name: &str, resource_name: &str) -> Option<String> {
        let package = self.get_by_name(package_name)?;
        let item = package.get_item_by_name(resource_name)?;
        Some(package.item_url(item))
    }

    fn locate(&self, url: &str) -> Option<(&Rc<Package<B>>, &PackageItem<B>)> {
        let rest = url.strip_prefix(URL_SCHEME)?;
        let package_id = rest.get(..PACKAGE_ID_LEN)?;
        let item_id = rest.get(PACKAGE_ID_LEN..)?;

        let package = self.get_by_id(package_id)?;
        let item = package.get_item(item_id)?;
        Some((package, item))
    }

    /// The item addressed by `url`, `None` if malformed or unknown
    pub fn get_item_by_url(&self, url: &str) -> Option<&PackageItem<B>> {
        self.locate(url).map(|(_, item)| item)
    }

    pub fn get_bitmap_font_by_url(&self, url: &str) -> Option<Rc<BitmapFont<B::Texture>>> {
        self.fonts.get(url).cloned()
    }

    /// Every registered font, keyed by URL
    pub fn fonts(&self) -> &HashMap<String, Rc<BitmapFont<B::Texture>>> {
        &self.fonts
    }

    pub fn create_object<F: ObjectFactory<B>>(
        &self,
        package_name: &str,
        resource_name: &str,
        factory: &F,
        constructor: Option<Constructor<'_, B, F::Object>>,
    ) -> Option<F::Object> {
        self.get_by_name(package_name)?
            .create_object(resource_name, factory, constructor)
    }

    pub fn create_object_from_url<F: ObjectFactory<B>>(
        &self,
        url: &str,
        factory: &F,
        constructor: Option<Constructor<'_, B, F::Object>>,
    ) -> Option<F::Object> {
        let (package, item) = self.locate(url)?;
        package.create_object2(item, factory, constructor)
    }

    /// Depth of object constructions in progress across all packages
    pub fn constructing(&self) -> u32 {
        self.constructing.get()
    }
}
