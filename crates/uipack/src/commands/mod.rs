use std::{
    fs::File,
    path::{Path, PathBuf},
    rc::Rc,
};

use clap::{Args, ValueEnum};
use miette::{miette, Context, IntoDiagnostic, Result};
use uipack_archive::{CompressionMethod, PackageArchive};
use uipack_package::{FileBackend, LoadOptions, Package, Registry, PACKAGE_EXTENSION};

pub mod check;
pub mod extract;
pub mod fonts;
pub mod items;
pub mod list;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// List the virtual files of a package archive
    List(list::ListArgs),
    /// Extract the virtual files of a package archive into a directory
    Extract(extract::ExtractArgs),
    /// Show the item catalog of a package
    Items(items::ItemsArgs),
    /// Show the bitmap fonts of a package
    Fonts(fonts::FontsArgs),
    /// Load every package below a directory and resolve all of its items
    Check(check::CheckArgs),
}

impl Commands {
    pub fn handle(&self) -> Result<()> {
        match self {
            Commands::List(list) => list.handle(),
            Commands::Extract(extract) => extract.handle(),
            Commands::Items(items) => items.handle(),
            Commands::Fonts(fonts) => fonts.handle(),
            Commands::Check(check) => check.handle(),
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Compression {
    None,
    #[default]
    Deflate,
    Zlib,
}

impl From<Compression> for CompressionMethod {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => CompressionMethod::None,
            Compression::Deflate => CompressionMethod::Deflate,
            Compression::Zlib => CompressionMethod::Zlib,
        }
    }
}

/// A package archive on disk
#[derive(Args)]
pub struct PackageFile {
    /// An input package file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// How the archive blob is compressed
    #[arg(long, value_enum, default_value_t)]
    compression: Compression,
}

impl PackageFile {
    /// Decode the archive without building a package
    pub fn archive(&self) -> Result<PackageArchive> {
        let f = File::open(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", self.file.display()))?;
        Ok(PackageArchive::from_reader(f, self.compression.into())?)
    }

    /// Load the package into a fresh registry rooted at its directory
    pub fn load(&self) -> Result<(Registry<FileBackend>, Rc<Package<FileBackend>>)> {
        load_package(&self.file, self.compression.into())
    }
}

/// Blob root and source key of a package file.
///
/// The `.fui` extension is left out of the key so sibling blobs are found as
/// `<name>@<file>`.
pub fn source_key(path: &Path) -> Result<(PathBuf, String)> {
    let root = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let name = if path.extension().is_some_and(|ext| ext == PACKAGE_EXTENSION) {
        path.file_stem()
    } else {
        path.file_name()
    };
    let key = name
        .and_then(|name| name.to_str())
        .ok_or(miette!("unable to derive a package key from {}", path.display()))?;

    Ok((root, key.to_owned()))
}

pub fn load_package(
    path: &Path,
    compression: CompressionMethod,
) -> Result<(Registry<FileBackend>, Rc<Package<FileBackend>>)> {
    let (root, key) = source_key(path)?;
    let mut registry = Registry::with_options(
        FileBackend::new(root),
        LoadOptions::builder().compression(compression).build(),
    );
    let package = registry
        .add_package(&key)
        .context(format!("loading {}", path.display()))?;
    Ok((registry, package))
}

#[cfg(test)]
mod test {
    use std::path::{Path, PathBuf};

    use crate::commands::source_key;

    #[test]
    fn package_keys_drop_the_extension() -> miette::Result<()> {
        let (root, key) = source_key(Path::new("assets/ui/Basics.fui"))?;
        assert_eq!(root, PathBuf::from("assets/ui"));
        assert_eq!(key, "Basics");

        let (root, key) = source_key(Path::new("Basics.bin"))?;
        assert_eq!(root, PathBuf::new());
        assert_eq!(key, "Basics.bin");

        Ok(())
    }
}
