use clap::Args;
use miette::{miette, Result};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing::{error, info};
use uipack_package::PACKAGE_EXTENSION;
use walkdir::WalkDir;

use super::{load_package, Compression};

#[derive(Args)]
pub struct CheckArgs {
    /// A directory to search for packages
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// How the archive blobs are compressed
    #[arg(long, value_enum, default_value_t)]
    compression: Compression,
}

impl CheckArgs {
    pub fn handle(&self) -> Result<()> {
        let files = WalkDir::new(&self.directory)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .is_some_and(|ext| ext == PACKAGE_EXTENSION)
            })
            .collect::<Vec<_>>();

        if files.is_empty() {
            return Err(miette!("no packages found in {}", self.directory.display()));
        }

        let mut failed = 0;
        for file in &files {
            let (_registry, package) = match load_package(file.path(), self.compression.into()) {
                Ok(loaded) => loaded,
                Err(e) => {
                    error!("{e:?}");
                    println!("{} {}", "FAIL".red(), file.path().display());
                    failed += 1;
                    continue;
                }
            };

            let unresolved = package
                .items()
                .filter(|item| package.get_item_asset(item.id()).is_none())
                .map(|item| item.id().to_owned())
                .collect::<Vec<_>>();

            if unresolved.is_empty() {
                println!("{} {}", "ok".green(), file.path().display());
            } else {
                println!(
                    "{} {} ({} unresolved: {})",
                    "WARN".yellow(),
                    file.path().display(),
                    unresolved.len(),
                    unresolved.join(", ")
                );
            }
            info!(id = package.id(), items = package.items().count(), "checked");
        }

        if failed > 0 {
            return Err(miette!("{failed} of {} packages failed to load", files.len()));
        }
        Ok(())
    }
}
