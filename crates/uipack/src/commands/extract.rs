use clap::Args;
use miette::{miette, Context, IntoDiagnostic, Result};
use std::{
    fs::File,
    io::Write,
    path::{Component, Path, PathBuf},
};
use tracing::{info, warn};

use super::PackageFile;

#[derive(Args)]
pub struct ExtractArgs {
    #[command(flatten)]
    package: PackageFile,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

/// Entry names that stay inside the target directory
fn enclosed(name: &str) -> Option<&Path> {
    let path = Path::new(name);
    path.components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then_some(path)
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let archive = self.package.archive()?;

        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            let Some(name) = enclosed(file.name()) else {
                warn!("skipping {}, it escapes the target directory", file.name());
                continue;
            };

            let p = self.directory.join(name);
            info!("writing {}", p.display());

            let parent = p
                .parent()
                .ok_or(miette!("{} has no parent directory", p.display()))?;
            std::fs::create_dir_all(parent)
                .into_diagnostic()
                .context(format!("creating {}", parent.display()))?;

            let mut out = if !self.overwrite {
                File::create_new(&p)
                    .into_diagnostic()
                    .context(format!("creating {}", &p.display()))?
            } else {
                File::create(&p)
                    .into_diagnostic()
                    .context(format!("creating {}", &p.display()))?
            };

            out.write_all(file.data()).into_diagnostic()?;
        }
        Ok(())
    }
}
