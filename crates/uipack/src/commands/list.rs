use clap::Args;
use miette::Result;
use owo_colors::OwoColorize;

use super::PackageFile;

#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    package: PackageFile,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let archive = self.package.archive()?;

        let mut total = 0;
        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            total += file.size();
            println!("{:>10} {:>10}  {}", file.offset(), file.size(), file.name().cyan());
        }

        println!(
            "{} files, {} bytes of payload in {} bytes",
            archive.len().bold(),
            total.bold(),
            archive.decompressed_size()
        );
        Ok(())
    }
}
