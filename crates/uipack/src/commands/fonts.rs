use clap::Args;
use itertools::Itertools;
use miette::Result;
use owo_colors::OwoColorize;

use super::PackageFile;

#[derive(Args)]
pub struct FontsArgs {
    #[command(flatten)]
    package: PackageFile,
}

impl FontsArgs {
    pub fn handle(&self) -> Result<()> {
        let (registry, _package) = self.package.load()?;

        for (url, font) in registry.fonts().iter().sorted_by_key(|(url, _)| *url) {
            let mode = if font.ttf() { "outline" } else { "bitmap" };
            let textured = font
                .glyphs()
                .values()
                .filter(|glyph| glyph.texture.is_some())
                .count();
            println!(
                "{} {:<8} size {:<4} {} glyphs ({} textured){}",
                url.cyan(),
                mode,
                font.size(),
                font.glyphs().len(),
                textured,
                if font.resizable() { ", resizable" } else { "" }
            );
        }
        Ok(())
    }
}
