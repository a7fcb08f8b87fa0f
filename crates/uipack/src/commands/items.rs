use clap::Args;
use itertools::Itertools;
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use uipack_package::{ItemInfo, ItemType, ScaleMode};

use super::PackageFile;

#[derive(Args)]
pub struct ItemsArgs {
    #[command(flatten)]
    package: PackageFile,

    /// Print the catalog as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn describe_scale(info: &ItemInfo) -> String {
    match info.image.map(|image| image.scale) {
        Some(ScaleMode::NineGrid(grid)) => format!(
            "9grid({},{},{},{})",
            grid.x, grid.y, grid.width, grid.height
        ),
        Some(ScaleMode::Tile) => "tile".to_owned(),
        _ => String::new(),
    }
}

impl ItemsArgs {
    pub fn handle(&self) -> Result<()> {
        let (_registry, package) = self.package.load()?;

        if self.json {
            let infos = package.items().map(|item| item.info()).collect::<Vec<_>>();
            println!("{}", serde_json::to_string_pretty(&infos).into_diagnostic()?);
            return Ok(());
        }

        println!(
            "{} {} ({})",
            package.name().bold(),
            package.id().dimmed(),
            package.source_key()
        );

        for item in package
            .items()
            .sorted_by_key(|item| item.item_type().to_string())
        {
            let kind = match item.item_type() {
                ItemType::Component => item.item_type().green().to_string(),
                ItemType::Image | ItemType::Atlas => item.item_type().cyan().to_string(),
                _ => item.item_type().yellow().to_string(),
            };
            println!(
                "{:<12} {:<20} {:<24} {:>5}x{:<5} {}",
                item.id(),
                kind,
                item.name().unwrap_or("-"),
                item.width(),
                item.height(),
                describe_scale(item.info()),
            );
        }
        Ok(())
    }
}
