//! Resource manifest (`package.xml`).
//!
//! ```xml
//! <packageDescription id="abcd1234" name="Basics">
//!   <resources>
//!     <image id="n1" name="button.png" size="40,32" scale="9grid" scale9grid="4,4,32,24"/>
//!     <atlas id="atlas0" size="256,256" file="atlas0.png"/>
//!     <component id="n2" name="Main" size="800,600"/>
//!   </resources>
//! </packageDescription>
//! ```

use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::item::ItemInfo;
use crate::tree::Node;
use crate::types::{parse_ints, ImageOptions, ItemType, Rect, ScaleMode};

/// Identity and catalog of a package, in manifest order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    pub id: String,
    pub name: String,
    pub items: Vec<ItemInfo>,
}

impl Manifest {
    #[instrument(skip(text), err)]
    pub fn parse(text: &str) -> Result<Manifest> {
        Self::from_tree(&Node::parse(text)?)
    }

    pub fn from_tree(root: &Node) -> Result<Manifest> {
        let required = |key: &str| {
            root.attribute(key)
                .map(str::to_owned)
                .ok_or_else(|| Error::InvalidManifest(format!("package has no {key}")))
        };
        let id = required("id")?;
        let name = required("name")?;

        let resources = root
            .first_child()
            .ok_or_else(|| Error::InvalidManifest("missing resources element".into()))?;

        let items = resources
            .children()
            .iter()
            .map(parse_item)
            .collect::<Result<Vec<_>>>()?;

        debug!(%id, %name, items = items.len(), "parsed manifest");
        Ok(Manifest { id, name, items })
    }
}

fn parse_item(node: &Node) -> Result<ItemInfo> {
    let item_type = ItemType::from_tag(node.tag()).unwrap_or_else(|| {
        debug!(tag = node.tag(), "unknown resource type, treating as misc");
        ItemType::Misc
    });

    let id = node
        .attribute("id")
        .ok_or_else(|| Error::InvalidManifest(format!("<{}> resource has no id", node.tag())))?;

    let [width, height] = node
        .attribute("size")
        .map(parse_ints::<2>)
        .unwrap_or_default();

    let image = (item_type == ItemType::Image).then(|| parse_image_options(node));

    Ok(ItemInfo {
        id: id.to_owned(),
        name: node.attribute("name").map(str::to_owned),
        item_type,
        file: node.attribute("file").map(str::to_owned),
        width,
        height,
        image,
    })
}

fn parse_image_options(node: &Node) -> ImageOptions {
    let scale = match node.attribute("scale") {
        Some("9grid") => {
            let [x, y, width, height] = node
                .attribute("scale9grid")
                .map(parse_ints::<4>)
                .unwrap_or_default();
            ScaleMode::NineGrid(Rect::new(x, y, width, height))
        }
        Some("tile") => ScaleMode::Tile,
        _ => ScaleMode::None,
    };

    ImageOptions {
        scale,
        smoothing: node.attribute("smoothing") != Some("false"),
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::manifest::Manifest;
    use crate::types::{ImageOptions, ItemType, Rect, ScaleMode};

    #[test]
    fn parse_catalog() -> Result<()> {
        let manifest = Manifest::parse(
            r#"<packageDescription id="abcd1234" name="Basics">
  <resources>
    <image id="n1" name="grid" size="40,32" scale="9grid" scale9grid="4,4,32,24"/>
    <image id="n2" name="tiled" scale="tile" smoothing="false"/>
    <image id="n3" scale="9grid"/>
    <atlas id="atlas0" size="256,256" file="atlas0.png"/>
    <component id="n4" name="Main" size="800,abc"/>
    <swf id="n5" name="legacy"/>
  </resources>
</packageDescription>"#,
        )?;

        assert_eq!(manifest.id, "abcd1234");
        assert_eq!(manifest.name, "Basics");
        assert_eq!(manifest.items.len(), 6);

        let grid = &manifest.items[0];
        assert_eq!(grid.item_type, ItemType::Image);
        assert_eq!((grid.width, grid.height), (40, 32));
        assert_eq!(
            grid.image,
            Some(ImageOptions {
                scale: ScaleMode::NineGrid(Rect::new(4, 4, 32, 24)),
                smoothing: true,
            })
        );

        assert_eq!(
            manifest.items[1].image,
            Some(ImageOptions {
                scale: ScaleMode::Tile,
                smoothing: false,
            })
        );
        assert_eq!(
            manifest.items[2].image.map(|i| i.scale),
            Some(ScaleMode::NineGrid(Rect::default()))
        );
        assert_eq!(manifest.items[2].name, None);

        let atlas = &manifest.items[3];
        assert_eq!(atlas.item_type, ItemType::Atlas);
        assert_eq!(atlas.file.as_deref(), Some("atlas0.png"));
        assert_eq!(atlas.image, None);

        assert_eq!((manifest.items[4].width, manifest.items[4].height), (800, 0));
        assert_eq!(manifest.items[5].item_type, ItemType::Misc);

        Ok(())
    }

    #[test]
    fn package_identity_is_required() {
        let result = Manifest::parse(r#"<packageDescription name="x"><resources/></packageDescription>"#);
        assert!(matches!(result, Err(Error::InvalidManifest(_))));
    }

    #[test]
    fn resource_id_is_required() {
        let result = Manifest::parse(
            r#"<packageDescription id="abcd1234" name="x"><resources><image name="a"/></resources></packageDescription>"#,
        );
        assert!(matches!(result, Err(Error::InvalidManifest(_))));
    }

    #[test]
    fn broken_tree_is_fatal() {
        let result = Manifest::parse(r#"<packageDescription id="abcd1234" name="x"><resources>"#);
        assert!(matches!(result, Err(Error::InvalidTree(_))));
    }
}
