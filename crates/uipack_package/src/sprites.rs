//! Sprite index (`sprites.bytes`).
//!
//! The first line names the columns and is skipped. Every other line describes one packed sprite:
//!
//! | Column | Description                                                    |
//! |--------|----------------------------------------------------------------|
//! | 0      | Item id, or `itemId_frameIndex` for movie clip frames          |
//! | 1      | Atlas bin index, `-1` when the sprite has an atlas of its own  |
//! | 2-5    | `x y width height` inside the atlas                            |
//! | 6      | `1` when the sprite is stored rotated                          |

use std::collections::HashMap;

use tracing::debug;

use crate::types::Rect;

/// Where a sprite lives inside its host atlas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasSprite {
    /// Catalog id of the host atlas item
    pub atlas: String,
    pub rect: Rect,
    pub rotated: bool,
}

/// All sprites of a package, keyed by item id
#[derive(Debug, Clone, Default)]
pub struct SpriteIndex {
    sprites: HashMap<String, AtlasSprite>,
}

/// Derive the catalog id of the atlas holding `item_id`.
pub fn atlas_name(item_id: &str, bin_index: Option<i32>) -> String {
    match bin_index {
        Some(index) if index >= 0 => format!("atlas{index}"),
        _ => {
            let prefix = item_id.split('_').next().unwrap_or(item_id);
            format!("atlas_{prefix}")
        }
    }
}

impl SpriteIndex {
    /// Parse the sprite index text. Malformed numbers become 0.
    pub fn parse(text: &str) -> SpriteIndex {
        let mut sprites = HashMap::new();

        for line in text.split('\n').skip(1) {
            let mut fields = line.trim_end_matches('\r').split(' ');
            let Some(item_id) = fields.next().filter(|id| !id.is_empty()) else {
                continue;
            };

            let bin_index = fields.next().and_then(|s| s.parse().ok());
            let mut number = || -> i32 {
                fields
                    .next()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default()
            };
            let rect = Rect::new(number(), number(), number(), number());
            let rotated = fields.next() == Some("1");

            sprites.insert(
                item_id.to_owned(),
                AtlasSprite {
                    atlas: atlas_name(item_id, bin_index),
                    rect,
                    rotated,
                },
            );
        }

        debug!(count = sprites.len(), "parsed sprite index");
        SpriteIndex { sprites }
    }

    pub fn get(&self, key: &str) -> Option<&AtlasSprite> {
        self.sprites.get(key)
    }

    /// Sprite of frame `index` of movie clip `item_id`
    pub fn frame(&self, item_id: &str, index: usize) -> Option<&AtlasSprite> {
        self.sprites.get(&format!("{item_id}_{index}"))
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::sprites::{atlas_name, AtlasSprite, SpriteIndex};
    use crate::types::Rect;

    #[test]
    fn atlas_names() {
        assert_eq!(atlas_name("abc_12", Some(-1)), "atlas_abc");
        assert_eq!(atlas_name("abc_12", Some(3)), "atlas3");
        assert_eq!(atlas_name("xyz", Some(3)), "atlas3");
        assert_eq!(atlas_name("xyz", Some(-1)), "atlas_xyz");
        assert_eq!(atlas_name("a_b_c", None), "atlas_a");
    }

    #[test]
    fn parse_index() {
        let index = SpriteIndex::parse(
            "//FairyGUI atlas sprites.\r\nn1 0 2 4 32 16 0\r\n\nn3_0 -1 0 0 8 8 1\nn3_1 -1 8 0 8 8 1\n",
        );

        assert_eq!(index.len(), 3);
        assert_eq!(
            index.get("n1"),
            Some(&AtlasSprite {
                atlas: "atlas0".into(),
                rect: Rect::new(2, 4, 32, 16),
                rotated: false,
            })
        );

        let frame = index.frame("n3", 1).map(|s| (s.atlas.as_str(), s.rect, s.rotated));
        assert_eq!(frame, Some(("atlas_n3", Rect::new(8, 0, 8, 8), true)));
        assert!(index.frame("n3", 2).is_none());
    }

    #[test]
    fn header_only_index_is_empty() {
        assert!(SpriteIndex::parse("id bin x y w h rotated").is_empty());
        assert!(SpriteIndex::parse("").is_empty());
    }

    #[test]
    fn malformed_numbers_default_to_zero() {
        let index = SpriteIndex::parse("header\nn9 x a b 10\n");
        let sprite = index.get("n9").cloned();
        assert_eq!(
            sprite,
            Some(AtlasSprite {
                atlas: "atlas_n9".into(),
                rect: Rect::new(0, 0, 10, 0),
                rotated: false,
            })
        );
    }
}
