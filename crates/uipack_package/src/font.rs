//! Bitmap font descriptors (`<itemId>.fnt`).
//!
//! The descriptor is line oriented. The first token of a line names the record and the rest are
//! `key=value` pairs:
//!
//! ```text
//! info face="Arial" size=24 resizable=true
//! common lineHeight=28 xadvance=0
//! char id=65 x=0 y=0 width=14 height=18 xoffset=1 yoffset=4 xadvance=15 chnl=15
//! char id=66 img=n12 xoffset=0 yoffset=0 xadvance=0
//! ```
//!
//! A font is either an outline font rendered into the package atlas (`info` carries a `face`),
//! or a pre-rasterized font where each glyph points at an image item through `img`.
//!
//! Pairs accumulate into one working map that is never cleared, so a line sees every key set by
//! the lines before it unless it overrides them. Descriptors in the wild rely on this, for
//! example a `chnl` given once applies to every later glyph.

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::types::Rect;

/// Kind of a descriptor line
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Record {
    Info,
    Common,
    Char,
    Other,
}

impl Record {
    fn from_token(token: &str) -> Record {
        match token {
            "info" => Record::Info,
            "common" => Record::Common,
            "char" => Record::Char,
            _ => Record::Other,
        }
    }
}

/// One character of a bitmap font
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glyph<T> {
    pub x: i32,
    pub y: i32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub width: i32,
    pub height: i32,
    pub advance: i32,
    pub line_height: i32,
    /// Color channel ordinal used by the renderer, 0 when the descriptor gives none
    pub channel: u8,
    pub texture: Option<T>,
}

/// Glyph table with the font-wide metrics
#[derive(Debug, Clone)]
pub struct BitmapFont<T> {
    id: String,
    ttf: bool,
    resizable: bool,
    size: i32,
    glyphs: HashMap<char, Glyph<T>>,
}

/// Atlas region an outline font was rendered into
#[derive(Debug, Clone)]
pub struct OutlineAtlas<T> {
    pub offset_x: i32,
    pub offset_y: i32,
    /// Host atlas texture, if it could be resolved
    pub texture: Option<T>,
}

/// Image item backing a pre-rasterized glyph
#[derive(Debug, Clone)]
pub struct GlyphImage<T> {
    pub width: i32,
    pub height: i32,
    pub texture: Option<T>,
}

/// Where glyph textures come from while a descriptor is parsed
pub trait GlyphSource {
    type Texture: Clone;

    /// Atlas placement of the font item itself, for outline fonts
    fn outline_atlas(&self) -> Option<OutlineAtlas<Self::Texture>>;

    /// The image item `item_id`, resolved
    fn glyph_image(&self, item_id: &str) -> Option<GlyphImage<Self::Texture>>;

    fn sub_texture(&self, source: &Self::Texture, region: Rect) -> Option<Self::Texture>;
}

/// Integer value of a descriptor field.
///
/// Reads an optional sign and the leading digits, ignoring whatever follows,
/// so `12.7` is 12 and `1e3` is 1. Out of range values saturate.
fn int(value: &str) -> Option<i32> {
    let value = value.trim();
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let magnitude = digits[..end]
        .bytes()
        .fold(0i64, |acc, d| (acc * 10 + i64::from(d - b'0')).min(1 << 32));
    let signed = if negative { -magnitude } else { magnitude };
    Some(signed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}

/// Map the descriptor's channel mask onto the renderer's channel ordinal
pub fn remap_channel(chnl: i32) -> u8 {
    match chnl {
        15 => 4,
        1 => 3,
        2 => 2,
        _ => 1,
    }
}

impl<T: Clone> BitmapFont<T> {
    /// Parse a font descriptor. Malformed numbers count as 0.
    #[instrument(skip(text, source))]
    pub fn parse<S>(id: String, text: &str, source: &S) -> BitmapFont<T>
    where
        S: GlyphSource<Texture = T>,
    {
        let mut kv: HashMap<&str, &str> = HashMap::new();
        let mut ttf = false;
        let mut resizable = false;
        let mut size = 0;
        let mut xadvance = 0;
        let mut atlas: Option<OutlineAtlas<T>> = None;
        let mut glyphs = HashMap::new();
        let mut last_height = None;

        for line in text.split('\n') {
            let mut tokens = line.split_whitespace();
            let Some(kind) = tokens.next() else {
                continue;
            };

            for token in tokens {
                let mut pair = token.split('=');
                let key = pair.next().unwrap_or_default();
                match pair.next() {
                    Some(value) => kv.insert(key, value),
                    None => kv.remove(key),
                };
            }

            let num = |key: &str| kv.get(key).copied().and_then(int);

            match Record::from_token(kind) {
                Record::Info => {
                    ttf = kv.contains_key("face");
                    if let Some(value) = num("size") {
                        size = value;
                    }
                    resizable = kv.get("resizable") == Some(&"true");
                    if ttf {
                        atlas = source.outline_atlas();
                    }
                }
                Record::Common => {
                    if size == 0 {
                        if let Some(value) = num("lineHeight") {
                            size = value;
                        }
                    }
                    if let Some(value) = num("xadvance") {
                        xadvance = value;
                    }
                }
                Record::Char => {
                    let field = |key: &str| num(key).unwrap_or_default();
                    let mut glyph = Glyph {
                        x: field("x"),
                        y: field("y"),
                        offset_x: field("xoffset"),
                        offset_y: field("yoffset"),
                        width: field("width"),
                        height: field("height"),
                        advance: field("xadvance"),
                        line_height: 0,
                        channel: kv
                            .get("chnl")
                            .map(|c| remap_channel(int(c).unwrap_or_default()))
                            .unwrap_or_default(),
                        texture: None,
                    };

                    if !ttf {
                        if let Some(image) = kv.get("img").and_then(|img| source.glyph_image(img)) {
                            glyph.width = image.width;
                            glyph.height = image.height;
                            glyph.texture = image.texture;
                        }
                    } else if let Some(OutlineAtlas {
                        offset_x,
                        offset_y,
                        texture: Some(texture),
                    }) = &atlas
                    {
                        let region = Rect::new(glyph.x, glyph.y, glyph.width, glyph.height)
                            .offset(*offset_x, *offset_y);
                        glyph.texture = source.sub_texture(texture, region);
                    }

                    if ttf {
                        glyph.line_height = size;
                    } else {
                        if glyph.advance == 0 {
                            glyph.advance = if xadvance == 0 {
                                glyph.offset_x.saturating_add(glyph.width)
                            } else {
                                xadvance
                            };
                        }

                        glyph.line_height = if glyph.offset_y < 0 {
                            glyph.height
                        } else {
                            glyph.offset_y.saturating_add(glyph.height)
                        }
                        .max(size);
                    }

                    last_height = Some(glyph.height);

                    let code = field("id");
                    match char::from_u32(code as u32) {
                        Some(ch) => {
                            glyphs.insert(ch, glyph);
                        }
                        None => warn!(code, "glyph id is not a character, skipping"),
                    }
                }
                Record::Other => {}
            }
        }

        if size == 0 {
            if let Some(height) = last_height {
                size = height;
            }
        }

        debug!(ttf, size, glyphs = glyphs.len(), "parsed bitmap font");
        BitmapFont {
            id,
            ttf,
            resizable,
            size,
            glyphs,
        }
    }
}

impl<T> BitmapFont<T> {
    /// Font URL, `ui://` followed by package id and item id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether glyphs were rendered from an outline font
    pub fn ttf(&self) -> bool {
        self.ttf
    }

    pub fn resizable(&self) -> bool {
        self.resizable
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn glyph(&self, ch: char) -> Option<&Glyph<T>> {
        self.glyphs.get(&ch)
    }

    pub fn glyphs(&self) -> &HashMap<char, Glyph<T>> {
        &self.glyphs
    }

    /// Textures this font derived itself and has to release
    pub(crate) fn owned_textures(&self) -> impl Iterator<Item = &T> {
        self.glyphs
            .values()
            .filter(|_| self.ttf)
            .filter_map(|glyph| glyph.texture.as_ref())
    }
}
