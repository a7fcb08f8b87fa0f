//! Attributed tree documents.
//!
//! Manifests, component layouts and movie clip frame tables are small XML documents. Only the
//! element structure and the attributes matter, so text content, comments, CDATA sections and
//! processing instructions are parsed and dropped.

use indexmap::IndexMap;
use winnow::ascii::{multispace0, multispace1};
use winnow::combinator::{alt, delimited, opt, preceded, repeat};
use winnow::token::{literal, take_till, take_until, take_while};
use winnow::{PResult, Parser};

use crate::error::{Error, Result};

/// One element of a tree document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    tag: String,
    attributes: IndexMap<String, String>,
    children: Vec<Node>,
}

impl Node {
    /// Parse a whole document, returning its root element.
    pub fn parse(text: &str) -> Result<Node> {
        document
            .parse(text)
            .map_err(|e| Error::InvalidTree(e.to_string()))
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attributes in document order
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.children.first()
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.')
}

fn name<'s>(input: &mut &'s str) -> PResult<&'s str> {
    take_while(1.., is_name_char).parse_next(input)
}

fn comment(input: &mut &str) -> PResult<()> {
    ("<!--", take_until(0.., "-->"), "-->")
        .void()
        .parse_next(input)
}

fn cdata(input: &mut &str) -> PResult<()> {
    ("<![CDATA[", take_until(0.., "]]>"), "]]>")
        .void()
        .parse_next(input)
}

fn instruction(input: &mut &str) -> PResult<()> {
    ("<?", take_until(0.., "?>"), "?>").void().parse_next(input)
}

fn text(input: &mut &str) -> PResult<()> {
    take_while(1.., |c: char| c != '<').void().parse_next(input)
}

/// Anything between elements that carries no structure
fn misc(input: &mut &str) -> PResult<()> {
    repeat(0.., alt((comment, cdata, instruction, text))).parse_next(input)
}

/// The character an entity body (the text between `&` and `;`) stands for
fn entity(body: &str) -> Option<char> {
    match body {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "amp" => Some('&'),
        _ => {
            let number = body.strip_prefix('#')?;
            let (digits, radix) = match number.strip_prefix(['x', 'X']) {
                Some(hex) => (hex, 16),
                None => (number, 10),
            };
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return None;
            }
            u32::from_str_radix(digits, radix)
                .ok()
                .and_then(char::from_u32)
        }
    }
}

/// Decode entity and character references in one pass. Unknown ones are kept verbatim.
fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_owned();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        let decoded = rest
            .find(';')
            .and_then(|end| entity(&rest[1..end]).map(|c| (c, end)));
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn quoted<'s>(input: &mut &'s str) -> PResult<&'s str> {
    alt((
        delimited('"', take_till(0.., '"'), '"'),
        delimited('\'', take_till(0.., '\''), '\''),
    ))
    .parse_next(input)
}

fn attribute(input: &mut &str) -> PResult<(String, String)> {
    let key = name.parse_next(input)?;
    (multispace0, '=', multispace0).parse_next(input)?;
    let value = quoted.parse_next(input)?;
    Ok((key.to_owned(), unescape(value)))
}

fn element(input: &mut &str) -> PResult<Node> {
    '<'.parse_next(input)?;
    let tag = name.parse_next(input)?;
    let attributes: Vec<(String, String)> =
        repeat(0.., preceded(multispace1, attribute)).parse_next(input)?;
    multispace0.parse_next(input)?;

    let mut node = Node {
        tag: tag.to_owned(),
        attributes: attributes.into_iter().collect(),
        children: Vec::new(),
    };

    if opt("/>").parse_next(input)?.is_some() {
        return Ok(node);
    }
    '>'.parse_next(input)?;

    loop {
        misc.parse_next(input)?;
        if input.starts_with("</") {
            break;
        }
        node.children.push(element.parse_next(input)?);
    }

    ("</", literal(tag), multispace0, '>').parse_next(input)?;
    Ok(node)
}

fn document(input: &mut &str) -> PResult<Node> {
    opt('\u{feff}').parse_next(input)?;
    misc.parse_next(input)?;
    let root = element.parse_next(input)?;
    misc.parse_next(input)?;
    Ok(root)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::tree::Node;

    #[test]
    fn parse_manifest_shape() -> Result<()> {
        let root = Node::parse(
            r#"<?xml version="1.0" encoding="utf-8"?>
<!-- exported -->
<packageDescription id="abcd1234" name="Basics">
  <resources>
    <image id="n1" name="btn.png" size="40,32" scale="9grid" scale9grid="1,2,3,4"/>
    <component id='n2' name="Main"></component>
  </resources>
</packageDescription>"#,
        )?;

        assert_eq!(root.tag(), "packageDescription");
        assert_eq!(root.attribute("id"), Some("abcd1234"));
        assert_eq!(root.attribute("missing"), None);

        let resources = root.first_child().map(Node::children).unwrap_or_default();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].tag(), "image");
        assert_eq!(resources[0].attribute("scale9grid"), Some("1,2,3,4"));
        assert_eq!(resources[1].attribute("id"), Some("n2"));
        assert!(resources[1].children().is_empty());

        Ok(())
    }

    #[test]
    fn attributes_keep_document_order_and_entities() -> Result<()> {
        let root = Node::parse(r#"<text b="1" a="&lt;b&gt; &amp;amp; &quot;"/>"#)?;
        let keys: Vec<&str> = root.attributes().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(root.attribute("a"), Some("<b> &amp; \""));
        Ok(())
    }

    #[test]
    fn character_references_are_decoded() -> Result<()> {
        let root = Node::parse(
            r#"<text text="a&#xA;b&#10;c&#X41;" bad="&#xD800; &#zz; &#+5; &nbsp; &amp"/>"#,
        )?;
        assert_eq!(root.attribute("text"), Some("a\nb\ncA"));
        assert_eq!(root.attribute("bad"), Some("&#xD800; &#zz; &#+5; &nbsp; &amp"));
        Ok(())
    }

    #[test]
    fn text_and_cdata_are_dropped() -> Result<()> {
        let root = Node::parse("<a>hello<![CDATA[<b/>]]><c/> world</a>")?;
        assert_eq!(root.children().len(), 1);
        assert_eq!(root.children()[0].tag(), "c");
        Ok(())
    }

    #[test]
    fn mismatched_close_is_rejected() {
        assert!(matches!(
            Node::parse("<a><b></a></b>"),
            Err(Error::InvalidTree(_))
        ));
    }

    #[test]
    fn unterminated_document_is_rejected() {
        assert!(matches!(Node::parse("<a><b/>"), Err(Error::InvalidTree(_))));
        assert!(matches!(Node::parse(""), Err(Error::InvalidTree(_))));
        assert!(matches!(
            Node::parse("<a/><b/>"),
            Err(Error::InvalidTree(_))
        ));
    }
}
