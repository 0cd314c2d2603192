use std::collections::HashSet;

use roxmltree::{Document, Node};

use crate::graphics::SourceRect;

/// Parsed `<TextureAtlas>` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtlasDefinition {
    /// Image key with any `.png` suffix removed.
    pub image: String,
    pub regions: Vec<(String, SourceRect)>,
}

/// Reads a TexturePacker-style atlas:
///
/// ```xml
/// <TextureAtlas imagePath="tiles.png">
///     <SubTexture name="grass" x="0" y="0" width="32" height="32"/>
/// </TextureAtlas>
/// ```
///
/// Errors are human-readable messages with the offending position.
pub fn parse_atlas(raw: &str) -> Result<AtlasDefinition, String> {
    let doc = Document::parse(raw).map_err(|error| {
        let pos = error.pos();
        format!("malformed XML at line {}, column {}: {error}", pos.row, pos.col)
    })?;

    let root = doc.root_element();
    if root.tag_name().name() != "TextureAtlas" {
        return Err(at(&doc, root, "root element must be <TextureAtlas>"));
    }
    let image_path = root
        .attribute("imagePath")
        .ok_or_else(|| at(&doc, root, "missing imagePath attribute"))?;
    let image = image_path
        .strip_suffix(".png")
        .unwrap_or(image_path)
        .to_string();

    let mut seen = HashSet::new();
    let mut regions = Vec::new();
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "SubTexture" {
            return Err(at(
                &doc,
                child,
                &format!("unexpected element <{}>", child.tag_name().name()),
            ));
        }
        let name = child
            .attribute("name")
            .ok_or_else(|| at(&doc, child, "SubTexture is missing a name"))?;
        if !seen.insert(name) {
            return Err(at(&doc, child, &format!("duplicate SubTexture '{name}'")));
        }
        let region = SourceRect::new(
            number(&doc, child, "x")?,
            number(&doc, child, "y")?,
            number(&doc, child, "width")?,
            number(&doc, child, "height")?,
        );
        regions.push((name.to_string(), region));
    }

    Ok(AtlasDefinition { image, regions })
}

fn number(doc: &Document<'_>, node: Node<'_, '_>, attribute: &str) -> Result<u32, String> {
    let raw = node
        .attribute(attribute)
        .ok_or_else(|| at(doc, node, &format!("missing {attribute} attribute")))?;
    raw.trim()
        .parse()
        .map_err(|_| at(doc, node, &format!("{attribute}='{raw}' is not a non-negative integer")))
}

fn at(doc: &Document<'_>, node: Node<'_, '_>, message: &str) -> String {
    let pos = doc.text_pos_at(node.range().start);
    format!("{message} (line {}, column {})", pos.row, pos.col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_regions_in_document_order() {
        let raw = r#"<TextureAtlas imagePath="tiles.png">
            <SubTexture name="grass" x="0" y="0" width="16" height="16"/>
            <SubTexture name="road" x="16" y="0" width="16" height="16"/>
        </TextureAtlas>"#;
        let atlas = parse_atlas(raw).expect("atlas");
        assert_eq!(atlas.image, "tiles");
        assert_eq!(
            atlas.regions,
            vec![
                ("grass".to_string(), SourceRect::new(0, 0, 16, 16)),
                ("road".to_string(), SourceRect::new(16, 0, 16, 16)),
            ]
        );
    }

    #[test]
    fn reports_line_of_bad_attribute() {
        let raw = "<TextureAtlas imagePath=\"t\">\n<SubTexture name=\"a\" x=\"-1\" y=\"0\" width=\"1\" height=\"1\"/>\n</TextureAtlas>";
        let error = parse_atlas(raw).unwrap_err();
        assert!(error.contains("x='-1'"), "{error}");
        assert!(error.contains("line 2"), "{error}");
    }

    #[test]
    fn rejects_wrong_root_and_duplicates() {
        assert!(parse_atlas("<Atlas imagePath=\"t\"/>")
            .unwrap_err()
            .contains("<TextureAtlas>"));
        let dup = r#"<TextureAtlas imagePath="t">
            <SubTexture name="a" x="0" y="0" width="1" height="1"/>
            <SubTexture name="a" x="1" y="0" width="1" height="1"/>
        </TextureAtlas>"#;
        assert!(parse_atlas(dup).unwrap_err().contains("duplicate"));
        assert!(parse_atlas("<TextureAtlas").unwrap_err().contains("malformed XML"));
    }
}
