//! Page body parsing.
//!
//! A page file is a flat sequence of images and text:
//!
//! ```xml
//! <page>
//!   <img alt="The bus">bus.jpg</img>
//!   <img>road.jpg</img>
//!   <txt>Two pictures shown side by side above this text.</txt>
//!   <img location="left">map.png</img>
//!   <txt>A small map floats left of this text.</txt>
//!   <img>sunset.jpg</img>
//! </page>
//! ```
//!
//! The sequence is cut into [`ContentBlock`]s: every run of images ends at
//! the next text, which belongs to those images. Images after the last text
//! form a final block without text. Elements other than `img` and `txt` are
//! ignored.

use crate::xml::{self, Element, XmlError};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Xml(#[from] XmlError),
    #[error("<{element}> is missing its {attribute} attribute")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    #[error("<img> without a file name")]
    MissingFileName,
}

/// An image as declared in a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub file_name: String,
    pub alt: Option<String>,
    /// Where a lone image floats next to its text (`left`, `right`, …).
    pub location: Option<String>,
    /// `full` forces the image into a row even when it has a location.
    pub scale: Option<String>,
}

impl ImageRef {
    #[cfg(test)]
    pub(crate) fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            alt: None,
            location: None,
            scale: None,
        }
    }

    pub fn is_full_width(&self) -> bool {
        self.scale
            .as_deref()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("full"))
    }

    fn from_element(element: &Element) -> Result<Self, ContentError> {
        let file_name = element.inner_text().trim().to_string();
        if file_name.is_empty() {
            return Err(ContentError::MissingFileName);
        }
        let attr = |name: &str| element.attr(name).map(str::to_string);
        Ok(Self {
            file_name,
            alt: attr("alt"),
            location: attr("location").filter(|l| !l.trim().is_empty()),
            scale: attr("scale"),
        })
    }
}

/// One element of a page body that the converter understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentNode {
    Image(ImageRef),
    Text(String),
}

/// Images followed by the text they accompany.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentBlock {
    pub images: Vec<ImageRef>,
    /// `None` for the trailing block of images after the last text.
    pub text: Option<String>,
}

/// How the images of a block are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement<'a> {
    /// No images.
    None,
    /// One small image floating inside the paragraph.
    Inline(&'a ImageRef),
    /// A row of images above the paragraph.
    Row(&'a [ImageRef]),
}

impl ContentBlock {
    /// A block without text: images that follow the page's last text.
    pub fn is_trailing(&self) -> bool {
        self.text.is_none()
    }

    /// The block's text with each line trimmed; empty when there is none.
    pub fn paragraph(&self) -> String {
        self.text.as_deref().map(normalize_text).unwrap_or_default()
    }

    pub fn placement(&self) -> Placement<'_> {
        match self.images.as_slice() {
            [] => Placement::None,
            [single]
                if !self.is_trailing()
                    && single.location.is_some()
                    && !single.is_full_width() =>
            {
                Placement::Inline(single)
            }
            images => Placement::Row(images),
        }
    }
}

/// Trim every line and drop leading and trailing blank lines.
pub fn normalize_text(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let first = lines.iter().position(|l| !l.is_empty());
    let last = lines.iter().rposition(|l| !l.is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last].join("\n"),
        _ => String::new(),
    }
}

/// The `img`/`txt` children of a page root, in document order.
pub fn content_nodes(root: &Element) -> Result<Vec<ContentNode>, ContentError> {
    let mut nodes = Vec::new();
    for element in root.elements() {
        match element.name.as_str() {
            "img" => nodes.push(ContentNode::Image(ImageRef::from_element(element)?)),
            "txt" => nodes.push(ContentNode::Text(element.inner_text())),
            other => log::debug!("Ignoring <{}> in page body", other),
        }
    }
    Ok(nodes)
}

/// Cut a node sequence into blocks.
pub fn group_blocks(nodes: Vec<ContentNode>) -> Vec<ContentBlock> {
    let mut blocks = Vec::new();
    let mut images = Vec::new();
    for node in nodes {
        match node {
            ContentNode::Image(image) => images.push(image),
            ContentNode::Text(text) => blocks.push(ContentBlock {
                images: std::mem::take(&mut images),
                text: Some(text),
            }),
        }
    }
    if !images.is_empty() {
        blocks.push(ContentBlock { images, text: None });
    }
    blocks
}

/// Parse a page document into blocks.
pub fn parse_blocks(content: &str) -> Result<Vec<ContentBlock>, ContentError> {
    let root = xml::parse_document(content)?;
    Ok(group_blocks(content_nodes(&root)?))
}

/// Read and parse a page file.
pub fn load_blocks(path: &Path) -> Result<Vec<ContentBlock>, ContentError> {
    let content = fs::read_to_string(path)?;
    parse_blocks(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_names(block: &ContentBlock) -> Vec<&str> {
        block.images.iter().map(|i| i.file_name.as_str()).collect()
    }

    #[test]
    fn images_attach_to_following_text() {
        let blocks = parse_blocks(
            "<page><img>a.jpg</img><img>b.jpg</img><txt>one</txt><txt>two</txt></page>",
        )
        .unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(image_names(&blocks[0]), vec!["a.jpg", "b.jpg"]);
        assert_eq!(blocks[0].text.as_deref(), Some("one"));
        assert!(blocks[1].images.is_empty());
        assert_eq!(blocks[1].text.as_deref(), Some("two"));
    }

    #[test]
    fn trailing_images_form_final_block() {
        let blocks =
            parse_blocks("<page><txt>intro</txt><img>end1.jpg</img><img>end2.jpg</img></page>")
                .unwrap();

        assert_eq!(blocks.len(), 2);
        assert!(blocks[1].is_trailing());
        assert_eq!(image_names(&blocks[1]), vec!["end1.jpg", "end2.jpg"]);
    }

    #[test]
    fn unknown_elements_are_skipped_without_losing_images() {
        let blocks =
            parse_blocks("<page><img>a.jpg</img><video>x.mp4</video><txt>t</txt></page>").unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(image_names(&blocks[0]), vec!["a.jpg"]);
    }

    #[test]
    fn image_attributes_are_read() {
        let blocks = parse_blocks(
            r#"<page><img alt="A map" location="left" scale="Full"> Map.PNG </img><txt>t</txt></page>"#,
        )
        .unwrap();
        let img = &blocks[0].images[0];
        assert_eq!(img.file_name, "Map.PNG");
        assert_eq!(img.alt.as_deref(), Some("A map"));
        assert_eq!(img.location.as_deref(), Some("left"));
        assert!(img.is_full_width());
    }

    #[test]
    fn empty_img_is_error() {
        assert!(matches!(
            parse_blocks("<page><img alt=\"x\"/></page>"),
            Err(ContentError::MissingFileName)
        ));
    }

    #[test]
    fn malformed_page_is_error() {
        assert!(matches!(
            parse_blocks("<page><txt>open</page>"),
            Err(ContentError::Xml(_))
        ));
    }

    #[test]
    fn placement_single_located_image_is_inline() {
        let mut image = ImageRef::new("map.png");
        image.location = Some("left".into());
        let block = ContentBlock {
            images: vec![image],
            text: Some("t".into()),
        };
        assert!(matches!(block.placement(), Placement::Inline(i) if i.file_name == "map.png"));
    }

    #[test]
    fn placement_full_scale_overrides_location() {
        let mut image = ImageRef::new("map.png");
        image.location = Some("left".into());
        image.scale = Some("full".into());
        let block = ContentBlock {
            images: vec![image],
            text: Some("t".into()),
        };
        assert!(matches!(block.placement(), Placement::Row(images) if images.len() == 1));
    }

    #[test]
    fn placement_two_located_images_form_row() {
        let mut a = ImageRef::new("a.png");
        a.location = Some("left".into());
        let mut b = ImageRef::new("b.png");
        b.location = Some("right".into());
        let block = ContentBlock {
            images: vec![a, b],
            text: Some("t".into()),
        };
        assert!(matches!(block.placement(), Placement::Row(images) if images.len() == 2));
    }

    #[test]
    fn placement_trailing_located_image_is_row() {
        let mut a = ImageRef::new("a.png");
        a.location = Some("left".into());
        let block = ContentBlock {
            images: vec![a],
            text: None,
        };
        assert!(matches!(block.placement(), Placement::Row(_)));
    }

    #[test]
    fn placement_without_images() {
        let block = ContentBlock {
            images: vec![],
            text: Some("t".into()),
        };
        assert_eq!(block.placement(), Placement::None);
    }

    #[test]
    fn normalize_text_trims_lines() {
        assert_eq!(
            normalize_text("\n    First line\n      second line  \n\n"),
            "First line\nsecond line"
        );
        assert_eq!(normalize_text("   \n  "), "");
        assert_eq!(normalize_text("a\n\n  b"), "a\n\nb");
    }
}
