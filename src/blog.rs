//! The blog index: `index.xml` at the source root.
//!
//! ```xml
//! <blog>
//!   <chapters>
//!     <chapter link="intro" icon="minibus.svg">Getting started</chapter>
//!     <empty-line/>
//!     <link href="https://example.org" icon="globe.svg">Elsewhere</link>
//!   </chapters>
//! </blog>
//! ```
//!
//! Entries are read in document order into a closed [`BlogEntry`] list.
//! Unknown elements are logged and skipped.

use crate::content::ContentError;
use crate::xml::{self, Element};
use std::fs;
use std::path::Path;

/// A chapter: a titled, ordered run of pages in the folder `link`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    pub icon: String,
    /// Folder below the source root, and the URL path segment of its pages.
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlogEntry {
    Chapter(Chapter),
    /// Vertical space on the home page.
    EmptyLine,
    /// An outbound link on the home page.
    Link {
        href: String,
        icon: String,
        label: String,
    },
}

impl BlogEntry {
    fn from_element(element: &Element) -> Result<Option<Self>, ContentError> {
        let entry = match element.name.as_str() {
            "chapter" => BlogEntry::Chapter(Chapter {
                title: element.inner_text().trim().to_string(),
                icon: required(element, "icon")?,
                link: required(element, "link")?
                    .trim_matches('/')
                    .to_string(),
            }),
            "empty-line" => BlogEntry::EmptyLine,
            "link" => BlogEntry::Link {
                href: required(element, "href")?,
                icon: required(element, "icon")?,
                label: element.inner_text().trim().to_string(),
            },
            other => {
                log::warn!("Skipping unknown index entry <{}>", other);
                return Ok(None);
            }
        };
        Ok(Some(entry))
    }
}

fn required(element: &Element, attribute: &'static str) -> Result<String, ContentError> {
    element
        .attr(attribute)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ContentError::MissingAttribute {
            element: element.name.clone(),
            attribute,
        })
}

/// Parse the index document.
///
/// Entries are the children of `<chapters>`; a document without one lists
/// its entries directly under the root.
pub fn parse_index(content: &str) -> Result<Vec<BlogEntry>, ContentError> {
    let root = xml::parse_document(content)?;
    let list = root.find("chapters").unwrap_or(&root);
    let mut entries = Vec::new();
    for element in list.elements() {
        if let Some(entry) = BlogEntry::from_element(element)? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// Read and parse `index.xml` below `source_root`.
pub fn load_index(source_root: &Path) -> Result<Vec<BlogEntry>, ContentError> {
    let content = fs::read_to_string(source_root.join("index.xml"))?;
    parse_index(&content)
}

/// The chapters of an entry list, in order.
pub fn chapters(entries: &[BlogEntry]) -> impl Iterator<Item = &Chapter> {
    entries.iter().filter_map(|e| match e {
        BlogEntry::Chapter(c) => Some(c),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<blog>
  <chapters>
    <chapter link="intro" icon="minibus.svg">
      Getting started
    </chapter>
    <empty-line/>
    <chapter link="/desert/" icon="dune.svg">Desert</chapter>
    <link href="https://example.org" icon="globe.svg">Elsewhere</link>
  </chapters>
</blog>"#;

    #[test]
    fn parses_entries_in_order() {
        let entries = parse_index(INDEX).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(
            entries[0],
            BlogEntry::Chapter(Chapter {
                title: "Getting started".into(),
                icon: "minibus.svg".into(),
                link: "intro".into(),
            })
        );
        assert_eq!(entries[1], BlogEntry::EmptyLine);
        assert!(matches!(&entries[2], BlogEntry::Chapter(c) if c.link == "desert"));
        assert_eq!(
            entries[3],
            BlogEntry::Link {
                href: "https://example.org".into(),
                icon: "globe.svg".into(),
                label: "Elsewhere".into(),
            }
        );
    }

    #[test]
    fn chapters_filters_other_entries() {
        let entries = parse_index(INDEX).unwrap();
        let links: Vec<&str> = chapters(&entries).map(|c| c.link.as_str()).collect();
        assert_eq!(links, vec!["intro", "desert"]);
    }

    #[test]
    fn unknown_entries_are_skipped() {
        let entries =
            parse_index("<blog><chapters><banner/><empty-line/></chapters></blog>").unwrap();
        assert_eq!(entries, vec![BlogEntry::EmptyLine]);
    }

    #[test]
    fn entries_without_chapters_wrapper() {
        let entries = parse_index(r#"<blog><chapter link="a" icon="i.svg">A</chapter></blog>"#)
            .unwrap();
        assert_eq!(chapters(&entries).count(), 1);
    }

    #[test]
    fn chapter_without_link_is_error() {
        let err = parse_index(r#"<blog><chapters><chapter icon="i.svg">A</chapter></chapters></blog>"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ContentError::MissingAttribute { ref element, attribute: "link" } if element == "chapter"
        ));
    }

    #[test]
    fn malformed_index_is_error() {
        assert!(matches!(
            parse_index("<blog><chapters></blog>"),
            Err(ContentError::Xml(_))
        ));
    }
}
