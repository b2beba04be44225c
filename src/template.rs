//! Authored HTML templates.
//!
//! The blog ships its own `index.html` and `page.html`. Generated markup is
//! spliced into them at a few anchors: the `<title>` element and elements
//! identified by `id`. Everything else in the template is left byte-for-byte
//! as written, so the template stays a plain HTML file the author controls.
//!
//! Element matching is by tag name and nesting depth, which is enough for the
//! hand-written templates this is used with; it is not an HTML parser.

use maud::html;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Template has no element {0}")]
    MissingElement(String),
    #[error("Element {0} is never closed")]
    Unclosed(String),
}

/// Byte offsets of one element in the template text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    close_start: usize,
    close_end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
}

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let text = fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(text))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    /// Replace the content of `<title>` with `title`, escaped.
    pub fn set_title(&mut self, title: &str) -> Result<(), TemplateError> {
        let lower = self.text.to_ascii_lowercase();
        let missing = || TemplateError::MissingElement("<title>".into());
        let open = find_tag(&lower, "title", 0).ok_or_else(missing)?;
        let content_start = lower[open..]
            .find('>')
            .map(|i| open + i + 1)
            .ok_or_else(missing)?;
        let close = lower[content_start..]
            .find("</title")
            .map(|i| content_start + i)
            .ok_or_else(|| TemplateError::Unclosed("<title>".into()))?;
        let escaped = html! { (title) }.into_string();
        self.text.replace_range(content_start..close, &escaped);
        Ok(())
    }

    /// Insert `markup` as the last content of the element with `id`.
    pub fn append_to(&mut self, id: &str, markup: &str) -> Result<(), TemplateError> {
        let span = self.find_element(id)?;
        self.text.insert_str(span.close_start, markup);
        Ok(())
    }

    /// Insert `markup` right after the element with `id`.
    pub fn insert_after(&mut self, id: &str, markup: &str) -> Result<(), TemplateError> {
        let span = self.find_element(id)?;
        self.text.insert_str(span.close_end, markup);
        Ok(())
    }

    fn find_element(&self, id: &str) -> Result<Span, TemplateError> {
        let lower = self.text.to_ascii_lowercase();
        let open_start = find_id(&lower, &id.to_ascii_lowercase())
            .ok_or_else(|| TemplateError::MissingElement(format!("#{id}")))?;
        let name: String = lower[open_start + 1..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        let unclosed = || TemplateError::Unclosed(format!("#{id}"));
        let open_end = lower[open_start..]
            .find('>')
            .map(|i| open_start + i + 1)
            .ok_or_else(unclosed)?;
        if lower[..open_end].ends_with("/>") {
            return Err(unclosed());
        }

        let mut depth = 1usize;
        let mut cursor = open_end;
        while let Some(offset) = lower[cursor..].find('<') {
            let at = cursor + offset;
            let rest = &lower[at + 1..];
            let tag_end = lower[at..].find('>').map_or(lower.len(), |i| at + i + 1);
            if let Some(closing) = rest.strip_prefix('/') {
                if names_tag(closing, &name) {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Span {
                            close_start: at,
                            close_end: tag_end,
                        });
                    }
                }
            } else if names_tag(rest, &name) && !lower[at..tag_end].ends_with("/>") {
                depth += 1;
            }
            cursor = at + 1;
        }
        Err(unclosed())
    }
}

/// Whether `s` starts with the tag name `name` followed by a delimiter.
fn names_tag(s: &str, name: &str) -> bool {
    s.strip_prefix(name).is_some_and(|after| {
        after
            .chars()
            .next()
            .is_none_or(|c| c.is_ascii_whitespace() || c == '>' || c == '/')
    })
}

/// Offset of the first `<name` opening tag at or after `from`.
fn find_tag(lower: &str, name: &str, from: usize) -> Option<usize> {
    let mut cursor = from;
    while let Some(offset) = lower[cursor..].find('<') {
        let at = cursor + offset;
        if names_tag(&lower[at + 1..], name) {
            return Some(at);
        }
        cursor = at + 1;
    }
    None
}

/// Offset of the `<` opening the tag that carries `id="{id}"`.
fn find_id(lower: &str, id: &str) -> Option<usize> {
    let patterns = [format!("id=\"{id}\""), format!("id='{id}'")];
    patterns
        .iter()
        .flat_map(|p| lower.match_indices(p.as_str()).map(|(pos, _)| pos))
        .filter(|&pos| pos > 0 && lower.as_bytes()[pos - 1].is_ascii_whitespace())
        .filter_map(|pos| {
            let start = lower[..pos].rfind('<')?;
            (!lower[start..pos].contains('>')).then_some(start)
        })
        .min()
}
