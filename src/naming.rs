//! File naming conventions shared by the pipeline.
//!
//! - Chapter pages are `page{n}.xml` in the source tree and `page{n}.html`
//!   in the output, numbered from 1 without gaps.
//! - Images are referenced and published under lowercase names; Linux web
//!   servers treat names case-sensitively while authors often do not.
//! - Cache-busted assets are named `{stem}-{token}.{ext}`, all lowercase.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Source file name of page `index`.
pub fn page_source_name(index: usize) -> String {
    format!("page{index}.xml")
}

/// Output file name of page `index`.
pub fn page_output_name(index: usize) -> String {
    format!("page{index}.html")
}

/// Parse the page number out of `page{n}.xml` or `page{n}.html`.
///
/// - `"page1.xml"` → `Some(1)`
/// - `"page12.html"` → `Some(12)`
/// - `"page.xml"`, `"page0.xml"`, `"intro.xml"` → `None`
pub fn parse_page_index(file_name: &str) -> Option<usize> {
    let stem = file_name
        .strip_suffix(".xml")
        .or_else(|| file_name.strip_suffix(".html"))?;
    let digits = stem.strip_prefix("page")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|&n| n >= 1)
}

/// Lowercase extension of a path, without the dot.
pub fn extension_lower(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// Cache-busted name for `file_name`: `{stem}-{token}.{ext}`, lowercased.
///
/// Files without an extension get `{name}-{token}`.
pub fn busted_name(file_name: &str, token: &str) -> String {
    let lower = file_name.to_lowercase();
    match lower.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{token}.{ext}"),
        _ => format!("{lower}-{token}"),
    }
}

/// Rename every file below `root` whose name has uppercase characters to its
/// lowercase form. Returns the new paths in walk order.
///
/// A missing `root` is not an error: a blog without images has nothing to do.
pub fn lowercase_image_names(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut renamed = Vec::new();
    if !root.is_dir() {
        return Ok(renamed);
    }
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        let lower = name.to_lowercase();
        if name == lower {
            continue;
        }
        let target = entry.path().with_file_name(&lower);
        log::info!("Changing image name {} to lowercase", name);
        fs::rename(entry.path(), &target)?;
        renamed.push(target);
    }
    Ok(renamed)
}
