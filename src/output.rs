//! CLI output formatting.
//!
//! Output leads with what the reader cares about, the chapters and pages of
//! the blog, and keeps file system detail on indented context lines.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Home → index.html
//! 001 Getting started
//!     Page 1 → intro/page1.html
//! 002 Desert crossing
//!     Page 1 → desert/page1.html
//!     Page 2 → desert/page2.html
//!
//! Lowercased 1 image file
//! Copied 6 static files (2 renamed, 3 rewritten)
//! Published 7 images (1 repeated use)
//! Generated 2 chapters, 3 pages, 4 layout rules
//! ```
//!
//! ## Check
//!
//! ```text
//! 001 Getting started (intro/)
//!     Page 1: 1 block, 1 image
//! 002 Desert crossing (desert/)
//!     Page 1: 3 blocks, 3 images
//! 003 Drafts (drafts/)
//!     (no pages)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::build::{BuildSummary, CheckedChapter};
use std::path::{Path, PathBuf};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `"1 page"`, `"2 pages"`.
fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("{n} {noun}")
    } else {
        format!("{n} {noun}s")
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_output(summary: &BuildSummary) -> Vec<String> {
    let mut lines = vec!["Home \u{2192} index.html".to_string()];

    for (i, chapter) in summary.chapters.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), chapter.title));
        if chapter.pages.is_empty() {
            lines.push(format!("{}(no pages)", indent(1)));
        }
        for (p, page) in chapter.pages.iter().enumerate() {
            lines.push(format!("{}Page {} \u{2192} {}", indent(1), p + 1, page));
        }
    }

    lines.push(String::new());
    if !summary.lowercased.is_empty() {
        lines.push(format!(
            "Lowercased {}",
            count(summary.lowercased.len(), "image file")
        ));
    }
    let assets = &summary.assets;
    lines.push(format!(
        "Copied {} ({} renamed, {} rewritten)",
        count(assets.files, "static file"),
        assets.renamed,
        assets.rewritten
    ));
    let images = &summary.images;
    if images.repeated_uses > 0 {
        lines.push(format!(
            "Published {} ({})",
            count(images.images, "image"),
            count(images.repeated_uses, "repeated use")
        ));
    } else {
        lines.push(format!("Published {}", count(images.images, "image")));
    }
    lines.push(format!(
        "Generated {}, {}, {}",
        count(summary.chapters.len(), "chapter"),
        count(summary.page_count(), "page"),
        count(summary.layout_rules, "layout rule")
    ));
    lines
}

pub fn print_build_output(summary: &BuildSummary) {
    for line in format_build_output(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(chapters: &[CheckedChapter]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, chapter) in chapters.iter().enumerate() {
        lines.push(format!(
            "{} {} ({}/)",
            format_index(i + 1),
            chapter.title,
            chapter.link
        ));
        if chapter.pages.is_empty() {
            lines.push(format!("{}(no pages)", indent(1)));
        }
        for page in &chapter.pages {
            lines.push(format!(
                "{}Page {}: {}, {}",
                indent(1),
                page.index,
                count(page.blocks, "block"),
                count(page.images, "image")
            ));
        }
    }
    lines
}

pub fn print_check_output(chapters: &[CheckedChapter]) {
    for line in format_check_output(chapters) {
        println!("{}", line);
    }
}

// ============================================================================
// Lowercase images
// ============================================================================

/// Renamed files, shown relative to `root`.
pub fn format_lowercase_output(renamed: &[PathBuf], root: &Path) -> Vec<String> {
    if renamed.is_empty() {
        return vec!["All image names are lowercase".to_string()];
    }
    let mut lines: Vec<String> = renamed
        .iter()
        .map(|p| {
            let shown = p.strip_prefix(root).unwrap_or(p);
            format!("{}{}", indent(1), shown.display())
        })
        .collect();
    lines.insert(0, format!("Renamed {}", count(renamed.len(), "image file")));
    lines
}

pub fn print_lowercase_output(renamed: &[PathBuf], root: &Path) {
    for line in format_lowercase_output(renamed, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
