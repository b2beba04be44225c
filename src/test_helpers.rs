//! Shared test utilities for the blogbake test suite.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let config = fixture_config(&tmp);
//! build(&config, false).unwrap();
//!
//! assert!(read_output(&config, "intro/page1.html").contains("Getting started"));
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::config::{BlogConfig, load_config};

/// Photos written into the fixture image tree: `(path below content/images, width, height)`.
///
/// Raster files are generated rather than checked in so the fixture tree
/// stays plain text.
pub const FIXTURE_PHOTOS: &[(&str, u32, u32)] = &[
    ("trips/bus.png", 400, 300),
    ("trips/road.png", 400, 200),
    ("trips/map.png", 120, 80),
    ("desert/dune.png", 300, 300),
    ("desert/Sunset.PNG", 600, 300),
];

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/blog/` to a temp directory, add the generated photos and
/// return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/blog");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    let images = tmp.path().join("content/images");
    for (path, width, height) in FIXTURE_PHOTOS {
        write_png(&images.join(path), *width, *height);
    }
    tmp
}

/// The fixture's `blog.toml`, with roots anchored in the temp directory.
pub fn fixture_config(tmp: &TempDir) -> BlogConfig {
    load_config(&tmp.path().join("blog.toml")).unwrap()
}

/// Contents of a generated file. Panics if it is missing.
pub fn read_output(config: &BlogConfig, relative: &str) -> String {
    let path = config.html_root.join(relative);
    fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

/// Write a blank PNG of the given size, creating parent directories.
pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    image::RgbImage::new(width, height).save(path).unwrap();
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}
