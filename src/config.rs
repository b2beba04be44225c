//! Blog configuration.
//!
//! Handles loading, merging and validating the blog's TOML settings file.
//! Stock defaults form the base layer; the user's file only needs the keys it
//! wants to override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source_root = "content"     # Authored blog (index.xml, templates, chapters)
//! html_root = "dist"          # Generated site
//! images_dir = "images"       # Image tree searched by filename, under source_root
//! folders_to_copy = ["css", "script", "fonts"]
//! indent = "  "               # Indentation of the JSON page manifest
//! check_multiple_use = ["jpg", "jpeg", "png", "webp"]
//! manifest = "script/availablePages.json"
//! layout_css = "css/layout.css"
//!
//! [assets]
//! randomize = ["css", "js"]   # Extensions given cache-busting names
//! rewrite_links = ["html", "js", "css"]
//!
//! [layout]
//! gutter_px = 10              # Horizontal gap between images of one row
//!
//! [icons]
//! previous = "previous.svg"
//! next = "next.svg"
//! home = "minibus.svg"
//! empty = "empty.svg"
//! ```
//!
//! Relative `source_root` and `html_root` paths are resolved against the
//! directory holding the config file, so a build behaves the same from any
//! working directory. Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Blog configuration loaded from the settings file.
///
/// All fields have defaults; a missing settings file means "use the defaults".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlogConfig {
    /// Root of the authored blog.
    pub source_root: PathBuf,
    /// Root of the generated site.
    pub html_root: PathBuf,
    /// Image tree below `source_root` searched when content names an image.
    pub images_dir: String,
    /// Static folders below `source_root` mirrored into `html_root`.
    pub folders_to_copy: Vec<String>,
    /// Indentation used when writing the JSON page manifest.
    pub indent: String,
    /// Image extensions whose dimensions are read eagerly and whose repeated
    /// use across the blog is reported.
    pub check_multiple_use: Vec<String>,
    /// Manifest location, relative to `html_root`.
    pub manifest: String,
    /// Generated row-layout stylesheet location, relative to `html_root`.
    pub layout_css: String,
    pub assets: AssetsConfig,
    pub layout: LayoutConfig,
    pub icons: IconsConfig,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            source_root: PathBuf::from("content"),
            html_root: PathBuf::from("dist"),
            images_dir: "images".to_string(),
            folders_to_copy: vec!["css".into(), "script".into(), "fonts".into()],
            indent: "  ".to_string(),
            check_multiple_use: vec!["jpg".into(), "jpeg".into(), "png".into(), "webp".into()],
            manifest: "script/availablePages.json".to_string(),
            layout_css: "css/layout.css".to_string(),
            assets: AssetsConfig::default(),
            layout: LayoutConfig::default(),
            icons: IconsConfig::default(),
        }
    }
}

impl BlogConfig {
    /// Validate values that serde alone cannot check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.indent.chars().all(char::is_whitespace) {
            return Err(ConfigError::Validation(
                "indent must contain whitespace only".into(),
            ));
        }
        let extension_lists = [
            ("check_multiple_use", &self.check_multiple_use),
            ("assets.randomize", &self.assets.randomize),
            ("assets.rewrite_links", &self.assets.rewrite_links),
        ];
        for (key, list) in extension_lists {
            if let Some(bad) = list.iter().find(|e| e.is_empty() || e.contains('.')) {
                return Err(ConfigError::Validation(format!(
                    "{key}: extensions are written without a dot, got {bad:?}"
                )));
            }
        }
        if self.layout.gutter_px > 100 {
            return Err(ConfigError::Validation(
                "layout.gutter_px must be 0-100".into(),
            ));
        }
        Ok(())
    }

    /// The directory searched for images named in the content.
    pub fn images_root(&self) -> PathBuf {
        self.source_root.join(&self.images_dir)
    }

    /// Make relative roots absolute with respect to `base`.
    fn anchor_roots(&mut self, base: &Path) {
        if self.source_root.is_relative() {
            self.source_root = base.join(&self.source_root);
        }
        if self.html_root.is_relative() {
            self.html_root = base.join(&self.html_root);
        }
    }
}

/// Cache-busting settings for static assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    /// Extensions whose files get a content-derived token in their name.
    pub randomize: Vec<String>,
    /// Extensions whose content is scanned for references to renamed files.
    pub rewrite_links: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            randomize: vec!["css".into(), "js".into()],
            rewrite_links: vec!["html".into(), "js".into(), "css".into()],
        }
    }
}

/// Row layout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    /// Pixels between two neighbouring images of one row.
    pub gutter_px: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { gutter_px: 10 }
    }
}

/// Icon file names used by page navigation, looked up like any other image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IconsConfig {
    pub previous: String,
    pub next: String,
    pub home: String,
    /// Placeholder shown in unused navigation slots.
    pub empty: String,
}

impl Default for IconsConfig {
    fn default() -> Self {
        Self {
            previous: "previous.svg".to_string(),
            next: "next.svg".to_string(),
            home: "minibus.svg".to_string(),
            empty: "empty.svg".to_string(),
        }
    }
}

/// Case-insensitive membership test for extension lists.
pub fn contains_ext(list: &[String], ext: &str) -> bool {
    list.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(BlogConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a settings file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BlogConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BlogConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the settings file at `path`.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// validates, and anchors relative roots at the file's directory.
pub fn load_config(path: &Path) -> Result<BlogConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    let mut config = resolve_config(base, overlay)?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    config.anchor_roots(dir);
    Ok(config)
}

/// Returns a fully-commented stock settings file.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# blogbake configuration
# ======================
# All settings are optional. Values shown below are the defaults.
# Relative paths are resolved against the directory of this file.
# Unknown keys will cause an error.

# Authored blog: index.xml, index.html/page.html templates, chapter folders.
source_root = "content"

# Where the generated site is written. Clear it between builds
# (or pass --clean) so stale files do not accumulate.
html_root = "dist"

# Image tree (below source_root) searched when content names an image.
images_dir = "images"

# Static folders (below source_root) mirrored into html_root.
folders_to_copy = ["css", "script", "fonts"]

# Indentation of the generated JSON page manifest.
indent = "  "

# Image extensions whose dimensions are read up front and whose repeated
# use across pages is reported as a warning.
check_multiple_use = ["jpg", "jpeg", "png", "webp"]

# Generated files, relative to html_root.
manifest = "script/availablePages.json"
layout_css = "css/layout.css"

# ---------------------------------------------------------------------------
# Cache busting
# ---------------------------------------------------------------------------
[assets]
# Files with these extensions get a content-hash token in their name.
randomize = ["css", "js"]
# Files with these extensions have references to renamed files rewritten.
rewrite_links = ["html", "js", "css"]

# ---------------------------------------------------------------------------
# Image rows
# ---------------------------------------------------------------------------
[layout]
# Horizontal gap in pixels between neighbouring images of one row.
gutter_px = 10

# ---------------------------------------------------------------------------
# Navigation icons (looked up in the image tree)
# ---------------------------------------------------------------------------
[icons]
previous = "previous.svg"
next = "next.svg"
home = "minibus.svg"
empty = "empty.svg"
"##
}
