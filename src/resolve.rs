//! Image lookup, caching and publishing.
//!
//! Content refers to images by bare file name. [`ImageResolver`] finds the
//! file anywhere under the image tree, copies it to the mirrored location in
//! the output tree the first time it is used, and hands back a link relative
//! to the document that references it.
//!
//! ## Search order
//!
//! The image tree is walked depth-first. Inside each directory, files come
//! before subdirectories and both are visited in byte-wise name order; the
//! first file whose name matches wins. Duplicate names in different subtrees
//! are therefore resolved the same way on every machine.
//!
//! ## Cache
//!
//! One resolver lives for one build. It remembers every image it has found,
//! keyed by lowercase file name, together with the dimensions when they have
//! been read. Dimensions are read up front only for the extensions listed in
//! `check_multiple_use`; for those, a second use of the same image anywhere in
//! the blog is reported as a warning. Icons go through
//! [`ImageResolver::resolve_icon`], which never counts as a repeat.

use crate::config::contains_ext;
use crate::imaging::{self, Dimensions, ImagingError};
use crate::naming::extension_lower;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image {name} not found under {root}")]
    ImageNotFound { name: String, root: PathBuf },
    #[error(transparent)]
    Imaging(#[from] ImagingError),
    #[error("{path} is outside the tree rooted at {root}")]
    OutsideRoot { path: PathBuf, root: PathBuf },
}

/// A located image.
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub absolute_path: PathBuf,
    pub dimensions: Option<Dimensions>,
}

/// Counters reported at the end of a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    /// Distinct images found.
    pub images: usize,
    /// Images copied into the output tree.
    pub copied: usize,
    /// Cache hits on images whose repeated use is checked.
    pub repeated_uses: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Use {
    Content,
    Icon,
}

/// Finds images by name and publishes them into the output tree.
#[derive(Debug)]
pub struct ImageResolver {
    source_root: PathBuf,
    html_root: PathBuf,
    images_root: PathBuf,
    check_multiple_use: Vec<String>,
    cache: HashMap<String, ImageInfo>,
    stats: ResolveStats,
}

impl ImageResolver {
    /// `images_root` must lie inside `source_root`; found images are copied
    /// to the same relative location below `html_root`.
    pub fn new(
        source_root: impl Into<PathBuf>,
        html_root: impl Into<PathBuf>,
        images_root: impl Into<PathBuf>,
        check_multiple_use: Vec<String>,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            html_root: html_root.into(),
            images_root: images_root.into(),
            check_multiple_use,
            cache: HashMap::new(),
            stats: ResolveStats::default(),
        }
    }

    pub fn from_config(config: &crate::config::BlogConfig) -> Self {
        Self::new(
            &config.source_root,
            &config.html_root,
            config.images_root(),
            config.check_multiple_use.clone(),
        )
    }

    pub fn stats(&self) -> ResolveStats {
        self.stats
    }

    fn is_checked(&self, name: &str) -> bool {
        extension_lower(Path::new(name))
            .is_some_and(|ext| contains_ext(&self.check_multiple_use, &ext))
    }

    /// Resolve `file_name` and return its path relative to the directory of
    /// `referencing_document` (an output file), using `/` separators.
    pub fn resolve(
        &mut self,
        file_name: &str,
        referencing_document: &Path,
    ) -> Result<String, ResolveError> {
        self.resolve_as(file_name, referencing_document, Use::Content)
    }

    /// Like [`resolve`](Self::resolve), for chapter and navigation icons.
    /// These appear on every page, so reuse is expected and not reported.
    pub fn resolve_icon(
        &mut self,
        file_name: &str,
        referencing_document: &Path,
    ) -> Result<String, ResolveError> {
        self.resolve_as(file_name, referencing_document, Use::Icon)
    }

    fn resolve_as(
        &mut self,
        file_name: &str,
        referencing_document: &Path,
        usage: Use,
    ) -> Result<String, ResolveError> {
        let name = file_name.trim().to_lowercase();
        let absolute = self.lookup(&name, usage)?;
        let published = self.publish(&absolute)?;
        let from = referencing_document.parent().unwrap_or(Path::new(""));
        Ok(relative_path(from, &published))
    }

    /// Dimensions of `file_name`, read on first request if the extension was
    /// not checked up front.
    pub fn dimensions(&mut self, file_name: &str) -> Result<Dimensions, ResolveError> {
        let name = file_name.trim().to_lowercase();
        if !self.cache.contains_key(&name) {
            self.lookup(&name, Use::Content)?;
        }
        let info = self
            .cache
            .get_mut(&name)
            .ok_or_else(|| ResolveError::ImageNotFound {
                name: name.clone(),
                root: self.images_root.clone(),
            })?;
        match info.dimensions {
            Some(dims) => Ok(dims),
            None => {
                let dims = imaging::identify(&info.absolute_path)?;
                info.dimensions = Some(dims);
                Ok(dims)
            }
        }
    }

    /// Cached absolute path of `name` (already lowercase), searching on miss.
    fn lookup(&mut self, name: &str, usage: Use) -> Result<PathBuf, ResolveError> {
        let checked = self.is_checked(name);
        if let Some(info) = self.cache.get(name) {
            if checked && usage == Use::Content {
                self.stats.repeated_uses += 1;
                log::warn!(
                    "Image {} is used more than once ({})",
                    name,
                    info.absolute_path.display()
                );
            }
            return Ok(info.absolute_path.clone());
        }

        log::debug!("Searching {} for {}", self.images_root.display(), name);
        let absolute =
            find_file(&self.images_root, name)?.ok_or_else(|| ResolveError::ImageNotFound {
                name: name.to_string(),
                root: self.images_root.clone(),
            })?;
        let dimensions = if checked {
            Some(imaging::identify(&absolute)?)
        } else {
            None
        };
        self.cache.insert(
            name.to_string(),
            ImageInfo {
                absolute_path: absolute.clone(),
                dimensions,
            },
        );
        self.stats.images += 1;
        Ok(absolute)
    }

    /// Copy `absolute` to its mirrored place under `html_root` unless a file
    /// is already there. Returns the destination.
    fn publish(&mut self, absolute: &Path) -> Result<PathBuf, ResolveError> {
        let relative =
            absolute
                .strip_prefix(&self.source_root)
                .map_err(|_| ResolveError::OutsideRoot {
                    path: absolute.to_path_buf(),
                    root: self.source_root.clone(),
                })?;
        let destination = self.html_root.join(relative);
        if !destination.exists() {
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            log::info!("Copying image {}", relative.display());
            fs::copy(absolute, &destination)?;
            self.stats.copied += 1;
        }
        Ok(destination)
    }
}

/// Depth-first search for a file named exactly `name` below `root`.
fn find_file(root: &Path, name: &str) -> Result<Option<PathBuf>, ResolveError> {
    if !root.is_dir() {
        return Ok(None);
    }
    let walker = WalkDir::new(root).sort_by(|a, b| {
        a.file_type()
            .is_dir()
            .cmp(&b.file_type().is_dir())
            .then_with(|| a.file_name().cmp(b.file_name()))
    });
    for entry in walker {
        let entry = entry.map_err(std::io::Error::other)?;
        if entry.file_type().is_file() && entry.file_name() == name {
            return Ok(Some(entry.into_path()));
        }
    }
    Ok(None)
}

/// Path from directory `from` to `to`, joined with `/`.
///
/// Both paths are expected to share a root (absolute or relative to the same
/// directory); no filesystem access is made.
pub fn relative_path(from: &Path, to: &Path) -> String {
    let from: Vec<Component> = from
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let to: Vec<Component> = to
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    parts.extend(std::iter::repeat_n("..".to_string(), from.len() - common));
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().to_string()),
    );
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}
