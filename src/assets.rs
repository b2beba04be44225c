//! Cache-busting names for static assets.
//!
//! Browsers keep stylesheets and scripts cached across deploys. Giving every
//! such file a name derived from its content (`style.css` →
//! `style-3f9a0c12b4.css`) makes a changed file a new URL, while unchanged
//! files keep their name and stay cached.
//!
//! Renaming is a two-phase protocol:
//!
//! 1. [`RenamedAssets::discover`] walks every static folder and decides the
//!    new name of each file whose extension is in `assets.randomize`.
//! 2. [`RenamedAssets::copy`] mirrors the folders into the output tree.
//!    Files whose extension is in `assets.rewrite_links` have every reference
//!    to a renamed file replaced before they are written.
//!
//! The second phase is only reachable through the value the first one
//! returns, so a file copied early can never miss a rename discovered later.

use crate::config::contains_ext;
use crate::naming::{busted_name, extension_lower};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Hex digits of the content hash kept in a renamed file's name.
const TOKEN_LEN: usize = 10;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AssetError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> AssetError + '_ {
        move |source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What [`RenamedAssets::copy`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub renamed: usize,
    pub rewritten: usize,
}

/// Map from lowercase original file name to cache-busted file name.
#[derive(Debug, Clone, Default)]
pub struct RenamedAssets {
    renames: BTreeMap<String, String>,
}

impl RenamedAssets {
    /// Phase 1: decide new names for every randomized file in `folders`
    /// (relative to `source_root`).
    ///
    /// Configured folders that do not exist are skipped with a warning.
    pub fn discover(
        source_root: &Path,
        folders: &[String],
        randomize: &[String],
    ) -> Result<Self, AssetError> {
        let mut renames = BTreeMap::new();
        for folder in folders {
            let root = source_root.join(folder);
            if !root.is_dir() {
                log::warn!("Static folder {} does not exist, skipping", root.display());
                continue;
            }
            for entry in WalkDir::new(&root).sort_by_file_name() {
                let entry = entry.map_err(|e| AssetError::Io {
                    path: root.clone(),
                    source: e.into(),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let randomized = extension_lower(entry.path())
                    .is_some_and(|ext| contains_ext(randomize, &ext));
                if !randomized {
                    continue;
                }
                let name = entry.file_name().to_string_lossy().to_lowercase();
                if let Some(existing) = renames.get(&name) {
                    log::warn!(
                        "{} shares its name with an earlier asset; both are published as {}",
                        entry.path().display(),
                        existing
                    );
                    continue;
                }
                let token = content_token(entry.path())?;
                let new_name = busted_name(&name, &token);
                log::debug!("Renaming {} to {}", name, new_name);
                renames.insert(name, new_name);
            }
        }
        Ok(Self { renames })
    }

    #[cfg(test)]
    pub(crate) fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            renames: pairs
                .into_iter()
                .map(|(k, v)| (k.into().to_lowercase(), v.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    /// New name for `file_name`, if it is renamed.
    pub fn renamed(&self, file_name: &str) -> Option<&str> {
        self.renames
            .get(&file_name.to_lowercase())
            .map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.renames.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace every reference to a renamed file in `text`.
    ///
    /// A reference is an occurrence of the lowercase original name that is
    /// not part of a longer file name, so `style.css` is rewritten inside
    /// `href="css/style.css?v=2"` but left alone in `mystyle.css`.
    pub fn rewrite(&self, text: &str) -> String {
        let mut olds: Vec<(&String, &String)> = self.renames.iter().collect();
        olds.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

        let mut out = text.to_string();
        for (old, new) in olds {
            if out.contains(old.as_str()) {
                out = replace_bounded(&out, old, new);
            }
        }
        out
    }

    /// Phase 2: mirror `folders` from `source_root` into `html_root`,
    /// applying renames and rewriting links in `rewrite_links` files.
    pub fn copy(
        &self,
        source_root: &Path,
        html_root: &Path,
        folders: &[String],
        rewrite_links: &[String],
    ) -> Result<CopyStats, AssetError> {
        let mut stats = CopyStats::default();
        for folder in folders {
            let root = source_root.join(folder);
            if !root.is_dir() {
                continue;
            }
            let target_root = html_root.join(folder);
            for entry in WalkDir::new(&root).sort_by_file_name() {
                let entry = entry.map_err(|e| AssetError::Io {
                    path: root.clone(),
                    source: e.into(),
                })?;
                let relative = entry.path().strip_prefix(&root).unwrap_or(entry.path());
                let destination = target_root.join(relative);

                if entry.file_type().is_dir() {
                    fs::create_dir_all(&destination).map_err(AssetError::io(&destination))?;
                    continue;
                }
                if !entry.file_type().is_file() {
                    continue;
                }

                let file_name = entry.file_name().to_string_lossy();
                let destination = match self.renamed(&file_name) {
                    Some(new_name) => {
                        stats.renamed += 1;
                        destination.with_file_name(new_name)
                    }
                    None => destination,
                };

                let rewrite = extension_lower(entry.path())
                    .is_some_and(|ext| contains_ext(rewrite_links, &ext));
                if rewrite {
                    let content =
                        fs::read_to_string(entry.path()).map_err(AssetError::io(entry.path()))?;
                    fs::write(&destination, self.rewrite(&content))
                        .map_err(AssetError::io(&destination))?;
                    stats.rewritten += 1;
                } else {
                    fs::copy(entry.path(), &destination).map_err(AssetError::io(&destination))?;
                }
                log::info!("Copied {}", destination.display());
                stats.files += 1;
            }
        }
        Ok(stats)
    }
}

/// First [`TOKEN_LEN`] hex digits of the SHA-256 of the file's contents.
fn content_token(path: &Path) -> Result<String, AssetError> {
    let bytes = fs::read(path).map_err(AssetError::io(path))?;
    let digest = Sha256::digest(&bytes);
    let hex = format!("{:x}", digest);
    Ok(hex[..TOKEN_LEN].to_string())
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// Replace occurrences of `old` that are not embedded in a longer name.
fn replace_bounded(text: &str, old: &str, new: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in text.match_indices(old) {
        if start < last {
            continue;
        }
        let end = start + old.len();
        let before_ok = text[..start].chars().next_back().is_none_or(|c| !is_name_char(c));
        let after_ok = text[end..].chars().next().is_none_or(|c| !is_name_char(c));
        if before_ok && after_ok {
            out.push_str(&text[last..start]);
            out.push_str(new);
            last = end;
        }
    }
    out.push_str(&text[last..]);
    out
}
