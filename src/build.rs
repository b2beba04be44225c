//! The build pipeline.
//!
//! ```text
//! 1. Lowercase    image tree file names
//! 2. Discover     cache-busting names for static assets
//! 3. Copy         static folders into html_root, rewriting links
//! 4. Index        index.xml → home page entries
//! 5. Pages        every chapter's page{n}.xml → page{n}.html
//! 6. Write        index.html, the page manifest, the layout stylesheet
//! ```
//!
//! All state of a run ([`ImageResolver`], [`RenamedAssets`], [`LayoutRules`],
//! the manifest) is created here and passed down by reference; nothing
//! outlives a call to [`build`]. The first error aborts the run.
//!
//! Renamed asset references are rewritten in the authored templates before
//! any content is spliced in, so page text that mentions `style.css` is
//! published as written.

use crate::assets::{AssetError, CopyStats, RenamedAssets};
use crate::blog::{self, BlogEntry, Chapter};
use crate::config::BlogConfig;
use crate::content::{self, ContentError};
use crate::layout::LayoutRules;
use crate::naming::{self, page_output_name};
use crate::page::{self, PageError, PageSynthesizer};
use crate::resolve::{ImageResolver, ResolveError, ResolveStats};
use crate::template::{Template, TemplateError};
use maud::{Markup, PreEscaped, html};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Index {
        path: PathBuf,
        source: ContentError,
    },
    #[error("Refusing to clean {html_root}: it contains the source tree")]
    UnsafeClean { html_root: PathBuf },
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> BuildError + '_ {
    move |source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// One entry of the page manifest read by the site's scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Page location relative to `html_root`.
    pub link: String,
    /// Chapter icon relative to `html_root`.
    pub icon: String,
    pub title: String,
}

/// A chapter as written by [`build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltChapter {
    pub title: String,
    pub link: String,
    /// Output pages relative to `html_root`, in page order.
    pub pages: Vec<String>,
}

/// What a build produced, for the CLI summary.
#[derive(Debug, Clone, Default)]
pub struct BuildSummary {
    pub chapters: Vec<BuiltChapter>,
    /// Image files renamed to lowercase before the build.
    pub lowercased: Vec<PathBuf>,
    pub assets: CopyStats,
    pub images: ResolveStats,
    pub layout_rules: usize,
    pub manifest_entries: usize,
}

impl BuildSummary {
    pub fn page_count(&self) -> usize {
        self.chapters.iter().map(|c| c.pages.len()).sum()
    }
}

/// Run the whole pipeline for `config`. With `clean`, `html_root` is removed
/// first.
pub fn build(config: &BlogConfig, clean: bool) -> Result<BuildSummary, BuildError> {
    let source_root = &config.source_root;
    let html_root = &config.html_root;
    if clean {
        clean_output(config)?;
    }
    fs::create_dir_all(html_root).map_err(io_error(html_root))?;

    let images_root = config.images_root();
    let lowercased =
        naming::lowercase_image_names(&images_root).map_err(io_error(&images_root))?;

    let renamed = RenamedAssets::discover(
        source_root,
        &config.folders_to_copy,
        &config.assets.randomize,
    )?;
    let assets = renamed.copy(
        source_root,
        html_root,
        &config.folders_to_copy,
        &config.assets.rewrite_links,
    )?;

    let index_source = source_root.join("index.xml");
    let entries = blog::load_index(source_root).map_err(|source| BuildError::Index {
        path: index_source.clone(),
        source,
    })?;

    let mut resolver = ImageResolver::from_config(config);
    let mut rules = LayoutRules::new(config.layout.gutter_px);
    let page_template = if blog::chapters(&entries).next().is_some() {
        Some(load_template(&source_root.join("page.html"), &renamed)?)
    } else {
        None
    };

    let home_path = html_root.join("index.html");
    let mut home = String::new();
    let mut manifest = Vec::new();
    let mut chapters = Vec::new();

    for entry in &entries {
        let markup = match entry {
            BlogEntry::Chapter(chapter) => {
                let icon = resolver.resolve_icon(&chapter.icon, &home_path)?;
                if let Some(template) = &page_template {
                    let built = build_chapter(
                        config,
                        chapter,
                        template,
                        &mut resolver,
                        &mut rules,
                    )?;
                    manifest.extend(built.pages.iter().map(|link| ManifestEntry {
                        link: link.clone(),
                        icon: icon.clone(),
                        title: chapter.title.clone(),
                    }));
                    chapters.push(built);
                }
                chapter_link(chapter, &icon)
            }
            BlogEntry::EmptyLine => empty_line(),
            BlogEntry::Link { href, icon, label } => {
                let icon = resolver.resolve_icon(icon, &home_path)?;
                external_link(href, &icon, label)
            }
        };
        home.push_str(&markup.into_string());
    }

    let mut index = load_template(&source_root.join("index.html"), &renamed)?;
    index.append_to("content", &home)?;
    write_file(&home_path, index.as_str())?;

    let manifest_path = html_root.join(&config.manifest);
    write_file(&manifest_path, &manifest_json(&manifest, &config.indent)?)?;

    let css_path = html_root.join(&config.layout_css);
    write_file(&css_path, &rules.to_css())?;

    Ok(BuildSummary {
        chapters,
        lowercased,
        assets,
        images: resolver.stats(),
        layout_rules: rules.len(),
        manifest_entries: manifest.len(),
    })
}

fn clean_output(config: &BlogConfig) -> Result<(), BuildError> {
    let html_root = &config.html_root;
    if !html_root.exists() {
        return Ok(());
    }
    if config.source_root.starts_with(html_root) {
        return Err(BuildError::UnsafeClean {
            html_root: html_root.clone(),
        });
    }
    log::info!("Removing {}", html_root.display());
    fs::remove_dir_all(html_root).map_err(io_error(html_root))
}

fn build_chapter(
    config: &BlogConfig,
    chapter: &Chapter,
    template: &Template,
    resolver: &mut ImageResolver,
    rules: &mut LayoutRules,
) -> Result<BuiltChapter, BuildError> {
    let pages = page::discover_pages(&config.source_root, &config.html_root, chapter);
    if pages.is_empty() {
        log::warn!(
            "Chapter {} has no {} in {}",
            chapter.title,
            naming::page_source_name(1),
            config.source_root.join(&chapter.link).display()
        );
    }

    let mut synth = PageSynthesizer::new(resolver, rules, &config.icons);
    let mut links = Vec::with_capacity(pages.len());
    for page in &pages {
        let html = synth.render(template, page)?;
        write_file(&page.output_path, &html)?;
        links.push(format!("{}/{}", chapter.link, page_output_name(page.index)));
    }
    Ok(BuiltChapter {
        title: chapter.title.clone(),
        link: chapter.link.clone(),
        pages: links,
    })
}

/// `path` with references to renamed assets already rewritten.
fn load_template(path: &Path, renamed: &RenamedAssets) -> Result<Template, BuildError> {
    let template = Template::load(path)?;
    Ok(Template::new(renamed.rewrite(template.as_str())))
}

fn write_file(path: &Path, content: &str) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    fs::write(path, content).map_err(io_error(path))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Serialize the manifest, indenting nested levels with `indent`.
pub fn manifest_json(entries: &[ManifestEntry], indent: &str) -> Result<String, BuildError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    entries.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// ============================================================================
// Home page entries
// ============================================================================

fn chapter_link(chapter: &Chapter, icon: &str) -> Markup {
    let href = format!("./{}/{}", chapter.link, page_output_name(1));
    html! {
        p {
            a.no_decoration href=(href) {
                img.icon src=(icon);
                (chapter.title)
            }
        }
    }
}

fn empty_line() -> Markup {
    html! { p { (PreEscaped("&nbsp;")) } }
}

fn external_link(href: &str, icon: &str, label: &str) -> Markup {
    let external = href.starts_with("http://") || href.starts_with("https://");
    html! {
        p {
            a.no_decoration href=(href) target=[external.then_some("_blank")] {
                img.icon src=(icon);
                (label)
            }
        }
    }
}

// ============================================================================
// Check
// ============================================================================

/// A page as seen by [`check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedPage {
    pub index: usize,
    pub blocks: usize,
    pub images: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedChapter {
    pub title: String,
    pub link: String,
    pub pages: Vec<CheckedPage>,
}

/// Parse the index and every discovered page without writing anything.
pub fn check(config: &BlogConfig) -> Result<Vec<CheckedChapter>, BuildError> {
    let source_root = &config.source_root;
    let entries = blog::load_index(source_root).map_err(|source| BuildError::Index {
        path: source_root.join("index.xml"),
        source,
    })?;

    let mut chapters = Vec::new();
    for chapter in blog::chapters(&entries) {
        let mut pages = Vec::new();
        for page in page::discover_pages(source_root, &config.html_root, chapter) {
            let blocks = content::load_blocks(&page.source_path).map_err(|source| {
                PageError::Content {
                    path: page.source_path.clone(),
                    source,
                }
            })?;
            pages.push(CheckedPage {
                index: page.index,
                blocks: blocks.len(),
                images: blocks.iter().map(|b| b.images.len()).sum(),
            });
        }
        chapters.push(CheckedChapter {
            title: chapter.title.clone(),
            link: chapter.link.clone(),
            pages,
        });
    }
    Ok(chapters)
}
