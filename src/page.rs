//! Chapter pages: discovery, navigation and HTML synthesis.
//!
//! A chapter's pages are `page1.xml`, `page2.xml`, … in the chapter folder,
//! found by probing the filesystem from 1 upwards until a number is missing.
//! Each becomes `page{n}.html` in the mirrored output folder, built from the
//! blog's `page.html` template:
//!
//! - `<title>` and `p#title` get the chapter title, with the page number when
//!   the chapter has more than one page. `p#title` also shows the chapter icon.
//! - Navigation depends on whether neighbouring pages exist ([`NavState`]).
//! - `div#content` receives one `div.container` per content block.
//!
//! ## Navigation
//!
//! ```text
//! NoPrevNoNext   p#title … a.float-right → ../index.html
//! otherwise      p#title
//!                p.flex  a.left (← page n-1)  a.center → ../index.html  a.right (→ page n+1)
//! ```
//!
//! Unused slots in the bar keep their place with the empty icon and no link.

use crate::blog::Chapter;
use crate::config::IconsConfig;
use crate::content::{self, ContentBlock, ContentError, ImageRef, Placement};
use crate::layout::{self, LayoutError, LayoutRules};
use crate::naming::{page_output_name, page_source_name, parse_page_index};
use crate::resolve::{ImageResolver, ResolveError};
use crate::template::{Template, TemplateError};
use maud::{Markup, html};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("{path}: {source}")]
    Content {
        path: PathBuf,
        source: ContentError,
    },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Which neighbours of a page exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    NoPrevNoNext,
    HasPrevOnly,
    HasNextOnly,
    HasBoth,
}

impl NavState {
    pub fn new(has_prev: bool, has_next: bool) -> Self {
        match (has_prev, has_next) {
            (false, false) => NavState::NoPrevNoNext,
            (true, false) => NavState::HasPrevOnly,
            (false, true) => NavState::HasNextOnly,
            (true, true) => NavState::HasBoth,
        }
    }

    pub fn has_prev(self) -> bool {
        matches!(self, NavState::HasPrevOnly | NavState::HasBoth)
    }

    pub fn has_next(self) -> bool {
        matches!(self, NavState::HasNextOnly | NavState::HasBoth)
    }
}

/// One discovered page of a chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub chapter: Chapter,
    /// 1-based position in the chapter.
    pub index: usize,
    pub has_prev: bool,
    pub has_next: bool,
    pub source_path: PathBuf,
    pub output_path: PathBuf,
}

impl Page {
    pub fn nav_state(&self) -> NavState {
        NavState::new(self.has_prev, self.has_next)
    }

    /// `"{title} {n}"`, or just the chapter title for a single-page chapter.
    pub fn title(&self) -> String {
        if self.has_prev || self.has_next {
            format!("{} {}", self.chapter.title, self.index)
        } else {
            self.chapter.title.clone()
        }
    }
}

/// Probe `page1.xml`, `page2.xml`, … in the chapter folder.
pub fn discover_pages(source_root: &Path, html_root: &Path, chapter: &Chapter) -> Vec<Page> {
    let source_dir = source_root.join(&chapter.link);
    let output_dir = html_root.join(&chapter.link);
    let exists = |index: usize| index >= 1 && source_dir.join(page_source_name(index)).is_file();

    let mut pages = Vec::new();
    let mut index = 1;
    while exists(index) {
        pages.push(Page {
            chapter: chapter.clone(),
            index,
            has_prev: exists(index - 1),
            has_next: exists(index + 1),
            source_path: source_dir.join(page_source_name(index)),
            output_path: output_dir.join(page_output_name(index)),
        });
        index += 1;
    }
    warn_unreachable(&source_dir, pages.len());
    pages
}

/// Log page files numbered past the first gap; they are never published.
fn warn_unreachable(source_dir: &Path, discovered: usize) {
    let Ok(entries) = fs::read_dir(source_dir) else {
        return;
    };
    let mut stray: Vec<usize> = entries
        .flatten()
        .filter_map(|e| parse_page_index(&e.file_name().to_string_lossy()))
        .filter(|&n| n > discovered + 1)
        .collect();
    stray.sort_unstable();
    for n in stray {
        log::warn!(
            "{} is not reachable: page{} is missing",
            source_dir.join(page_source_name(n)).display(),
            discovered + 1
        );
    }
}

/// A slot of the navigation bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavSlot {
    pub href: Option<String>,
    pub icon: String,
}

/// Resolved navigation for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// A single link home, placed inside `p#title`.
    HomeOnly { icon: String },
    /// A three-slot bar placed after `p#title`.
    Bar {
        left: NavSlot,
        center: NavSlot,
        right: NavSlot,
    },
}

impl Navigation {
    pub fn markup(&self) -> Markup {
        match self {
            Navigation::HomeOnly { icon } => html! {
                a.float-right href="../index.html" { img.icon src=(icon); }
            },
            Navigation::Bar {
                left,
                center,
                right,
            } => html! {
                p.flex {
                    a.left href=[left.href.as_deref()] { img.icon src=(left.icon); }
                    a.center href=[center.href.as_deref()] { img.icon src=(center.icon); }
                    a.right href=[right.href.as_deref()] { img.icon src=(right.icon); }
                }
            },
        }
    }

    fn apply(&self, template: &mut Template) -> Result<(), TemplateError> {
        let markup = self.markup().into_string();
        match self {
            Navigation::HomeOnly { .. } => template.append_to("title", &markup),
            Navigation::Bar { .. } => template.insert_after("title", &markup),
        }
    }
}

/// Renders pages, sharing the run's image cache and layout rules.
pub struct PageSynthesizer<'a> {
    resolver: &'a mut ImageResolver,
    rules: &'a mut LayoutRules,
    icons: &'a IconsConfig,
}

impl<'a> PageSynthesizer<'a> {
    pub fn new(
        resolver: &'a mut ImageResolver,
        rules: &'a mut LayoutRules,
        icons: &'a IconsConfig,
    ) -> Self {
        Self {
            resolver,
            rules,
            icons,
        }
    }

    /// Render `page` into a copy of `template`.
    pub fn render(&mut self, template: &Template, page: &Page) -> Result<String, PageError> {
        let blocks = content::load_blocks(&page.source_path).map_err(|source| {
            PageError::Content {
                path: page.source_path.clone(),
                source,
            }
        })?;
        let document = &page.output_path;
        let title = page.title();

        let mut html = template.clone();
        html.set_title(&title)?;
        let icon = self.resolver.resolve_icon(&page.chapter.icon, document)?;
        html.append_to("title", &title_markup(&icon, &title).into_string())?;
        self.navigation(page)?.apply(&mut html)?;

        let mut body = String::new();
        for block in &blocks {
            if let Some(markup) = self.render_block(block, document)? {
                body.push_str(&markup.into_string());
            }
        }
        html.append_to("content", &body)?;
        Ok(html.into_string())
    }

    /// Resolve the icons the page's navigation needs.
    pub fn navigation(&mut self, page: &Page) -> Result<Navigation, ResolveError> {
        let document = &page.output_path;
        let state = page.nav_state();
        if state == NavState::NoPrevNoNext {
            return Ok(Navigation::HomeOnly {
                icon: self.resolver.resolve_icon(&self.icons.home, document)?,
            });
        }

        let left = if state.has_prev() {
            NavSlot {
                href: Some(format!("./{}", page_output_name(page.index - 1))),
                icon: self.resolver.resolve_icon(&self.icons.previous, document)?,
            }
        } else {
            self.empty_slot(document)?
        };
        let center = NavSlot {
            href: Some("../index.html".to_string()),
            icon: self.resolver.resolve_icon(&self.icons.home, document)?,
        };
        let right = if state.has_next() {
            NavSlot {
                href: Some(format!("./{}", page_output_name(page.index + 1))),
                icon: self.resolver.resolve_icon(&self.icons.next, document)?,
            }
        } else {
            self.empty_slot(document)?
        };
        Ok(Navigation::Bar {
            left,
            center,
            right,
        })
    }

    fn empty_slot(&mut self, document: &Path) -> Result<NavSlot, ResolveError> {
        Ok(NavSlot {
            href: None,
            icon: self.resolver.resolve_icon(&self.icons.empty, document)?,
        })
    }

    /// Markup for one block, or `None` when it has nothing to show.
    pub fn render_block(
        &mut self,
        block: &ContentBlock,
        document: &Path,
    ) -> Result<Option<Markup>, PageError> {
        let text = block.paragraph();

        if block.is_trailing() {
            let row = self.row(&block.images, document)?;
            return Ok(Some(html! { div.container.last { (row) } }));
        }

        let markup = match block.placement() {
            Placement::None if text.is_empty() => return Ok(None),
            Placement::None => html! {
                div.container { p.body { (text) } }
            },
            Placement::Inline(image) => {
                let src = self.resolver.resolve(&image.file_name, document)?;
                let location = image.location.as_deref().unwrap_or_default().trim();
                html! {
                    div.container {
                        p.body {
                            span class=(format!("image-{location}")) {
                                img.zoom.scale src=(src) alt=[image.alt.as_deref()];
                            }
                            (text)
                        }
                    }
                }
            }
            Placement::Row(images) => {
                let row = self.row(images, document)?;
                html! {
                    div.container {
                        (row)
                        @if !text.is_empty() {
                            p.body { (text) }
                        }
                    }
                }
            }
        };
        Ok(Some(markup))
    }

    /// A `div.flex` row of images with proportional widths.
    fn row(&mut self, images: &[ImageRef], document: &Path) -> Result<Markup, PageError> {
        let mut sources = Vec::with_capacity(images.len());
        let mut dimensions = Vec::with_capacity(images.len());
        for image in images {
            sources.push(self.resolver.resolve(&image.file_name, document)?);
            dimensions.push(self.resolver.dimensions(&image.file_name)?);
        }
        let classes: Vec<String> = layout::layout(&dimensions)?
            .iter()
            .map(|unit| self.rules.register(unit))
            .collect();

        Ok(html! {
            div.flex {
                @for ((image, src), class) in images.iter().zip(&sources).zip(&classes) {
                    div class=(class) {
                        img.zoom.scale src=(src) alt=[image.alt.as_deref()];
                    }
                }
            }
        })
    }
}

fn title_markup(icon: &str, title: &str) -> Markup {
    html! {
        img.icon src=(icon);
        (title)
    }
}
