//! # blogbake
//!
//! Turns a hand-authored blog, stored as XML chapters and pages, into a static
//! HTML site. The author writes an `index.xml` listing chapters and a folder of
//! numbered `page{n}.xml` files per chapter; blogbake produces the linked HTML
//! pages, a home page, a JSON manifest of every page and a stylesheet sizing
//! the image rows.
//!
//! # Pipeline
//!
//! ```text
//! content/images/**       lowercase file names
//! content/{css,script}/   →  dist/{css,script}/   (cache-busting names)
//! content/index.xml       →  dist/index.html
//! content/<ch>/page{n}.xml →  dist/<ch>/page{n}.html  (+ images they use)
//!                          →  dist/script/availablePages.json
//!                          →  dist/css/layout.css
//! ```
//!
//! One [`build::build`] call is one run: the image cache, the asset rename map
//! and the collected layout rules are plain values owned by that call.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`build`] | Orchestrates a run; writes the home page, manifest and layout CSS |
//! | [`blog`] | `index.xml` → chapter, spacer and link entries |
//! | [`content`] | Page XML → blocks of images and text |
//! | [`page`] | Page discovery, navigation state and HTML synthesis |
//! | [`layout`] | Proportional widths for rows of images |
//! | [`resolve`] | Finds images by name, copies them, returns relative links |
//! | [`imaging`] | Reads image dimensions from file headers |
//! | [`assets`] | Two-phase cache-busting rename and copy of static folders |
//! | [`template`] | Splices generated markup into the authored HTML templates |
//! | [`xml`] | Element tree over `quick-xml` shared by the XML readers |
//! | [`naming`] | Page file names, busted names, image name lowercasing |
//! | [`config`] | `blog.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Authored Templates, Generated Fragments
//!
//! The site's look belongs to the author: `index.html` and `page.html` are
//! ordinary HTML files in the source tree. Only the fragments blogbake adds
//! (navigation, content blocks, home entries) are built with
//! [Maud](https://maud.lambda.xyz/), so every interpolated string is escaped.
//!
//! ## Shared Layout Classes
//!
//! A row's widths are reduced to small integer shares, so every row with the
//! same proportions uses the same class (`scale2-5-2`) and the generated
//! stylesheet holds one rule per distinct proportion, not one per image.
//!
//! ## Content Hash Tokens
//!
//! Cache-busting names use a prefix of the file's SHA-256 rather than a random
//! token: a rebuild without changes produces the same names, and deploys only
//! invalidate what changed.

pub mod assets;
pub mod blog;
pub mod build;
pub mod config;
pub mod content;
pub mod imaging;
pub mod layout;
pub mod naming;
pub mod output;
pub mod page;
pub mod resolve;
pub mod template;
pub mod xml;

#[cfg(test)]
pub(crate) mod test_helpers;
