//! Image dimension identification.
//!
//! Only the header is read; no pixel data is decoded.
//!
//! | Format | Crate / function |
//! |---|---|
//! | JPEG, PNG, TIFF, WebP, GIF | `image::image_dimensions` |
//! | AVIF | `avif-parse` container metadata |

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot read dimensions of {path}: {reason}")]
    Unreadable { path: String, reason: String },
    #[error("Image has a zero dimension: {0}")]
    Empty(String),
}

/// Pixel size of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

fn is_avif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("avif"))
}

/// Read an image's width and height.
///
/// Both dimensions are guaranteed positive; a zero-sized image is an error
/// rather than a value the row layout would have to divide by.
pub fn identify(path: &Path) -> Result<Dimensions, ImagingError> {
    let dims = if is_avif(path) {
        identify_avif(path)?
    } else {
        let (width, height) =
            image::image_dimensions(path).map_err(|e| ImagingError::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Dimensions { width, height }
    };
    if dims.width == 0 || dims.height == 0 {
        return Err(ImagingError::Empty(path.display().to_string()));
    }
    Ok(dims)
}

/// Extract dimensions from an AVIF file's container metadata.
fn identify_avif(path: &Path) -> Result<Dimensions, ImagingError> {
    let file_data = std::fs::read(path)?;
    let unreadable = |reason: String| ImagingError::Unreadable {
        path: path.display().to_string(),
        reason,
    };
    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(&file_data))
        .map_err(|e| unreadable(format!("{e:?}")))?;
    let meta = avif
        .primary_item_metadata()
        .map_err(|e| unreadable(format!("{e:?}")))?;
    Ok(Dimensions {
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}
