//! Page image probing.
//!
//! The compiler itself never decodes images. Sizing the eventual document
//! needs each page's pixel dimensions, which come from an [`ImageBackend`].
//! The production [`RustBackend`] reads image headers with the `image` crate,
//! so no pixel data is decoded.
//!
//! Page sizes in points follow from the document DPI:
//! `points = pixels * 72 / dpi`. At the default 72 DPI one pixel is one point.

use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, instrument};

/// Resolution used when neither the caller nor the root override sets one.
pub const DEFAULT_DPI: u32 = 72;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Cannot identify {}: {reason}", path.display())]
    Identify { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Source of image dimensions.
pub trait ImageBackend: Sync {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;
}

/// Reads dimensions from image headers via the `image` crate.
pub struct RustBackend;

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) =
            image::image_dimensions(path).map_err(|e| BackendError::Identify {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(Dimensions { width, height })
    }
}

/// A page's pixel size and its size in points at the document DPI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSize {
    pub width_px: u32,
    pub height_px: u32,
    pub width_pt: f64,
    pub height_pt: f64,
}

impl PageSize {
    pub fn from_dimensions(dims: Dimensions, dpi: u32) -> Self {
        let scale = 72.0 / f64::from(dpi.max(1));
        Self {
            width_px: dims.width,
            height_px: dims.height,
            width_pt: f64::from(dims.width) * scale,
            height_pt: f64::from(dims.height) * scale,
        }
    }
}

/// Identify every page in parallel. Results keep page order.
#[instrument(skip(backend, pages), fields(pages = pages.len()))]
pub fn probe_pages(
    backend: &impl ImageBackend,
    pages: &[PathBuf],
    dpi: u32,
) -> Result<Vec<PageSize>, BackendError> {
    pages
        .par_iter()
        .map(|path| {
            let dims = backend.identify(path)?;
            debug!(path = %path.display(), width = dims.width, height = dims.height, "Identified page");
            Ok(PageSize::from_dimensions(dims, dpi))
        })
        .collect()
}
