//! Background reference image descriptors.
//!
//! Raster and icon payloads are opaque blobs to this crate: copied and
//! moved whole, never decoded or partially mutated.

use serde::{Deserialize, Serialize};

/// Placement rectangle in cell coordinates; may extend past the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl ImageRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A reference photo traced under the canvas while designing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundImage {
    pub url: String,
    pub location: ImageRect,
    pub visible: bool,
    /// Raster payload, opaque to the document core.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub image: Vec<u8>,
    /// Thumbnail payload, opaque to the document core.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub icon: Vec<u8>,
}

impl BackgroundImage {
    pub fn new(url: impl Into<String>, location: ImageRect) -> Self {
        Self {
            url: url.into(),
            location,
            visible: true,
            image: Vec::new(),
            icon: Vec::new(),
        }
    }
}
