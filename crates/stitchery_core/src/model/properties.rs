//! Typed document properties.
//!
//! # Responsibility
//! - Hold every named property of the legacy format as a statically typed
//!   field with a fixed default, replacing the old name -> variant bag so
//!   an unknown-property lookup cannot exist.
//!
//! # Invariants
//! - `width`/`height` bound every cell and snap coordinate.
//! - `current_floss` is the implicit floss for mutations that take none.

use crate::model::palette::FlossKey;
use serde::{Deserialize, Serialize};

/// Canvas metadata, editor preferences and the load-bearing dimensions.
///
/// Field declaration order is the encoding order of the version-10
/// properties block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternProperties {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub author: String,
    pub copyright: String,
    pub fabric: String,
    /// `#RRGGBB` hex string.
    pub fabric_color: String,
    pub instructions: String,
    /// Name of the thread scheme palette entries resolve against.
    pub scheme_name: String,
    pub current_floss: Option<FlossKey>,
    pub cell_width: u32,
    pub cell_height: u32,
    pub cell_horizontal_grouping: u32,
    pub cell_vertical_grouping: u32,
    pub horizontal_cloth_count: f64,
    pub vertical_cloth_count: f64,
    pub cloth_count_units: String,
    pub thick_line_width: u32,
    pub thin_line_width: u32,
    pub thick_line_color: String,
    pub thin_line_color: String,
    pub format_scales_as: String,
    pub show_stitches_as: String,
    pub show_backstitches_as: String,
    pub show_knots_as: String,
    pub show_palette_symbols: bool,
    pub paint_background_images: bool,
    pub paint_grid: bool,
    pub paint_stitches: bool,
    pub paint_backstitches: bool,
    pub paint_french_knots: bool,
}

impl Default for PatternProperties {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
            title: String::new(),
            author: String::new(),
            copyright: String::new(),
            fabric: String::new(),
            fabric_color: "#FFFFFF".to_string(),
            instructions: String::new(),
            scheme_name: "DMC".to_string(),
            current_floss: None,
            cell_width: 8,
            cell_height: 8,
            cell_horizontal_grouping: 10,
            cell_vertical_grouping: 10,
            horizontal_cloth_count: 14.0,
            vertical_cloth_count: 14.0,
            cloth_count_units: "inches".to_string(),
            thick_line_width: 2,
            thin_line_width: 1,
            thick_line_color: "#000000".to_string(),
            thin_line_color: "#808080".to_string(),
            format_scales_as: "stitches".to_string(),
            show_stitches_as: "stitches".to_string(),
            show_backstitches_as: "color_lines".to_string(),
            show_knots_as: "color_blocks".to_string(),
            show_palette_symbols: false,
            paint_background_images: true,
            paint_grid: true,
            paint_stitches: true,
            paint_backstitches: true,
            paint_french_knots: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PatternProperties;

    #[test]
    fn defaults_give_a_usable_new_document() {
        let properties = PatternProperties::default();
        assert_eq!(properties.width, 100);
        assert_eq!(properties.height, 100);
        assert_eq!(properties.current_floss, None);
        assert_eq!(properties.scheme_name, "DMC");
        assert!(properties.paint_grid);
    }
}
