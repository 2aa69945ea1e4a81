//! Grid coordinate types.
//!
//! # Responsibility
//! - Address full cells (`CellCoord`) and double-resolution snap points
//!   (`SnapPoint`) on the pattern canvas.
//! - Provide the bounds checks used by every mutation entry point.
//!
//! # Invariants
//! - Cells are valid on `[0, width) x [0, height)`.
//! - Snap points are valid on `[0, 2*width] x [0, 2*height]`, inclusive,
//!   so lines and knots can anchor on the far cell corners.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A full-cell coordinate on the stitch grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellCoord {
    pub x: u32,
    pub y: u32,
}

impl CellCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Returns whether this cell lies inside a `width x height` canvas.
    pub fn in_bounds(self, width: u32, height: u32) -> bool {
        self.x < width && self.y < height
    }

    /// Row-major index used as the persisted cell key. Widened so the
    /// far corner of a maximal canvas cannot wrap.
    pub fn linear_index(self, width: u32) -> u64 {
        u64::from(self.y) * u64::from(width) + u64::from(self.x)
    }

    /// Inverse of [`CellCoord::linear_index`]. `width` must be non-zero
    /// and `index` must come from an in-bounds cell.
    pub fn from_linear_index(index: u64, width: u32) -> Self {
        Self {
            x: (index % u64::from(width)) as u32,
            y: (index / u64::from(width)) as u32,
        }
    }
}

// Row-major ordering keeps keyed iteration identical to ascending
// linear-index order, which the codec relies on for deterministic output.
impl Ord for CellCoord {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for CellCoord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A grid-intersection point at twice the cell resolution.
///
/// Snap `(2x, 2y)` is the top-left corner of cell `(x, y)`; odd
/// components land on cell centers and edge midpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapPoint {
    pub x: u32,
    pub y: u32,
}

impl SnapPoint {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Returns whether this snap point lies on a `width x height` canvas,
    /// including the far corner at `(2*width, 2*height)`.
    pub fn in_bounds(self, width: u32, height: u32) -> bool {
        u64::from(self.x) <= 2 * u64::from(width) && u64::from(self.y) <= 2 * u64::from(height)
    }
}

#[cfg(test)]
mod tests {
    use super::{CellCoord, SnapPoint};

    #[test]
    fn cell_bounds_are_exclusive() {
        assert!(CellCoord::new(99, 79).in_bounds(100, 80));
        assert!(!CellCoord::new(100, 0).in_bounds(100, 80));
        assert!(!CellCoord::new(0, 80).in_bounds(100, 80));
    }

    #[test]
    fn snap_bounds_are_inclusive() {
        assert!(SnapPoint::new(200, 160).in_bounds(100, 80));
        assert!(!SnapPoint::new(201, 0).in_bounds(100, 80));
        assert!(!SnapPoint::new(0, 161).in_bounds(100, 80));
    }

    #[test]
    fn linear_index_round_trips() {
        let cell = CellCoord::new(7, 3);
        let index = cell.linear_index(10);
        assert_eq!(index, 37);
        assert_eq!(CellCoord::from_linear_index(index, 10), cell);
    }

    #[test]
    fn linear_index_does_not_wrap_on_large_canvases() {
        let corner = CellCoord::new(69_999, 69_999);
        let index = corner.linear_index(70_000);
        assert_eq!(index, 4_899_999_999);
        assert!(index > u64::from(u32::MAX));
        assert_eq!(CellCoord::from_linear_index(index, 70_000), corner);
    }

    #[test]
    fn ordering_is_row_major() {
        let mut cells = vec![
            CellCoord::new(1, 1),
            CellCoord::new(0, 2),
            CellCoord::new(2, 0),
        ];
        cells.sort();
        assert_eq!(
            cells,
            vec![
                CellCoord::new(2, 0),
                CellCoord::new(1, 1),
                CellCoord::new(0, 2),
            ]
        );
    }
}
