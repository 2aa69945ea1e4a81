//! Stitch shapes and the quadrant-mask algebra behind them.
//!
//! # Responsibility
//! - Enumerate the closed set of legal stitch shapes as a tagged enum.
//! - Map shapes to and from their persisted byte masks.
//! - Decompose merge/subtract results into one or two legal shapes.
//!
//! # Invariants
//! - The two-quadrant masks 3, 5, 10 and 12 are not representable as a
//!   `Shape`; [`Shape::resolve_coverage`] splits them into two quarters.
//! - Mini (petite) shapes carry a position quadrant but contribute no
//!   quadrant coverage, so they never merge with or clip other shapes.

use crate::model::grid::SnapPoint;
use crate::model::palette::FlossKey;
use serde::{Deserialize, Serialize};

/// Flag bit marking a petite half stitch; the low nibble holds its quadrant.
pub const MINI_HALF_FLAG: u8 = 0x40;
/// Flag bit marking a petite full stitch.
pub const MINI_FULL_FLAG: u8 = 0x80;
/// Low nibble: which of the four quadrants a shape covers.
pub const COVERAGE_MASK: u8 = 0x0F;

/// One quarter of a stitch cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    /// Coverage bit for this quadrant.
    pub fn bit(self) -> u8 {
        match self {
            Quadrant::TopLeft => 1,
            Quadrant::TopRight => 2,
            Quadrant::BottomLeft => 4,
            Quadrant::BottomRight => 8,
        }
    }

    /// The diagonally opposite quadrant.
    pub fn opposite(self) -> Quadrant {
        match self {
            Quadrant::TopLeft => Quadrant::BottomRight,
            Quadrant::TopRight => Quadrant::BottomLeft,
            Quadrant::BottomLeft => Quadrant::TopRight,
            Quadrant::BottomRight => Quadrant::TopLeft,
        }
    }

    fn from_bit(bit: u8) -> Option<Quadrant> {
        match bit {
            1 => Some(Quadrant::TopLeft),
            2 => Some(Quadrant::TopRight),
            4 => Some(Quadrant::BottomLeft),
            8 => Some(Quadrant::BottomRight),
            _ => None,
        }
    }
}

/// A legal stitch shape.
///
/// Quadrant coverage masks: quarters are 1/2/4/8, the two half-cross
/// diagonals are 6 and 9, three-quarters are 7/11/13/14 (full minus the
/// quadrant opposite the named corner) and full is 15. Petite shapes use
/// the high flag bits plus a position quadrant and cover no quadrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Quarter(Quadrant),
    /// The `/` diagonal: top-right plus bottom-left.
    HalfForward,
    /// The `\` diagonal: top-left plus bottom-right.
    HalfBackward,
    /// Three quarters of the cell, named by its dominant corner.
    ThreeQuarter(Quadrant),
    Full,
    /// Petite half stitch confined to one quadrant.
    PetiteHalf(Quadrant),
    /// Petite full stitch confined to one quadrant.
    PetiteFull(Quadrant),
}

/// Result of resolving a coverage nibble into stored shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    One(Shape),
    /// An illegal two-quadrant composite split into its two quarters.
    Split(Shape, Shape),
}

impl Shape {
    /// The full persisted byte for this shape, including petite flags.
    pub fn mask(self) -> u8 {
        match self {
            Shape::Quarter(q) => q.bit(),
            Shape::HalfForward => 6,
            Shape::HalfBackward => 9,
            Shape::ThreeQuarter(q) => COVERAGE_MASK ^ q.opposite().bit(),
            Shape::Full => COVERAGE_MASK,
            Shape::PetiteHalf(q) => MINI_HALF_FLAG | q.bit(),
            Shape::PetiteFull(q) => MINI_FULL_FLAG | q.bit(),
        }
    }

    /// Quadrant coverage contributing to cell occupancy; zero for petites.
    pub fn coverage(self) -> u8 {
        if self.is_mini() {
            0
        } else {
            self.mask()
        }
    }

    pub fn is_mini(self) -> bool {
        matches!(self, Shape::PetiteHalf(_) | Shape::PetiteFull(_))
    }

    /// Parses a persisted shape byte, rejecting the empty mask, the
    /// illegal composites and malformed petite encodings.
    pub fn from_mask(mask: u8) -> Option<Shape> {
        let flags = mask & !COVERAGE_MASK;
        let nibble = mask & COVERAGE_MASK;
        match flags {
            0 => match nibble {
                1 | 2 | 4 | 8 => Quadrant::from_bit(nibble).map(Shape::Quarter),
                6 => Some(Shape::HalfForward),
                9 => Some(Shape::HalfBackward),
                7 | 11 | 13 | 14 => {
                    Quadrant::from_bit(COVERAGE_MASK ^ nibble).map(|q| Shape::ThreeQuarter(q.opposite()))
                }
                15 => Some(Shape::Full),
                _ => None,
            },
            MINI_HALF_FLAG => Quadrant::from_bit(nibble).map(Shape::PetiteHalf),
            MINI_FULL_FLAG => Quadrant::from_bit(nibble).map(Shape::PetiteFull),
            _ => None,
        }
    }

    /// Total function from a non-empty coverage nibble to storable shapes.
    ///
    /// The four illegal composites decompose into their two constituent
    /// quarters: 3 -> TL+TR, 5 -> TL+BL, 10 -> TR+BR, 12 -> BL+BR. Every
    /// other value in `1..=15` maps to exactly one shape. Returns `None`
    /// for zero or out-of-range input.
    pub fn resolve_coverage(nibble: u8) -> Option<Resolved> {
        let split = |a: Quadrant, b: Quadrant| {
            Some(Resolved::Split(Shape::Quarter(a), Shape::Quarter(b)))
        };
        match nibble {
            3 => split(Quadrant::TopLeft, Quadrant::TopRight),
            5 => split(Quadrant::TopLeft, Quadrant::BottomLeft),
            10 => split(Quadrant::TopRight, Quadrant::BottomRight),
            12 => split(Quadrant::BottomLeft, Quadrant::BottomRight),
            other => Shape::from_mask(other).map(Resolved::One),
        }
    }
}

/// One stitch fragment: a shape worked in one palette floss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stitch {
    pub shape: Shape,
    pub floss: FlossKey,
}

impl Stitch {
    pub fn new(shape: Shape, floss: FlossKey) -> Self {
        Self { shape, floss }
    }
}

/// A backstitch line between two snap points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backstitch {
    pub start: SnapPoint,
    pub end: SnapPoint,
    pub floss: FlossKey,
}

/// A french knot anchored on a snap point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Knot {
    pub position: SnapPoint,
    pub floss: FlossKey,
}

#[cfg(test)]
mod tests {
    use super::{Quadrant, Resolved, Shape};

    #[test]
    fn masks_cover_the_legal_set() {
        assert_eq!(Shape::Quarter(Quadrant::TopLeft).mask(), 1);
        assert_eq!(Shape::Quarter(Quadrant::BottomRight).mask(), 8);
        assert_eq!(Shape::HalfForward.mask(), 6);
        assert_eq!(Shape::HalfBackward.mask(), 9);
        assert_eq!(Shape::ThreeQuarter(Quadrant::TopLeft).mask(), 7);
        assert_eq!(Shape::ThreeQuarter(Quadrant::BottomRight).mask(), 14);
        assert_eq!(Shape::Full.mask(), 15);
        assert_eq!(Shape::PetiteHalf(Quadrant::TopRight).mask(), 0x42);
        assert_eq!(Shape::PetiteFull(Quadrant::BottomLeft).mask(), 0x84);
    }

    #[test]
    fn from_mask_round_trips_every_shape() {
        let mut shapes = vec![Shape::HalfForward, Shape::HalfBackward, Shape::Full];
        for q in Quadrant::ALL {
            shapes.push(Shape::Quarter(q));
            shapes.push(Shape::ThreeQuarter(q));
            shapes.push(Shape::PetiteHalf(q));
            shapes.push(Shape::PetiteFull(q));
        }
        for shape in shapes {
            assert_eq!(Shape::from_mask(shape.mask()), Some(shape));
        }
    }

    #[test]
    fn illegal_composites_are_unrepresentable() {
        for mask in [0u8, 3, 5, 10, 12] {
            assert_eq!(Shape::from_mask(mask), None);
        }
        // Petite bytes must carry exactly one quadrant bit and one flag.
        for mask in [0x40u8, 0x43, 0x80, 0x8C, 0xC1, 0x10] {
            assert_eq!(Shape::from_mask(mask), None);
        }
    }

    #[test]
    fn resolve_coverage_splits_illegal_composites() {
        let cases = [
            (3u8, Quadrant::TopLeft, Quadrant::TopRight),
            (5, Quadrant::TopLeft, Quadrant::BottomLeft),
            (10, Quadrant::TopRight, Quadrant::BottomRight),
            (12, Quadrant::BottomLeft, Quadrant::BottomRight),
        ];
        for (nibble, a, b) in cases {
            assert_eq!(
                Shape::resolve_coverage(nibble),
                Some(Resolved::Split(Shape::Quarter(a), Shape::Quarter(b)))
            );
        }
        assert_eq!(
            Shape::resolve_coverage(9),
            Some(Resolved::One(Shape::HalfBackward))
        );
        assert_eq!(Shape::resolve_coverage(0), None);
        assert_eq!(Shape::resolve_coverage(16), None);
    }

    #[test]
    fn petites_have_no_coverage() {
        for q in Quadrant::ALL {
            assert_eq!(Shape::PetiteHalf(q).coverage(), 0);
            assert_eq!(Shape::PetiteFull(q).coverage(), 0);
        }
        assert_eq!(Shape::ThreeQuarter(Quadrant::TopRight).coverage(), 11);
    }
}
