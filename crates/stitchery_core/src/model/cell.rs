//! One grid cell's worth of stitch fragments and the composition rules
//! that keep it legal.
//!
//! # Responsibility
//! - Insert fragments with same-floss merging and overwrite clipping.
//! - Delete fragments by exact shape or partial coverage subtraction.
//! - Keep the usage ledger in step with every change it makes.
//!
//! # Invariants
//! - No stored shape has a two-quadrant illegal mask; merge and subtract
//!   remainders are decomposed through [`Shape::resolve_coverage`].
//! - No quadrant is covered by more than one non-petite fragment.
//! - Petite fragments are independent overlays: never merged, never
//!   clipped, removed only by an exact shape match or a full-cell delete.

use crate::model::palette::{FlossKey, UsageLedger};
use crate::model::stitch::{Resolved, Shape, Stitch};
use serde::{Deserialize, Serialize};

/// Fragments occupying one cell. Storage order affects rendering
/// stacking only; composition is order-independent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StitchCell {
    stitches: Vec<Stitch>,
}

impl StitchCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stitches(&self) -> &[Stitch] {
        &self.stitches
    }

    pub fn len(&self) -> usize {
        self.stitches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stitches.is_empty()
    }

    /// Bitwise OR of all non-petite fragment coverages.
    pub fn aggregate_coverage(&self) -> u8 {
        self.stitches
            .iter()
            .fold(0, |acc, stitch| acc | stitch.shape.coverage())
    }

    /// Appends a fragment exactly as given, bypassing composition.
    ///
    /// Decode-only path: the codec replays fragments that were stored in
    /// already-composed form.
    pub(crate) fn push_decoded(&mut self, stitch: Stitch) {
        self.stitches.push(stitch);
    }

    /// Inserts a fragment, resolving conflicts with the existing content.
    ///
    /// Non-petite insertion first merges the incoming coverage with every
    /// existing non-petite fragment of the same floss, then clips or
    /// removes whatever the merged candidate overwrites. The ledger is
    /// adjusted for every fragment added or removed.
    pub fn insert(&mut self, shape: Shape, floss: FlossKey, ledger: &mut UsageLedger) {
        if shape.is_mini() {
            self.stitches.push(Stitch::new(shape, floss));
            ledger.add(floss, 1);
            return;
        }

        let mut candidate = shape.coverage();
        for stitch in &self.stitches {
            if !stitch.shape.is_mini() && stitch.floss == floss {
                candidate |= stitch.shape.coverage();
            }
        }

        let prior = std::mem::take(&mut self.stitches);
        self.push_resolved(candidate, floss, ledger);

        for stitch in prior {
            if stitch.shape.is_mini() {
                self.stitches.push(stitch);
                continue;
            }
            let coverage = stitch.shape.coverage();
            let interference = coverage & candidate;
            if interference == 0 {
                self.stitches.push(stitch);
                continue;
            }
            // Part or all of this fragment is overwritten; whatever
            // survives is re-added in legal form.
            ledger.remove(stitch.floss, 1);
            let remainder = coverage ^ interference;
            if remainder != 0 {
                self.push_resolved(remainder, stitch.floss, ledger);
            }
        }
    }

    /// Deletes fragments matching `target`, optionally restricted to one
    /// floss. An empty target removes every fragment passing the filter.
    ///
    /// A fragment equal to the target is removed outright. A non-petite
    /// fragment partially covered by a non-petite target has the target
    /// coverage subtracted and the remainder re-added in legal form.
    /// Returns whether anything was removed or clipped.
    pub fn delete(
        &mut self,
        target: Option<Shape>,
        floss_filter: Option<FlossKey>,
        ledger: &mut UsageLedger,
    ) -> bool {
        let passes = |stitch: &Stitch| floss_filter.map_or(true, |key| stitch.floss == key);

        let Some(target) = target else {
            let before = self.stitches.len();
            self.stitches.retain(|stitch| {
                if passes(stitch) {
                    ledger.remove(stitch.floss, 1);
                    false
                } else {
                    true
                }
            });
            return self.stitches.len() != before;
        };

        let mut changed = false;
        let prior = std::mem::take(&mut self.stitches);
        for stitch in prior {
            if !passes(&stitch) {
                self.stitches.push(stitch);
                continue;
            }
            if stitch.shape == target {
                ledger.remove(stitch.floss, 1);
                changed = true;
                continue;
            }
            if stitch.shape.is_mini() || target.is_mini() {
                self.stitches.push(stitch);
                continue;
            }
            let overlap = stitch.shape.coverage() & target.coverage();
            if overlap == 0 {
                self.stitches.push(stitch);
                continue;
            }
            ledger.remove(stitch.floss, 1);
            changed = true;
            let remainder = stitch.shape.coverage() & !target.coverage();
            if remainder != 0 {
                self.push_resolved(remainder, stitch.floss, ledger);
            }
        }
        changed
    }

    fn push_resolved(&mut self, coverage: u8, floss: FlossKey, ledger: &mut UsageLedger) {
        // Callers only pass non-empty nibbles, for which resolution is total.
        match Shape::resolve_coverage(coverage) {
            Some(Resolved::One(shape)) => {
                self.stitches.push(Stitch::new(shape, floss));
                ledger.add(floss, 1);
            }
            Some(Resolved::Split(a, b)) => {
                self.stitches.push(Stitch::new(a, floss));
                self.stitches.push(Stitch::new(b, floss));
                ledger.add(floss, 2);
            }
            None => debug_assert!(false, "unresolvable coverage nibble {coverage}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StitchCell;
    use crate::model::palette::UsageLedger;
    use crate::model::stitch::{Quadrant, Shape};

    fn masks(cell: &StitchCell) -> Vec<u8> {
        cell.stitches().iter().map(|s| s.shape.mask()).collect()
    }

    #[test]
    fn same_floss_quarters_merge_and_split_when_illegal() {
        let mut cell = StitchCell::new();
        let mut ledger = UsageLedger::new();
        cell.insert(Shape::Quarter(Quadrant::TopLeft), 1, &mut ledger);
        cell.insert(Shape::Quarter(Quadrant::TopRight), 1, &mut ledger);

        // TL | TR = 3 is illegal as a unit and must be stored as quarters.
        assert_eq!(cell.aggregate_coverage(), 3);
        assert_eq!(masks(&cell), vec![1, 2]);
        assert_eq!(ledger.count(1), 2);
    }

    #[test]
    fn same_floss_merge_to_half_is_kept_whole() {
        let mut cell = StitchCell::new();
        let mut ledger = UsageLedger::new();
        cell.insert(Shape::Quarter(Quadrant::TopRight), 1, &mut ledger);
        cell.insert(Shape::Quarter(Quadrant::BottomLeft), 1, &mut ledger);

        assert_eq!(masks(&cell), vec![6]);
        assert_eq!(ledger.count(1), 1);
    }

    #[test]
    fn other_floss_is_clipped_by_overwrite() {
        let mut cell = StitchCell::new();
        let mut ledger = UsageLedger::new();
        cell.insert(Shape::Full, 1, &mut ledger);
        cell.insert(Shape::Quarter(Quadrant::TopLeft), 2, &mut ledger);

        // Floss 1 loses TL and survives as the 14 three-quarter.
        assert_eq!(masks(&cell), vec![1, 14]);
        assert_eq!(ledger.count(1), 1);
        assert_eq!(ledger.count(2), 1);
        assert_eq!(cell.aggregate_coverage(), 15);
    }

    #[test]
    fn overwrite_remainder_splits_when_illegal() {
        let mut cell = StitchCell::new();
        let mut ledger = UsageLedger::new();
        cell.insert(Shape::Full, 1, &mut ledger);
        cell.insert(Shape::HalfForward, 2, &mut ledger);

        // 15 minus the 6 diagonal leaves 9, a legal half; but 15 minus a
        // TL three-quarter leaves 8. Use a shape whose remainder is
        // illegal: removing BL+BR coverage (12) leaves 3.
        let mut cell2 = StitchCell::new();
        let mut ledger2 = UsageLedger::new();
        cell2.insert(Shape::Full, 1, &mut ledger2);
        cell2.insert(Shape::Quarter(Quadrant::BottomLeft), 2, &mut ledger2);
        cell2.insert(Shape::Quarter(Quadrant::BottomRight), 3, &mut ledger2);

        assert!(masks(&cell2).contains(&1));
        assert!(masks(&cell2).contains(&2));
        assert_eq!(ledger2.count(1), 2);
        assert_eq!(cell2.aggregate_coverage(), 15);

        assert_eq!(masks(&cell), vec![6, 9]);
        assert_eq!(ledger.count(1), 1);
        assert_eq!(ledger.count(2), 1);
    }

    #[test]
    fn full_overwrite_removes_fragment() {
        let mut cell = StitchCell::new();
        let mut ledger = UsageLedger::new();
        cell.insert(Shape::Quarter(Quadrant::TopLeft), 1, &mut ledger);
        cell.insert(Shape::Full, 2, &mut ledger);

        assert_eq!(masks(&cell), vec![15]);
        assert_eq!(ledger.count(1), 0);
        assert_eq!(ledger.count(2), 1);
    }

    #[test]
    fn petites_stack_independently() {
        let mut cell = StitchCell::new();
        let mut ledger = UsageLedger::new();
        cell.insert(Shape::PetiteFull(Quadrant::TopLeft), 1, &mut ledger);
        cell.insert(Shape::Full, 2, &mut ledger);

        assert_eq!(cell.len(), 2);
        assert_eq!(ledger.count(1), 1);

        // Only an exact match removes the petite.
        assert!(!cell.delete(Some(Shape::PetiteHalf(Quadrant::TopLeft)), None, &mut ledger));
        assert!(cell.delete(Some(Shape::PetiteFull(Quadrant::TopLeft)), None, &mut ledger));
        assert_eq!(ledger.count(1), 0);
    }

    #[test]
    fn delete_subtracts_instead_of_xor() {
        let mut cell = StitchCell::new();
        let mut ledger = UsageLedger::new();
        cell.insert(Shape::HalfBackward, 1, &mut ledger);

        // Deleting the TL quarter from the 9 diagonal must leave exactly
        // BR, not TR|BR.
        assert!(cell.delete(Some(Shape::Quarter(Quadrant::TopLeft)), None, &mut ledger));
        assert_eq!(masks(&cell), vec![8]);
        assert_eq!(ledger.count(1), 1);
    }

    #[test]
    fn delete_remainder_splits_when_illegal() {
        let mut cell = StitchCell::new();
        let mut ledger = UsageLedger::new();
        cell.insert(Shape::Full, 1, &mut ledger);

        assert!(cell.delete(Some(Shape::HalfForward), None, &mut ledger));
        // 15 minus 6 leaves 9, stored whole.
        assert_eq!(masks(&cell), vec![9]);

        let mut cell2 = StitchCell::new();
        let mut ledger2 = UsageLedger::new();
        cell2.insert(Shape::Full, 1, &mut ledger2);
        assert!(cell2.delete(Some(Shape::Quarter(Quadrant::TopLeft)), None, &mut ledger2));
        // 15 minus 1 leaves 14, the BR three-quarter.
        assert_eq!(masks(&cell2), vec![14]);

        let mut cell3 = StitchCell::new();
        let mut ledger3 = UsageLedger::new();
        cell3.insert(Shape::ThreeQuarter(Quadrant::TopLeft), 1, &mut ledger3);
        assert!(cell3.delete(Some(Shape::Quarter(Quadrant::BottomLeft)), None, &mut ledger3));
        // 7 minus 4 leaves 3, which must split into two quarters.
        assert_eq!(masks(&cell3), vec![1, 2]);
        assert_eq!(ledger3.count(1), 2);
    }

    #[test]
    fn delete_absent_target_is_a_no_op() {
        let mut cell = StitchCell::new();
        let mut ledger = UsageLedger::new();
        cell.insert(Shape::Quarter(Quadrant::BottomRight), 1, &mut ledger);

        assert!(!cell.delete(Some(Shape::Quarter(Quadrant::TopLeft)), None, &mut ledger));
        assert_eq!(ledger.count(1), 1);
        assert_eq!(cell.len(), 1);
    }

    #[test]
    fn full_delete_honors_floss_filter() {
        let mut cell = StitchCell::new();
        let mut ledger = UsageLedger::new();
        cell.insert(Shape::Quarter(Quadrant::TopLeft), 1, &mut ledger);
        cell.insert(Shape::Quarter(Quadrant::TopRight), 2, &mut ledger);

        assert!(cell.delete(None, Some(1), &mut ledger));
        assert_eq!(ledger.count(1), 0);
        assert_eq!(ledger.count(2), 1);
        assert_eq!(cell.len(), 1);
    }
}
