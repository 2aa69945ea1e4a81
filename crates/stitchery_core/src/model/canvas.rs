//! Sparse canvas store for stitches, backstitches and knots.
//!
//! # Responsibility
//! - Own the per-cell fragment map and the line/point overlay lists.
//! - Create cells lazily and prune them when their last fragment goes.
//! - Rebuild the usage ledger by rescanning everything it holds.
//!
//! # Invariants
//! - Every stored cell is non-empty.
//! - Callers validate coordinates; the canvas trusts them.

use crate::model::cell::StitchCell;
use crate::model::grid::{CellCoord, SnapPoint};
use crate::model::palette::{FlossKey, UsageLedger};
use crate::model::stitch::{Backstitch, Knot, Shape};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    cells: BTreeMap<CellCoord, StitchCell>,
    backstitches: Vec<Backstitch>,
    knots: Vec<Knot>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stitches_at(&self, cell: CellCoord) -> Option<&StitchCell> {
        self.cells.get(&cell)
    }

    /// Iterates cells in ascending row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, &StitchCell)> {
        self.cells.iter().map(|(coord, cell)| (*coord, cell))
    }

    pub fn backstitches(&self) -> &[Backstitch] {
        &self.backstitches
    }

    pub fn knots(&self) -> &[Knot] {
        &self.knots
    }

    pub fn insert_stitch(
        &mut self,
        cell: CellCoord,
        shape: Shape,
        floss: FlossKey,
        ledger: &mut UsageLedger,
    ) {
        self.cells
            .entry(cell)
            .or_default()
            .insert(shape, floss, ledger);
    }

    /// Delegates to [`StitchCell::delete`] and prunes the cell when it
    /// ends up empty. Returns whether anything changed.
    pub fn delete_stitches(
        &mut self,
        cell: CellCoord,
        target: Option<Shape>,
        floss_filter: Option<FlossKey>,
        ledger: &mut UsageLedger,
    ) -> bool {
        let Some(entry) = self.cells.get_mut(&cell) else {
            return false;
        };
        let changed = entry.delete(target, floss_filter, ledger);
        if entry.is_empty() {
            self.cells.remove(&cell);
        }
        changed
    }

    pub fn add_backstitch(
        &mut self,
        start: SnapPoint,
        end: SnapPoint,
        floss: FlossKey,
        ledger: &mut UsageLedger,
    ) {
        self.backstitches.push(Backstitch { start, end, floss });
        ledger.add(floss, 1);
    }

    /// Removes the first backstitch with exactly these endpoints that
    /// passes the floss filter. Endpoints do not match reversed.
    pub fn remove_backstitch(
        &mut self,
        start: SnapPoint,
        end: SnapPoint,
        floss_filter: Option<FlossKey>,
        ledger: &mut UsageLedger,
    ) -> bool {
        let position = self.backstitches.iter().position(|line| {
            line.start == start
                && line.end == end
                && floss_filter.map_or(true, |key| line.floss == key)
        });
        match position {
            Some(index) => {
                let line = self.backstitches.remove(index);
                ledger.remove(line.floss, 1);
                true
            }
            None => false,
        }
    }

    pub fn add_knot(&mut self, position: SnapPoint, floss: FlossKey, ledger: &mut UsageLedger) {
        self.knots.push(Knot { position, floss });
        ledger.add(floss, 1);
    }

    /// Removes every knot at `position` passing the floss filter.
    pub fn remove_knots(
        &mut self,
        position: SnapPoint,
        floss_filter: Option<FlossKey>,
        ledger: &mut UsageLedger,
    ) -> bool {
        let before = self.knots.len();
        self.knots.retain(|knot| {
            if knot.position == position && floss_filter.map_or(true, |key| knot.floss == key) {
                ledger.remove(knot.floss, 1);
                false
            } else {
                true
            }
        });
        self.knots.len() != before
    }

    /// Rebuilds the usage ledger from scratch by scanning every stitch,
    /// backstitch and knot. The live ledger must always equal this.
    pub fn recount_usage(&self) -> UsageLedger {
        let mut ledger = UsageLedger::new();
        for cell in self.cells.values() {
            for stitch in cell.stitches() {
                ledger.add(stitch.floss, 1);
            }
        }
        for line in &self.backstitches {
            ledger.add(line.floss, 1);
        }
        for knot in &self.knots {
            ledger.add(knot.floss, 1);
        }
        ledger
    }

    /// Total number of stitch fragments across all cells.
    pub fn stitch_count(&self) -> usize {
        self.cells.values().map(StitchCell::len).sum()
    }

    pub(crate) fn set_cell_decoded(&mut self, coord: CellCoord, cell: StitchCell) {
        if !cell.is_empty() {
            self.cells.insert(coord, cell);
        }
    }

    pub(crate) fn push_backstitch_decoded(&mut self, line: Backstitch) {
        self.backstitches.push(line);
    }

    pub(crate) fn push_knot_decoded(&mut self, knot: Knot) {
        self.knots.push(knot);
    }
}

#[cfg(test)]
mod tests {
    use super::Canvas;
    use crate::model::grid::{CellCoord, SnapPoint};
    use crate::model::palette::UsageLedger;
    use crate::model::stitch::{Quadrant, Shape};

    #[test]
    fn cells_are_created_lazily_and_pruned_when_empty() {
        let mut canvas = Canvas::new();
        let mut ledger = UsageLedger::new();
        let cell = CellCoord::new(2, 2);

        assert!(canvas.stitches_at(cell).is_none());
        canvas.insert_stitch(cell, Shape::Full, 1, &mut ledger);
        assert!(canvas.stitches_at(cell).is_some());

        assert!(canvas.delete_stitches(cell, None, None, &mut ledger));
        assert!(canvas.stitches_at(cell).is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn backstitch_removal_matches_first_exact_endpoints() {
        let mut canvas = Canvas::new();
        let mut ledger = UsageLedger::new();
        let a = SnapPoint::new(0, 0);
        let b = SnapPoint::new(4, 2);
        canvas.add_backstitch(a, b, 1, &mut ledger);
        canvas.add_backstitch(a, b, 2, &mut ledger);

        // Reversed endpoints do not match.
        assert!(!canvas.remove_backstitch(b, a, None, &mut ledger));
        // Filtered removal skips the first line and takes the second.
        assert!(canvas.remove_backstitch(a, b, Some(2), &mut ledger));
        assert_eq!(canvas.backstitches().len(), 1);
        assert_eq!(canvas.backstitches()[0].floss, 1);
    }

    #[test]
    fn knot_removal_takes_all_matches() {
        let mut canvas = Canvas::new();
        let mut ledger = UsageLedger::new();
        let p = SnapPoint::new(3, 3);
        canvas.add_knot(p, 1, &mut ledger);
        canvas.add_knot(p, 1, &mut ledger);
        canvas.add_knot(p, 2, &mut ledger);
        canvas.add_knot(SnapPoint::new(5, 5), 1, &mut ledger);

        assert!(canvas.remove_knots(p, Some(1), &mut ledger));
        assert_eq!(canvas.knots().len(), 2);
        assert_eq!(ledger.count(1), 1);
        assert_eq!(ledger.count(2), 1);
    }

    #[test]
    fn recount_matches_live_ledger() {
        let mut canvas = Canvas::new();
        let mut ledger = UsageLedger::new();
        canvas.insert_stitch(CellCoord::new(0, 0), Shape::Full, 1, &mut ledger);
        canvas.insert_stitch(
            CellCoord::new(0, 0),
            Shape::Quarter(Quadrant::TopLeft),
            2,
            &mut ledger,
        );
        canvas.add_backstitch(SnapPoint::new(0, 0), SnapPoint::new(2, 2), 1, &mut ledger);
        canvas.add_knot(SnapPoint::new(1, 1), 3, &mut ledger);
        canvas.delete_stitches(
            CellCoord::new(0, 0),
            Some(Shape::Quarter(Quadrant::TopLeft)),
            None,
            &mut ledger,
        );

        assert_eq!(canvas.recount_usage(), ledger);
    }
}
