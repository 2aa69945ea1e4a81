//! Transaction recorder seam for the host application's undo/redo stack.
//!
//! # Responsibility
//! - Describe each successful document mutation as an [`EditOp`].
//! - Let the embedding application collect them without this crate
//!   owning the undo stack's lifecycle.

use crate::model::grid::{CellCoord, SnapPoint};
use crate::model::palette::FlossKey;
use crate::model::stitch::Shape;
use serde::{Deserialize, Serialize};

/// One undoable document mutation, reported after it succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum EditOp {
    AddStitch {
        cell: CellCoord,
        shape: Shape,
        floss: FlossKey,
    },
    DeleteStitches {
        cell: CellCoord,
        target: Option<Shape>,
        floss_filter: Option<FlossKey>,
    },
    AddBackstitch {
        start: SnapPoint,
        end: SnapPoint,
        floss: FlossKey,
    },
    DeleteBackstitch {
        start: SnapPoint,
        end: SnapPoint,
        floss_filter: Option<FlossKey>,
    },
    AddKnot {
        position: SnapPoint,
        floss: FlossKey,
    },
    DeleteKnots {
        position: SnapPoint,
        floss_filter: Option<FlossKey>,
    },
    SelectFloss {
        floss: FlossKey,
    },
}

/// Collector the document aggregate reports successful mutations to.
pub trait TransactionRecorder {
    fn record(&mut self, op: &EditOp);

    /// Called when the recorded history becomes stale, e.g. after a load
    /// replaces the document the recorder was attached to.
    fn reset(&mut self) {}
}

/// Default recorder that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

impl TransactionRecorder for NullRecorder {
    fn record(&mut self, _op: &EditOp) {}
}

/// Keeps every reported op in order; used by tests and simple hosts.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecorder {
    pub ops: Vec<EditOp>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionRecorder for MemoryRecorder {
    fn record(&mut self, op: &EditOp) {
        self.ops.push(op.clone());
    }

    fn reset(&mut self) {
        self.ops.clear();
    }
}
