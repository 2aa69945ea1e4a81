//! Core document model for a cross-stitch pattern editor.
//!
//! This crate is the single source of truth for the pattern's business
//! invariants: the stitch-cell composition algebra, the palette and its
//! usage ledger, the document aggregate's mutation API and the versioned
//! binary codec. Rendering, dialogs and scheme libraries live in the
//! embedding application and consume this API.

pub mod codec;
pub mod document;
pub mod logging;
pub mod model;
pub mod scheme;
pub mod undo;

pub use codec::{CodecError, CodecResult, FORMAT_VERSION};
pub use document::{Document, DocumentError, DocumentResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::background::{BackgroundImage, ImageRect};
pub use model::canvas::Canvas;
pub use model::cell::StitchCell;
pub use model::grid::{CellCoord, SnapPoint};
pub use model::palette::{Floss, FlossKey, Palette, PaletteEntry, UsageLedger};
pub use model::properties::PatternProperties;
pub use model::stitch::{Backstitch, Knot, Quadrant, Resolved, Shape, Stitch};
pub use scheme::{FlossSchemes, MemorySchemes};
pub use undo::{EditOp, MemoryRecorder, NullRecorder, TransactionRecorder};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
