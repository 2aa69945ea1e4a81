//! Canonical domain model for the pattern document.
//!
//! # Responsibility
//! - Define the data structures and composition algebra the document
//!   aggregate and codec are built on.
//!
//! # Invariants
//! - Illegal two-quadrant shapes are unrepresentable in stored state.
//! - The usage ledger stays reconstructible from the canvas alone.

pub mod background;
pub mod canvas;
pub mod cell;
pub mod grid;
pub mod palette;
pub mod properties;
pub mod stitch;
