//! Pattern document aggregate.
//!
//! # Responsibility
//! - Own properties, palette, ledger, canvas and background images.
//! - Provide the sole mutation entry points for canvas changes, with
//!   coordinate validation and atomic ledger upkeep.
//! - Report each successful mutation to the attached transaction
//!   recorder and track the modified flag for save/load.
//!
//! # Invariants
//! - A rejected mutation leaves every owned structure untouched.
//! - `usage(key)` always equals the count a canvas rescan would produce.
//! - A failed load never replaces a live document; loading returns a
//!   fresh aggregate or an error.

use crate::codec::{self, CodecResult};
use crate::model::background::{BackgroundImage, ImageRect};
use crate::model::canvas::Canvas;
use crate::model::cell::StitchCell;
use crate::model::grid::{CellCoord, SnapPoint};
use crate::model::palette::{FlossKey, Palette, PaletteEntry, UsageLedger};
use crate::model::properties::PatternProperties;
use crate::model::stitch::{Backstitch, Knot, Shape};
use crate::scheme::FlossSchemes;
use crate::undo::{EditOp, NullRecorder, TransactionRecorder};
use log::info;
use std::cell::RefCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::rc::Rc;

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Local validation failures; the mutation is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentError {
    InvalidCell(CellCoord),
    InvalidSnap(SnapPoint),
    NoFlossSelected,
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCell(cell) => {
                write!(f, "cell ({}, {}) is outside the canvas", cell.x, cell.y)
            }
            Self::InvalidSnap(snap) => {
                write!(f, "snap point ({}, {}) is outside the canvas", snap.x, snap.y)
            }
            Self::NoFlossSelected => write!(f, "no current floss is selected"),
        }
    }
}

impl Error for DocumentError {}

/// The in-memory pattern: one aggregate per open document.
pub struct Document {
    properties: PatternProperties,
    palette: Palette,
    usage: UsageLedger,
    canvas: Canvas,
    background_images: Vec<BackgroundImage>,
    recorder: Rc<RefCell<dyn TransactionRecorder>>,
    modified: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

// Manual impl: the recorder is a trait object and has no useful Debug.
impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("properties", &self.properties)
            .field("palette", &self.palette)
            .field("usage", &self.usage)
            .field("canvas", &self.canvas)
            .field("background_images", &self.background_images)
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Creates an empty document with default properties and no recorder.
    pub fn new() -> Self {
        Self::from_parts(
            PatternProperties::default(),
            Palette::new(),
            Canvas::new(),
            Vec::new(),
        )
    }

    pub(crate) fn from_parts(
        properties: PatternProperties,
        palette: Palette,
        canvas: Canvas,
        background_images: Vec<BackgroundImage>,
    ) -> Self {
        let usage = canvas.recount_usage();
        Self {
            properties,
            palette,
            usage,
            canvas,
            background_images,
            recorder: Rc::new(RefCell::new(NullRecorder)),
            modified: false,
        }
    }

    /// Attaches the host's transaction recorder. The document reports
    /// into it but does not manage its lifecycle.
    pub fn set_recorder(&mut self, recorder: Rc<RefCell<dyn TransactionRecorder>>) {
        self.recorder = recorder;
    }

    // ---- properties ----------------------------------------------------

    pub fn properties(&self) -> &PatternProperties {
        &self.properties
    }

    /// Replaces the property set and marks the document modified.
    pub fn set_properties(&mut self, properties: PatternProperties) {
        self.properties = properties;
        self.modified = true;
    }

    pub fn width(&self) -> u32 {
        self.properties.width
    }

    pub fn height(&self) -> u32 {
        self.properties.height
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    // ---- palette and ledger --------------------------------------------

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn floss(&self, key: FlossKey) -> Option<&PaletteEntry> {
        self.palette.get(key)
    }

    /// Reference count for `key` across stitches, backstitches and knots.
    pub fn usage(&self, key: FlossKey) -> u32 {
        self.usage.count(key)
    }

    /// The full derived ledger; always equals `canvas().recount_usage()`.
    pub fn usage_ledger(&self) -> &UsageLedger {
        &self.usage
    }

    pub fn current_floss(&self) -> Option<FlossKey> {
        self.properties.current_floss
    }

    /// Adds a palette entry; usable before any stitch references it.
    pub fn add_floss(&mut self, key: FlossKey, entry: PaletteEntry) {
        self.palette.insert(key, entry);
        self.modified = true;
    }

    /// Makes `key` the implicit floss for subsequent mutations.
    pub fn select_floss(&mut self, key: FlossKey) {
        self.properties.current_floss = Some(key);
        self.commit(EditOp::SelectFloss { floss: key });
    }

    /// Explicitly prunes palette entries with zero usage. Never called
    /// implicitly, so pre-added flosses survive normal editing.
    pub fn clear_unused_flosses(&mut self) {
        let usage = &self.usage;
        let before = self.palette.len();
        self.palette.retain(|key, _| usage.count(key) > 0);
        if self.palette.len() != before {
            self.modified = true;
        }
    }

    // ---- canvas queries ------------------------------------------------

    pub fn stitches_at(&self, cell: CellCoord) -> Option<&StitchCell> {
        self.canvas.stitches_at(cell)
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn backstitches(&self) -> &[Backstitch] {
        self.canvas.backstitches()
    }

    pub fn knots(&self) -> &[Knot] {
        self.canvas.knots()
    }

    // ---- canvas mutations ----------------------------------------------

    /// Inserts a stitch at `cell` using the current floss.
    pub fn add_stitch(&mut self, cell: CellCoord, shape: Shape) -> DocumentResult<()> {
        let floss = self.require_current_floss()?;
        self.validate_cell(cell)?;
        self.canvas.insert_stitch(cell, shape, floss, &mut self.usage);
        self.commit(EditOp::AddStitch { cell, shape, floss });
        Ok(())
    }

    /// Deletes stitches at `cell` matching `target` (or all of them when
    /// `target` is `None`), optionally restricted to one floss. Returns
    /// whether anything changed.
    pub fn delete_stitches(
        &mut self,
        cell: CellCoord,
        target: Option<Shape>,
        floss_filter: Option<FlossKey>,
    ) -> DocumentResult<bool> {
        self.validate_cell(cell)?;
        let changed = self
            .canvas
            .delete_stitches(cell, target, floss_filter, &mut self.usage);
        if changed {
            self.commit(EditOp::DeleteStitches {
                cell,
                target,
                floss_filter,
            });
        }
        Ok(changed)
    }

    pub fn add_backstitch(&mut self, start: SnapPoint, end: SnapPoint) -> DocumentResult<()> {
        let floss = self.require_current_floss()?;
        self.validate_snap(start)?;
        self.validate_snap(end)?;
        self.canvas.add_backstitch(start, end, floss, &mut self.usage);
        self.commit(EditOp::AddBackstitch { start, end, floss });
        Ok(())
    }

    /// Removes the first backstitch with these endpoints passing the
    /// filter; no-op returning `false` when none matches.
    pub fn delete_backstitch(
        &mut self,
        start: SnapPoint,
        end: SnapPoint,
        floss_filter: Option<FlossKey>,
    ) -> bool {
        let changed = self
            .canvas
            .remove_backstitch(start, end, floss_filter, &mut self.usage);
        if changed {
            self.commit(EditOp::DeleteBackstitch {
                start,
                end,
                floss_filter,
            });
        }
        changed
    }

    pub fn add_knot(&mut self, position: SnapPoint) -> DocumentResult<()> {
        let floss = self.require_current_floss()?;
        self.validate_snap(position)?;
        self.canvas.add_knot(position, floss, &mut self.usage);
        self.commit(EditOp::AddKnot { position, floss });
        Ok(())
    }

    /// Removes every knot at `position` passing the filter.
    pub fn delete_knots(&mut self, position: SnapPoint, floss_filter: Option<FlossKey>) -> bool {
        let changed = self
            .canvas
            .remove_knots(position, floss_filter, &mut self.usage);
        if changed {
            self.commit(EditOp::DeleteKnots {
                position,
                floss_filter,
            });
        }
        changed
    }

    // ---- background images ---------------------------------------------

    pub fn background_images(&self) -> &[BackgroundImage] {
        &self.background_images
    }

    pub fn add_background_image(&mut self, image: BackgroundImage) {
        self.background_images.push(image);
        self.modified = true;
    }

    /// Removes the first background image with this URL.
    pub fn remove_background_image(&mut self, url: &str) -> bool {
        match self.background_images.iter().position(|i| i.url == url) {
            Some(index) => {
                self.background_images.remove(index);
                self.modified = true;
                true
            }
            None => false,
        }
    }

    pub fn fit_background_image(&mut self, url: &str, location: ImageRect) -> bool {
        match self.background_images.iter_mut().find(|i| i.url == url) {
            Some(image) => {
                image.location = location;
                self.modified = true;
                true
            }
            None => false,
        }
    }

    pub fn show_background_image(&mut self, url: &str, visible: bool) -> bool {
        match self.background_images.iter_mut().find(|i| i.url == url) {
            Some(image) => {
                image.visible = visible;
                self.modified = true;
                true
            }
            None => false,
        }
    }

    // ---- persistence ----------------------------------------------------

    /// Encodes the document in the current format version. The modified
    /// flag clears only on success; a failed save keeps the document
    /// dirty.
    pub fn save_to(&mut self, path: &Path) -> CodecResult<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        codec::encode(self, &mut writer)?;
        self.modified = false;
        info!(
            "event=document_saved module=document status=ok path={}",
            path.display()
        );
        Ok(())
    }

    /// Decodes a document from `path`. Errors leave any live document the
    /// caller holds untouched; the result is a fresh aggregate with no
    /// recorder attached.
    pub fn load_from(path: &Path, schemes: &dyn FlossSchemes) -> CodecResult<Document> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let document = codec::decode(&mut reader, schemes)?;
        info!(
            "event=document_loaded module=document status=ok path={} cells={}",
            path.display(),
            document.canvas.cells().count()
        );
        Ok(document)
    }

    // ---- internals -------------------------------------------------------

    fn validate_cell(&self, cell: CellCoord) -> DocumentResult<()> {
        if cell.in_bounds(self.properties.width, self.properties.height) {
            Ok(())
        } else {
            Err(DocumentError::InvalidCell(cell))
        }
    }

    fn validate_snap(&self, snap: SnapPoint) -> DocumentResult<()> {
        if snap.in_bounds(self.properties.width, self.properties.height) {
            Ok(())
        } else {
            Err(DocumentError::InvalidSnap(snap))
        }
    }

    fn require_current_floss(&self) -> DocumentResult<FlossKey> {
        self.properties
            .current_floss
            .ok_or(DocumentError::NoFlossSelected)
    }

    fn commit(&mut self, op: EditOp) {
        self.recorder.borrow_mut().record(&op);
        self.modified = true;
    }
}
