//! Versioned binary codec for the pattern document.
//!
//! # Responsibility
//! - Encode the current format version and decode the supported set.
//! - Keep decoding all-or-nothing: any mid-section failure aborts the
//!   load with nothing partially applied.
//!
//! # Invariants
//! - Only version 10 is written; versions 9 and 10 are read.
//! - Keyed sections (palette, cells) encode in ascending key order, so an
//!   encode followed by a decode reproduces an equivalent document.
//! - The usage ledger is never trusted from the stream; it is rebuilt by
//!   rescanning the decoded canvas.

mod stream;

pub use stream::{StreamReader, StreamWriter};

use crate::document::Document;
use crate::model::background::{BackgroundImage, ImageRect};
use crate::model::canvas::Canvas;
use crate::model::cell::StitchCell;
use crate::model::grid::{CellCoord, SnapPoint};
use crate::model::palette::{Palette, PaletteEntry};
use crate::model::properties::PatternProperties;
use crate::model::stitch::{Backstitch, Knot, Shape, Stitch};
use crate::scheme::{resolve_or_placeholder, FlossSchemes};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, Read, Write};

/// Leading token identifying a pattern stream.
pub const MAGIC: &[u8; 9] = b"Stitchery";
/// The only version [`encode`] emits.
pub const FORMAT_VERSION: u16 = 10;
/// Oldest version [`decode`] still understands.
pub const OLDEST_SUPPORTED_VERSION: u16 = 9;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug)]
pub enum CodecError {
    Io(io::Error),
    /// The stream does not start with the magic token.
    BadMagic,
    /// The version is outside the supported decode set.
    UnsupportedVersion(u16),
    /// The stream ended or was malformed inside a section; nothing was
    /// applied.
    CorruptSection {
        section: &'static str,
        detail: String,
    },
}

impl CodecError {
    pub(crate) fn corrupt(section: &'static str, detail: impl Into<String>) -> Self {
        Self::CorruptSection {
            section,
            detail: detail.into(),
        }
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::BadMagic => write!(f, "not a pattern file: magic token missing"),
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported pattern format version {version}")
            }
            Self::CorruptSection { section, detail } => {
                write!(f, "corrupt pattern file in {section} section: {detail}")
            }
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for CodecError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Encodes `document` as a version-10 stream.
pub fn encode(document: &Document, writer: impl Write) -> CodecResult<()> {
    let mut w = StreamWriter::new(writer);
    w.raw(MAGIC)?;
    w.u16(FORMAT_VERSION)?;

    write_properties(&mut w, document.properties())?;
    write_palette(&mut w, document.palette())?;
    write_cells(&mut w, document.canvas(), document.properties().width)?;
    write_backstitches(&mut w, document.backstitches())?;
    write_knots(&mut w, document.knots())?;
    write_background_images(&mut w, document.background_images())?;

    w.flush()
}

/// Decodes a document, dispatching on the stored format version.
///
/// Floss names are resolved against `schemes`; unknown names degrade to
/// placeholder flosses rather than failing the load.
pub fn decode(reader: impl Read, schemes: &dyn FlossSchemes) -> CodecResult<Document> {
    let mut r = StreamReader::new(reader);

    // A short read here means the stream is not a pattern file, but real
    // transport errors must stay I/O errors.
    let magic: [u8; 9] = r.exact().map_err(|err| match err {
        CodecError::Io(inner) => CodecError::Io(inner),
        _ => CodecError::BadMagic,
    })?;
    if &magic != MAGIC {
        return Err(CodecError::BadMagic);
    }

    let version = r.u16()?;
    debug!("event=decode_start module=codec status=ok version={version}");
    match version {
        9 => decode_v9(&mut r, schemes),
        10 => decode_v10(&mut r, schemes),
        other => Err(CodecError::UnsupportedVersion(other)),
    }
}

// ---- version decoders ---------------------------------------------------

fn decode_v9(
    r: &mut StreamReader<impl Read>,
    schemes: &dyn FlossSchemes,
) -> CodecResult<Document> {
    r.enter("properties");
    let mut properties = PatternProperties::default();
    properties.width = r.u32()?;
    properties.height = r.u32()?;
    properties.title = r.string()?;
    properties.author = r.string()?;
    properties.copyright = r.string()?;
    properties.fabric = r.string()?;
    properties.fabric_color = r.string()?;
    properties.instructions = r.string()?;
    properties.scheme_name = r.string()?;
    // Display preferences were introduced after version 9; defaults apply.

    let palette = read_palette(r, schemes, &properties.scheme_name)?;
    properties.current_floss = read_current_floss(r)?;

    // Version 9 carried an explicit usage section. The counts are derived
    // data, so they are read for stream position only and rebuilt from
    // the canvas below.
    r.enter("usage");
    let mut stored_usage = r.u32()?;
    while stored_usage > 0 {
        let _key = r.u32()?;
        let _count = r.u32()?;
        stored_usage -= 1;
    }

    let canvas = read_canvas(r, properties.width, properties.height)?;
    let background_images = read_background_images(r)?;

    Ok(Document::from_parts(
        properties,
        palette,
        canvas,
        background_images,
    ))
}

fn decode_v10(
    r: &mut StreamReader<impl Read>,
    schemes: &dyn FlossSchemes,
) -> CodecResult<Document> {
    let properties = read_properties(r)?;
    let palette = read_palette(r, schemes, &properties.scheme_name)?;
    let canvas = read_canvas(r, properties.width, properties.height)?;
    let background_images = read_background_images(r)?;

    Ok(Document::from_parts(
        properties,
        palette,
        canvas,
        background_images,
    ))
}

// ---- properties ---------------------------------------------------------

fn write_properties(
    w: &mut StreamWriter<impl Write>,
    properties: &PatternProperties,
) -> CodecResult<()> {
    w.u32(properties.width)?;
    w.u32(properties.height)?;
    w.string(&properties.title)?;
    w.string(&properties.author)?;
    w.string(&properties.copyright)?;
    w.string(&properties.fabric)?;
    w.string(&properties.fabric_color)?;
    w.string(&properties.instructions)?;
    w.string(&properties.scheme_name)?;
    write_floss_index(w, properties.current_floss)?;
    w.u32(properties.cell_width)?;
    w.u32(properties.cell_height)?;
    w.u32(properties.cell_horizontal_grouping)?;
    w.u32(properties.cell_vertical_grouping)?;
    w.f64(properties.horizontal_cloth_count)?;
    w.f64(properties.vertical_cloth_count)?;
    w.string(&properties.cloth_count_units)?;
    w.u32(properties.thick_line_width)?;
    w.u32(properties.thin_line_width)?;
    w.string(&properties.thick_line_color)?;
    w.string(&properties.thin_line_color)?;
    w.string(&properties.format_scales_as)?;
    w.string(&properties.show_stitches_as)?;
    w.string(&properties.show_backstitches_as)?;
    w.string(&properties.show_knots_as)?;
    w.bool(properties.show_palette_symbols)?;
    w.bool(properties.paint_background_images)?;
    w.bool(properties.paint_grid)?;
    w.bool(properties.paint_stitches)?;
    w.bool(properties.paint_backstitches)?;
    w.bool(properties.paint_french_knots)
}

fn read_properties(r: &mut StreamReader<impl Read>) -> CodecResult<PatternProperties> {
    r.enter("properties");
    Ok(PatternProperties {
        width: r.u32()?,
        height: r.u32()?,
        title: r.string()?,
        author: r.string()?,
        copyright: r.string()?,
        fabric: r.string()?,
        fabric_color: r.string()?,
        instructions: r.string()?,
        scheme_name: r.string()?,
        current_floss: read_floss_index(r)?,
        cell_width: r.u32()?,
        cell_height: r.u32()?,
        cell_horizontal_grouping: r.u32()?,
        cell_vertical_grouping: r.u32()?,
        horizontal_cloth_count: r.f64()?,
        vertical_cloth_count: r.f64()?,
        cloth_count_units: r.string()?,
        thick_line_width: r.u32()?,
        thin_line_width: r.u32()?,
        thick_line_color: r.string()?,
        thin_line_color: r.string()?,
        format_scales_as: r.string()?,
        show_stitches_as: r.string()?,
        show_backstitches_as: r.string()?,
        show_knots_as: r.string()?,
        show_palette_symbols: r.bool()?,
        paint_background_images: r.bool()?,
        paint_grid: r.bool()?,
        paint_stitches: r.bool()?,
        paint_backstitches: r.bool()?,
        paint_french_knots: r.bool()?,
    })
}

/// Current floss persists as a signed index; -1 means none selected.
fn write_floss_index(
    w: &mut StreamWriter<impl Write>,
    index: Option<u32>,
) -> CodecResult<()> {
    match index {
        Some(key) => w.i32(key as i32),
        None => w.i32(-1),
    }
}

fn read_floss_index(r: &mut StreamReader<impl Read>) -> CodecResult<Option<u32>> {
    let raw = r.i32()?;
    if raw < 0 {
        Ok(None)
    } else {
        Ok(Some(raw as u32))
    }
}

// ---- palette ------------------------------------------------------------

fn write_palette(w: &mut StreamWriter<impl Write>, palette: &Palette) -> CodecResult<()> {
    w.u32(palette.len() as u32)?;
    for (key, entry) in palette.iter() {
        w.u32(key)?;
        w.string(&entry.floss.name)?;
        w.char(entry.symbol)?;
        w.u8(entry.stitch_strands)?;
        w.u8(entry.backstitch_strands)?;
    }
    Ok(())
}

fn read_palette(
    r: &mut StreamReader<impl Read>,
    schemes: &dyn FlossSchemes,
    scheme_name: &str,
) -> CodecResult<Palette> {
    r.enter("palette");
    let mut palette = Palette::new();
    let count = r.u32()?;
    for _ in 0..count {
        let key = r.u32()?;
        let name = r.string()?;
        let symbol = r.char()?;
        let stitch_strands = r.u8()?;
        let backstitch_strands = r.u8()?;
        let floss = resolve_or_placeholder(schemes, scheme_name, &name);
        palette.insert(
            key,
            PaletteEntry {
                floss,
                symbol,
                stitch_strands,
                backstitch_strands,
            },
        );
    }
    Ok(palette)
}

fn read_current_floss(r: &mut StreamReader<impl Read>) -> CodecResult<Option<u32>> {
    r.enter("current_floss");
    read_floss_index(r)
}

// ---- canvas -------------------------------------------------------------

fn write_cells(
    w: &mut StreamWriter<impl Write>,
    canvas: &Canvas,
    width: u32,
) -> CodecResult<()> {
    let cells: Vec<_> = canvas.cells().collect();
    w.u32(cells.len() as u32)?;
    for (coord, cell) in cells {
        let index = coord.linear_index(width);
        let index = u32::try_from(index).map_err(|_| {
            CodecError::corrupt("cells", format!("cell index {index} exceeds the storable range"))
        })?;
        w.u32(index)?;
        w.u32(cell.len() as u32)?;
        for stitch in cell.stitches() {
            w.u8(stitch.shape.mask())?;
            w.u32(stitch.floss)?;
        }
    }
    Ok(())
}

fn read_canvas(
    r: &mut StreamReader<impl Read>,
    width: u32,
    height: u32,
) -> CodecResult<Canvas> {
    let mut canvas = Canvas::new();

    r.enter("cells");
    let cell_count = r.u32()?;
    if cell_count > 0 && (width == 0 || height == 0) {
        return Err(CodecError::corrupt(
            "cells",
            "stitch cells present on a zero-sized canvas",
        ));
    }
    for _ in 0..cell_count {
        let index = r.u32()?;
        if u64::from(index) >= u64::from(width) * u64::from(height) {
            return Err(CodecError::corrupt(
                "cells",
                format!("cell index {index} outside {width}x{height} canvas"),
            ));
        }
        let coord = CellCoord::from_linear_index(u64::from(index), width);
        let mut cell = StitchCell::new();
        let fragment_count = r.u32()?;
        for _ in 0..fragment_count {
            let mask = r.u8()?;
            let shape = Shape::from_mask(mask).ok_or_else(|| {
                CodecError::corrupt("cells", format!("illegal shape mask {mask:#04x}"))
            })?;
            let floss = r.u32()?;
            cell.push_decoded(Stitch::new(shape, floss));
        }
        canvas.set_cell_decoded(coord, cell);
    }

    r.enter("backstitches");
    let line_count = r.u32()?;
    for _ in 0..line_count {
        let start = SnapPoint::new(r.u32()?, r.u32()?);
        let end = SnapPoint::new(r.u32()?, r.u32()?);
        let floss = r.u32()?;
        canvas.push_backstitch_decoded(Backstitch { start, end, floss });
    }

    r.enter("knots");
    let knot_count = r.u32()?;
    for _ in 0..knot_count {
        let position = SnapPoint::new(r.u32()?, r.u32()?);
        let floss = r.u32()?;
        canvas.push_knot_decoded(Knot { position, floss });
    }

    Ok(canvas)
}

fn write_backstitches(
    w: &mut StreamWriter<impl Write>,
    backstitches: &[Backstitch],
) -> CodecResult<()> {
    w.u32(backstitches.len() as u32)?;
    for line in backstitches {
        w.u32(line.start.x)?;
        w.u32(line.start.y)?;
        w.u32(line.end.x)?;
        w.u32(line.end.y)?;
        w.u32(line.floss)?;
    }
    Ok(())
}

fn write_knots(w: &mut StreamWriter<impl Write>, knots: &[Knot]) -> CodecResult<()> {
    w.u32(knots.len() as u32)?;
    for knot in knots {
        w.u32(knot.position.x)?;
        w.u32(knot.position.y)?;
        w.u32(knot.floss)?;
    }
    Ok(())
}

// ---- background images --------------------------------------------------

fn write_background_images(
    w: &mut StreamWriter<impl Write>,
    images: &[BackgroundImage],
) -> CodecResult<()> {
    w.u32(images.len() as u32)?;
    for image in images {
        w.string(&image.url)?;
        w.i32(image.location.x)?;
        w.i32(image.location.y)?;
        w.u32(image.location.width)?;
        w.u32(image.location.height)?;
        w.bool(image.visible)?;
        w.blob(&image.image)?;
        w.blob(&image.icon)?;
    }
    Ok(())
}

fn read_background_images(
    r: &mut StreamReader<impl Read>,
) -> CodecResult<Vec<BackgroundImage>> {
    r.enter("background_images");
    let count = r.u32()?;
    let mut images = Vec::new();
    for _ in 0..count {
        let url = r.string()?;
        let location = ImageRect::new(r.i32()?, r.i32()?, r.u32()?, r.u32()?);
        let visible = r.bool()?;
        let image = r.blob()?;
        let icon = r.blob()?;
        images.push(BackgroundImage {
            url,
            location,
            visible,
            image,
            icon,
        });
    }
    Ok(images)
}
