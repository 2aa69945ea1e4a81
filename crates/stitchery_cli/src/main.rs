//! CLI probe for the pattern document core.
//!
//! # Responsibility
//! - Verify `stitchery_core` linkage without any GUI runtime.
//! - Summarize a pattern file through the real codec path.

use serde_json::json;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use stitchery_core::{Document, Floss, MemorySchemes};

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    match args.next() {
        None => {
            println!("stitchery_core version={}", stitchery_core::core_version());
            ExitCode::SUCCESS
        }
        Some(path) => match summarize(&path) {
            Ok(summary) => {
                println!("{summary}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("stitchery: {err}");
                ExitCode::FAILURE
            }
        },
    }
}

fn summarize(path: &str) -> Result<String, Box<dyn Error>> {
    let document = Document::load_from(Path::new(path), &builtin_schemes())?;
    let properties = document.properties();
    let summary = json!({
        "title": properties.title,
        "width": properties.width,
        "height": properties.height,
        "scheme": properties.scheme_name,
        "palette_entries": document.palette().len(),
        "stitches": document.canvas().stitch_count(),
        "backstitches": document.backstitches().len(),
        "knots": document.knots().len(),
        "background_images": document.background_images().len(),
    });
    Ok(summary.to_string())
}

/// Small built-in catalog so the probe can resolve common flosses; real
/// scheme libraries are provided by the embedding application.
fn builtin_schemes() -> MemorySchemes {
    let mut schemes = MemorySchemes::new();
    for (name, color) in [
        ("310", "#000000"),
        ("B5200", "#FFFFFF"),
        ("321", "#CE1938"),
        ("699", "#136C00"),
        ("797", "#13438D"),
        ("307", "#FFE600"),
    ] {
        schemes.insert("DMC", Floss::new(name, color));
    }
    schemes
}
