//! # sfnt-subset
//!
//! TrueType font subsetting for document embedding.
//!
//! Given a source font and the glyph IDs a document uses, produce a
//! standalone font that carries only those glyphs (plus whatever composite
//! glyphs they are built from), optionally with a fresh `cmap` describing
//! the document's characters.
//!
//! ## Architecture
//!
//! ```text
//! FontSource (file, memory, container region)
//!       ↓
//!   [directory]  sfnt header + table records
//!       ↓
//!   [glyf]       loca, composite closure, rebuilt glyf/loca
//!       ↓
//!   [cmap]       format 4 (+ format 12) from the codepoint map
//!       ↓
//!   [assemble]   directory, checksums, table bodies
//! ```
//!
//! Locating the font, deciding which glyphs are used and embedding the
//! result are left to the caller.

pub mod error;
pub mod font;
pub mod options;
pub mod source;

use std::collections::BTreeMap;
use std::io::Cursor;

pub use error::{Result, SubsetError};
pub use font::{SubsetOutput, Subsetter, TableProfile};
pub use options::SubsetOptions;
pub use source::{FileSource, FontSource, ReaderSource};

/// Subset a font held in memory.
///
/// This is the convenience entry point. `cmap` is only used when the
/// options' profile includes a `cmap` table.
pub fn subset_font(
    data: &[u8],
    glyphs: impl IntoIterator<Item = u16>,
    cmap: Option<&BTreeMap<u32, u16>>,
    options: &SubsetOptions,
) -> Result<Vec<u8>> {
    let mut source = ReaderSource::new("<memory>", Cursor::new(data));
    let mut subsetter = Subsetter::new(&mut source, options.clone()).glyphs(glyphs);
    if let Some(map) = cmap {
        subsetter = subsetter.cmap(map.iter().map(|(&c, &g)| (c, g)));
    }
    Ok(subsetter.process()?.font)
}
