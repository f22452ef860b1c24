//! # TrueType Font Subsetter
//!
//! Strips a TrueType font down to the glyphs a document actually uses.
//!
//! Unlike a renumbering subsetter, glyph IDs are preserved: the rebuilt
//! `loca` still has one entry per original glyph, with dropped glyphs
//! collapsed to zero length. Content streams and width arrays that refer
//! to original glyph IDs keep working against the subset.
//!
//! ## Approach
//!
//! 1. Read the table directory
//! 2. Read `loca` and close the glyph set over composite references
//! 3. Rebuild `glyf` and `loca` with only the retained outlines
//! 4. Optionally rebuild `cmap` from the document's codepoint map
//! 5. Assemble the output with fresh checksums and directory search fields
//!
//! Each stage is a plain function taking what it needs and returning what it
//! built; [`Subsetter::process`] just threads the results through in order.

use std::collections::{BTreeMap, BTreeSet};

use super::assemble::{assemble_font, output_tags};
use super::cmap::build_cmap;
use super::directory::{read_directory, Tag};
use super::glyf::{build_glyph_tables, read_loca, resolve_closure};
use crate::error::Result;
use crate::options::SubsetOptions;
use crate::source::{FontSource, SourceGuard};

/// Result of subsetting a font.
#[derive(Debug, Clone)]
pub struct SubsetOutput {
    /// The subset font file.
    pub font: Vec<u8>,
    /// Retained glyph IDs after closure, ascending. Always includes 0.
    pub glyphs: Vec<u16>,
    /// Tables in the output, in directory order.
    pub tables: Vec<Tag>,
    /// The rebuilt `cmap` carries a format-12 subtable.
    pub cmap_extended: bool,
}

/// A single subsetting request over a font source.
pub struct Subsetter<'a, S: FontSource + ?Sized> {
    source: &'a mut S,
    options: SubsetOptions,
    glyphs: BTreeSet<u16>,
    cmap: Option<BTreeMap<u32, u16>>,
}

impl<'a, S: FontSource + ?Sized> Subsetter<'a, S> {
    pub fn new(source: &'a mut S, options: SubsetOptions) -> Self {
        Subsetter {
            source,
            options,
            glyphs: BTreeSet::new(),
            cmap: None,
        }
    }

    /// Add glyph IDs the document uses.
    pub fn glyphs(mut self, glyphs: impl IntoIterator<Item = u16>) -> Self {
        self.glyphs.extend(glyphs);
        self
    }

    /// Codepoint → glyph map for the rebuilt `cmap`. Ignored unless the
    /// profile includes `cmap`.
    pub fn cmap(mut self, map: impl IntoIterator<Item = (u32, u16)>) -> Self {
        self.cmap.get_or_insert_with(BTreeMap::new).extend(map);
        self
    }

    /// Run the pipeline. The source is reopened first and closed before
    /// this returns, whether or not subsetting succeeded.
    pub fn process(self) -> Result<SubsetOutput> {
        let Subsetter {
            source,
            options,
            glyphs,
            cmap,
        } = self;
        let font = source.name().to_string();
        let mut source = SourceGuard::open(source)?;

        let directory = read_directory(
            &mut *source,
            &font,
            options.directory_offset,
            options.directory_relative,
        )?;
        let loca = read_loca(&mut *source, &directory, &font)?;
        let retained = resolve_closure(
            &mut *source,
            &directory,
            &loca,
            &font,
            glyphs,
            options.closure_limits(),
        )?;
        let glyph_tables = build_glyph_tables(&mut *source, &directory, &loca, &retained, &font)?;

        let new_cmap = if options.profile.includes_cmap() {
            cmap.as_ref().and_then(build_cmap)
        } else {
            None
        };
        let cmap_extended = new_cmap.as_ref().is_some_and(|c| c.extended);

        let mut built = vec![glyph_tables.glyf, glyph_tables.loca.to_bytes()];
        built.extend(new_cmap.map(|c| c.table));

        let tables = output_tags(&directory, options.profile, &built);
        let data = assemble_font(&mut *source, &directory, options.profile, &built, &font)?;

        log::debug!(
            "{}: subset keeps {} glyphs in {} bytes",
            font,
            retained.len(),
            data.len()
        );
        Ok(SubsetOutput {
            font: data,
            glyphs: retained,
            tables,
            cmap_extended,
        })
    }
}
