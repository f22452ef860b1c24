//! # Font Tables
//!
//! Reading the sfnt container and rebuilding the tables a subset needs.
//!
//! Only TrueType outlines (`glyf`/`loca`) are handled. Tables that don't
//! depend on which glyphs survive are copied from the source untouched.

pub mod assemble;
pub mod checksum;
pub mod cmap;
pub mod directory;
pub mod glyf;
pub mod subset;

pub use assemble::{assemble_font, TableProfile};
pub use checksum::{checksum, BinarySearchParams};
pub use cmap::{build_cmap, CmapTable};
pub use directory::{read_directory, TableDirectory, TableEntry, Tag};
pub use glyf::{build_glyph_tables, read_loca, resolve_closure, ClosureLimits, LocaFormat, LocaTable};
pub use subset::{SubsetOutput, Subsetter};

use checksum::pad4;

/// A table built in memory for the output font.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTable {
    pub tag: Tag,
    /// Table bytes, zero-padded to a multiple of 4.
    pub data: Vec<u8>,
    /// Unpadded length recorded in the table directory.
    pub length: u32,
}

impl BuiltTable {
    /// Wrap `data`, padding it and remembering its real length.
    pub fn new(tag: Tag, mut data: Vec<u8>) -> Self {
        let length = data.len() as u32;
        data.resize(pad4(data.len()), 0);
        BuiltTable { tag, data, length }
    }

    /// Wrap a buffer that was allocated padded, holding `length` real bytes.
    pub fn from_padded(tag: Tag, data: Vec<u8>, length: usize) -> Self {
        debug_assert!(data.len() % 4 == 0 && length <= data.len());
        BuiltTable {
            tag,
            data,
            length: length as u32,
        }
    }

    pub fn checksum(&self) -> u32 {
        checksum(&self.data)
    }
}
