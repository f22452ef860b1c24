//! # Font Assembler
//!
//! Lays out the output font: sfnt header, table directory, then the table
//! bodies in the profile's fixed tag order. Rebuilt tables come from memory;
//! everything else is copied from the source at its recorded offset.
//!
//! The output buffer is allocated zeroed at its final size, so the padding
//! between 4-byte aligned table bodies never needs writing.

use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use super::checksum::{pad4, BinarySearchParams};
use super::directory::{TableDirectory, TableEntry, Tag, SFNT_VERSION_TRUETYPE};
use super::BuiltTable;
use crate::error::{Result, SubsetError};

const HEADER_SIZE: usize = 12;
const RECORD_SIZE: usize = 16;

const TABLES_MINIMAL: [Tag; 9] = [
    Tag::CVT,
    Tag::FPGM,
    Tag::GLYF,
    Tag::HEAD,
    Tag::HHEA,
    Tag::HMTX,
    Tag::LOCA,
    Tag::MAXP,
    Tag::PREP,
];

const TABLES_WITH_CMAP: [Tag; 10] = [
    Tag::CMAP,
    Tag::CVT,
    Tag::FPGM,
    Tag::GLYF,
    Tag::HEAD,
    Tag::HHEA,
    Tag::HMTX,
    Tag::LOCA,
    Tag::MAXP,
    Tag::PREP,
];

const TABLES_WITH_EXTRAS: [Tag; 12] = [
    Tag::OS2,
    Tag::CMAP,
    Tag::CVT,
    Tag::FPGM,
    Tag::GLYF,
    Tag::HEAD,
    Tag::HHEA,
    Tag::HMTX,
    Tag::LOCA,
    Tag::MAXP,
    Tag::NAME,
    Tag::PREP,
];

/// Which tables the output font carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TableProfile {
    /// Outlines, metrics and hinting only. Enough for a CID-keyed embed.
    #[default]
    Minimal,
    /// Minimal plus `cmap`.
    WithCmap,
    /// Minimal plus `cmap`, `OS/2` and `name`.
    WithExtras,
}

impl TableProfile {
    /// Output tags in directory order.
    pub fn tags(self) -> &'static [Tag] {
        match self {
            TableProfile::Minimal => &TABLES_MINIMAL,
            TableProfile::WithCmap => &TABLES_WITH_CMAP,
            TableProfile::WithExtras => &TABLES_WITH_EXTRAS,
        }
    }

    pub fn includes_cmap(self) -> bool {
        !matches!(self, TableProfile::Minimal)
    }
}

enum Body<'a> {
    Built(&'a BuiltTable),
    Source(&'a TableEntry),
}

impl Body<'_> {
    fn tag(&self) -> Tag {
        match self {
            Body::Built(table) => table.tag,
            Body::Source(entry) => entry.tag,
        }
    }

    fn checksum(&self) -> u32 {
        match self {
            Body::Built(table) => table.checksum(),
            Body::Source(entry) => entry.checksum,
        }
    }

    fn length(&self) -> u32 {
        match self {
            Body::Built(table) => table.length,
            Body::Source(entry) => entry.length,
        }
    }

    fn padded_length(&self) -> usize {
        pad4(self.length() as usize)
    }
}

/// Pair every profile tag with its body: a rebuilt table when one was
/// supplied, otherwise the source table, otherwise nothing.
fn plan<'a>(
    directory: &'a TableDirectory,
    profile: TableProfile,
    built: &'a [BuiltTable],
) -> Vec<Body<'a>> {
    profile
        .tags()
        .iter()
        .filter_map(|&tag| match built.iter().find(|table| table.tag == tag) {
            Some(table) => Some(Body::Built(table)),
            None => directory.get(tag).map(Body::Source),
        })
        .collect()
}

/// Tags the assembled font will contain, in directory order.
pub fn output_tags(directory: &TableDirectory, profile: TableProfile, built: &[BuiltTable]) -> Vec<Tag> {
    plan(directory, profile, built).iter().map(Body::tag).collect()
}

/// Write the complete output font.
///
/// `built` holds the freshly built tables (`glyf`, `loca`, and optionally
/// `cmap`); they replace any source table with the same tag.
pub fn assemble_font<R: Read + Seek + ?Sized>(
    reader: &mut R,
    directory: &TableDirectory,
    profile: TableProfile,
    built: &[BuiltTable],
    font: &str,
) -> Result<Vec<u8>> {
    let bodies = plan(directory, profile, built);
    let num_tables = bodies.len() as u16;

    let directory_size = HEADER_SIZE + RECORD_SIZE * bodies.len();
    let total_size = directory_size + bodies.iter().map(Body::padded_length).sum::<usize>();
    if u32::try_from(total_size).is_err() {
        return Err(SubsetError::MalformedTable {
            font: font.to_string(),
            table: "sfnt".to_string(),
            reason: format!("subset would be {} bytes, past 32-bit offsets", total_size),
        });
    }

    let mut out = vec![0u8; total_size];

    let search = BinarySearchParams::for_tables(num_tables);
    BigEndian::write_u32(&mut out[0..], SFNT_VERSION_TRUETYPE);
    BigEndian::write_u16(&mut out[4..], num_tables);
    BigEndian::write_u16(&mut out[6..], search.search_range);
    BigEndian::write_u16(&mut out[8..], search.entry_selector);
    BigEndian::write_u16(&mut out[10..], search.range_shift);

    let mut offsets = Vec::with_capacity(bodies.len());
    let mut table_offset = directory_size;
    for (i, body) in bodies.iter().enumerate() {
        let record = &mut out[HEADER_SIZE + i * RECORD_SIZE..];
        record[..4].copy_from_slice(body.tag().as_bytes());
        BigEndian::write_u32(&mut record[4..], body.checksum());
        BigEndian::write_u32(&mut record[8..], table_offset as u32);
        BigEndian::write_u32(&mut record[12..], body.length());
        offsets.push(table_offset);
        table_offset += body.padded_length();
    }

    for (body, offset) in bodies.iter().zip(offsets) {
        match body {
            Body::Built(table) => {
                out[offset..offset + table.data.len()].copy_from_slice(&table.data);
            }
            Body::Source(entry) => {
                reader.seek(SeekFrom::Start(entry.offset as u64))?;
                reader.read_exact(&mut out[offset..offset + entry.length as usize])?;
            }
        }
    }

    log::debug!(
        "{}: assembled {} tables into {} bytes",
        font,
        num_tables,
        out.len()
    );
    Ok(out)
}
