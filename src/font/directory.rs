//! # Table Directory
//!
//! Parses the sfnt header and its table records. Checksums are read but not
//! validated, and the header's binary-search fields are skipped since the
//! assembler recomputes them for the output font.

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{Result, SubsetError};

/// sfnt version for TrueType outlines.
pub const SFNT_VERSION_TRUETYPE: u32 = 0x0001_0000;
/// Apple's `true` sfnt version.
pub const SFNT_VERSION_APPLE: u32 = 0x7472_7565;

/// A 4-byte table tag such as `glyf` or `OS/2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const CMAP: Tag = Tag::new(b"cmap");
    pub const CVT: Tag = Tag::new(b"cvt ");
    pub const FPGM: Tag = Tag::new(b"fpgm");
    pub const GLYF: Tag = Tag::new(b"glyf");
    pub const HEAD: Tag = Tag::new(b"head");
    pub const HHEA: Tag = Tag::new(b"hhea");
    pub const HMTX: Tag = Tag::new(b"hmtx");
    pub const LOCA: Tag = Tag::new(b"loca");
    pub const MAXP: Tag = Tag::new(b"maxp");
    pub const NAME: Tag = Tag::new(b"name");
    pub const OS2: Tag = Tag::new(b"OS/2");
    pub const PREP: Tag = Tag::new(b"prep");

    pub const fn new(bytes: &[u8; 4]) -> Self {
        Tag(*bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() || b == b' ' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02X}", b)?;
            }
        }
        Ok(())
    }
}

/// One table record. `offset` is absolute within the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableEntry {
    pub tag: Tag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// The parsed table index of a font.
#[derive(Debug, Clone, Default)]
pub struct TableDirectory {
    tables: HashMap<Tag, TableEntry>,
}

impl TableDirectory {
    pub fn get(&self, tag: Tag) -> Option<&TableEntry> {
        self.tables.get(&tag)
    }

    /// Like [`get`](Self::get), but a missing table is an error naming `font`.
    pub fn require(&self, tag: Tag, font: &str) -> Result<&TableEntry> {
        self.get(tag).ok_or_else(|| SubsetError::MissingTable {
            font: font.to_string(),
            table: tag.to_string(),
        })
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.tables.contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableEntry> {
        self.tables.values()
    }

    /// Records `entry`. A later record for the same tag replaces an earlier one.
    pub fn insert(&mut self, entry: TableEntry) -> Option<TableEntry> {
        self.tables.insert(entry.tag, entry)
    }
}

/// Read the table directory at `directory_offset`.
///
/// When `relative` is set the font is embedded in a larger container and the
/// table offsets are relative to the directory; they are rebased so every
/// [`TableEntry::offset`] is absolute.
pub fn read_directory<R: Read + Seek + ?Sized>(
    reader: &mut R,
    font: &str,
    directory_offset: u32,
    relative: bool,
) -> Result<TableDirectory> {
    reader.seek(SeekFrom::Start(directory_offset as u64))?;
    let version = reader.read_u32::<BigEndian>()?;
    if version != SFNT_VERSION_TRUETYPE && version != SFNT_VERSION_APPLE {
        return Err(SubsetError::Format {
            font: font.to_string(),
        });
    }

    let num_tables = reader.read_u16::<BigEndian>()?;
    // searchRange, entrySelector, rangeShift
    reader.seek(SeekFrom::Current(6))?;

    let base = if relative { directory_offset } else { 0 };
    let mut directory = TableDirectory::default();
    for _ in 0..num_tables {
        let mut tag = [0u8; 4];
        reader.read_exact(&mut tag)?;
        let tag = Tag(tag);
        let checksum = reader.read_u32::<BigEndian>()?;
        let raw_offset = reader.read_u32::<BigEndian>()?;
        let length = reader.read_u32::<BigEndian>()?;

        let offset = raw_offset.checked_add(base).ok_or_else(|| SubsetError::MalformedTable {
            font: font.to_string(),
            table: tag.to_string(),
            reason: format!("offset {} overflows when rebased by {}", raw_offset, base),
        })?;

        let entry = TableEntry {
            tag,
            checksum,
            offset,
            length,
        };
        if let Some(previous) = directory.insert(entry) {
            log::warn!(
                "{}: duplicate '{}' table record (offset {} replaced by {})",
                font,
                tag,
                previous.offset,
                offset
            );
        }
    }

    log::debug!("{}: read {} table records", font, directory.len());
    Ok(directory)
}
