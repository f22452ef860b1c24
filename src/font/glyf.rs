//! # glyf / loca
//!
//! Reading the glyph index, expanding the requested glyphs to their
//! composite closure, and rebuilding `glyf`/`loca` with only the retained
//! outlines.
//!
//! The rebuilt tables keep the original glyph numbering. Dropped glyphs stay
//! in `loca` as zero-length entries, so glyph IDs used by the document remain
//! valid without any remapping.

use std::collections::{BTreeSet, VecDeque};
use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};

use super::checksum::pad4;
use super::directory::{TableDirectory, TableEntry, Tag};
use super::BuiltTable;
use crate::error::{Result, SubsetError};

/// Byte offset of `indexToLocFormat` inside `head`.
pub const HEAD_INDEX_TO_LOC_FORMAT_OFFSET: u32 = 50;

// Component flags of a composite glyph record.
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

/// numberOfContours + bounding box.
const GLYPH_HEADER_SIZE: usize = 10;

/// How `loca` stores its offsets, per `head.indexToLocFormat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaFormat {
    /// `u16` entries holding offset / 2.
    Short,
    /// `u32` entries holding the offset verbatim.
    Long,
}

impl LocaFormat {
    fn entry_size(self) -> usize {
        match self {
            LocaFormat::Short => 2,
            LocaFormat::Long => 4,
        }
    }
}

/// `numGlyphs + 1` byte offsets into `glyf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaTable {
    format: LocaFormat,
    offsets: Vec<u32>,
}

impl LocaTable {
    pub fn new(format: LocaFormat, offsets: Vec<u32>) -> Self {
        LocaTable { format, offsets }
    }

    pub fn format(&self) -> LocaFormat {
        self.format
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    pub fn num_glyphs(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Byte range of `gid` within `glyf`, or `None` when the glyph has no
    /// outline (or lies outside the table).
    pub fn glyph_range(&self, gid: u16) -> Option<(u32, u32)> {
        let idx = gid as usize;
        if idx + 1 >= self.offsets.len() {
            return None;
        }
        let (start, end) = (self.offsets[idx], self.offsets[idx + 1]);
        if end > start {
            Some((start, end))
        } else {
            None
        }
    }

    /// Serialize in this table's format, padded to 4 bytes.
    pub fn to_bytes(&self) -> BuiltTable {
        let mut data = Vec::with_capacity(pad4(self.offsets.len() * self.format.entry_size()));
        for &offset in &self.offsets {
            match self.format {
                LocaFormat::Short => data.extend_from_slice(&((offset / 2) as u16).to_be_bytes()),
                LocaFormat::Long => data.extend_from_slice(&offset.to_be_bytes()),
            }
        }
        BuiltTable::new(Tag::LOCA, data)
    }
}

/// Read `head.indexToLocFormat` and the full `loca` table.
pub fn read_loca<R: Read + Seek + ?Sized>(
    reader: &mut R,
    directory: &TableDirectory,
    font: &str,
) -> Result<LocaTable> {
    let head = directory.require(Tag::HEAD, font)?;
    if head.length < HEAD_INDEX_TO_LOC_FORMAT_OFFSET + 2 {
        return Err(malformed(font, Tag::HEAD, format!("only {} bytes long", head.length)));
    }
    reader.seek(SeekFrom::Start(head.offset as u64 + HEAD_INDEX_TO_LOC_FORMAT_OFFSET as u64))?;
    let format = match reader.read_i16::<BigEndian>()? {
        0 => LocaFormat::Short,
        _ => LocaFormat::Long,
    };

    let loca = directory.require(Tag::LOCA, font)?;
    let data = read_table(reader, loca)?;
    let offsets = match format {
        LocaFormat::Short => data
            .chunks_exact(2)
            .map(|entry| BigEndian::read_u16(entry) as u32 * 2)
            .collect(),
        LocaFormat::Long => data.chunks_exact(4).map(BigEndian::read_u32).collect(),
    };

    let loca = LocaTable::new(format, offsets);
    log::debug!("{}: {:?} loca with {} glyphs", font, format, loca.num_glyphs());
    Ok(loca)
}

/// Bounds on the composite closure walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosureLimits {
    /// Deepest allowed component nesting, counted from a requested glyph.
    pub max_depth: u32,
    /// Most glyphs the closure may hold, including glyph 0.
    pub max_glyphs: usize,
}

impl Default for ClosureLimits {
    fn default() -> Self {
        ClosureLimits {
            max_depth: 64,
            max_glyphs: 0x10000,
        }
    }
}

/// Expand `requested` with glyph 0 and every glyph reachable through
/// composite component references. Returns the closure sorted ascending.
///
/// Each glyph is visited once, so component cycles terminate; the limits
/// bound how far a hostile font can push the walk.
pub fn resolve_closure<R, I>(
    reader: &mut R,
    directory: &TableDirectory,
    loca: &LocaTable,
    font: &str,
    requested: I,
    limits: ClosureLimits,
) -> Result<Vec<u16>>
where
    R: Read + Seek + ?Sized,
    I: IntoIterator<Item = u16>,
{
    let glyf = directory.require(Tag::GLYF, font)?;

    let mut retained: BTreeSet<u16> = BTreeSet::new();
    let mut queue: VecDeque<(u16, u32)> = VecDeque::new();
    for gid in std::iter::once(0).chain(requested) {
        if retained.insert(gid) {
            queue.push_back((gid, 0));
        }
    }
    check_size(&retained, limits, font)?;

    let num_glyphs = loca.num_glyphs();
    if let Some(&last) = retained.last() {
        if last as usize >= num_glyphs {
            log::warn!(
                "{}: requested glyph {} is beyond the {} glyphs in loca",
                font,
                last,
                num_glyphs
            );
        }
    }

    let mut glyph = Vec::new();
    while let Some((gid, depth)) = queue.pop_front() {
        let Some(range) = loca.glyph_range(gid) else {
            continue;
        };
        read_glyph(reader, glyf, range, font, &mut glyph)?;

        for component in composite_components(&glyph) {
            if !retained.insert(component) {
                continue;
            }
            let component_depth = depth + 1;
            if component_depth > limits.max_depth {
                return Err(SubsetError::ClosureDepth {
                    font: font.to_string(),
                    glyph: gid,
                    limit: limits.max_depth,
                });
            }
            check_size(&retained, limits, font)?;
            log::trace!("{}: glyph {} pulls in component {}", font, gid, component);
            queue.push_back((component, component_depth));
        }
    }

    log::debug!("{}: glyph closure holds {} glyphs", font, retained.len());
    Ok(retained.into_iter().collect())
}

/// Component glyph IDs referenced by a raw glyph record. Simple glyphs and
/// empty records yield nothing; a record truncated mid-component stops at
/// the last complete reference.
pub fn composite_components(glyph: &[u8]) -> Vec<u16> {
    let mut components = Vec::new();
    if glyph.len() < 2 || BigEndian::read_i16(glyph) >= 0 {
        return components;
    }

    let mut pos = GLYPH_HEADER_SIZE;
    while pos + 4 <= glyph.len() {
        let flags = BigEndian::read_u16(&glyph[pos..]);
        components.push(BigEndian::read_u16(&glyph[pos + 2..]));
        if flags & MORE_COMPONENTS == 0 {
            break;
        }
        pos += 4 + component_arguments_size(flags);
    }
    components
}

/// Bytes of arguments and transform following a component's flags and
/// glyph index.
fn component_arguments_size(flags: u16) -> usize {
    let mut size = if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
    if flags & WE_HAVE_A_SCALE != 0 {
        size += 2;
    } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
        size += 4;
    }
    if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
        size += 8;
    }
    size
}

/// The rebuilt `glyf` and `loca` pair.
#[derive(Debug, Clone)]
pub struct GlyphTables {
    pub glyf: BuiltTable,
    pub loca: LocaTable,
}

/// Copy the outlines of `glyphs` (sorted ascending) into a fresh `glyf`
/// and build the matching `loca`, preserving the original glyph numbering.
pub fn build_glyph_tables<R: Read + Seek + ?Sized>(
    reader: &mut R,
    directory: &TableDirectory,
    loca: &LocaTable,
    glyphs: &[u16],
    font: &str,
) -> Result<GlyphTables> {
    let glyf = directory.require(Tag::GLYF, font)?;

    let mut capacity = 0usize;
    for &gid in glyphs {
        if let Some((start, end)) = loca.glyph_range(gid) {
            check_glyph_bounds(glyf, (start, end), font)?;
            capacity += (end - start) as usize;
        }
    }
    let mut data = vec![0u8; pad4(capacity)];

    let mut new_offsets = vec![0u32; loca.offsets().len()];
    let mut wanted = glyphs.iter().copied().peekable();
    let mut ptr = 0usize;
    for (idx, new_offset) in new_offsets.iter_mut().enumerate() {
        *new_offset = ptr as u32;
        if wanted.next_if(|&gid| gid as usize == idx).is_none() {
            continue;
        }
        if let Some((start, end)) = loca.glyph_range(idx as u16) {
            let len = (end - start) as usize;
            reader.seek(SeekFrom::Start(glyf.offset as u64 + start as u64))?;
            reader.read_exact(&mut data[ptr..ptr + len])?;
            ptr += len;
        }
    }
    let real_size = ptr;
    data.truncate(pad4(real_size));

    log::debug!(
        "{}: glyf rebuilt to {} bytes from {}",
        font,
        real_size,
        glyf.length
    );
    Ok(GlyphTables {
        glyf: BuiltTable::from_padded(Tag::GLYF, data, real_size),
        loca: LocaTable::new(loca.format(), new_offsets),
    })
}

fn read_glyph<R: Read + Seek + ?Sized>(
    reader: &mut R,
    glyf: &TableEntry,
    range: (u32, u32),
    font: &str,
    buf: &mut Vec<u8>,
) -> Result<()> {
    check_glyph_bounds(glyf, range, font)?;
    let (start, end) = range;
    buf.clear();
    buf.resize((end - start) as usize, 0);
    reader.seek(SeekFrom::Start(glyf.offset as u64 + start as u64))?;
    reader.read_exact(buf)?;
    Ok(())
}

fn check_glyph_bounds(glyf: &TableEntry, (start, end): (u32, u32), font: &str) -> Result<()> {
    if end > glyf.length {
        return Err(malformed(
            font,
            Tag::GLYF,
            format!("glyph data {}..{} runs past the table end {}", start, end, glyf.length),
        ));
    }
    Ok(())
}

fn check_size(retained: &BTreeSet<u16>, limits: ClosureLimits, font: &str) -> Result<()> {
    if retained.len() > limits.max_glyphs {
        return Err(SubsetError::ClosureSize {
            font: font.to_string(),
            limit: limits.max_glyphs,
        });
    }
    Ok(())
}

fn read_table<R: Read + Seek + ?Sized>(reader: &mut R, entry: &TableEntry) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(entry.offset as u64))?;
    let mut data = Vec::new();
    reader.take(entry.length as u64).read_to_end(&mut data)?;
    if data.len() < entry.length as usize {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("'{}' table is truncated", entry.tag),
        )
        .into());
    }
    Ok(data)
}

fn malformed(font: &str, table: Tag, reason: String) -> SubsetError {
    SubsetError::MalformedTable {
        font: font.to_string(),
        table: table.to_string(),
        reason,
    }
}
