//! # cmap Rebuilder
//!
//! Builds a fresh `cmap` from the document's codepoint → glyph map.
//!
//! The table always carries a Windows Unicode BMP subtable (platform 3,
//! encoding 1, format 4). When the map reaches past U+FFFF, or the format-4
//! subtable would not fit its 16-bit length field, a full-repertoire
//! subtable (platform 3, encoding 10, format 12) is added after it. In the
//! overflow case the highest codepoints are left out of format 4 and are only
//! reachable through format 12.

use std::collections::BTreeMap;

use super::checksum::BinarySearchParams;
use super::directory::Tag;
use super::BuiltTable;

/// Highest BMP codepoint, also the mandatory final format-4 segment.
const BMP_END: u32 = 0xFFFF;
/// Largest byte length a format-4 subtable can declare.
const FORMAT4_MAX_SIZE: usize = 0xFFFF;

/// A run of codepoints encoded as one record. `start` and `last` index into
/// the sorted codepoint list the segment was computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmapSegment {
    pub start: usize,
    pub last: usize,
    pub first_glyph: u16,
    pub has_consecutive_glyphs: bool,
    /// Position of this segment's entries in the shared glyph index array.
    /// Only meaningful when `has_consecutive_glyphs` is false.
    pub glyph_index_offset: usize,
}

impl CmapSegment {
    fn new(start: usize, first_glyph: u16) -> Self {
        CmapSegment {
            start,
            last: start,
            first_glyph,
            has_consecutive_glyphs: true,
            glyph_index_offset: 0,
        }
    }

    fn len(&self) -> usize {
        self.last - self.start + 1
    }
}

/// A rebuilt `cmap` table.
#[derive(Debug, Clone)]
pub struct CmapTable {
    pub table: BuiltTable,
    /// A (3, 10) format-12 subtable follows the (3, 1) one.
    pub extended: bool,
}

/// An encoded format-4 subtable.
#[derive(Debug, Clone)]
pub struct Format4Subtable {
    pub data: Vec<u8>,
    /// Codepoints beyond the BMP were present, or some had to be dropped.
    pub extended: bool,
    /// Number of BMP codepoints from the map left out to fit 16-bit sizes.
    pub dropped: usize,
}

/// Build a `cmap` for `map`. Returns `None` for an empty map.
pub fn build_cmap(map: &BTreeMap<u32, u16>) -> Option<CmapTable> {
    if map.is_empty() {
        return None;
    }

    let format4 = build_format4(map);
    let extended = format4.extended;
    let subtable_count: u16 = if extended { 2 } else { 1 };
    let records_end = 4 + 8 * subtable_count as u32;

    let mut data = Vec::new();
    data.extend_from_slice(&0u16.to_be_bytes()); // version
    data.extend_from_slice(&subtable_count.to_be_bytes());

    data.extend_from_slice(&3u16.to_be_bytes()); // platformID: Windows
    data.extend_from_slice(&1u16.to_be_bytes()); // encodingID: Unicode BMP
    data.extend_from_slice(&records_end.to_be_bytes());

    if extended {
        data.extend_from_slice(&3u16.to_be_bytes());
        data.extend_from_slice(&10u16.to_be_bytes()); // Unicode full repertoire
        data.extend_from_slice(&(records_end + format4.data.len() as u32).to_be_bytes());
    }

    data.extend_from_slice(&format4.data);
    if extended {
        data.extend_from_slice(&build_format12(map));
    }

    log::debug!(
        "cmap rebuilt: {} codepoints, {} bytes, extended: {}",
        map.len(),
        data.len(),
        extended
    );
    Some(CmapTable {
        table: BuiltTable::new(Tag::CMAP, data),
        extended,
    })
}

/// Build the format-4 subtable, shedding the highest codepoints until it
/// fits in a 16-bit length.
pub fn build_format4(map: &BTreeMap<u32, u16>) -> Format4Subtable {
    let mut extended = false;
    let mut chars: Vec<u32> = Vec::with_capacity(map.len() + 1);
    for &c in map.keys() {
        if c <= BMP_END {
            chars.push(c);
        } else {
            extended = true;
        }
    }
    let bmp_count = chars.len();

    loop {
        if chars.last() != Some(&BMP_END) {
            chars.push(BMP_END);
        }

        let mut segments = format4_segments(&chars, map);
        let mut glyph_index_len = 0;
        for segment in segments.iter_mut().filter(|s| !s.has_consecutive_glyphs) {
            segment.glyph_index_offset = glyph_index_len;
            glyph_index_len += segment.len();
        }

        let size = 2 * (8 + 4 * segments.len() + glyph_index_len);
        if size > FORMAT4_MAX_SIZE {
            let overflow = size - FORMAT4_MAX_SIZE;
            let to_omit = overflow.div_ceil(2) + 2;
            log::warn!(
                "format 4 cmap needs {} bytes; dropping the top {} codepoints",
                size,
                to_omit
            );
            chars.truncate(chars.len().saturating_sub(to_omit));
            extended = true;
            continue;
        }

        let kept = chars.iter().filter(|&&c| map.contains_key(&c)).count();
        return Format4Subtable {
            data: encode_format4(&chars, &segments, size, map),
            extended,
            dropped: bmp_count - kept,
        };
    }
}

/// Split sorted `chars` into maximal runs of adjacent codepoints, noting
/// which runs also map to consecutive glyphs.
pub fn format4_segments(chars: &[u32], map: &BTreeMap<u32, u16>) -> Vec<CmapSegment> {
    let mut segments: Vec<CmapSegment> = Vec::new();
    let mut previous: Option<(u32, u16)> = None;

    for (i, &c) in chars.iter().enumerate() {
        let glyph = glyph_for(map, c);
        match previous {
            Some((prev_char, prev_glyph)) if c == prev_char + 1 => {
                if let Some(segment) = segments.last_mut() {
                    segment.last = i;
                    if glyph as u32 != prev_glyph as u32 + 1 {
                        segment.has_consecutive_glyphs = false;
                    }
                }
            }
            _ => segments.push(CmapSegment::new(i, glyph)),
        }
        previous = Some((c, glyph));
    }
    segments
}

fn encode_format4(
    chars: &[u32],
    segments: &[CmapSegment],
    size: usize,
    map: &BTreeMap<u32, u16>,
) -> Vec<u8> {
    let seg_count = segments.len() as u16;
    let search = BinarySearchParams::for_segments(seg_count);

    let mut data = Vec::with_capacity(size);
    data.extend_from_slice(&4u16.to_be_bytes()); // format
    data.extend_from_slice(&(size as u16).to_be_bytes());
    data.extend_from_slice(&0u16.to_be_bytes()); // language
    data.extend_from_slice(&(seg_count * 2).to_be_bytes());
    data.extend_from_slice(&search.search_range.to_be_bytes());
    data.extend_from_slice(&search.entry_selector.to_be_bytes());
    data.extend_from_slice(&search.range_shift.to_be_bytes());

    for segment in segments {
        data.extend_from_slice(&(chars[segment.last] as u16).to_be_bytes());
    }
    data.extend_from_slice(&0u16.to_be_bytes()); // reservedPad
    for segment in segments {
        data.extend_from_slice(&(chars[segment.start] as u16).to_be_bytes());
    }
    for segment in segments {
        let delta = if segment.has_consecutive_glyphs {
            segment.first_glyph.wrapping_sub(chars[segment.start] as u16)
        } else {
            0
        };
        data.extend_from_slice(&delta.to_be_bytes());
    }
    for (i, segment) in segments.iter().enumerate() {
        let range_offset = if segment.has_consecutive_glyphs {
            0
        } else {
            ((segments.len() - i + segment.glyph_index_offset) * 2) as u16
        };
        data.extend_from_slice(&range_offset.to_be_bytes());
    }
    for segment in segments.iter().filter(|s| !s.has_consecutive_glyphs) {
        for &c in &chars[segment.start..=segment.last] {
            data.extend_from_slice(&glyph_for(map, c).to_be_bytes());
        }
    }

    debug_assert_eq!(data.len(), size);
    data
}

/// Build the format-12 subtable over every codepoint in `map`.
pub fn build_format12(map: &BTreeMap<u32, u16>) -> Vec<u8> {
    // (startCharCode, endCharCode, startGlyphID)
    let mut groups: Vec<(u32, u32, u32)> = Vec::new();
    let mut current: Option<(u32, u32, u32)> = None;
    for (&c, &glyph) in map {
        let glyph = glyph as u32;
        current = match current {
            Some((start, end, first)) if c == end + 1 && glyph == first + (end - start) + 1 => {
                Some((start, c, first))
            }
            Some(group) => {
                groups.push(group);
                Some((c, c, glyph))
            }
            None => Some((c, c, glyph)),
        };
    }
    groups.extend(current);

    let length = 16 + 12 * groups.len() as u32;
    let mut data = Vec::with_capacity(length as usize);
    data.extend_from_slice(&12u16.to_be_bytes()); // format
    data.extend_from_slice(&0u16.to_be_bytes()); // reserved
    data.extend_from_slice(&length.to_be_bytes());
    data.extend_from_slice(&0u32.to_be_bytes()); // language
    data.extend_from_slice(&(groups.len() as u32).to_be_bytes());
    for (start, end, glyph) in groups {
        data.extend_from_slice(&start.to_be_bytes());
        data.extend_from_slice(&end.to_be_bytes());
        data.extend_from_slice(&glyph.to_be_bytes());
    }
    data
}

fn glyph_for(map: &BTreeMap<u32, u16>, c: u32) -> u16 {
    map.get(&c).copied().unwrap_or(0)
}
