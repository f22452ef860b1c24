//! Synthetic TrueType fonts for the integration tests.
//!
//! The fonts are structurally valid (head/hhea/hmtx/maxp/glyf/loca plus the
//! optional hinting and naming tables) so the output can be checked with an
//! independent parser, but the outlines are placeholder bytes.

#![allow(dead_code)]

/// One directory record of a parsed font, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub tag: [u8; 4],
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

pub fn u16_at(data: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([data[offset], data[offset + 1]])
}

pub fn u32_at(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
}

pub fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Directory records of the font starting at `base`, in file order.
pub fn records(font: &[u8], base: usize) -> Vec<Record> {
    let count = u16_at(font, base + 4) as usize;
    (0..count)
        .map(|i| {
            let r = base + 12 + 16 * i;
            Record {
                tag: [font[r], font[r + 1], font[r + 2], font[r + 3]],
                checksum: u32_at(font, r + 4),
                offset: u32_at(font, r + 8),
                length: u32_at(font, r + 12),
            }
        })
        .collect()
}

pub fn table<'a>(font: &'a [u8], tag: &[u8; 4]) -> Option<&'a [u8]> {
    records(font, 0).into_iter().find(|r| &r.tag == tag).map(|r| {
        let start = r.offset as usize;
        &font[start..start + r.length as usize]
    })
}

/// Loca offsets of a font, decoded per its `head`.
pub fn loca_offsets(font: &[u8]) -> Vec<u32> {
    let head = table(font, b"head").expect("head");
    let loca = table(font, b"loca").expect("loca");
    if u16_at(head, 50) == 0 {
        loca.chunks_exact(2).map(|e| u16_at(e, 0) as u32 * 2).collect()
    } else {
        loca.chunks_exact(4).map(|e| u32_at(e, 0)).collect()
    }
}

/// A simple glyph: one contour followed by `len - 2` filler bytes.
pub fn simple_glyph(fill: u8, len: usize) -> Vec<u8> {
    assert!(len >= 2 && len % 2 == 0);
    let mut glyph = vec![fill; len];
    glyph[0] = 0;
    glyph[1] = 1;
    glyph
}

/// A composite glyph referencing `components`, with byte arguments and no
/// transform. The record length is kept even for short loca.
pub fn composite_glyph(components: &[u16]) -> Vec<u8> {
    let mut glyph = Vec::new();
    glyph.extend_from_slice(&(-1i16).to_be_bytes());
    glyph.extend_from_slice(&[0u8; 8]);
    for (i, &gid) in components.iter().enumerate() {
        let flags: u16 = if i + 1 < components.len() { 0x0020 } else { 0 };
        glyph.extend_from_slice(&flags.to_be_bytes());
        glyph.extend_from_slice(&gid.to_be_bytes());
        glyph.extend_from_slice(&[0u8; 2]);
    }
    glyph
}

/// Builds a TrueType font with the given glyph records.
#[derive(Debug, Clone)]
pub struct FontBuilder {
    glyphs: Vec<Vec<u8>>,
    long_loca: bool,
    skip: Vec<[u8; 4]>,
    extra: Vec<([u8; 4], Vec<u8>)>,
}

impl FontBuilder {
    pub fn new() -> Self {
        FontBuilder {
            glyphs: Vec::new(),
            long_loca: false,
            skip: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// `count` simple glyphs, each a distinct size and fill.
    pub fn simple_glyphs(mut self, count: usize) -> Self {
        for i in 0..count {
            let gid = self.glyphs.len();
            self.glyphs.push(simple_glyph(gid as u8 ^ 0x5A, 12 + 2 * (i % 5)));
        }
        self
    }

    pub fn glyph(mut self, data: Vec<u8>) -> Self {
        self.glyphs.push(data);
        self
    }

    /// Replace glyph `gid` (which must already exist).
    pub fn set_glyph(mut self, gid: usize, data: Vec<u8>) -> Self {
        self.glyphs[gid] = data;
        self
    }

    pub fn long_loca(mut self) -> Self {
        self.long_loca = true;
        self
    }

    pub fn without(mut self, tag: &[u8; 4]) -> Self {
        self.skip.push(*tag);
        self
    }

    /// An additional raw table record, written after the standard ones.
    pub fn extra_table(mut self, tag: &[u8; 4], data: Vec<u8>) -> Self {
        self.extra.push((*tag, data));
        self
    }

    pub fn num_glyphs(&self) -> usize {
        self.glyphs.len()
    }

    fn tables(&self) -> Vec<([u8; 4], Vec<u8>)> {
        let n = self.glyphs.len() as u16;

        let mut head = vec![0u8; 54];
        head[0..4].copy_from_slice(&0x00010000u32.to_be_bytes());
        head[12..16].copy_from_slice(&0x5F0F3CF5u32.to_be_bytes());
        head[18..20].copy_from_slice(&1000u16.to_be_bytes());
        head[50..52].copy_from_slice(&(self.long_loca as u16).to_be_bytes());

        let mut hhea = vec![0u8; 36];
        hhea[0..4].copy_from_slice(&0x00010000u32.to_be_bytes());
        hhea[4..6].copy_from_slice(&800i16.to_be_bytes());
        hhea[6..8].copy_from_slice(&(-200i16).to_be_bytes());
        hhea[34..36].copy_from_slice(&n.to_be_bytes());

        let hmtx: Vec<u8> = (0..n)
            .flat_map(|gid| {
                let mut metric = (500 + gid).to_be_bytes().to_vec();
                metric.extend_from_slice(&0i16.to_be_bytes());
                metric
            })
            .collect();

        let mut maxp = vec![0u8; 32];
        maxp[0..4].copy_from_slice(&0x00010000u32.to_be_bytes());
        maxp[4..6].copy_from_slice(&n.to_be_bytes());

        let mut glyf = Vec::new();
        let mut offsets = vec![0u32];
        for glyph in &self.glyphs {
            glyf.extend_from_slice(glyph);
            offsets.push(glyf.len() as u32);
        }
        let loca: Vec<u8> = if self.long_loca {
            offsets.iter().flat_map(|o| o.to_be_bytes()).collect()
        } else {
            offsets.iter().flat_map(|o| ((o / 2) as u16).to_be_bytes()).collect()
        };

        // version 1 record size
        let mut os2 = vec![0u8; 86];
        os2[0..2].copy_from_slice(&1u16.to_be_bytes());

        let name = vec![0, 0, 0, 0, 0, 6];
        let cmap = vec![0, 0, 0, 0];

        let mut tables = vec![
            (*b"OS/2", os2),
            (*b"cmap", cmap),
            (*b"cvt ", vec![0, 10, 0, 20, 0, 30]),
            (*b"fpgm", vec![0xB0, 0x01, 0x2C]),
            (*b"glyf", glyf),
            (*b"head", head),
            (*b"hhea", hhea),
            (*b"hmtx", hmtx),
            (*b"loca", loca),
            (*b"maxp", maxp),
            (*b"name", name),
            (*b"post", {
                let mut post = vec![0u8; 32];
                post[0..4].copy_from_slice(&0x00030000u32.to_be_bytes());
                post
            }),
            (*b"prep", vec![0xB8, 0x01, 0xFF, 0x85, 0xB0]),
        ];
        tables.retain(|(tag, _)| !self.skip.contains(tag));
        tables.extend(self.extra.iter().cloned());
        tables
    }

    pub fn build(&self) -> Vec<u8> {
        self.build_at(0, false)
    }

    /// Build with `prefix` filler bytes before the directory. Table offsets
    /// are written relative to the directory when `relative` is set.
    pub fn build_at(&self, prefix: usize, relative: bool) -> Vec<u8> {
        let tables = self.tables();
        let mut out = vec![0xEEu8; prefix];
        out.extend_from_slice(&0x00010000u32.to_be_bytes());
        out.extend_from_slice(&(tables.len() as u16).to_be_bytes());
        out.extend_from_slice(&[0u8; 6]);

        let mut offset = 12 + 16 * tables.len();
        for (tag, data) in &tables {
            let stored = if relative { offset } else { offset + prefix };
            out.extend_from_slice(tag);
            out.extend_from_slice(&checksum(data).to_be_bytes());
            out.extend_from_slice(&(stored as u32).to_be_bytes());
            out.extend_from_slice(&(data.len() as u32).to_be_bytes());
            offset += (data.len() + 3) & !3;
        }
        for (_, data) in &tables {
            out.extend_from_slice(data);
            while (out.len() - prefix) % 4 != 0 {
                out.push(0);
            }
        }
        out
    }
}
