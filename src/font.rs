//! Font faces and the subset-assignment font manager.
//!
//! The core only needs four things from a font file: glyph lookup for a
//! Unicode codepoint, pairwise kerning, advances, and raw byte access for
//! subset embedding -- the `FontFace` trait below is exactly that boundary.
//! `AllsortsFontFace` is the concrete adapter that implements it against a
//! real TrueType/OpenType file.

use std::collections::HashMap;
use std::io::Write;

use allsorts::binary::read::ReadScope;
use allsorts::font_data::FontData;
use allsorts::tables::cmap::{owned::CmapSubtable as OwnedCmapSubtable, CmapSubtable};
use allsorts::tables::{FontTableProvider, HeadTable, HheaTable, MaxpTable};
use allsorts::tag;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::Dictionary as LoDictionary;
use lopdf::Object::{Array, Integer, Name, Real};

use crate::errors::{FormatError, Result};
use crate::ids::{FontId, FontSubsetId};
use crate::kern;
use crate::subsetting;

/// The font-file boundary the text pipeline consumes. Anything implementing
/// this trait can back a `load_font` call.
pub trait FontFace: Send {
    fn glyph_index(&self, codepoint: char) -> Option<u16>;
    fn advance_width(&self, glyph: u16) -> u16;
    fn kerning(&self, left_glyph: u16, right_glyph: u16) -> Option<i32>;
    fn units_per_em(&self) -> u16;
    fn raw_bytes(&self) -> &[u8];
    fn ascent(&self) -> i16;
    fn descent(&self) -> i16;
    fn bounding_box(&self) -> [i16; 4];
}

/// `allsorts`-backed concrete adapter over a TrueType/OpenType font file.
pub struct AllsortsFontFace {
    bytes: Vec<u8>,
    cmap_subtable: OwnedCmapSubtable,
    hhea_table: HheaTable,
    head_table: HeadTable,
    hmtx_data: Vec<u8>,
    maxp_table: MaxpTable,
    kern_pairs: HashMap<(u16, u16), i16>,
}

impl AllsortsFontFace {
    /// Parses the mandatory tables (`cmap`, `head`, `hhea`, `hmtx`, `maxp`)
    /// and, if present, the legacy `kern` table.
    pub fn parse(bytes: Vec<u8>) -> Result<Self> {
        let not_a_font = || FormatError::Font("malformed font table".to_string());

        let font_file = ReadScope::new(&bytes)
            .read::<FontData<'_>>()
            .map_err(|e| FormatError::Font(e.to_string()))?;
        let provider = font_file
            .table_provider(0)
            .map_err(|e| FormatError::Font(e.to_string()))?;

        let head_data = provider
            .table_data(tag::HEAD)
            .map_err(|e| FormatError::Font(e.to_string()))?
            .ok_or_else(not_a_font)?
            .into_owned();
        let head_table = ReadScope::new(&head_data)
            .read::<HeadTable>()
            .map_err(|e| FormatError::Font(e.to_string()))?;

        let hhea_data = provider
            .table_data(tag::HHEA)
            .map_err(|e| FormatError::Font(e.to_string()))?
            .ok_or_else(not_a_font)?
            .into_owned();
        let hhea_table = ReadScope::new(&hhea_data)
            .read::<HheaTable>()
            .map_err(|e| FormatError::Font(e.to_string()))?;

        let maxp_data = provider
            .table_data(tag::MAXP)
            .map_err(|e| FormatError::Font(e.to_string()))?
            .ok_or_else(not_a_font)?
            .into_owned();
        let maxp_table = ReadScope::new(&maxp_data)
            .read::<MaxpTable>()
            .map_err(|e| FormatError::Font(e.to_string()))?;

        let hmtx_data = provider
            .table_data(tag::HMTX)
            .map_err(|e| FormatError::Font(e.to_string()))?
            .ok_or_else(not_a_font)?
            .into_owned();

        let kern_pairs = provider
            .table_data(tag::KERN)
            .ok()
            .flatten()
            .map(|data| kern::parse_pairwise(&data))
            .unwrap_or_default();

        let font_data_impl = allsorts::font::Font::new(provider)
            .map_err(|e| FormatError::Font(e.to_string()))?;
        let cmap_subtable = ReadScope::new(font_data_impl.cmap_subtable_data())
            .read::<CmapSubtable<'_>>()
            .map_err(|e| FormatError::Font(e.to_string()))?
            .to_owned()
            .ok_or_else(not_a_font)?;

        Ok(Self {
            bytes,
            cmap_subtable,
            hhea_table,
            head_table,
            hmtx_data,
            maxp_table,
            kern_pairs,
        })
    }
}

impl FontFace for AllsortsFontFace {
    fn glyph_index(&self, codepoint: char) -> Option<u16> {
        self.cmap_subtable
            .map_glyph(codepoint as u32)
            .ok()
            .flatten()
    }

    fn advance_width(&self, glyph: u16) -> u16 {
        allsorts::glyph_info::advance(&self.maxp_table, &self.hhea_table, &self.hmtx_data, glyph)
            .unwrap_or(0)
    }

    fn kerning(&self, left_glyph: u16, right_glyph: u16) -> Option<i32> {
        self.kern_pairs
            .get(&(left_glyph, right_glyph))
            .map(|v| *v as i32)
    }

    fn units_per_em(&self) -> u16 {
        self.head_table.units_per_em
    }

    fn raw_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn ascent(&self) -> i16 {
        self.hhea_table.ascender
    }

    fn descent(&self) -> i16 {
        self.hhea_table.descender
    }

    fn bounding_box(&self) -> [i16; 4] {
        [
            self.head_table.x_min,
            self.head_table.y_min,
            self.head_table.x_max,
            self.head_table.y_max,
        ]
    }
}

/// One of the 14 standard PDF fonts: no embedding, no subsetting, a
/// `/Type1` dictionary naming the base font is the entire resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    Courier,
    CourierBold,
    Symbol,
    ZapfDingbats,
}

impl BuiltinFont {
    fn base_name(self) -> &'static str {
        match self {
            BuiltinFont::Helvetica => "Helvetica",
            BuiltinFont::HelveticaBold => "Helvetica-Bold",
            BuiltinFont::HelveticaOblique => "Helvetica-Oblique",
            BuiltinFont::TimesRoman => "Times-Roman",
            BuiltinFont::TimesBold => "Times-Bold",
            BuiltinFont::TimesItalic => "Times-Italic",
            BuiltinFont::Courier => "Courier",
            BuiltinFont::CourierBold => "Courier-Bold",
            BuiltinFont::Symbol => "Symbol",
            BuiltinFont::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// The `/Type /Font /Subtype /Type1` dictionary for this standard font.
    /// Written as a single indirect object with no embedded font program.
    pub(crate) fn to_dictionary(self) -> LoDictionary {
        let mut dict = LoDictionary::new();
        dict.set("Type", Name(b"Font".to_vec()));
        dict.set("Subtype", Name(b"Type1".to_vec()));
        dict.set("BaseFont", Name(self.base_name().as_bytes().to_vec()));
        dict.set("Encoding", Name(b"WinAnsiEncoding".to_vec()));
        dict
    }
}

/// Maximum glyphs per subset (PDF type-3-style composite font embedding
/// convention this crate follows: one byte-sized local glyph id per
/// subset).
pub(crate) const MAX_GLYPHS_PER_SUBSET: usize = 255;

/// One subset under construction: glyph 0 is always `.notdef`; every
/// following entry is an original glyph index assigned a local byte id
/// equal to its position.
#[derive(Debug, Default, Clone)]
struct Subset {
    original_gids: Vec<u16>,
    codepoint_to_local: HashMap<char, u8>,
}

impl Subset {
    fn new() -> Self {
        Self {
            original_gids: vec![0],
            codepoint_to_local: HashMap::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.original_gids.len() >= MAX_GLYPHS_PER_SUBSET
    }

    fn insert(&mut self, codepoint: char, original_gid: u16) -> u8 {
        let local = self.original_gids.len() as u8;
        self.original_gids.push(original_gid);
        self.codepoint_to_local.insert(codepoint, local);
        local
    }
}

struct LoadedFont {
    face: Box<dyn FontFace>,
    subsets: Vec<Subset>,
}

/// Owns every loaded font face and lazily assigns codepoints into subsets of
/// at most 255 glyphs, opening a new subset (sequence 0, 1, 2, ...) whenever
/// the current one is full.
#[derive(Default)]
pub struct FontManager {
    fonts: Vec<LoadedFont>,
}

impl FontManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, face: Box<dyn FontFace>) -> FontId {
        let id = FontId(self.fonts.len());
        self.fonts.push(LoadedFont {
            face,
            subsets: Vec::new(),
        });
        id
    }

    pub(crate) fn face(&self, font: FontId) -> &dyn FontFace {
        self.fonts[font.index()].face.as_ref()
    }

    /// Assigns `codepoint` within `font` to a subset, returning the subset
    /// id and the local byte glyph id (0-254, with 0 reserved for
    /// `.notdef`). Reuses a prior assignment for a codepoint already seen in
    /// this font.
    pub(crate) fn assign(&mut self, font: FontId, codepoint: char) -> (FontSubsetId, u8) {
        let original_gid = self.fonts[font.index()]
            .face
            .glyph_index(codepoint)
            .unwrap_or(0);

        let loaded = &mut self.fonts[font.index()];
        for (index, subset) in loaded.subsets.iter().enumerate() {
            if let Some(&local) = subset.codepoint_to_local.get(&codepoint) {
                return (FontSubsetId::new(font, index), local);
            }
        }

        let needs_new_subset = loaded
            .subsets
            .last()
            .map(|s| s.is_full())
            .unwrap_or(true);
        if needs_new_subset {
            loaded.subsets.push(Subset::new());
        }
        let subset_index = loaded.subsets.len() - 1;
        let local = loaded.subsets[subset_index].insert(codepoint, original_gid);
        (FontSubsetId::new(font, subset_index), local)
    }

    /// Looks up the original glyph index a local byte id refers to, for
    /// kerning lookups between two glyphs possibly in different subsets.
    pub(crate) fn original_glyph(&self, subset: FontSubsetId, local: u8) -> u16 {
        self.fonts[subset.font.index()].subsets[subset.subset_index].original_gids[local as usize]
    }

    /// Every `(FontId, subset_index)` pair that has at least one glyph, in
    /// stable creation order -- the set the assembler embeds at close.
    pub(crate) fn all_subsets(&self) -> Vec<FontSubsetId> {
        let mut out = Vec::new();
        for (font_index, loaded) in self.fonts.iter().enumerate() {
            for subset_index in 0..loaded.subsets.len() {
                out.push(FontSubsetId::new(FontId(font_index), subset_index));
            }
        }
        out
    }

    /// Number of glyphs assigned to a subset -- the `/W` array the
    /// descendant font dictionary needs covers exactly this many CIDs.
    pub(crate) fn subset_glyph_count(&self, subset: FontSubsetId) -> usize {
        self.fonts[subset.font.index()].subsets[subset.subset_index]
            .original_gids
            .len()
    }

    /// Builds the embedded TrueType subset bytes for one subset.
    pub(crate) fn embed_subset_bytes(&self, subset: FontSubsetId) -> Result<Vec<u8>> {
        let loaded = &self.fonts[subset.font.index()];
        let gids = &loaded.subsets[subset.subset_index].original_gids;
        let (bytes, _mapping) = subsetting::subset(loaded.face.raw_bytes(), gids)?;
        Ok(bytes)
    }

    /// `/FontFile2` dictionary + deflated stream for a subset's embedded
    /// font program.
    pub(crate) fn font_file_stream(&self, raw_ttf: &[u8]) -> (LoDictionary, Vec<u8>) {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(raw_ttf)
            .expect("in-memory write cannot fail");
        let compressed = encoder.finish().expect("in-memory write cannot fail");

        let mut dict = LoDictionary::new();
        dict.set("Filter", Name(b"FlateDecode".to_vec()));
        dict.set("Length1", Integer(raw_ttf.len() as i64));
        dict.set("Length", Integer(compressed.len() as i64));
        (dict, compressed)
    }

    /// The CIDFontType2 descendant font dictionary for a subset, given the
    /// object number of its embedded `/FontFile2` and `/FontDescriptor`.
    pub(crate) fn descendant_font_dict(
        &self,
        subset: FontSubsetId,
        base_font_name: &str,
        descriptor_obj: u32,
        glyph_count: usize,
    ) -> LoDictionary {
        let loaded = &self.fonts[subset.font.index()];
        let units_per_em = loaded.face.units_per_em().max(1) as f32;
        let scale = 1000.0 / units_per_em;

        let widths: Vec<lopdf::Object> = (0..glyph_count)
            .map(|local_id| {
                let original_gid = loaded.subsets[subset.subset_index].original_gids[local_id];
                Integer((loaded.face.advance_width(original_gid) as f32 * scale).round() as i64)
            })
            .collect();

        let mut dict = LoDictionary::new();
        dict.set("Type", Name(b"Font".to_vec()));
        dict.set("Subtype", Name(b"CIDFontType2".to_vec()));
        dict.set("BaseFont", Name(base_font_name.as_bytes().to_vec()));
        dict.set(
            "CIDSystemInfo",
            lopdf::Object::Dictionary(lopdf::dictionary! {
                "Registry" => lopdf::Object::string_literal("Adobe"),
                "Ordering" => lopdf::Object::string_literal("Identity"),
                "Supplement" => Integer(0),
            }),
        );
        dict.set("FontDescriptor", lopdf::Object::Reference((descriptor_obj, 0)));
        dict.set("CIDToGIDMap", Name(b"Identity".to_vec()));
        dict.set("DW", Integer(1000));
        dict.set("W", Array(vec![Integer(0), Array(widths)]));
        dict
    }

    /// The `/FontDescriptor` dictionary for a subset.
    pub(crate) fn font_descriptor_dict(
        &self,
        subset: FontSubsetId,
        base_font_name: &str,
        font_file_obj: u32,
    ) -> LoDictionary {
        let loaded = &self.fonts[subset.font.index()];
        let units_per_em = loaded.face.units_per_em().max(1) as f32;
        let scale = 1000.0 / units_per_em;
        let bbox = loaded.face.bounding_box();

        let mut dict = LoDictionary::new();
        dict.set("Type", Name(b"FontDescriptor".to_vec()));
        dict.set("FontName", Name(base_font_name.as_bytes().to_vec()));
        dict.set("Flags", Integer(4));
        dict.set(
            "FontBBox",
            Array(vec![
                Real(bbox[0] as f32 * scale),
                Real(bbox[1] as f32 * scale),
                Real(bbox[2] as f32 * scale),
                Real(bbox[3] as f32 * scale),
            ]),
        );
        dict.set("ItalicAngle", Integer(0));
        dict.set("Ascent", Real(loaded.face.ascent() as f32 * scale));
        dict.set("Descent", Real(loaded.face.descent() as f32 * scale));
        dict.set("CapHeight", Real(loaded.face.ascent() as f32 * scale));
        dict.set("StemV", Integer(80));
        dict.set("FontFile2", lopdf::Object::Reference((font_file_obj, 0)));
        dict
    }

    /// The Type 0 composite font dictionary wrapping a subset's descendant.
    pub(crate) fn type0_font_dict(base_font_name: &str, descendant_obj: u32) -> LoDictionary {
        let mut dict = LoDictionary::new();
        dict.set("Type", Name(b"Font".to_vec()));
        dict.set("Subtype", Name(b"Type0".to_vec()));
        dict.set("BaseFont", Name(base_font_name.as_bytes().to_vec()));
        dict.set("Encoding", Name(b"Identity-H".to_vec()));
        dict.set(
            "DescendantFonts",
            Array(vec![lopdf::Object::Reference((descendant_obj, 0))]),
        );
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubFace {
        glyphs: HashMap<char, u16>,
        kerning: HashMap<(u16, u16), i32>,
    }

    impl FontFace for StubFace {
        fn glyph_index(&self, codepoint: char) -> Option<u16> {
            self.glyphs.get(&codepoint).copied()
        }
        fn advance_width(&self, _glyph: u16) -> u16 {
            500
        }
        fn kerning(&self, left_glyph: u16, right_glyph: u16) -> Option<i32> {
            self.kerning.get(&(left_glyph, right_glyph)).copied()
        }
        fn units_per_em(&self) -> u16 {
            1000
        }
        fn raw_bytes(&self) -> &[u8] {
            &[]
        }
        fn ascent(&self) -> i16 {
            800
        }
        fn descent(&self) -> i16 {
            -200
        }
        fn bounding_box(&self) -> [i16; 4] {
            [0, -200, 1000, 800]
        }
    }

    fn stub_manager() -> (FontManager, FontId) {
        let mut glyphs = HashMap::new();
        glyphs.insert('A', 0x41);
        glyphs.insert('f', 0x66);
        let face = StubFace {
            glyphs,
            kerning: HashMap::new(),
        };
        let mut manager = FontManager::new();
        let id = manager.load(Box::new(face));
        (manager, id)
    }

    #[test]
    fn subset_assignment_reuses_codepoints() {
        let (mut manager, font) = stub_manager();
        let (subset_a, local_a) = manager.assign(font, 'A');
        let (subset_a_again, local_a_again) = manager.assign(font, 'A');
        assert_eq!(subset_a, subset_a_again);
        assert_eq!(local_a, local_a_again);
    }

    #[test]
    fn subset_boundary_splits_after_255_glyphs() {
        let (mut manager, font) = stub_manager();
        let mut glyphs = HashMap::new();
        for i in 0..300u32 {
            if let Some(c) = char::from_u32(0x2000 + i) {
                glyphs.insert(c, i as u16);
            }
        }
        let face = StubFace {
            glyphs,
            kerning: HashMap::new(),
        };
        let id = manager.load(Box::new(face));
        let mut subsets = std::collections::HashSet::new();
        for i in 0..300u32 {
            if let Some(c) = char::from_u32(0x2000 + i) {
                let (subset, _local) = manager.assign(id, c);
                subsets.insert(subset);
            }
        }
        assert!(subsets.len() >= 2);
    }

    #[test]
    fn first_two_glyphs_get_local_ids_one_and_two() {
        let (mut manager, font) = stub_manager();
        let (_, local_a) = manager.assign(font, 'A');
        let (_, local_f) = manager.assign(font, 'f');
        assert_eq!(local_a, 1);
        assert_eq!(local_f, 2);
    }
}
