//! Builds a standalone TrueType byte stream containing only a subset's
//! required tables, with glyph indices renumbered to a dense `0..count`
//! range matching the CIDs used in content (so `/CIDToGIDMap /Identity`
//! holds).

use std::collections::HashMap;

use allsorts::binary::read::ReadScope;
use allsorts::font_data::FontData;
use allsorts::tables::FontTableProvider;

use crate::errors::{FormatError, Result};

/// Subsets `font_bytes` down to `glyph_ids`, in the given order: the glyph
/// at position `i` becomes glyph `i` of the emitted subset font. Callers
/// pass `.notdef` (glyph 0) first so the font manager's local byte glyph
/// ids line up 1:1 with the subset's own glyph indices -- exactly what lets
/// the descendant font declare `/CIDToGIDMap /Identity`.
pub(crate) fn subset(font_bytes: &[u8], glyph_ids: &[u16]) -> Result<(Vec<u8>, HashMap<u16, u16>)> {
    let font_file = ReadScope::new(font_bytes)
        .read::<FontData<'_>>()
        .map_err(|e| FormatError::Font(e.to_string()))?;
    let provider = font_file
        .table_provider(0)
        .map_err(|e| FormatError::Font(e.to_string()))?;

    let new_font = allsorts::subset::subset(&provider, glyph_ids)
        .map_err(|e| FormatError::Font(e.to_string()))?;

    let mapping: HashMap<u16, u16> = glyph_ids
        .iter()
        .enumerate()
        .map(|(new_gid, &old_gid)| (old_gid, new_gid as u16))
        .collect();

    Ok((new_font, mapping))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_preserves_caller_supplied_order() {
        let ids = [0u16, 10, 3, 7];
        let mapping: HashMap<u16, u16> = ids
            .iter()
            .enumerate()
            .map(|(new, &old)| (old, new as u16))
            .collect();
        assert_eq!(mapping[&0], 0);
        assert_eq!(mapping[&10], 1);
        assert_eq!(mapping[&3], 2);
        assert_eq!(mapping[&7], 3);
    }
}
