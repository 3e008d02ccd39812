//! Minimal parser for the legacy TrueType `kern` table (version 0, format 0
//! subtables) -- enough to expose pairwise kerning without pulling in a full
//! GPOS layout engine.

use std::collections::HashMap;

/// Parses every format-0 subtable of a `kern` table into one pairwise map.
/// Unknown subtable formats are skipped rather than rejected, since a font
/// with an unsupported subtable format should still yield whatever pairs it
/// does understand.
pub(crate) fn parse_pairwise(kern_table: &[u8]) -> HashMap<(u16, u16), i16> {
    let mut pairs = HashMap::new();
    if kern_table.len() < 4 {
        return pairs;
    }
    let n_tables = u16::from_be_bytes([kern_table[2], kern_table[3]]) as usize;
    let mut offset = 4usize;

    for _ in 0..n_tables {
        if offset + 6 > kern_table.len() {
            break;
        }
        let length = u16::from_be_bytes([kern_table[offset + 2], kern_table[offset + 3]]) as usize;
        let coverage = u16::from_be_bytes([kern_table[offset + 4], kern_table[offset + 5]]);
        let format = coverage >> 8;
        let subtable_end = (offset + length).min(kern_table.len());

        if format == 0 {
            let body = offset + 6;
            if body + 2 <= subtable_end {
                let n_pairs = u16::from_be_bytes([kern_table[body], kern_table[body + 1]]) as usize;
                let mut pair_offset = body + 8;
                for _ in 0..n_pairs {
                    if pair_offset + 6 > subtable_end {
                        break;
                    }
                    let left = u16::from_be_bytes([kern_table[pair_offset], kern_table[pair_offset + 1]]);
                    let right =
                        u16::from_be_bytes([kern_table[pair_offset + 2], kern_table[pair_offset + 3]]);
                    let value = i16::from_be_bytes([
                        kern_table[pair_offset + 4],
                        kern_table[pair_offset + 5],
                    ]);
                    pairs.insert((left, right), value);
                    pair_offset += 6;
                }
            }
        }

        if length == 0 {
            break;
        }
        offset += length;
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_format0_kern_table(pairs: &[(u16, u16, i16)]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&(pairs.len() as u16).to_be_bytes());
        body.extend_from_slice(&0u16.to_be_bytes()); // searchRange
        body.extend_from_slice(&0u16.to_be_bytes()); // entrySelector
        body.extend_from_slice(&0u16.to_be_bytes()); // rangeShift
        for (l, r, v) in pairs {
            body.extend_from_slice(&l.to_be_bytes());
            body.extend_from_slice(&r.to_be_bytes());
            body.extend_from_slice(&v.to_be_bytes());
        }

        let subtable_len = (6 + body.len()) as u16;
        let mut subtable = Vec::new();
        subtable.extend_from_slice(&0u16.to_be_bytes()); // subtable version
        subtable.extend_from_slice(&subtable_len.to_be_bytes());
        subtable.extend_from_slice(&0u16.to_be_bytes()); // coverage: format 0
        subtable.extend_from_slice(&body);

        let mut table = Vec::new();
        table.extend_from_slice(&0u16.to_be_bytes()); // table version
        table.extend_from_slice(&1u16.to_be_bytes()); // nTables
        table.extend_from_slice(&subtable);
        table
    }

    #[test]
    fn parses_a_single_pair() {
        let table = build_format0_kern_table(&[(0x0041, 0x0066, -50)]);
        let pairs = parse_pairwise(&table);
        assert_eq!(pairs.get(&(0x0041, 0x0066)), Some(&-50));
    }

    #[test]
    fn empty_table_yields_no_pairs() {
        assert!(parse_pairwise(&[]).is_empty());
    }
}
