//! Small helpers: a non-cryptographic RNG for document IDs, and the PDF
//! string/name escaping rules from `§4.1`.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Since the random number generator doesn't have to be cryptographically
/// secure it doesn't make sense to import the entire `rand` library, so this
/// is just a xorshift pseudo-random function.
static RAND_SEED: AtomicUsize = AtomicUsize::new(2100);

/// Xorshift-based random number generator. Impure function.
pub(crate) fn random_number() -> usize {
    let mut x = RAND_SEED.fetch_add(21, Ordering::SeqCst);
    #[cfg(target_pointer_width = "64")]
    {
        x ^= x << 21;
        x ^= x >> 35;
        x ^= x << 4;
        x
    }

    #[cfg(target_pointer_width = "32")]
    {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        x
    }
}

/// `0 => A`, `1 => B`, and so on.
#[inline(always)]
fn u8_to_char(input: u8) -> char {
    (b'A' + input) as char
}

/// Returns a string with 32 random characters, used as the PDF document ID.
pub(crate) fn random_character_string_32() -> String {
    const MAX_CHARS: usize = 32;
    let mut final_string = String::with_capacity(MAX_CHARS);
    let mut char_pos = 0;

    'outer: while char_pos < MAX_CHARS {
        let rand = format!("{}", random_number());
        for ch in rand.chars() {
            if char_pos < MAX_CHARS {
                final_string.push(u8_to_char(ch.to_digit(10).unwrap() as u8));
                char_pos += 1;
            } else {
                break 'outer;
            }
        }
    }

    final_string
}

/// Escapes a literal string for use inside `( ... )`: `(`, `)` and `\` get a
/// preceding backslash. ASCII-only callers (content-stream literal strings)
/// use this directly.
pub(crate) fn escape_pdf_literal_string(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Encodes a string as a PDF literal string with the `FE FF` UTF-16BE BOM,
/// used in the info dictionary for non-ASCII metadata (title, author, ...).
pub(crate) fn utf16be_hex_literal(input: &str) -> String {
    let mut units: Vec<u16> = vec![0xFEFF];
    units.extend(input.encode_utf16());
    units
        .into_iter()
        .flat_map(|u| u.to_be_bytes())
        .map(|b| format!("{b:02X}"))
        .collect()
}

/// Hex-escapes any byte of a PDF name outside the printable, non-delimiter
/// ASCII range, per the `§4.1` name-escaping rule.
pub(crate) fn escape_pdf_name(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 1);
    out.push('/');
    for byte in input.bytes() {
        let is_regular = byte > 0x20
            && byte < 0x7f
            && !matches!(
                byte,
                b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#'
            );
        if is_regular {
            out.push(byte as char);
        } else {
            out.push_str(&format!("#{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_string_is_32_uppercase_letters() {
        let s = random_character_string_32();
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn escapes_parens_and_backslash() {
        assert_eq!(escape_pdf_literal_string("a(b)c\\d"), "a\\(b\\)c\\\\d");
    }

    #[test]
    fn utf16_literal_has_bom_prefix() {
        let hex = utf16be_hex_literal("A");
        assert_eq!(&hex[0..4], "FEFF");
        assert_eq!(&hex[4..8], "0041");
    }

    #[test]
    fn name_escapes_space_and_hash() {
        assert_eq!(escape_pdf_name("a b#c"), "/a#20b#23c");
    }

    #[test]
    fn name_passes_through_plain_identifier() {
        assert_eq!(escape_pdf_name("Image3"), "/Image3");
    }
}
