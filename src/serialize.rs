//! Low-level PDF object encoder: turns a `lopdf::Object` into the exact
//! bytes the write protocol puts inside `N 0 obj ... endobj`. This does not
//! go through `lopdf::Document`'s own writer -- the assembler controls
//! every byte of the header, xref and trailer itself.

use lopdf::Object;
use lopdf::StringFormat;

use crate::utils::{escape_pdf_literal_string, escape_pdf_name};

/// Appends the encoded form of `obj` to `out`.
pub(crate) fn write_object(out: &mut Vec<u8>, obj: &Object) {
    match obj {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Object::Real(r) => out.extend_from_slice(format_real(*r).as_bytes()),
        Object::String(bytes, format) => write_string(out, bytes, *format),
        Object::Name(name) => {
            let text = String::from_utf8_lossy(name);
            out.extend_from_slice(escape_pdf_name(&text).as_bytes());
        }
        Object::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                write_object(out, item);
            }
            out.push(b']');
        }
        Object::Dictionary(dict) => write_dictionary(out, dict),
        Object::Reference((num, gen)) => {
            out.extend_from_slice(format!("{num} {gen} R").as_bytes());
        }
        Object::Stream(stream) => {
            write_dictionary(out, &stream.dict);
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(&stream.content);
            out.extend_from_slice(b"\nendstream");
        }
    }
}

fn write_dictionary(out: &mut Vec<u8>, dict: &lopdf::Dictionary) {
    out.extend_from_slice(b"<<");
    for (key, value) in dict.iter() {
        out.push(b' ');
        let name = String::from_utf8_lossy(key);
        out.extend_from_slice(escape_pdf_name(&name).as_bytes());
        out.push(b' ');
        write_object(out, value);
    }
    out.extend_from_slice(b" >>");
}

fn write_string(out: &mut Vec<u8>, bytes: &[u8], format: StringFormat) {
    match format {
        StringFormat::Literal => {
            out.push(b'(');
            let text = String::from_utf8_lossy(bytes);
            out.extend_from_slice(escape_pdf_literal_string(&text).as_bytes());
            out.push(b')');
        }
        StringFormat::Hexadecimal => {
            out.push(b'<');
            for byte in bytes {
                out.extend_from_slice(format!("{byte:02X}").as_bytes());
            }
            out.push(b'>');
        }
    }
}

/// PDF real numbers have no exponent notation and no trailing `.0` is
/// required, but a trailing `.` alone is not valid -- match what readers
/// expect by always keeping at least one fractional digit when non-integral
/// and trimming otherwise.
fn format_real(value: f32) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let mut s = format!("{value:.6}");
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        s
    }
}

/// Encodes a UTF-16BE hex literal string object for non-ASCII info-dict
/// metadata (`§4.1`'s string-escaping rule).
pub(crate) fn utf16_literal_object(text: &str) -> Object {
    Object::String(
        crate::utils::utf16be_hex_literal(text).into_bytes(),
        StringFormat::Hexadecimal,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Dictionary as LoDictionary;

    #[test]
    fn integer_round_trips_without_decimal() {
        let mut out = Vec::new();
        write_object(&mut out, &Object::Real(5.0));
        assert_eq!(out, b"5");
    }

    #[test]
    fn fractional_real_keeps_digits() {
        let mut out = Vec::new();
        write_object(&mut out, &Object::Real(0.5));
        assert_eq!(String::from_utf8(out).unwrap(), "0.5");
    }

    #[test]
    fn literal_string_escapes_parens() {
        let mut out = Vec::new();
        write_object(&mut out, &Object::String(b"a(b)".to_vec(), StringFormat::Literal));
        assert_eq!(String::from_utf8(out).unwrap(), "(a\\(b\\))");
    }

    #[test]
    fn hex_string_is_uppercase_pairs() {
        let mut out = Vec::new();
        write_object(&mut out, &Object::String(vec![0x41, 0x01], StringFormat::Hexadecimal));
        assert_eq!(String::from_utf8(out).unwrap(), "<4101>");
    }

    #[test]
    fn dictionary_renders_key_value_pairs() {
        let mut dict = LoDictionary::new();
        dict.set("Type", Object::Name(b"Catalog".to_vec()));
        let mut out = Vec::new();
        write_object(&mut out, &Object::Dictionary(dict));
        assert_eq!(String::from_utf8(out).unwrap(), "<< /Type /Catalog >>");
    }

    #[test]
    fn reference_renders_generation_zero() {
        let mut out = Vec::new();
        write_object(&mut out, &Object::Reference((3, 0)));
        assert_eq!(String::from_utf8(out).unwrap(), "3 0 R");
    }
}
