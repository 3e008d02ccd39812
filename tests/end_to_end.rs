//! Full-document integration tests: each test opens a real file under the
//! OS temp directory, drives the public API to build one document, closes
//! it, then reads the bytes back and checks the file-level invariants
//! (header, xref shape, trailer, uncompressed dictionaries) a PDF consumer
//! would rely on. Content-stream operator order (kerning, path ops) is
//! covered at the unit level in `content.rs`, since the stream bytes here
//! are deflate-compressed and not worth inflating just to re-assert what
//! those tests already check.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use pretty_assertions::assert_eq;

use pdfassembler::color::{Color, DeviceCmyk, DeviceRgb, SeparationColor};
use pdfassembler::ctm::CurTransMat;
use pdfassembler::font::BuiltinFont;
use pdfassembler::units::{Pt, Px};
use pdfassembler::{
    DecodedImage, DocumentAssembler, DocumentOptions, ImageColorSpace, OutputColorSpace, PageBox,
};

static COUNTER: AtomicU32 = AtomicU32::new(0);

fn temp_pdf_path(name: &str) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("pdfassembler_test_{name}_{}_{n}.pdf", std::process::id()))
}

fn read_back(path: &Path) -> Vec<u8> {
    std::fs::read(path).expect("document file should exist after close")
}

/// Every produced file starts with the 1.7 header and a binary marker
/// comment whose bytes all have the high bit set.
fn assert_header(bytes: &[u8]) {
    assert!(bytes.starts_with(b"%PDF-1.7\n%"));
    let marker = &bytes[10..14];
    assert!(marker.iter().all(|b| *b >= 0x80));
}

fn assert_trailer_size(bytes: &[u8], expected_size: u32) {
    let text = String::from_utf8_lossy(bytes);
    let needle = format!("/Size {expected_size}\n");
    assert!(
        text.contains(&needle),
        "expected trailer `/Size {expected_size}`, got tail:\n{}",
        &text[text.len().saturating_sub(300)..]
    );
    assert!(text.trim_end().ends_with("%%EOF"));
}

#[test]
fn empty_document_has_minimal_structure() {
    let path = temp_pdf_path("empty");
    let mut doc = DocumentAssembler::open(&path, DocumentOptions::default()).unwrap();
    doc.close().unwrap();

    let bytes = read_back(&path);
    assert_header(&bytes);
    // object 1: info, object 2: pages root, object 3: catalog -> xref Size 4.
    assert_trailer_size(&bytes, 4);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Count 0"));

    std::fs::remove_file(&path).ok();
}

#[test]
fn single_page_rgb_stroked_line() {
    let path = temp_pdf_path("rgb_line");
    let mut doc = DocumentAssembler::open(
        &path,
        DocumentOptions {
            default_page_box: PageBox::a4(),
            ..Default::default()
        },
    )
    .unwrap();

    let mut page = doc.new_page_builder();
    {
        let content = page.content();
        content.set_stroke_color(Color::Rgb(DeviceRgb::new(1.0, 0.0, 0.0))).unwrap();
        content.move_to(Pt(0.0), Pt(0.0)).unwrap();
        content.line_to(Pt(100.0), Pt(100.0)).unwrap();
        content.stroke().unwrap();
    }
    doc.add_page(page).unwrap();
    doc.close().unwrap();

    let bytes = read_back(&path);
    assert_header(&bytes);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Type /Page"));
    assert!(text.contains("/Count 1"));

    std::fs::remove_file(&path).ok();
}

#[test]
fn page_with_one_image() {
    let path = temp_pdf_path("image");
    let mut doc = DocumentAssembler::open(&path, DocumentOptions::default()).unwrap();

    let pixels = vec![
        255, 0, 0, // red
        0, 255, 0, // green
        0, 0, 255, // blue
        255, 255, 0, // yellow
    ];
    let image = DecodedImage::new(Px(2), Px(2), ImageColorSpace::Rgb, pixels).unwrap();
    let image_id = doc.load_image(image).unwrap();

    let mut page = doc.new_page_builder();
    page.content().draw_image(image_id).unwrap();
    doc.add_page(page).unwrap();
    doc.close().unwrap();

    let bytes = read_back(&path);
    assert_header(&bytes);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Subtype /Image"));
    assert!(text.contains("/XObject"));

    std::fs::remove_file(&path).ok();
}

#[test]
fn cmyk_separation_filled_square() {
    let path = temp_pdf_path("separation");
    let mut doc = DocumentAssembler::open(
        &path,
        DocumentOptions {
            output_colorspace: OutputColorSpace::Cmyk,
            ..Default::default()
        },
    )
    .unwrap();

    let spot = doc
        .create_separation("PantoneCoolGray", DeviceCmyk::new(0.0, 0.0, 0.0, 0.3))
        .unwrap();

    let mut page = doc.new_page_builder();
    {
        let content = page.content();
        content
            .set_fill_color(Color::Separation(SeparationColor {
                separation: spot,
                tint: 1.0.into(),
            }))
            .unwrap();
        content.rect(Pt(10.0), Pt(10.0), Pt(50.0), Pt(50.0)).unwrap();
        content.fill_nonzero().unwrap();
    }
    doc.add_page(page).unwrap();
    doc.close().unwrap();

    let bytes = read_back(&path);
    assert_header(&bytes);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Separation"));
    assert!(text.contains("PantoneCoolGray"));

    std::fs::remove_file(&path).ok();
}

#[test]
fn two_page_document_with_rotated_second_page() {
    let path = temp_pdf_path("rotated");
    let mut doc = DocumentAssembler::open(&path, DocumentOptions::default()).unwrap();

    let first = doc.new_page_builder();
    doc.add_page(first).unwrap();

    let mut second = doc.new_page_builder();
    {
        let content = second.content();
        let mut scope = content.scoped_graphics_state().unwrap();
        scope.apply_ctm(CurTransMat::Rotate(90.0)).unwrap();
        scope.move_to(Pt(0.0), Pt(0.0)).unwrap();
        scope.line_to(Pt(50.0), Pt(0.0)).unwrap();
        scope.stroke().unwrap();
    }
    doc.add_page(second).unwrap();
    doc.close().unwrap();

    let bytes = read_back(&path);
    assert_header(&bytes);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Count 2"));
    // two distinct Page dictionaries, both children of the same Pages root.
    assert_eq!(text.matches("/Type /Page ").count(), 2);

    std::fs::remove_file(&path).ok();
}

#[test]
fn page_with_builtin_font_text_gets_a_font_resource_entry() {
    let path = temp_pdf_path("builtin_font");
    let mut doc = DocumentAssembler::open(&path, DocumentOptions::default()).unwrap();

    let font_obj = doc.add_builtin_font(BuiltinFont::Helvetica).unwrap();

    let mut page = doc.new_page_builder();
    page.content()
        .render_ascii_text_builtin(font_obj, 12.0, Pt(10.0), Pt(10.0), "Hello")
        .unwrap();
    doc.add_page(page).unwrap();
    doc.close().unwrap();

    let bytes = read_back(&path);
    assert_header(&bytes);
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/BaseFont /Helvetica"));
    assert!(
        text.contains(&format!("/Font{font_obj} {font_obj} 0 R")),
        "expected the page's /Font resource dict to key the builtin font by its object number, got tail:\n{}",
        &text[text.len().saturating_sub(600)..]
    );

    std::fs::remove_file(&path).ok();
}

#[test]
fn closing_twice_is_rejected() {
    let path = temp_pdf_path("double_close");
    let mut doc = DocumentAssembler::open(&path, DocumentOptions::default()).unwrap();
    doc.close().unwrap();
    assert!(doc.close().is_err());

    std::fs::remove_file(&path).ok();
}
