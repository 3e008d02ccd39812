//! Content-stream operator builder: records one page's (or form XObject's)
//! operator sequence plus the resource ids that sequence references, so the
//! assembler can emit a resource dictionary enumerating exactly what's used.

use std::collections::BTreeSet;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};

use lopdf::content::Operation;
use lopdf::Object::{Integer, Name, Real, String as LoString};
use lopdf::StringFormat;

use crate::color::{Color, LimitDouble};
use crate::constants::*;
use crate::ctm::{CurTransMat, TextMatrix};
use crate::errors::{invariant, Result, StateError, ValidationError};
use crate::font::FontManager;
use crate::gstate::{LineCapStyle, LineJoinStyle};
use crate::icc_profile::{ColorConverter, OutputColorSpace};
use crate::ids::{
    FontSubsetId, FormXObjectId, GraphicsStateId, IccColorSpaceId, ImageId, LabColorSpaceId, PatternId,
};
use crate::units::Pt;
use crate::utils::escape_pdf_literal_string;

/// Every resource id a content stream has referenced, recorded as operators
/// are emitted. Drained by the assembler into the page's resource
/// dictionary at finalize.
#[derive(Debug, Default, Clone)]
pub struct UsedResources {
    pub images: BTreeSet<ImageId>,
    /// Whole (non-subset) font object numbers referenced by `Tf`, e.g. from
    /// a builtin font or raw-glyph rendering.
    pub fonts: BTreeSet<u32>,
    pub font_subsets: BTreeSet<FontSubsetId>,
    pub icc_color_spaces: BTreeSet<IccColorSpaceId>,
    pub lab_color_spaces: BTreeSet<LabColorSpaceId>,
    pub separations: BTreeSet<crate::ids::SeparationId>,
    pub uses_all_separation: bool,
    pub patterns: BTreeSet<PatternId>,
    pub graphics_states: BTreeSet<GraphicsStateId>,
    pub forms: BTreeSet<FormXObjectId>,
}

/// Records content-stream operators and the resources they reference. One
/// builder backs one page or one form XObject; `finalize()` hands both
/// halves to the assembler and the builder becomes unusable.
pub struct ContentBuilder {
    fonts: Arc<Mutex<FontManager>>,
    converter: Arc<ColorConverter>,
    output_space: OutputColorSpace,
    operations: Vec<Operation>,
    used: UsedResources,
    in_text_object: bool,
    finalized: bool,
}

impl ContentBuilder {
    pub(crate) fn new(
        fonts: Arc<Mutex<FontManager>>,
        converter: Arc<ColorConverter>,
        output_space: OutputColorSpace,
    ) -> Self {
        Self {
            fonts,
            converter,
            output_space,
            operations: Vec::new(),
            used: UsedResources::default(),
            in_text_object: false,
            finalized: false,
        }
    }

    fn push(&mut self, op: Operation) {
        self.operations.push(op);
    }

    fn guard_finalized(&self) -> Result<()> {
        if self.finalized {
            return Err(StateError::BuilderFinalized.into());
        }
        Ok(())
    }

    // -- graphics state stack --------------------------------------------

    pub fn save_graphics_state(&mut self) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new("q", vec![]));
        Ok(())
    }

    pub fn restore_graphics_state(&mut self) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new("Q", vec![]));
        Ok(())
    }

    /// Acquires a `q`/`Q` scope: `Q` is emitted automatically when the
    /// returned guard drops, on every exit path including an error/panic
    /// unwind between acquisition and release.
    pub fn scoped_graphics_state(&mut self) -> Result<GraphicsStateScope<'_>> {
        self.save_graphics_state()?;
        Ok(GraphicsStateScope { builder: self })
    }

    // -- path construction ------------------------------------------------

    pub fn move_to(&mut self, x: Pt, y: Pt) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new(OP_PATH_CONST_MOVE_TO, vec![x.into(), y.into()]));
        Ok(())
    }

    pub fn line_to(&mut self, x: Pt, y: Pt) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new(OP_PATH_CONST_LINE_TO, vec![x.into(), y.into()]));
        Ok(())
    }

    pub fn curve_to(&mut self, x1: Pt, y1: Pt, x2: Pt, y2: Pt, x3: Pt, y3: Pt) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new(
            OP_PATH_CONST_4BEZIER,
            vec![x1.into(), y1.into(), x2.into(), y2.into(), x3.into(), y3.into()],
        ));
        Ok(())
    }

    pub fn rect(&mut self, x: Pt, y: Pt, w: Pt, h: Pt) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new(OP_PATH_CONST_RECT, vec![x.into(), y.into(), w.into(), h.into()]));
        Ok(())
    }

    pub fn close_path(&mut self) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new(OP_PATH_CONST_CLOSE_SUBPATH, vec![]));
        Ok(())
    }

    // -- painting -----------------------------------------------------------

    pub fn stroke(&mut self) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new(OP_PATH_PAINT_STROKE, vec![]));
        Ok(())
    }

    pub fn close_and_stroke(&mut self) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new(OP_PATH_PAINT_STROKE_CLOSE, vec![]));
        Ok(())
    }

    pub fn fill_nonzero(&mut self) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new(OP_PATH_PAINT_FILL_NZ, vec![]));
        Ok(())
    }

    pub fn fill_and_stroke_nonzero(&mut self) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new(OP_PATH_PAINT_FILL_STROKE_NZ, vec![]));
        Ok(())
    }

    pub fn fill_and_stroke_evenodd(&mut self) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new(OP_PATH_PAINT_FILL_STROKE_EO, vec![]));
        Ok(())
    }

    pub fn end_path_no_paint(&mut self) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new(OP_PATH_PAINT_END, vec![]));
        Ok(())
    }

    pub fn clip_nonzero(&mut self) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new(OP_PATH_CONST_CLIP_NZ, vec![]));
        Ok(())
    }

    pub fn clip_evenodd(&mut self) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new(OP_PATH_CONST_CLIP_EO, vec![]));
        Ok(())
    }

    // -- line parameters ------------------------------------------------

    pub fn set_line_width(&mut self, width: f32) -> Result<()> {
        self.guard_finalized()?;
        if width < 0.0 {
            return Err(ValidationError::NegativeLineWidth.into());
        }
        self.push(Operation::new(OP_PATH_STATE_SET_LINE_WIDTH, vec![Real(width)]));
        Ok(())
    }

    pub fn set_line_cap(&mut self, cap: LineCapStyle) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new(OP_PATH_STATE_SET_LINE_CAP, vec![Integer(cap.pdf_value())]));
        Ok(())
    }

    pub fn set_line_join(&mut self, join: LineJoinStyle) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new(OP_PATH_STATE_SET_LINE_JOIN, vec![Integer(join.pdf_value())]));
        Ok(())
    }

    // -- CTM ---------------------------------------------------------------

    pub fn apply_ctm(&mut self, ctm: CurTransMat) -> Result<()> {
        self.guard_finalized()?;
        let op = ctm.to_operation()?;
        self.push(op);
        Ok(())
    }

    // -- color --------------------------------------------------------------

    /// Sets the non-stroking (fill) color. If `color` is a device color and
    /// differs in kind from the document's output color space, the color
    /// converter re-expresses it in the document space first.
    pub fn set_fill_color(&mut self, color: Color) -> Result<()> {
        self.guard_finalized()?;
        let ops = self.color_operations(color, false)?;
        self.operations.extend(ops);
        Ok(())
    }

    pub fn set_stroke_color(&mut self, color: Color) -> Result<()> {
        self.guard_finalized()?;
        let ops = self.color_operations(color, true)?;
        self.operations.extend(ops);
        Ok(())
    }

    fn color_operations(&mut self, color: Color, stroking: bool) -> Result<Vec<Operation>> {
        let converted = self.convert_to_output_space(color);
        match converted {
            Color::Rgb(rgb) => {
                let op = if stroking { OP_COLOR_SET_STROKE_CS_DEVICERGB } else { OP_COLOR_SET_FILL_CS_DEVICERGB };
                Ok(vec![Operation::new(
                    op,
                    vec![
                        Real(unit_value(rgb.r)?),
                        Real(unit_value(rgb.g)?),
                        Real(unit_value(rgb.b)?),
                    ],
                )])
            }
            Color::Gray(gray) => {
                let op = if stroking { OP_COLOR_SET_STROKE_CS_DEVICEGRAY } else { OP_COLOR_SET_FILL_CS_DEVICEGRAY };
                Ok(vec![Operation::new(op, vec![Real(unit_value(gray.v)?)])])
            }
            Color::Cmyk(cmyk) => {
                let op = if stroking { OP_COLOR_SET_STROKE_CS_DEVICECMYK } else { OP_COLOR_SET_FILL_CS_DEVICECMYK };
                Ok(vec![Operation::new(
                    op,
                    vec![
                        Real(unit_value(cmyk.c)?),
                        Real(unit_value(cmyk.m)?),
                        Real(unit_value(cmyk.y)?),
                        Real(unit_value(cmyk.k)?),
                    ],
                )])
            }
            Color::Icc(icc) => {
                self.used.icc_color_spaces.insert(icc.space);
                let cs_op = if stroking { OP_COLOR_SET_STROKE_CS } else { OP_COLOR_SET_FILL_CS };
                let scn_op = if stroking { OP_COLOR_SET_STROKE_COLOR_ICC } else { OP_COLOR_SET_FILL_COLOR_ICC };
                // Prefixed by kind (I/L/S) since ICC, Lab and Separation ids are
                // independent counters -- a bare index would collide across kinds.
                let name = format!("CSpaceI{}", icc.space.index());
                let values = icc
                    .values
                    .iter()
                    .map(|v| unit_value(*v).map(Real))
                    .collect::<Result<Vec<_>>>()?;
                Ok(vec![
                    Operation::new(cs_op, vec![Name(name.into_bytes())]),
                    Operation::new(scn_op, values),
                ])
            }
            Color::Lab(lab) => {
                self.used.lab_color_spaces.insert(lab.space);
                let cs_op = if stroking { OP_COLOR_SET_STROKE_CS } else { OP_COLOR_SET_FILL_CS };
                let scn_op = if stroking { OP_COLOR_SET_STROKE_COLOR_ICC } else { OP_COLOR_SET_FILL_COLOR_ICC };
                let name = format!("CSpaceL{}", lab.space.index());
                Ok(vec![
                    Operation::new(cs_op, vec![Name(name.into_bytes())]),
                    Operation::new(scn_op, vec![Real(lab.l), Real(lab.a), Real(lab.b)]),
                ])
            }
            Color::Separation(sep) => {
                self.used.separations.insert(sep.separation);
                let cs_op = if stroking { OP_COLOR_SET_STROKE_CS } else { OP_COLOR_SET_FILL_CS };
                let scn_op = if stroking { OP_COLOR_SET_STROKE_COLOR_ICC } else { OP_COLOR_SET_FILL_COLOR_ICC };
                let name = format!("CSpaceS{}", sep.separation.index());
                Ok(vec![
                    Operation::new(cs_op, vec![Name(name.into_bytes())]),
                    Operation::new(scn_op, vec![Real(unit_value(sep.tint)?)]),
                ])
            }
            Color::AllSeparation(tint) => {
                self.used.uses_all_separation = true;
                let cs_op = if stroking { OP_COLOR_SET_STROKE_CS } else { OP_COLOR_SET_FILL_CS };
                let scn_op = if stroking { OP_COLOR_SET_STROKE_COLOR_ICC } else { OP_COLOR_SET_FILL_COLOR_ICC };
                Ok(vec![
                    Operation::new(cs_op, vec![Name(b"All".to_vec())]),
                    Operation::new(scn_op, vec![Real(unit_value(tint)?)]),
                ])
            }
            Color::Pattern(pattern) => {
                self.used.patterns.insert(pattern);
                let cs_op = if stroking { OP_COLOR_SET_STROKE_CS } else { OP_COLOR_SET_FILL_CS };
                let scn_op = if stroking { OP_COLOR_SET_STROKE_COLOR_ICC } else { OP_COLOR_SET_FILL_COLOR_ICC };
                let name = format!("P{}", pattern.index());
                Ok(vec![
                    Operation::new(cs_op, vec![Name(b"Pattern".to_vec())]),
                    Operation::new(scn_op, vec![Name(name.into_bytes())]),
                ])
            }
        }
    }

    fn convert_to_output_space(&self, color: Color) -> Color {
        match (self.output_space, &color) {
            (OutputColorSpace::Rgb, Color::Cmyk(c)) => Color::Rgb(self.converter.to_rgb_from_cmyk(*c)),
            (OutputColorSpace::Rgb, Color::Gray(g)) => Color::Rgb(self.converter.to_rgb_from_gray(*g)),
            (OutputColorSpace::Gray, Color::Rgb(r)) => Color::Gray(self.converter.to_gray(*r)),
            (OutputColorSpace::Gray, Color::Cmyk(c)) => {
                Color::Gray(self.converter.to_gray(self.converter.to_rgb_from_cmyk(*c)))
            }
            (OutputColorSpace::Cmyk, Color::Rgb(r)) => Color::Cmyk(self.converter.to_cmyk(*r)),
            (OutputColorSpace::Cmyk, Color::Gray(g)) => {
                Color::Cmyk(self.converter.to_cmyk(self.converter.to_rgb_from_gray(*g)))
            }
            _ => color,
        }
    }

    // -- external resources ------------------------------------------------

    pub fn draw_image(&mut self, image: ImageId) -> Result<()> {
        self.guard_finalized()?;
        self.used.images.insert(image);
        let name = format!("Image{}", image.index());
        self.push(Operation::new("Do", vec![Name(name.into_bytes())]));
        Ok(())
    }

    pub fn apply_graphics_state(&mut self, gstate: GraphicsStateId) -> Result<()> {
        self.guard_finalized()?;
        self.used.graphics_states.insert(gstate);
        let name = format!("GS{}", gstate.index());
        self.push(Operation::new(OP_PATH_STATE_SET_GS_FROM_PARAM_DICT, vec![Name(name.into_bytes())]));
        Ok(())
    }

    /// Invokes a previously finalized form XObject with `Do`, the same way
    /// `draw_image` invokes an image XObject.
    pub fn draw_form(&mut self, form: FormXObjectId) -> Result<()> {
        self.guard_finalized()?;
        self.used.forms.insert(form);
        let name = format!("Form{}", form.index());
        self.push(Operation::new("Do", vec![Name(name.into_bytes())]));
        Ok(())
    }

    // -- text objects --------------------------------------------------------

    pub fn begin_text(&mut self) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new("BT", vec![]));
        self.in_text_object = true;
        Ok(())
    }

    pub fn end_text(&mut self) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new("ET", vec![]));
        self.in_text_object = false;
        Ok(())
    }

    pub fn set_text_position(&mut self, x: Pt, y: Pt) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new("Td", vec![x.into(), y.into()]));
        Ok(())
    }

    pub fn set_text_matrix(&mut self, matrix: TextMatrix) -> Result<()> {
        self.guard_finalized()?;
        self.push(matrix.into());
        Ok(())
    }

    pub fn set_text_rendering_mode(&mut self, mode: i64) -> Result<()> {
        self.guard_finalized()?;
        self.push(Operation::new("Tr", vec![Integer(mode)]));
        Ok(())
    }

    /// `render_ascii_text_builtin`: 7-bit ASCII only, bytes >= 0x80 become
    /// spaces; parentheses and backslash are escaped.
    pub fn render_ascii_text_builtin(&mut self, font_obj: u32, size: f32, x: Pt, y: Pt, text: &str) -> Result<()> {
        self.guard_finalized()?;
        self.used.fonts.insert(font_obj);
        let ascii: String = text
            .chars()
            .map(|c| if c.is_ascii() { c } else { ' ' })
            .collect();
        let escaped = escape_pdf_literal_string(&ascii);
        let font_name = format!("Font{font_obj}");
        self.push(Operation::new("BT", vec![]));
        self.push(Operation::new("Tf", vec![Name(font_name.into_bytes()), Real(size)]));
        self.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.push(Operation::new(
            "Tj",
            vec![LoString(escaped.into_bytes(), StringFormat::Literal)],
        ));
        self.push(Operation::new("ET", vec![]));
        Ok(())
    }

    /// `render_raw_glyph`: a single glyph index rendered via its octal
    /// escape, for debugging / custom layout.
    pub fn render_raw_glyph(&mut self, font_obj: u32, size: f32, x: Pt, y: Pt, glyph: u8) -> Result<()> {
        self.guard_finalized()?;
        self.used.fonts.insert(font_obj);
        let font_name = format!("Font{font_obj}");
        let escaped = format!("\\{glyph:03o}");
        self.push(Operation::new("BT", vec![]));
        self.push(Operation::new("Tf", vec![Name(font_name.into_bytes()), Real(size)]));
        self.push(Operation::new("Td", vec![x.into(), y.into()]));
        self.push(Operation::new(
            "Tj",
            vec![LoString(escaped.into_bytes(), StringFormat::Literal)],
        ));
        self.push(Operation::new("ET", vec![]));
        Ok(())
    }

    /// `render_utf8_text`: assigns each codepoint to a font subset (opening
    /// new subsets at the 255-glyph boundary), switches `Tf` whenever the
    /// subset changes, and inserts kerning values between glyph runs inside
    /// the `TJ` array.
    pub fn render_utf8_text(&mut self, font: crate::ids::FontId, font_obj: u32, size: f32, x: Pt, y: Pt, text: &str) -> Result<()> {
        self.guard_finalized()?;
        if text.is_empty() {
            return Ok(());
        }

        self.push(Operation::new("BT", vec![]));
        self.push(Operation::new("Td", vec![x.into(), y.into()]));

        let mut current_subset: Option<FontSubsetId> = None;
        let mut run: Vec<u8> = Vec::new();
        let mut tj_array: Vec<lopdf::Object> = Vec::new();
        let mut prev_original_gid: Option<u16> = None;

        for ch in text.chars() {
            let (subset, local) = self.fonts.lock().expect("font table lock poisoned").assign(font, ch);
            self.used.font_subsets.insert(subset);

            if current_subset != Some(subset) {
                if !run.is_empty() {
                    tj_array.push(LoString(std::mem::take(&mut run), StringFormat::Hexadecimal));
                }
                if !tj_array.is_empty() {
                    self.push(Operation::new("TJ", vec![lopdf::Object::Array(std::mem::take(&mut tj_array))]));
                }
                let subset_name = format!("SFont{}-{}", font_obj, subset.subset_index);
                self.push(Operation::new("Tf", vec![Name(subset_name.into_bytes()), Real(size)]));
                current_subset = Some(subset);
                prev_original_gid = None;
            }

            let original_gid = self
                .fonts
                .lock()
                .expect("font table lock poisoned")
                .original_glyph(subset, local);
            if let Some(prev) = prev_original_gid {
                let fonts = self.fonts.lock().expect("font table lock poisoned");
                if let Some(kern) = fonts.face(font).kerning(prev, original_gid) {
                    if kern != 0 {
                        tj_array.push(LoString(std::mem::take(&mut run), StringFormat::Hexadecimal));
                        tj_array.push(Integer(kern as i64));
                    }
                }
            }

            run.extend_from_slice(&(local as u16).to_be_bytes());
            prev_original_gid = Some(original_gid);
        }

        if !run.is_empty() {
            tj_array.push(LoString(run, StringFormat::Hexadecimal));
        }
        if !tj_array.is_empty() {
            self.push(Operation::new("TJ", vec![lopdf::Object::Array(tj_array)]));
        }

        self.push(Operation::new("ET", vec![]));
        Ok(())
    }

    /// Hands the recorded operators and used-resource set to the caller
    /// (the assembler or page builder), consuming this builder's content.
    pub(crate) fn finalize(mut self) -> Result<(Vec<Operation>, UsedResources)> {
        self.guard_finalized()?;
        self.finalized = true;
        Ok((std::mem::take(&mut self.operations), std::mem::take(&mut self.used)))
    }
}

/// `LimitDouble` is supposed to make an out-of-range color channel
/// unrepresentable, so this should never trip outside of a bug in
/// `LimitDouble` itself -- guarded with `invariant` rather than trusted
/// silently, since a channel written outside `[0, 1]` produces a PDF a
/// viewer may reject.
fn unit_value(channel: LimitDouble) -> Result<f32> {
    let v = channel.value();
    invariant(v.is_finite() && (0.0..=1.0).contains(&v), "color channel value outside [0, 1]")?;
    Ok(v)
}

/// RAII guard for a `q`/`Q` scope: `Q` is emitted on drop regardless of how
/// the scope is exited.
pub struct GraphicsStateScope<'b> {
    builder: &'b mut ContentBuilder,
}

impl<'b> Deref for GraphicsStateScope<'b> {
    type Target = ContentBuilder;
    fn deref(&self) -> &Self::Target {
        self.builder
    }
}

impl<'b> DerefMut for GraphicsStateScope<'b> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.builder
    }
}

impl<'b> Drop for GraphicsStateScope<'b> {
    fn drop(&mut self) {
        if let Err(e) = self.builder.restore_graphics_state() {
            log::warn!("failed to emit Q on graphics-state scope exit: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DeviceRgb;

    fn builder(fonts: Arc<Mutex<FontManager>>, converter: Arc<ColorConverter>) -> ContentBuilder {
        ContentBuilder::new(fonts, converter, OutputColorSpace::Rgb)
    }

    #[test]
    fn line_stroke_matches_expected_operators() {
        let fonts = Arc::new(Mutex::new(FontManager::new()));
        let converter = Arc::new(ColorConverter::new());
        let mut b = builder(fonts, converter);
        b.set_stroke_color(Color::Rgb(DeviceRgb::new(1.0, 0.0, 0.0))).unwrap();
        b.move_to(Pt(0.0), Pt(0.0)).unwrap();
        b.line_to(Pt(100.0), Pt(100.0)).unwrap();
        b.stroke().unwrap();
        let (ops, _used) = b.finalize().unwrap();
        let names: Vec<&str> = ops.iter().map(|o| o.operator.as_str()).collect();
        assert_eq!(names, vec!["RG", "m", "l", "S"]);
    }

    #[test]
    fn negative_line_width_is_rejected() {
        let fonts = Arc::new(Mutex::new(FontManager::new()));
        let converter = Arc::new(ColorConverter::new());
        let mut b = builder(fonts, converter);
        assert!(b.set_line_width(-1.0).is_err());
    }

    #[test]
    fn scoped_graphics_state_emits_matching_q_and_q_close() {
        let fonts = Arc::new(Mutex::new(FontManager::new()));
        let converter = Arc::new(ColorConverter::new());
        let mut b = builder(fonts, converter);
        {
            let mut scope = b.scoped_graphics_state().unwrap();
            scope.set_line_width(2.0).unwrap();
        }
        let (ops, _used) = b.finalize().unwrap();
        let names: Vec<&str> = ops.iter().map(|o| o.operator.as_str()).collect();
        assert_eq!(names, vec!["q", "w", "Q"]);
    }

    #[test]
    fn drawing_an_image_records_it_as_used() {
        let fonts = Arc::new(Mutex::new(FontManager::new()));
        let converter = Arc::new(ColorConverter::new());
        let mut b = builder(fonts, converter);
        b.draw_image(ImageId(3)).unwrap();
        let (ops, used) = b.finalize().unwrap();
        assert!(used.images.contains(&ImageId(3)));
        assert_eq!(ops[0].operator, "Do");
    }

    #[test]
    fn fill_in_cmyk_document_converts_rgb_input() {
        let fonts = Arc::new(Mutex::new(FontManager::new()));
        let converter = Arc::new(ColorConverter::new());
        let mut b = ContentBuilder::new(fonts, converter, OutputColorSpace::Cmyk);
        b.set_fill_color(Color::Rgb(DeviceRgb::new(1.0, 0.0, 0.0))).unwrap();
        let (ops, _used) = b.finalize().unwrap();
        assert_eq!(ops[0].operator, "k");
    }

    struct KerningStubFace {
        glyphs: std::collections::HashMap<char, u16>,
    }

    impl crate::font::FontFace for KerningStubFace {
        fn glyph_index(&self, codepoint: char) -> Option<u16> {
            self.glyphs.get(&codepoint).copied()
        }
        fn advance_width(&self, _glyph: u16) -> u16 {
            500
        }
        fn kerning(&self, left_glyph: u16, right_glyph: u16) -> Option<i32> {
            (left_glyph == 0x0041 && right_glyph == 0x0066).then_some(-80)
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

    #[test]
    fn kerned_af_text_inserts_adjustment_inside_tj_array() {
        let mut fonts = FontManager::new();
        let mut glyphs = std::collections::HashMap::new();
        glyphs.insert('A', 0x0041);
        glyphs.insert('f', 0x0066);
        let font = fonts.load(Box::new(KerningStubFace { glyphs }));
        let fonts = Arc::new(Mutex::new(fonts));
        let converter = Arc::new(ColorConverter::new());
        let mut b = builder(fonts, converter);
        b.render_utf8_text(font, 1, 12.0, Pt(0.0), Pt(0.0), "Af").unwrap();
        let (ops, _used) = b.finalize().unwrap();

        let tj = ops
            .iter()
            .find(|o| o.operator == "TJ")
            .expect("expected a TJ operator for the rendered run");
        let array = match &tj.operands[0] {
            lopdf::Object::Array(items) => items,
            other => panic!("expected TJ operand to be an array, got {other:?}"),
        };
        // one hex string for 'A', the kerning adjustment, then a hex string for 'f'.
        assert_eq!(array.len(), 3);
        assert!(matches!(array[1], Integer(-80)));
        for (i, expected_len) in [(0usize, 2usize), (2, 2)] {
            match &array[i] {
                LoString(bytes, StringFormat::Hexadecimal) => assert_eq!(bytes.len(), expected_len),
                other => panic!("expected a hex string at index {i}, got {other:?}"),
            }
        }
    }
}
