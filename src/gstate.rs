//! `ExtGState` dictionaries, registered with `add_graphics_state` and invoked
//! from content streams with `gs /<name>`.

use lopdf::Dictionary as LoDictionary;
use lopdf::Object::{Integer, Name, Real};

use crate::icc_profile::RenderingIntent;

/// Line cap style, mirrored 1:1 onto the PDF `/LC` integer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LineCapStyle {
    Butt,
    Round,
    ProjectingSquare,
}

impl LineCapStyle {
    pub(crate) fn pdf_value(self) -> i64 {
        match self {
            LineCapStyle::Butt => 0,
            LineCapStyle::Round => 1,
            LineCapStyle::ProjectingSquare => 2,
        }
    }
}

/// Line join style, mirrored 1:1 onto the PDF `/LJ` integer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LineJoinStyle {
    Miter,
    Round,
    Bevel,
}

impl LineJoinStyle {
    pub(crate) fn pdf_value(self) -> i64 {
        match self {
            LineJoinStyle::Miter => 0,
            LineJoinStyle::Round => 1,
            LineJoinStyle::Bevel => 2,
        }
    }
}

/// Separable blend mode, named in `/BM`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlendMode {
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl BlendMode {
    fn pdf_name(self) -> &'static str {
        match self {
            BlendMode::Normal => "Normal",
            BlendMode::Multiply => "Multiply",
            BlendMode::Screen => "Screen",
            BlendMode::Overlay => "Overlay",
            BlendMode::Darken => "Darken",
            BlendMode::Lighten => "Lighten",
            BlendMode::ColorDodge => "ColorDodge",
            BlendMode::ColorBurn => "ColorBurn",
            BlendMode::HardLight => "HardLight",
            BlendMode::SoftLight => "SoftLight",
            BlendMode::Difference => "Difference",
            BlendMode::Exclusion => "Exclusion",
        }
    }
}

/// An `ExtGState` dictionary. Every field is optional; only the fields a
/// caller sets are written, matching how PDF readers treat omitted keys as
/// "inherit the current value".
#[derive(Debug, Clone, Default)]
pub struct ExtGState {
    pub line_width: Option<f32>,
    pub line_cap: Option<LineCapStyle>,
    pub line_join: Option<LineJoinStyle>,
    pub miter_limit: Option<f32>,
    pub rendering_intent: Option<RenderingIntent>,
    pub stroke_overprint: Option<bool>,
    pub fill_overprint: Option<bool>,
    pub overprint_mode: Option<i64>,
    pub flatness: Option<f32>,
    pub smoothness: Option<f32>,
    pub stroke_adjustment: Option<bool>,
    pub blend_mode: Option<BlendMode>,
    pub stroke_alpha: Option<f32>,
    pub fill_alpha: Option<f32>,
    pub alpha_is_shape: Option<bool>,
    pub text_knockout: Option<bool>,
}

impl ExtGState {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn to_dictionary(&self) -> LoDictionary {
        let mut dict = LoDictionary::new();
        dict.set("Type", Name(b"ExtGState".to_vec()));
        if let Some(lw) = self.line_width {
            dict.set("LW", Real(lw));
        }
        if let Some(lc) = self.line_cap {
            dict.set("LC", Integer(lc.pdf_value()));
        }
        if let Some(lj) = self.line_join {
            dict.set("LJ", Integer(lj.pdf_value()));
        }
        if let Some(ml) = self.miter_limit {
            dict.set("ML", Real(ml));
        }
        if let Some(ri) = self.rendering_intent {
            dict.set("RI", Name(ri.pdf_name().as_bytes().to_vec()));
        }
        if let Some(op) = self.stroke_overprint {
            dict.set("OP", op);
        }
        if let Some(op) = self.fill_overprint {
            dict.set("op", op);
        }
        if let Some(opm) = self.overprint_mode {
            dict.set("OPM", Integer(opm));
        }
        if let Some(fl) = self.flatness {
            dict.set("FL", Real(fl));
        }
        if let Some(sm) = self.smoothness {
            dict.set("SM", Real(sm));
        }
        if let Some(sa) = self.stroke_adjustment {
            dict.set("SA", sa);
        }
        if let Some(bm) = self.blend_mode {
            dict.set("BM", Name(bm.pdf_name().as_bytes().to_vec()));
        }
        if let Some(ca) = self.stroke_alpha {
            dict.set("CA", Real(ca));
        }
        if let Some(ca) = self.fill_alpha {
            dict.set("ca", Real(ca));
        }
        if let Some(ais) = self.alpha_is_shape {
            dict.set("AIS", ais);
        }
        if let Some(tk) = self.text_knockout {
            dict.set("TK", tk);
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_set_fields_are_written() {
        let mut gs = ExtGState::new();
        gs.fill_alpha = Some(0.5);
        let dict = gs.to_dictionary();
        assert!(dict.has(b"ca"));
        assert!(!dict.has(b"CA"));
        assert!(!dict.has(b"LW"));
    }
}
