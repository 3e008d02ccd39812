//! Resource registry: the tables `load_image`, `load_font`,
//! `load_icc_profile`, `create_separation`, `add_graphics_state`,
//! `add_function`, `add_shading`, and `add_pattern` write into, and the
//! document assembler drains at close to emit indirect objects.
//!
//! Registration only allocates an id and stores the pending value; nothing
//! here writes PDF bytes. Each stored value knows how to turn itself into a
//! `lopdf::Dictionary` once the assembler has decided object numbers, which
//! is why every `to_dictionary`-style method downstream takes the relevant
//! object number(s) as parameters rather than holding them itself.

use std::sync::{Arc, Mutex};

use lopdf::Dictionary as LoDictionary;
use lopdf::Object::{Array, Real};

use crate::color::DeviceCmyk;
use crate::errors::{Result, ValidationError};
use crate::font::{FontFace, FontManager};
use crate::function::ExponentialFunction;
use crate::gstate::ExtGState;
use crate::icc_profile::IccProfile;
use crate::ids::{
    FontId, FunctionId, GraphicsStateId, IccColorSpaceId, ImageId, LabColorSpaceId, PatternId,
    SeparationId, ShadingId,
};
use crate::image::DecodedImage;
use crate::separation::Separation;
use crate::shading::{Shading, ShadingPattern};

/// A registered CIE L*a*b* color space: `[/Lab << /WhitePoint [...] /Range [...] >>]`.
#[derive(Debug, Clone, PartialEq)]
pub struct LabColorSpace {
    pub white_point: [f32; 3],
    pub range: [f32; 4],
}

impl LabColorSpace {
    pub fn new(white_point: [f32; 3], range: [f32; 4]) -> Self {
        Self { white_point, range }
    }

    pub(crate) fn to_array(&self) -> lopdf::Object {
        let mut params = LoDictionary::new();
        params.set(
            "WhitePoint",
            Array(self.white_point.iter().copied().map(Real).collect()),
        );
        params.set("Range", Array(self.range.iter().copied().map(Real).collect()));
        lopdf::Object::Array(vec![
            lopdf::Object::Name(b"Lab".to_vec()),
            lopdf::Object::Dictionary(params),
        ])
    }
}

/// Every resource table the document assembler and content builders share.
#[derive(Default)]
pub struct ResourceRegistry {
    pub(crate) images: Vec<DecodedImage>,
    pub(crate) fonts: Arc<Mutex<FontManager>>,
    pub(crate) icc_color_spaces: Vec<IccProfile>,
    pub(crate) lab_color_spaces: Vec<LabColorSpace>,
    pub(crate) separations: Vec<Separation>,
    pub(crate) graphics_states: Vec<ExtGState>,
    pub(crate) functions: Vec<ExponentialFunction>,
    pub(crate) shadings: Vec<Shading>,
    pub(crate) patterns: Vec<ShadingPattern>,
    first_separation: Option<SeparationId>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_image(&mut self, image: DecodedImage) -> ImageId {
        let id = ImageId(self.images.len());
        self.images.push(image);
        id
    }

    pub fn image(&self, id: ImageId) -> Result<&DecodedImage> {
        self.images
            .get(id.index())
            .ok_or(ValidationError::BadId("image").into())
    }

    pub fn load_font(&mut self, face: Box<dyn FontFace>) -> FontId {
        self.fonts.lock().expect("font table lock poisoned").load(face)
    }

    /// A shared handle to the font table. `ContentBuilder` holds a clone of
    /// this so it can assign glyphs to subsets without tying its lifetime to
    /// the registry's.
    pub fn fonts_handle(&self) -> Arc<Mutex<FontManager>> {
        Arc::clone(&self.fonts)
    }

    pub fn add_icc_color_space(&mut self, profile: IccProfile) -> IccColorSpaceId {
        let id = IccColorSpaceId(self.icc_color_spaces.len());
        self.icc_color_spaces.push(profile);
        id
    }

    pub fn icc_color_space(&self, id: IccColorSpaceId) -> Result<&IccProfile> {
        self.icc_color_spaces
            .get(id.index())
            .ok_or(ValidationError::BadId("ICC color space").into())
    }

    pub fn add_lab_color_space(&mut self, space: LabColorSpace) -> LabColorSpaceId {
        let id = LabColorSpaceId(self.lab_color_spaces.len());
        self.lab_color_spaces.push(space);
        id
    }

    pub fn lab_color_space(&self, id: LabColorSpaceId) -> Result<&LabColorSpace> {
        self.lab_color_spaces
            .get(id.index())
            .ok_or(ValidationError::BadId("Lab color space").into())
    }

    pub fn create_separation(&mut self, name: impl Into<String>, fallback: DeviceCmyk) -> SeparationId {
        let id = SeparationId(self.separations.len());
        self.separations.push(Separation::new(name, fallback));
        if self.first_separation.is_none() {
            self.first_separation = Some(id);
        }
        id
    }

    pub fn separation(&self, id: SeparationId) -> Result<&Separation> {
        self.separations
            .get(id.index())
            .ok_or(ValidationError::BadId("separation").into())
    }

    /// The first separation registered in this document, used for the
    /// `/All` pseudo-separation. Errors if `/All` is selected before any
    /// separation has been registered.
    pub fn first_separation(&self) -> Result<SeparationId> {
        self.first_separation
            .ok_or(ValidationError::BadId("/All separation (none registered)").into())
    }

    pub fn add_graphics_state(&mut self, gs: ExtGState) -> GraphicsStateId {
        let id = GraphicsStateId(self.graphics_states.len());
        self.graphics_states.push(gs);
        id
    }

    pub fn graphics_state(&self, id: GraphicsStateId) -> Result<&ExtGState> {
        self.graphics_states
            .get(id.index())
            .ok_or(ValidationError::BadId("graphics state").into())
    }

    pub fn add_function(&mut self, f: ExponentialFunction) -> FunctionId {
        let id = FunctionId(self.functions.len());
        self.functions.push(f);
        id
    }

    pub fn function(&self, id: FunctionId) -> Result<&ExponentialFunction> {
        self.functions
            .get(id.index())
            .ok_or(ValidationError::BadId("function").into())
    }

    pub fn add_shading(&mut self, s: Shading) -> ShadingId {
        let id = ShadingId(self.shadings.len());
        self.shadings.push(s);
        id
    }

    pub fn shading(&self, id: ShadingId) -> Result<&Shading> {
        self.shadings
            .get(id.index())
            .ok_or(ValidationError::BadId("shading").into())
    }

    pub fn add_pattern(&mut self, p: ShadingPattern) -> PatternId {
        let id = PatternId(self.patterns.len());
        self.patterns.push(p);
        id
    }

    pub fn pattern(&self, id: PatternId) -> Result<&ShadingPattern> {
        self.patterns
            .get(id.index())
            .ok_or(ValidationError::BadId("pattern").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_separation_errors_before_any_registration() {
        let registry = ResourceRegistry::new();
        assert!(registry.first_separation().is_err());
    }

    #[test]
    fn first_separation_is_sticky() {
        let mut registry = ResourceRegistry::new();
        let first = registry.create_separation("Gold", DeviceCmyk::new(0.0, 0.2, 1.0, 0.0));
        registry.create_separation("Silver", DeviceCmyk::new(0.0, 0.0, 0.0, 0.3));
        assert_eq!(registry.first_separation().unwrap(), first);
    }

    #[test]
    fn bad_image_id_is_rejected() {
        let registry = ResourceRegistry::new();
        assert!(registry.image(ImageId(0)).is_err());
    }
}
