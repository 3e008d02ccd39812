//! Page and form-XObject builders: a content-stream builder plus the
//! page-level properties (box overrides, transition, annotations) collected
//! before the page is handed to the assembler.

use lopdf::content::Operation;

use crate::annotation::Annotation;
use crate::content::{ContentBuilder, UsedResources};
use crate::errors::{Result, StateError};
use crate::units::Pt;

/// A page transition effect (`/Trans`); only the duration is modeled, since
/// the core doesn't drive a presentation UI.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PageTransition {
    pub duration_secs: f32,
}

/// An alternate page box (`/CropBox`, `/BleedBox`, `/TrimBox`, `/ArtBox`),
/// expressed as lower-left origin plus width/height like `MediaBox`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PageBoxOverride {
    pub x: Pt,
    pub y: Pt,
    pub width: Pt,
    pub height: Pt,
}

/// The artifact `PageBuilder::finalize` produces, handed to
/// `DocumentAssembler::add_page`.
pub(crate) struct FinishedPage {
    pub(crate) operations: Vec<Operation>,
    pub(crate) used: UsedResources,
    pub(crate) media_box: (Pt, Pt),
    pub(crate) crop_box: Option<PageBoxOverride>,
    pub(crate) bleed_box: Option<PageBoxOverride>,
    pub(crate) trim_box: Option<PageBoxOverride>,
    pub(crate) art_box: Option<PageBoxOverride>,
    pub(crate) transition: Option<PageTransition>,
    pub(crate) annotations: Vec<Annotation>,
}

/// Builds one page's content and page-level properties. Created by
/// `DocumentAssembler::new_page_builder`, consumed by `add_page`.
///
/// Holds its content builder in an `Option` so `finalize` can take it
/// without destructuring a type that implements `Drop`.
pub struct PageBuilder {
    content: Option<ContentBuilder>,
    media_box: (Pt, Pt),
    crop_box: Option<PageBoxOverride>,
    bleed_box: Option<PageBoxOverride>,
    trim_box: Option<PageBoxOverride>,
    art_box: Option<PageBoxOverride>,
    transition: Option<PageTransition>,
    annotations: Vec<Annotation>,
    consumed: bool,
}

impl PageBuilder {
    pub(crate) fn new(content: ContentBuilder, media_box: (Pt, Pt)) -> Self {
        Self {
            content: Some(content),
            media_box,
            crop_box: None,
            bleed_box: None,
            trim_box: None,
            art_box: None,
            transition: None,
            annotations: Vec::new(),
            consumed: false,
        }
    }

    /// The content-stream builder for this page.
    pub fn content(&mut self) -> &mut ContentBuilder {
        self.content
            .as_mut()
            .expect("page builder content accessed after finalize")
    }

    pub fn set_crop_box(&mut self, b: PageBoxOverride) {
        self.crop_box = Some(b);
    }

    pub fn set_bleed_box(&mut self, b: PageBoxOverride) {
        self.bleed_box = Some(b);
    }

    pub fn set_trim_box(&mut self, b: PageBoxOverride) {
        self.trim_box = Some(b);
    }

    pub fn set_art_box(&mut self, b: PageBoxOverride) {
        self.art_box = Some(b);
    }

    pub fn set_transition(&mut self, t: PageTransition) {
        self.transition = Some(t);
    }

    pub fn add_annotation(&mut self, a: Annotation) {
        self.annotations.push(a);
    }

    pub(crate) fn finalize(mut self) -> Result<FinishedPage> {
        let content = self.content.take().ok_or(StateError::BuilderFinalized)?;
        let (operations, used) = content.finalize()?;
        self.consumed = true;
        Ok(FinishedPage {
            operations,
            used,
            media_box: self.media_box,
            crop_box: self.crop_box.take(),
            bleed_box: self.bleed_box.take(),
            trim_box: self.trim_box.take(),
            art_box: self.art_box.take(),
            transition: self.transition.take(),
            annotations: std::mem::take(&mut self.annotations),
        })
    }
}

impl Drop for PageBuilder {
    fn drop(&mut self) {
        if self.consumed {
            return;
        }
        if let Some(content) = self.content.take() {
            log::warn!("page builder dropped without being added to the document; auto-finalizing");
            if let Err(err) = content.finalize() {
                log::error!("page builder auto-finalize on drop failed: {err}");
            }
        }
    }
}

/// The artifact `FormXObjectBuilder::finalize` produces.
pub(crate) struct FinishedForm {
    pub(crate) operations: Vec<Operation>,
    pub(crate) used: UsedResources,
    pub(crate) bbox: (Pt, Pt, Pt, Pt),
    pub(crate) matrix: Option<[f32; 6]>,
}

/// Builds a form XObject's content the same way a page builder does, plus
/// its `/BBox` and optional `/Matrix`.
pub struct FormXObjectBuilder {
    content: Option<ContentBuilder>,
    bbox: (Pt, Pt, Pt, Pt),
    matrix: Option<[f32; 6]>,
    consumed: bool,
}

impl FormXObjectBuilder {
    pub(crate) fn new(content: ContentBuilder, bbox: (Pt, Pt, Pt, Pt)) -> Self {
        Self {
            content: Some(content),
            bbox,
            matrix: None,
            consumed: false,
        }
    }

    pub fn content(&mut self) -> &mut ContentBuilder {
        self.content
            .as_mut()
            .expect("form builder content accessed after finalize")
    }

    pub fn set_matrix(&mut self, matrix: [f32; 6]) {
        self.matrix = Some(matrix);
    }

    pub(crate) fn finalize(mut self) -> Result<FinishedForm> {
        let content = self.content.take().ok_or(StateError::BuilderFinalized)?;
        let (operations, used) = content.finalize()?;
        self.consumed = true;
        Ok(FinishedForm {
            operations,
            used,
            bbox: self.bbox,
            matrix: self.matrix.take(),
        })
    }
}

impl Drop for FormXObjectBuilder {
    fn drop(&mut self) {
        if self.consumed {
            return;
        }
        if let Some(content) = self.content.take() {
            log::warn!("form xobject builder dropped without being added to the document; auto-finalizing");
            if let Err(err) = content.finalize() {
                log::error!("form xobject builder auto-finalize on drop failed: {err}");
            }
        }
    }
}
