//! # pdfassembler
//!
//! A library for assembling PDF 1.7 documents: pages, raster images, embedded
//! TrueType/OpenType font subsets, ICC-based and named-separation color
//! spaces, shadings, patterns, annotations, outlines and optional content
//! groups, written out as a single append-only pass over the output file.
//!
//! # Getting started
//!
//! ```no_run
//! use pdfassembler::{DocumentAssembler, DocumentOptions};
//! use pdfassembler::units::Pt;
//! use pdfassembler::color::DeviceRgb;
//!
//! let mut doc = DocumentAssembler::open("out.pdf", DocumentOptions::default())?;
//!
//! let mut page = doc.new_page_builder();
//! let content = page.content();
//! content.set_stroke_color(pdfassembler::color::Color::Rgb(DeviceRgb::new(1.0, 0.0, 0.0)))?;
//! content.move_to(Pt(0.0), Pt(0.0))?;
//! content.line_to(Pt(100.0), Pt(100.0))?;
//! content.stroke()?;
//! doc.add_page(page)?;
//!
//! doc.close()?;
//! # Ok::<(), pdfassembler::errors::Error>(())
//! ```
//!
//! PDF is not reparsed or mutated in place: this crate only assembles new
//! documents, writing every indirect object exactly once in a single
//! forward pass.

#![allow(dead_code)]

pub mod annotation;
pub mod color;
mod constants;
pub mod content;
pub mod ctm;
pub mod date;
pub mod document;
pub mod errors;
pub mod font;
pub mod function;
pub mod gstate;
pub mod icc_profile;
pub mod ids;
pub mod image;
mod kern;
mod object;
mod ocg;
mod outline;
pub mod page;
pub mod resources;
mod separation;
mod serialize;
pub mod shading;
mod subsetting;
pub mod units;
mod utils;

pub use annotation::{Annotation, AnnotationKind, LinkTarget, Rect};
pub use content::{ContentBuilder, UsedResources};
pub use ctm::{CurTransMat, TextMatrix};
pub use document::{DocumentAssembler, DocumentOptions, PageBox};
pub use errors::{Error, Result, Status};
pub use font::{AllsortsFontFace, BuiltinFont, FontFace};
pub use function::ExponentialFunction;
pub use gstate::{BlendMode, ExtGState, LineCapStyle, LineJoinStyle};
pub use icc_profile::{ColorConverter, IccProfile, IccProfileType, OutputColorSpace, RenderingIntent};
pub use ids::{
    AnnotationId, FontId, FontSubsetId, FormXObjectId, FunctionId, GraphicsStateId,
    IccColorSpaceId, ImageId, LabColorSpaceId, OptionalContentGroupId, OutlineId, PageId,
    PatternId, SeparationId, ShadingId,
};
pub use image::{DecodedImage, ImageColorSpace, ImagePlacement};
pub use page::{FormXObjectBuilder, PageBoxOverride, PageBuilder, PageTransition};
pub use resources::{LabColorSpace, ResourceRegistry};
pub use shading::{Shading, ShadingGeometry, ShadingPattern};
