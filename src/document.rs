//! The document assembler: owns the output file and the indirect-object
//! table, drains the resource registry and buffered pages/forms at `close`,
//! and writes every byte of the header, body, xref and trailer itself.
//!
//! Resources fall into two camps. Images, ICC/Lab color spaces, separations,
//! functions, shadings, patterns, graphics states and builtin fonts have
//! their object number known the moment they're registered, so they're
//! written immediately. Pages, form XObjects and font subsets are buffered
//! and only get an object number at `close`, since a page's or form's content
//! stream can reference font subsets that are still being assigned glyphs
//! right up until the document is finished being authored.

use std::cell::Cell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::Dictionary as LoDictionary;
use lopdf::Object;
use lopdf::Object::{Array, Dictionary, Integer, Name, Real, Reference, String as LoString};
use lopdf::StringFormat;
use serde::{Deserialize, Serialize};

use crate::annotation::Annotation;
use crate::color::DeviceCmyk;
use crate::content::{ContentBuilder, UsedResources};
use crate::date::OffsetDateTime;
use crate::errors::{Result, StateError, ValidationError};
use crate::font::{BuiltinFont, FontFace, FontManager};
use crate::function::ExponentialFunction;
use crate::gstate::ExtGState;
use crate::icc_profile::{ColorConverter, IccProfile, OutputColorSpace};
use crate::ids::{
    FontId, FontSubsetId, FormXObjectId, GraphicsStateId, IccColorSpaceId, ImageId,
    LabColorSpaceId, OutlineId, PageId, PatternId, SeparationId, ShadingId,
};
use crate::image::DecodedImage;
use crate::object::ObjectTable;
use crate::ocg::OcgRegistry;
use crate::outline::OutlineTree;
use crate::page::{FormXObjectBuilder, PageBoxOverride, PageBuilder};
use crate::resources::{LabColorSpace, ResourceRegistry};
use crate::separation::{icc_based_stream_dict, Separation};
use crate::serialize;
use crate::shading::{Shading, ShadingPattern};
use crate::units::{Mm, Pt};

/// A page size, expressed in millimeters the same way the rest of the public
/// API measures lengths.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBox {
    pub width: Mm,
    pub height: Mm,
}

impl PageBox {
    pub fn a4() -> Self {
        Self {
            width: Mm(210.0),
            height: Mm(297.0),
        }
    }

    pub fn letter() -> Self {
        Self {
            width: Mm(215.9),
            height: Mm(279.4),
        }
    }
}

/// Document-wide options set at `DocumentAssembler::open`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOptions {
    pub output_colorspace: OutputColorSpace,
    pub default_page_box: PageBox,
    pub title: Option<String>,
    pub author: Option<String>,
    pub language: Option<String>,
    pub optional_content_groups: Vec<String>,
    pub structure_tree: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            output_colorspace: OutputColorSpace::Rgb,
            default_page_box: PageBox::a4(),
            title: None,
            author: None,
            language: None,
            optional_content_groups: Vec::new(),
            structure_tree: false,
        }
    }
}

/// Assembles a PDF 1.7 file from pages, images, fonts and color resources.
///
/// Deliberately `!Sync`: every write mutates the object table and the file's
/// byte cursor, so concurrent access from multiple threads would race on
/// both. It is `Send`, since handing a finished assembler (or one still being
/// built) off to another thread one at a time is fine.
pub struct DocumentAssembler {
    file: Option<BufWriter<File>>,
    bytes_written: u64,
    objects: ObjectTable,
    registry: ResourceRegistry,
    converter: Arc<ColorConverter>,
    options: DocumentOptions,
    info_object: u32,
    image_objects: Vec<(u32, Option<u32>)>,
    icc_objects: Vec<u32>,
    lab_objects: Vec<u32>,
    separation_objects: Vec<u32>,
    function_objects: Vec<u32>,
    shading_objects: Vec<u32>,
    pattern_objects: Vec<u32>,
    gs_objects: Vec<u32>,
    pending_pages: Vec<crate::page::FinishedPage>,
    pending_forms: Vec<crate::page::FinishedForm>,
    outlines: OutlineTree,
    ocgs: OcgRegistry,
    finalized: bool,
    poisoned: bool,
    _not_sync: PhantomData<Cell<()>>,
}

impl DocumentAssembler {
    /// Creates `path`, writes the `%PDF-1.7` header and binary marker, and
    /// emits the info dictionary as the first indirect object.
    pub fn open(path: impl AsRef<Path>, options: DocumentOptions) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        let mut assembler = Self {
            file: Some(BufWriter::new(file)),
            bytes_written: 0,
            objects: ObjectTable::new(),
            registry: ResourceRegistry::new(),
            converter: Arc::new(ColorConverter::new()),
            options,
            info_object: 0,
            image_objects: Vec::new(),
            icc_objects: Vec::new(),
            lab_objects: Vec::new(),
            separation_objects: Vec::new(),
            function_objects: Vec::new(),
            shading_objects: Vec::new(),
            pattern_objects: Vec::new(),
            gs_objects: Vec::new(),
            pending_pages: Vec::new(),
            pending_forms: Vec::new(),
            outlines: OutlineTree::new(),
            ocgs: OcgRegistry::new(),
            finalized: false,
            poisoned: false,
            _not_sync: PhantomData,
        };

        let mut header = Vec::new();
        header.extend_from_slice(b"%PDF-1.7\n%");
        header.extend_from_slice(&[0xe5, 0xf6, 0xc4, 0xd6]);
        header.push(b'\n');
        assembler.write_bytes(&header)?;

        let info_dict = assembler.build_info_dictionary();
        assembler.info_object = assembler.add_indirect_object(&Dictionary(info_dict))?;

        for name in assembler.options.optional_content_groups.clone() {
            assembler.ocgs.register(name);
        }

        Ok(assembler)
    }

    fn build_info_dictionary(&self) -> LoDictionary {
        let mut dict = LoDictionary::new();
        dict.set(
            "Producer",
            serialize::utf16_literal_object(&format!("pdfassembler {}", env!("CARGO_PKG_VERSION"))),
        );
        if let Some(title) = &self.options.title {
            dict.set("Title", serialize::utf16_literal_object(title));
        }
        if let Some(author) = &self.options.author {
            dict.set("Author", serialize::utf16_literal_object(author));
        }
        let stamp = crate::date::to_pdf_time_stamp(&OffsetDateTime::now_utc());
        dict.set("CreationDate", LoString(stamp.clone().into_bytes(), StringFormat::Literal));
        dict.set("ModDate", LoString(stamp.into_bytes(), StringFormat::Literal));
        dict.set("Trapped", Name(b"False".to_vec()));
        dict
    }

    // -- low-level write helpers --------------------------------------------

    fn guard_writable(&self) -> Result<()> {
        if self.poisoned {
            return Err(StateError::Poisoned.into());
        }
        if self.finalized {
            return Err(StateError::DoubleFinalize.into());
        }
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let file = self.file.as_mut().ok_or(StateError::Poisoned)?;
        if let Err(e) = file.write_all(bytes) {
            self.poisoned = true;
            log::error!("pdf write failed: {e}");
            return Err(e.into());
        }
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    /// Allocates a fresh object number, writes `obj`'s bytes at the file's
    /// current position, and records the offset.
    fn add_indirect_object(&mut self, obj: &Object) -> Result<u32> {
        self.guard_writable()?;
        let offset = self.bytes_written;
        let num = self.objects.push(offset);
        let mut buf = Vec::new();
        buf.extend_from_slice(format!("{num} 0 obj\n").as_bytes());
        serialize::write_object(&mut buf, obj);
        buf.extend_from_slice(b"\nendobj\n");
        self.write_bytes(&buf)?;
        Ok(num)
    }

    /// Writes `obj`'s bytes at the file's current position under a
    /// previously `reserve`d object number.
    fn write_at_reserved(&mut self, num: u32, obj: &Object) -> Result<()> {
        self.guard_writable()?;
        let offset = self.bytes_written;
        self.objects.set_offset(num, offset);
        let mut buf = Vec::new();
        buf.extend_from_slice(format!("{num} 0 obj\n").as_bytes());
        serialize::write_object(&mut buf, obj);
        buf.extend_from_slice(b"\nendobj\n");
        self.write_bytes(&buf)
    }

    /// Wraps an already-prepared dictionary (with `/Filter` and `/Length`
    /// already set, content already compressed) into a stream object.
    fn add_stream_object(&mut self, dict: LoDictionary, content: Vec<u8>) -> Result<u32> {
        let stream = lopdf::Stream::new(dict, content);
        self.add_indirect_object(&Object::Stream(stream))
    }

    // -- resource registration ------------------------------------------------

    /// Loads a raster image, writing its (optional) soft mask and main image
    /// stream immediately.
    pub fn load_image(&mut self, image: DecodedImage) -> Result<ImageId> {
        self.guard_writable()?;
        let id = self.registry.load_image(image);
        let smask_obj = {
            let img = self.registry.image(id)?;
            match img.smask_stream() {
                Some((dict, bytes)) => Some(self.add_stream_object(dict, bytes)?),
                None => None,
            }
        };
        let (dict, bytes) = {
            let img = self.registry.image(id)?;
            img.image_stream(smask_obj)
        };
        let main_obj = self.add_stream_object(dict, bytes)?;
        debug_assert_eq!(self.image_objects.len(), id.index());
        self.image_objects.push((main_obj, smask_obj));
        Ok(id)
    }

    /// Registers a font face for later text rendering. Glyph subsets and
    /// embedding are deferred to `close`.
    pub fn load_font(&mut self, face: Box<dyn FontFace>) -> FontId {
        self.registry.load_font(face)
    }

    /// Registers a builtin (non-embedded) Type 1 font and writes its
    /// dictionary immediately, returning the object number content streams
    /// reference directly (builtin fonts have no subset indirection).
    pub fn add_builtin_font(&mut self, font: BuiltinFont) -> Result<u32> {
        self.guard_writable()?;
        self.add_indirect_object(&Dictionary(font.to_dictionary()))
    }

    /// Embeds an ICC profile as `[/ICCBased <stream>]`.
    pub fn load_icc_profile(&mut self, profile: IccProfile) -> Result<IccColorSpaceId> {
        self.guard_writable()?;
        let channel_count = profile.profile_type.channel_count();
        let alternate = profile.profile_type.alternate_name();
        let raw = profile.bytes.clone();
        let id = self.registry.add_icc_color_space(profile);

        let compressed = deflate(&raw);
        let mut dict = icc_based_stream_dict(channel_count);
        dict.set("Alternate", Name(alternate.as_bytes().to_vec()));
        dict.set("Filter", Name(b"FlateDecode".to_vec()));
        dict.set("Length", Integer(compressed.len() as i64));
        let stream_obj = self.add_stream_object(dict, compressed)?;

        let array_obj = self.add_indirect_object(&Array(vec![
            Name(b"ICCBased".to_vec()),
            Reference((stream_obj, 0)),
        ]))?;
        debug_assert_eq!(self.icc_objects.len(), id.index());
        self.icc_objects.push(array_obj);
        Ok(id)
    }

    /// Registers a CIE L*a*b* color space, written immediately as its
    /// `[/Lab <<...>>]` array.
    pub fn add_lab_color_space(&mut self, space: LabColorSpace) -> Result<LabColorSpaceId> {
        self.guard_writable()?;
        let array = space.to_array();
        let id = self.registry.add_lab_color_space(space);
        let obj = self.add_indirect_object(&array)?;
        debug_assert_eq!(self.lab_objects.len(), id.index());
        self.lab_objects.push(obj);
        Ok(id)
    }

    /// Registers a named separation, writing its tint-transform function and
    /// `[/Separation ...]` array immediately.
    pub fn create_separation(&mut self, name: impl Into<String>, fallback: DeviceCmyk) -> Result<SeparationId> {
        self.guard_writable()?;
        let id = self.registry.create_separation(name, fallback);
        let sep: Separation = self.registry.separation(id)?.clone();

        let function_dict = sep.tint_function().to_dictionary();
        let function_obj = self.add_indirect_object(&Dictionary(function_dict))?;
        let array = sep.to_array(function_obj);
        let sep_obj = self.add_indirect_object(&array)?;
        debug_assert_eq!(self.separation_objects.len(), id.index());
        self.separation_objects.push(sep_obj);
        Ok(id)
    }

    /// Registers a Type 2 (exponential) function, used by shadings that
    /// aren't tied to a separation's implicit tint transform.
    pub fn add_function(&mut self, f: ExponentialFunction) -> Result<crate::ids::FunctionId> {
        self.guard_writable()?;
        let dict = f.to_dictionary();
        let id = self.registry.add_function(f);
        let obj = self.add_indirect_object(&Dictionary(dict))?;
        debug_assert_eq!(self.function_objects.len(), id.index());
        self.function_objects.push(obj);
        Ok(id)
    }

    /// Registers an axial or radial shading over a previously registered
    /// function.
    pub fn add_shading(&mut self, s: Shading) -> Result<ShadingId> {
        self.guard_writable()?;
        let function_obj = *self
            .function_objects
            .get(s.function.index())
            .ok_or(ValidationError::BadId("function"))?;
        let dict = s.to_dictionary(self.options.output_colorspace, function_obj);
        let id = self.registry.add_shading(s);
        let obj = self.add_indirect_object(&Dictionary(dict))?;
        debug_assert_eq!(self.shading_objects.len(), id.index());
        self.shading_objects.push(obj);
        Ok(id)
    }

    /// Registers a shading pattern over a previously registered shading.
    pub fn add_pattern(&mut self, p: ShadingPattern) -> Result<PatternId> {
        self.guard_writable()?;
        let shading_obj = *self
            .shading_objects
            .get(p.shading.index())
            .ok_or(ValidationError::BadId("shading"))?;
        let dict = p.to_dictionary(shading_obj);
        let id = self.registry.add_pattern(p);
        let obj = self.add_indirect_object(&Dictionary(dict))?;
        debug_assert_eq!(self.pattern_objects.len(), id.index());
        self.pattern_objects.push(obj);
        Ok(id)
    }

    /// Registers an `ExtGState` dictionary, invoked from content streams with
    /// `gs`.
    pub fn add_graphics_state(&mut self, gs: ExtGState) -> Result<GraphicsStateId> {
        self.guard_writable()?;
        let dict = gs.to_dictionary();
        let id = self.registry.add_graphics_state(gs);
        let obj = self.add_indirect_object(&Dictionary(dict))?;
        debug_assert_eq!(self.gs_objects.len(), id.index());
        self.gs_objects.push(obj);
        Ok(id)
    }

    /// Adds a bookmark to the outline tree, nested under `parent` (or a root
    /// bookmark if `None`).
    pub fn add_outline(&mut self, title: impl Into<String>, dest: PageId, parent: Option<OutlineId>) -> OutlineId {
        self.outlines.add(title, dest, parent)
    }

    // -- page / form builders -------------------------------------------------

    /// Starts a new page using the document's default page size.
    ///
    /// The returned builder owns its own handle to the font table and color
    /// converter (cheap `Arc` clones), so it doesn't borrow from `self` --
    /// nothing stops `add_page` from taking `&mut self` again once the
    /// caller is done with the builder.
    pub fn new_page_builder(&mut self) -> PageBuilder {
        let width = self.options.default_page_box.width.into_pt();
        let height = self.options.default_page_box.height.into_pt();
        let output_space = self.options.output_colorspace;
        let fonts = self.registry.fonts_handle();
        let converter = Arc::clone(&self.converter);
        let content = ContentBuilder::new(fonts, converter, output_space);
        PageBuilder::new(content, (width, height))
    }

    /// Starts a new form XObject with the given bounding box
    /// `(llx, lly, urx, ury)`.
    pub fn new_form_builder(&mut self, bbox: (Pt, Pt, Pt, Pt)) -> FormXObjectBuilder {
        let output_space = self.options.output_colorspace;
        let fonts = self.registry.fonts_handle();
        let converter = Arc::clone(&self.converter);
        let content = ContentBuilder::new(fonts, converter, output_space);
        FormXObjectBuilder::new(content, bbox)
    }

    /// Finalizes a page's content and queues it for emission at `close`.
    pub fn add_page(&mut self, builder: PageBuilder) -> Result<PageId> {
        self.guard_writable()?;
        let finished = builder.finalize()?;
        let id = PageId(self.pending_pages.len());
        self.pending_pages.push(finished);
        Ok(id)
    }

    /// Finalizes a form XObject's content and queues it for emission at
    /// `close`, since it may reference font subsets not yet embedded.
    pub fn add_form_xobject(&mut self, builder: FormXObjectBuilder) -> Result<FormXObjectId> {
        self.guard_writable()?;
        let finished = builder.finalize()?;
        let id = FormXObjectId(self.pending_forms.len());
        self.pending_forms.push(finished);
        Ok(id)
    }

    // -- resource dictionary construction --------------------------------------

    fn build_resources_dict(
        &self,
        used: &UsedResources,
        subset_objects: &HashMap<FontSubsetId, u32>,
        form_objects: &[u32],
    ) -> Result<LoDictionary> {
        let mut resources = LoDictionary::new();

        if !used.images.is_empty() || !used.forms.is_empty() {
            let mut xobject = LoDictionary::new();
            for &image in &used.images {
                let (obj, _) = *self
                    .image_objects
                    .get(image.index())
                    .ok_or(ValidationError::BadId("image"))?;
                xobject.set(format!("Image{}", image.index()), Reference((obj, 0)));
            }
            for &form in &used.forms {
                let obj = *form_objects
                    .get(form.index())
                    .ok_or(ValidationError::BadId("form xobject"))?;
                xobject.set(format!("Form{}", form.index()), Reference((obj, 0)));
            }
            resources.set("XObject", Dictionary(xobject));
        }

        if !used.font_subsets.is_empty() || !used.fonts.is_empty() {
            let mut fonts = LoDictionary::new();
            for &subset in &used.font_subsets {
                let obj = *subset_objects
                    .get(&subset)
                    .ok_or(ValidationError::BadId("font subset"))?;
                let key = format!("SFont{}-{}", subset.font.subset_token(), subset.subset_index);
                fonts.set(key, Reference((obj, 0)));
            }
            for &obj in &used.fonts {
                fonts.set(format!("Font{obj}"), Reference((obj, 0)));
            }
            resources.set("Font", Dictionary(fonts));
        }

        let needs_colorspace_dict =
            !used.icc_color_spaces.is_empty() || !used.lab_color_spaces.is_empty() || !used.separations.is_empty() || used.uses_all_separation;
        if needs_colorspace_dict {
            let mut cs = LoDictionary::new();
            for &icc in &used.icc_color_spaces {
                let obj = *self
                    .icc_objects
                    .get(icc.index())
                    .ok_or(ValidationError::BadId("ICC color space"))?;
                cs.set(format!("CSpaceI{}", icc.index()), Reference((obj, 0)));
            }
            for &lab in &used.lab_color_spaces {
                let obj = *self
                    .lab_objects
                    .get(lab.index())
                    .ok_or(ValidationError::BadId("Lab color space"))?;
                cs.set(format!("CSpaceL{}", lab.index()), Reference((obj, 0)));
            }
            for &sep in &used.separations {
                let obj = *self
                    .separation_objects
                    .get(sep.index())
                    .ok_or(ValidationError::BadId("separation"))?;
                cs.set(format!("CSpaceS{}", sep.index()), Reference((obj, 0)));
            }
            if used.uses_all_separation {
                let first = self.registry.first_separation()?;
                let obj = *self
                    .separation_objects
                    .get(first.index())
                    .ok_or(ValidationError::BadId("separation"))?;
                cs.set("All", Reference((obj, 0)));
            }
            resources.set("ColorSpace", Dictionary(cs));
        }

        if !used.patterns.is_empty() {
            let mut patterns = LoDictionary::new();
            for &pattern in &used.patterns {
                let obj = *self
                    .pattern_objects
                    .get(pattern.index())
                    .ok_or(ValidationError::BadId("pattern"))?;
                patterns.set(format!("P{}", pattern.index()), Reference((obj, 0)));
            }
            resources.set("Pattern", Dictionary(patterns));
        }

        if !used.graphics_states.is_empty() {
            let mut gs_dict = LoDictionary::new();
            for &gs in &used.graphics_states {
                let obj = *self
                    .gs_objects
                    .get(gs.index())
                    .ok_or(ValidationError::BadId("graphics state"))?;
                gs_dict.set(format!("GS{}", gs.index()), Reference((obj, 0)));
            }
            resources.set("ExtGState", Dictionary(gs_dict));
        }

        Ok(resources)
    }

    // -- close ------------------------------------------------------------------

    /// Embeds every font subset, writes every buffered form and page, then
    /// the page tree, outlines, optional content groups, catalog, xref and
    /// trailer. Idempotent guards reject a second call; the assembler is
    /// left poisoned (and `close` returns the I/O error) if a write fails
    /// partway through.
    pub fn close(&mut self) -> Result<()> {
        self.guard_writable()?;

        let subset_objects = self.embed_font_subsets()?;

        let pending_forms = std::mem::take(&mut self.pending_forms);
        let mut form_objects: Vec<u32> = Vec::with_capacity(pending_forms.len());
        for form in &pending_forms {
            let obj = self.write_form(form, &subset_objects, &form_objects)?;
            form_objects.push(obj);
        }

        let pages_root_obj = self.objects.reserve();
        let pending_pages = std::mem::take(&mut self.pending_pages);
        let page_objs: Vec<u32> = (0..pending_pages.len()).map(|_| self.objects.reserve()).collect();
        for (i, page) in pending_pages.iter().enumerate() {
            self.write_page(page, i, pages_root_obj, &page_objs, &subset_objects, &form_objects)?;
        }
        let mut pages_dict = LoDictionary::new();
        pages_dict.set("Type", Name(b"Pages".to_vec()));
        pages_dict.set("Kids", Array(page_objs.iter().map(|&n| Reference((n, 0))).collect()));
        pages_dict.set("Count", Integer(page_objs.len() as i64));
        self.write_at_reserved(pages_root_obj, &Dictionary(pages_dict))?;

        let outlines_root_obj = self.write_outlines(&page_objs)?;
        let ocproperties_value = self.write_ocgs()?;

        let mut catalog = LoDictionary::new();
        catalog.set("Type", Name(b"Catalog".to_vec()));
        catalog.set("Pages", Reference((pages_root_obj, 0)));
        if let Some(root) = outlines_root_obj {
            catalog.set("Outlines", Reference((root, 0)));
        }
        if let Some(lang) = &self.options.language {
            catalog.set("Lang", LoString(lang.as_bytes().to_vec(), StringFormat::Literal));
        }
        if let Some(ocproperties) = ocproperties_value {
            catalog.set("OCProperties", ocproperties);
        }
        if self.options.structure_tree {
            let mut struct_tree_root = LoDictionary::new();
            struct_tree_root.set("Type", Name(b"StructTreeRoot".to_vec()));
            struct_tree_root.set("K", Array(Vec::new()));
            let obj = self.add_indirect_object(&Dictionary(struct_tree_root))?;
            catalog.set("StructTreeRoot", Reference((obj, 0)));
        }
        let catalog_obj = self.add_indirect_object(&Dictionary(catalog))?;

        let startxref = self.bytes_written;
        let xref_header = format!("xref\n0 {}\n", self.objects.count() + 1);
        self.write_bytes(xref_header.as_bytes())?;
        let mut entries = Vec::new();
        self.objects.write_entries(&mut entries)?;
        self.write_bytes(&entries)?;

        let trailer = format!(
            "trailer\n<<\n /Size {}\n /Root {} 0 R\n /Info {} 0 R\n>>\nstartxref\n{}\n%%EOF\n",
            self.objects.count() + 1,
            catalog_obj,
            self.info_object,
            startxref,
        );
        self.write_bytes(trailer.as_bytes())?;

        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        self.finalized = true;
        Ok(())
    }

    fn embed_font_subsets(&mut self) -> Result<HashMap<FontSubsetId, u32>> {
        let mut subset_objects = HashMap::new();
        let fonts_handle = self.registry.fonts_handle();
        let all_subsets: Vec<FontSubsetId> = {
            let fonts = fonts_handle.lock().expect("font table lock poisoned");
            fonts.all_subsets()
        };
        for subset in all_subsets {
            let fonts = fonts_handle.lock().expect("font table lock poisoned");
            let raw = fonts.embed_subset_bytes(subset)?;
            let (ff_dict, ff_bytes) = fonts.font_file_stream(&raw);
            drop(fonts);
            let font_file_obj = self.add_stream_object(ff_dict, ff_bytes)?;

            let fonts = fonts_handle.lock().expect("font table lock poisoned");
            let base_name = format!("FontSubset{}-{}", subset.font.index(), subset.subset_index);
            let descriptor_dict = fonts.font_descriptor_dict(subset, &base_name, font_file_obj);
            drop(fonts);
            let descriptor_obj = self.add_indirect_object(&Dictionary(descriptor_dict))?;

            let fonts = fonts_handle.lock().expect("font table lock poisoned");
            let glyph_count = fonts.subset_glyph_count(subset);
            let descendant_dict = fonts.descendant_font_dict(subset, &base_name, descriptor_obj, glyph_count);
            drop(fonts);
            let descendant_obj = self.add_indirect_object(&Dictionary(descendant_dict))?;

            let type0_dict = FontManager::type0_font_dict(&base_name, descendant_obj);
            let type0_obj = self.add_indirect_object(&Dictionary(type0_dict))?;

            subset_objects.insert(subset, type0_obj);
        }
        Ok(subset_objects)
    }

    fn write_form(
        &mut self,
        form: &crate::page::FinishedForm,
        subset_objects: &HashMap<FontSubsetId, u32>,
        form_objects: &[u32],
    ) -> Result<u32> {
        let resources_dict = self.build_resources_dict(&form.used, subset_objects, form_objects)?;
        let resources_obj = self.add_indirect_object(&Dictionary(resources_dict))?;

        let content_bytes = encode_content(&form.operations)?;
        let compressed = deflate(&content_bytes);

        let mut dict = LoDictionary::new();
        dict.set("Type", Name(b"XObject".to_vec()));
        dict.set("Subtype", Name(b"Form".to_vec()));
        dict.set(
            "BBox",
            Array(vec![
                Real(form.bbox.0 .0),
                Real(form.bbox.1 .0),
                Real(form.bbox.2 .0),
                Real(form.bbox.3 .0),
            ]),
        );
        if let Some(matrix) = form.matrix {
            dict.set("Matrix", Array(matrix.iter().copied().map(Real).collect()));
        }
        dict.set("Resources", Reference((resources_obj, 0)));
        dict.set("Filter", Name(b"FlateDecode".to_vec()));
        dict.set("Length", Integer(compressed.len() as i64));
        self.add_indirect_object(&Object::Stream(lopdf::Stream::new(dict, compressed)))
    }

    #[allow(clippy::too_many_arguments)]
    fn write_page(
        &mut self,
        page: &crate::page::FinishedPage,
        index: usize,
        pages_root_obj: u32,
        page_objs: &[u32],
        subset_objects: &HashMap<FontSubsetId, u32>,
        form_objects: &[u32],
    ) -> Result<()> {
        let resources_dict = self.build_resources_dict(&page.used, subset_objects, form_objects)?;
        let resources_obj = self.add_indirect_object(&Dictionary(resources_dict))?;

        let content_bytes = encode_content(&page.operations)?;
        let compressed = deflate(&content_bytes);
        let mut content_dict = LoDictionary::new();
        content_dict.set("Filter", Name(b"FlateDecode".to_vec()));
        content_dict.set("Length", Integer(compressed.len() as i64));
        let content_obj = self.add_indirect_object(&Object::Stream(lopdf::Stream::new(content_dict, compressed)))?;

        let mut annot_refs = Vec::new();
        for annotation in &page.annotations {
            let dict = annotation.to_dictionary(|pid: PageId| page_objs[pid.index()]);
            let obj = self.add_indirect_object(&Dictionary(dict))?;
            annot_refs.push(Reference((obj, 0)));
        }

        let mut page_dict = LoDictionary::new();
        page_dict.set("Type", Name(b"Page".to_vec()));
        page_dict.set("Parent", Reference((pages_root_obj, 0)));
        page_dict.set(
            "MediaBox",
            Array(vec![Real(0.0), Real(0.0), Real(page.media_box.0 .0), Real(page.media_box.1 .0)]),
        );
        if let Some(b) = page.crop_box {
            page_dict.set("CropBox", box_array(b));
        }
        if let Some(b) = page.bleed_box {
            page_dict.set("BleedBox", box_array(b));
        }
        if let Some(b) = page.trim_box {
            page_dict.set("TrimBox", box_array(b));
        }
        if let Some(b) = page.art_box {
            page_dict.set("ArtBox", box_array(b));
        }
        page_dict.set("Resources", Reference((resources_obj, 0)));
        page_dict.set("Contents", Reference((content_obj, 0)));
        if !annot_refs.is_empty() {
            page_dict.set("Annots", Array(annot_refs));
        }
        if let Some(t) = page.transition {
            let mut trans = LoDictionary::new();
            trans.set("Type", Name(b"Trans".to_vec()));
            trans.set("D", Real(t.duration_secs));
            page_dict.set("Trans", Dictionary(trans));
        }

        self.write_at_reserved(page_objs[index], &Dictionary(page_dict))
    }

    fn write_outlines(&mut self, page_objs: &[u32]) -> Result<Option<u32>> {
        if self.outlines.is_empty() {
            return Ok(None);
        }
        let root_obj = self.objects.reserve();
        for _ in 0..self.outlines.len() {
            self.objects.reserve();
        }
        let dicts = self.outlines.write(root_obj, |pid: PageId| page_objs[pid.index()]);
        for (num, dict) in dicts {
            self.write_at_reserved(num, &Dictionary(dict))?;
        }
        Ok(Some(root_obj))
    }

    fn write_ocgs(&mut self) -> Result<Option<lopdf::Object>> {
        if self.ocgs.is_empty() {
            return Ok(None);
        }
        let first_obj = self.objects.reserve();
        for _ in 1..self.ocgs.len() {
            self.objects.reserve();
        }
        let (dicts, value) = self.ocgs.write(first_obj);
        for (num, dict) in dicts {
            self.write_at_reserved(num, &Dictionary(dict))?;
        }
        Ok(Some(value))
    }
}

impl Drop for DocumentAssembler {
    fn drop(&mut self) {
        if !self.finalized && !self.poisoned {
            if let Err(e) = self.close() {
                log::warn!("document dropped without being closed; auto-finalize failed: {e}");
            }
        }
    }
}

fn box_array(b: PageBoxOverride) -> lopdf::Object {
    Array(vec![
        Real(b.x.0),
        Real(b.y.0),
        Real((b.x + b.width).0),
        Real((b.y + b.height).0),
    ])
}

fn encode_content(operations: &[lopdf::content::Operation]) -> Result<Vec<u8>> {
    let content = lopdf::content::Content {
        operations: operations.to_vec(),
    };
    content.encode().map_err(|e| {
        log::error!("content stream encoding failed: {e}");
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string()).into()
    })
}

fn deflate(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("in-memory write cannot fail");
    encoder.finish().expect("in-memory write cannot fail")
}
