//! Raster images: a decoded pixel buffer with a declared color space and
//! optional alpha plane, plus `/XObject /Subtype /Image` emission.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::Dictionary as LoDictionary;
use lopdf::Object::{Array, Integer, Name};

use crate::errors::{FormatError, Result};
use crate::units::Px;

/// Declared color space of a decoded image's pixel data.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ImageColorSpace {
    Gray,
    Rgb,
}

impl ImageColorSpace {
    fn pdf_name(self) -> &'static str {
        match self {
            ImageColorSpace::Gray => "DeviceGray",
            ImageColorSpace::Rgb => "DeviceRGB",
        }
    }

    fn channel_count(self) -> usize {
        match self {
            ImageColorSpace::Gray => 1,
            ImageColorSpace::Rgb => 3,
        }
    }
}

/// A decoded raster image, ready for `/XObject` emission. This is the
/// boundary type the resource registry consumes -- decoding PNG/JPEG bytes
/// into this shape is an external collaborator's job (see the `images`
/// feature adapter below for a concrete one).
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: Px,
    pub height: Px,
    pub color_space: ImageColorSpace,
    /// 8 bits per channel, row-major, no padding.
    pub pixels: Vec<u8>,
    /// Optional per-pixel alpha plane (one byte per pixel). When present, an
    /// `/SMask` image is emitted alongside the main image.
    pub alpha: Option<Vec<u8>>,
}

impl DecodedImage {
    pub fn new(width: Px, height: Px, color_space: ImageColorSpace, pixels: Vec<u8>) -> Result<Self> {
        let expected = width.0 * height.0 * color_space.channel_count();
        if pixels.len() != expected {
            return Err(FormatError::Image(format!(
                "expected {expected} pixel bytes, got {}",
                pixels.len()
            ))
            .into());
        }
        Ok(Self {
            width,
            height,
            color_space,
            pixels,
            alpha: None,
        })
    }

    pub fn with_alpha(mut self, alpha: Vec<u8>) -> Result<Self> {
        let expected = self.width.0 * self.height.0;
        if alpha.len() != expected {
            return Err(FormatError::Image(format!(
                "expected {expected} alpha bytes, got {}",
                alpha.len()
            ))
            .into());
        }
        self.alpha = Some(alpha);
        Ok(self)
    }

    /// Builds the soft-mask image dictionary + stream, if this image has
    /// alpha.
    pub(crate) fn smask_stream(&self) -> Option<(LoDictionary, Vec<u8>)> {
        let alpha = self.alpha.as_ref()?;
        let compressed = deflate(alpha);
        let mut dict = LoDictionary::new();
        dict.set("Type", Name(b"XObject".to_vec()));
        dict.set("Subtype", Name(b"Image".to_vec()));
        dict.set("Width", Integer(self.width.0 as i64));
        dict.set("Height", Integer(self.height.0 as i64));
        dict.set("BitsPerComponent", Integer(8));
        dict.set("ColorSpace", Name(b"DeviceGray".to_vec()));
        dict.set("Filter", Name(b"FlateDecode".to_vec()));
        dict.set("Length", Integer(compressed.len() as i64));
        Some((dict, compressed))
    }

    /// Builds the main image dictionary + stream. `smask_obj` is the object
    /// number of the soft-mask image, if `smask_stream` produced one and the
    /// assembler already emitted it.
    pub(crate) fn image_stream(&self, smask_obj: Option<u32>) -> (LoDictionary, Vec<u8>) {
        let compressed = deflate(&self.pixels);
        let mut dict = LoDictionary::new();
        dict.set("Type", Name(b"XObject".to_vec()));
        dict.set("Subtype", Name(b"Image".to_vec()));
        dict.set("Width", Integer(self.width.0 as i64));
        dict.set("Height", Integer(self.height.0 as i64));
        dict.set("BitsPerComponent", Integer(8));
        dict.set("ColorSpace", Name(self.color_space.pdf_name().as_bytes().to_vec()));
        dict.set("Filter", Name(b"FlateDecode".to_vec()));
        dict.set("Length", Integer(compressed.len() as i64));
        if let Some(obj) = smask_obj {
            dict.set("SMask", lopdf::Object::Reference((obj, 0)));
        }
        (dict, compressed)
    }
}

fn deflate(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    // An in-memory `Vec<u8>` writer never fails.
    encoder.write_all(bytes).expect("in-memory write cannot fail");
    encoder.finish().expect("in-memory write cannot fail")
}

/// Where to place a drawn image, expressed as the scale/rotate/translate
/// applied to the unit square PDF maps every image XObject onto.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct ImagePlacement {
    pub x: crate::units::Pt,
    pub y: crate::units::Pt,
    pub width: crate::units::Pt,
    pub height: crate::units::Pt,
    pub rotate_degrees: f32,
}

/// Concrete PNG/JPEG decoder adapter over the `image` crate. The decoding
/// algorithms themselves are not reimplemented here, only the translation
/// into `DecodedImage`.
#[cfg(feature = "images")]
pub mod decode {
    use super::{DecodedImage, ImageColorSpace};
    use crate::errors::{FormatError, Result};
    use crate::units::Px;
    use image::{DynamicImage, GenericImageView};

    pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedImage> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| FormatError::Image(e.to_string()))?;
        decode_dynamic_image(&img)
    }

    pub fn decode_dynamic_image(img: &DynamicImage) -> Result<DecodedImage> {
        let (width, height) = img.dimensions();
        match img {
            DynamicImage::ImageLuma8(buf) => DecodedImage::new(
                Px(width as usize),
                Px(height as usize),
                ImageColorSpace::Gray,
                buf.as_raw().clone(),
            ),
            DynamicImage::ImageRgb8(buf) => DecodedImage::new(
                Px(width as usize),
                Px(height as usize),
                ImageColorSpace::Rgb,
                buf.as_raw().clone(),
            ),
            DynamicImage::ImageRgba8(buf) => {
                let raw = buf.as_raw();
                let mut rgb = Vec::with_capacity((width * height * 3) as usize);
                let mut alpha = Vec::with_capacity((width * height) as usize);
                for px in raw.chunks_exact(4) {
                    rgb.extend_from_slice(&px[0..3]);
                    alpha.push(px[3]);
                }
                DecodedImage::new(
                    Px(width as usize),
                    Px(height as usize),
                    ImageColorSpace::Rgb,
                    rgb,
                )?
                .with_alpha(alpha)
            }
            other => {
                let rgb = other.to_rgb8();
                DecodedImage::new(
                    Px(width as usize),
                    Px(height as usize),
                    ImageColorSpace::Rgb,
                    rgb.into_raw(),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_pixel_length() {
        let result = DecodedImage::new(Px(2), Px(2), ImageColorSpace::Rgb, vec![0; 3]);
        assert!(result.is_err());
    }

    #[test]
    fn accepts_correctly_sized_gray_buffer() {
        let result = DecodedImage::new(Px(2), Px(2), ImageColorSpace::Gray, vec![0; 4]);
        assert!(result.is_ok());
    }

    #[test]
    fn opaque_image_has_no_smask() {
        let img = DecodedImage::new(Px(2), Px(2), ImageColorSpace::Gray, vec![0, 255, 255, 0]).unwrap();
        assert!(img.smask_stream().is_none());
    }

    #[test]
    fn alpha_image_has_smask_of_matching_size() {
        let img = DecodedImage::new(Px(2), Px(2), ImageColorSpace::Gray, vec![0, 255, 255, 0])
            .unwrap()
            .with_alpha(vec![255, 255, 0, 0])
            .unwrap();
        let (dict, bytes) = img.smask_stream().unwrap();
        assert_eq!(dict.get(b"Width").unwrap().as_i64().unwrap(), 2);
        assert!(!bytes.is_empty());
    }
}
