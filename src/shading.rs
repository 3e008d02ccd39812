//! Axial and radial shadings (`/ShadingType 2` and `/ShadingType 3`), and the
//! shading patterns built on top of them.

use lopdf::Dictionary as LoDictionary;
use lopdf::Object::{Array, Integer, Name, Real};

use crate::icc_profile::OutputColorSpace;
use crate::ids::{FunctionId, ShadingId};
use crate::units::Pt;

/// Geometry of a shading: axial interpolates along a line, radial between
/// two circles.
#[derive(Debug, Clone, PartialEq)]
pub enum ShadingGeometry {
    Axial {
        from: (Pt, Pt),
        to: (Pt, Pt),
    },
    Radial {
        from: (Pt, Pt, Pt),
        to: (Pt, Pt, Pt),
    },
}

/// A shading dictionary referencing a registered tint-transform function.
#[derive(Debug, Clone, PartialEq)]
pub struct Shading {
    pub geometry: ShadingGeometry,
    pub function: FunctionId,
    pub extend_start: bool,
    pub extend_end: bool,
}

impl Shading {
    pub(crate) fn to_dictionary(
        &self,
        output_space: OutputColorSpace,
        function_obj: u32,
    ) -> LoDictionary {
        let mut dict = LoDictionary::new();
        let colorspace_name = match output_space {
            OutputColorSpace::Rgb => "DeviceRGB",
            OutputColorSpace::Gray => "DeviceGray",
            OutputColorSpace::Cmyk => "DeviceCMYK",
        };
        dict.set("ColorSpace", Name(colorspace_name.as_bytes().to_vec()));
        dict.set(
            "Extend",
            Array(vec![self.extend_start.into(), self.extend_end.into()]),
        );
        dict.set(
            "Function",
            lopdf::Object::Reference((function_obj, 0)),
        );
        match self.geometry {
            ShadingGeometry::Axial { from, to } => {
                dict.set("ShadingType", Integer(2));
                dict.set(
                    "Coords",
                    Array(vec![
                        Real(from.0 .0),
                        Real(from.1 .0),
                        Real(to.0 .0),
                        Real(to.1 .0),
                    ]),
                );
            }
            ShadingGeometry::Radial { from, to } => {
                dict.set("ShadingType", Integer(3));
                dict.set(
                    "Coords",
                    Array(vec![
                        Real(from.0 .0),
                        Real(from.1 .0),
                        Real(from.2 .0),
                        Real(to.0 .0),
                        Real(to.1 .0),
                        Real(to.2 .0),
                    ]),
                );
            }
        }
        dict
    }
}

/// A `/PatternType 2` (shading pattern) built from a registered shading.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadingPattern {
    pub shading: ShadingId,
    /// Optional pattern-space matrix; `None` means identity.
    pub matrix: Option<[f32; 6]>,
}

impl ShadingPattern {
    pub fn new(shading: ShadingId) -> Self {
        Self {
            shading,
            matrix: None,
        }
    }

    pub(crate) fn to_dictionary(&self, shading_obj: u32) -> LoDictionary {
        let mut dict = LoDictionary::new();
        dict.set("Type", Name(b"Pattern".to_vec()));
        dict.set("PatternType", Integer(2));
        dict.set("Shading", lopdf::Object::Reference((shading_obj, 0)));
        if let Some(matrix) = self.matrix {
            dict.set("Matrix", Array(matrix.iter().copied().map(Real).collect()));
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::FunctionId;

    #[test]
    fn axial_shading_writes_type_2() {
        let shading = Shading {
            geometry: ShadingGeometry::Axial {
                from: (Pt(0.0), Pt(0.0)),
                to: (Pt(100.0), Pt(0.0)),
            },
            function: FunctionId(0),
            extend_start: true,
            extend_end: true,
        };
        let dict = shading.to_dictionary(OutputColorSpace::Rgb, 7);
        assert_eq!(dict.get(b"ShadingType").unwrap().as_i64().unwrap(), 2);
    }

    #[test]
    fn radial_shading_writes_type_3() {
        let shading = Shading {
            geometry: ShadingGeometry::Radial {
                from: (Pt(0.0), Pt(0.0), Pt(0.0)),
                to: (Pt(0.0), Pt(0.0), Pt(50.0)),
            },
            function: FunctionId(0),
            extend_start: false,
            extend_end: false,
        };
        let dict = shading.to_dictionary(OutputColorSpace::Cmyk, 9);
        assert_eq!(dict.get(b"ShadingType").unwrap().as_i64().unwrap(), 3);
    }
}
