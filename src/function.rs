//! PDF Function objects. Only Type 2 (exponential interpolation) is needed
//! by the tint-transform and shading paths this crate emits.

use lopdf::Dictionary as LoDictionary;
use lopdf::Object::{Array, Integer, Real};

/// A PDF Function Type 2 object: `C0 + x^N * (C1 - C0)`, domain `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialFunction {
    pub c0: Vec<f32>,
    pub c1: Vec<f32>,
    pub exponent: f32,
}

impl ExponentialFunction {
    /// A function from `[0]` to the given output, used for separation tint
    /// transforms (`C0` is implicitly all-zero, `C1` is the fallback color).
    pub fn from_zero_to(c1: Vec<f32>) -> Self {
        Self {
            c0: vec![0.0; c1.len()],
            c1,
            exponent: 1.0,
        }
    }

    pub(crate) fn to_dictionary(&self) -> LoDictionary {
        let mut dict = LoDictionary::new();
        dict.set("FunctionType", Integer(2));
        dict.set("Domain", Array(vec![Real(0.0), Real(1.0)]));
        dict.set("C0", Array(self.c0.iter().copied().map(Real).collect()));
        dict.set("C1", Array(self.c1.iter().copied().map(Real).collect()));
        dict.set("N", Real(self.exponent));
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tint_transform_has_matching_channel_counts() {
        let f = ExponentialFunction::from_zero_to(vec![0.0, 0.2, 1.0, 0.0]);
        assert_eq!(f.c0.len(), f.c1.len());
        let dict = f.to_dictionary();
        assert_eq!(dict.get(b"FunctionType").unwrap().as_i64().unwrap(), 2);
    }
}
