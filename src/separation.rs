//! Named separation (spot) color spaces: `[/Separation /<name> /DeviceCMYK <tint-function>]`.

use lopdf::Dictionary as LoDictionary;
use lopdf::Object::Name;

use crate::color::DeviceCmyk;
use crate::function::ExponentialFunction;

/// A registered separation color space pending object emission.
#[derive(Debug, Clone, PartialEq)]
pub struct Separation {
    pub name: String,
    pub fallback: DeviceCmyk,
}

impl Separation {
    pub fn new(name: impl Into<String>, fallback: DeviceCmyk) -> Self {
        Self {
            name: name.into(),
            fallback,
        }
    }

    /// The Type 2 tint-transform function from tint `0` to the fallback CMYK.
    pub(crate) fn tint_function(&self) -> ExponentialFunction {
        ExponentialFunction::from_zero_to(vec![
            self.fallback.c.value(),
            self.fallback.m.value(),
            self.fallback.y.value(),
            self.fallback.k.value(),
        ])
    }

    /// `[/Separation /<name> /DeviceCMYK <function ref>]`.
    pub(crate) fn to_array(&self, function_obj: u32) -> lopdf::Object {
        lopdf::Object::Array(vec![
            Name(b"Separation".to_vec()),
            Name(self.name.as_bytes().to_vec()),
            Name(b"DeviceCMYK".to_vec()),
            lopdf::Object::Reference((function_obj, 0)),
        ])
    }
}

/// An ICC-based color space, `[/ICCBased <stream>]` with `/N <channels>`.
pub(crate) fn icc_based_stream_dict(channel_count: i64) -> LoDictionary {
    let mut dict = LoDictionary::new();
    dict.set("N", channel_count);
    dict
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tint_function_channel_count_matches_cmyk() {
        let sep = Separation::new("Gold", DeviceCmyk::new(0.0, 0.2, 1.0, 0.0));
        assert_eq!(sep.tint_function().c1.len(), 4);
    }
}
