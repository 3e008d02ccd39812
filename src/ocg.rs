//! Optional content groups ("layers"): registered up front via
//! `DocumentOptions::optional_content_groups`, each written as a standalone
//! `/OCG` indirect object. The catalog's `/OCProperties` entry embeds the
//! `/OCGs` and `/D/ON` arrays directly rather than as its own indirect
//! object, since nothing else ever references it.

use lopdf::Dictionary as LoDictionary;
use lopdf::Object::{Array, Dictionary, Name, Reference};

use crate::ids::OptionalContentGroupId;

/// The document's optional content groups, registered by name at open time.
#[derive(Default)]
pub struct OcgRegistry {
    names: Vec<String>,
}

impl OcgRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>) -> OptionalContentGroupId {
        let id = OptionalContentGroupId(self.names.len());
        self.names.push(name.into());
        id
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Builds one `/OCG` dictionary per registered group, assuming the
    /// caller has already reserved `self.len()` consecutive object numbers
    /// starting at `first_obj`, plus the `/OCProperties` value for the
    /// catalog -- all groups listed in `/OCGs` and, conservatively, all
    /// turned on by default in `/D/ON`.
    pub(crate) fn write(&self, first_obj: u32) -> (Vec<(u32, LoDictionary)>, lopdf::Object) {
        let mut out = Vec::with_capacity(self.names.len());
        let mut refs = Vec::with_capacity(self.names.len());
        for (i, name) in self.names.iter().enumerate() {
            let obj = first_obj + i as u32;
            let mut dict = LoDictionary::new();
            dict.set("Type", Name(b"OCG".to_vec()));
            dict.set("Name", crate::serialize::utf16_literal_object(name));
            out.push((obj, dict));
            refs.push(Reference((obj, 0)));
        }

        let mut ocproperties = LoDictionary::new();
        ocproperties.set("OCGs", Array(refs.clone()));
        let mut d = LoDictionary::new();
        d.set("ON", Array(refs));
        ocproperties.set("D", Dictionary(d));
        (out, Dictionary(ocproperties))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registering_assigns_sequential_ids() {
        let mut reg = OcgRegistry::new();
        let a = reg.register("Layer A");
        let b = reg.register("Layer B");
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
    }

    #[test]
    fn write_emits_one_dictionary_per_group() {
        let mut reg = OcgRegistry::new();
        reg.register("Layer A");
        reg.register("Layer B");

        let (written, props) = reg.write(10);

        assert_eq!(written.len(), 2);
        assert_eq!(written[0].0, 10);
        assert_eq!(written[1].0, 11);
        match props {
            lopdf::Object::Dictionary(d) => assert!(d.has(b"OCGs")),
            _ => panic!("expected a dictionary"),
        }
    }
}
