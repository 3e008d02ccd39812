//! Tagged identifiers.
//!
//! Every resource kind gets its own newtype around a `usize` index into the
//! corresponding registry table, so the type system rejects passing e.g. a
//! `FontId` where an `ImageId` is expected instead of silently mixing up
//! integers.

macro_rules! tagged_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Raw table index this id refers to.
            #[inline]
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

tagged_id!(ImageId, "References a loaded raster image.");
tagged_id!(FontId, "References a loaded font face.");
tagged_id!(IccColorSpaceId, "References a registered ICC color space.");
tagged_id!(LabColorSpaceId, "References a registered Lab color space.");
tagged_id!(SeparationId, "References a registered separation color space.");
tagged_id!(GraphicsStateId, "References a registered ExtGState dictionary.");
tagged_id!(FunctionId, "References a registered PDF function object.");
tagged_id!(ShadingId, "References a registered shading dictionary.");
tagged_id!(PatternId, "References a registered shading pattern.");
tagged_id!(FormXObjectId, "References a finalized form XObject.");
tagged_id!(AnnotationId, "References a registered annotation.");
tagged_id!(
    OptionalContentGroupId,
    "References a registered optional content group."
);
tagged_id!(PageId, "References a page that was added to the document.");
tagged_id!(OutlineId, "References a node in the outline (bookmark) tree.");

impl FontId {
    /// Stable per-font naming token used to build the `/SFont<token>-<subset>`
    /// resource name. Deliberately independent of any indirect object
    /// number: a subset's real object number is only known once the
    /// document closes, but content streams are authored before that, so
    /// the token and the resource-dictionary key generated for it at close
    /// must agree on a convention that doesn't require the object number in
    /// advance.
    pub fn subset_token(self) -> u32 {
        self.0 as u32 + 1
    }
}

/// A font together with the subset it has been assigned into.
///
/// Composite identifier: distinct `FontSubsetId`s may share the same
/// `FontId` while referring to different glyph subsets of that font.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontSubsetId {
    pub font: FontId,
    pub subset_index: usize,
}

impl FontSubsetId {
    pub(crate) fn new(font: FontId, subset_index: usize) -> Self {
        Self { font, subset_index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_ids_do_not_unify() {
        let img = ImageId(3);
        let font = FontId(3);
        // Same numeric value, different types -- this wouldn't compile if
        // uncommented: `assert_eq!(img, font);`
        assert_eq!(img.index(), font.index());
    }
}
