//! Annotations: `add_annotation` registers a `{rect, kind}` record; richer
//! annotation types are a caller concern built from a raw dictionary.

use lopdf::Dictionary as LoDictionary;
use lopdf::Object::{Array, Boolean, Name, Real, String as LoString};
use lopdf::StringFormat;

use crate::units::Pt;
use crate::utils::escape_pdf_literal_string;

/// Axis-aligned rectangle in unrotated page space, lower-left origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rect {
    pub x: Pt,
    pub y: Pt,
    pub width: Pt,
    pub height: Pt,
}

impl Rect {
    pub fn from_xywh(x: Pt, y: Pt, width: Pt, height: Pt) -> Self {
        Self { x, y, width, height }
    }

    pub(crate) fn to_array(self) -> lopdf::Object {
        Array(vec![
            Real(self.x.0),
            Real(self.y.0),
            Real((self.x + self.width).0),
            Real((self.y + self.height).0),
        ])
    }
}

/// What an annotation does when activated, or how it's presented.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationKind {
    /// A clickable link, either to an external URI or to a named
    /// destination already written by the outline tree.
    Link { uri_or_dest: LinkTarget },
    /// A sticky-note style text annotation.
    Text { contents: String, open: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LinkTarget {
    Uri(String),
    Page(crate::ids::PageId),
}

/// A registered annotation pending placement on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub rect: Rect,
    pub kind: AnnotationKind,
}

impl Annotation {
    pub fn link_to_uri(rect: Rect, uri: impl Into<String>) -> Self {
        Self {
            rect,
            kind: AnnotationKind::Link {
                uri_or_dest: LinkTarget::Uri(uri.into()),
            },
        }
    }

    pub fn link_to_page(rect: Rect, page: crate::ids::PageId) -> Self {
        Self {
            rect,
            kind: AnnotationKind::Link {
                uri_or_dest: LinkTarget::Page(page),
            },
        }
    }

    pub fn text_note(rect: Rect, contents: impl Into<String>, open: bool) -> Self {
        Self {
            rect,
            kind: AnnotationKind::Text {
                contents: contents.into(),
                open,
            },
        }
    }

    /// Builds the annotation dictionary. `page_object` resolves a
    /// `LinkTarget::Page` to the indirect object number the assembler
    /// assigned that page (already known by the time annotations are
    /// emitted, since the page tree is built first).
    pub(crate) fn to_dictionary(&self, page_object: impl Fn(crate::ids::PageId) -> u32) -> LoDictionary {
        let mut dict = LoDictionary::new();
        dict.set("Rect", self.rect.to_array());
        match &self.kind {
            AnnotationKind::Link { uri_or_dest } => {
                dict.set("Type", Name(b"Annot".to_vec()));
                dict.set("Subtype", Name(b"Link".to_vec()));
                dict.set("Border", Array(vec![Real(0.0), Real(0.0), Real(0.0)]));
                match uri_or_dest {
                    LinkTarget::Uri(uri) => {
                        let mut action = LoDictionary::new();
                        action.set("Type", Name(b"Action".to_vec()));
                        action.set("S", Name(b"URI".to_vec()));
                        action.set("URI", LoString(uri.as_bytes().to_vec(), StringFormat::Literal));
                        dict.set("A", lopdf::Object::Dictionary(action));
                    }
                    LinkTarget::Page(page) => {
                        let obj = page_object(*page);
                        dict.set(
                            "Dest",
                            Array(vec![
                                lopdf::Object::Reference((obj, 0)),
                                Name(b"Fit".to_vec()),
                            ]),
                        );
                    }
                }
            }
            AnnotationKind::Text { contents, open } => {
                dict.set("Type", Name(b"Annot".to_vec()));
                dict.set("Subtype", Name(b"Text".to_vec()));
                dict.set(
                    "Contents",
                    LoString(escape_pdf_literal_string(contents).into_bytes(), StringFormat::Literal),
                );
                dict.set("Open", Boolean(*open));
            }
        }
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uri_link_dictionary_has_action() {
        let rect = Rect::from_xywh(Pt(0.0), Pt(0.0), Pt(100.0), Pt(20.0));
        let annotation = Annotation::link_to_uri(rect, "https://example.com");
        let dict = annotation.to_dictionary(|_| 0);
        assert!(dict.has(b"A"));
        assert!(!dict.has(b"Dest"));
    }

    #[test]
    fn page_link_resolves_destination() {
        let rect = Rect::from_xywh(Pt(0.0), Pt(0.0), Pt(100.0), Pt(20.0));
        let annotation = Annotation::link_to_page(rect, crate::ids::PageId(0));
        let dict = annotation.to_dictionary(|_| 7);
        assert!(dict.has(b"Dest"));
    }

    #[test]
    fn text_note_default_closed() {
        let rect = Rect::from_xywh(Pt(0.0), Pt(0.0), Pt(20.0), Pt(20.0));
        let annotation = Annotation::text_note(rect, "todo", false);
        let dict = annotation.to_dictionary(|_| 0);
        assert_eq!(dict.get(b"Open").unwrap().as_bool().unwrap(), false);
    }
}
