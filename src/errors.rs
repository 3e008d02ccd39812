//! Errors for pdfassembler

use std::error::Error as IError;
use std::fmt;
use std::io::Error as IoError;

/// error_chain and failure are certainly nice, but completely overengineered
/// for this use-case. For example, neither of them allow error localization.
/// Additionally, debugging macros can get hairy really quick and matching with
/// `*e.kind()` or doing From conversions for other errors is really hard to do.
///
/// So in this case, the best form of error handling is to use the simple Rust-native
/// way: Just enums, `From` + pattern matching. No macros, except for this one.
macro_rules! impl_from {
    ($from:ident, $to:ident::$variant:ident) => {
        impl From<$from> for $to {
            fn from(err: $from) -> Self {
                $to::$variant(err)
            }
        }
    };
}

/// Top-level error type returned by every fallible operation in this crate.
#[derive(Debug)]
pub enum Error {
    /// Underlying file I/O failed (open, write, flush).
    Io(IoError),
    /// A structural/semantic PDF error.
    Pdf(PdfError),
    /// A value supplied by the caller was out of range or referenced an
    /// object that doesn't exist.
    Validation(ValidationError),
    /// An operation was attempted on an object in the wrong lifecycle state
    /// (e.g. a finalized page builder, a closed document).
    State(StateError),
    /// A consumed file (font, ICC profile, raster image) was malformed.
    Format(FormatError),
}

/// Status codes mirroring the language-neutral exit codes in the external
/// interface.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Status {
    NoError,
    InvalidIndex,
    NegativeLineWidth,
    DegenerateMatrix,
    NoPagesDefined,
    ColorComponentOutOfRange,
    BadId,
    IoError,
    InvalidFont,
    InvalidImage,
    DoubleFinalize,
}

impl Error {
    /// Maps this error onto the enumerated status codes.
    pub fn status(&self) -> Status {
        match self {
            Error::Io(_) => Status::IoError,
            Error::Pdf(_) => Status::IoError,
            Error::Validation(ValidationError::InvalidIndex(_)) => Status::InvalidIndex,
            Error::Validation(ValidationError::NegativeLineWidth) => Status::NegativeLineWidth,
            Error::Validation(ValidationError::DegenerateMatrix) => Status::DegenerateMatrix,
            Error::Validation(ValidationError::ColorComponentOutOfRange(_)) => {
                Status::ColorComponentOutOfRange
            }
            Error::Validation(ValidationError::BadId(_)) => Status::BadId,
            Error::State(StateError::NoPagesDefined) => Status::NoPagesDefined,
            Error::State(StateError::DoubleFinalize) => Status::DoubleFinalize,
            Error::State(_) => Status::IoError,
            Error::Format(FormatError::Font(_)) => Status::InvalidFont,
            Error::Format(FormatError::Image(_)) => Status::InvalidImage,
            Error::Format(_) => Status::IoError,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PdfError {
    /// An internal invariant (predicted object number, offset accounting, ...)
    /// was violated. Always a bug in this crate, never caller misuse.
    InvariantViolation,
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PdfError::InvariantViolation => write!(f, "internal invariant violated"),
        }
    }
}

impl IError for PdfError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValidationError {
    /// A tagged id indexed past the end of its table.
    InvalidIndex(&'static str),
    /// A line width operator was given a negative width.
    NegativeLineWidth,
    /// A transformation matrix has zero scale on an axis and can't be
    /// inverted (e.g. for text rendering or bounding box computation).
    DegenerateMatrix,
    /// A color component fell outside `[0, 1]` on an API that rejects rather
    /// than clamps.
    ColorComponentOutOfRange(String),
    /// An id referenced a resource that was never registered.
    BadId(&'static str),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ValidationError::InvalidIndex(kind) => write!(f, "{kind} index out of bounds"),
            ValidationError::NegativeLineWidth => write!(f, "line width must not be negative"),
            ValidationError::DegenerateMatrix => write!(f, "transformation matrix has zero scale"),
            ValidationError::ColorComponentOutOfRange(msg) => write!(f, "{msg}"),
            ValidationError::BadId(kind) => write!(f, "unknown {kind} id"),
        }
    }
}

impl IError for ValidationError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StateError {
    /// `close()` was called on a document that has no pages.
    NoPagesDefined,
    /// `close()` (or `finalize()`) was called a second time.
    DoubleFinalize,
    /// An operator was recorded on a page builder that has already been
    /// finalized or discarded.
    BuilderFinalized,
    /// `close()` was called on an assembler that already failed a prior write.
    Poisoned,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StateError::NoPagesDefined => write!(f, "document has no pages"),
            StateError::DoubleFinalize => write!(f, "object was already finalized"),
            StateError::BuilderFinalized => write!(f, "page builder is no longer usable"),
            StateError::Poisoned => write!(f, "assembler is poisoned by a prior I/O failure"),
        }
    }
}

impl IError for StateError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormatError {
    Font(String),
    Image(String),
    Icc(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FormatError::Font(msg) => write!(f, "invalid font: {msg}"),
            FormatError::Image(msg) => write!(f, "invalid image: {msg}"),
            FormatError::Icc(msg) => write!(f, "invalid ICC profile: {msg}"),
        }
    }
}

impl IError for FormatError {}

impl_from!(IoError, Error::Io);
impl_from!(PdfError, Error::Pdf);
impl_from!(ValidationError, Error::Validation);
impl_from!(StateError, Error::State);
impl_from!(FormatError, Error::Format);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "{e}"),
            Error::Pdf(e) => write!(f, "{e}"),
            Error::Validation(e) => write!(f, "{e}"),
            Error::State(e) => write!(f, "{e}"),
            Error::Format(e) => write!(f, "{e}"),
        }
    }
}

impl IError for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// Fails `debug_assert!` in debug builds; in release builds logs the
/// violation and returns it as `Error::Pdf(PdfError::InvariantViolation)`
/// instead of panicking in a caller's production process.
pub(crate) fn invariant(condition: bool, message: &str) -> Result<()> {
    if condition {
        return Ok(());
    }
    debug_assert!(condition, "{message}");
    log::error!("internal invariant violated: {message}");
    Err(PdfError::InvariantViolation.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_covers_validation_kinds() {
        let e: Error = ValidationError::NegativeLineWidth.into();
        assert_eq!(e.status(), Status::NegativeLineWidth);
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = IoError::new(std::io::ErrorKind::Other, "boom");
        let e: Error = io.into();
        assert_eq!(e.status(), Status::IoError);
    }
}
