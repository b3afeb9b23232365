//! Crate errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading, editing or writing PLY models and
/// their LiDAR inputs.
#[derive(Debug, Error)]
pub enum PlyError {
    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// An I/O error occurred on a named file.
    #[error("IO error on '{}': {source}", path.display())]
    IoPath {
        /// Path of the file being read or written.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },
    /// Format name is not one of `ascii`, `binary_big_endian`,
    /// `binary_little_endian`.
    #[error("invalid format: '{0}'")]
    InvalidFormat(String),
    /// A header line deviated from the PLY header grammar.
    #[error("malformed header, line {line}: {reason}")]
    MalformedHeader {
        /// 1-based line number in the input.
        line: usize,
        /// What went wrong.
        reason: String,
    },
    /// Scalar type name is not in the supported set.
    #[error("unknown type: '{0}'")]
    UnknownType(String),
    /// Lookup by name on an element that has no such property.
    #[error("unknown property: '{0}'")]
    UnknownProperty(String),
    /// The model has no element with the given name (or it is of the wrong
    /// flavour for the requested operation).
    #[error("no usable element '{0}' in model")]
    MissingElement(&'static str),
    /// Adding a property whose name already exists on the element.
    #[error("duplicate property: '{0}'")]
    DuplicateProperty(String),
    /// A `property` line appeared before any `element` line.
    #[error("property declared before any element, line {0}")]
    PropertyBeforeElement(usize),
    /// Row width does not match the element's property count.
    #[error("arity mismatch: got {got} values, element has {expected} properties")]
    ArityMismatch {
        /// Number of values supplied.
        got: usize,
        /// Number of properties declared.
        expected: usize,
    },
    /// Row index past the end of an element.
    #[error("row index {0} out of range")]
    RowIndexOutOfRange(usize),
    /// Pixel coordinate outside the overlay image.
    #[error("pixel ({0}, {1}) out of range")]
    PixelOutOfRange(u32, u32),
    /// Cell coordinate outside the grid.
    #[error("grid cell ({0}, {1}) out of range")]
    GridIndexOutOfRange(u32, u32),
    /// Integer text exceeds the declared type's range.
    #[error("value '{0}' out of range for type {1}")]
    ValueOutOfRange(String, &'static str),
    /// Any other token parse failure.
    #[error("parse error: {0}")]
    ParseError(String),
    /// The boundary-edge walk hit a vertex with no usable continuation,
    /// which only happens when the boundary is not a union of simple cycles.
    #[error("non-manifold boundary at vertex {0}")]
    NonManifoldBoundary(u32),
}

impl PlyError {
    /// Attaches a path to a bare I/O error; leaves other errors untouched.
    pub(crate) fn with_path(self, path: &std::path::Path) -> Self {
        match self {
            PlyError::Io(source) => PlyError::IoPath {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        }
    }
}

/// A specialized `Result` type for PLY operations.
pub type PlyResult<T> = Result<T, PlyError>;
