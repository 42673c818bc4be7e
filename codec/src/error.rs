//! Error types for field decoding.

use bitstream::BitError;
use schema::{FieldPath, SchemaError};

/// Errors produced while decoding field-path operations, values, or
/// deletion runs.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The bit stream ended before the current read completed.
    OutOfData {
        /// Number of bits the read needed.
        requested: usize,
        /// Number of bits left in the buffer.
        available: usize,
    },
    /// A bitstream-level failure other than exhaustion.
    Bitstream(BitError),
    /// Walking the operation code tree exceeded the longest assigned code.
    UnknownOperation {
        /// Bits consumed before the walk was abandoned.
        bits_walked: usize,
    },
    /// More field paths were decoded than the configured limit allows.
    PathOverflow {
        /// Configured path limit.
        limit: usize,
    },
    /// A push would exceed the maximum path depth.
    PathTooDeep {
        /// Depth the push would have produced.
        depth: usize,
    },
    /// A pop or penultimate adjustment would address below the root.
    PathUnderflow {
        /// Number of components the operation tried to discard.
        popped: usize,
        /// Depth of the path at the time.
        depth: usize,
    },
    /// A decoded path does not name a leaf in the schema tree.
    UnresolvedPath {
        /// The offending path.
        path: FieldPath,
    },
    /// A leaf was reached whose schema entry carries no value codec.
    MissingUnpacker {
        /// Dotted name of the field.
        field: String,
        /// Declared wire type of the field.
        type_name: String,
    },
    /// A deletion run announced more entries than the output can hold.
    DeletionOverflow {
        /// Announced entry count.
        count: usize,
        /// Capacity of the output slice.
        capacity: usize,
    },
    /// An array cardinality exceeded the declared element limit.
    InvalidArrayCount {
        /// Decoded cardinality.
        count: u64,
        /// Declared element limit.
        limit: u32,
    },
    /// A value's kind does not match what the schema position expects.
    ValueMismatch {
        /// Codec the schema position calls for.
        expected: &'static str,
        /// Kind of the value that was supplied.
        found: &'static str,
    },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfData {
                requested,
                available,
            } => write!(
                f,
                "out of data: needed {requested} bits, {available} remain"
            ),
            Self::Bitstream(err) => write!(f, "bitstream error: {err}"),
            Self::UnknownOperation { bits_walked } => write!(
                f,
                "no field operation matched after {bits_walked} bits"
            ),
            Self::PathOverflow { limit } => {
                write!(f, "field path count exceeds limit of {limit}")
            }
            Self::PathTooDeep { depth } => {
                write!(f, "field path push to depth {depth} exceeds maximum")
            }
            Self::PathUnderflow { popped, depth } => write!(
                f,
                "cannot discard {popped} components from path of depth {depth}"
            ),
            Self::UnresolvedPath { path } => {
                write!(f, "path {path} does not resolve to a schema leaf")
            }
            Self::MissingUnpacker { field, type_name } => write!(
                f,
                "field {field} of type {type_name} has no value codec"
            ),
            Self::DeletionOverflow { count, capacity } => write!(
                f,
                "deletion run of {count} entries exceeds capacity {capacity}"
            ),
            Self::InvalidArrayCount { count, limit } => write!(
                f,
                "array cardinality {count} exceeds declared limit {limit}"
            ),
            Self::ValueMismatch { expected, found } => {
                write!(f, "expected a {expected} value, found {found}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<BitError> for DecodeError {
    fn from(err: BitError) -> Self {
        match err {
            BitError::EndOfBuffer {
                requested,
                available,
            } => Self::OutOfData {
                requested,
                available,
            },
            other => Self::Bitstream(other),
        }
    }
}

impl From<SchemaError> for DecodeError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::UnresolvedPath { path } => Self::UnresolvedPath { path },
            SchemaError::PathTooDeep { depth } => Self::PathTooDeep { depth },
            SchemaError::PathUnderflow { popped, depth } => {
                Self::PathUnderflow { popped, depth }
            }
        }
    }
}

/// Convenience alias for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
