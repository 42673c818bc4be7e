//! Schema resolution errors.

use std::fmt;

use crate::FieldPath;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur when resolving paths against a serializer tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaError {
    /// A tree-path does not address any field in the serializer tree.
    UnresolvedPath { path: FieldPath },

    /// A cursor mutation would exceed the maximum tree depth.
    PathTooDeep { depth: usize },

    /// A cursor mutation would pop past the root level.
    PathUnderflow { popped: usize, depth: usize },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedPath { path } => {
                write!(f, "field path {path} does not resolve to any field")
            }
            Self::PathTooDeep { depth } => {
                write!(f, "field path depth {depth} exceeds the maximum")
            }
            Self::PathUnderflow { popped, depth } => {
                write!(f, "cannot pop {popped} levels from a path of depth {depth}")
            }
        }
    }
}

impl std::error::Error for SchemaError {}
