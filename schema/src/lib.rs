//! Serializer and field tree definitions for the fdec decoder.
//!
//! This crate models the schema side of the field-path delta format:
//! - Tree-paths addressing leaves within nested serializers
//! - The immutable serializer/field tree and its recursive path resolution
//! - Dotted-name lookup in both directions
//! - Deterministic serializer hashing
//!
//! # Design Principles
//!
//! - **Immutable after construction** - Serializer trees are built once by
//!   the schema ingestion layer and shared read-only across all decodes.
//! - **Plain data** - Fields are a tagged variant, resolved by pattern
//!   matching; no virtual dispatch, no interior mutability.
//! - **Deterministic hashing** - The same tree always hashes the same.

mod error;
mod field;
mod hash;
mod path;
mod serializer;

pub use error::{SchemaError, SchemaResult};
pub use field::{Field, FieldCodec, FieldKind, FieldProperties};
pub use hash::serializer_hash;
pub use path::{FieldPath, MAX_FIELD_PATH_DEPTH};
pub use serializer::{Serializer, SerializerId};
