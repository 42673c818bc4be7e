//! Low-level bit packing primitives for the fdec decoder.
//!
//! This crate provides [`BitReader`] and [`BitWriter`] for bit-level encoding
//! and decoding, including the variable-width integer forms the replay format
//! uses pervasively (`ubitvar` and bit-position-agnostic varints).
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads are bounds-checked.
//! - **No domain knowledge** - This crate knows nothing about schemas,
//!   field paths, or record state.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitWriter, BitReader};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bool(true);
//! writer.write_ubitvar(1234).unwrap();
//!
//! let bytes = writer.finish();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.read_bit().unwrap(), true);
//! assert_eq!(reader.read_ubitvar().unwrap(), 1234);
//! ```

mod error;
mod reader;
mod writer;

pub use error::{BitError, BitResult};
pub use reader::BitReader;
pub use writer::BitWriter;
