//! Record delta decoding.
//!
//! This crate implements the wire layer above [`bitstream`] and
//! [`schema`]: a record delta is a Huffman-coded stream of field-path
//! operations enumerating the changed fields, followed by one coded
//! value per field. Deletion runs use a separate delta-of-index
//! encoding.
//!
//! [`FieldDecoder`] drives both passes and applies decoded values into
//! a [`RecordState`]. Decoding can be observed bit-for-bit through
//! [`DecodeObserver`], and [`collect_dump`] renders accumulated state
//! for inspection. The write side ([`encode_field_paths`],
//! [`write_field_value`]) produces streams the decoder accepts, which
//! the test suite leans on heavily.
//!
//! ```
//! use bitstream::{BitReader, BitWriter};
//! use codec::{encode_field_paths, write_field_value, FieldDecoder, FieldValue, RecordState};
//! use schema::{Field, FieldCodec, FieldPath, FieldProperties, Serializer, SerializerId};
//!
//! let serializer = Serializer::new(
//!     SerializerId::new("Example", 0),
//!     vec![Field::value(
//!         FieldProperties::named("m_iTeam", "uint32"),
//!         Some(FieldCodec::VarUInt),
//!     )],
//! );
//!
//! let path = FieldPath::from_indices(&[0]).unwrap();
//! let mut writer = BitWriter::new();
//! encode_field_paths(&[path], &mut writer).unwrap();
//! write_field_value(FieldCodec::VarUInt, &FieldValue::UInt(3), &mut writer).unwrap();
//! let bytes = writer.finish();
//!
//! let mut decoder = FieldDecoder::new();
//! let mut state = RecordState::for_serializer(&serializer);
//! let mut reader = BitReader::new(&bytes);
//! let count = decoder
//!     .read_fields(&mut reader, &serializer, &mut state, None)
//!     .unwrap();
//! assert_eq!(count, 1);
//! assert_eq!(state.value(0), Some(&FieldValue::UInt(3)));
//! ```

mod decoder;
mod dump;
mod encoder;
mod error;
mod huffman;
mod limits;
mod ops;
mod state;
mod trace;
mod value;

pub use decoder::{FieldDecoder, FieldListener};
pub use dump::{collect_dump, collect_field_paths, DumpEntry};
pub use encoder::{encode_field_paths, write_ubitvar_fp};
pub use error::{DecodeError, DecodeResult};
pub use huffman::{read_field_op, write_field_op};
pub use limits::DecodeLimits;
pub use ops::{read_ubitvar_fp, FieldOp, ALL_FIELD_OPS, FIELD_OP_COUNT};
pub use state::{set_value_for_path, value_for_path, RecordState};
pub use trace::{DecodeObserver, OpTrace, TraceRecorder, ValueTrace};
pub use value::{read_field_value, write_field_value, FieldValue};
