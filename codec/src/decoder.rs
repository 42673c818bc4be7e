//! Record decoding.
//!
//! A record's delta arrives as two consecutive sections: a path
//! section (entropy-coded operations that enumerate the changed field
//! paths in ascending order) followed by a value section (one coded
//! value per path, in the same order). Deletion runs use a separate,
//! simpler encoding handled by [`FieldDecoder::read_deletions`].

use bitstream::BitReader;
use schema::{FieldCodec, FieldKind, FieldPath, Serializer};

use crate::error::{DecodeError, DecodeResult};
use crate::huffman::read_field_op;
use crate::limits::DecodeLimits;
use crate::state::{set_value_for_path, RecordState};
use crate::trace::DecodeObserver;
use crate::value::{read_field_value, FieldValue};

/// Per-field callback invoked after a record's values are stored.
pub type FieldListener<'a> = &'a mut dyn FnMut(usize, &FieldPath);

/// Decodes record deltas and deletion runs.
///
/// The decoder owns the path list arena, so a single instance reused
/// across records amortizes its allocations.
#[derive(Debug)]
pub struct FieldDecoder {
    paths: Vec<FieldPath>,
    limits: DecodeLimits,
}

impl FieldDecoder {
    /// Creates a decoder with production limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(DecodeLimits::default())
    }

    /// Creates a decoder with explicit limits.
    #[must_use]
    pub fn with_limits(limits: DecodeLimits) -> Self {
        Self {
            paths: Vec::with_capacity(limits.max_field_paths.min(4096)),
            limits,
        }
    }

    /// Returns the configured limits.
    #[must_use]
    pub const fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    /// Returns the paths from the most recent decode.
    #[must_use]
    pub fn paths(&self) -> &[FieldPath] {
        &self.paths
    }

    /// Decodes just the path section, leaving the reader positioned at
    /// the first value.
    ///
    /// The returned slice is valid until the next decode call.
    pub fn read_field_paths(
        &mut self,
        reader: &mut BitReader<'_>,
    ) -> DecodeResult<&[FieldPath]> {
        self.decode_paths(reader, None)?;
        Ok(&self.paths)
    }

    /// Decodes a full record delta into `state`.
    ///
    /// Returns the number of fields decoded. If a `listener` is given
    /// it is invoked once per field, in path order, after every value
    /// has been stored.
    pub fn read_fields(
        &mut self,
        reader: &mut BitReader<'_>,
        serializer: &Serializer,
        state: &mut RecordState,
        listener: Option<FieldListener<'_>>,
    ) -> DecodeResult<usize> {
        self.read_fields_inner(reader, serializer, state, listener, None)
    }

    /// Like [`FieldDecoder::read_fields`], with an observer receiving
    /// every operation and value as it is decoded.
    ///
    /// The `listener` works exactly as in [`FieldDecoder::read_fields`];
    /// observation never alters the decode itself.
    pub fn read_fields_observed(
        &mut self,
        reader: &mut BitReader<'_>,
        serializer: &Serializer,
        state: &mut RecordState,
        listener: Option<FieldListener<'_>>,
        observer: &mut dyn DecodeObserver,
    ) -> DecodeResult<usize> {
        self.read_fields_inner(reader, serializer, state, listener, Some(observer))
    }

    fn read_fields_inner(
        &mut self,
        reader: &mut BitReader<'_>,
        serializer: &Serializer,
        state: &mut RecordState,
        listener: Option<FieldListener<'_>>,
        mut observer: Option<&mut dyn DecodeObserver>,
    ) -> DecodeResult<usize> {
        self.decode_paths(reader, observer.as_deref_mut())?;
        self.decode_values(reader, serializer, state, observer)?;
        if let Some(callback) = listener {
            for (ordinal, fp) in self.paths.iter().enumerate() {
                callback(ordinal, fp);
            }
        }
        Ok(self.paths.len())
    }

    fn decode_paths(
        &mut self,
        reader: &mut BitReader<'_>,
        mut observer: Option<&mut (dyn DecodeObserver + '_)>,
    ) -> DecodeResult<()> {
        self.paths.clear();
        let mut cursor = FieldPath::root();
        loop {
            let start = reader.bit_position();
            let op = read_field_op(reader)?;
            op.execute(reader, &mut cursor)?;
            if let Some(obs) = observer.as_deref_mut() {
                obs.on_field_op(op, &cursor, start..reader.bit_position(), reader);
            }
            if op.is_finish() {
                return Ok(());
            }
            if self.paths.len() >= self.limits.max_field_paths {
                return Err(DecodeError::PathOverflow {
                    limit: self.limits.max_field_paths,
                });
            }
            self.paths.push(cursor);
        }
    }

    fn decode_values(
        &self,
        reader: &mut BitReader<'_>,
        serializer: &Serializer,
        state: &mut RecordState,
        mut observer: Option<&mut (dyn DecodeObserver + '_)>,
    ) -> DecodeResult<()> {
        for (ordinal, fp) in self.paths.iter().enumerate() {
            let field = serializer.field_for_path(fp, 0)?;
            let codec = match &field.kind {
                FieldKind::Value { codec } => {
                    (*codec).ok_or_else(|| DecodeError::MissingUnpacker {
                        field: serializer
                            .name_for_path(fp)
                            .unwrap_or_else(|_| field.name().to_string()),
                        type_name: field.properties.type_name.clone(),
                    })?
                }
                // A path ending at the array field carries its cardinality.
                FieldKind::Array { .. } => FieldCodec::VarUInt,
                FieldKind::Record { .. } => {
                    return Err(DecodeError::UnresolvedPath { path: *fp })
                }
            };
            let start = reader.bit_position();
            let value = read_field_value(codec, reader)?;
            if let (FieldKind::Array { .. }, FieldValue::UInt(count)) = (&field.kind, &value) {
                if *count > u64::from(self.limits.max_array_elements) {
                    return Err(DecodeError::InvalidArrayCount {
                        count: *count,
                        limit: self.limits.max_array_elements,
                    });
                }
            }
            if let Some(obs) = observer.as_deref_mut() {
                obs.on_field_value(
                    ordinal,
                    fp,
                    serializer,
                    field,
                    &value,
                    start..reader.bit_position(),
                    reader,
                );
            }
            set_value_for_path(serializer, fp, state, value)?;
        }
        Ok(())
    }

    /// Decodes a deletion run into `deletions`, returning the number
    /// of entries written.
    ///
    /// Entries are slot indices produced by accumulating unsigned
    /// deltas onto a running index that starts at -1. Zero deltas are
    /// legal and yield repeated indices. The running index accumulates
    /// in 64 bits; an entry outside the `i32` range is clamped to its
    /// nearest bound rather than wrapping.
    pub fn read_deletions(
        &self,
        reader: &mut BitReader<'_>,
        deletions: &mut [i32],
    ) -> DecodeResult<usize> {
        let count = reader.read_ubitvar()? as usize;
        if count > deletions.len() {
            return Err(DecodeError::DeletionOverflow {
                count,
                capacity: deletions.len(),
            });
        }
        let mut index: i64 = -1;
        for slot in deletions.iter_mut().take(count) {
            index += i64::from(reader.read_ubitvar()?);
            *slot = index.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
        }
        Ok(count)
    }
}

impl Default for FieldDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bitstream::BitWriter;
    use schema::{Field, FieldProperties, SerializerId};

    use super::*;
    use crate::encoder::encode_field_paths;
    use crate::state::value_for_path;
    use crate::trace::TraceRecorder;
    use crate::value::write_field_value;

    fn leaf(name: &str, codec: FieldCodec) -> Field {
        Field::value(FieldProperties::named(name, codec.name()), Some(codec))
    }

    fn projectile_schema() -> Serializer {
        let origin = Serializer::new(
            SerializerId::new("Vector2D", 0),
            vec![
                leaf("x", FieldCodec::Float32),
                leaf("y", FieldCodec::Float32),
            ],
        );
        Serializer::new(
            SerializerId::new("Projectile", 1),
            vec![
                leaf("m_iHealth", FieldCodec::UInt { bits: 32 }),
                Field::record(
                    FieldProperties::named("m_vecOrigin", "Vector2D"),
                    Arc::new(origin),
                ),
            ],
        )
    }

    fn path(indices: &[i32]) -> FieldPath {
        FieldPath::from_indices(indices).unwrap()
    }

    /// Encodes a path section plus one value per path.
    fn encode_record(paths: &[FieldPath], values: &[(FieldCodec, FieldValue)]) -> Vec<u8> {
        let mut writer = BitWriter::new();
        encode_field_paths(paths, &mut writer).unwrap();
        for (codec, value) in values {
            write_field_value(*codec, value, &mut writer).unwrap();
        }
        writer.finish()
    }

    #[test]
    fn decodes_a_two_level_record() {
        let ser = projectile_schema();
        let paths = [path(&[0]), path(&[1, 0]), path(&[1, 1])];
        let bytes = encode_record(
            &paths,
            &[
                (FieldCodec::UInt { bits: 32 }, FieldValue::UInt(400)),
                (FieldCodec::Float32, FieldValue::Float(-64.0)),
                (FieldCodec::Float32, FieldValue::Float(128.5)),
            ],
        );

        let mut decoder = FieldDecoder::new();
        let mut state = RecordState::for_serializer(&ser);
        let mut reader = BitReader::new(&bytes);
        let mut seen = Vec::new();
        let mut listener = |ordinal: usize, fp: &FieldPath| seen.push((ordinal, *fp));
        let count = decoder
            .read_fields(&mut reader, &ser, &mut state, Some(&mut listener))
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(decoder.paths(), &paths);
        assert_eq!(
            seen,
            vec![(0, paths[0]), (1, paths[1]), (2, paths[2])]
        );
        assert_eq!(
            value_for_path(&ser, &paths[0], &state),
            Some(&FieldValue::UInt(400))
        );
        assert_eq!(
            value_for_path(&ser, &paths[1], &state),
            Some(&FieldValue::Float(-64.0))
        );
        assert_eq!(
            value_for_path(&ser, &paths[2], &state),
            Some(&FieldValue::Float(128.5))
        );
    }

    #[test]
    fn empty_record_decodes_zero_fields() {
        let ser = projectile_schema();
        let bytes = encode_record(&[], &[]);
        let mut decoder = FieldDecoder::new();
        let mut state = RecordState::for_serializer(&ser);
        let mut reader = BitReader::new(&bytes);
        let count = decoder
            .read_fields(&mut reader, &ser, &mut state, None)
            .unwrap();
        assert_eq!(count, 0);
        assert!(!state.has(0));
        assert!(!state.has(1));
    }

    #[test]
    fn path_count_limit_is_enforced() {
        let limit = DecodeLimits::for_testing().max_field_paths;
        let paths: Vec<FieldPath> =
            (0..=limit as i32).map(|i| path(&[i])).collect();
        let mut writer = BitWriter::new();
        encode_field_paths(&paths, &mut writer).unwrap();
        let bytes = writer.finish();

        let mut decoder = FieldDecoder::with_limits(DecodeLimits::for_testing());
        let mut reader = BitReader::new(&bytes);
        let err = decoder.read_field_paths(&mut reader).unwrap_err();
        assert_eq!(err, DecodeError::PathOverflow { limit });
    }

    #[test]
    fn leaf_without_codec_reports_missing_unpacker() {
        let ser = Serializer::new(
            SerializerId::new("Broken", 0),
            vec![Field::value(
                FieldProperties::named("m_hTarget", "CHandle< CBaseEntity >"),
                None,
            )],
        );
        let bytes = encode_record(&[path(&[0])], &[]);
        let mut decoder = FieldDecoder::new();
        let mut state = RecordState::for_serializer(&ser);
        let mut reader = BitReader::new(&bytes);
        let err = decoder
            .read_fields(&mut reader, &ser, &mut state, None)
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingUnpacker {
                field: "m_hTarget".to_string(),
                type_name: "CHandle< CBaseEntity >".to_string(),
            }
        );
    }

    #[test]
    fn path_outside_schema_is_unresolved() {
        let ser = projectile_schema();
        let bytes = encode_record(&[path(&[4])], &[]);
        let mut decoder = FieldDecoder::new();
        let mut state = RecordState::for_serializer(&ser);
        let mut reader = BitReader::new(&bytes);
        let err = decoder
            .read_fields(&mut reader, &ser, &mut state, None)
            .unwrap_err();
        assert_eq!(err, DecodeError::UnresolvedPath { path: path(&[4]) });
        assert!(!state.has(0));
    }

    #[test]
    fn empty_input_reports_out_of_data_and_leaves_state_alone() {
        let ser = projectile_schema();
        let mut decoder = FieldDecoder::new();
        let mut state = RecordState::for_serializer(&ser);
        let mut reader = BitReader::new(&[]);
        let err = decoder
            .read_fields(&mut reader, &ser, &mut state, None)
            .unwrap_err();
        assert!(matches!(err, DecodeError::OutOfData { .. }));
        assert!(!state.has(0));
        assert!(!state.has(1));
    }

    #[test]
    fn truncated_value_section_leaves_state_alone() {
        let ser = projectile_schema();
        // Path section only; the 32-bit value read runs off the end.
        let bytes = encode_record(&[path(&[0])], &[]);
        let mut decoder = FieldDecoder::new();
        let mut state = RecordState::for_serializer(&ser);
        let mut reader = BitReader::new(&bytes);
        let err = decoder
            .read_fields(&mut reader, &ser, &mut state, None)
            .unwrap_err();
        assert!(matches!(err, DecodeError::OutOfData { .. }));
        assert!(!state.has(0));
    }

    #[test]
    fn read_field_paths_stops_at_first_value_bit() {
        let paths = [path(&[0]), path(&[3])];
        let mut writer = BitWriter::new();
        encode_field_paths(&paths, &mut writer).unwrap();
        let section_bits = writer.bits_written();
        writer.write_bits(0xDEAD, 16).unwrap();
        let bytes = writer.finish();

        let mut decoder = FieldDecoder::new();
        let mut reader = BitReader::new(&bytes);
        let decoded = decoder.read_field_paths(&mut reader).unwrap();
        assert_eq!(decoded, &paths);
        assert_eq!(reader.bit_position(), section_bits);
    }

    #[test]
    fn observed_decode_matches_plain_decode() {
        let ser = projectile_schema();
        let paths = [path(&[0]), path(&[1, 0])];
        let bytes = encode_record(
            &paths,
            &[
                (FieldCodec::UInt { bits: 32 }, FieldValue::UInt(7)),
                (FieldCodec::Float32, FieldValue::Float(1.0)),
            ],
        );

        let mut decoder = FieldDecoder::new();
        let mut plain = RecordState::for_serializer(&ser);
        let mut reader = BitReader::new(&bytes);
        decoder
            .read_fields(&mut reader, &ser, &mut plain, None)
            .unwrap();

        let mut observed = RecordState::for_serializer(&ser);
        let mut recorder = TraceRecorder::new();
        let mut reader = BitReader::new(&bytes);
        let count = decoder
            .read_fields_observed(&mut reader, &ser, &mut observed, None, &mut recorder)
            .unwrap();

        assert_eq!(plain, observed);
        // One operation per path plus the terminator.
        assert_eq!(recorder.ops.len(), count + 1);
        assert_eq!(recorder.values.len(), count);
        assert_eq!(recorder.values[0].name, "m_iHealth");
        assert_eq!(recorder.values[1].name, "m_vecOrigin.x");
        assert!(recorder.ops.iter().all(|op| op.bits_read > 0));
        assert!(recorder
            .ops
            .iter()
            .all(|op| op.raw_bits.len() == op.bits_read));
    }

    #[test]
    fn array_cardinality_respects_decoder_limit() {
        let ser = Serializer::new(
            SerializerId::new("Inventory", 0),
            vec![Field::array(
                FieldProperties::named("m_Items", "CUtlVector< uint32 >"),
                leaf("item", FieldCodec::VarUInt),
                1024,
            )],
        );
        // Within the schema's declared limit but over the decoder's.
        let bytes = encode_record(
            &[path(&[0])],
            &[(FieldCodec::VarUInt, FieldValue::UInt(100))],
        );
        let mut decoder = FieldDecoder::with_limits(DecodeLimits::for_testing());
        let mut state = RecordState::for_serializer(&ser);
        let mut reader = BitReader::new(&bytes);
        let err = decoder
            .read_fields(&mut reader, &ser, &mut state, None)
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidArrayCount {
                count: 100,
                limit: DecodeLimits::for_testing().max_array_elements,
            }
        );
    }

    #[test]
    fn deletion_run_accumulates_deltas() {
        let mut writer = BitWriter::new();
        writer.write_ubitvar(3).unwrap();
        for delta in [2u32, 0, 1] {
            writer.write_ubitvar(delta).unwrap();
        }
        let bytes = writer.finish();

        let decoder = FieldDecoder::new();
        let mut reader = BitReader::new(&bytes);
        let mut deletions = [0i32; 8];
        let count = decoder.read_deletions(&mut reader, &mut deletions).unwrap();
        assert_eq!(count, 3);
        // A zero delta repeats the previous index.
        assert_eq!(&deletions[..count], &[1, 1, 2]);
    }

    #[test]
    fn deletion_run_clamps_past_i32_max() {
        let mut writer = BitWriter::new();
        writer.write_ubitvar(2).unwrap();
        for delta in [u32::MAX, u32::MAX] {
            writer.write_ubitvar(delta).unwrap();
        }
        let bytes = writer.finish();

        let decoder = FieldDecoder::new();
        let mut reader = BitReader::new(&bytes);
        let mut deletions = [0i32; 2];
        let count = decoder.read_deletions(&mut reader, &mut deletions).unwrap();
        assert_eq!(count, 2);
        // The 64-bit accumulator keeps growing; each entry saturates.
        assert_eq!(deletions, [i32::MAX, i32::MAX]);
    }

    #[test]
    fn empty_deletion_run() {
        let mut writer = BitWriter::new();
        writer.write_ubitvar(0).unwrap();
        let bytes = writer.finish();

        let decoder = FieldDecoder::new();
        let mut reader = BitReader::new(&bytes);
        let mut deletions = [0i32; 4];
        assert_eq!(
            decoder.read_deletions(&mut reader, &mut deletions).unwrap(),
            0
        );
    }

    #[test]
    fn oversized_deletion_run_is_rejected() {
        let mut writer = BitWriter::new();
        writer.write_ubitvar(5).unwrap();
        let bytes = writer.finish();

        let decoder = FieldDecoder::new();
        let mut reader = BitReader::new(&bytes);
        let mut deletions = [0i32; 2];
        let err = decoder
            .read_deletions(&mut reader, &mut deletions)
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::DeletionOverflow {
                count: 5,
                capacity: 2
            }
        );
    }

    #[test]
    fn decoder_instance_is_reusable() {
        let paths_a = [path(&[1]), path(&[2, 0])];
        let paths_b = [path(&[0])];
        let mut decoder = FieldDecoder::new();

        for expected in [&paths_a[..], &paths_b[..]] {
            let mut writer = BitWriter::new();
            encode_field_paths(expected, &mut writer).unwrap();
            let bytes = writer.finish();
            let mut reader = BitReader::new(&bytes);
            assert_eq!(decoder.read_field_paths(&mut reader).unwrap(), expected);
        }
    }
}
