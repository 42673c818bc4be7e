//! Path section encoding.
//!
//! The encoder is the write-side counterpart of the path pass: it
//! turns an ordered path list into an operation stream the decoder
//! reproduces exactly. It does not attempt entropy-optimal operation
//! selection; it picks from a small universal subset that can express
//! any transition, which keeps it simple and bit-exact.

use bitstream::BitWriter;
use schema::FieldPath;

use crate::error::{DecodeError, DecodeResult};
use crate::huffman::write_field_op;
use crate::ops::FieldOp;

/// Encodes `paths` as an operation stream, terminator included.
///
/// Every path must have non-negative components. Paths are encoded as
/// transitions from the previous path, so the list should be in the
/// order the decoder is meant to see (ascending for real records).
pub fn encode_field_paths(paths: &[FieldPath], writer: &mut BitWriter) -> DecodeResult<()> {
    let mut cursor = FieldPath::root();
    for target in paths {
        if target.components().iter().any(|&c| c < 0) {
            return Err(DecodeError::UnresolvedPath { path: *target });
        }
        encode_transition(&cursor, target, writer)?;
        cursor = *target;
    }
    write_field_op(writer, FieldOp::FieldPathEncodeFinish)?;
    Ok(())
}

fn encode_transition(
    from: &FieldPath,
    to: &FieldPath,
    writer: &mut BitWriter,
) -> DecodeResult<()> {
    let same_prefix = from.last() == to.last()
        && (0..from.last()).all(|i| from.get(i) == to.get(i));
    let last_delta = to.last_index() - from.last_index();

    if same_prefix && last_delta > 0 {
        match last_delta {
            1 => write_field_op(writer, FieldOp::PlusOne)?,
            2 => write_field_op(writer, FieldOp::PlusTwo)?,
            3 => write_field_op(writer, FieldOp::PlusThree)?,
            4 => write_field_op(writer, FieldOp::PlusFour)?,
            n => {
                write_field_op(writer, FieldOp::PlusN)?;
                write_ubitvar_fp(writer, (n - 5) as u32)?;
            }
        }
        return Ok(());
    }

    if to.last() > from.last() {
        // Adjust the shared components, then push the new ones.
        write_field_op(writer, FieldOp::PushNAndNonTopological)?;
        for i in 0..=from.last() {
            let delta = to.get(i) - from.get(i);
            if delta == 0 {
                writer.write_bool(false);
            } else {
                writer.write_bool(true);
                writer.write_vars32(delta - 1);
            }
        }
        let pushed = to.last() - from.last();
        writer.write_ubitvar(pushed as u32)?;
        for i in from.last() + 1..=to.last() {
            write_ubitvar_fp(writer, to.get(i) as u32)?;
        }
        return Ok(());
    }

    // Same depth with a non-suffix change, or an ascent. Pop to the
    // target depth and patch every remaining component.
    write_field_op(writer, FieldOp::PopNAndNonTopographical)?;
    write_ubitvar_fp(writer, (from.last() - to.last()) as u32)?;
    for i in 0..=to.last() {
        let delta = to.get(i) - from.get(i);
        if delta == 0 {
            writer.write_bool(false);
        } else {
            writer.write_bool(true);
            writer.write_vars32(delta);
        }
    }
    Ok(())
}

/// Writes a field-path operand with the graduated width prefix.
///
/// The smallest tier that fits is chosen; values need at most 31 bits.
pub fn write_ubitvar_fp(writer: &mut BitWriter, value: u32) -> DecodeResult<()> {
    if value < (1 << 2) {
        writer.write_bool(true);
        writer.write_bits(u64::from(value), 2)?;
    } else if value < (1 << 4) {
        writer.write_bool(false);
        writer.write_bool(true);
        writer.write_bits(u64::from(value), 4)?;
    } else if value < (1 << 10) {
        writer.write_bool(false);
        writer.write_bool(false);
        writer.write_bool(true);
        writer.write_bits(u64::from(value), 10)?;
    } else if value < (1 << 17) {
        writer.write_bool(false);
        writer.write_bool(false);
        writer.write_bool(false);
        writer.write_bool(true);
        writer.write_bits(u64::from(value), 17)?;
    } else {
        writer.write_bool(false);
        writer.write_bool(false);
        writer.write_bool(false);
        writer.write_bool(false);
        writer.write_bits(u64::from(value), 31)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bitstream::BitReader;
    use proptest::prelude::*;

    use super::*;
    use crate::decoder::FieldDecoder;
    use crate::limits::DecodeLimits;

    fn path(indices: &[i32]) -> FieldPath {
        FieldPath::from_indices(indices).unwrap()
    }

    fn round_trip(paths: &[FieldPath]) -> Vec<FieldPath> {
        let mut writer = BitWriter::new();
        encode_field_paths(paths, &mut writer).unwrap();
        let bytes = writer.finish();
        let mut decoder = FieldDecoder::new();
        let mut reader = BitReader::new(&bytes);
        decoder.read_field_paths(&mut reader).unwrap().to_vec()
    }

    #[test]
    fn ascending_siblings_round_trip() {
        let paths = [path(&[0]), path(&[1]), path(&[4]), path(&[100])];
        assert_eq!(round_trip(&paths), paths);
    }

    #[test]
    fn descent_and_ascent_round_trip() {
        let paths = [
            path(&[0]),
            path(&[1, 0]),
            path(&[1, 1]),
            path(&[1, 1, 5]),
            path(&[2]),
            path(&[2, 3, 0, 1]),
            path(&[7]),
        ];
        assert_eq!(round_trip(&paths), paths);
    }

    #[test]
    fn unordered_lists_still_round_trip() {
        // Real records emit ascending paths; the transition encoding
        // does not actually require it.
        let paths = [path(&[5]), path(&[2, 1]), path(&[2, 0]), path(&[9, 9])];
        assert_eq!(round_trip(&paths), paths);
    }

    #[test]
    fn empty_list_is_just_the_terminator() {
        assert_eq!(round_trip(&[]), Vec::<FieldPath>::new());
    }

    #[test]
    fn negative_component_is_rejected() {
        let bad = FieldPath::from_indices(&[-2]).unwrap();
        let mut writer = BitWriter::new();
        let err = encode_field_paths(&[bad], &mut writer).unwrap_err();
        assert!(matches!(err, DecodeError::UnresolvedPath { .. }));
    }

    #[test]
    fn deep_paths_round_trip() {
        let paths = [path(&[0, 1, 2, 3, 4, 5]), path(&[0, 1, 2, 3, 4, 6])];
        assert_eq!(round_trip(&paths), paths);
    }

    proptest! {
        #[test]
        fn arbitrary_sorted_lists_round_trip(
            raw in proptest::collection::vec(
                proptest::collection::vec(0i32..40, 1..=4),
                0..24,
            )
        ) {
            let mut paths: Vec<FieldPath> = raw
                .iter()
                .map(|indices| FieldPath::from_indices(indices).unwrap())
                .collect();
            paths.sort();
            paths.dedup();

            let mut writer = BitWriter::new();
            encode_field_paths(&paths, &mut writer).unwrap();
            let bytes = writer.finish();

            let mut decoder = FieldDecoder::with_limits(DecodeLimits {
                max_field_paths: 64,
                ..DecodeLimits::default()
            });
            let mut reader = BitReader::new(&bytes);
            let decoded = decoder.read_field_paths(&mut reader).unwrap();
            prop_assert_eq!(decoded, &paths[..]);
        }

        #[test]
        fn large_components_round_trip(a in 0i32..200_000, b in 0i32..200_000) {
            let mut paths = vec![path(&[a]), path(&[a, b])];
            paths.sort();
            let mut writer = BitWriter::new();
            encode_field_paths(&paths, &mut writer).unwrap();
            let bytes = writer.finish();
            let mut decoder = FieldDecoder::new();
            let mut reader = BitReader::new(&bytes);
            prop_assert_eq!(decoder.read_field_paths(&mut reader).unwrap(), &paths[..]);
        }
    }
}
