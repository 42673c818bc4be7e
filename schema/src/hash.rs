//! Deterministic serializer hashing.

use blake3::Hasher;

use crate::{Field, FieldCodec, FieldKind, Serializer};

/// Computes a deterministic identity hash for a built serializer tree.
///
/// Two serializers hash equal exactly when their identity, field order, and
/// full recursive shape (names, declared types, coders, array limits) match.
#[must_use]
pub fn serializer_hash(serializer: &Serializer) -> u64 {
    let mut hasher = Hasher::new();
    write_serializer(&mut hasher, serializer);
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hasher.finalize().as_bytes()[..8]);
    u64::from_le_bytes(prefix)
}

fn write_serializer(hasher: &mut Hasher, serializer: &Serializer) {
    write_str(hasher, &serializer.id().name);
    hasher.update(&serializer.id().version.to_le_bytes());
    write_u32(hasher, serializer.fields().len() as u32);
    for field in serializer.fields() {
        write_field(hasher, field);
    }
}

fn write_field(hasher: &mut Hasher, field: &Field) {
    write_str(hasher, &field.properties.name);
    write_str(hasher, &field.properties.type_name);
    match &field.kind {
        FieldKind::Value { codec } => {
            write_u8(hasher, 0);
            match codec {
                None => write_u8(hasher, 0),
                Some(codec) => {
                    write_u8(hasher, 1);
                    write_codec(hasher, *codec);
                }
            }
        }
        FieldKind::Record { nested } => {
            write_u8(hasher, 1);
            write_serializer(hasher, nested);
        }
        FieldKind::Array { element, limit } => {
            write_u8(hasher, 2);
            write_u32(hasher, *limit);
            write_field(hasher, element);
        }
    }
}

fn write_codec(hasher: &mut Hasher, codec: FieldCodec) {
    match codec {
        FieldCodec::Bool => write_u8(hasher, 0),
        FieldCodec::UInt { bits } => {
            write_u8(hasher, 1);
            write_u8(hasher, bits);
        }
        FieldCodec::SInt { bits } => {
            write_u8(hasher, 2);
            write_u8(hasher, bits);
        }
        FieldCodec::VarUInt => write_u8(hasher, 3),
        FieldCodec::VarSInt => write_u8(hasher, 4),
        FieldCodec::Float32 => write_u8(hasher, 5),
        FieldCodec::QuantizedFloat { bits, low, high } => {
            write_u8(hasher, 6);
            write_u8(hasher, bits);
            hasher.update(&low.to_bits().to_le_bytes());
            hasher.update(&high.to_bits().to_le_bytes());
        }
        FieldCodec::String => write_u8(hasher, 7),
    }
}

fn write_str(hasher: &mut Hasher, value: &str) {
    write_u32(hasher, value.len() as u32);
    hasher.update(value.as_bytes());
}

fn write_u8(hasher: &mut Hasher, value: u8) {
    hasher.update(&[value]);
}

fn write_u32(hasher: &mut Hasher, value: u32) {
    hasher.update(&value.to_le_bytes());
}
