//! Decoded field values and the per-codec read/write routines.

use bitstream::{BitReader, BitWriter};
use schema::FieldCodec;

use crate::error::{DecodeError, DecodeResult};

/// A single decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    UInt(u64),
    SInt(i64),
    Float(f32),
    String(Box<str>),
}

impl FieldValue {
    /// Short name of the value's kind, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::UInt(_) => "uint",
            Self::SInt(_) => "sint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::SInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
        }
    }
}

/// Decodes one value according to `codec`.
pub fn read_field_value(
    codec: FieldCodec,
    reader: &mut BitReader<'_>,
) -> DecodeResult<FieldValue> {
    match codec {
        FieldCodec::Bool => Ok(FieldValue::Bool(reader.read_bit()?)),
        FieldCodec::UInt { bits } => Ok(FieldValue::UInt(reader.read_bits(bits)?)),
        FieldCodec::SInt { bits } => {
            let raw = reader.read_bits(bits)?;
            Ok(FieldValue::SInt(sign_extend(raw, bits)))
        }
        FieldCodec::VarUInt => Ok(FieldValue::UInt(u64::from(reader.read_varu32()?))),
        FieldCodec::VarSInt => Ok(FieldValue::SInt(i64::from(reader.read_vars32()?))),
        FieldCodec::Float32 => {
            let raw = reader.read_bits(32)?;
            Ok(FieldValue::Float(f32::from_bits(raw as u32)))
        }
        FieldCodec::QuantizedFloat { bits, low, high } => {
            let raw = reader.read_bits(bits)?;
            Ok(FieldValue::Float(dequantize(raw, bits, low, high)))
        }
        FieldCodec::String => {
            let mut bytes = Vec::new();
            loop {
                let byte = reader.read_bits(8)? as u8;
                if byte == 0 {
                    break;
                }
                bytes.push(byte);
            }
            let text = String::from_utf8_lossy(&bytes).into_owned();
            Ok(FieldValue::String(text.into_boxed_str()))
        }
    }
}

/// Encodes one value according to `codec`.
///
/// Returns [`DecodeError::ValueMismatch`] when the value's kind does
/// not fit the codec.
pub fn write_field_value(
    codec: FieldCodec,
    value: &FieldValue,
    writer: &mut BitWriter,
) -> DecodeResult<()> {
    match (codec, value) {
        (FieldCodec::Bool, FieldValue::Bool(v)) => {
            writer.write_bool(*v);
            Ok(())
        }
        (FieldCodec::UInt { bits }, FieldValue::UInt(v)) => {
            writer.write_bits(*v, bits)?;
            Ok(())
        }
        (FieldCodec::SInt { bits }, FieldValue::SInt(v)) => {
            let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
            writer.write_bits((*v as u64) & mask, bits)?;
            Ok(())
        }
        (FieldCodec::VarUInt, FieldValue::UInt(v)) => {
            let narrow = u32::try_from(*v).map_err(|_| DecodeError::ValueMismatch {
                expected: "varuint",
                found: "uint wider than 32 bits",
            })?;
            writer.write_varu32(narrow);
            Ok(())
        }
        (FieldCodec::VarSInt, FieldValue::SInt(v)) => {
            let narrow = i32::try_from(*v).map_err(|_| DecodeError::ValueMismatch {
                expected: "varsint",
                found: "sint wider than 32 bits",
            })?;
            writer.write_vars32(narrow);
            Ok(())
        }
        (FieldCodec::Float32, FieldValue::Float(v)) => {
            writer.write_bits(u64::from(v.to_bits()), 32)?;
            Ok(())
        }
        (FieldCodec::QuantizedFloat { bits, low, high }, FieldValue::Float(v)) => {
            writer.write_bits(quantize(*v, bits, low, high), bits)?;
            Ok(())
        }
        (FieldCodec::String, FieldValue::String(v)) => {
            for byte in v.bytes() {
                // NUL terminates the wire form, so it cannot appear inside.
                if byte != 0 {
                    writer.write_bits(u64::from(byte), 8)?;
                }
            }
            writer.write_bits(0, 8)?;
            Ok(())
        }
        (codec, value) => Err(DecodeError::ValueMismatch {
            expected: codec.name(),
            found: value.kind(),
        }),
    }
}

fn sign_extend(raw: u64, bits: u8) -> i64 {
    if bits == 0 || bits >= 64 {
        return raw as i64;
    }
    let shift = 64 - u32::from(bits);
    ((raw << shift) as i64) >> shift
}

fn quant_steps(bits: u8) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

fn dequantize(raw: u64, bits: u8, low: f32, high: f32) -> f32 {
    let steps = quant_steps(bits);
    if steps == 0 {
        return low;
    }
    let fraction = raw as f32 / steps as f32;
    low + (high - low) * fraction
}

fn quantize(value: f32, bits: u8, low: f32, high: f32) -> u64 {
    let steps = quant_steps(bits);
    if steps == 0 || high <= low {
        return 0;
    }
    let clamped = value.clamp(low, high);
    let fraction = (clamped - low) / (high - low);
    let scaled = fraction * steps as f32;
    // round-to-nearest keeps the reconstruction error within half a step
    (scaled + 0.5) as u64
}
