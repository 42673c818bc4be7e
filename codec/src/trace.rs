//! Decode observation hooks.
//!
//! An observer sees every operation and value decode as it happens,
//! including the exact bit range each consumed. The decoder calls the
//! hooks unconditionally when an observer is attached and never
//! changes its own behavior based on one, so an observed decode and a
//! plain decode produce identical results.

use std::ops::Range;

use bitstream::BitReader;
use schema::{Field, FieldKind, FieldPath, Serializer};

use crate::ops::FieldOp;
use crate::value::FieldValue;

/// Callbacks invoked during decoding. All hooks default to no-ops.
pub trait DecodeObserver {
    /// Called after each path operation is decoded and applied.
    ///
    /// `bits` spans the operation's code and operands; `path` is the
    /// cursor after the operation ran.
    fn on_field_op(
        &mut self,
        _op: FieldOp,
        _path: &FieldPath,
        _bits: Range<usize>,
        _reader: &BitReader<'_>,
    ) {
    }

    /// Called after each value is decoded, before it is stored.
    ///
    /// `ordinal` is the value's position in the record's path list.
    #[allow(clippy::too_many_arguments)]
    fn on_field_value(
        &mut self,
        _ordinal: usize,
        _path: &FieldPath,
        _serializer: &Serializer,
        _field: &Field,
        _value: &FieldValue,
        _bits: Range<usize>,
        _reader: &BitReader<'_>,
    ) {
    }
}

/// One decoded path operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpTrace {
    /// The operation.
    pub op: FieldOp,
    /// Cursor state after the operation.
    pub path: FieldPath,
    /// Bits consumed by the code and its operands.
    pub bits_read: usize,
    /// The raw bits, rendered as '0'/'1' characters.
    pub raw_bits: String,
}

/// One decoded value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTrace {
    /// Position in the record's path list.
    pub ordinal: usize,
    /// Path the value was stored at.
    pub path: FieldPath,
    /// Dotted field name, with array elements as zero-padded indices.
    pub name: String,
    /// Declared wire type of the field.
    pub type_name: String,
    /// Coder name, or "-" for a coderless position.
    pub codec: &'static str,
    /// Declared numeric bounds, if any.
    pub low_value: Option<f32>,
    /// Declared numeric bounds, if any.
    pub high_value: Option<f32>,
    /// Declared bit count, if any.
    pub bit_count: Option<u8>,
    /// Declared encode flags, if any.
    pub encode_flags: Option<u32>,
    /// The decoded value.
    pub value: FieldValue,
    /// Bits the value consumed.
    pub bits_read: usize,
    /// The raw bits, rendered as '0'/'1' characters.
    pub raw_bits: String,
}

/// An observer that records every operation and value.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    /// Operations in decode order.
    pub ops: Vec<OpTrace>,
    /// Values in decode order.
    pub values: Vec<ValueTrace>,
}

impl TraceRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.ops.clear();
        self.values.clear();
    }
}

impl DecodeObserver for TraceRecorder {
    fn on_field_op(
        &mut self,
        op: FieldOp,
        path: &FieldPath,
        bits: Range<usize>,
        reader: &BitReader<'_>,
    ) {
        self.ops.push(OpTrace {
            op,
            path: *path,
            bits_read: bits.end - bits.start,
            raw_bits: reader.format_range(bits.start, bits.end),
        });
    }

    fn on_field_value(
        &mut self,
        ordinal: usize,
        path: &FieldPath,
        serializer: &Serializer,
        field: &Field,
        value: &FieldValue,
        bits: Range<usize>,
        reader: &BitReader<'_>,
    ) {
        let name = serializer
            .name_for_path(path)
            .unwrap_or_else(|_| field.name().to_string());
        let codec = match &field.kind {
            FieldKind::Value { codec } => (*codec).map_or("-", |c| c.name()),
            FieldKind::Array { .. } => "varuint",
            FieldKind::Record { .. } => "-",
        };
        self.values.push(ValueTrace {
            ordinal,
            path: *path,
            name,
            type_name: field.properties.type_name.clone(),
            codec,
            low_value: field.properties.low_value,
            high_value: field.properties.high_value,
            bit_count: field.properties.bit_count,
            encode_flags: field.properties.encode_flags,
            value: value.clone(),
            bits_read: bits.end - bits.start,
            raw_bits: reader.format_range(bits.start, bits.end),
        });
    }
}
