//! Field definitions for serializer trees.

use std::sync::Arc;

use crate::Serializer;

/// The value coder for a leaf field (representation only).
///
/// Coder selection happens at schema build time, outside this crate; decoding
/// dispatches purely on this descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldCodec {
    /// Boolean (1 bit).
    Bool,

    /// Unsigned integer with fixed bit width.
    UInt { bits: u8 },

    /// Signed integer with fixed bit width (two's complement).
    SInt { bits: u8 },

    /// Variable-length unsigned integer.
    VarUInt,

    /// Variable-length signed integer (zigzag encoded).
    VarSInt,

    /// Full-precision 32-bit float.
    Float32,

    /// Float quantized to `bits` over the closed interval `[low, high]`.
    QuantizedFloat { bits: u8, low: f32, high: f32 },

    /// NUL-terminated string of 8-bit characters.
    String,
}

impl FieldCodec {
    /// Short coder name for traces and diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::UInt { .. } => "uint",
            Self::SInt { .. } => "sint",
            Self::VarUInt => "varuint",
            Self::VarSInt => "varsint",
            Self::Float32 => "float32",
            Self::QuantizedFloat { .. } => "qfloat",
            Self::String => "string",
        }
    }
}

/// Declared metadata for a field.
///
/// Everything here comes from the class-definition blob the schema was built
/// from; the decoder itself only dispatches on [`FieldKind`], but traces and
/// external tooling surface these verbatim.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldProperties {
    pub name: String,
    pub type_name: String,
    pub low_value: Option<f32>,
    pub high_value: Option<f32>,
    pub bit_count: Option<u8>,
    pub encode_flags: Option<u32>,
    pub send_node: Option<String>,
}

impl FieldProperties {
    /// Creates properties with just a name and declared type.
    #[must_use]
    pub fn named(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// Sets the declared numeric bounds.
    #[must_use]
    pub fn with_bounds(mut self, low: f32, high: f32) -> Self {
        self.low_value = Some(low);
        self.high_value = Some(high);
        self
    }

    /// Sets the declared bit count.
    #[must_use]
    pub fn with_bit_count(mut self, bits: u8) -> Self {
        self.bit_count = Some(bits);
        self
    }

    /// Sets the declared encode flags.
    #[must_use]
    pub fn with_encode_flags(mut self, flags: u32) -> Self {
        self.encode_flags = Some(flags);
        self
    }

    /// Sets the send-node grouping tag.
    #[must_use]
    pub fn with_send_node(mut self, send_node: impl Into<String>) -> Self {
        self.send_node = Some(send_node.into());
        self
    }
}

/// The shape of a field: a coded leaf, a nested record, or a dynamic array.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Leaf with an optional value coder.
    ///
    /// `None` means the declared type has no coder; resolving such a leaf
    /// during decoding is a fatal error surfaced by the codec layer.
    Value { codec: Option<FieldCodec> },

    /// Nested record described by its own serializer.
    Record { nested: Arc<Serializer> },

    /// Dynamic array of at most `limit` elements, all shaped like `element`.
    ///
    /// A path terminating at the array field itself addresses the array's
    /// cardinality, coded as [`FieldCodec::VarUInt`].
    Array { element: Box<Field>, limit: u32 },
}

/// A named node in a serializer tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub properties: FieldProperties,
    pub kind: FieldKind,
}

impl Field {
    /// Creates a leaf field.
    #[must_use]
    pub fn value(properties: FieldProperties, codec: Option<FieldCodec>) -> Self {
        Self {
            properties,
            kind: FieldKind::Value { codec },
        }
    }

    /// Creates a nested record field.
    #[must_use]
    pub fn record(properties: FieldProperties, nested: Arc<Serializer>) -> Self {
        Self {
            properties,
            kind: FieldKind::Record { nested },
        }
    }

    /// Creates a dynamic array field.
    #[must_use]
    pub fn array(properties: FieldProperties, element: Self, limit: u32) -> Self {
        Self {
            properties,
            kind: FieldKind::Array {
                element: Box::new(element),
                limit,
            },
        }
    }

    /// Returns the field's declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.properties.name
    }

    /// Returns `true` for leaf fields.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self.kind, FieldKind::Value { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codec_names() {
        assert_eq!(FieldCodec::Bool.name(), "bool");
        assert_eq!(FieldCodec::UInt { bits: 7 }.name(), "uint");
        assert_eq!(
            FieldCodec::QuantizedFloat {
                bits: 10,
                low: 0.0,
                high: 1.0
            }
            .name(),
            "qfloat"
        );
    }

    #[test]
    fn properties_builder() {
        let props = FieldProperties::named("m_flSpeed", "float32")
            .with_bounds(0.0, 512.0)
            .with_bit_count(12)
            .with_encode_flags(0x01)
            .with_send_node("m_pGameRules");
        assert_eq!(props.name, "m_flSpeed");
        assert_eq!(props.low_value, Some(0.0));
        assert_eq!(props.high_value, Some(512.0));
        assert_eq!(props.bit_count, Some(12));
        assert_eq!(props.encode_flags, Some(0x01));
        assert_eq!(props.send_node.as_deref(), Some("m_pGameRules"));
    }

    #[test]
    fn leaf_without_codec() {
        let field = Field::value(FieldProperties::named("m_hOwner", "CHandle"), None);
        assert!(field.is_leaf());
        assert!(matches!(field.kind, FieldKind::Value { codec: None }));
    }
}
