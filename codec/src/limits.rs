//! Resource limits applied during decoding.

/// Caps on decoder resource usage for a single record.
///
/// Decoding is driven entirely by untrusted input, so every unbounded
/// loop checks one of these limits before growing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum number of field paths a single record may carry.
    pub max_field_paths: usize,
    /// Maximum array cardinality accepted regardless of what the
    /// schema declares.
    pub max_array_elements: u32,
}

impl DecodeLimits {
    /// Limits suitable for production streams.
    #[must_use]
    pub const fn default() -> Self {
        Self {
            max_field_paths: 4096,
            max_array_elements: 16_384,
        }
    }

    /// Tight limits for exercising overflow behavior in tests.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_field_paths: 8,
            max_array_elements: 16,
        }
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::default()
    }
}
