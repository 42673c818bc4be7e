//! Bit-level writer for encoding packed binary data.

use crate::error::{BitError, BitResult};

/// A bit-level writer for encoding packed binary data.
///
/// Writes are accumulated in an internal buffer. Call [`finish`](Self::finish)
/// to get the final byte buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// The accumulated bytes.
    bytes: Vec<u8>,
    /// Current byte being written (not yet pushed to bytes).
    current_byte: u8,
    /// Number of bits written to `current_byte` (0-7).
    bit_count: u8,
}

impl BitWriter {
    /// Creates a new empty `BitWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `BitWriter` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// Returns the number of bits written so far.
    #[must_use]
    pub fn bits_written(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }

    /// Writes a single bit.
    pub fn write_bool(&mut self, value: bool) {
        self.current_byte = (self.current_byte << 1) | u8::from(value);
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.bytes.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// Writes up to 64 bits from an unsigned integer (MSB first).
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64`.
    /// Returns [`BitError::ValueOutOfRange`] if `value` doesn't fit in `bits`.
    pub fn write_bits(&mut self, value: u64, bits: u8) -> BitResult<()> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
        }
        if bits == 0 {
            return Ok(());
        }
        if bits < 64 && value >= (1u64 << bits) {
            return Err(BitError::ValueOutOfRange { value, bits });
        }

        for i in (0..bits).rev() {
            self.write_bool((value >> i) & 1 == 1);
        }
        Ok(())
    }

    /// Writes a self-describing variable-width unsigned integer.
    ///
    /// Mirrors [`BitReader::read_ubitvar`](crate::BitReader::read_ubitvar):
    /// the shortest of the 6/10/14/34-bit forms that holds the value is used.
    pub fn write_ubitvar(&mut self, value: u32) -> BitResult<()> {
        let low = u64::from(value & 0x0F);
        let rest = u64::from(value >> 4);
        if value < 0x10 {
            self.write_bits(low, 6)?;
        } else if value < 0x100 {
            self.write_bits(low | 0x10, 6)?;
            self.write_bits(rest, 4)?;
        } else if value < 0x1000 {
            self.write_bits(low | 0x20, 6)?;
            self.write_bits(rest, 8)?;
        } else {
            self.write_bits(low | 0x30, 6)?;
            self.write_bits(rest, 28)?;
        }
        Ok(())
    }

    /// Writes a varint `u32` as 8-bit groups at the current bit position.
    pub fn write_varu32(&mut self, value: u32) {
        let mut rest = value;
        loop {
            let mut byte = (rest & 0x7F) as u8;
            rest >>= 7;
            if rest != 0 {
                byte |= 0x80;
            }
            for i in (0..8).rev() {
                self.write_bool((byte >> i) & 1 == 1);
            }
            if rest == 0 {
                return;
            }
        }
    }

    /// Writes a zigzag varint `i32` at the current bit position.
    pub fn write_vars32(&mut self, value: i32) {
        let encoded = ((value << 1) ^ (value >> 31)) as u32;
        self.write_varu32(encoded);
    }

    /// Finishes writing and returns the byte buffer.
    ///
    /// If the last byte is incomplete, it is padded with zeros on the right.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        if self.bit_count > 0 {
            self.current_byte <<= 8 - self.bit_count;
            self.bytes.push(self.current_byte);
        }
        self.bytes
    }

    /// Finishes writing and appends to the provided buffer.
    ///
    /// If the last byte is incomplete, it is padded with zeros on the right.
    pub fn finish_into(mut self, buf: &mut Vec<u8>) {
        if self.bit_count > 0 {
            self.current_byte <<= 8 - self.bit_count;
            self.bytes.push(self.current_byte);
        }
        buf.append(&mut self.bytes);
    }
}
