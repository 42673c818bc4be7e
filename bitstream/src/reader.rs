//! Bit-level reader with bounded operations.

use crate::error::{BitError, BitResult};

/// A bit-level reader for decoding packed binary data.
///
/// All read operations are bounds-checked and return errors on failure.
/// The reader never panics on malformed input.
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` from a byte slice.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Returns the number of bits remaining to read.
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        self.data
            .len()
            .saturating_mul(8)
            .saturating_sub(self.bit_pos)
    }

    /// Returns `true` if there are no more bits to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Returns the current bit position.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.bit_pos
    }

    /// Returns the current byte position (rounded down).
    #[must_use]
    pub const fn byte_position(&self) -> usize {
        self.bit_pos / 8
    }

    /// Moves the cursor to an absolute bit position.
    ///
    /// Positions saved with [`bit_position`](Self::bit_position) can be
    /// restored to re-read a range, which diagnostics use to decode a
    /// section twice.
    pub fn set_bit_position(&mut self, bit_pos: usize) -> BitResult<()> {
        let total = self.data.len().saturating_mul(8);
        if bit_pos > total {
            return Err(BitError::EndOfBuffer {
                requested: bit_pos,
                available: total,
            });
        }
        self.bit_pos = bit_pos;
        Ok(())
    }

    /// Reads a single bit as a boolean.
    pub fn read_bit(&mut self) -> BitResult<bool> {
        if self.bits_remaining() == 0 {
            return Err(BitError::EndOfBuffer {
                requested: 1,
                available: 0,
            });
        }
        let bit = self.bit_at(self.bit_pos);
        self.bit_pos += 1;
        Ok(bit)
    }

    /// Reads up to 64 bits as an unsigned integer (MSB first).
    pub fn read_bits(&mut self, bits: u8) -> BitResult<u64> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
        }
        if bits == 0 {
            return Ok(0);
        }
        if bits as usize > self.bits_remaining() {
            return Err(BitError::EndOfBuffer {
                requested: bits as usize,
                available: self.bits_remaining(),
            });
        }

        let mut value = 0u64;
        for _ in 0..bits {
            value = (value << 1) | u64::from(self.bit_at(self.bit_pos));
            self.bit_pos += 1;
        }
        Ok(value)
    }

    /// Reads a self-describing variable-width unsigned integer.
    ///
    /// The low 6 bits come first; the top 2 of those select an extension of
    /// 0, 4, 8, or 28 further bits, which shift in above the low 4 bits.
    pub fn read_ubitvar(&mut self) -> BitResult<u32> {
        let head = self.read_bits(6)? as u32;
        let value = match head & 0x30 {
            0x10 => (head & 0x0F) | ((self.read_bits(4)? as u32) << 4),
            0x20 => (head & 0x0F) | ((self.read_bits(8)? as u32) << 4),
            0x30 => (head & 0x0F) | ((self.read_bits(28)? as u32) << 4),
            _ => head,
        };
        Ok(value)
    }

    /// Reads a varint `u32` as 8-bit groups at the current bit position.
    pub fn read_varu32(&mut self) -> BitResult<u32> {
        let mut result = 0u32;
        for shift in (0..35).step_by(7) {
            let byte = self.read_bits(8)? as u8;
            result |= u32::from(byte & 0x7F) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(BitError::InvalidVarint)
    }

    /// Reads a zigzag varint `i32` at the current bit position.
    pub fn read_vars32(&mut self) -> BitResult<i32> {
        let value = self.read_varu32()?;
        let decoded = ((value >> 1) as i32) ^ (-((value & 1) as i32));
        Ok(decoded)
    }

    /// Renders an already-read bit range as a '0'/'1' string.
    ///
    /// Out-of-range positions are clamped to the buffer. The cursor does not
    /// move; subsequent reads are unaffected. Diagnostics only.
    #[must_use]
    pub fn format_range(&self, start_bit: usize, end_bit: usize) -> String {
        let total = self.data.len() * 8;
        let start = start_bit.min(total);
        let end = end_bit.min(total).max(start);
        (start..end)
            .map(|pos| if self.bit_at(pos) { '1' } else { '0' })
            .collect()
    }

    const fn bit_at(&self, pos: usize) -> bool {
        let byte = self.data[pos / 8];
        (byte >> (7 - pos % 8)) & 1 == 1
    }
}
