//! Bit-level packing and unpacking, MSB-first within every field.
//!
//! `BitWriter` packs variable-length bit strings into byte-aligned output
//! and carries the sub-byte remainder across calls, so the streaming
//! encoder can flush completed bytes chunk by chunk. `BitReader` is a bit
//! cursor over a byte slice.

use crate::error::{ContainerError, Result};

/// Packs bits MSB-first into bytes.
///
/// Completed bytes accumulate until taken with [`drain_bytes`] or
/// [`finish`]; at most 7 leftover bits are held between calls.
///
/// [`drain_bytes`]: BitWriter::drain_bytes
/// [`finish`]: BitWriter::finish
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_buffer: u8,
    bit_count: u8,
    written: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bit(&mut self, bit: bool) {
        self.bit_buffer = (self.bit_buffer << 1) | u8::from(bit);
        self.bit_count += 1;
        self.written += 1;
        if self.bit_count == 8 {
            self.bytes.push(self.bit_buffer);
            self.bit_buffer = 0;
            self.bit_count = 0;
        }
    }

    /// Writes the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u32, count: usize) {
        debug_assert!(count <= 32, "bit count {count} out of range");
        for shift in (0..count).rev() {
            self.write_bit((value >> shift) & 1 == 1);
        }
    }

    /// Appends a prefix code as produced by a code table.
    pub fn write_code(&mut self, code: &[bool]) {
        for &bit in code {
            self.write_bit(bit);
        }
    }

    /// Total number of bits written so far, flushed or not.
    pub fn bit_len(&self) -> usize {
        self.written
    }

    /// Appends zero bits up to the next byte boundary and returns how many
    /// were needed (0..=7).
    pub fn pad_to_byte(&mut self) -> u8 {
        let pad = (8 - self.bit_count) % 8;
        for _ in 0..pad {
            self.write_bit(false);
        }
        pad
    }

    /// Takes every completed byte, leaving any sub-byte remainder in place
    /// for the next flush.
    pub fn drain_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    /// Pads to a byte boundary and returns the full output.
    pub fn finish(mut self) -> Vec<u8> {
        self.pad_to_byte();
        self.bytes
    }
}

/// Reads bits MSB-first from a byte slice.
///
/// The reader has no notion of padding; callers account for declared pad
/// bits themselves and simply stop before reaching them.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        if self.position >= self.data.len() * 8 {
            return Err(ContainerError::UnexpectedEof.into());
        }
        let byte = self.data[self.position / 8];
        let bit = (byte >> (7 - self.position % 8)) & 1;
        self.position += 1;
        Ok(bit == 1)
    }

    /// Reads `count` bits into the low end of a `u32`, MSB-first.
    pub fn read_bits(&mut self, count: usize) -> Result<u32> {
        debug_assert!(count <= 32, "bit count {count} out of range");
        let mut value = 0u32;
        for _ in 0..count {
            value = (value << 1) | u32::from(self.read_bit()?);
        }
        Ok(value)
    }

    /// Advances the cursor without decoding.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        if self.position + count > self.data.len() * 8 {
            return Err(ContainerError::UnexpectedEof.into());
        }
        self.position += count;
        Ok(())
    }

    /// Current bit offset from the start of the slice.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bits left before the end of the slice, padding included.
    pub fn remaining(&self) -> usize {
        self.data.len() * 8 - self.position
    }
}
