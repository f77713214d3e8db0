//! Container headers for both output formats.
//!
//! Field widths, MSB-first bit order and traversal order are the wire
//! contract; any conforming encoder/decoder pair must match them exactly.
//!
//! Block container: 12-bit header, serialized tree, code stream, zero pad.
//! Stream container: 10-bit header, code stream, zero pad. Its
//! `normal_padding` field is unknowable until the last chunk is flushed,
//! so the encoder writes it as zero and overwrites the first output byte
//! in place once the total length is known.

use crate::bitio::{BitReader, BitWriter};
use crate::error::{ContainerError, Result};

/// Adaptive model update policy, stored in the stream header as two bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Rebuild the tree once at the first threshold, then never again.
    Freeze,
    /// Rebuild at every threshold from cumulative counts.
    Reconstruct,
    /// Halve every count once one saturates, then rebuild at every threshold.
    Normalize,
}

impl Policy {
    pub fn to_bits(self) -> u32 {
        match self {
            Policy::Freeze => 0b00,
            Policy::Reconstruct => 0b01,
            Policy::Normalize => 0b10,
        }
    }

    pub fn from_bits(bits: u32) -> Result<Policy> {
        match bits {
            0b00 => Ok(Policy::Freeze),
            0b01 => Ok(Policy::Reconstruct),
            0b10 => Ok(Policy::Normalize),
            _ => Err(ContainerError::UnknownPolicy.into()),
        }
    }
}

/// Fixed 12-bit header of the block (static) container.
///
/// | field        | bits | meaning                                        |
/// |--------------|------|------------------------------------------------|
/// | byte_size-1  | 4    | symbol width in bits, 1..=16, stored minus one  |
/// | split_padding| 4    | zero bits appended to make the source divisible |
/// | normal_padding| 4   | trailing zero bits up to the last byte boundary |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub byte_size: u8,
    pub split_padding: u8,
    pub normal_padding: u8,
}

impl BlockHeader {
    pub const BITS: usize = 12;

    pub fn write(&self, out: &mut BitWriter) {
        out.write_bits(u32::from(self.byte_size - 1), 4);
        out.write_bits(u32::from(self.split_padding), 4);
        out.write_bits(u32::from(self.normal_padding), 4);
    }

    pub fn read(reader: &mut BitReader) -> Result<BlockHeader> {
        let byte_size = reader.read_bits(4)? as u8 + 1;
        let split_padding = reader.read_bits(4)? as u8;
        let normal_padding = reader.read_bits(4)? as u8;
        if split_padding >= byte_size {
            return Err(ContainerError::FieldOutOfRange("split_padding").into());
        }
        if normal_padding > 7 {
            return Err(ContainerError::FieldOutOfRange("normal_padding").into());
        }
        Ok(BlockHeader {
            byte_size,
            split_padding,
            normal_padding,
        })
    }
}

/// Fixed 10-bit header of the stream (adaptive) container.
///
/// | field         | bits | meaning                                    |
/// |---------------|------|--------------------------------------------|
/// | n             | 4    | rebuild threshold exponent (every 2^n syms)|
/// | normal_padding| 4    | trailing zero bits, patched in afterwards  |
/// | policy        | 2    | 00 freeze, 01 reconstruct, 10 normalize    |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHeader {
    pub threshold_exp: u8,
    pub normal_padding: u8,
    pub policy: Policy,
}

impl StreamHeader {
    pub const BITS: usize = 10;

    pub fn write(&self, out: &mut BitWriter) {
        out.write_bits(u32::from(self.threshold_exp), 4);
        out.write_bits(u32::from(self.normal_padding), 4);
        out.write_bits(self.policy.to_bits(), 2);
    }

    pub fn read(reader: &mut BitReader) -> Result<StreamHeader> {
        let threshold_exp = reader.read_bits(4)? as u8;
        let normal_padding = reader.read_bits(4)? as u8;
        let policy = Policy::from_bits(reader.read_bits(2)?)?;
        if normal_padding > 7 {
            return Err(ContainerError::FieldOutOfRange("normal_padding").into());
        }
        Ok(StreamHeader {
            threshold_exp,
            normal_padding,
            policy,
        })
    }

    /// The first output byte with the real padding installed; the one
    /// value the encoder writes back in place after the body is complete.
    pub fn leading_byte(&self) -> u8 {
        (self.threshold_exp << 4) | self.normal_padding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ContainerError, Error};

    #[test]
    fn block_header_round_trips() {
        let header = BlockHeader {
            byte_size: 12,
            split_padding: 9,
            normal_padding: 5,
        };
        let mut writer = BitWriter::new();
        header.write(&mut writer);
        assert_eq!(writer.bit_len(), BlockHeader::BITS);

        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);
        assert_eq!(BlockHeader::read(&mut reader).unwrap(), header);
    }

    #[test]
    fn block_header_rejects_split_padding_at_or_above_byte_size() {
        let header = BlockHeader {
            byte_size: 4,
            split_padding: 4,
            normal_padding: 0,
        };
        let mut writer = BitWriter::new();
        header.write(&mut writer);
        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);
        assert!(matches!(
            BlockHeader::read(&mut reader),
            Err(Error::Malformed(ContainerError::FieldOutOfRange(
                "split_padding"
            )))
        ));
    }

    #[test]
    fn stream_header_round_trips_every_policy() {
        for policy in [Policy::Freeze, Policy::Reconstruct, Policy::Normalize] {
            let header = StreamHeader {
                threshold_exp: 13,
                normal_padding: 6,
                policy,
            };
            let mut writer = BitWriter::new();
            header.write(&mut writer);
            assert_eq!(writer.bit_len(), StreamHeader::BITS);

            let bytes = writer.finish();
            let mut reader = BitReader::new(&bytes);
            assert_eq!(StreamHeader::read(&mut reader).unwrap(), header);
        }
    }

    #[test]
    fn unknown_policy_bits_are_rejected() {
        // n=0, padding=0, policy=11
        let bytes = [0b0000_0000, 0b1100_0000];
        let mut reader = BitReader::new(&bytes);
        assert!(matches!(
            StreamHeader::read(&mut reader),
            Err(Error::Malformed(ContainerError::UnknownPolicy))
        ));
    }

    #[test]
    fn leading_byte_packs_exponent_and_padding() {
        let header = StreamHeader {
            threshold_exp: 11,
            normal_padding: 3,
            policy: Policy::Freeze,
        };
        assert_eq!(header.leading_byte(), 0b1011_0011);
    }
}
