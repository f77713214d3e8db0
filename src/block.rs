//! Block (static) mode: one code table for the whole input, with the
//! serialized tree embedded in the output.
//!
//! The symbol is a `byte_size`-bit group rather than a byte; the source is
//! re-chunked bit-wise before counting, and the tail is zero-padded to a
//! whole symbol (`split_padding`). Everything is known before any output
//! is written, so the header needs no patch-back in this mode.

use tracing::debug;

use crate::bitio::{BitReader, BitWriter};
use crate::code::CodeTable;
use crate::container::BlockHeader;
use crate::error::{ContainerError, Error, Result};
use crate::freq::FrequencyModel;
use crate::tree::Tree;

/// Validated block-mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockConfig {
    byte_size: u8,
}

impl BlockConfig {
    pub fn new(byte_size: u8) -> Result<Self> {
        if !(1..=16).contains(&byte_size) {
            return Err(Error::Config(format!(
                "byte size must be between 1 and 16, got {byte_size}"
            )));
        }
        Ok(Self { byte_size })
    }

    pub fn byte_size(&self) -> u8 {
        self.byte_size
    }
}

/// Encodes `input` into a self-contained block container.
pub fn encode(input: &[u8], config: &BlockConfig) -> Result<Vec<u8>> {
    let byte_size = config.byte_size;
    let (symbols, split_padding) = split_symbols(input, byte_size)?;

    let mut model = FrequencyModel::new(1usize << byte_size);
    model.count_all(symbols.iter().copied());
    let mut leaves: Vec<(u16, u64)> = model.observed().collect();
    if leaves.is_empty() {
        // empty source: a lone count-zero leaf keeps the container well formed
        leaves.push((0, 0));
    }

    let tree = Tree::build(&leaves);
    let table = CodeTable::from_tree(&tree, 1usize << byte_size);

    // Every length is known up front, so the padding fields are exact
    // before a single bit is written.
    let tree_bits = 2 * leaves.len() - 1 + leaves.len() * byte_size as usize;
    let payload_bits: usize = leaves
        .iter()
        .map(|&(symbol, count)| {
            table
                .code(symbol)
                .map_or(0, |code| code.len() * count as usize)
        })
        .sum();
    let total_bits = BlockHeader::BITS + tree_bits + payload_bits;
    let normal_padding = ((8 - total_bits % 8) % 8) as u8;

    let header = BlockHeader {
        byte_size,
        split_padding,
        normal_padding,
    };

    let mut out = BitWriter::new();
    header.write(&mut out);
    tree.serialize(byte_size, &mut out);
    for &symbol in &symbols {
        if let Some(code) = table.code(symbol) {
            out.write_code(code);
        }
    }
    debug_assert_eq!(out.bit_len(), total_bits);

    debug!(
        symbols = symbols.len(),
        leaves = leaves.len(),
        tree_bits,
        payload_bits,
        "block encode complete"
    );
    Ok(out.finish())
}

/// Decodes a block container back into the original bytes. The header
/// drives everything; no configuration is needed on this side.
pub fn decode(input: &[u8]) -> Result<Vec<u8>> {
    let mut reader = BitReader::new(input);
    let header = BlockHeader::read(&mut reader)?;
    let tree = Tree::deserialize(&mut reader, header.byte_size)?;

    let total_bits = input.len() * 8;
    let payload_bits = total_bits
        .checked_sub(reader.position() + header.normal_padding as usize)
        .ok_or(ContainerError::UnexpectedEof)?;

    let mut symbols = Vec::new();
    if let Some(symbol) = tree.symbol(tree.root()) {
        // degenerate single-leaf tree: one bit per symbol, value ignored
        for _ in 0..payload_bits {
            reader.read_bit()?;
            symbols.push(symbol);
        }
    } else {
        let mut cursor = tree.root();
        for _ in 0..payload_bits {
            cursor = tree.child(cursor, reader.read_bit()?);
            if let Some(symbol) = tree.symbol(cursor) {
                symbols.push(symbol);
                cursor = tree.root();
            }
        }
        if cursor != tree.root() {
            return Err(ContainerError::DanglingCode.into());
        }
    }

    debug!(
        symbols = symbols.len(),
        byte_size = header.byte_size,
        "block decode complete"
    );
    merge_symbols(&symbols, header.byte_size, header.split_padding)
}

/// Re-chunks the source bytes into `byte_size`-bit symbols, zero-padding
/// the last one. Returns the symbols and the pad bit count.
fn split_symbols(input: &[u8], byte_size: u8) -> Result<(Vec<u16>, u8)> {
    let width = byte_size as usize;
    let total_bits = input.len() * 8;
    let mut reader = BitReader::new(input);
    let mut symbols = Vec::with_capacity(total_bits.div_ceil(width));

    while reader.remaining() > 0 {
        let take = reader.remaining().min(width);
        let value = reader.read_bits(take)?;
        symbols.push((value << (width - take)) as u16);
    }

    let split_padding = ((width - total_bits % width) % width) as u8;
    Ok((symbols, split_padding))
}

/// Inverse of [`split_symbols`]: packs the symbols back into a bit stream
/// and strips the declared split padding.
fn merge_symbols(symbols: &[u16], byte_size: u8, split_padding: u8) -> Result<Vec<u8>> {
    let width = byte_size as usize;
    let symbol_bits = symbols.len() * width;
    let data_bits = symbol_bits
        .checked_sub(split_padding as usize)
        .ok_or(ContainerError::FieldOutOfRange("split_padding"))?;
    if data_bits % 8 != 0 {
        return Err(ContainerError::FieldOutOfRange("split_padding").into());
    }

    let mut writer = BitWriter::new();
    for &symbol in symbols {
        writer.write_bits(u32::from(symbol), width);
    }
    let mut bytes = writer.finish();
    bytes.truncate(data_bits / 8);
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(byte_size: u8) -> BlockConfig {
        BlockConfig::new(byte_size).unwrap()
    }

    #[test]
    fn config_rejects_out_of_range_widths() {
        assert!(BlockConfig::new(0).is_err());
        assert!(BlockConfig::new(17).is_err());
        assert!(BlockConfig::new(1).is_ok());
        assert!(BlockConfig::new(16).is_ok());
    }

    #[test]
    fn aaab_scenario_is_bit_exact() {
        // {A:3, B:1} -> codes {B:"1", A:"0"}; header 0111 0000 0101,
        // tree 0 1 01000010 1 01000001, payload 0001, pad 00000.
        let encoded = encode(b"AAAB", &config(8)).unwrap();
        assert_eq!(encoded, vec![0x70, 0x55, 0x0A, 0x82, 0x20]);
        assert_eq!(decode(&encoded).unwrap(), b"AAAB");
    }

    #[test]
    fn empty_input_round_trips() {
        for byte_size in [1, 8, 16] {
            let encoded = encode(&[], &config(byte_size)).unwrap();
            assert_eq!(decode(&encoded).unwrap(), Vec::<u8>::new());
        }
    }

    #[test]
    fn single_repeated_byte_round_trips() {
        let input = vec![0x5A; 300];
        let encoded = encode(&input, &config(8)).unwrap();
        assert_eq!(decode(&encoded).unwrap(), input);
    }

    #[test]
    fn sub_byte_and_super_byte_widths_round_trip() {
        let input: Vec<u8> = (0..=255u8).cycle().take(611).collect();
        for byte_size in [1, 3, 5, 8, 12, 16] {
            let encoded = encode(&input, &config(byte_size)).unwrap();
            assert_eq!(decode(&encoded).unwrap(), input, "byte_size {byte_size}");
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let input = b"the quick brown fox jumps over the lazy dog";
        let first = encode(input, &config(8)).unwrap();
        let second = encode(input, &config(8)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn split_padding_accounts_for_the_tail() {
        // 5 bytes = 40 bits at width 12 -> 4 symbols, 8 pad bits
        let (symbols, split_padding) = split_symbols(&[1, 2, 3, 4, 5], 12).unwrap();
        assert_eq!(symbols.len(), 4);
        assert_eq!(split_padding, 8);
        assert_eq!(merge_symbols(&symbols, 12, 8).unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn truncated_container_is_malformed() {
        let encoded = encode(b"some data to cut short", &config(8)).unwrap();
        assert!(decode(&encoded[..2]).is_err());
    }
}
