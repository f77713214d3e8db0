//! Adaptive (streaming) mode: encoder and decoder grow the same model in
//! lockstep, so no tree is ever transmitted.
//!
//! Both sides start from an identical all-zero model over the full byte
//! alphabet, code one symbol at a time with the current table, then update
//! the model. Every `2^n` symbols the update policy fires and may rebuild
//! the tree; determinism of the rebuild is what keeps the two ends
//! synchronized. I/O is strictly sequential in fixed-size chunks, except
//! for one bounded write-back of the first output byte once the final
//! padding is known.

use std::io::{Read, Seek, SeekFrom, Write};

use tracing::debug;

use crate::bitio::{BitReader, BitWriter};
use crate::code::CodeTable;
use crate::container::{Policy, StreamHeader};
use crate::error::{ContainerError, Error, Result};
use crate::freq::FrequencyModel;
use crate::tree::Tree;

/// The adaptive symbol is always a plain byte.
const ALPHABET: usize = 256;

/// Read buffer size; memory stays bounded by one chunk plus the sub-byte
/// bit remainder.
const CHUNK_SIZE: usize = 4096;

/// Validated adaptive-mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdaptiveConfig {
    threshold_exp: u8,
    policy: Policy,
}

impl AdaptiveConfig {
    pub fn new(threshold_exp: u8, policy: Policy) -> Result<Self> {
        if threshold_exp > 15 {
            return Err(Error::Config(format!(
                "threshold exponent must be between 0 and 15, got {threshold_exp}"
            )));
        }
        Ok(Self {
            threshold_exp,
            policy,
        })
    }

    pub fn threshold_exp(&self) -> u8 {
        self.threshold_exp
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }
}

/// Mutable per-stream state, owned exclusively by one encode or decode
/// invocation. Both directions run this exact machine; the encoder feeds
/// it read symbols, the decoder feeds it emitted ones.
struct Session {
    freq: FrequencyModel,
    tree: Tree,
    table: CodeTable,
    counter: u64,
    threshold: u64,
    policy: Policy,
    frozen: bool,
}

impl Session {
    fn new(threshold_exp: u8, policy: Policy) -> Session {
        let freq = FrequencyModel::new(ALPHABET);
        let leaves: Vec<(u16, u64)> = freq.all().collect();
        let tree = Tree::build(&leaves);
        let table = CodeTable::from_tree(&tree, ALPHABET);
        Session {
            freq,
            tree,
            table,
            counter: 0,
            threshold: 1u64 << threshold_exp,
            policy,
            frozen: false,
        }
    }

    /// Records one processed symbol; at the threshold boundary the counter
    /// resets and the policy decides whether the tree is rebuilt.
    fn record(&mut self, symbol: u8) {
        self.freq.record(u16::from(symbol));
        self.counter += 1;
        if self.counter == self.threshold {
            self.counter = 0;
            self.apply_policy();
        }
    }

    fn apply_policy(&mut self) {
        match self.policy {
            Policy::Freeze => {
                if self.frozen {
                    return;
                }
                self.frozen = true;
            }
            Policy::Reconstruct => {}
            Policy::Normalize => {
                if self.freq.saturated() {
                    self.freq.halve();
                }
            }
        }
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let leaves: Vec<(u16, u64)> = self.freq.all().collect();
        self.tree = Tree::build(&leaves);
        self.table = CodeTable::from_tree(&self.tree, ALPHABET);
    }
}

/// Encodes `source` into `dest` as a stream container.
///
/// `dest` must be seekable: after the body is fully written, the first
/// output byte is overwritten in place to install the real padding count.
/// If that write-back fails, the whole encode has failed.
pub fn encode<R: Read, W: Write + Seek>(
    mut source: R,
    mut dest: W,
    config: &AdaptiveConfig,
) -> Result<()> {
    let mut session = Session::new(config.threshold_exp, config.policy);
    let header = StreamHeader {
        threshold_exp: config.threshold_exp,
        normal_padding: 0,
        policy: config.policy,
    };

    let mut bits = BitWriter::new();
    header.write(&mut bits);

    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut total_in: u64 = 0;
    loop {
        let filled = read_chunk(&mut source, &mut chunk)?;
        if filled == 0 {
            break;
        }
        total_in += filled as u64;
        for &byte in &chunk[..filled] {
            if let Some(code) = session.table.code(u16::from(byte)) {
                bits.write_code(code);
            }
            session.record(byte);
        }
        dest.write_all(&bits.drain_bytes())?;
    }

    let normal_padding = bits.pad_to_byte();
    dest.write_all(&bits.drain_bytes())?;

    let patched = StreamHeader {
        normal_padding,
        ..header
    };
    dest.seek(SeekFrom::Start(0))?;
    dest.write_all(&[patched.leading_byte()])?;
    dest.flush()?;

    debug!(bytes = total_in, normal_padding, "adaptive encode complete");
    Ok(())
}

/// Decodes a stream container from `source` into `dest`, running the same
/// state machine as the encoder keyed off emitted symbols. The header is
/// read once and drives everything; no configuration is needed.
pub fn decode<R: Read, W: Write>(mut source: R, mut dest: W) -> Result<()> {
    let mut cur = vec![0u8; CHUNK_SIZE];
    let mut next = vec![0u8; CHUNK_SIZE];

    let mut cur_len = read_chunk(&mut source, &mut cur)?;
    if cur_len * 8 < StreamHeader::BITS {
        return Err(ContainerError::TruncatedHeader.into());
    }
    let header = {
        let mut reader = BitReader::new(&cur[..cur_len]);
        StreamHeader::read(&mut reader)?
    };

    let mut session = Session::new(header.threshold_exp, header.policy);
    let mut walker = session.tree.root();
    let mut out = Vec::with_capacity(CHUNK_SIZE);
    let mut offset = StreamHeader::BITS;
    let mut total_out: u64 = 0;

    loop {
        let next_len = read_chunk(&mut source, &mut next)?;
        let is_last = next_len == 0;

        // the declared padding only ever shortens the true last chunk
        let valid_bits = (cur_len * 8)
            .checked_sub(if is_last {
                header.normal_padding as usize
            } else {
                0
            })
            .ok_or(ContainerError::UnexpectedEof)?;
        if valid_bits < offset {
            return Err(ContainerError::UnexpectedEof.into());
        }

        let mut reader = BitReader::new(&cur[..cur_len]);
        reader.skip(offset)?;
        while reader.position() < valid_bits {
            let bit = reader.read_bit()?;
            walker = session.tree.child(walker, bit);
            if let Some(symbol) = session.tree.symbol(walker) {
                out.push(symbol as u8);
                session.record(symbol as u8);
                // the rebuild may have replaced the tree, re-anchor
                walker = session.tree.root();
            }
        }
        total_out += out.len() as u64;
        dest.write_all(&out)?;
        out.clear();

        if is_last {
            break;
        }
        std::mem::swap(&mut cur, &mut next);
        cur_len = next_len;
        offset = 0;
    }

    if walker != session.tree.root() {
        return Err(ContainerError::DanglingCode.into());
    }
    dest.flush()?;

    debug!(bytes = total_out, "adaptive decode complete");
    Ok(())
}

/// Fills `buf` as far as the source allows, looping over short reads so a
/// return of 0 reliably means end of stream.
fn read_chunk<R: Read>(source: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freq::COUNT_CEILING;

    fn code_of(session: &Session, symbol: u8) -> Vec<bool> {
        session
            .table
            .code(u16::from(symbol))
            .expect("adaptive tables cover the whole alphabet")
            .to_vec()
    }

    #[test]
    fn initial_table_assigns_eight_bits_to_every_byte() {
        // 256 equal weights form a perfect depth-8 tree on both ends.
        let session = Session::new(3, Policy::Reconstruct);
        for symbol in 0..=255u8 {
            assert_eq!(code_of(&session, symbol).len(), 8);
        }
    }

    #[test]
    fn freeze_rebuilds_once_and_never_again() {
        let mut session = Session::new(3, Policy::Freeze);
        let initial = code_of(&session, b'a');

        for _ in 0..8 {
            session.record(b'a');
        }
        let after_first = code_of(&session, b'a');
        assert_ne!(initial, after_first, "first threshold must rebuild");
        assert!(session.frozen);

        for _ in 0..8 {
            session.record(b'b');
        }
        assert_eq!(
            code_of(&session, b'a'),
            after_first,
            "later thresholds must not rebuild"
        );
    }

    #[test]
    fn reconstruct_rebuilds_at_every_threshold() {
        let mut session = Session::new(3, Policy::Reconstruct);
        for _ in 0..8 {
            session.record(b'a');
        }
        let after_first = code_of(&session, b'b');
        for _ in 0..8 {
            session.record(b'b');
        }
        assert_ne!(code_of(&session, b'b'), after_first);
    }

    #[test]
    fn normalize_halves_counts_at_the_ceiling() {
        let mut session = Session::new(0, Policy::Normalize);
        session
            .freq
            .count_all(std::iter::repeat(7u16).take((COUNT_CEILING - 1) as usize));
        assert_eq!(session.freq.count(7), COUNT_CEILING - 1);

        // the record that reaches the ceiling fires the halving
        session.record(7);
        assert_eq!(session.freq.count(7), COUNT_CEILING / 2);
    }

    #[test]
    fn counter_resets_at_each_boundary() {
        let mut session = Session::new(2, Policy::Reconstruct);
        for i in 0..12u8 {
            session.record(i);
        }
        assert_eq!(session.counter, 0);
        session.record(0);
        assert_eq!(session.counter, 1);
    }

    #[test]
    fn read_chunk_loops_over_short_reads() {
        struct OneByteAtATime<'a>(&'a [u8]);
        impl Read for OneByteAtATime<'_> {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.0.is_empty() || buf.is_empty() {
                    return Ok(0);
                }
                buf[0] = self.0[0];
                self.0 = &self.0[1..];
                Ok(1)
            }
        }

        let mut source = OneByteAtATime(b"abcdef");
        let mut buf = [0u8; 4];
        assert_eq!(read_chunk(&mut source, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(read_chunk(&mut source, &mut buf).unwrap(), 2);
        assert_eq!(read_chunk(&mut source, &mut buf).unwrap(), 0);
    }
}
