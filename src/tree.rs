//! Huffman tree construction and its self-delimiting wire form.
//!
//! Nodes live in an arena and point at each other with integer handles, so
//! the streaming decoder can keep a `Copy` cursor into the tree while the
//! model underneath it is being mutated.
//!
//! Construction is a pure function of the frequency mapping: ties are
//! broken by a monotonically increasing creation number, with leaves seeded
//! in ascending symbol order. The adaptive decoder relies on this to
//! rebuild byte-for-byte identical trees from its own counts.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::bitio::{BitReader, BitWriter};
use crate::error::Result;

pub type NodeId = u32;

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf(u16),
    Internal { left: NodeId, right: NodeId },
}

/// A full binary Huffman tree: every internal node has exactly two
/// children. A single-symbol alphabet degenerates to a lone leaf root.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

/// Heap ordering: frequency first, then creation sequence. Lexicographic
/// via the derived `Ord`, wrapped in `Reverse` for a min-heap.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct HeapEntry {
    freq: u64,
    seq: u32,
    id: NodeId,
}

impl Tree {
    /// Builds the tree for `leaves`, given as `(symbol, count)` pairs in
    /// ascending symbol order. Count-zero leaves are legal; the all-zero
    /// adaptive bootstrap builds a balanced tree this way.
    ///
    /// # Panics
    /// Panics if `leaves` is empty. Callers guarantee a non-empty alphabet
    /// (block mode substitutes a single count-zero leaf for empty input;
    /// adaptive mode always passes all 256 byte values).
    pub fn build(leaves: &[(u16, u64)]) -> Tree {
        assert!(!leaves.is_empty(), "cannot build a tree over an empty alphabet");

        let mut nodes = Vec::with_capacity(2 * leaves.len() - 1);
        let mut heap = BinaryHeap::with_capacity(leaves.len());
        let mut seq: u32 = 0;

        for &(symbol, freq) in leaves {
            let id = nodes.len() as NodeId;
            nodes.push(TreeNode::Leaf(symbol));
            heap.push(Reverse(HeapEntry { freq, seq, id }));
            seq += 1;
        }

        while heap.len() > 1 {
            let (Some(Reverse(first)), Some(Reverse(second))) = (heap.pop(), heap.pop()) else {
                break;
            };
            let id = nodes.len() as NodeId;
            // first popped becomes the left child
            nodes.push(TreeNode::Internal {
                left: first.id,
                right: second.id,
            });
            heap.push(Reverse(HeapEntry {
                freq: first.freq + second.freq,
                seq,
                id,
            }));
            seq += 1;
        }

        let root = heap.pop().map(|Reverse(entry)| entry.id).unwrap_or(0);
        Tree { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The symbol at `id`, or `None` for an internal node.
    pub fn symbol(&self, id: NodeId) -> Option<u16> {
        match self.nodes[id as usize] {
            TreeNode::Leaf(symbol) => Some(symbol),
            TreeNode::Internal { .. } => None,
        }
    }

    /// Follows one code bit: `1` goes left, `0` goes right.
    ///
    /// A leaf maps to itself; callers handle the degenerate single-leaf
    /// root before walking.
    pub fn child(&self, id: NodeId, bit: bool) -> NodeId {
        match self.nodes[id as usize] {
            TreeNode::Internal { left, right } => {
                if bit {
                    left
                } else {
                    right
                }
            }
            TreeNode::Leaf(_) => id,
        }
    }

    /// Number of leaves. The tree is full, so this follows from the node
    /// count alone.
    pub fn leaf_count(&self) -> usize {
        (self.nodes.len() + 1) / 2
    }

    /// Pre-order wire form: `0` then both children for an internal node,
    /// `1` then the `byte_size`-bit symbol literal for a leaf. The grammar
    /// is self-delimiting, so no length prefix is ever written.
    pub fn serialize(&self, byte_size: u8, out: &mut BitWriter) {
        self.serialize_node(self.root, byte_size, out);
    }

    fn serialize_node(&self, id: NodeId, byte_size: u8, out: &mut BitWriter) {
        match self.nodes[id as usize] {
            TreeNode::Leaf(symbol) => {
                out.write_bit(true);
                out.write_bits(u32::from(symbol), byte_size as usize);
            }
            TreeNode::Internal { left, right } => {
                out.write_bit(false);
                self.serialize_node(left, byte_size, out);
                self.serialize_node(right, byte_size, out);
            }
        }
    }

    /// Mirrors [`serialize`](Tree::serialize): one bit decides the node
    /// kind, recursing left then right. Running past the available bits
    /// surfaces as `UnexpectedEof`.
    pub fn deserialize(reader: &mut BitReader, byte_size: u8) -> Result<Tree> {
        let mut nodes = Vec::new();
        let root = Self::deserialize_node(reader, byte_size, &mut nodes)?;
        Ok(Tree { nodes, root })
    }

    fn deserialize_node(
        reader: &mut BitReader,
        byte_size: u8,
        nodes: &mut Vec<TreeNode>,
    ) -> Result<NodeId> {
        if reader.read_bit()? {
            let symbol = reader.read_bits(byte_size as usize)? as u16;
            let id = nodes.len() as NodeId;
            nodes.push(TreeNode::Leaf(symbol));
            Ok(id)
        } else {
            let left = Self::deserialize_node(reader, byte_size, nodes)?;
            let right = Self::deserialize_node(reader, byte_size, nodes)?;
            let id = nodes.len() as NodeId;
            nodes.push(TreeNode::Internal { left, right });
            Ok(id)
        }
    }
}
