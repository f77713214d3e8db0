//! Prefix-code table derived from a Huffman tree.
//!
//! One traversal assigns every leaf its root-to-leaf path (left appends
//! `1`, right appends `0`). The decode direction is the tree itself,
//! walked bit by bit; it is the logical inverse of this table and is never
//! reconstructed by brute force.

use crate::tree::{NodeId, Tree};

/// Maps symbols to prefix-free codes. Valid only while the generating
/// tree is unchanged; adaptive rebuilds discard and re-derive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: Vec<Option<Vec<bool>>>,
}

impl CodeTable {
    /// Derives the table for `tree` over an alphabet of `alphabet_size`
    /// symbols. A degenerate single-leaf tree gets the one-bit code `0`,
    /// matching what the decoder consumes per symbol in that case.
    pub fn from_tree(tree: &Tree, alphabet_size: usize) -> CodeTable {
        let mut codes = vec![None; alphabet_size];
        if let Some(symbol) = tree.symbol(tree.root()) {
            codes[symbol as usize] = Some(vec![false]);
        } else {
            let mut path = Vec::new();
            Self::assign(tree, tree.root(), &mut path, &mut codes);
        }
        CodeTable { codes }
    }

    fn assign(tree: &Tree, id: NodeId, path: &mut Vec<bool>, codes: &mut [Option<Vec<bool>>]) {
        if let Some(symbol) = tree.symbol(id) {
            codes[symbol as usize] = Some(path.clone());
            return;
        }
        for bit in [true, false] {
            path.push(bit);
            Self::assign(tree, tree.child(id, bit), path, codes);
            path.pop();
        }
    }

    /// The code for `symbol`, or `None` if the symbol never occurred in
    /// the generating frequency mapping.
    pub fn code(&self, symbol: u16) -> Option<&[bool]> {
        self.codes.get(symbol as usize)?.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Tree;

    fn is_prefix(shorter: &[bool], longer: &[bool]) -> bool {
        shorter.len() <= longer.len() && longer[..shorter.len()] == *shorter
    }

    #[test]
    fn two_symbol_table_matches_the_tree_shape() {
        let tree = Tree::build(&[(b'A' as u16, 3), (b'B' as u16, 1)]);
        let table = CodeTable::from_tree(&tree, 256);
        assert_eq!(table.code(b'B' as u16), Some(&[true][..]));
        assert_eq!(table.code(b'A' as u16), Some(&[false][..]));
        assert_eq!(table.code(b'C' as u16), None);
    }

    #[test]
    fn degenerate_single_leaf_gets_a_one_bit_code() {
        let tree = Tree::build(&[(9, 4)]);
        let table = CodeTable::from_tree(&tree, 16);
        assert_eq!(table.code(9), Some(&[false][..]));
    }

    #[test]
    fn no_code_is_a_prefix_of_another() {
        let leaves: Vec<(u16, u64)> = (0..=255u16)
            .map(|s| (s, u64::from(s) * 7 % 23))
            .collect();
        let tree = Tree::build(&leaves);
        let table = CodeTable::from_tree(&tree, 256);

        let codes: Vec<&[bool]> = (0..=255u16).filter_map(|s| table.code(s)).collect();
        assert_eq!(codes.len(), 256);
        for (i, a) in codes.iter().enumerate() {
            for (j, b) in codes.iter().enumerate() {
                if i != j {
                    assert!(!is_prefix(a, b), "code {i} is a prefix of code {j}");
                }
            }
        }
    }

    #[test]
    fn walking_the_tree_inverts_the_table() {
        let tree = Tree::build(&[(0, 10), (1, 3), (2, 3), (3, 1)]);
        let table = CodeTable::from_tree(&tree, 4);
        for symbol in 0..4u16 {
            let mut cursor = tree.root();
            for &bit in table.code(symbol).unwrap() {
                cursor = tree.child(cursor, bit);
            }
            assert_eq!(tree.symbol(cursor), Some(symbol));
        }
    }
}
