//! huffpack: a two-mode Huffman file codec.
//!
//! Two container formats share one codec core:
//! - **block mode** builds a single code table from the whole input and
//!   embeds the serialized tree in the output (`.huff`);
//! - **adaptive mode** starts from an all-zero model on both ends and
//!   updates it in lockstep as data streams through, so no tree is ever
//!   transmitted (`.huff_a`).
//!
//! Module map, leaf first: `bitio` packs and unpacks bit strings, `freq`
//! owns the symbol counts, `tree` builds and (de)serializes the Huffman
//! tree deterministically, `code` derives the prefix-code table,
//! `container` defines the header layouts, and `block`/`adaptive` are the
//! two codec pipelines. Path validation, extension discipline and argument
//! parsing live in the binary, never here.

pub mod adaptive;
pub mod bitio;
pub mod block;
pub mod code;
pub mod container;
pub mod error;
pub mod freq;
pub mod logger;
pub mod tree;

pub use error::{Error, Result};
