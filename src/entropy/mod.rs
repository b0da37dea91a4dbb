//! Entropy coding stage: FSE/tANS for sequence symbols, canonical Huffman
//! for literal bytes, and the predefined distributions both can fall back
//! to instead of shipping a fresh table.

pub mod fse;
pub mod huffman;
pub mod predefined;

pub use fse::{FseCTable, FseDTable};
pub use huffman::{HuffCTable, HuffDTable};

use crate::error::Result;

/// How a sequences sub-section table was derived, mirrored in its 2-bit
/// mode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    Predefined,
    RLE,
    FSECompressed,
    Repeat,
}

/// Build the FSE encode/decode pair for one of the three predefined
/// distributions.
pub fn predefined_tables(dist: &[i32], table_log: u32) -> Result<(FseCTable, FseDTable)> {
    Ok((
        fse::build_encode_table(dist, table_log)?,
        fse::build_decode_table(dist, table_log)?,
    ))
}
