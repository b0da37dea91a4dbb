//! Literals sub-section: raw/RLE passthrough or canonical-Huffman
//! compression, with an optional "reuse the previous block's table" mode.
//!
//! Wire layout (a simplified internal framing, see `DESIGN.md`):
//!   byte 0: bits 0-1 = type, bit 2 = stream count flag (0=1-stream, 1=4-stream)
//!   varint: regenerated size
//!   [Huffman types only] varint: compressed payload size
//!   [fresh Huffman only] weight table: max_symbol:u8, table_log:u8, then
//!       (max_symbol + 1) raw weight bytes
//!   payload

use crate::entropy::huffman::{
    self, decode_1stream, decode_4stream, encode_1stream, encode_4stream, HuffCTable, HuffDTable,
};
use crate::error::{err, Result, ZstdErrorKind};
use crate::varint::{read_uvarint, write_uvarint};

const TYPE_RAW: u8 = 0;
const TYPE_RLE: u8 = 1;
const TYPE_HUFF_FRESH: u8 = 2;
const TYPE_HUFF_REUSE: u8 = 3;

/// Regenerated sizes below this never attempt Huffman; the per-symbol
/// weight table overhead would outweigh any entropy-coding gain.
const MIN_SIZE_TO_COMPRESS: usize = 32;
const FOUR_STREAM_THRESHOLD: usize = 256;

#[derive(Debug, Clone)]
pub struct HuffTable {
    pub ctable: HuffCTable,
    pub dtable: HuffDTable,
}

/// Encode one block's literals, returning the wire bytes and the fresh
/// table to remember as "previous" if this block built one.
pub fn encode(literals: &[u8], prev: Option<&HuffTable>) -> (Vec<u8>, Option<HuffTable>) {
    if literals.is_empty() {
        let mut out = vec![TYPE_RAW];
        write_uvarint(&mut out, 0);
        return (out, None);
    }

    if literals.iter().all(|&b| b == literals[0]) {
        let mut out = vec![TYPE_RLE];
        write_uvarint(&mut out, literals.len() as u64);
        out.push(literals[0]);
        return (out, None);
    }

    let four_stream = literals.len() >= FOUR_STREAM_THRESHOLD;
    let raw_bits = 8 * literals.len() as u64;

    if literals.len() < MIN_SIZE_TO_COMPRESS {
        return (encode_raw(literals), None);
    }

    let reuse_bits = prev
        .filter(|t| t.ctable.covers(literals))
        .map(|t| t.ctable.encoded_bits(literals));

    let mut freq = [0u32; 256];
    for &b in literals {
        freq[b as usize] += 1;
    }
    let fresh = huffman::build_huffman_tables(&freq, huffman::HUF_TABLELOG_MAX).ok();
    let fresh_bits = fresh.as_ref().map(|(ct, _)| ct.encoded_bits(literals) + 16 * 8);

    let best = match (reuse_bits, fresh_bits) {
        (Some(r), Some(f)) if r <= f && r < raw_bits => Some(false),
        (Some(r), Some(f)) if f < r && f < raw_bits => Some(true),
        (Some(r), None) if r < raw_bits => Some(false),
        (None, Some(f)) if f < raw_bits => Some(true),
        _ => None,
    };

    match best {
        Some(true) => {
            let (ct, dt) = fresh.unwrap();
            (encode_huff_fresh(literals, &ct, four_stream), Some(HuffTable { ctable: ct, dtable: dt }))
        }
        Some(false) => (encode_huff_reuse(literals, &prev.unwrap().ctable, four_stream), None),
        None => (encode_raw(literals), None),
    }
}

fn encode_raw(literals: &[u8]) -> Vec<u8> {
    let mut out = vec![TYPE_RAW];
    write_uvarint(&mut out, literals.len() as u64);
    out.extend_from_slice(literals);
    out
}

fn encode_huff_fresh(literals: &[u8], ct: &HuffCTable, four_stream: bool) -> Vec<u8> {
    let payload = payload_for(ct, literals, four_stream);
    let max_symbol = ct.max_symbol();
    let weights = ct.weights();

    let mut out = vec![TYPE_HUFF_FRESH | if four_stream { 0x04 } else { 0 }];
    write_uvarint(&mut out, literals.len() as u64);
    write_uvarint(&mut out, payload.len() as u64);
    out.push(max_symbol);
    out.push(ct.table_log() as u8);
    out.extend_from_slice(&weights[..=max_symbol as usize]);
    out.extend_from_slice(&payload);
    out
}

fn encode_huff_reuse(literals: &[u8], ct: &HuffCTable, four_stream: bool) -> Vec<u8> {
    let payload = payload_for(ct, literals, four_stream);
    let mut out = vec![TYPE_HUFF_REUSE | if four_stream { 0x04 } else { 0 }];
    write_uvarint(&mut out, literals.len() as u64);
    write_uvarint(&mut out, payload.len() as u64);
    out.extend_from_slice(&payload);
    out
}

fn payload_for(ct: &HuffCTable, literals: &[u8], four_stream: bool) -> Vec<u8> {
    if four_stream {
        encode_4stream(ct, literals).expect("sub-stream sizes validated by caller")
    } else {
        let mut w = crate::bitio::BitWriter::new();
        encode_1stream(&mut w, ct, literals);
        w.finish()
    }
}

/// Decode one literals sub-section, returning the literal bytes and,
/// if a fresh table was embedded, the table to carry forward.
pub fn decode(data: &[u8], prev: Option<&HuffTable>) -> Result<(Vec<u8>, usize, Option<HuffTable>)> {
    let Some(&header) = data.first() else {
        return err(ZstdErrorKind::CorruptionDetected, "literals section truncated");
    };
    let kind = header & 0x03;
    let four_stream = header & 0x04 != 0;
    let mut pos = 1usize;

    let Some(regen) = read_uvarint(data, &mut pos) else {
        return err(ZstdErrorKind::CorruptionDetected, "literals regenerated size truncated");
    };
    let regen = regen as usize;

    match kind {
        TYPE_RAW => {
            if data.len() < pos + regen {
                return err(ZstdErrorKind::CorruptionDetected, "raw literals truncated");
            }
            let bytes = data[pos..pos + regen].to_vec();
            Ok((bytes, pos + regen, None))
        }
        TYPE_RLE => {
            let Some(&b) = data.get(pos) else {
                return err(ZstdErrorKind::CorruptionDetected, "RLE literal byte missing");
            };
            Ok((vec![b; regen], pos + 1, None))
        }
        TYPE_HUFF_FRESH => {
            let Some(compressed_len) = read_uvarint(data, &mut pos) else {
                return err(ZstdErrorKind::CorruptionDetected, "huffman payload size truncated");
            };
            let compressed_len = compressed_len as usize;
            let Some(&max_symbol) = data.get(pos) else {
                return err(ZstdErrorKind::CorruptionDetected, "huffman weight header truncated");
            };
            pos += 1;
            let Some(&table_log) = data.get(pos) else {
                return err(ZstdErrorKind::CorruptionDetected, "huffman table log missing");
            };
            pos += 1;
            let nweights = max_symbol as usize + 1;
            if data.len() < pos + nweights {
                return err(ZstdErrorKind::CorruptionDetected, "huffman weight table truncated");
            }
            let mut weights = vec![0u8; 256];
            weights[..nweights].copy_from_slice(&data[pos..pos + nweights]);
            pos += nweights;

            if data.len() < pos + compressed_len {
                return err(ZstdErrorKind::CorruptionDetected, "huffman payload truncated");
            }
            let payload = &data[pos..pos + compressed_len];
            let (ct, dt) = huffman::tables_from_weights(&weights, table_log as u32)?;
            let bytes = decode_payload(&dt, payload, regen, four_stream)?;
            Ok((bytes, pos + compressed_len, Some(HuffTable { ctable: ct, dtable: dt })))
        }
        TYPE_HUFF_REUSE => {
            let Some(compressed_len) = read_uvarint(data, &mut pos) else {
                return err(ZstdErrorKind::CorruptionDetected, "huffman payload size truncated");
            };
            let compressed_len = compressed_len as usize;
            let Some(prev) = prev else {
                return err(ZstdErrorKind::CorruptionDetected, "no previous huffman table to reuse");
            };
            if data.len() < pos + compressed_len {
                return err(ZstdErrorKind::CorruptionDetected, "huffman payload truncated");
            }
            let payload = &data[pos..pos + compressed_len];
            let bytes = decode_payload(&prev.dtable, payload, regen, four_stream)?;
            Ok((bytes, pos + compressed_len, None))
        }
        _ => err(ZstdErrorKind::CorruptionDetected, "reserved literals block type"),
    }
}

fn decode_payload(dt: &HuffDTable, payload: &[u8], regen: usize, four_stream: bool) -> Result<Vec<u8>> {
    if four_stream {
        decode_4stream(dt, payload, regen)
    } else if regen == 0 {
        Ok(Vec::new())
    } else {
        let mut r = crate::bitio::BitReader::new(payload)?;
        decode_1stream(&mut r, dt, regen)
    }
}
