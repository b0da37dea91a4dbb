//! Canonical Huffman coder for literal bytes: table construction (via
//! package-merge length-limiting), a direct-indexed decode table, and
//! 1-stream / 4-stream encode & decode.

use crate::bitio::{BitReader, BitWriter};
use crate::error::{err, Result, ZstdErrorKind};

pub const HUF_TABLELOG_DEFAULT: u32 = 11;
pub const HUF_TABLELOG_MAX: u32 = 12;

#[derive(Debug, Clone, Copy, Default)]
struct CodeEntry {
    code: u32,
    len: u8,
}

/// Encoder side: canonical code (already bit-reversed for LSB-first
/// packing) and length per literal byte.
#[derive(Debug, Clone)]
pub struct HuffCTable {
    table_log: u32,
    codes: Vec<CodeEntry>, // indexed by byte value, len 256
}

#[derive(Debug, Clone, Copy)]
pub struct HuffDEntry {
    pub symbol: u8,
    pub nbits: u8,
}

#[derive(Debug, Clone)]
pub struct HuffDTable {
    pub table_log: u32,
    pub entries: Vec<HuffDEntry>,
}

fn reverse_bits(code: u32, len: u8) -> u32 {
    let mut c = code;
    let mut r = 0u32;
    for _ in 0..len {
        r = (r << 1) | (c & 1);
        c >>= 1;
    }
    r
}

/// One item in the package-merge coin-collector lists: a combined weight
/// and the (positions into the caller's symbol list) it represents.
#[derive(Clone)]
struct Item {
    weight: u64,
    positions: Vec<u32>,
}

/// Length-limited Huffman code lengths via package-merge. `weights` must be
/// sorted ascending by weight; returns a length per input position.
fn package_merge(weights: &[u64], limit: u32) -> Vec<u32> {
    let n = weights.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1];
    }

    let base: Vec<Item> = weights
        .iter()
        .enumerate()
        .map(|(i, &w)| Item {
            weight: w,
            positions: vec![i as u32],
        })
        .collect();

    let mut current = base.clone();
    for _level in 2..=limit {
        let mut packaged = Vec::with_capacity(current.len() / 2);
        let mut it = current.chunks_exact(2);
        for pair in &mut it {
            let mut positions = pair[0].positions.clone();
            positions.extend(pair[1].positions.iter().copied());
            packaged.push(Item {
                weight: pair[0].weight + pair[1].weight,
                positions,
            });
        }
        // merge `packaged` with a fresh copy of `base`, both ascending by weight
        let mut merged = Vec::with_capacity(packaged.len() + base.len());
        let (mut i, mut j) = (0, 0);
        while i < packaged.len() && j < base.len() {
            if packaged[i].weight <= base[j].weight {
                merged.push(packaged[i].clone());
                i += 1;
            } else {
                merged.push(base[j].clone());
                j += 1;
            }
        }
        merged.extend_from_slice(&packaged[i..]);
        merged.extend_from_slice(&base[j..]);
        current = merged;
    }

    let take = (2 * (n - 1)).min(current.len());
    let mut lengths = vec![0u32; n];
    for item in current.iter().take(take) {
        for &pos in &item.positions {
            lengths[pos as usize] += 1;
        }
    }
    for l in &mut lengths {
        if *l == 0 {
            *l = 1;
        }
    }
    lengths
}

/// Build canonical codes from a set of (symbol, length) pairs already
/// sorted by ascending symbol id.
fn assign_canonical_codes(lengths: &[(u8, u32)], max_len: u32) -> Vec<(u8, u32, u32)> {
    let mut bl_count = vec![0u32; max_len as usize + 1];
    for &(_, len) in lengths {
        bl_count[len as usize] += 1;
    }
    let mut next_code = vec![0u32; max_len as usize + 1];
    let mut code = 0u32;
    for len in 1..=max_len as usize {
        code = (code + bl_count[len - 1]) << 1;
        next_code[len] = code;
    }
    lengths
        .iter()
        .map(|&(sym, len)| {
            let c = next_code[len as usize];
            next_code[len as usize] += 1;
            (sym, c, len)
        })
        .collect()
}

/// Build matching encode/decode Huffman tables for the given byte
/// frequency histogram (index = byte value, length 256).
pub fn build_huffman_tables(freq: &[u32; 256], max_table_log: u32) -> Result<(HuffCTable, HuffDTable)> {
    let mut present: Vec<(u8, u64)> = freq
        .iter()
        .enumerate()
        .filter(|&(_, &f)| f > 0)
        .map(|(s, &f)| (s as u8, f as u64))
        .collect();
    if present.is_empty() {
        return err(ZstdErrorKind::CorruptionDetected, "no literals to build a Huffman table for");
    }
    present.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

    let n = present.len();
    let min_log = (usize::BITS - (n - 1).max(1).leading_zeros()).max(1);
    let table_log = min_log.max(5).min(max_table_log).max(1);

    let weights: Vec<u64> = present.iter().map(|&(_, w)| w).collect();
    let lengths = package_merge(&weights, table_log);

    let mut by_symbol: Vec<(u8, u32)> = present
        .iter()
        .zip(lengths.iter())
        .map(|(&(sym, _), &len)| (sym, len))
        .collect();
    by_symbol.sort_by_key(|&(sym, _)| sym);
    let max_len = *lengths.iter().max().unwrap();

    Ok(build_from_lengths(&by_symbol, table_log, max_len))
}

/// Rebuild a (encode, decode) table pair from already-known code lengths,
/// used both by `build_huffman_tables` and when a block reuses a weight
/// table carried over from an earlier one.
fn build_from_lengths(by_symbol: &[(u8, u32)], table_log: u32, max_len: u32) -> (HuffCTable, HuffDTable) {
    let assigned = assign_canonical_codes(by_symbol, max_len);

    let mut codes = vec![CodeEntry::default(); 256];
    let mut entries = vec![
        HuffDEntry {
            symbol: 0,
            nbits: 0
        };
        1 << table_log
    ];
    for (sym, code, len) in assigned {
        let rc = reverse_bits(code, len as u8);
        codes[sym as usize] = CodeEntry { code: rc, len: len as u8 };
        let span = 1usize << (table_log - len);
        for i in 0..span {
            let idx = (rc as usize) | (i << len);
            entries[idx] = HuffDEntry { symbol: sym, nbits: len as u8 };
        }
    }

    (
        HuffCTable { table_log, codes },
        HuffDTable { table_log, entries },
    )
}

/// Reconstruct both tables from a per-symbol weight array (the literals
/// section's embedded weight table): weight `w > 0` means code length
/// `table_log - w + 1`; weight `0` means the symbol is absent.
pub fn tables_from_weights(weights: &[u8], table_log: u32) -> Result<(HuffCTable, HuffDTable)> {
    let mut by_symbol = Vec::new();
    let mut max_len = 0u32;
    for (sym, &w) in weights.iter().enumerate() {
        if w == 0 {
            continue;
        }
        if w as u32 > table_log {
            return err(ZstdErrorKind::CorruptionDetected, "huffman weight exceeds table log");
        }
        let len = table_log - w as u32 + 1;
        max_len = max_len.max(len);
        by_symbol.push((sym as u8, len));
    }
    if by_symbol.is_empty() {
        return err(ZstdErrorKind::CorruptionDetected, "huffman weight table has no symbols");
    }
    Ok(build_from_lengths(&by_symbol, table_log, max_len))
}

impl HuffCTable {
    pub fn table_log(&self) -> u32 {
        self.table_log
    }

    pub fn code_len(&self, byte: u8) -> u8 {
        self.codes[byte as usize].len
    }

    /// Whether every byte in `literals` has a nonzero-length code, i.e.
    /// this table can be safely reused to encode it.
    pub fn covers(&self, literals: &[u8]) -> bool {
        literals.iter().all(|&b| self.codes[b as usize].len > 0)
    }

    /// Per-symbol weights (`table_log - len + 1`, `0` if absent), the wire
    /// form carried in a fresh literals block's header.
    pub fn weights(&self) -> Vec<u8> {
        self.codes
            .iter()
            .map(|c| if c.len == 0 { 0 } else { (self.table_log - c.len as u32 + 1) as u8 })
            .collect()
    }

    /// Highest symbol value with a nonzero-length code.
    pub fn max_symbol(&self) -> u8 {
        self.codes.iter().enumerate().rev().find(|&(_, c)| c.len > 0).map(|(i, _)| i as u8).unwrap_or(0)
    }

    /// Total encoded size in bits for `literals`, used by the block codec
    /// to decide whether Huffman actually beats raw/RLE.
    pub fn encoded_bits(&self, literals: &[u8]) -> u64 {
        literals.iter().map(|&b| self.codes[b as usize].len as u64).sum()
    }
}

/// Encode `literals` (forward order) into a single Huffman bitstream.
pub fn encode_1stream(writer: &mut BitWriter, ct: &HuffCTable, literals: &[u8]) {
    for &b in literals.iter().rev() {
        let e = ct.codes[b as usize];
        writer.add_bits(e.code as u64, e.len as u32);
    }
}

/// Decode `count` literals from a single Huffman bitstream.
pub fn decode_1stream(reader: &mut BitReader, dt: &HuffDTable, count: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let idx = reader.peek(dt.table_log) as usize;
        let e = dt.entries[idx];
        if e.nbits == 0 {
            return err(ZstdErrorKind::CorruptionDetected, "invalid Huffman code in stream");
        }
        reader.consume(e.nbits as u32);
        out.push(e.symbol);
    }
    Ok(out)
}

/// Split `total` into the sizes of the four segments used by the 4-stream
/// variant: the first three equal (floor division), the remainder in the
/// last.
pub fn four_stream_sizes(total: usize) -> [usize; 4] {
    let seg = total / 4;
    [seg, seg, seg, total - 3 * seg]
}

/// Encode `literals` as four independent Huffman streams, returning the
/// concatenated payload: a 6-byte jump table (three u16 LE sizes) followed
/// by the four streams back to back.
pub fn encode_4stream(ct: &HuffCTable, literals: &[u8]) -> Result<Vec<u8>> {
    let sizes = four_stream_sizes(literals.len());
    let mut offset = 0usize;
    let mut streams = Vec::with_capacity(4);
    for &sz in &sizes {
        let mut w = BitWriter::new();
        encode_1stream(&mut w, ct, &literals[offset..offset + sz]);
        streams.push(w.finish());
        offset += sz;
    }
    for s in &streams[..3] {
        if s.len() > u16::MAX as usize {
            return err(ZstdErrorKind::CorruptionDetected, "huffman sub-stream too large for jump table");
        }
    }
    let mut out = Vec::with_capacity(6 + streams.iter().map(Vec::len).sum::<usize>());
    for s in &streams[..3] {
        out.extend_from_slice(&(s.len() as u16).to_le_bytes());
    }
    for s in &streams {
        out.extend_from_slice(s);
    }
    Ok(out)
}

/// Decode a 4-stream Huffman payload given the total regenerated literal
/// count.
pub fn decode_4stream(dt: &HuffDTable, payload: &[u8], total: usize) -> Result<Vec<u8>> {
    if payload.len() < 6 {
        return err(ZstdErrorKind::CorruptionDetected, "huffman 4-stream jump table truncated");
    }
    let s1 = u16::from_le_bytes([payload[0], payload[1]]) as usize;
    let s2 = u16::from_le_bytes([payload[2], payload[3]]) as usize;
    let s3 = u16::from_le_bytes([payload[4], payload[5]]) as usize;
    let body = &payload[6..];
    if s1 + s2 + s3 > body.len() {
        return err(ZstdErrorKind::CorruptionDetected, "huffman 4-stream sizes exceed payload");
    }
    let s4 = body.len() - s1 - s2 - s3;
    let counts = four_stream_sizes(total);
    let spans = [
        &body[0..s1],
        &body[s1..s1 + s2],
        &body[s1 + s2..s1 + s2 + s3],
        &body[s1 + s2 + s3..s1 + s2 + s3 + s4],
    ];

    let mut out = Vec::with_capacity(total);
    for (span, &count) in spans.iter().zip(counts.iter()) {
        if count == 0 {
            continue;
        }
        let mut reader = BitReader::new(span)?;
        out.extend(decode_1stream(&mut reader, dt, count)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram(data: &[u8]) -> [u32; 256] {
        let mut h = [0u32; 256];
        for &b in data {
            h[b as usize] += 1;
        }
        h
    }

    #[test]
    fn round_trips_1stream() {
        let text = b"the quick brown fox jumps over the lazy dog, again and again and again";
        let (ct, dt) = build_huffman_tables(&histogram(text), HUF_TABLELOG_DEFAULT).unwrap();
        let mut w = BitWriter::new();
        encode_1stream(&mut w, &ct, text);
        let bytes = w.finish();
        let mut r = BitReader::new(&bytes).unwrap();
        let decoded = decode_1stream(&mut r, &dt, text.len()).unwrap();
        assert_eq!(decoded, text);
    }

    #[test]
    fn round_trips_4stream() {
        let mut text = Vec::new();
        for i in 0..2000u32 {
            text.push((i % 37) as u8);
        }
        let (ct, dt) = build_huffman_tables(&histogram(&text), HUF_TABLELOG_DEFAULT).unwrap();
        let payload = encode_4stream(&ct, &text).unwrap();
        let decoded = decode_4stream(&dt, &payload, text.len()).unwrap();
        assert_eq!(decoded, text);
    }

    #[test]
    fn respects_the_table_log_cap() {
        let mut freq = [0u32; 256];
        for i in 0..256 {
            freq[i] = (i as u32) + 1;
        }
        let (ct, dt) = build_huffman_tables(&freq, HUF_TABLELOG_MAX).unwrap();
        assert!(ct.table_log() <= HUF_TABLELOG_MAX);
        assert!(dt.table_log <= HUF_TABLELOG_MAX);
    }
}
