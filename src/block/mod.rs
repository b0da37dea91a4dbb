//! Block codec: one block's worth of literals + sequences packed into a
//! 3-byte header and a type-tagged payload (raw / RLE / compressed), plus
//! the sequence-execution step that turns a decoded sequence list back
//! into bytes.

pub mod literals;
pub mod seqsection;

use crate::error::{err, Result, ZstdErrorKind};
use crate::sequences::SequenceStore;
use literals::HuffTable;
use seqsection::RepeatTables;

pub const BLOCK_TYPE_RAW: u8 = 0;
pub const BLOCK_TYPE_RLE: u8 = 1;
pub const BLOCK_TYPE_COMPRESSED: u8 = 2;

/// Largest regenerated size a single block may declare, matching zstd's
/// 128 KiB block-size cap.
pub const MAX_BLOCK_SIZE: usize = 128 * 1024;

/// Per-frame state threaded across consecutive blocks: the previous
/// block's Huffman table (for literals reuse) and the three sequence
/// streams' FSE tables (for `Repeat` mode).
#[derive(Default)]
pub struct BlockCodecState {
    pub prev_huff: Option<HuffTable>,
    pub repeat: RepeatTables,
}

pub struct BlockHeader {
    pub last: bool,
    pub block_type: u8,
    pub size: usize,
}

pub fn write_header(out: &mut Vec<u8>, header: &BlockHeader) {
    let word = (header.last as u32) | ((header.block_type as u32) << 1) | ((header.size as u32) << 3);
    out.extend_from_slice(&word.to_le_bytes()[..3]);
}

pub fn read_header(data: &[u8]) -> Result<BlockHeader> {
    if data.len() < 3 {
        return err(ZstdErrorKind::SrcSizeWrong, "block header truncated");
    }
    let word = u32::from_le_bytes([data[0], data[1], data[2], 0]);
    Ok(BlockHeader {
        last: word & 1 != 0,
        block_type: ((word >> 1) & 0x03) as u8,
        size: (word >> 3) as usize,
    })
}

/// Encode one block: `raw` is the original bytes spanned by this block
/// (used for the raw/RLE fallback paths and the compressed-size
/// comparison), `store` is the parser's output for the same span.
pub fn encode(raw: &[u8], store: &SequenceStore, state: &mut BlockCodecState, last: bool) -> Result<Vec<u8>> {
    if raw.len() > MAX_BLOCK_SIZE {
        return err(ZstdErrorKind::SrcSizeWrong, "block exceeds the maximum regenerated size");
    }

    if !raw.is_empty() && raw.iter().all(|&b| b == raw[0]) {
        let mut out = Vec::with_capacity(4);
        write_header(&mut out, &BlockHeader { last, block_type: BLOCK_TYPE_RLE, size: raw.len() });
        out.push(raw[0]);
        return Ok(out);
    }

    let (lit_bytes, new_huff) = literals::encode(&store.literals, state.prev_huff.as_ref());
    let (seq_bytes, new_repeat) = seqsection::encode(&store.sequences, &state.repeat)?;
    let mut compressed = Vec::with_capacity(lit_bytes.len() + seq_bytes.len());
    compressed.extend_from_slice(&lit_bytes);
    compressed.extend_from_slice(&seq_bytes);

    let mut out = Vec::with_capacity(compressed.len() + 4);
    if compressed.len() < raw.len() {
        write_header(&mut out, &BlockHeader { last, block_type: BLOCK_TYPE_COMPRESSED, size: compressed.len() });
        out.extend_from_slice(&compressed);
        if let Some(h) = new_huff {
            state.prev_huff = Some(h);
        }
        state.repeat = new_repeat;
    } else {
        write_header(&mut out, &BlockHeader { last, block_type: BLOCK_TYPE_RAW, size: raw.len() });
        out.extend_from_slice(raw);
        // A raw fallback doesn't retire the running entropy-table state:
        // the next block may still usefully reuse whatever table/repeat
        // state preceded this one.
    }
    Ok(out)
}

/// Decode one block's payload (the bytes following its header, exactly
/// `header.size` of them for raw/RLE, or the compressed span for
/// compressed blocks), appending regenerated bytes to `out`.
pub fn decode(header: &BlockHeader, payload: &[u8], out: &mut Vec<u8>, state: &mut BlockCodecState) -> Result<()> {
    match header.block_type {
        BLOCK_TYPE_RAW => {
            if payload.len() < header.size {
                return err(ZstdErrorKind::SrcSizeWrong, "raw block truncated");
            }
            out.extend_from_slice(&payload[..header.size]);
            Ok(())
        }
        BLOCK_TYPE_RLE => {
            let Some(&b) = payload.first() else {
                return err(ZstdErrorKind::SrcSizeWrong, "RLE block missing its repeated byte");
            };
            out.resize(out.len() + header.size, b);
            Ok(())
        }
        BLOCK_TYPE_COMPRESSED => {
            if payload.len() < header.size {
                return err(ZstdErrorKind::SrcSizeWrong, "compressed block truncated");
            }
            let body = &payload[..header.size];
            let (lit_bytes, lit_used, new_huff) = literals::decode(body, state.prev_huff.as_ref())?;
            let (sequences, _seq_used, new_repeat, _rep) = seqsection::decode(&body[lit_used..], &state.repeat)?;
            execute_sequences(&lit_bytes, &sequences, out)?;
            if let Some(h) = new_huff {
                state.prev_huff = Some(h);
            }
            state.repeat = new_repeat;
            Ok(())
        }
        _ => err(ZstdErrorKind::CorruptionDetected, "reserved block type"),
    }
}

/// Replay a decoded sequence list against its literals buffer, appending
/// the regenerated bytes to `out`. Offsets resolve against `out` itself,
/// so back-references may freely cross block boundaries within the same
/// frame (and, with a prefix primed by the caller, into a dictionary).
fn execute_sequences(literals: &[u8], sequences: &[crate::sequences::Sequence], out: &mut Vec<u8>) -> Result<()> {
    let mut lit_pos = 0usize;
    for seq in sequences {
        let lit_len = seq.lit_len as usize;
        if lit_pos + lit_len > literals.len() {
            return err(ZstdErrorKind::CorruptionDetected, "sequence literal length exceeds available literals");
        }
        out.extend_from_slice(&literals[lit_pos..lit_pos + lit_len]);
        lit_pos += lit_len;

        let offset = seq.offset as usize;
        if offset == 0 || offset > out.len() {
            return err(ZstdErrorKind::CorruptionDetected, "back-reference precedes the start of the window");
        }
        let match_len = seq.match_len as usize;
        let start = out.len() - offset;
        // Byte-by-byte: the source and destination ranges may overlap
        // (offset < match_len), which is exactly how run-length patterns
        // are expressed.
        for i in 0..match_len {
            let b = out[start + i];
            out.push(b);
        }
    }
    if lit_pos < literals.len() {
        out.extend_from_slice(&literals[lit_pos..]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequences::SequenceStore;

    fn parse_greedy(data: &[u8]) -> SequenceStore {
        use crate::matchfinder::chain::ChainMatcher;
        use crate::matchfinder::MatchEngine;
        use crate::parser::{CompressionParams, ParserCtx, Strategy};

        let mut store = SequenceStore::new();
        let engine = MatchEngine::Chain(ChainMatcher::new(16, 16), 64);
        let params = CompressionParams {
            window_log: 20,
            chain_log: 16,
            hash_log: 16,
            search_log: 6,
            min_match: 4,
            target_length: 999,
            strategy: Strategy::Greedy,
        };
        let max_dist = data.len().max(1);
        let mut ctx = ParserCtx {
            data,
            engine,
            store: &mut store,
            params,
            max_dist,
        };
        crate::parser::parse_block(&mut ctx, 0, data.len());
        store
    }

    #[test]
    fn round_trips_a_compressed_block() {
        let data = b"abcabcabcabcabcabcabcabcabcabcabcabcabcabcabc".repeat(1);
        let store = parse_greedy(&data);
        let mut state = BlockCodecState::default();
        let bytes = encode(&data, &store, &mut state, true).unwrap();

        let header = read_header(&bytes).unwrap();
        assert!(header.last);
        let mut out = Vec::new();
        let mut decode_state = BlockCodecState::default();
        decode(&header, &bytes[3..], &mut out, &mut decode_state).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn round_trips_an_rle_block() {
        let data = vec![b'z'; 500];
        let store = parse_greedy(&data);
        let mut state = BlockCodecState::default();
        let bytes = encode(&data, &store, &mut state, true).unwrap();
        let header = read_header(&bytes).unwrap();
        assert_eq!(header.block_type, BLOCK_TYPE_RLE);
        let mut out = Vec::new();
        decode(&header, &bytes[3..], &mut out, &mut BlockCodecState::default()).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn falls_back_to_raw_for_incompressible_data() {
        let data: Vec<u8> = (0..2000u32).map(|i| ((i * 2654435761u32) >> 24) as u8).collect();
        let store = parse_greedy(&data);
        let mut state = BlockCodecState::default();
        let bytes = encode(&data, &store, &mut state, true).unwrap();
        let header = read_header(&bytes).unwrap();
        let mut out = Vec::new();
        decode(&header, &bytes[3..], &mut out, &mut BlockCodecState::default()).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn carries_huffman_and_fse_tables_across_blocks() {
        let mut data = Vec::new();
        for i in 0..3000u32 {
            data.extend_from_slice(b"the quick brown fox ");
            let _ = i;
        }
        let store = parse_greedy(&data);
        let mut enc_state = BlockCodecState::default();
        let bytes = encode(&data, &store, &mut enc_state, true).unwrap();
        assert!(enc_state.prev_huff.is_some());

        let header = read_header(&bytes).unwrap();
        let mut out = Vec::new();
        decode(&header, &bytes[3..], &mut out, &mut BlockCodecState::default()).unwrap();
        assert_eq!(out, data);
    }
}
