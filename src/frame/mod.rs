//! Frame codec: wraps a sequence of blocks with the magic/descriptor
//! header, optional content checksum, and the block-splitting loop that
//! turns a whole buffer into one frame (or decodes one back).

pub mod decoder;
pub mod encoder;
pub mod header;
pub mod skippable;

use crate::block::{self, BlockCodecState};
use crate::dictionary::Dictionary;
use crate::error::{err, Result, ZstdErrorKind};
use crate::parser::{self, CompressionParams, ParserCtx};
use crate::sequences::{RepState, SequenceStore};
use header::FrameHeader;
use xxhash_rust::xxh64::Xxh64;

pub use decoder::StreamingDecoder;
pub use encoder::StreamingEncoder;

/// One-shot compression: splits `data` into `MAX_BLOCK_SIZE` spans, parses
/// each with a single match-finder kept alive for the whole frame (so
/// back-references may cross block boundaries), and writes a single
/// frame with a known `Frame_Content_Size`.
pub fn compress(data: &[u8], params: CompressionParams, checksum: bool) -> Result<Vec<u8>> {
    compress_inner(data, params, checksum, None)
}

/// Compress with a dictionary primed into the match-finder (its raw
/// content only -- never any embedded entropy bytes) so the earliest
/// sequences can reference it, and, if the dictionary carries digested
/// entropy tables, seed the first block's Huffman/FSE state and rep
/// offsets from them instead of starting cold. The frame itself carries
/// no dictionary content; pair this with `frame::decompress_with_prefix`
/// (or the dictionary's id, via `CCtx`) on the decode side.
pub fn compress_with_dict(data: &[u8], params: CompressionParams, checksum: bool, dict: &Dictionary) -> Result<Vec<u8>> {
    compress_inner(data, params, checksum, Some(dict))
}

fn compress_inner(data: &[u8], params: CompressionParams, checksum: bool, dict: Option<&Dictionary>) -> Result<Vec<u8>> {
    let window_log = params.window_log;
    let single_segment = data.len() <= (1usize << window_log);

    let mut out = Vec::new();
    out.extend_from_slice(&header::encode(&FrameHeader {
        window_log,
        content_size: Some(data.len() as u64),
        dictionary_id: None,
        has_checksum: checksum,
        single_segment,
    }));

    let dict_content: &[u8] = dict.map(|d| d.raw.as_slice()).unwrap_or(&[]);

    // Parse against a combined buffer so offsets may resolve back into the
    // dictionary; only `dict_content.len()..` is ever emitted as output.
    let mut combined = Vec::with_capacity(dict_content.len() + data.len());
    combined.extend_from_slice(dict_content);
    combined.extend_from_slice(data);
    let dict_len = dict_content.len();

    let mut engine = parser::build_engine(&params);
    for pos in 0..dict_len {
        engine.insert(&combined, pos);
    }

    let mut block_state = BlockCodecState::default();
    let mut initial_rep = RepState::default();
    if let Some(entropy) = dict.and_then(|d| d.entropy.as_ref()) {
        block_state.prev_huff = Some(entropy.huffman.clone());
        block_state.repeat = entropy.repeat_tables()?;
        initial_rep = entropy.rep;
    }

    let (block_bytes, _engine) = encode_chunk_blocks(
        &combined,
        dict_len,
        dict_len + data.len(),
        params,
        engine,
        &mut block_state,
        true,
        initial_rep,
    )?;
    out.extend_from_slice(&block_bytes);

    if checksum {
        let mut h = Xxh64::new(0);
        h.update(data);
        out.extend_from_slice(&(h.digest() as u32).to_le_bytes());
    }
    log::debug!("compressed {} bytes into a {}-byte frame", data.len(), out.len());
    Ok(out)
}

/// Encode `data[start..end]` as a run of blocks sharing one `block_state`
/// and one match-finder `engine`, the last of them marked frame-final only
/// when `is_last_chunk` is set. Used both by the single-threaded path
/// above (one call covering the whole buffer) and by `ParallelCompressor`
/// (one call per worker chunk, each with its own fresh engine/store/state,
/// so their block bytes can be concatenated after a single shared frame
/// header).
pub(crate) fn encode_chunk_blocks(
    data: &[u8],
    start: usize,
    end: usize,
    params: CompressionParams,
    mut engine: crate::matchfinder::MatchEngine,
    block_state: &mut BlockCodecState,
    is_last_chunk: bool,
    initial_rep: RepState,
) -> Result<(Vec<u8>, crate::matchfinder::MatchEngine)> {
    let mut out = Vec::new();
    if start == end {
        out.extend_from_slice(&block::encode(&[], &SequenceStore::new(), block_state, is_last_chunk)?);
        return Ok((out, engine));
    }

    let mut store = SequenceStore::new();
    store.rep = initial_rep;
    let max_block = block::MAX_BLOCK_SIZE;
    let mut pos = start;
    while pos < end {
        let span_end = (pos + max_block).min(end);
        let last = span_end == end && is_last_chunk;

        store.clear();
        let max_dist = span_end.min(1usize << params.window_log);
        let mut ctx = ParserCtx {
            data,
            engine,
            store: &mut store,
            params,
            max_dist,
        };
        parser::parse_block(&mut ctx, pos, span_end);
        engine = ctx.engine;

        out.extend_from_slice(&block::encode(&data[pos..span_end], &store, block_state, last)?);
        pos = span_end;
    }
    Ok((out, engine))
}

/// One-shot decompression of exactly one frame (trailing bytes, if any,
/// are an error — use `StreamingDecoder` to walk a concatenation of
/// frames instead).
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut dec = StreamingDecoder::new();
    let mut out = dec.update(data)?;
    if !dec.is_idle() || dec.frames_decoded() != 1 {
        return err(ZstdErrorKind::SrcSizeWrong, "trailing bytes after a single frame");
    }
    out.shrink_to_fit();
    Ok(out)
}

/// Decompress with a dictionary's raw content prefixed onto the decode
/// window (so offsets beyond the frame's own data resolve into it), and,
/// if the dictionary carries digested entropy tables, that state seeded
/// as the first block's starting `BlockCodecState`.
pub fn decompress_with_prefix(data: &[u8], dict: &Dictionary) -> Result<Vec<u8>> {
    let mut dec = StreamingDecoder::new().with_dictionary(dict)?;
    let out = dec.update(data)?;
    if !dec.is_idle() || dec.frames_decoded() != 1 {
        return err(ZstdErrorKind::SrcSizeWrong, "trailing bytes after a single frame");
    }
    Ok(out)
}

/// Read just the `Frame_Content_Size` out of a frame header, without
/// touching any block data. `None` means the frame didn't declare one.
pub fn get_frame_content_size(data: &[u8]) -> Result<Option<u64>> {
    let (h, _) = header::decode(data)?;
    Ok(h.content_size)
}

#[cfg(test)]
pub(crate) fn test_params() -> CompressionParams {
    CompressionParams {
        window_log: 20,
        chain_log: 16,
        hash_log: 16,
        search_log: 6,
        min_match: 4,
        target_length: 999,
        strategy: parser::Strategy::Greedy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_small_buffer() {
        let data = b"hello hello hello world world world, hello again".to_vec();
        let bytes = compress(&data, test_params(), false).unwrap();
        let out = decompress(&bytes).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn round_trips_an_empty_buffer() {
        let bytes = compress(&[], test_params(), true).unwrap();
        let out = decompress(&bytes).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn round_trips_data_spanning_multiple_blocks() {
        let data: Vec<u8> = (0..400_000u32).map(|i| (i % 251) as u8).collect();
        let bytes = compress(&data, test_params(), true).unwrap();
        let out = decompress(&bytes).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn reports_the_declared_content_size() {
        let data = vec![7u8; 1000];
        let bytes = compress(&data, test_params(), false).unwrap();
        assert_eq!(get_frame_content_size(&bytes).unwrap(), Some(1000));
    }

    #[test]
    fn rejects_trailing_garbage_after_the_frame() {
        let data = b"abc".to_vec();
        let mut bytes = compress(&data, test_params(), false).unwrap();
        bytes.push(0xFF);
        assert!(decompress(&bytes).is_err());
    }

    #[test]
    fn round_trips_with_a_dictionary_prefix() {
        let dict = Dictionary::raw_content(b"the quick brown fox jumps over the lazy dog ".repeat(4));
        let data = b"the quick brown fox jumps over the lazy dog, and then some more text".to_vec();
        let bytes = compress_with_dict(&data, test_params(), false, &dict).unwrap();
        let out = decompress_with_prefix(&bytes, &dict).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn round_trips_with_a_digested_entropy_dictionary() {
        let content = b"the quick brown fox jumps over the lazy dog ".repeat(8);
        let dict = Dictionary::with_entropy(1, &content);
        assert!(dict.entropy.is_some());
        let data = b"the quick brown fox jumps over something else entirely".to_vec();
        let bytes = compress_with_dict(&data, test_params(), false, &dict).unwrap();
        let out = decompress_with_prefix(&bytes, &dict).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn detects_a_corrupted_checksum() {
        let data = b"checksummed content, checksummed content, checksummed content".to_vec();
        let mut bytes = compress(&data, test_params(), true).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(decompress(&bytes).is_err());
    }
}
