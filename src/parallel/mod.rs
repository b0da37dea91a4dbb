//! Parallel compressor: splits the input into independent chunks, each
//! parsed by its own worker-pool thread against a fresh match-finder (no
//! back-references cross a chunk boundary), but the chunks' blocks are
//! concatenated under a single shared frame header so the result decodes
//! as one logical frame with one `Frame_Content_Size` covering the whole
//! input — not as a concatenation of independent frames.

pub mod pool;

use crate::block::BlockCodecState;
use crate::error::{err, Result, ZstdErrorKind};
use crate::frame::header::{self, FrameHeader};
use crate::frame::{self, encode_chunk_blocks};
use crate::parser::{self, CompressionParams};
use xxhash_rust::xxh64::Xxh64;

/// Chunks must be large enough that each worker gets real work (at least
/// four windows' worth) but the whole job still splits into enough
/// pieces to use the requested worker count.
fn chunk_size(total: usize, nb_workers: usize, window_log: u32) -> usize {
    let window = 1usize << window_log;
    let min_chunk = window.saturating_mul(4);
    let max_chunk = window.saturating_mul(4).saturating_mul(nb_workers.max(1));
    let even_split = total / nb_workers.max(1).max(1) + 1;
    even_split.clamp(min_chunk, max_chunk.max(min_chunk))
}

pub struct ParallelCompressor {
    pub nb_workers: usize,
    pub params: CompressionParams,
    pub checksum: bool,
}

impl ParallelCompressor {
    pub fn new(nb_workers: usize, params: CompressionParams, checksum: bool) -> Self {
        ParallelCompressor { nb_workers: nb_workers.max(1), params, checksum }
    }

    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() || self.nb_workers <= 1 {
            return frame::compress(data, self.params, self.checksum);
        }

        let size = chunk_size(data.len(), self.nb_workers, self.params.window_log);
        let chunks: Vec<Vec<u8>> = data.chunks(size).map(|c| c.to_vec()).collect();
        let nb_chunks = chunks.len();
        log::info!("splitting {} bytes into {} chunks of up to {} bytes across {} workers", data.len(), nb_chunks, size, self.nb_workers);

        let params = self.params;
        let last_index = nb_chunks - 1;
        let results = pool::run(chunks, self.nb_workers, move |index, chunk| {
            let engine = parser::build_engine(&params);
            let mut block_state = BlockCodecState::default();
            encode_chunk_blocks(
                chunk,
                0,
                chunk.len(),
                params,
                engine,
                &mut block_state,
                index == last_index,
                crate::sequences::RepState::default(),
            )
            .map(|(bytes, _)| bytes)
            .map_err(|e| e.to_string())
        });

        let block_bodies = match results {
            Ok(bodies) => bodies,
            Err(msg) => return err(ZstdErrorKind::MemoryAllocation, msg),
        };

        let window_log = params.window_log;
        let single_segment = data.len() <= (1usize << window_log);
        let mut out = Vec::new();
        out.extend_from_slice(&header::encode(&FrameHeader {
            window_log,
            content_size: Some(data.len() as u64),
            dictionary_id: None,
            has_checksum: self.checksum,
            single_segment,
        }));
        for body in block_bodies {
            out.extend_from_slice(&body);
        }
        if self.checksum {
            let mut h = Xxh64::new(0);
            h.update(data);
            out.extend_from_slice(&(h.digest() as u32).to_le_bytes());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::decoder::StreamingDecoder;

    fn params() -> CompressionParams {
        crate::levels::params_for_level(3)
    }

    #[test]
    fn round_trips_across_several_workers() {
        let data: Vec<u8> = (0..2_000_000u32).map(|i| (i % 97) as u8).collect();
        let compressor = ParallelCompressor::new(4, params(), true);
        let bytes = compressor.compress(&data).unwrap();

        let mut dec = StreamingDecoder::new();
        let out = dec.update(&bytes).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn declares_one_content_size_covering_every_chunk() {
        let data: Vec<u8> = (0..1_000_000u32).map(|i| (i % 67) as u8).collect();
        let compressor = ParallelCompressor::new(4, params(), false);
        let bytes = compressor.compress(&data).unwrap();
        assert_eq!(frame::get_frame_content_size(&bytes).unwrap(), Some(data.len() as u64));
        assert_eq!(frame::decompress(&bytes).unwrap(), data);
    }

    #[test]
    fn single_worker_matches_ordinary_frame_compression() {
        let data = b"small input, single worker".to_vec();
        let compressor = ParallelCompressor::new(1, params(), false);
        let bytes = compressor.compress(&data).unwrap();
        assert_eq!(frame::decompress(&bytes).unwrap(), data);
    }

    #[test]
    fn scales_from_one_to_many_workers_with_the_same_result() {
        let data: Vec<u8> = (0..500_000u32).map(|i| ((i * 31) % 211) as u8).collect();
        for workers in [1usize, 2, 8, 32] {
            let compressor = ParallelCompressor::new(workers, params(), false);
            let bytes = compressor.compress(&data).unwrap();
            let mut dec = StreamingDecoder::new();
            let out = dec.update(&bytes).unwrap();
            assert_eq!(out, data, "mismatch with {workers} workers");
        }
    }
}
