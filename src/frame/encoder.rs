//! Streaming encoder: mirrors `StreamingDecoder`'s state-machine
//! discipline on the compress side. Stages `Init -> Compressing ->
//! Ended`, with `flush()` closing the current block early (without
//! ending the frame) and `finish()` closing the last block and
//! appending the checksum.

use crate::block::{self, BlockCodecState};
use crate::error::{err, Result, ZstdErrorKind};
use crate::frame::header::{self, FrameHeader};
use crate::matchfinder::chain::ChainMatcher;
use crate::matchfinder::MatchEngine;
use crate::parser::{self, CompressionParams, ParserCtx};
use crate::sequences::SequenceStore;
use xxhash_rust::xxh64::Xxh64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Init,
    Compressing,
    Ended,
}

pub struct StreamingEncoder {
    stage: Stage,
    params: CompressionParams,
    checksum: bool,
    data: Vec<u8>,
    consumed: usize,
    engine: MatchEngine,
    block_state: BlockCodecState,
    store: SequenceStore,
    hasher: Option<Xxh64>,
}

impl StreamingEncoder {
    pub fn new(params: CompressionParams, checksum: bool) -> Self {
        StreamingEncoder {
            stage: Stage::Init,
            params,
            checksum,
            data: Vec::new(),
            consumed: 0,
            engine: parser::build_engine(&params),
            block_state: BlockCodecState::default(),
            store: SequenceStore::new(),
            hasher: checksum.then(|| Xxh64::new(0)),
            }
    }

    /// Buffer `chunk` and emit every full `MAX_BLOCK_SIZE` block it
    /// completes. Returns the bytes produced (the frame header, on the
    /// very first call, plus zero or more block payloads).
    pub fn write(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        if self.stage == Stage::Ended {
            return err(ZstdErrorKind::Stage, "write() called after finish()");
        }
        let mut out = Vec::new();
        if self.stage == Stage::Init {
            out.extend_from_slice(&header::encode(&FrameHeader {
                window_log: self.params.window_log,
                content_size: None,
                dictionary_id: None,
                has_checksum: self.checksum,
                single_segment: false,
            }));
            self.stage = Stage::Compressing;
        }

        self.data.extend_from_slice(chunk);
        while self.data.len() - self.consumed >= block::MAX_BLOCK_SIZE {
            let end = self.consumed + block::MAX_BLOCK_SIZE;
            out.extend_from_slice(&self.emit_block(end, false)?);
        }
        Ok(out)
    }

    /// Force whatever is currently buffered out as a non-final block,
    /// without closing the frame. A no-op if nothing is pending.
    pub fn flush(&mut self) -> Result<Vec<u8>> {
        if self.stage != Stage::Compressing || self.data.len() == self.consumed {
            return Ok(Vec::new());
        }
        let end = self.data.len();
        self.emit_block(end, false)
    }

    /// Close the frame: emits the final block (even if empty, to cover
    /// an empty input) and the content checksum, if enabled.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        if self.stage == Stage::Ended {
            return err(ZstdErrorKind::Stage, "finish() called twice");
        }
        let mut out = Vec::new();
        if self.stage == Stage::Init {
            out.extend_from_slice(&header::encode(&FrameHeader {
                window_log: self.params.window_log,
                content_size: None,
                dictionary_id: None,
                has_checksum: self.checksum,
                single_segment: false,
            }));
            self.stage = Stage::Compressing;
        }
        let end = self.data.len();
        out.extend_from_slice(&self.emit_block(end, true)?);
        if let Some(h) = self.hasher.take() {
            out.extend_from_slice(&(h.digest() as u32).to_le_bytes());
        }
        self.stage = Stage::Ended;
        Ok(out)
    }

    /// Reset to `Init`. `new_params` mirrors the reference's
    /// `ZSTD_reset_session_and_parameters` (supply fresh parameters) vs.
    /// `ZSTD_reset_session_only` (pass `None` to keep the existing ones).
    pub fn reset(&mut self, new_params: Option<CompressionParams>) {
        let params = new_params.unwrap_or(self.params);
        *self = StreamingEncoder::new(params, self.checksum);
    }

    fn emit_block(&mut self, end: usize, last: bool) -> Result<Vec<u8>> {
        let start = self.consumed;
        self.store.clear();
        let max_dist = end.min(1usize << self.params.window_log);
        let mut ctx = ParserCtx {
            data: &self.data,
            engine: std::mem::replace(&mut self.engine, MatchEngine::Chain(ChainMatcher::new(1, 1), 1)),
            store: &mut self.store,
            params: self.params,
            max_dist,
        };
        parser::parse_block(&mut ctx, start, end);
        self.engine = ctx.engine;

        let span = &self.data[start..end];
        let bytes = block::encode(span, &self.store, &mut self.block_state, last)?;
        if let Some(h) = &mut self.hasher {
            h.update(span);
        }
        self.consumed = end;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CompressionParams {
        crate::levels::params_for_level(3)
    }

    #[test]
    fn round_trips_a_single_write_then_finish() {
        let mut enc = StreamingEncoder::new(params(), true);
        let mut out = enc.write(b"hello streaming world, hello streaming world").unwrap();
        out.extend_from_slice(&enc.finish().unwrap());

        let decoded = crate::frame::decompress(&out).unwrap();
        assert_eq!(decoded, b"hello streaming world, hello streaming world");
    }

    #[test]
    fn round_trips_many_small_writes_with_a_flush_in_the_middle() {
        let mut enc = StreamingEncoder::new(params(), false);
        let mut out = Vec::new();
        for chunk in [&b"part one "[..], &b"part two "[..]] {
            out.extend_from_slice(&enc.write(chunk).unwrap());
        }
        out.extend_from_slice(&enc.flush().unwrap());
        out.extend_from_slice(&enc.write(b"part three").unwrap());
        out.extend_from_slice(&enc.finish().unwrap());

        let decoded = crate::frame::decompress(&out).unwrap();
        assert_eq!(decoded, b"part one part two part three");
    }

    #[test]
    fn rejects_writes_after_finish() {
        let mut enc = StreamingEncoder::new(params(), false);
        enc.finish().unwrap();
        assert!(enc.write(b"too late").is_err());
    }

    #[test]
    fn round_trips_data_spanning_several_blocks() {
        let mut enc = StreamingEncoder::new(params(), true);
        let data: Vec<u8> = (0..300_000u32).map(|i| (i % 241) as u8).collect();
        let mut out = enc.write(&data).unwrap();
        out.extend_from_slice(&enc.finish().unwrap());

        let decoded = crate::frame::decompress(&out).unwrap();
        assert_eq!(decoded, data);
    }
}
