//! Streaming frame decoder: a state machine that can be fed input in
//! arbitrary chunk sizes and drains whatever blocks have fully arrived,
//! mirroring the reference's `GET_FRAME_HEADER_SIZE -> DECODE_FRAME_HEADER
//! -> DECODE_BLOCK_HEADER -> DECOMPRESS_BLOCK -> ... -> CHECK_CHECKSUM`
//! cycle (with a parallel `DECODE_SKIPPABLE_HEADER -> SKIP_FRAME` path for
//! skippable frames), rather than requiring the whole frame up front.

use crate::block::{self, BlockCodecState, BlockHeader};
use crate::dictionary::{Dictionary, DigestedEntropy};
use crate::error::{err, Result, ZstdErrorKind};
use crate::frame::header::{self, FrameHeader};
use crate::frame::skippable;
use xxhash_rust::xxh64::Xxh64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FrameStart,
    SkippableFrame,
    FrameHeader,
    BlockHeader,
    BlockBody,
    Checksum,
}

/// Feed bytes in, drain regenerated output out, any number of times. A
/// frame boundary inside a single `update` call is handled transparently:
/// the state machine just keeps cycling back to `FrameStart`.
pub struct StreamingDecoder {
    state: State,
    input: Vec<u8>,
    pos: usize,
    header: Option<FrameHeader>,
    block_header: Option<BlockHeader>,
    block_state: BlockCodecState,
    hasher: Option<Xxh64>,
    window: Vec<u8>,
    prefix: Vec<u8>,
    dict_entropy: Option<DigestedEntropy>,
    frames_decoded: usize,
}

impl StreamingDecoder {
    pub fn new() -> Self {
        StreamingDecoder {
            state: State::FrameStart,
            input: Vec::new(),
            pos: 0,
            header: None,
            block_header: None,
            block_state: BlockCodecState::default(),
            hasher: None,
            window: Vec::new(),
            prefix: Vec::new(),
            dict_entropy: None,
            frames_decoded: 0,
        }
    }

    /// Prime the decode window with dictionary content, so back-references
    /// resolving before the frame's own data land in this prefix.
    pub fn with_dictionary_prefix(mut self, prefix: &[u8]) -> Self {
        self.prefix = prefix.to_vec();
        self.window = self.prefix.clone();
        self
    }

    /// Prime the decode window with `dict`'s raw content and, if it
    /// carries digested entropy tables, validate them up front so a
    /// malformed dictionary is rejected before any frame is fed in
    /// (rather than surfacing as a mid-decode FSE table error).
    pub fn with_dictionary(mut self, dict: &Dictionary) -> Result<Self> {
        self.prefix = dict.raw.clone();
        self.window = self.prefix.clone();
        if let Some(entropy) = &dict.entropy {
            entropy.repeat_tables()?;
            self.dict_entropy = Some(entropy.clone());
        }
        Ok(self)
    }

    fn buffered(&self) -> &[u8] {
        &self.input[self.pos..]
    }

    fn compact(&mut self) {
        if self.pos > 0 {
            self.input.drain(..self.pos);
            self.pos = 0;
        }
    }

    /// Feed more compressed bytes and drain as much regenerated output as
    /// is now available. Returns an empty vec if the state machine is
    /// still waiting on more input for the piece it's parsing.
    pub fn update(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        self.input.extend_from_slice(chunk);
        let mut produced = Vec::new();

        loop {
            match self.state {
                State::FrameStart => {
                    if self.buffered().len() < 4 {
                        break;
                    }
                    let magic = u32::from_le_bytes(self.buffered()[..4].try_into().unwrap());
                    if skippable::is_skippable_magic(magic) {
                        self.state = State::SkippableFrame;
                    } else {
                        self.state = State::FrameHeader;
                    }
                }
                State::SkippableFrame => {
                    let Ok(len) = skippable::frame_len(self.buffered()) else {
                        break;
                    };
                    self.pos += len;
                    self.state = State::FrameStart;
                }
                State::FrameHeader => {
                    let Ok((h, used)) = header::decode(self.buffered()) else {
                        if self.buffered().len() < 18 {
                            break;
                        }
                        return err(ZstdErrorKind::PrefixUnknown, "malformed frame header");
                    };
                    self.pos += used;
                    self.hasher = h.has_checksum.then(|| Xxh64::new(0));
                    self.header = Some(h);
                    self.block_state = BlockCodecState::default();
                    if let Some(entropy) = &self.dict_entropy {
                        self.block_state.prev_huff = Some(entropy.huffman.clone());
                        self.block_state.repeat = entropy.repeat_tables()?;
                    }
                    self.window = self.prefix.clone();
                    self.state = State::BlockHeader;
                }
                State::BlockHeader => {
                    if self.buffered().len() < 3 {
                        break;
                    }
                    let bh = block::read_header(self.buffered())?;
                    self.pos += 3;
                    self.block_header = Some(bh);
                    self.state = State::BlockBody;
                }
                State::BlockBody => {
                    let bh = self.block_header.as_ref().expect("state machine invariant");
                    let needed = if bh.block_type == crate::block::BLOCK_TYPE_RLE { 1 } else { bh.size };
                    if self.buffered().len() < needed {
                        break;
                    }
                    let body = self.input[self.pos..self.pos + needed].to_vec();
                    let before = self.window.len();
                    block::decode(bh, &body, &mut self.window, &mut self.block_state)?;
                    produced.extend_from_slice(&self.window[before..]);
                    if let Some(hasher) = &mut self.hasher {
                        hasher.update(&self.window[before..]);
                    }
                    let last = bh.last;
                    self.pos += needed;
                    self.state = if last { State::Checksum } else { State::BlockHeader };
                }
                State::Checksum => {
                    let has_checksum = self.header.as_ref().map(|h| h.has_checksum).unwrap_or(false);
                    if has_checksum {
                        if self.buffered().len() < 4 {
                            break;
                        }
                        let stored = u32::from_le_bytes(self.buffered()[..4].try_into().unwrap());
                        self.pos += 4;
                        let computed = self.hasher.take().map(|h| h.digest() as u32).unwrap_or(0);
                        if computed != stored {
                            return err(ZstdErrorKind::CorruptionDetected, "content checksum mismatch");
                        }
                    }
                    self.header = None;
                    self.window.clear();
                    self.frames_decoded += 1;
                    self.state = State::FrameStart;
                }
            }
        }

        self.compact();
        Ok(produced)
    }

    /// True once every byte fed in has been fully consumed and the state
    /// machine sits at a frame boundary (no partial frame pending).
    pub fn is_idle(&self) -> bool {
        self.state == State::FrameStart && self.buffered().is_empty()
    }

    /// How many complete content frames (not counting skippable frames)
    /// have been fully decoded so far.
    pub fn frames_decoded(&self) -> usize {
        self.frames_decoded
    }
}

impl Default for StreamingDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame;

    #[test]
    fn decodes_a_whole_frame_fed_in_one_chunk() {
        let data = b"hello hello hello hello hello world world world".to_vec();
        let frame_bytes = frame::compress(&data, frame::test_params(), false).unwrap();
        let mut dec = StreamingDecoder::new();
        let out = dec.update(&frame_bytes).unwrap();
        assert_eq!(out, data);
        assert!(dec.is_idle());
    }

    #[test]
    fn decodes_a_frame_fed_one_byte_at_a_time() {
        let data = b"the quick brown fox jumps over the lazy dog, repeatedly, the quick brown fox".to_vec();
        let frame_bytes = frame::compress(&data, frame::test_params(), true).unwrap();
        let mut dec = StreamingDecoder::new();
        let mut out = Vec::new();
        for byte in &frame_bytes {
            out.extend_from_slice(&dec.update(std::slice::from_ref(byte)).unwrap());
        }
        assert_eq!(out, data);
        assert!(dec.is_idle());
    }

    #[test]
    fn skips_an_embedded_skippable_frame() {
        let data = b"abcdefgh abcdefgh abcdefgh".to_vec();
        let mut bytes = crate::frame::skippable::encode(crate::frame::header::SKIPPABLE_MAGIC_LO, b"metadata");
        bytes.extend_from_slice(&frame::compress(&data, frame::test_params(), false).unwrap());
        let mut dec = StreamingDecoder::new();
        let out = dec.update(&bytes).unwrap();
        assert_eq!(out, data);
    }
}
