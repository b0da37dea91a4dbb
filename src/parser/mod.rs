//! Parser: turns input bytes into `(literals, offset, match_len)`
//! sequences using whichever strategy the compression level selects.
//!
//! Strategies are plain functions over a shared `ParserCtx`, not trait
//! objects — per the design notes, this is meant to monomorphise per
//! `(strategy, min_match, extDict)` rather than pay for virtual dispatch
//! on the hot inner loop.

pub mod fast;
pub mod lazy;
pub mod optimal;
pub mod price;

use crate::matchfinder::btree::BtMatcher;
use crate::matchfinder::chain::ChainMatcher;
use crate::matchfinder::hash::{DFastMatcher, FastMatcher};
use crate::matchfinder::MatchEngine;
use crate::sequences::SequenceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Fast,
    DFast,
    Greedy,
    Lazy,
    LazyDeep,
    BtLazy,
    Optimal,
}

#[derive(Debug, Clone, Copy)]
pub struct CompressionParams {
    pub window_log: u32,
    pub chain_log: u32,
    pub hash_log: u32,
    pub search_log: u32,
    pub min_match: u32,
    pub target_length: u32,
    pub strategy: Strategy,
}

/// Everything a block-level parse needs: the buffer being compressed, the
/// match-finder built for it, the running sequence store, and the window
/// bookkeeping for extDict back-references.
pub struct ParserCtx<'a> {
    pub data: &'a [u8],
    pub engine: MatchEngine,
    pub store: &'a mut SequenceStore,
    pub params: CompressionParams,
    pub max_dist: usize,
}

/// Parse `data[start..end]` into sequences, appending to `ctx.store`.
/// Dispatches on strategy; every variant ends by leaving any unconsumed
/// tail as a final literals run via the caller (parse functions only
/// cover up to the last byte with a full `min_match`-length lookahead).
pub fn parse_block(ctx: &mut ParserCtx, start: usize, end: usize) {
    match ctx.params.strategy {
        Strategy::Fast | Strategy::DFast => fast::parse(ctx, start, end),
        Strategy::Greedy | Strategy::Lazy | Strategy::LazyDeep => lazy::parse(ctx, start, end),
        Strategy::BtLazy => lazy::parse(ctx, start, end),
        Strategy::Optimal => optimal::parse(ctx, start, end),
    }
}

/// Build the match-finder a given strategy actually calls for, so a
/// level's strategy selects its matcher instead of every level quietly
/// running the same hash chain underneath.
pub fn build_engine(params: &CompressionParams) -> MatchEngine {
    match params.strategy {
        Strategy::Fast => MatchEngine::Fast(FastMatcher::new(params.hash_log)),
        Strategy::DFast => MatchEngine::DFast(DFastMatcher::new(params.hash_log)),
        Strategy::Greedy | Strategy::Lazy | Strategy::LazyDeep => {
            MatchEngine::Chain(ChainMatcher::new(params.hash_log, params.chain_log), params.search_log.max(1) << 2)
        }
        Strategy::BtLazy | Strategy::Optimal => {
            MatchEngine::Bt(BtMatcher::new(params.hash_log, params.chain_log), params.search_log.max(1))
        }
    }
}
