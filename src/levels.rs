//! Compression-level presets: level 1..=23 each map to a fixed
//! `CompressionParams`, the way the reference's level table picks a
//! strategy/window/search-depth combination instead of exposing every
//! knob to callers directly. `AdvancedParams` sits alongside the table
//! for callers that want to override individual fields instead.

use crate::parser::{CompressionParams, Strategy};

pub const MIN_LEVEL: i32 = 1;
pub const MAX_LEVEL: i32 = 23;
pub const DEFAULT_LEVEL: i32 = 3;

pub const WINDOWLOG_MIN: u32 = 10;
pub const WINDOWLOG_MAX: u32 = 27;
pub const CHAINLOG_MIN: u32 = 6;
pub const CHAINLOG_MAX: u32 = 28;
pub const HASHLOG_MIN: u32 = 6;
pub const HASHLOG_MAX: u32 = 22;
pub const SEARCHLOG_MIN: u32 = 1;
pub const SEARCHLOG_MAX: u32 = 256;
pub const MINMATCH_MIN: u32 = 3;
pub const MINMATCH_MAX: u32 = 7;
pub const TARGETLENGTH_MIN: u32 = 0;
pub const TARGETLENGTH_MAX: u32 = 999;

struct LevelRow {
    window_log: u32,
    chain_log: u32,
    hash_log: u32,
    search_log: u32,
    min_match: u32,
    target_length: u32,
    strategy: Strategy,
}

#[rustfmt::skip]
const TABLE: [LevelRow; 23] = [
    LevelRow { window_log: 19, chain_log: 13, hash_log: 14, search_log: 1, min_match: 6, target_length: 64,   strategy: Strategy::Fast },
    LevelRow { window_log: 19, chain_log: 14, hash_log: 14, search_log: 1, min_match: 5, target_length: 64,   strategy: Strategy::Fast },
    LevelRow { window_log: 20, chain_log: 14, hash_log: 15, search_log: 1, min_match: 5, target_length: 64,   strategy: Strategy::DFast },
    LevelRow { window_log: 20, chain_log: 15, hash_log: 16, search_log: 3, min_match: 5, target_length: 64,   strategy: Strategy::Greedy },
    LevelRow { window_log: 20, chain_log: 16, hash_log: 17, search_log: 4, min_match: 5, target_length: 64,   strategy: Strategy::Greedy },
    LevelRow { window_log: 21, chain_log: 16, hash_log: 17, search_log: 8, min_match: 4, target_length: 128,  strategy: Strategy::Lazy },
    LevelRow { window_log: 21, chain_log: 17, hash_log: 17, search_log: 8, min_match: 4, target_length: 128,  strategy: Strategy::Lazy },
    LevelRow { window_log: 21, chain_log: 18, hash_log: 17, search_log: 10, min_match: 4, target_length: 256, strategy: Strategy::LazyDeep },
    LevelRow { window_log: 22, chain_log: 18, hash_log: 17, search_log: 12, min_match: 4, target_length: 256, strategy: Strategy::LazyDeep },
    LevelRow { window_log: 22, chain_log: 19, hash_log: 17, search_log: 14, min_match: 4, target_length: 256, strategy: Strategy::LazyDeep },
    LevelRow { window_log: 22, chain_log: 21, hash_log: 17, search_log: 16, min_match: 4, target_length: 512, strategy: Strategy::BtLazy },
    LevelRow { window_log: 22, chain_log: 22, hash_log: 17, search_log: 20, min_match: 4, target_length: 512, strategy: Strategy::BtLazy },
    LevelRow { window_log: 22, chain_log: 22, hash_log: 18, search_log: 24, min_match: 4, target_length: 512, strategy: Strategy::BtLazy },
    LevelRow { window_log: 23, chain_log: 23, hash_log: 18, search_log: 32, min_match: 4, target_length: 512, strategy: Strategy::Optimal },
    LevelRow { window_log: 23, chain_log: 23, hash_log: 18, search_log: 40, min_match: 3, target_length: 999, strategy: Strategy::Optimal },
    LevelRow { window_log: 24, chain_log: 24, hash_log: 19, search_log: 48, min_match: 3, target_length: 999, strategy: Strategy::Optimal },
    LevelRow { window_log: 24, chain_log: 24, hash_log: 19, search_log: 64, min_match: 3, target_length: 999, strategy: Strategy::Optimal },
    LevelRow { window_log: 25, chain_log: 25, hash_log: 20, search_log: 96, min_match: 3, target_length: 999, strategy: Strategy::Optimal },
    LevelRow { window_log: 25, chain_log: 25, hash_log: 20, search_log: 128, min_match: 3, target_length: 999, strategy: Strategy::Optimal },
    LevelRow { window_log: 25, chain_log: 25, hash_log: 21, search_log: 160, min_match: 3, target_length: 999, strategy: Strategy::Optimal },
    LevelRow { window_log: 26, chain_log: 26, hash_log: 21, search_log: 192, min_match: 3, target_length: 999, strategy: Strategy::Optimal },
    LevelRow { window_log: 27, chain_log: 27, hash_log: 22, search_log: 224, min_match: 3, target_length: 999, strategy: Strategy::Optimal },
    LevelRow { window_log: 27, chain_log: 28, hash_log: 22, search_log: 256, min_match: 3, target_length: 999, strategy: Strategy::Optimal },
];

/// Look up the `CompressionParams` for `level`, clamped to
/// `[MIN_LEVEL, MAX_LEVEL]`.
pub fn params_for_level(level: i32) -> CompressionParams {
    let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
    let row = &TABLE[(level - 1) as usize];
    CompressionParams {
        window_log: row.window_log,
        chain_log: row.chain_log,
        hash_log: row.hash_log,
        search_log: row.search_log,
        min_match: row.min_match,
        target_length: row.target_length,
        strategy: row.strategy,
    }
}

/// Overrides a base `CompressionParams` (usually a level preset) field by
/// field, clamping each supplied value to its valid range in the spirit
/// of the reference's `ZSTD_adjustCParams` — a caller can push one knob
/// past what any level offers without having to also guess valid values
/// for the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdvancedParams {
    pub window_log: Option<u32>,
    pub chain_log: Option<u32>,
    pub hash_log: Option<u32>,
    pub search_log: Option<u32>,
    pub min_match: Option<u32>,
    pub target_length: Option<u32>,
    pub strategy: Option<Strategy>,
}

impl AdvancedParams {
    pub fn window_log(mut self, v: u32) -> Self {
        self.window_log = Some(v);
        self
    }

    pub fn chain_log(mut self, v: u32) -> Self {
        self.chain_log = Some(v);
        self
    }

    pub fn hash_log(mut self, v: u32) -> Self {
        self.hash_log = Some(v);
        self
    }

    pub fn search_log(mut self, v: u32) -> Self {
        self.search_log = Some(v);
        self
    }

    pub fn min_match(mut self, v: u32) -> Self {
        self.min_match = Some(v);
        self
    }

    pub fn target_length(mut self, v: u32) -> Self {
        self.target_length = Some(v);
        self
    }

    pub fn strategy(mut self, v: Strategy) -> Self {
        self.strategy = Some(v);
        self
    }

    /// Apply every set override onto `base`, clamping each to its valid
    /// range. Fields left `None` pass `base`'s value through untouched.
    pub fn resolve(&self, base: CompressionParams) -> CompressionParams {
        CompressionParams {
            window_log: self.window_log.map_or(base.window_log, |v| v.clamp(WINDOWLOG_MIN, WINDOWLOG_MAX)),
            chain_log: self.chain_log.map_or(base.chain_log, |v| v.clamp(CHAINLOG_MIN, CHAINLOG_MAX)),
            hash_log: self.hash_log.map_or(base.hash_log, |v| v.clamp(HASHLOG_MIN, HASHLOG_MAX)),
            search_log: self.search_log.map_or(base.search_log, |v| v.clamp(SEARCHLOG_MIN, SEARCHLOG_MAX)),
            min_match: self.min_match.map_or(base.min_match, |v| v.clamp(MINMATCH_MIN, MINMATCH_MAX)),
            target_length: self.target_length.map_or(base.target_length, |v| v.clamp(TARGETLENGTH_MIN, TARGETLENGTH_MAX)),
            strategy: self.strategy.unwrap_or(base.strategy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_levels() {
        let low = params_for_level(-5);
        let high = params_for_level(1);
        assert_eq!(low.window_log, high.window_log);

        let too_high = params_for_level(100);
        let max = params_for_level(MAX_LEVEL);
        assert_eq!(too_high.window_log, max.window_log);
    }

    #[test]
    fn higher_levels_use_deeper_strategies() {
        assert_eq!(params_for_level(1).strategy, Strategy::Fast);
        assert_eq!(params_for_level(MAX_LEVEL).strategy, Strategy::Optimal);
    }

    #[test]
    fn advanced_params_overrides_only_the_fields_set() {
        let base = params_for_level(3);
        let resolved = AdvancedParams::default().window_log(24).resolve(base);
        assert_eq!(resolved.window_log, 24);
        assert_eq!(resolved.chain_log, base.chain_log);
        assert_eq!(resolved.strategy, base.strategy);
    }

    #[test]
    fn advanced_params_clamps_out_of_range_overrides() {
        let base = params_for_level(3);
        let resolved = AdvancedParams::default().window_log(99).min_match(0).resolve(base);
        assert_eq!(resolved.window_log, WINDOWLOG_MAX);
        assert_eq!(resolved.min_match, MINMATCH_MIN);
    }

    #[test]
    fn advanced_params_can_override_strategy_independently() {
        let base = params_for_level(1);
        let resolved = AdvancedParams::default().strategy(Strategy::Optimal).resolve(base);
        assert_eq!(resolved.strategy, Strategy::Optimal);
        assert_eq!(resolved.window_log, base.window_log);
    }
}
