//! Bit-cost model for the optimal parser: approximates what the entropy
//! coders will actually charge for a literal byte or a sequence symbol,
//! from the running frequency statistics in the sequence store.
//!
//! Uses plain `f64` log2 rather than the reference's fixed-point integer
//! weight table — the non-goals exclude bit-exact reference numerics, so
//! this is a portable stand-in for the same `log2(sum) - log2(freq)`
//! shape described in the cost model.

use crate::sequences::codes::{ll_code, ml_code, of_code, MINMATCH};
use crate::sequences::SequenceStore;

pub struct PriceModel {
    lit_freq: [u32; 256],
    lit_sum: u32,
    ll_freq: [u32; 36],
    ll_sum: u32,
    ml_freq: [u32; 53],
    ml_sum: u32,
    of_freq: Vec<u32>,
    of_sum: u32,
}

const SEED: u32 = 1;

impl PriceModel {
    /// Build from the store's current stats, falling back to a flat
    /// seed prior for any table that is still empty (first block).
    pub fn from_store(store: &SequenceStore) -> Self {
        let lit_freq = seeded(&store.lit_freq);
        let ll_freq = seeded(&store.ll_freq);
        let ml_freq = seeded(&store.ml_freq);
        let mut of_freq = store.of_freq.clone();
        if of_freq.iter().all(|&f| f == 0) {
            of_freq.iter_mut().for_each(|f| *f = SEED);
        }
        PriceModel {
            lit_sum: lit_freq.iter().sum(),
            lit_freq,
            ll_sum: ll_freq.iter().sum(),
            ll_freq,
            ml_sum: ml_freq.iter().sum(),
            ml_freq,
            of_sum: of_freq.iter().sum(),
            of_freq,
        }
    }

    fn log2_cost(freq: u32, sum: u32) -> f64 {
        let f = (freq.max(1)) as f64;
        let s = (sum.max(1)) as f64;
        (s / f).log2().max(0.0)
    }

    pub fn literal_bits(&self, byte: u8) -> f64 {
        Self::log2_cost(self.lit_freq[byte as usize], self.lit_sum)
    }

    pub fn literals_bits(&self, bytes: &[u8]) -> f64 {
        bytes.iter().map(|&b| self.literal_bits(b)).sum()
    }

    pub fn ll_bits(&self, lit_len: u32) -> f64 {
        let (code, _) = ll_code(lit_len);
        let extra = crate::sequences::codes::ll_baseline(code).1 as f64;
        Self::log2_cost(self.ll_freq[code as usize], self.ll_sum) + extra
    }

    pub fn ml_bits(&self, match_len: u32) -> f64 {
        let (code, _) = ml_code(match_len - MINMATCH);
        let extra = crate::sequences::codes::ml_baseline(code).1 as f64;
        Self::log2_cost(self.ml_freq[code as usize], self.ml_sum) + extra
    }

    pub fn of_bits(&self, offset: u32) -> f64 {
        let (code, _, extra_bits) = of_code(offset);
        let idx = code as usize;
        let freq = self.of_freq.get(idx).copied().unwrap_or(SEED);
        Self::log2_cost(freq, self.of_sum) + extra_bits as f64
    }

    /// Total bit cost of emitting one sequence with `lit_len` fresh
    /// literal bytes, the given offset, and match length.
    pub fn sequence_bits(&self, literals: &[u8], offset: u32, match_len: u32) -> f64 {
        self.literals_bits(literals) + self.ll_bits(literals.len() as u32) + self.of_bits(offset) + self.ml_bits(match_len)
    }
}

fn seeded<const N: usize>(freq: &[u32; N]) -> [u32; N] {
    if freq.iter().all(|&f| f == 0) {
        [SEED; N]
    } else {
        *freq
    }
}
