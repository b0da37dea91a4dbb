//! Buffer accumulating one block's worth of parser output plus the
//! running frequency statistics the entropy-table builder and the
//! optimal parser's price model both read from.

use super::codes::{ll_code, ml_code, of_code};
use super::rep::RepState;

#[derive(Debug, Clone, Copy)]
pub struct Sequence {
    pub lit_len: u32,
    pub match_len: u32,
    /// Resolved absolute offset (>= 1); rep-code bookkeeping happens via
    /// `is_rep`/`RepState`, not by storing wire offset codes here.
    pub offset: u32,
    pub is_rep: bool,
}

#[derive(Debug, Clone)]
pub struct SequenceStore {
    pub literals: Vec<u8>,
    pub sequences: Vec<Sequence>,
    pub lit_freq: [u32; 256],
    pub ll_freq: [u32; 36],
    pub ml_freq: [u32; 53],
    pub of_freq: Vec<u32>,
    pub rep: RepState,
}

impl SequenceStore {
    pub fn new() -> Self {
        SequenceStore {
            literals: Vec::new(),
            sequences: Vec::new(),
            lit_freq: [0; 256],
            ll_freq: [0; 36],
            ml_freq: [0; 53],
            of_freq: vec![0; 32],
            rep: RepState::new(),
        }
    }

    pub fn clear(&mut self) {
        self.literals.clear();
        self.sequences.clear();
    }

    pub fn push_literals(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.lit_freq[b as usize] += 1;
        }
        self.literals.extend_from_slice(bytes);
    }

    /// Record a sequence and update rolling frequency stats and rep
    /// slots. `literal_bytes` is the span of fresh literals preceding it
    /// (already pushed via `push_literals` by the caller, kept separate so
    /// literal accumulation and sequence emission can be staged
    /// independently by the parser).
    pub fn push_sequence(&mut self, lit_len: u32, offset: u32, match_len: u32, is_rep: bool) {
        let (ll, _) = ll_code(lit_len);
        let (ml, _) = ml_code(match_len - super::codes::MINMATCH);
        let (of, _, _) = of_code(offset);
        self.ll_freq[ll as usize] += 1;
        self.ml_freq[ml as usize] += 1;
        if (of as usize) >= self.of_freq.len() {
            self.of_freq.resize(of as usize + 1, 0);
        }
        self.of_freq[of as usize] += 1;
        self.rep.update(offset, lit_len, is_rep);
        self.sequences.push(Sequence {
            lit_len,
            match_len,
            offset,
            is_rep,
        });
    }

    /// Exponentially decay all frequency tables (right-shift by one,
    /// floor at 1 for previously-nonzero entries), used at block start to
    /// carry forward a damped history instead of starting cold.
    pub fn rescale(&mut self) {
        rescale_table(&mut self.lit_freq);
        rescale_table(&mut self.ll_freq);
        rescale_table(&mut self.ml_freq);
        for f in &mut self.of_freq {
            *f = if *f > 0 { (*f >> 1).max(1) } else { 0 };
        }
    }
}

fn rescale_table(t: &mut [u32]) {
    for f in t.iter_mut() {
        *f = if *f > 0 { (*f >> 1).max(1) } else { 0 };
    }
}

impl Default for SequenceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_frequencies_and_rep_state() {
        let mut store = SequenceStore::new();
        store.push_literals(b"ab");
        store.push_sequence(2, 5, 4, false);
        assert_eq!(store.lit_freq[b'a' as usize], 1);
        assert_eq!(store.rep.rep1, 5);
        assert_eq!(store.sequences.len(), 1);
    }

    #[test]
    fn rescale_halves_and_floors_at_one() {
        let mut store = SequenceStore::new();
        store.lit_freq[0] = 10;
        store.lit_freq[1] = 1;
        store.rescale();
        assert_eq!(store.lit_freq[0], 5);
        assert_eq!(store.lit_freq[1], 1);
    }
}
