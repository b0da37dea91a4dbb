//! Dictionaries: a blob of raw content primed onto the window before the
//! first block, so early sequences can reference it instead of paying
//! for a cold start. A dictionary carrying the magic header
//! (`0xEC30A437`) also embeds a digested entropy description -- a
//! Huffman weight table, three FSE distributions (one per sequence
//! symbol stream), and a pair of rep-offset seeds -- built once by
//! `Dictionary::with_entropy` and reused directly as the first block's
//! `BlockCodecState` instead of starting that block cold. A bare
//! content-only blob (no magic) is accepted as-is, matching the
//! reference's "raw content dictionary" fallback.
//!
//! Wire layout of the magic-header form (a simplified internal framing,
//! see `DESIGN.md`):
//!   magic:u32, dict_id:u32, rep1:u32, rep2:u32 (all little-endian)
//!   huffman_table_log:u8, huffman_max_symbol:u8, weights[max_symbol+1]
//!   for each of LL, OF, ML in that order: table_log:u8, then an NCount
//!     (the same `max_symbol:u8` + zigzag-varint-counts framing the
//!     sequences sub-section uses for its own `FSECompressed` mode)
//!   raw content (the remainder)

use crate::block::literals::HuffTable;
use crate::block::seqsection::{read_ncount, write_ncount, RepeatTables};
use crate::entropy::fse;
use crate::entropy::huffman;
use crate::entropy::predefined::{
    LITERAL_LENGTH_DEFAULT_DISTRIBUTION, LITERAL_LENGTH_DEFAULT_LOG, MATCH_LENGTH_DEFAULT_DISTRIBUTION,
    MATCH_LENGTH_DEFAULT_LOG, OFFSET_CODE_DEFAULT_DISTRIBUTION, OFFSET_CODE_DEFAULT_LOG,
};
use crate::error::{err, Result, ZstdErrorKind};
use crate::levels;
use crate::parser::{self, ParserCtx};
use crate::sequences::{RepState, SequenceStore};
use std::sync::Arc;

pub const MAGIC: u32 = 0xEC30A437;

/// The table log a dictionary's own digested FSE tables are built at;
/// distinct from the sequences sub-section's `FSE_TABLE_LOG`, since a
/// dictionary's tables are constructed once, offline, rather than
/// re-derived per block.
const ENTROPY_TABLE_LOG: u32 = 9;

/// A dictionary's digested entropy tables: a Huffman table ready to seed
/// `BlockCodecState::prev_huff`, the three sequence-symbol distributions
/// ready to build a `RepeatTables` from, and the rep-offset pair to seed
/// the encoder's first sequence store with.
#[derive(Debug, Clone)]
pub struct DigestedEntropy {
    pub huffman: HuffTable,
    ll_table_log: u32,
    ll_norm: Vec<i32>,
    of_table_log: u32,
    of_norm: Vec<i32>,
    ml_table_log: u32,
    ml_norm: Vec<i32>,
    pub rep: RepState,
}

impl DigestedEntropy {
    /// Build a fresh `RepeatTables` (real FSE encode/decode pairs) from
    /// the embedded distributions, to seed a frame's starting
    /// `BlockCodecState` with.
    pub fn repeat_tables(&self) -> Result<RepeatTables> {
        Ok(RepeatTables {
            ll: Some((
                fse::build_encode_table(&self.ll_norm, self.ll_table_log)?,
                fse::build_decode_table(&self.ll_norm, self.ll_table_log)?,
            )),
            of: Some((
                fse::build_encode_table(&self.of_norm, self.of_table_log)?,
                fse::build_decode_table(&self.of_norm, self.of_table_log)?,
            )),
            ml: Some((
                fse::build_encode_table(&self.ml_norm, self.ml_table_log)?,
                fse::build_decode_table(&self.ml_norm, self.ml_table_log)?,
            )),
        })
    }
}

/// A dictionary as handed to the encoder/decoder API: its id (0 for a
/// raw content-only dictionary with no header), the raw content to prime
/// the window with, and, if the source carried the magic header, the
/// digested entropy tables built from it.
#[derive(Debug, Clone)]
pub struct Dictionary {
    pub raw: Vec<u8>,
    pub dict_id: u32,
    pub entropy: Option<DigestedEntropy>,
}

impl Dictionary {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() >= 8 {
            let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            if magic == MAGIC {
                return Self::from_entropy_bytes(bytes);
            }
        }
        Ok(Dictionary { raw: bytes.to_vec(), dict_id: 0, entropy: None })
    }

    fn from_entropy_bytes(bytes: &[u8]) -> Result<Self> {
        let mut pos = 4usize;
        let dict_id = read_u32(bytes, &mut pos)?;
        let rep1 = read_u32(bytes, &mut pos)?;
        let rep2 = read_u32(bytes, &mut pos)?;

        let huff_table_log = read_u8(bytes, &mut pos)? as u32;
        let max_symbol = read_u8(bytes, &mut pos)?;
        let nweights = max_symbol as usize + 1;
        if bytes.len() < pos + nweights {
            return err(ZstdErrorKind::DictionaryCorrupted, "dictionary huffman weight table truncated");
        }
        let mut weights = vec![0u8; 256];
        weights[..nweights].copy_from_slice(&bytes[pos..pos + nweights]);
        pos += nweights;
        let (ctable, dtable) = huffman::tables_from_weights(&weights, huff_table_log)?;

        let (ll_table_log, ll_norm) = read_entropy_table(bytes, &mut pos)?;
        let (of_table_log, of_norm) = read_entropy_table(bytes, &mut pos)?;
        let (ml_table_log, ml_norm) = read_entropy_table(bytes, &mut pos)?;

        Ok(Dictionary {
            raw: bytes[pos..].to_vec(),
            dict_id,
            entropy: Some(DigestedEntropy {
                huffman: HuffTable { ctable, dtable },
                ll_table_log,
                ll_norm,
                of_table_log,
                of_norm,
                ml_table_log,
                ml_norm,
                rep: RepState { rep1, rep2 },
            }),
        })
    }

    pub fn raw_content(content: Vec<u8>) -> Self {
        Dictionary { raw: content, dict_id: 0, entropy: None }
    }

    /// Digest a dictionary's entropy tables from its raw content: build a
    /// Huffman table over its byte histogram, parse it for sequence
    /// statistics to seed the three FSE distributions (falling back to
    /// the predefined distribution for any stream the content produced no
    /// sequences for), and keep the rep-offset pair the parse ended on.
    /// This builds the tables a dictionary ships with; it does not select
    /// dictionary content from a sample corpus.
    pub fn with_entropy(dict_id: u32, content: &[u8]) -> Self {
        let mut freq = [0u32; 256];
        for &b in content {
            freq[b as usize] += 1;
        }

        let entropy = huffman::build_huffman_tables(&freq, huffman::HUF_TABLELOG_MAX).ok().map(|(ctable, dtable)| {
            let stats = sequence_stats(content);
            let (ll_table_log, ll_norm) =
                norm_or_predefined(&stats.ll_freq, &LITERAL_LENGTH_DEFAULT_DISTRIBUTION, LITERAL_LENGTH_DEFAULT_LOG);
            let (of_table_log, of_norm) =
                norm_or_predefined(&stats.of_freq, &OFFSET_CODE_DEFAULT_DISTRIBUTION, OFFSET_CODE_DEFAULT_LOG);
            let (ml_table_log, ml_norm) =
                norm_or_predefined(&stats.ml_freq, &MATCH_LENGTH_DEFAULT_DISTRIBUTION, MATCH_LENGTH_DEFAULT_LOG);

            DigestedEntropy {
                huffman: HuffTable { ctable, dtable },
                ll_table_log,
                ll_norm,
                of_table_log,
                of_norm,
                ml_table_log,
                ml_norm,
                rep: stats.rep,
            }
        });

        log::debug!(
            "digested a {}-byte dictionary (id {}), entropy tables {}",
            content.len(),
            dict_id,
            if entropy.is_some() { "built" } else { "skipped (empty content)" }
        );
        Dictionary { raw: content.to_vec(), dict_id, entropy }
    }

    /// Serialize back to the wire form `from_bytes` reads: the magic
    /// header plus embedded entropy when present, otherwise the raw
    /// content alone.
    pub fn to_bytes(&self) -> Vec<u8> {
        let Some(entropy) = &self.entropy else {
            return self.raw.clone();
        };

        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&self.dict_id.to_le_bytes());
        out.extend_from_slice(&entropy.rep.rep1.to_le_bytes());
        out.extend_from_slice(&entropy.rep.rep2.to_le_bytes());

        let ctable = &entropy.huffman.ctable;
        let max_symbol = ctable.max_symbol();
        out.push(ctable.table_log() as u8);
        out.push(max_symbol);
        out.extend_from_slice(&ctable.weights()[..=max_symbol as usize]);

        write_entropy_table(&mut out, entropy.ll_table_log, &entropy.ll_norm);
        write_entropy_table(&mut out, entropy.of_table_log, &entropy.of_norm);
        write_entropy_table(&mut out, entropy.ml_table_log, &entropy.ml_norm);

        out.extend_from_slice(&self.raw);
        out
    }
}

fn norm_or_predefined(freq: &[u32], predefined: &[i32], predefined_log: u32) -> (u32, Vec<i32>) {
    if freq.iter().any(|&f| f > 0) {
        (ENTROPY_TABLE_LOG, fse::normalize_counts(freq, ENTROPY_TABLE_LOG))
    } else {
        (predefined_log, predefined.to_vec())
    }
}

fn write_entropy_table(out: &mut Vec<u8>, table_log: u32, norm: &[i32]) {
    out.push(table_log as u8);
    write_ncount(out, norm);
}

fn read_entropy_table(bytes: &[u8], pos: &mut usize) -> Result<(u32, Vec<i32>)> {
    let table_log = read_u8(bytes, pos)? as u32;
    let norm = read_ncount(bytes, pos, 256)?;
    Ok((table_log, norm))
}

fn read_u32(bytes: &[u8], pos: &mut usize) -> Result<u32> {
    let end = *pos + 4;
    let Some(slice) = bytes.get(*pos..end) else {
        return err(ZstdErrorKind::DictionaryCorrupted, "dictionary header truncated");
    };
    let v = u32::from_le_bytes(slice.try_into().expect("length checked by get() above"));
    *pos = end;
    Ok(v)
}

fn read_u8(bytes: &[u8], pos: &mut usize) -> Result<u8> {
    let Some(&b) = bytes.get(*pos) else {
        return err(ZstdErrorKind::DictionaryCorrupted, "dictionary header truncated");
    };
    *pos += 1;
    Ok(b)
}

/// Parse `sample` as one block's worth of sequences (capped at the usual
/// block-size limit) to collect LL/OF/ML frequency stats and the
/// rep-offset pair the parse ended on.
fn sequence_stats(sample: &[u8]) -> SequenceStore {
    let mut store = SequenceStore::new();
    if sample.is_empty() {
        return store;
    }

    let params = levels::params_for_level(levels::DEFAULT_LEVEL);
    let engine = parser::build_engine(&params);
    let span_end = sample.len().min(crate::block::MAX_BLOCK_SIZE);
    let max_dist = span_end.min(1usize << params.window_log);
    let mut ctx = ParserCtx {
        data: sample,
        engine,
        store: &mut store,
        params,
        max_dist,
    };
    parser::parse_block(&mut ctx, 0, span_end);
    store
}

/// A dictionary pre-attached to a `CCtx`/`DCtx`: cheaply `Clone`-able
/// (an `Arc` around the digested `Dictionary`) so the same digested
/// tables can be shared across many frames, and across threads, without
/// re-parsing the dictionary's bytes each time.
#[derive(Debug, Clone)]
pub struct DigestedDictionary {
    dict: Arc<Dictionary>,
}

impl DigestedDictionary {
    pub fn digest(dict: Dictionary) -> Self {
        DigestedDictionary { dict: Arc::new(dict) }
    }

    pub fn id(&self) -> u32 {
        self.dict.dict_id
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }
}

pub fn load(bytes: &[u8]) -> Result<DigestedDictionary> {
    if bytes.is_empty() {
        return err(ZstdErrorKind::DictionaryCorrupted, "empty dictionary");
    }
    Ok(DigestedDictionary::digest(Dictionary::from_bytes(bytes)?))
}
