//! Sequences sub-section: the literal-length / match-length / offset code
//! streams, each independently FSE-coded (or predefined/RLE/repeat), plus
//! a side stream of fixed-width "extra bits" for values the code alone
//! doesn't pin down exactly.
//!
//! Wire layout (a simplified internal framing; see `DESIGN.md` for how
//! this differs from the single-interleaved-bitstream reference format):
//!   sequence count: zstd's real escape encoding (1-3 bytes)
//!   1 byte symbol-mode: bits 6-7 LL, bits 4-5 OF, bits 2-3 ML, bits 0-1 reserved (0)
//!   for each mode == FSECompressed: an NCount table (max_symbol:u8, then
//!     (max_symbol+1) zigzag-varint counts)
//!   three length-prefixed code streams (LL, OF, ML)
//!   one length-prefixed extra-bits stream (fixed-width fields, reversed
//!     write order so it decodes back in forward order)
//!
//! `Sequence::offset` already holds the resolved absolute distance (see
//! `sequences::store`); the offset code stream carries that value
//! directly rather than the reference's rep1/rep2/rep1-1 low-code
//! aliasing, matching the simplification already made in
//! `sequences::codes::of_code`. `is_rep` is derived the same way the
//! parser derives it: by comparing the decoded offset against the
//! running `RepState` before folding it in.

use crate::entropy::fse::{self, FseCTable, FseDTable};
use crate::entropy::predefined::{
    LITERAL_LENGTH_DEFAULT_DISTRIBUTION, LITERAL_LENGTH_DEFAULT_LOG, MATCH_LENGTH_DEFAULT_DISTRIBUTION,
    MATCH_LENGTH_DEFAULT_LOG, OFFSET_CODE_DEFAULT_DISTRIBUTION, OFFSET_CODE_DEFAULT_LOG,
};
use crate::entropy::TableMode;
use crate::error::{err, Result, ZstdErrorKind};
use crate::sequences::codes::{ll_baseline, ll_code, ml_baseline, ml_code, of_baseline, of_code, MINMATCH};
use crate::sequences::{RepState, Sequence};
use crate::varint::{read_uvarint, write_uvarint};

const FSE_TABLE_LOG: u32 = 9;

/// FSE tables carried over between blocks for `Repeat` mode, one set per
/// symbol stream.
#[derive(Clone, Default)]
pub struct RepeatTables {
    pub ll: Option<(FseCTable, FseDTable)>,
    pub of: Option<(FseCTable, FseDTable)>,
    pub ml: Option<(FseCTable, FseDTable)>,
}

fn mode_bits(mode: TableMode) -> u8 {
    match mode {
        TableMode::Predefined => 0,
        TableMode::RLE => 1,
        TableMode::FSECompressed => 2,
        TableMode::Repeat => 3,
    }
}

fn mode_from_bits(b: u8) -> Result<TableMode> {
    Ok(match b {
        0 => TableMode::Predefined,
        1 => TableMode::RLE,
        2 => TableMode::FSECompressed,
        3 => TableMode::Repeat,
        _ => return err(ZstdErrorKind::CorruptionDetected, "impossible symbol mode"),
    })
}

/// zstd's real Number_of_Sequences escape encoding: 1 byte up to 127, 2
/// bytes up to 0x7EFF above that (biased by 128), 3 bytes beyond.
fn write_seq_count(out: &mut Vec<u8>, n: usize) {
    if n < 128 {
        out.push(n as u8);
    } else if n < 0x7F00 {
        let v = n - 128;
        out.push(((v >> 8) as u8) | 0x80);
        out.push((v & 0xFF) as u8);
    } else {
        out.push(255);
        let v = n - 0x7F00;
        out.push((v & 0xFF) as u8);
        out.push((v >> 8) as u8);
    }
}

fn read_seq_count(data: &[u8], pos: &mut usize) -> Result<usize> {
    let Some(&b0) = data.get(*pos) else {
        return err(ZstdErrorKind::CorruptionDetected, "sequence count truncated");
    };
    if b0 < 128 {
        *pos += 1;
        Ok(b0 as usize)
    } else if b0 < 255 {
        let Some(&b1) = data.get(*pos + 1) else {
            return err(ZstdErrorKind::CorruptionDetected, "sequence count truncated");
        };
        *pos += 2;
        Ok((((b0 - 128) as usize) << 8) + b1 as usize)
    } else {
        let (Some(&b1), Some(&b2)) = (data.get(*pos + 1), data.get(*pos + 2)) else {
            return err(ZstdErrorKind::CorruptionDetected, "sequence count truncated");
        };
        *pos += 3;
        Ok(b1 as usize + ((b2 as usize) << 8) + 0x7F00)
    }
}

pub(crate) fn write_ncount(out: &mut Vec<u8>, norm: &[i32]) {
    let max_symbol = norm.iter().rposition(|&c| c != 0).unwrap_or(0);
    out.push(max_symbol as u8);
    for &c in &norm[..=max_symbol] {
        crate::varint::write_zigzag(out, c);
    }
}

pub(crate) fn read_ncount(data: &[u8], pos: &mut usize, alphabet: usize) -> Result<Vec<i32>> {
    let Some(&max_symbol) = data.get(*pos) else {
        return err(ZstdErrorKind::CorruptionDetected, "NCount header truncated");
    };
    *pos += 1;
    if max_symbol as usize >= alphabet {
        return err(ZstdErrorKind::CorruptionDetected, "NCount max symbol out of range");
    }
    let mut norm = vec![0i32; alphabet];
    for slot in norm.iter_mut().take(max_symbol as usize + 1) {
        let Some(c) = crate::varint::read_zigzag(data, pos) else {
            return err(ZstdErrorKind::CorruptionDetected, "NCount entry truncated");
        };
        *slot = c;
    }
    Ok(norm)
}

struct StreamPlan {
    mode: TableMode,
    codes: Vec<u8>,
    freq: Vec<u32>,
}

fn plan(codes: Vec<u8>, freq: &[u32], repeat_available: bool) -> StreamPlan {
    let distinct = freq.iter().filter(|&&f| f > 0).count();
    let mode = if distinct == 0 {
        TableMode::Predefined
    } else if distinct == 1 {
        TableMode::RLE
    } else if repeat_available {
        TableMode::Repeat
    } else {
        TableMode::FSECompressed
    };
    StreamPlan { mode, codes, freq: freq.to_vec() }
}

/// Encode the sequences sub-section for one block.
pub fn encode(sequences: &[Sequence], repeat: &RepeatTables) -> Result<(Vec<u8>, RepeatTables)> {
    let mut out = Vec::new();
    write_seq_count(&mut out, sequences.len());
    if sequences.is_empty() {
        return Ok((out, RepeatTables::default()));
    }

    let mut ll_freq = vec![0u32; 36];
    let mut ml_freq = vec![0u32; 53];
    let mut of_freq = vec![0u32; OFFSET_CODE_DEFAULT_DISTRIBUTION.len()];
    let mut ll_codes = Vec::with_capacity(sequences.len());
    let mut ml_codes = Vec::with_capacity(sequences.len());
    let mut of_codes = Vec::with_capacity(sequences.len());
    let mut extra = Vec::with_capacity(sequences.len() * 3);

    for s in sequences {
        let (llc, lle) = ll_code(s.lit_len);
        let (mlc, mle) = ml_code(s.match_len - MINMATCH);
        let (ofc, ofe, of_bits) = of_code(s.offset);
        ll_freq[llc as usize] += 1;
        ml_freq[mlc as usize] += 1;
        if of_freq.len() <= ofc as usize {
            of_freq.resize(ofc as usize + 1, 0);
        }
        of_freq[ofc as usize] += 1;
        ll_codes.push(llc as u8);
        ml_codes.push(mlc as u8);
        of_codes.push(ofc as u8);
        extra.push((lle, ll_baseline(llc).1));
        extra.push((mle, ml_baseline(mlc).1));
        extra.push((ofe, of_bits));
    }

    let ll_plan = plan(ll_codes, &ll_freq, repeat.ll.is_some());
    let of_plan = plan(of_codes, &of_freq, repeat.of.is_some());
    let ml_plan = plan(ml_codes, &ml_freq, repeat.ml.is_some());

    out.push((mode_bits(ll_plan.mode) << 6) | (mode_bits(of_plan.mode) << 4) | (mode_bits(ml_plan.mode) << 2));

    let mut next_repeat = RepeatTables::default();
    let ll_payload = encode_stream(
        &ll_plan,
        &repeat.ll,
        &LITERAL_LENGTH_DEFAULT_DISTRIBUTION,
        LITERAL_LENGTH_DEFAULT_LOG,
        &mut next_repeat.ll,
    )?;
    let of_payload = encode_stream(
        &of_plan,
        &repeat.of,
        &OFFSET_CODE_DEFAULT_DISTRIBUTION,
        OFFSET_CODE_DEFAULT_LOG,
        &mut next_repeat.of,
    )?;
    let ml_payload = encode_stream(
        &ml_plan,
        &repeat.ml,
        &MATCH_LENGTH_DEFAULT_DISTRIBUTION,
        MATCH_LENGTH_DEFAULT_LOG,
        &mut next_repeat.ml,
    )?;

    for payload in [&ll_payload, &of_payload, &ml_payload] {
        write_uvarint(&mut out, payload.len() as u64);
        out.extend_from_slice(payload);
    }

    let mut extra_writer = crate::bitio::BitWriter::new();
    for &(value, bits) in &extra {
        extra_writer.add_bits(value as u64, bits as u32);
    }
    let extra_bytes = extra_writer.finish();
    write_uvarint(&mut out, extra_bytes.len() as u64);
    out.extend_from_slice(&extra_bytes);

    Ok((out, next_repeat))
}

#[allow(clippy::too_many_arguments)]
fn encode_stream(
    p: &StreamPlan,
    repeat: &Option<(FseCTable, FseDTable)>,
    predefined_dist: &[i32],
    predefined_log: u32,
    out_repeat: &mut Option<(FseCTable, FseDTable)>,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    match p.mode {
        TableMode::Predefined => {
            let ct = fse::build_encode_table(predefined_dist, predefined_log)?;
            let mut w = crate::bitio::BitWriter::new();
            fse::encode_sequence(&mut w, &ct, &p.codes);
            out.extend_from_slice(&w.finish());
        }
        TableMode::RLE => {
            out.push(p.codes[0]);
        }
        TableMode::FSECompressed => {
            let norm = fse::normalize_counts(&p.freq, FSE_TABLE_LOG);
            write_ncount(&mut out, &norm);
            let ct = fse::build_encode_table(&norm, FSE_TABLE_LOG)?;
            let dt = fse::build_decode_table(&norm, FSE_TABLE_LOG)?;
            let mut w = crate::bitio::BitWriter::new();
            fse::encode_sequence(&mut w, &ct, &p.codes);
            out.extend_from_slice(&w.finish());
            *out_repeat = Some((ct, dt));
        }
        TableMode::Repeat => {
            let (ct, dt) = repeat.as_ref().expect("repeat mode only chosen when a table is carried over").clone();
            let mut w = crate::bitio::BitWriter::new();
            fse::encode_sequence(&mut w, &ct, &p.codes);
            out.extend_from_slice(&w.finish());
            *out_repeat = Some((ct, dt));
        }
    }
    Ok(out)
}

/// Decode the sequences sub-section, returning the sequences, the tables
/// to carry forward as `repeat` state, and the resulting `RepState`.
pub fn decode(data: &[u8], repeat: &RepeatTables) -> Result<(Vec<Sequence>, usize, RepeatTables, RepState)> {
    let mut pos = 0usize;
    let count = read_seq_count(data, &mut pos)?;
    if count == 0 {
        return Ok((Vec::new(), pos, RepeatTables::default(), RepState::new()));
    }

    let Some(&mode_byte) = data.get(pos) else {
        return err(ZstdErrorKind::CorruptionDetected, "symbol-mode byte missing");
    };
    pos += 1;
    let ll_mode = mode_from_bits((mode_byte >> 6) & 0x03)?;
    let of_mode = mode_from_bits((mode_byte >> 4) & 0x03)?;
    let ml_mode = mode_from_bits((mode_byte >> 2) & 0x03)?;

    let mut next_repeat = RepeatTables::default();
    let (ll_payload, _) = read_length_prefixed(data, &mut pos)?;
    let ll_codes = decode_stream(
        ll_payload,
        ll_mode,
        &repeat.ll,
        &LITERAL_LENGTH_DEFAULT_DISTRIBUTION,
        LITERAL_LENGTH_DEFAULT_LOG,
        count,
        &mut next_repeat.ll,
    )?;
    let (of_payload, _) = read_length_prefixed(data, &mut pos)?;
    let of_codes = decode_stream(
        of_payload,
        of_mode,
        &repeat.of,
        &OFFSET_CODE_DEFAULT_DISTRIBUTION,
        OFFSET_CODE_DEFAULT_LOG,
        count,
        &mut next_repeat.of,
    )?;
    let (ml_payload, _) = read_length_prefixed(data, &mut pos)?;
    let ml_codes = decode_stream(
        ml_payload,
        ml_mode,
        &repeat.ml,
        &MATCH_LENGTH_DEFAULT_DISTRIBUTION,
        MATCH_LENGTH_DEFAULT_LOG,
        count,
        &mut next_repeat.ml,
    )?;

    let (extra_payload, _) = read_length_prefixed(data, &mut pos)?;
    let mut needed = Vec::with_capacity(count * 3);
    for i in 0..count {
        needed.push(ll_baseline(ll_codes[i] as u32).1);
        needed.push(ml_baseline(ml_codes[i] as u32).1);
        needed.push(of_baseline(of_codes[i] as u32).1);
    }
    let mut reader = crate::bitio::BitReader::new(extra_payload)?;
    let mut extras = Vec::with_capacity(needed.len());
    for &bits in &needed {
        extras.push(reader.read_bits(bits as u32)? as u32);
    }
    extras.reverse();

    let mut sequences = Vec::with_capacity(count);
    let mut rep = RepState::new();
    for i in 0..count {
        let lit_len = ll_baseline(ll_codes[i] as u32).0 + extras[i * 3];
        let match_len = ml_baseline(ml_codes[i] as u32).0 + extras[i * 3 + 1] + MINMATCH;
        let (of_base, _) = of_baseline(of_codes[i] as u32);
        let offset = of_base + extras[i * 3 + 2];

        let is_rep = offset == rep.rep1 || offset == rep.rep2;
        rep.update(offset, lit_len, is_rep);
        sequences.push(Sequence { lit_len, match_len, offset, is_rep });
    }

    Ok((sequences, pos, next_repeat, rep))
}

fn read_length_prefixed<'a>(data: &'a [u8], pos: &mut usize) -> Result<(&'a [u8], usize)> {
    let Some(len) = read_uvarint(data, pos) else {
        return err(ZstdErrorKind::CorruptionDetected, "stream length truncated");
    };
    let len = len as usize;
    if data.len() < *pos + len {
        return err(ZstdErrorKind::CorruptionDetected, "stream payload truncated");
    }
    let slice = &data[*pos..*pos + len];
    *pos += len;
    Ok((slice, len))
}

#[allow(clippy::too_many_arguments)]
fn decode_stream(
    payload: &[u8],
    mode: TableMode,
    repeat: &Option<(FseCTable, FseDTable)>,
    predefined_dist: &[i32],
    predefined_log: u32,
    count: usize,
    out_repeat: &mut Option<(FseCTable, FseDTable)>,
) -> Result<Vec<u8>> {
    match mode {
        TableMode::Predefined => {
            let dt = fse::build_decode_table(predefined_dist, predefined_log)?;
            let mut r = crate::bitio::BitReader::new(payload)?;
            fse::decode_sequence(&mut r, &dt, count)
        }
        TableMode::RLE => {
            let Some(&b) = payload.first() else {
                return err(ZstdErrorKind::CorruptionDetected, "RLE code byte missing");
            };
            Ok(vec![b; count])
        }
        TableMode::FSECompressed => {
            let mut p = 0usize;
            let norm = read_ncount(payload, &mut p, predefined_dist.len())?;
            let body = &payload[p..];
            let ct = fse::build_encode_table(&norm, FSE_TABLE_LOG)?;
            let dt = fse::build_decode_table(&norm, FSE_TABLE_LOG)?;
            let mut r = crate::bitio::BitReader::new(body)?;
            let out = fse::decode_sequence(&mut r, &dt, count)?;
            *out_repeat = Some((ct, dt));
            Ok(out)
        }
        TableMode::Repeat => {
            let Some((ct, dt)) = repeat.clone() else {
                return err(ZstdErrorKind::CorruptionDetected, "repeat mode requested with no carried-over table");
            };
            let mut r = crate::bitio::BitReader::new(payload)?;
            let out = fse::decode_sequence(&mut r, &dt, count)?;
            *out_repeat = Some((ct, dt));
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(lit_len: u32, offset: u32, match_len: u32, is_rep: bool) -> Sequence {
        Sequence { lit_len, offset, match_len, is_rep }
    }

    #[test]
    fn round_trips_a_handful_of_sequences() {
        let seqs = vec![seq(0, 10, 5, false), seq(3, 20, 4, false), seq(1, 20, 6, true)];
        let repeat = RepeatTables::default();
        let (bytes, _next) = encode(&seqs, &repeat).unwrap();
        let (decoded, used, _next2, _rep) = decode(&bytes, &repeat).unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(decoded.len(), seqs.len());
        for (a, b) in seqs.iter().zip(decoded.iter()) {
            assert_eq!(a.lit_len, b.lit_len);
            assert_eq!(a.match_len, b.match_len);
            assert_eq!(a.offset, b.offset);
        }
    }

    #[test]
    fn round_trips_many_sequences_with_fse_compressed_tables() {
        let mut seqs = Vec::new();
        for i in 0..300u32 {
            let off = 3 + (i % 50);
            seqs.push(seq(i % 7, off, 3 + (i % 20), false));
        }
        let repeat = RepeatTables::default();
        let (bytes, _next) = encode(&seqs, &repeat).unwrap();
        let (decoded, _, _, _) = decode(&bytes, &repeat).unwrap();
        assert_eq!(decoded.len(), seqs.len());
        for (a, b) in seqs.iter().zip(decoded.iter()) {
            assert_eq!(a.lit_len, b.lit_len);
            assert_eq!(a.match_len, b.match_len);
            assert_eq!(a.offset, b.offset);
        }
    }

    #[test]
    fn empty_sequence_list_round_trips() {
        let repeat = RepeatTables::default();
        let (bytes, _) = encode(&[], &repeat).unwrap();
        let (decoded, used, _, _) = decode(&bytes, &repeat).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(used, bytes.len());
    }

    #[test]
    fn reuses_fse_tables_across_blocks() {
        let mut seqs = Vec::new();
        for i in 0..300u32 {
            let off = 3 + (i % 50);
            seqs.push(seq(i % 7, off, 3 + (i % 20), false));
        }
        let repeat1 = RepeatTables::default();
        let (bytes1, next1) = encode(&seqs, &repeat1).unwrap();
        let (_, _, carried, _) = decode(&bytes1, &repeat1).unwrap();

        let (bytes2, _next2) = encode(&seqs, &next1).unwrap();
        assert_eq!((bytes2[2] >> 6) & 0x03, mode_bits(TableMode::Repeat));
        let (decoded2, _, _, _) = decode(&bytes2, &carried).unwrap();
        assert_eq!(decoded2.len(), seqs.len());
    }
}
