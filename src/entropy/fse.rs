//! FSE (tANS) entropy coder: table construction, encoder, decoder.
//!
//! This is the classic "spread symbols across the table by a fixed stride,
//! then read off state transitions in table order" construction used by
//! zstd's reference FSE implementation. The encoder processes symbols from
//! last to first (a tANS encoder is a stack: what you push last is what you
//! pop first), which pairs naturally with [`crate::bitio::BitReader`]
//! replaying [`crate::bitio::BitWriter`] calls in reverse.

use crate::bitio::{BitReader, BitWriter};
use crate::error::{err, Result, ZstdErrorKind};

pub const FSE_MIN_TABLE_LOG: u32 = 5;
pub const FSE_MAX_TABLE_LOG: u32 = 20;

fn highbit32(v: u32) -> u32 {
    31 - v.leading_zeros()
}

/// One decode-table slot: which symbol this state represents, how many
/// fresh bits to read, and the base to add them to for the next state.
#[derive(Debug, Clone, Copy)]
pub struct FseDEntry {
    pub symbol: u8,
    pub nbits: u8,
    pub new_state: u32,
}

#[derive(Debug, Clone)]
pub struct FseDTable {
    pub table_log: u32,
    pub entries: Vec<FseDEntry>,
}

#[derive(Debug, Clone, Copy)]
struct SymbolTransform {
    delta_nb_bits: i64,
    delta_find_state: i64,
}

#[derive(Debug, Clone)]
pub struct FseCTable {
    pub table_log: u32,
    next_state_table: Vec<u32>,
    symbol_tt: Vec<SymbolTransform>,
}

/// Spread every symbol's `norm[s]` occurrences across a table of
/// `1 << table_log` slots using zstd's fixed stride, returning the
/// resulting slot→symbol assignment. A count of `-1` marks a "less than
/// one" low-probability symbol: it claims a single slot from the top of
/// the table instead of taking part in the strided spread.
fn spread_symbols(norm: &[i32], table_log: u32) -> Result<Vec<u16>> {
    let table_size = 1usize << table_log;
    let total: i64 = norm.iter().map(|&c| if c < 0 { 1 } else { c as i64 }).sum();
    if total != table_size as i64 {
        return err(
            ZstdErrorKind::CorruptionDetected,
            "normalized counts do not sum to the table size",
        );
    }
    let table_mask = table_size - 1;
    let step = (table_size >> 1) + (table_size >> 3) + 3;
    let mut table_symbol = vec![0u16; table_size];
    let mut high_threshold = table_size - 1;
    for (symbol, &count) in norm.iter().enumerate() {
        if count == -1 {
            table_symbol[high_threshold] = symbol as u16;
            high_threshold -= 1;
        }
    }
    let mut position = 0usize;
    for (symbol, &count) in norm.iter().enumerate() {
        if count <= 0 {
            continue;
        }
        for _ in 0..count {
            table_symbol[position] = symbol as u16;
            position = (position + step) & table_mask;
            while position > high_threshold {
                position = (position + step) & table_mask;
            }
        }
    }
    if position != 0 {
        return err(
            ZstdErrorKind::CorruptionDetected,
            "FSE symbol spread did not return to the origin",
        );
    }
    Ok(table_symbol)
}

pub fn build_decode_table(norm: &[i32], table_log: u32) -> Result<FseDTable> {
    validate_table_log(table_log)?;
    let table_size = 1usize << table_log;
    let table_symbol = spread_symbols(norm, table_log)?;
    let mut next_state_counter: Vec<u32> = norm.iter().map(|&c| if c < 0 { 1 } else { c as u32 }).collect();
    let mut entries = Vec::with_capacity(table_size);
    for &symbol in &table_symbol {
        let counter = &mut next_state_counter[symbol as usize];
        let next_state = *counter;
        *counter += 1;
        let nbits = table_log - highbit32(next_state);
        let new_state = ((next_state << nbits) as i64 - table_size as i64) as u32;
        entries.push(FseDEntry {
            symbol: symbol as u8,
            nbits: nbits as u8,
            new_state,
        });
    }
    Ok(FseDTable { table_log, entries })
}

pub fn build_encode_table(norm: &[i32], table_log: u32) -> Result<FseCTable> {
    validate_table_log(table_log)?;
    let table_size = 1usize << table_log;
    let table_symbol = spread_symbols(norm, table_log)?;

    let mut cumul = vec![0u32; norm.len() + 1];
    let mut high_threshold = table_size - 1;
    for s in 0..norm.len() {
        if norm[s] == -1 {
            cumul[s + 1] = cumul[s] + 1;
            high_threshold -= 1;
        } else {
            cumul[s + 1] = cumul[s] + norm[s].max(0) as u32;
        }
    }
    let _ = high_threshold;
    let mut cursor = cumul.clone();
    let mut next_state_table = vec![0u32; table_size];
    for (u, &symbol) in table_symbol.iter().enumerate() {
        let s = symbol as usize;
        next_state_table[cursor[s] as usize] = (table_size + u) as u32;
        cursor[s] += 1;
    }

    let mut symbol_tt = Vec::with_capacity(norm.len());
    let mut total: i64 = 0;
    for &count in norm {
        let tt = match count {
            0 => SymbolTransform {
                delta_nb_bits: ((table_log as i64 + 1) << 16) - table_size as i64,
                delta_find_state: 0,
            },
            -1 | 1 => {
                let tt = SymbolTransform {
                    delta_nb_bits: ((table_log as i64) << 16) - table_size as i64,
                    delta_find_state: total - 1,
                };
                total += 1;
                tt
            }
            _ => {
                let max_bits_out = table_log - highbit32((count - 1) as u32);
                let min_state_plus = (count as i64) << max_bits_out;
                let tt = SymbolTransform {
                    delta_nb_bits: ((max_bits_out as i64) << 16) - min_state_plus,
                    delta_find_state: total - count as i64,
                };
                total += count as i64;
                tt
            }
        };
        symbol_tt.push(tt);
    }

    Ok(FseCTable {
        table_log,
        next_state_table,
        symbol_tt,
    })
}

fn validate_table_log(table_log: u32) -> Result<()> {
    if !(FSE_MIN_TABLE_LOG..=FSE_MAX_TABLE_LOG).contains(&table_log) {
        return err(
            ZstdErrorKind::CorruptionDetected,
            format!("FSE table log {table_log} out of range"),
        );
    }
    Ok(())
}

/// Incremental FSE encoder state. Symbols must be pushed in reverse of
/// their intended decode order; see [`encode_sequence`] for the usual
/// entry point.
pub struct FseEncoder<'a> {
    ct: &'a FseCTable,
    state: u32,
}

impl<'a> FseEncoder<'a> {
    pub fn new(ct: &'a FseCTable, first_symbol: u8) -> Self {
        let tt = ct.symbol_tt[first_symbol as usize];
        let nb_bits_out = ((tt.delta_nb_bits + (1i64 << 15)) >> 16) as u32;
        let pre_state = ((nb_bits_out as i64) << 16) - tt.delta_nb_bits;
        let idx = ((pre_state as u32) >> nb_bits_out) as i64 + tt.delta_find_state;
        let state = ct.next_state_table[idx as usize];
        FseEncoder { ct, state }
    }

    pub fn encode(&mut self, writer: &mut BitWriter, symbol: u8) {
        let tt = self.ct.symbol_tt[symbol as usize];
        let nb_bits_out = ((self.state as i64 + tt.delta_nb_bits) >> 16) as u32;
        writer.add_bits(self.state as u64, nb_bits_out);
        let idx = (self.state >> nb_bits_out) as i64 + tt.delta_find_state;
        self.state = self.ct.next_state_table[idx as usize];
    }

    pub fn finish(self, writer: &mut BitWriter) {
        writer.add_bits(self.state as u64, self.ct.table_log);
    }
}

/// Encode `symbols` (in their natural, forward order) so that
/// [`decode_sequence`] hands them back in the same order.
pub fn encode_sequence(writer: &mut BitWriter, ct: &FseCTable, symbols: &[u8]) {
    let Some((&last, rest)) = symbols.split_last() else {
        return;
    };
    let mut enc = FseEncoder::new(ct, last);
    for &s in rest.iter().rev() {
        enc.encode(writer, s);
    }
    enc.finish(writer);
}

pub fn decode_sequence(reader: &mut BitReader, dt: &FseDTable, count: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(count);
    if count == 0 {
        return Ok(out);
    }
    let mut state = reader.read_bits(dt.table_log)? as usize;
    out.push(dt.entries[state].symbol);
    for _ in 1..count {
        let entry = dt.entries[state];
        state = entry.new_state as usize + reader.read_bits(entry.nbits as u32)? as usize;
        out.push(dt.entries[state].symbol);
    }
    Ok(out)
}

/// Normalize raw frequency counts into a distribution summing exactly to
/// `1 << table_log`, using the largest-remainder method. Every symbol with
/// nonzero frequency is guaranteed at least one slot.
pub fn normalize_counts(freq: &[u32], table_log: u32) -> Vec<i32> {
    let table_size = 1u64 << table_log;
    let total: u64 = freq.iter().map(|&f| f as u64).sum();
    if total == 0 {
        return vec![0; freq.len()];
    }

    let mut norm = vec![0i32; freq.len()];
    let mut remainders: Vec<(f64, usize)> = Vec::with_capacity(freq.len());
    let mut assigned = 0u64;

    for (i, &f) in freq.iter().enumerate() {
        if f == 0 {
            continue;
        }
        let exact = (f as f64) * (table_size as f64) / (total as f64);
        let floor = exact.floor();
        let mut n = floor as u32;
        if n == 0 {
            n = 1;
        }
        norm[i] = n as i32;
        assigned += n as u64;
        remainders.push((exact - floor, i));
    }

    // Adjust so the total matches table_size exactly.
    if assigned > table_size {
        // Remove from entries with the smallest remainder first, never
        // taking a present symbol down to zero.
        remainders.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        let mut over = assigned - table_size;
        for &(_, i) in &remainders {
            if over == 0 {
                break;
            }
            if norm[i] > 1 {
                norm[i] -= 1;
                over -= 1;
            }
        }
    } else if assigned < table_size {
        remainders.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
        let mut under = table_size - assigned;
        let mut idx = 0;
        while under > 0 && !remainders.is_empty() {
            let (_, i) = remainders[idx % remainders.len()];
            norm[i] += 1;
            under -= 1;
            idx += 1;
        }
    }

    norm
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(symbols: &[u8], alphabet: usize, table_log: u32) {
        let mut freq = vec![0u32; alphabet];
        for &s in symbols {
            freq[s as usize] += 1;
        }
        let norm = normalize_counts(&freq, table_log);
        assert_eq!(norm.iter().sum::<u32>(), 1 << table_log);

        let ct = build_encode_table(&norm, table_log).unwrap();
        let dt = build_decode_table(&norm, table_log).unwrap();

        let mut writer = BitWriter::new();
        encode_sequence(&mut writer, &ct, symbols);
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes).unwrap();
        let decoded = decode_sequence(&mut reader, &dt, symbols.len()).unwrap();
        assert_eq!(decoded, symbols);
    }

    #[test]
    fn round_trips_a_skewed_distribution() {
        let mut symbols = Vec::new();
        for i in 0..2000u32 {
            let s = if i % 5 == 0 {
                2
            } else if i % 3 == 0 {
                1
            } else {
                0
            };
            symbols.push(s as u8);
        }
        round_trip(&symbols, 3, 9);
    }

    #[test]
    fn round_trips_a_near_uniform_distribution() {
        let symbols: Vec<u8> = (0..4096u32).map(|i| (i % 16) as u8).collect();
        round_trip(&symbols, 16, 8);
    }

    #[test]
    fn round_trips_a_single_repeated_symbol_among_rare_ones() {
        let mut symbols = vec![7u8; 500];
        symbols.push(0);
        symbols.push(1);
        round_trip(&symbols, 8, 6);
    }

    #[test]
    fn rejects_an_inconsistent_distribution() {
        let bad_norm = vec![1i32, 1, 1];
        assert!(build_decode_table(&bad_norm, 5).is_err());
    }
}
