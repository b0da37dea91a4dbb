//! Optimal parser: a price-based dynamic-programming pass over a sliding
//! window of candidate positions, as described by the cost model in the
//! component design. Grounded in the same shape as zstd's `zstd_opt.h`:
//! seed the rep-offset candidate, sweep `getAllMatches` at every position,
//! propagate a "one more literal" edge, and backtrack from the best
//! terminal price.

use super::price::PriceModel;
use super::ParserCtx;
use crate::sequences::codes::MINMATCH;

/// Matches zstd's `ZSTD_OPT_NUM`: the DP never looks further ahead than
/// this many positions past the current anchor.
const OPT_NUM: usize = 4096;

#[derive(Clone, Copy)]
struct OptEntry {
    price: f64,
    reached: bool,
    mlen: u32,
    off: u32,
    is_rep: bool,
    litlen: u32,
    rep1: u32,
    rep2: u32,
}

impl OptEntry {
    fn unreached() -> Self {
        OptEntry {
            price: f64::INFINITY,
            reached: false,
            mlen: 0,
            off: 0,
            is_rep: false,
            litlen: 0,
            rep1: 1,
            rep2: 4,
        }
    }
}

pub fn parse(ctx: &mut ParserCtx, start: usize, end: usize) {
    let min_match = ctx.params.min_match.max(MINMATCH) as usize;
    let max_dist = ctx.max_dist;
    let sufficient_len = ctx.params.target_length.max(min_match as u32) as usize;

    let mut anchor = start;
    while anchor < end {
        let window = (end - anchor).min(OPT_NUM);
        if window < min_match {
            break;
        }

        let prices = PriceModel::from_store(ctx.store);
        let mut opt = vec![OptEntry::unreached(); window + 1];
        opt[0] = OptEntry {
            price: 0.0,
            reached: true,
            mlen: 0,
            off: 0,
            is_rep: false,
            litlen: 0,
            rep1: ctx.store.rep.rep1,
            rep2: ctx.store.rep.rep2,
        };

        let mut last_pos = 0usize;
        let mut early_exit: Option<(usize, u32, u32, bool)> = None; // (cur, off, len, is_rep)

        let mut cur = 0usize;
        while cur < window {
            if !opt[cur].reached {
                cur += 1;
                continue;
            }
            last_pos = last_pos.max(cur);
            let ip = anchor + cur;

            // Extend by one literal.
            if cur + 1 <= window {
                let byte_cost = prices.literal_bits(ctx.data[ip]);
                let candidate = opt[cur].price + byte_cost;
                let slot = &mut opt[cur + 1];
                if candidate < slot.price {
                    *slot = OptEntry {
                        price: candidate,
                        reached: true,
                        mlen: 1,
                        off: 0,
                        is_rep: false,
                        litlen: opt[cur].litlen + 1,
                        rep1: opt[cur].rep1,
                        rep2: opt[cur].rep2,
                    };
                }
            }

            // Try the current rep1 offset directly.
            let rep1 = opt[cur].rep1;
            if rep1 != 0 && rep1 as usize <= ip {
                let cand_start = ip - rep1 as usize;
                let len = crate::matchfinder::count_forward(ctx.data, cand_start, ctx.data, ip).min(window - cur);
                if len >= min_match {
                    apply_match(&mut opt, cur, len, rep1, true, &prices, ctx.data, anchor);
                }
            }

            // Fresh matches from the match-finder.
            let matches = ctx.engine.get_all_matches(ctx.data, ip, min_match, max_dist);
            for m in &matches {
                let len = (m.len as usize).min(window - cur);
                if len < min_match {
                    continue;
                }
                let is_rep = m.offset == opt[cur].rep1 || m.offset == opt[cur].rep2;
                apply_match(&mut opt, cur, len, m.offset, is_rep, &prices, ctx.data, anchor);
                if len >= sufficient_len {
                    early_exit = Some((cur, m.offset, len as u32, is_rep));
                }
            }

            if early_exit.is_some() {
                break;
            }
            cur += 1;
        }

        let end_pos = if let Some((cur, off, len, is_rep)) = early_exit {
            let target = cur + len as usize;
            if target <= window && opt[target].reached {
                target
            } else {
                apply_match(&mut opt, cur, len as usize, off, is_rep, &prices, ctx.data, anchor);
                cur + len as usize
            }
        } else {
            last_pos
        };

        anchor = emit_path(ctx, &opt, anchor, end_pos.min(window));
    }
}

fn apply_match(opt: &mut [OptEntry], cur: usize, len: usize, offset: u32, is_rep: bool, prices: &PriceModel, data: &[u8], anchor: usize) {
    let ip = anchor + cur;
    let lit_len = opt[cur].litlen;
    let literals = &data[ip - lit_len as usize..ip];
    // `opt[cur].price` already charged each literal byte individually as
    // the DP walked past it; back that out and price the whole pending
    // literal run plus this sequence as one unit instead (the per-byte
    // cost is identical either way, but litLen/offset/matchLen pricing
    // only applies once, at the sequence boundary).
    let base_price = opt[cur].price - prices.literals_bits(literals);
    let seq_price = base_price + prices.sequence_bits(literals, offset, len as u32);
    let target = cur + len;
    if seq_price < opt[target].price {
        let (rep1, rep2) = resolve_rep(opt[cur].rep1, opt[cur].rep2, offset, lit_len, is_rep);
        opt[target] = OptEntry {
            price: seq_price,
            reached: true,
            mlen: len as u32,
            off: offset,
            is_rep,
            litlen: 0,
            rep1,
            rep2,
        };
    }
}

fn resolve_rep(rep1: u32, rep2: u32, offset: u32, lit_len: u32, is_rep: bool) -> (u32, u32) {
    if !is_rep {
        (offset, rep1)
    } else if lit_len == 0 {
        (rep2, rep1)
    } else {
        (rep1, rep2)
    }
}

/// Walk back-pointers from `end_pos` to the anchor, then emit sequences
/// (and the rep-state they imply) in forward order.
fn emit_path(ctx: &mut ParserCtx, opt: &[OptEntry], anchor: usize, end_pos: usize) -> usize {
    let mut path = Vec::new();
    let mut pos = end_pos;
    while pos > 0 {
        let e = opt[pos];
        path.push((pos, e));
        pos -= e.mlen.max(1) as usize;
    }
    path.reverse();

    let mut cursor = anchor;
    for (pos, e) in path {
        if e.mlen <= 1 && e.off == 0 {
            // pure literal-extension edge; literals accumulate naturally
            // via the next real sequence's litlen, nothing to emit yet.
            continue;
        }
        let seq_start = anchor + pos - e.mlen as usize;
        let lit_len = (seq_start - cursor) as u32;
        ctx.store.push_literals(&ctx.data[cursor..seq_start]);
        ctx.store.push_sequence(lit_len, e.off, e.mlen, e.is_rep);
        cursor = seq_start + e.mlen as usize;
    }

    if cursor < anchor + end_pos {
        ctx.store.push_literals(&ctx.data[cursor..anchor + end_pos]);
    }
    anchor + end_pos
}
