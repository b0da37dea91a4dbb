//! Greedy / lazy / lazy-deep parsing: a hash-chain (or binary-tree) match
//! is found at the current position, then optionally deferred by one or
//! two bytes if the next position's match is clearly better.

use super::{ParserCtx, Strategy};

fn lookahead_depth(strategy: Strategy) -> usize {
    match strategy {
        Strategy::Greedy => 0,
        Strategy::Lazy | Strategy::BtLazy => 1,
        Strategy::LazyDeep => 2,
        _ => 0,
    }
}

pub fn parse(ctx: &mut ParserCtx, start: usize, end: usize) {
    let min_match = ctx.params.min_match as usize;
    let max_dist = ctx.max_dist;
    let depth = lookahead_depth(ctx.params.strategy);
    let mut ip = start;
    let mut anchor = start;

    while ip + min_match <= end {
        let Some(mut best) = ctx.engine.insert_and_find_best(ctx.data, ip, min_match, max_dist) else {
            ip += 1;
            continue;
        };
        let mut best_ip = ip;

        // Defer to a strictly better match found a byte or two later,
        // paying for the skipped position(s) as extra literals.
        for step in 1..=depth {
            let probe = ip + step;
            if probe + min_match > end {
                break;
            }
            if let Some(m) = ctx.engine.insert_and_find_best(ctx.data, probe, min_match, max_dist) {
                if m.len > best.len {
                    best = m;
                    best_ip = probe;
                } else if best_ip != ip {
                    break;
                }
            }
        }

        let lit_len = (best_ip - anchor) as u32;
        ctx.store.push_literals(&ctx.data[anchor..best_ip]);
        let is_rep = best.offset == ctx.store.rep.rep1 || best.offset == ctx.store.rep.rep2;
        ctx.store.push_sequence(lit_len, best.offset, best.len, is_rep);

        let match_end = best_ip + best.len as usize;
        let mut p = best_ip + 1;
        while p < match_end && p + min_match <= end {
            ctx.engine.insert(ctx.data, p);
            p += 1;
        }
        ip = match_end;
        anchor = ip;
    }

    if anchor < end {
        ctx.store.push_literals(&ctx.data[anchor..end]);
    }
}
