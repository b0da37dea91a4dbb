//! Fast / dFast parsing: take the first match the hash table reports, no
//! look-ahead past it. Cheapest strategy, used at the lowest levels.

use super::ParserCtx;

pub fn parse(ctx: &mut ParserCtx, start: usize, end: usize) {
    let min_match = ctx.params.min_match as usize;
    let max_dist = ctx.max_dist;
    let mut ip = start;
    let mut anchor = start;

    while ip + min_match <= end {
        let found = ctx.engine.insert_and_find_best(ctx.data, ip, min_match, max_dist);
        match found {
            Some(m) if m.len as usize >= min_match => {
                let lit_len = (ip - anchor) as u32;
                ctx.store.push_literals(&ctx.data[anchor..ip]);
                let is_rep = m.offset == ctx.store.rep.rep1 || m.offset == ctx.store.rep.rep2;
                ctx.store.push_sequence(lit_len, m.offset, m.len, is_rep);

                let match_end = ip + m.len as usize;
                let mut p = ip + 1;
                while p < match_end && p + min_match <= end {
                    ctx.engine.insert(ctx.data, p);
                    p += 1;
                }
                ip = match_end;
                anchor = ip;
            }
            _ => {
                ip += 1;
            }
        }
    }

    // Trailing literals after the last sequence need no sequence entry of
    // their own: the block codec copies whatever literals remain once all
    // sequences have been executed.
    if anchor < end {
        ctx.store.push_literals(&ctx.data[anchor..end]);
    }
}
