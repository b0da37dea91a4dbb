//! Default FSE distributions for literal lengths, match lengths, and
//! offset codes, used whenever a sequences sub-section says "predefined"
//! instead of shipping its own normalized counts.

pub const LITERAL_LENGTH_DEFAULT_LOG: u32 = 6;
pub const MATCH_LENGTH_DEFAULT_LOG: u32 = 6;
pub const OFFSET_CODE_DEFAULT_LOG: u32 = 5;

#[rustfmt::skip]
pub const LITERAL_LENGTH_DEFAULT_DISTRIBUTION: [i32; 36] = [
     4, 3, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 1, 1, 1,
     2, 2, 2, 2, 2, 2, 2, 2, 2, 3, 2, 1, 1, 1, 1, 1,
    -1,-1,-1,-1,
];

#[rustfmt::skip]
pub const MATCH_LENGTH_DEFAULT_DISTRIBUTION: [i32; 53] = [
    1, 4, 3, 2, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,-1,-1,-1,-1,
   -1,-1,-1,-1,-1,
];

#[rustfmt::skip]
pub const OFFSET_CODE_DEFAULT_DISTRIBUTION: [i32; 29] = [
    1, 1, 1, 1, 1, 1, 2, 2, 2, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn sums_to_table_size(dist: &[i32], log: u32) {
        let total: i64 = dist.iter().map(|&c| if c < 0 { 1 } else { c as i64 }).sum();
        assert_eq!(total, 1i64 << log);
    }

    #[test]
    fn predefined_distributions_are_normalized() {
        sums_to_table_size(&LITERAL_LENGTH_DEFAULT_DISTRIBUTION, LITERAL_LENGTH_DEFAULT_LOG);
        sums_to_table_size(&MATCH_LENGTH_DEFAULT_DISTRIBUTION, MATCH_LENGTH_DEFAULT_LOG);
        sums_to_table_size(&OFFSET_CODE_DEFAULT_DISTRIBUTION, OFFSET_CODE_DEFAULT_LOG);
    }
}
