//! Wire-format checks: the concrete seeded scenarios from the spec that
//! pin down actual byte shapes rather than just round-tripping.

use rzstd::block::{self, BLOCK_TYPE_RAW, BLOCK_TYPE_RLE};
use rzstd::frame::header::MAGIC;
use rzstd::{compress, compress_with_params, levels, CompressionParams, Strategy};

#[test]
fn frame_starts_with_the_magic_number() {
    let bytes = compress(b"anything at all", 3).unwrap();
    let magic = u32::from_le_bytes(bytes[..4].try_into().unwrap());
    assert_eq!(magic, MAGIC);
}

#[test]
fn empty_input_is_a_single_last_block_of_size_zero() {
    let bytes = compress(b"", 3).unwrap();
    // magic(4) + descriptor(1) + window descriptor(1, non-single-segment
    // only -- empty input is small enough to be single-segment) ... walk
    // past the header generically instead of hard-coding its length.
    let content_size = rzstd::get_frame_content_size(&bytes).unwrap();
    assert_eq!(content_size, Some(0));

    // The block header is the last 3 (+0 payload) bytes before any
    // checksum trailer; locate it by decoding the frame header size.
    let header_len = header_len(&bytes);
    let block_header = block::read_header(&bytes[header_len..]).unwrap();
    assert!(block_header.last);
    assert_eq!(block_header.size, 0);
    assert_eq!(block_header.block_type, BLOCK_TYPE_RAW);
}

#[test]
fn twelve_repeated_bytes_compress_to_rle_or_a_tiny_compressed_block() {
    let bytes = compress_with_params(&vec![b'A'; 12], levels::params_for_level(1), false).unwrap();
    let header_len = header_len(&bytes);
    let block_header = block::read_header(&bytes[header_len..]).unwrap();
    assert!(matches!(block_header.block_type, BLOCK_TYPE_RLE | rzstd::block::BLOCK_TYPE_COMPRESSED));
    assert_eq!(rzstd::decompress(&bytes).unwrap(), vec![b'A'; 12]);
}

#[test]
fn optimal_strategy_is_exercised_at_the_top_level() {
    let params = CompressionParams {
        window_log: 20,
        chain_log: 20,
        hash_log: 18,
        search_log: 16,
        min_match: 3,
        target_length: 999,
        strategy: Strategy::Optimal,
    };
    let data = b"abcabcabcabcabcabcabcabcabcabcabcabc".to_vec();
    let bytes = compress_with_params(&data, params, false).unwrap();
    assert_eq!(rzstd::decompress(&bytes).unwrap(), data);
}

/// Decode the frame header just to find where it ends, so the block
/// header immediately after it can be inspected directly.
fn header_len(bytes: &[u8]) -> usize {
    let (_, used) = rzstd::frame::header::decode(bytes).unwrap();
    used
}
