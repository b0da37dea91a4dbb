//! Round-trip and concatenation properties across the whole level range.

use rzstd::{compress, decompress, get_frame_content_size};

fn levels() -> Vec<i32> {
    vec![1, 3, 9, 19]
}

#[test]
fn round_trips_the_empty_input() {
    for level in levels() {
        let bytes = compress(b"", level).unwrap();
        assert_eq!(decompress(&bytes).unwrap(), b"");
    }
}

#[test]
fn round_trips_a_single_byte() {
    for level in levels() {
        let bytes = compress(b"Q", level).unwrap();
        assert_eq!(decompress(&bytes).unwrap(), b"Q");
    }
}

#[test]
fn round_trips_highly_repetitive_input() {
    let data = vec![b'A'; 4096];
    for level in levels() {
        let bytes = compress(&data, level).unwrap();
        assert_eq!(decompress(&bytes).unwrap(), data);
    }
}

#[test]
fn round_trips_pseudo_random_input() {
    let data: Vec<u8> = (0..256 * 1024u32).map(|i| ((i.wrapping_mul(2654435761)) >> 24) as u8).collect();
    let bytes = compress(&data, 3).unwrap();
    assert_eq!(decompress(&bytes).unwrap(), data);
    // Incompressible input should not expand past raw-block overhead.
    assert!(bytes.len() < data.len() + data.len() / 16 + 64);
}

#[test]
fn round_trips_input_larger_than_a_single_block() {
    let data: Vec<u8> = (0..500_000u32).map(|i| (i % 253) as u8).collect();
    let bytes = compress(&data, 3).unwrap();
    assert_eq!(decompress(&bytes).unwrap(), data);
}

#[test]
fn round_trips_input_larger_than_window_size() {
    // Level 1's window is 2^19 bytes; push well past that.
    let data: Vec<u8> = (0..(3 << 19)).map(|i| ((i * 7 + 3) % 241) as u8).collect();
    let bytes = compress(&data, 1).unwrap();
    assert_eq!(decompress(&bytes).unwrap(), data);
}

#[test]
fn concatenated_frames_decompress_in_order() {
    let a = b"first frame payload, first frame payload".to_vec();
    let b = b"second frame payload, totally different text here".to_vec();
    let mut combined = compress(&a, 3).unwrap();
    combined.extend_from_slice(&compress(&b, 9).unwrap());

    let mut dec = rzstd::StreamingDecoder::new();
    let out = dec.update(&combined).unwrap();
    let mut expected = a.clone();
    expected.extend_from_slice(&b);
    assert_eq!(out, expected);
}

#[test]
fn skippable_frames_interleaved_are_skipped() {
    let a = b"before the skippable frame".to_vec();
    let b = b"after the skippable frame".to_vec();
    let mut combined = compress(&a, 3).unwrap();
    combined.extend_from_slice(&rzstd::frame::skippable::encode(
        rzstd::frame::header::SKIPPABLE_MAGIC_LO + 3,
        b"arbitrary embedded metadata",
    ));
    combined.extend_from_slice(&compress(&b, 3).unwrap());

    let mut dec = rzstd::StreamingDecoder::new();
    let out = dec.update(&combined).unwrap();
    let mut expected = a;
    expected.extend_from_slice(&b);
    assert_eq!(out, expected);
}

#[test]
fn reports_known_content_size() {
    let data = vec![9u8; 777];
    let bytes = compress(&data, 3).unwrap();
    assert_eq!(get_frame_content_size(&bytes).unwrap(), Some(777));
}

#[test]
fn higher_levels_compress_english_text_at_least_as_well() {
    let sentence = b"The quick brown fox jumps over the lazy dog. ";
    let mut data = Vec::new();
    while data.len() < 200_000 {
        data.extend_from_slice(sentence);
    }

    let size1 = compress(&data, 1).unwrap().len();
    let size9 = compress(&data, 9).unwrap().len();
    let size19 = compress(&data, 19).unwrap().len();
    assert_eq!(decompress(&compress(&data, 1).unwrap()).unwrap(), data);
    assert_eq!(decompress(&compress(&data, 19).unwrap()).unwrap(), data);
    assert!(size19 <= size9, "level 19 ({size19}) should be no larger than level 9 ({size9})");
    assert!(size9 <= size1, "level 9 ({size9}) should be no larger than level 1 ({size1})");
}

#[test]
fn rle_like_input_compresses_into_a_tiny_frame() {
    let data = vec![b'A'; 12];
    let bytes = compress(&data, 1).unwrap();
    assert!(bytes.len() < data.len());
    assert_eq!(decompress(&bytes).unwrap(), data);
}

#[test]
fn repeated_trigram_uses_rep_code_offsets() {
    let data = b"abcabcabcabcabcabc".to_vec();
    let bytes = compress(&data, 3).unwrap();
    assert_eq!(decompress(&bytes).unwrap(), data);
}
