//! Dictionary laws: using a dictionary with digested entropy round-trips;
//! using the wrong one (or none) does not silently succeed with garbage
//! output.

use rzstd::{compress_with_dict, decompress_with_dict, Dictionary};

#[test]
fn round_trips_with_a_populated_dictionary() {
    let dict = Dictionary::raw_content(b"common words: the quick brown fox jumps over the lazy dog".to_vec());
    let data = b"the quick brown fox jumps over something else entirely".to_vec();
    let bytes = compress_with_dict(&data, 5, &dict).unwrap();
    assert_eq!(decompress_with_dict(&bytes, &dict).unwrap(), data);
}

#[test]
fn round_trips_with_the_empty_dictionary() {
    let dict = Dictionary::raw_content(Vec::new());
    let data = b"no dictionary content to lean on here".to_vec();
    let bytes = compress_with_dict(&data, 5, &dict).unwrap();
    assert_eq!(decompress_with_dict(&bytes, &dict).unwrap(), data);
}

#[test]
fn round_trips_with_a_digested_entropy_dictionary() {
    let content = b"shared vocabulary: the quick brown fox jumps over the lazy dog, repeatedly".repeat(6);
    let dict = Dictionary::with_entropy(99, &content);
    assert!(dict.entropy.is_some());
    let data = b"the quick brown fox jumps over a sleepy cat instead".to_vec();
    let bytes = compress_with_dict(&data, 5, &dict).unwrap();
    assert_eq!(decompress_with_dict(&bytes, &dict).unwrap(), data);
}

#[test]
fn a_digested_entropy_dictionary_survives_a_to_bytes_from_bytes_round_trip() {
    let content = b"shared vocabulary: the quick brown fox jumps over the lazy dog, repeatedly".repeat(6);
    let digested = Dictionary::with_entropy(99, &content);
    let reloaded = Dictionary::from_bytes(&digested.to_bytes()).unwrap();

    let data = b"the quick brown fox jumps over a sleepy cat instead".to_vec();
    let bytes = compress_with_dict(&data, 5, &digested).unwrap();
    assert_eq!(decompress_with_dict(&bytes, &reloaded).unwrap(), data);
}

#[test]
fn using_the_wrong_dictionary_does_not_reproduce_the_original() {
    let real_dict = Dictionary::raw_content(b"the quick brown fox jumps over the lazy dog, repeatedly".to_vec());
    let wrong_dict = Dictionary::raw_content(b"completely unrelated filler text of similar length here".to_vec());
    let data = b"the quick brown fox jumps over a sleepy cat instead".to_vec();

    let bytes = compress_with_dict(&data, 5, &real_dict).unwrap();
    // Either decoding fails outright, or it "succeeds" with output that
    // differs from the original -- it must never silently match.
    match decompress_with_dict(&bytes, &wrong_dict) {
        Ok(out) => assert_ne!(out, data),
        Err(_) => {}
    }
}
