#![allow(clippy::too_many_arguments)]
#![warn(clippy::indexing_slicing, clippy::unwrap_used, clippy::panic)]

pub mod bitio;
pub mod block;
pub mod context;
pub mod dictionary;
pub mod entropy;
pub mod error;
pub mod frame;
pub mod levels;
pub mod matchfinder;
pub mod parallel;
pub mod parser;
pub mod sequences;
pub mod varint;

pub use context::{CCtx, DCtx};
pub use dictionary::{Dictionary, DigestedDictionary};
pub use error::{Result, ZstdError, ZstdErrorKind};
pub use frame::{StreamingDecoder, StreamingEncoder};
pub use levels::AdvancedParams;
pub use parallel::ParallelCompressor;
pub use parser::{CompressionParams, Strategy};

/// Compress `data` at the given level, in a single call.
pub fn compress(data: &[u8], level: i32) -> Result<Vec<u8>> {
    frame::compress(data, levels::params_for_level(level), false)
}

/// Compress `data` with explicit parser parameters rather than a level
/// preset.
pub fn compress_with_params(data: &[u8], params: CompressionParams, checksum: bool) -> Result<Vec<u8>> {
    frame::compress(data, params, checksum)
}

/// Compress `data` at the given level against a dictionary.
pub fn compress_with_dict(data: &[u8], level: i32, dict: &Dictionary) -> Result<Vec<u8>> {
    frame::compress_with_dict(data, levels::params_for_level(level), false, dict)
}

/// Decompress exactly one frame.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    frame::decompress(data)
}

/// Decompress exactly one frame against a dictionary.
pub fn decompress_with_dict(data: &[u8], dict: &Dictionary) -> Result<Vec<u8>> {
    frame::decompress_with_prefix(data, dict)
}

/// Read a frame's declared `Frame_Content_Size`, if any, without
/// decompressing it.
pub fn get_frame_content_size(data: &[u8]) -> Result<Option<u64>> {
    frame::get_frame_content_size(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn round_trips_through_the_top_level_api() {
        let data = b"the top-level compress/decompress API round-trips, the top-level compress/decompress API round-trips".to_vec();
        let bytes = compress(&data, 5).unwrap();
        assert_eq!(decompress(&bytes).unwrap(), data);
        assert_eq!(get_frame_content_size(&bytes).unwrap(), Some(data.len() as u64));
    }

    #[test_log::test]
    fn round_trips_through_the_dictionary_api() {
        let dict = Dictionary::raw_content(b"shared prefix material, shared prefix material".to_vec());
        let data = b"shared prefix material helps this compress better".to_vec();
        let bytes = compress_with_dict(&data, 5, &dict).unwrap();
        assert_eq!(decompress_with_dict(&bytes, &dict).unwrap(), data);
    }
}
