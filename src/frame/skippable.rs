//! Skippable frames: `Magic_Number [0x184D2A50, 0x184D2A5F]` followed by a
//! 4-byte little-endian length and that many bytes of payload the decoder
//! ignores entirely. Used to embed arbitrary metadata between real frames.

use crate::error::{err, Result, ZstdErrorKind};
use crate::frame::header::{SKIPPABLE_MAGIC_HI, SKIPPABLE_MAGIC_LO};

pub fn is_skippable_magic(magic: u32) -> bool {
    (SKIPPABLE_MAGIC_LO..=SKIPPABLE_MAGIC_HI).contains(&magic)
}

pub fn encode(magic: u32, payload: &[u8]) -> Vec<u8> {
    debug_assert!(is_skippable_magic(magic));
    let mut out = Vec::with_capacity(8 + payload.len());
    out.extend_from_slice(&magic.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Given a buffer starting at a skippable frame, return the number of
/// bytes the whole frame (header + payload) occupies.
pub fn frame_len(data: &[u8]) -> Result<usize> {
    if data.len() < 8 {
        return err(ZstdErrorKind::SrcSizeWrong, "skippable frame header truncated");
    }
    let len = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
    if data.len() < 8 + len {
        return err(ZstdErrorKind::SrcSizeWrong, "skippable frame payload truncated");
    }
    Ok(8 + len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_skippable_frame_length() {
        let bytes = encode(SKIPPABLE_MAGIC_LO, b"hello metadata");
        assert_eq!(frame_len(&bytes).unwrap(), bytes.len());
    }

    #[test]
    fn recognizes_the_whole_magic_range() {
        assert!(is_skippable_magic(SKIPPABLE_MAGIC_LO));
        assert!(is_skippable_magic(SKIPPABLE_MAGIC_HI));
        assert!(!is_skippable_magic(0x184D2A4F));
        assert!(!is_skippable_magic(0x184D2A60));
    }
}
