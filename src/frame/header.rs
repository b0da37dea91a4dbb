//! Frame header: magic number, descriptor byte, optional window
//! descriptor, optional dictionary id, optional content size.
//!
//! Layout (see `DESIGN.md` for the handful of simplifications):
//!   4 bytes  magic, little-endian
//!   1 byte   descriptor: bits0-1 dict-id size flag, bit2 checksum flag,
//!            bit3 reserved (must be 0), bit4 unused, bit5 single-segment,
//!            bits6-7 frame-content-size flag
//!   1 byte   window descriptor (only when !single_segment)
//!   0/1/2/4  dictionary id
//!   0/1/2/4/8 frame content size (the 2-byte form is biased by +256)

use crate::error::{err, Result, ZstdErrorKind};

pub const MAGIC: u32 = 0xFD2FB528;
pub const SKIPPABLE_MAGIC_LO: u32 = 0x184D2A50;
pub const SKIPPABLE_MAGIC_HI: u32 = 0x184D2A5F;

#[derive(Debug, Clone, Copy)]
pub struct FrameHeader {
    pub window_log: u32,
    pub content_size: Option<u64>,
    pub dictionary_id: Option<u32>,
    pub has_checksum: bool,
    pub single_segment: bool,
}

/// Smallest window log that covers `min_size`, clamped to the crate's
/// supported range.
fn window_log_for(min_size: u64) -> u32 {
    let size = min_size.max(1);
    let log = 64 - (size - 1).leading_zeros();
    log.clamp(10, 27)
}

fn encode_window_descriptor(window_log: u32) -> u8 {
    let exponent = window_log.saturating_sub(10);
    // mantissa is always 0 here: we only ever request power-of-two windows.
    (exponent << 3) as u8
}

fn decode_window_descriptor(byte: u8) -> u32 {
    let exponent = (byte >> 3) & 0x1F;
    let mantissa_bonus = if byte & 0x07 != 0 { 1 } else { 0 };
    10 + exponent as u32 + mantissa_bonus
}

fn content_size_field_len(flag: u8, single_segment: bool) -> usize {
    match flag {
        0 if single_segment => 1,
        0 => 0,
        1 => 2,
        2 => 4,
        _ => 8,
    }
}

fn choose_fcs_flag(size: u64, single_segment: bool) -> u8 {
    if single_segment && size < 256 {
        0
    } else if size < 65536 + 256 {
        1
    } else if size <= u32::MAX as u64 {
        2
    } else {
        3
    }
}

pub fn encode(header: &FrameHeader) -> Vec<u8> {
    let mut out = Vec::with_capacity(18);
    out.extend_from_slice(&MAGIC.to_le_bytes());

    let fcs_flag = header.content_size.map(|s| choose_fcs_flag(s, header.single_segment)).unwrap_or(0);
    let dict_flag = match header.dictionary_id {
        None | Some(0) => 0u8,
        Some(id) if id <= u8::MAX as u32 => 1,
        Some(id) if id <= u16::MAX as u32 => 2,
        Some(_) => 3,
    };

    let descriptor = dict_flag
        | ((header.has_checksum as u8) << 2)
        | ((header.single_segment as u8) << 5)
        | (fcs_flag << 6);
    out.push(descriptor);

    if !header.single_segment {
        out.push(encode_window_descriptor(header.window_log));
    }

    if let Some(id) = header.dictionary_id {
        match dict_flag {
            1 => out.push(id as u8),
            2 => out.extend_from_slice(&(id as u16).to_le_bytes()),
            3 => out.extend_from_slice(&id.to_le_bytes()),
            _ => {}
        }
    }

    if let Some(size) = header.content_size {
        match content_size_field_len(fcs_flag, header.single_segment) {
            1 => out.push(size as u8),
            2 => out.extend_from_slice(&((size - 256) as u16).to_le_bytes()),
            4 => out.extend_from_slice(&(size as u32).to_le_bytes()),
            8 => out.extend_from_slice(&size.to_le_bytes()),
            _ => {}
        }
    }

    out
}

/// Decode a frame header starting at `data[0]` (the magic has already
/// been peeked by the caller but is re-validated here). Returns the
/// header and the number of bytes it occupied.
pub fn decode(data: &[u8]) -> Result<(FrameHeader, usize)> {
    if data.len() < 5 {
        return err(ZstdErrorKind::SrcSizeWrong, "frame header truncated before descriptor");
    }
    let magic = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    if magic != MAGIC {
        return err(ZstdErrorKind::PrefixUnknown, "bad frame magic number");
    }

    let descriptor = data[4];
    if descriptor & 0x08 != 0 {
        return err(ZstdErrorKind::PrefixUnknown, "reserved frame descriptor bit is set");
    }
    let dict_flag = descriptor & 0x03;
    let has_checksum = descriptor & 0x04 != 0;
    let single_segment = descriptor & 0x20 != 0;
    let fcs_flag = (descriptor >> 6) & 0x03;

    let mut pos = 5usize;

    let window_log = if single_segment {
        0 // filled in from content_size below
    } else {
        let Some(&wd) = data.get(pos) else {
            return err(ZstdErrorKind::SrcSizeWrong, "window descriptor truncated");
        };
        pos += 1;
        decode_window_descriptor(wd)
    };

    let dict_len = match dict_flag {
        0 => 0,
        1 => 1,
        2 => 2,
        _ => 4,
    };
    if data.len() < pos + dict_len {
        return err(ZstdErrorKind::SrcSizeWrong, "dictionary id truncated");
    }
    let dictionary_id = match dict_flag {
        0 => None,
        1 => Some(data[pos] as u32),
        2 => Some(u16::from_le_bytes([data[pos], data[pos + 1]]) as u32),
        _ => Some(u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])),
    };
    pos += dict_len;

    let size_len = content_size_field_len(fcs_flag, single_segment);
    if data.len() < pos + size_len {
        return err(ZstdErrorKind::SrcSizeWrong, "content size truncated");
    }
    let content_size = match size_len {
        0 => None,
        1 => Some(data[pos] as u64),
        2 => Some(u16::from_le_bytes([data[pos], data[pos + 1]]) as u64 + 256),
        4 => Some(u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as u64),
        _ => Some(u64::from_le_bytes(data[pos..pos + 8].try_into().unwrap())),
    };
    pos += size_len;

    let window_log = if single_segment {
        window_log_for(content_size.unwrap_or(0))
    } else {
        window_log
    };

    Ok((
        FrameHeader {
            window_log,
            content_size,
            dictionary_id,
            has_checksum,
            single_segment,
        },
        pos,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_small_single_segment_header() {
        let h = FrameHeader {
            window_log: 20,
            content_size: Some(42),
            dictionary_id: None,
            has_checksum: true,
            single_segment: true,
        };
        let bytes = encode(&h);
        let (decoded, used) = decode(&bytes).unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(decoded.content_size, Some(42));
        assert!(decoded.has_checksum);
        assert!(decoded.single_segment);
    }

    #[test]
    fn round_trips_a_streaming_header_with_dictionary_id() {
        let h = FrameHeader {
            window_log: 23,
            content_size: None,
            dictionary_id: Some(12345),
            has_checksum: false,
            single_segment: false,
        };
        let bytes = encode(&h);
        let (decoded, used) = decode(&bytes).unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(decoded.dictionary_id, Some(12345));
        assert_eq!(decoded.content_size, None);
        assert!(!decoded.single_segment);
        assert_eq!(decoded.window_log, 23);
    }

    #[test]
    fn round_trips_a_large_content_size() {
        let h = FrameHeader {
            window_log: 27,
            content_size: Some(5_000_000_000),
            dictionary_id: None,
            has_checksum: false,
            single_segment: false,
        };
        let bytes = encode(&h);
        let (decoded, used) = decode(&bytes).unwrap();
        assert_eq!(used, bytes.len());
        assert_eq!(decoded.content_size, Some(5_000_000_000));
    }

    #[test]
    fn rejects_a_bad_magic_number() {
        let bytes = [0u8, 1, 2, 3, 0];
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn rejects_the_reserved_descriptor_bit() {
        let mut bytes = encode(&FrameHeader {
            window_log: 20,
            content_size: Some(1),
            dictionary_id: None,
            has_checksum: false,
            single_segment: true,
        });
        bytes[4] |= 0x08;
        assert!(decode(&bytes).is_err());
    }
}
