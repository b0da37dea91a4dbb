use super::mask;
use crate::error::{err, Result, ZstdErrorKind};

/// Backward bit reader: consumes a [`super::BitWriter`]-produced buffer in
/// the reverse order fields were written.
///
/// Initialization scans from the end for the last non-zero byte (the one
/// holding the close sentinel), locates the sentinel bit with a leading-zero
/// count, and seeds the accumulator with whatever real bits preceded it.
/// `reload` then pulls in earlier bytes on demand, never reading past the
/// start of the buffer.
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Index one past the next byte to pull into `acc` (bytes at indices
    /// `< byte_pos` have not yet been consumed).
    byte_pos: usize,
    acc: u64,
    nbits: u32,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let mut end = data.len();
        while end > 0 && data[end - 1] == 0 {
            end -= 1;
        }
        if end == 0 {
            return err(
                ZstdErrorKind::CorruptionDetected,
                "entropy stream is empty or missing its end sentinel",
            );
        }
        let last = data[end - 1];
        let hb = 7 - last.leading_zeros(); // position of the sentinel bit, 0..=7
        let mut reader = BitReader {
            data: &data[..end - 1],
            byte_pos: end - 1,
            acc: (last as u64) & mask(hb),
            nbits: hb,
        };
        reader.reload();
        Ok(reader)
    }

    /// Pull in more bytes from lower addresses until 57+ bits are buffered
    /// or the buffer is exhausted.
    pub fn reload(&mut self) {
        while self.nbits <= 56 && self.byte_pos > 0 {
            self.byte_pos -= 1;
            self.acc |= (self.data[self.byte_pos] as u64) << self.nbits;
            self.nbits += 8;
        }
    }

    /// Look at the next `n` bits without consuming them.
    pub fn peek(&mut self, n: u32) -> u64 {
        if self.nbits < n {
            self.reload();
        }
        self.acc & mask(n)
    }

    /// Drop `n` already-peeked bits.
    pub fn consume(&mut self, n: u32) {
        self.acc >>= n;
        self.nbits = self.nbits.saturating_sub(n);
    }

    /// Read and consume `n` bits (n <= 32), erroring if the stream is
    /// shorter than required.
    pub fn read_bits(&mut self, n: u32) -> Result<u64> {
        if n == 0 {
            return Ok(0);
        }
        debug_assert!(n <= 32);
        self.reload();
        if self.nbits < n {
            return err(
                ZstdErrorKind::CorruptionDetected,
                format!("entropy stream exhausted: need {n} bits, have {}", self.nbits),
            );
        }
        let v = self.peek(n);
        self.consume(n);
        Ok(v)
    }

    /// Bits still available (upper bound; does not imply they are all
    /// meaningful payload once the stream has been fully drained).
    pub fn bits_remaining(&self) -> usize {
        self.nbits as usize + self.byte_pos * 8
    }
}
