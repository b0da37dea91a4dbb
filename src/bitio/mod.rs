//! Little-endian bit I/O over a byte buffer: a forward writer for the
//! encoder, a backward reader for the entropy streams it produces.
//!
//! Both sides agree on the same convention: the writer packs successive
//! fields LSB-first into a growing byte buffer and closes the stream with a
//! single sentinel `1` bit; the reader locates that sentinel from the last
//! non-zero byte and then reads fields back in the reverse of the order
//! they were written, which is exactly what FSE/tANS decoding needs (the
//! encoder itself walks its symbol sequence back-to-front).

mod reader;
mod writer;

pub use reader::BitReader;
pub use writer::BitWriter;

#[inline]
fn mask(n: u32) -> u64 {
    if n >= 64 {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}
