//! Checksumming stream adapters.
//!
//! Both adapters fold every byte that passes through them into an
//! FNV-1a hash. The hash detects truncation and corruption of a stored
//! session; it is not cryptographically secure.

use std::io::{self, Read, Write};

/// FNV-1a offset basis for 64-bit.
pub const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash = (hash ^ b as u64).wrapping_mul(FNV_PRIME);
    }
    hash
}

/// FNV-1a hash of a byte slice.
pub fn checksum_of(bytes: &[u8]) -> u64 {
    fnv1a(FNV_OFFSET, bytes)
}

/// A writer that hashes everything written through it.
#[derive(Debug)]
pub struct ChecksumWriter<W: Write> {
    inner: W,
    hash: u64,
}

impl<W: Write> ChecksumWriter<W> {
    /// Wrap `inner` with a fresh hash state.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hash: FNV_OFFSET,
        }
    }

    /// Hash of all bytes written so far.
    pub fn checksum(&self) -> u64 {
        self.hash
    }

    /// Access the wrapped writer. Bytes written here bypass the hash.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Unwrap, returning the inner writer and the final hash.
    pub fn finish(self) -> (W, u64) {
        (self.inner, self.hash)
    }
}

impl<W: Write> Write for ChecksumWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hash = fnv1a(self.hash, &buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// A reader that hashes everything read through it.
#[derive(Debug)]
pub struct ChecksumReader<R: Read> {
    inner: R,
    hash: u64,
}

impl<R: Read> ChecksumReader<R> {
    /// Wrap `inner` with a fresh hash state.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            hash: FNV_OFFSET,
        }
    }

    /// Hash of all bytes read so far.
    pub fn checksum(&self) -> u64 {
        self.hash
    }

    /// Access the wrapped reader. Bytes read here bypass the hash.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Unwrap, returning the inner reader and the final hash.
    pub fn finish(self) -> (R, u64) {
        (self.inner, self.hash)
    }
}

impl<R: Read> Read for ChecksumReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.hash = fnv1a(self.hash, &buf[..n]);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stream_hashes_to_offset_basis() {
        let w = ChecksumWriter::new(Vec::new());
        assert_eq!(w.checksum(), FNV_OFFSET);
        assert_eq!(checksum_of(&[]), FNV_OFFSET);
    }

    #[test]
    fn known_fnv1a_vector() {
        // FNV-1a 64 of "a".
        assert_eq!(checksum_of(b"a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn writer_and_reader_agree() {
        let mut w = ChecksumWriter::new(Vec::new());
        w.write_all(b"scoring state").unwrap();
        w.write_all(&[1, 2, 3]).unwrap();
        let (bytes, written) = w.finish();

        let mut r = ChecksumReader::new(bytes.as_slice());
        let mut out = Vec::new();
        r.read_to_end(&mut out).unwrap();
        assert_eq!(r.checksum(), written);
        assert_eq!(checksum_of(&bytes), written);
    }

    #[test]
    fn bypass_does_not_hash() {
        let mut w = ChecksumWriter::new(Vec::new());
        w.write_all(b"abc").unwrap();
        let before = w.checksum();
        w.get_mut().extend_from_slice(b"trailer");
        assert_eq!(w.checksum(), before);
    }

    #[test]
    fn single_flipped_byte_changes_hash() {
        let a = checksum_of(b"0123456789");
        let b = checksum_of(b"0123456788");
        assert_ne!(a, b);
    }
}
