use std::io::{self, Read};

use crate::Hasher;

/// Streaming reader that hashes data as it passes through.
pub struct HashingReader<R, H> {
    reader: R,
    hasher: H,
}

impl<R, H> HashingReader<R, H> {
    pub fn new(reader: R, hasher: H) -> Self {
        Self { reader, hasher }
    }
}

impl<R: Read, H: Hasher> HashingReader<R, H> {
    /// Hash bytes that did not come through the reader.
    pub fn append(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Digest of everything read so far.
    pub fn finalize(self) -> Vec<u8> {
        self.hasher.finalize()
    }
}

impl<R: Read, H: Hasher> Read for HashingReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Sha1Hasher;
    use digest::Digest;
    use std::io::Cursor;

    #[test]
    fn test_hashing_reader_passes_bytes_through() {
        let data = b"test data for verification";

        let mut reader = HashingReader::new(Cursor::new(data), Sha1Hasher::new());
        let mut sink = Vec::new();
        io::copy(&mut reader, &mut sink).unwrap();

        assert_eq!(sink, data);
        assert_eq!(reader.finalize(), sha1::Sha1::digest(data).to_vec());
    }

    #[test]
    fn test_appended_bytes_follow_content() {
        let mut reader = HashingReader::new(Cursor::new(b"archive"), Sha1Hasher::new());
        io::copy(&mut reader, &mut io::sink()).unwrap();
        reader.append(b"1.0.0");

        assert_eq!(reader.finalize(), sha1::Sha1::digest(b"archive1.0.0").to_vec());
    }
}
