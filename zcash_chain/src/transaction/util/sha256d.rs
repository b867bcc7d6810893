use sha2::{Digest, Sha256};
use std::io::{self, Read, Write};

/// Abstraction over a reader which SHA-256d-hashes the data being read.
pub struct HashReader<R> {
    reader: R,
    hasher: Sha256,
}

impl<R: Read> HashReader<R> {
    /// Construct a new `HashReader` given an existing `reader` by value.
    pub fn new(reader: R) -> Self {
        HashReader {
            reader,
            hasher: Sha256::new(),
        }
    }

    /// Destroy this reader and return the hash of what was read.
    pub fn into_hash(self) -> [u8; 32] {
        Sha256::digest(self.hasher.finalize()).into()
    }

    /// Destroy this reader and return the underlying reader, discarding the hash state.
    pub fn into_base_reader(self) -> R {
        self.reader
    }
}

impl<R: Read> Read for HashReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let bytes = self.reader.read(buf)?;

        if bytes > 0 {
            self.hasher.update(&buf[0..bytes]);
        }

        Ok(bytes)
    }
}

/// Abstraction over a writer which SHA-256d-hashes the data being written.
#[derive(Default)]
pub struct HashWriter {
    hasher: Sha256,
}

impl HashWriter {
    /// Destroy this writer and return the hash of what was written.
    pub fn into_hash(self) -> [u8; 32] {
        Sha256::digest(self.hasher.finalize()).into()
    }
}

impl Write for HashWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.hasher.update(buf);

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Computes the double SHA-256 hash of `data`.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    Sha256::digest(Sha256::digest(data)).into()
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};

    use super::{sha256d, HashReader, HashWriter};

    #[test]
    fn reader_and_writer_agree() {
        let data = b"The quick brown fox jumps over the lazy dog";

        let mut reader = HashReader::new(&data[..]);
        let mut buf = vec![];
        reader.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, data);

        let mut writer = HashWriter::default();
        writer.write_all(data).unwrap();

        assert_eq!(reader.into_hash(), writer.into_hash());
        assert_eq!(sha256d(data), sha256d(&buf));
    }

    #[test]
    fn empty_input() {
        assert_eq!(
            hex::encode(sha256d(&[])),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
        assert_eq!(HashWriter::default().into_hash(), sha256d(&[]));
    }
}
