//! Little-endian binary archive over `std::io`.
//!
//! [`BinaryWriter`] and [`BinaryReader`] implement the core
//! [`ArchiveWriter`] / [`ArchiveReader`] traits, so the engine's
//! serializer writes straight to a file or buffer. No compression, no
//! alignment padding, no self-describing schema.

use std::io::{Read, Write};

use thinkers_core::{ArchiveError, ArchiveReader, ArchiveWriter};

/// Largest string or byte-array length accepted by default (16 MiB).
pub const DEFAULT_MAX_LEN: u32 = 16 * 1024 * 1024;

// ── Writer ──────────────────────────────────────────────────────

/// Writes archive values to a byte stream.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`.
pub struct BinaryWriter<W: Write> {
    writer: W,
    bytes_written: u64,
}

impl<W: Write> BinaryWriter<W> {
    /// Wrap a byte sink.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            bytes_written: 0,
        }
    }

    /// Number of bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), ArchiveError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn put(&mut self, bytes: &[u8]) -> Result<(), ArchiveError> {
        self.writer.write_all(bytes)?;
        self.bytes_written += bytes.len() as u64;
        Ok(())
    }

    fn put_len(&mut self, len: usize) -> Result<(), ArchiveError> {
        let len = u32::try_from(len).map_err(|_| ArchiveError::LengthOverflow {
            len: len as u64,
            limit: u32::MAX as u64,
        })?;
        self.put(&len.to_le_bytes())
    }
}

impl<W: Write> ArchiveWriter for BinaryWriter<W> {
    fn write_u8(&mut self, v: u8) -> Result<(), ArchiveError> {
        self.put(&[v])
    }

    fn write_u32(&mut self, v: u32) -> Result<(), ArchiveError> {
        self.put(&v.to_le_bytes())
    }

    fn write_u64(&mut self, v: u64) -> Result<(), ArchiveError> {
        self.put(&v.to_le_bytes())
    }

    fn write_i32(&mut self, v: i32) -> Result<(), ArchiveError> {
        self.put(&v.to_le_bytes())
    }

    fn write_f64(&mut self, v: f64) -> Result<(), ArchiveError> {
        self.put(&v.to_le_bytes())
    }

    fn write_str(&mut self, s: &str) -> Result<(), ArchiveError> {
        self.put_len(s.len())?;
        self.put(s.as_bytes())
    }

    fn write_bytes(&mut self, b: &[u8]) -> Result<(), ArchiveError> {
        self.put_len(b.len())?;
        self.put(b)
    }
}

// ── Reader ──────────────────────────────────────────────────────

/// Reads archive values from a byte stream.
///
/// Length prefixes above the configured limit are rejected before any
/// allocation, so a corrupt file cannot request gigabytes.
pub struct BinaryReader<R: Read> {
    reader: R,
    max_len: u32,
    bytes_read: u64,
}

impl<R: Read> BinaryReader<R> {
    /// Wrap a byte source with [`DEFAULT_MAX_LEN`].
    pub fn new(reader: R) -> Self {
        Self::with_max_len(reader, DEFAULT_MAX_LEN)
    }

    /// Wrap a byte source with a custom length limit.
    pub fn with_max_len(reader: R, max_len: u32) -> Self {
        Self {
            reader,
            max_len,
            bytes_read: 0,
        }
    }

    /// Number of bytes consumed so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Consume the reader and return the underlying source.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], ArchiveError> {
        let mut buf = [0u8; N];
        self.reader.read_exact(&mut buf)?;
        self.bytes_read += N as u64;
        Ok(buf)
    }

    fn take_prefixed(&mut self) -> Result<Vec<u8>, ArchiveError> {
        let len = u32::from_le_bytes(self.take()?);
        if len > self.max_len {
            return Err(ArchiveError::LengthOverflow {
                len: len as u64,
                limit: self.max_len as u64,
            });
        }
        let mut buf = vec![0u8; len as usize];
        self.reader.read_exact(&mut buf)?;
        self.bytes_read += len as u64;
        Ok(buf)
    }
}

impl<R: Read> ArchiveReader for BinaryReader<R> {
    fn read_u8(&mut self) -> Result<u8, ArchiveError> {
        let [b] = self.take::<1>()?;
        Ok(b)
    }

    fn read_u32(&mut self) -> Result<u32, ArchiveError> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn read_u64(&mut self) -> Result<u64, ArchiveError> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    fn read_i32(&mut self) -> Result<i32, ArchiveError> {
        Ok(i32::from_le_bytes(self.take()?))
    }

    fn read_f64(&mut self) -> Result<f64, ArchiveError> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    fn read_string(&mut self) -> Result<String, ArchiveError> {
        let bytes = self.take_prefixed()?;
        String::from_utf8(bytes).map_err(|_| ArchiveError::InvalidUtf8)
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>, ArchiveError> {
        self.take_prefixed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_are_little_endian() {
        let mut w = BinaryWriter::new(Vec::new());
        w.write_u32(0x0403_0201).unwrap();
        w.write_i32(-2).unwrap();
        assert_eq!(w.bytes_written(), 8);
        assert_eq!(w.into_inner(), vec![1, 2, 3, 4, 0xFE, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn strings_carry_length_prefix() {
        let mut w = BinaryWriter::new(Vec::new());
        w.write_str("Foo").unwrap();
        assert_eq!(w.into_inner(), vec![3, 0, 0, 0, b'F', b'o', b'o']);
    }

    #[test]
    fn mixed_values_read_back() {
        let mut w = BinaryWriter::new(Vec::new());
        w.write_u8(7).unwrap();
        w.write_u64(u64::MAX - 1).unwrap();
        w.write_f64(-0.5).unwrap();
        w.write_bool(true).unwrap();
        w.write_str("").unwrap();
        w.write_bytes(&[9, 8]).unwrap();
        let bytes = w.into_inner();

        let mut r = BinaryReader::new(bytes.as_slice());
        assert_eq!(r.read_u8().unwrap(), 7);
        assert_eq!(r.read_u64().unwrap(), u64::MAX - 1);
        assert_eq!(r.read_f64().unwrap(), -0.5);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_string().unwrap(), "");
        assert_eq!(r.read_bytes().unwrap(), vec![9, 8]);
        assert_eq!(r.bytes_read(), bytes.len() as u64);
    }

    #[test]
    fn oversized_length_rejected_before_allocation() {
        let bytes = u32::MAX.to_le_bytes();
        let mut r = BinaryReader::with_max_len(&bytes[..], 64);
        match r.read_bytes() {
            Err(ArchiveError::LengthOverflow { len, limit }) => {
                assert_eq!((len, limit), (u32::MAX as u64, 64));
            }
            other => panic!("expected LengthOverflow, got {other:?}"),
        }
    }

    #[test]
    fn invalid_utf8_rejected() {
        let bytes = [2, 0, 0, 0, 0xC3, 0x28];
        let mut r = BinaryReader::new(&bytes[..]);
        assert!(matches!(r.read_string(), Err(ArchiveError::InvalidUtf8)));
    }

    #[test]
    fn short_read_is_io_error() {
        let mut r = BinaryReader::new(&[1u8, 2][..]);
        assert!(matches!(r.read_u32(), Err(ArchiveError::Io(_))));
    }
}
