use std::io::{self, ErrorKind, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::WireError;

/// Little-endian scalar reader over any byte stream.
///
/// Wraps a [`Read`] and keeps a running count of the bytes consumed so
/// that every error can report where in the file it happened. All values
/// on the wire are little-endian; `byteorder` swaps them on big-endian
/// hosts.
///
/// ```text
///   ScalarReader
///   ├── read_u8 / read_u32 / read_f32   ← fixed-width values
///   ├── read_array::<N>                 ← fixed-width byte runs (magic)
///   ├── read_bytes(n)                   ← variable blob (metadata)
///   └── skip(n)                         ← discard without allocating
/// ```
///
/// Short reads surface as [`WireError::UnexpectedEof`] carrying the offset
/// of the value that could not be completed.
pub struct ScalarReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> ScalarReader<R> {
    /// Wrap a reader positioned at the start of the file.
    pub fn new(inner: R) -> Self {
        Self::with_position(inner, 0)
    }

    /// Wrap a reader that has already consumed `position` bytes.
    ///
    /// Used when the header was decoded separately and only the body is
    /// being driven.
    pub fn with_position(inner: R, position: u64) -> Self {
        Self { inner, position }
    }

    /// Absolute number of bytes consumed so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Give back the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read one byte.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] on a short read, [`WireError::Io`]
    /// for any other I/O failure.
    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        let offset = self.position;
        let value = self.inner.read_u8().map_err(|e| eof_at(e, offset))?;
        self.position += 1;
        Ok(value)
    }

    /// Read one little-endian `u32`.
    ///
    /// # Errors
    ///
    /// Same as [`read_u8`](Self::read_u8).
    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        let offset = self.position;
        let value = self
            .inner
            .read_u32::<LittleEndian>()
            .map_err(|e| eof_at(e, offset))?;
        self.position += 4;
        Ok(value)
    }

    /// Read one little-endian IEEE-754 `f32`.
    ///
    /// No finiteness check happens here; callers decide whether NaN or
    /// infinity is acceptable.
    ///
    /// # Errors
    ///
    /// Same as [`read_u8`](Self::read_u8).
    pub fn read_f32(&mut self) -> Result<f32, WireError> {
        let offset = self.position;
        let value = self
            .inner
            .read_f32::<LittleEndian>()
            .map_err(|e| eof_at(e, offset))?;
        self.position += 4;
        Ok(value)
    }

    /// Read exactly `N` raw bytes.
    ///
    /// # Errors
    ///
    /// Same as [`read_u8`](Self::read_u8).
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let offset = self.position;
        let mut buf = [0u8; N];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| eof_at(e, offset))?;
        self.position += N as u64;
        Ok(buf)
    }

    /// Read exactly `len` bytes into a fresh buffer.
    ///
    /// The buffer grows as bytes arrive instead of being sized from `len`
    /// up front, so a truncated stream with a huge declared length fails
    /// with EOF rather than a giant allocation.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] with the offset where the data ran out.
    pub fn read_bytes(&mut self, len: u64) -> Result<Vec<u8>, WireError> {
        let mut buf = Vec::new();
        let read = self.inner.by_ref().take(len).read_to_end(&mut buf)? as u64;
        self.position += read;
        if read < len {
            return Err(WireError::UnexpectedEof {
                offset: self.position,
            });
        }
        Ok(buf)
    }

    /// Discard exactly `len` bytes.
    ///
    /// Bytes are streamed into [`io::sink`] through a fixed stack buffer:
    /// nothing proportional to `len` is allocated.
    ///
    /// # Errors
    ///
    /// [`WireError::UnexpectedEof`] if the stream ends first.
    pub fn skip(&mut self, len: u64) -> Result<(), WireError> {
        let skipped = io::copy(&mut self.inner.by_ref().take(len), &mut io::sink())?;
        self.position += skipped;
        if skipped < len {
            return Err(WireError::UnexpectedEof {
                offset: self.position,
            });
        }
        Ok(())
    }
}

/// Map a short read to `UnexpectedEof`, pass everything else through.
fn eof_at(err: io::Error, offset: u64) -> WireError {
    if err.kind() == ErrorKind::UnexpectedEof {
        WireError::UnexpectedEof { offset }
    } else {
        WireError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn reads_little_endian_values() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0x0102_0304u32.to_le_bytes());
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.push(7);

        let mut reader = ScalarReader::new(Cursor::new(bytes));
        assert_eq!(reader.read_u32().unwrap(), 0x0102_0304);
        assert_eq!(reader.read_f32().unwrap(), 1.5);
        assert_eq!(reader.read_u8().unwrap(), 7);
        assert_eq!(reader.position(), 9);
    }

    #[test]
    fn short_u32_reports_offset_of_value() {
        let mut reader = ScalarReader::new(Cursor::new(vec![1, 2, 3, 4, 5, 6]));
        reader.read_u32().unwrap();
        let err = reader.read_u32().unwrap_err();
        assert!(matches!(err, WireError::UnexpectedEof { offset: 4 }));
    }

    #[test]
    fn skip_advances_without_reading_values() {
        let mut reader = ScalarReader::new(Cursor::new(vec![0xFF; 10]));
        reader.skip(8).unwrap();
        assert_eq!(reader.position(), 8);
        assert_eq!(reader.read_u8().unwrap(), 0xFF);
    }

    #[test]
    fn short_skip_is_eof() {
        let mut reader = ScalarReader::new(Cursor::new(vec![0; 3]));
        let err = reader.skip(4).unwrap_err();
        assert!(matches!(err, WireError::UnexpectedEof { offset: 3 }));
    }

    #[test]
    fn huge_declared_blob_on_short_stream_is_eof() {
        let mut reader = ScalarReader::new(Cursor::new(b"meta".to_vec()));
        let err = reader.read_bytes(u64::from(u32::MAX)).unwrap_err();
        assert!(matches!(err, WireError::UnexpectedEof { offset: 4 }));
    }

    #[test]
    fn with_position_offsets_errors() {
        let mut reader = ScalarReader::with_position(Cursor::new(Vec::new()), 64);
        let err = reader.read_f32().unwrap_err();
        assert!(matches!(err, WireError::UnexpectedEof { offset: 64 }));
    }
}
