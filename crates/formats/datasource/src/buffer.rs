//! In-memory backends: a borrowed read view, a borrowed fixed-size write
//! view, and an owned growable writer.

use crate::error::{Error, Result};
use crate::sink::ByteSink;
use crate::source::{offset_within, ByteSource};

/// Read cursor over a borrowed byte slice.
///
/// The cursor never copies or owns the bytes. Every read is checked against
/// the end of the slice; a read that would overrun fails and leaves the
/// position where it was.
#[derive(Debug, Clone)]
pub struct BufferSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BufferSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Point the cursor at new data and rewind.
    pub fn load(&mut self, data: &'a [u8]) {
        self.data = data;
        self.pos = 0;
    }

    /// Total length of underlying data.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether every byte has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Access the full underlying data.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Read a slice of `n` bytes without copying.
    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// A new cursor over `len` bytes starting at `offset`, positioned at 0.
    pub fn sub_source(&self, offset: usize, len: usize) -> Result<BufferSource<'a>> {
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(Error::UnexpectedEof {
                offset: offset as u64,
                need: len as u64,
                have: self.data.len().saturating_sub(offset) as u64,
            })?;
        Ok(Self::new(&self.data[offset..end]))
    }

    fn ensure(&self, n: usize) -> Result<()> {
        let have = self.data.len() - self.pos;
        if n > have {
            return Err(Error::UnexpectedEof {
                offset: self.pos as u64,
                need: n as u64,
                have: have as u64,
            });
        }
        Ok(())
    }
}

impl ByteSource for BufferSource<'_> {
    fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<()> {
        let bytes = self.read_slice(buf.len())?;
        buf.copy_from_slice(bytes);
        Ok(())
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        self.pos = offset_within(pos, 0, self.data.len() as u64)? as usize;
        Ok(())
    }

    fn skip(&mut self, delta: i64) -> Result<()> {
        self.pos = offset_within(self.pos as u64, delta, self.data.len() as u64)? as usize;
        Ok(())
    }

    fn size(&mut self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn position(&mut self) -> Result<u64> {
        Ok(self.pos as u64)
    }

    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.read_slice(n)?.to_vec())
    }
}

/// Write cursor over a borrowed, fixed-size byte slice.
///
/// Writes past the end of the slice fail without writing anything.
#[derive(Debug)]
pub struct BufferSink<'a> {
    data: &'a mut [u8],
    pos: usize,
}

impl<'a> BufferSink<'a> {
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..]
    }
}

impl ByteSink for BufferSink<'_> {
    fn write_all_from(&mut self, bytes: &[u8]) -> Result<()> {
        let have = self.data.len() - self.pos;
        if bytes.len() > have {
            return Err(Error::UnexpectedEof {
                offset: self.pos as u64,
                need: bytes.len() as u64,
                have: have as u64,
            });
        }
        self.data[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        self.pos = offset_within(pos, 0, self.data.len() as u64)? as usize;
        Ok(())
    }

    fn skip(&mut self, delta: i64) -> Result<()> {
        self.pos = offset_within(self.pos as u64, delta, self.data.len() as u64)? as usize;
        Ok(())
    }

    fn size(&mut self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }

    fn position(&mut self) -> Result<u64> {
        Ok(self.pos as u64)
    }
}

/// Writer that builds an owned byte buffer.
///
/// Writes land at the current position, overwriting existing bytes and
/// growing the buffer when they run past the end. Seeking back and
/// rewriting is how sizes and offsets get backpatched.
#[derive(Debug, Default)]
pub struct VecSink {
    buf: Vec<u8>,
    pos: usize,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
            pos: 0,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Pad with zeros at the end until the length is a multiple of `n`, and move there.
    /// An alignment of 0 or 1 pads nothing.
    pub fn align(&mut self, n: usize) {
        let len = self.buf.len().next_multiple_of(n.max(1));
        self.buf.resize(len, 0);
        self.pos = len;
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl ByteSink for VecSink {
    fn write_all_from(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        self.pos = offset_within(pos, 0, self.buf.len() as u64)? as usize;
        Ok(())
    }

    fn skip(&mut self, delta: i64) -> Result<()> {
        self.pos = offset_within(self.pos as u64, delta, self.buf.len() as u64)? as usize;
        Ok(())
    }

    fn size(&mut self) -> Result<u64> {
        Ok(self.buf.len() as u64)
    }

    fn position(&mut self) -> Result<u64> {
        Ok(self.pos as u64)
    }
}
