//! File-backed backends. Each cursor owns its handle exclusively; dropping
//! the cursor closes the handle.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::sink::ByteSink;
use crate::source::ByteSource;

/// Record the position, seek to the end, and seek back.
///
/// Not atomic against anything else moving the same OS handle, which is why
/// the cursors own their handles.
fn stream_len<S: Seek>(inner: &mut S, pos: u64) -> Result<u64> {
    let len = inner.seek(SeekFrom::End(0))?;
    inner.seek(SeekFrom::Start(pos))?;
    trace!(len, pos, "measured stream length");
    Ok(len)
}

/// Checked `pos + delta` for handles. Past the end is fine; before 0 or
/// beyond `u64::MAX` is not.
fn stream_target<S: Seek>(inner: &mut S, pos: u64, delta: i64) -> Result<u64> {
    let target = pos as i128 + delta as i128;
    u64::try_from(target).or_else(|_| {
        let size = stream_len(inner, pos)?;
        Err(Error::SeekOutOfRange { target, size })
    })
}

/// Read cursor over an owned seekable handle, by default a buffered file.
///
/// Seeking past the end is allowed, as it is for the OS; reads from there
/// fail with [`Error::UnexpectedEof`].
#[derive(Debug)]
pub struct StreamSource<R = BufReader<File>> {
    inner: R,
    pos: u64,
}

impl StreamSource {
    /// Open a file for binary reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened stream source");
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> StreamSource<R> {
    /// Take ownership of an already-open handle, starting at its current position.
    pub fn new(mut inner: R) -> Result<Self> {
        let pos = inner.stream_position()?;
        Ok(Self { inner, pos })
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ByteSource for StreamSource<R> {
    fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.pos += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                // read_exact leaves the handle somewhere inside the short read.
                let size = stream_len(&mut self.inner, self.pos)?;
                Err(Error::UnexpectedEof {
                    offset: self.pos,
                    need: buf.len() as u64,
                    have: size.saturating_sub(self.pos),
                })
            }
            Err(e) => {
                self.inner.seek(SeekFrom::Start(self.pos))?;
                Err(e.into())
            }
        }
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        self.pos = self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn skip(&mut self, delta: i64) -> Result<()> {
        let target = stream_target(&mut self.inner, self.pos, delta)?;
        self.seek(target)
    }

    fn size(&mut self) -> Result<u64> {
        stream_len(&mut self.inner, self.pos)
    }

    fn position(&mut self) -> Result<u64> {
        Ok(self.pos)
    }
}

/// Write cursor over an owned seekable handle, by default a buffered file.
///
/// Buffered bytes are flushed on [`flush`](Self::flush), on any seek, and on
/// drop. Drop swallows flush errors, so call [`finish`](Self::finish) when
/// they matter.
#[derive(Debug)]
pub struct StreamSink<W = BufWriter<File>> {
    inner: W,
    pos: u64,
}

impl StreamSink {
    /// Create or truncate a file for binary writing.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "created stream sink");
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write + Seek> StreamSink<W> {
    pub fn new(mut inner: W) -> Result<Self> {
        let pos = inner.stream_position()?;
        Ok(Self { inner, pos })
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and hand back the handle.
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write + Seek> ByteSink for StreamSink<W> {
    fn write_all_from(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.pos += bytes.len() as u64;
        Ok(())
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        self.pos = self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn skip(&mut self, delta: i64) -> Result<()> {
        let target = stream_target(&mut self.inner, self.pos, delta)?;
        ByteSink::seek(self, target)
    }

    fn size(&mut self) -> Result<u64> {
        stream_len(&mut self.inner, self.pos)
    }

    fn position(&mut self) -> Result<u64> {
        Ok(self.pos)
    }
}
