//! Flex archives: a numbered list of opaque objects behind a fixed header.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! 0x00  free-form text, then 0x1A padding up to 0x52
//! 0x52  2 bytes, unused
//! 0x54  u32 object count
//! 0x58  unused up to 0x80
//! 0x80  count × (u32 offset, u32 size)
//! ```
//!
//! A slot with size 0 holds no object.

use serde::Serialize;
use tracing::{debug, warn};

use crate::buffer::BufferSource;
use crate::error::{Error, Result};
use crate::sink::ByteSink;
use crate::source::ByteSource;

const PAD: u8 = 0x1a;
const HEADER_TEXT_LEN: usize = 0x52;
const COUNT_OFFSET: u64 = 0x54;
const INDEX_OFFSET: u64 = 0x80;
const INDEX_ENTRY_SIZE: u64 = 8;

/// Location of one object inside the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlexEntry {
    /// Absolute byte offset of the object data.
    pub offset: u32,
    /// Object size in bytes; 0 for an empty slot.
    pub size: u32,
}

impl FlexEntry {
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Parsed flex index. Object data stays in the source and is read on demand.
#[derive(Debug, Clone)]
pub struct FlexArchive {
    header: String,
    entries: Vec<FlexEntry>,
}

impl FlexArchive {
    /// Check for the 0x1A-padded header without moving the source.
    pub fn is_flex<S: ByteSource + ?Sized>(src: &mut S) -> Result<bool> {
        let pos = src.position()?;
        if src.size()? < INDEX_OFFSET {
            return Ok(false);
        }
        src.seek(0)?;
        let text = src.read_bytes(HEADER_TEXT_LEN);
        src.seek(pos)?;
        Ok(header_text_len(&text?).is_some())
    }

    /// Parse the header and index table.
    ///
    /// Fails if the header is not a flex header, or if the index or any
    /// object extends past the end of the source.
    pub fn parse<S: ByteSource + ?Sized>(src: &mut S) -> Result<Self> {
        let size = src.size()?;
        if size < INDEX_OFFSET {
            return Err(invalid(format!("{size} bytes is too short for a flex header")));
        }

        src.seek(0)?;
        let text = src.read_bytes(HEADER_TEXT_LEN)?;
        let text_len = header_text_len(&text)
            .ok_or_else(|| invalid("header is not padded with 0x1A".to_string()))?;
        let header = String::from_utf8_lossy(&text[..text_len]).into_owned();

        src.seek(COUNT_OFFSET)?;
        let count = src.read_u32()? as u64;
        let index_end = INDEX_OFFSET + count * INDEX_ENTRY_SIZE;
        if index_end > size {
            return Err(invalid(format!(
                "index of {count} entries ends at {index_end:#x}, past end of data ({size:#x})"
            )));
        }

        src.seek(INDEX_OFFSET)?;
        let mut entries = Vec::with_capacity(count as usize);
        for index in 0..count {
            let offset = src.read_u32()?;
            let entry_size = src.read_u32()?;
            if entry_size != 0 {
                if offset as u64 + entry_size as u64 > size {
                    return Err(invalid(format!(
                        "entry {index} ({entry_size} bytes at {offset:#x}) runs past end of data ({size:#x})"
                    )));
                }
                if offset == 0 {
                    warn!(index, size = entry_size, "flex entry has data but a zero offset");
                }
            }
            entries.push(FlexEntry {
                offset,
                size: entry_size,
            });
        }

        debug!(count, header = %header, "parsed flex index");
        Ok(Self { header, entries })
    }

    /// Header text before the 0x1A padding.
    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[FlexEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Result<FlexEntry> {
        self.entries
            .get(index)
            .copied()
            .ok_or(Error::EntryNotFound {
                index,
                count: self.entries.len(),
            })
    }

    /// Object size, or 0 for an empty slot or an index past the end.
    pub fn size_of(&self, index: usize) -> u32 {
        self.entries.get(index).map_or(0, |e| e.size)
    }

    /// Copy one object out of the source the index was parsed from.
    pub fn read_object<S: ByteSource + ?Sized>(&self, src: &mut S, index: usize) -> Result<Vec<u8>> {
        let entry = self.entry(index)?;
        if entry.is_empty() {
            return Ok(Vec::new());
        }
        src.seek(entry.offset as u64)?;
        src.read_bytes(entry.size as usize)
    }

    /// A cursor over one object of an archive held in memory.
    pub fn object_source<'a>(&self, data: &'a [u8], index: usize) -> Result<BufferSource<'a>> {
        let entry = self.entry(index)?;
        if entry.is_empty() {
            return Ok(BufferSource::new(&[]));
        }
        BufferSource::new(data).sub_source(entry.offset as usize, entry.size as usize)
    }

    /// Write a complete archive starting at the sink's current position.
    ///
    /// Empty objects get an empty slot. Offsets are relative to where the
    /// archive starts. The sink is left positioned after the last object.
    pub fn write<S: ByteSink + ?Sized>(sink: &mut S, header: &str, objects: &[&[u8]]) -> Result<()> {
        if header.len() >= HEADER_TEXT_LEN || header.as_bytes().contains(&PAD) {
            return Err(invalid(format!(
                "header text must be under {HEADER_TEXT_LEN} bytes and contain no 0x1A"
            )));
        }
        let count = u32::try_from(objects.len())
            .map_err(|_| invalid(format!("{} objects do not fit a u32 count", objects.len())))?;

        let base = sink.position()?;
        let mut head = [0u8; INDEX_OFFSET as usize];
        head[..header.len()].copy_from_slice(header.as_bytes());
        head[header.len()..HEADER_TEXT_LEN].fill(PAD);
        head[COUNT_OFFSET as usize..COUNT_OFFSET as usize + 4].copy_from_slice(&count.to_le_bytes());
        sink.write_bytes(&head)?;

        // Index is backpatched once object offsets are known.
        let index_pos = sink.position()?;
        sink.write_bytes(&vec![0u8; objects.len() * INDEX_ENTRY_SIZE as usize])?;

        let mut entries = Vec::with_capacity(objects.len());
        for object in objects {
            if object.is_empty() {
                entries.push(FlexEntry { offset: 0, size: 0 });
                continue;
            }
            let offset = sink.position()? - base;
            let entry = match (u32::try_from(offset), u32::try_from(object.len())) {
                (Ok(offset), Ok(size)) => FlexEntry { offset, size },
                _ => return Err(invalid("archive does not fit 32-bit offsets".to_string())),
            };
            sink.write_bytes(object)?;
            entries.push(entry);
        }

        let end = sink.position()?;
        sink.seek(index_pos)?;
        for entry in &entries {
            sink.write_u32(entry.offset)?;
            sink.write_u32(entry.size)?;
        }
        sink.seek(end)?;
        debug!(count, bytes = end - base, "wrote flex archive");
        Ok(())
    }
}

/// Length of the header text if everything after it up to 0x52 is 0x1A padding.
fn header_text_len(text: &[u8]) -> Option<usize> {
    let first_pad = text.iter().position(|&b| b == PAD)?;
    text[first_pad..]
        .iter()
        .all(|&b| b == PAD)
        .then_some(first_pad)
}

fn invalid(message: String) -> Error {
    Error::InvalidFlex { message }
}
