use crate::error::{Error, Result};

/// Write side of a data source, the mirror of [`ByteSource`](crate::ByteSource).
///
/// Byte order follows the same rules: little-endian by default, `_be` for
/// most-significant-byte first.
pub trait ByteSink {
    /// Write all of `bytes` at the current position or fail without writing any.
    fn write_all_from(&mut self, bytes: &[u8]) -> Result<()>;

    fn seek(&mut self, pos: u64) -> Result<()>;

    fn skip(&mut self, delta: i64) -> Result<()>;

    /// Current length of the written medium.
    fn size(&mut self) -> Result<u64>;

    fn position(&mut self) -> Result<u64>;

    fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write_all_from(&[v])
    }

    fn write_u16(&mut self, v: u16) -> Result<()> {
        self.write_all_from(&v.to_le_bytes())
    }

    fn write_u16_be(&mut self, v: u16) -> Result<()> {
        self.write_all_from(&v.to_be_bytes())
    }

    /// Write the low 24 bits of `v`, little-endian. The top byte is dropped.
    fn write_u24(&mut self, v: u32) -> Result<()> {
        let [b0, b1, b2, _] = v.to_le_bytes();
        self.write_all_from(&[b0, b1, b2])
    }

    fn write_u32(&mut self, v: u32) -> Result<()> {
        self.write_all_from(&v.to_le_bytes())
    }

    fn write_u32_be(&mut self, v: u32) -> Result<()> {
        self.write_all_from(&v.to_be_bytes())
    }

    /// Write the bit pattern of `v` as a little-endian u32.
    fn write_f32(&mut self, v: f32) -> Result<()> {
        self.write_u32(v.to_bits())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_all_from(bytes)
    }

    /// Write the low `width` bytes (1 to 4) of `v`, little-endian.
    fn write_uint(&mut self, width: usize, v: u32) -> Result<()> {
        match width {
            1 => self.write_u8(v as u8),
            2 => self.write_u16(v as u16),
            3 => self.write_u24(v),
            4 => self.write_u32(v),
            _ => Err(Error::InvalidWidth { width }),
        }
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write_all_from(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all_from(bytes)
    }

    fn seek(&mut self, pos: u64) -> Result<()> {
        (**self).seek(pos)
    }

    fn skip(&mut self, delta: i64) -> Result<()> {
        (**self).skip(delta)
    }

    fn size(&mut self) -> Result<u64> {
        (**self).size()
    }

    fn position(&mut self) -> Result<u64> {
        (**self).position()
    }
}
