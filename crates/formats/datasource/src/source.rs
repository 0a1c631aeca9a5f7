use crate::error::{Error, Result};

/// Read side of a data source.
///
/// Backends supply raw byte reads and positioning; every integer, float and
/// variable-width read is built on top of [`read_exact_into`](Self::read_exact_into).
/// Multi-byte values are assembled from bytes consumed in ascending address
/// order. Little-endian reads put the first byte in the least significant
/// position, `_be` reads put it in the most significant one.
pub trait ByteSource {
    /// Fill `buf` completely or fail without consuming anything.
    fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Move to an absolute byte offset.
    fn seek(&mut self, pos: u64) -> Result<()>;

    /// Move relative to the current position.
    fn skip(&mut self, delta: i64) -> Result<()>;

    /// Total length of the underlying medium in bytes.
    fn size(&mut self) -> Result<u64>;

    /// Current byte offset from the start.
    fn position(&mut self) -> Result<u64>;

    /// Bytes left between the position and the end. Zero when positioned past the end.
    fn remaining(&mut self) -> Result<u64> {
        let pos = self.position()?;
        Ok(self.size()?.saturating_sub(pos))
    }

    fn read_u8(&mut self) -> Result<u8> {
        let [b] = read_array(self)?;
        Ok(b)
    }

    fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(read_array(self)?))
    }

    fn read_u16_be(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(read_array(self)?))
    }

    fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }

    /// Read a 24-bit little-endian value. Bits 24..32 of the result are always zero.
    fn read_u24(&mut self) -> Result<u32> {
        let [b0, b1, b2] = read_array(self)?;
        Ok(u32::from_le_bytes([b0, b1, b2, 0]))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(read_array(self)?))
    }

    fn read_u32_be(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(read_array(self)?))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Read 4 little-endian bytes and reinterpret the bit pattern as an IEEE-754 single.
    fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Read exactly `n` bytes.
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        self.read_exact_into(&mut buf)?;
        Ok(buf)
    }

    /// Read a little-endian unsigned integer of `width` bytes (1 to 4).
    fn read_uint(&mut self, width: usize) -> Result<u32> {
        match width {
            1 => Ok(self.read_u8()? as u32),
            2 => Ok(self.read_u16()? as u32),
            3 => self.read_u24(),
            4 => self.read_u32(),
            _ => Err(Error::InvalidWidth { width }),
        }
    }

    /// Read a little-endian signed integer of `width` bytes (1 to 4), sign-extended to 32 bits.
    fn read_sint(&mut self, width: usize) -> Result<i32> {
        match width {
            1 => Ok(self.read_u8()? as i8 as i32),
            2 => Ok(self.read_u16()? as i16 as i32),
            3 => Ok(((self.read_u24()? << 8) as i32) >> 8),
            4 => Ok(self.read_u32()? as i32),
            _ => Err(Error::InvalidWidth { width }),
        }
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read_exact_into(buf)
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

/// Read a fixed-size array from any source, including unsized ones.
pub fn read_array<S: ByteSource + ?Sized, const N: usize>(src: &mut S) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    src.read_exact_into(&mut buf)?;
    Ok(buf)
}

/// Resolve `pos + delta` against a medium of `size` bytes, failing if the
/// result leaves `[0, size]`.
pub(crate) fn offset_within(pos: u64, delta: i64, size: u64) -> Result<u64> {
    let target = pos as i128 + delta as i128;
    if target < 0 || target > size as i128 {
        return Err(Error::SeekOutOfRange { target, size });
    }
    Ok(target as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferSource;

    #[test]
    fn test_sign_extension() {
        let data = [0x80, 0xff, 0x7f, 0xff, 0xff, 0x7f, 0x00, 0x00, 0x80];
        let mut src = BufferSource::new(&data);
        assert_eq!(src.read_sint(1).unwrap(), -128);
        assert_eq!(src.read_sint(2).unwrap(), 0x7fff);
        assert_eq!(src.read_sint(3).unwrap(), 0x7f_ffff);
        assert_eq!(src.read_sint(3).unwrap(), -0x80_0000);
    }

    #[test]
    fn test_width_four_reinterprets() {
        let mut src = BufferSource::new(&[0xfe, 0xff, 0xff, 0xff]);
        assert_eq!(src.read_sint(4).unwrap(), -2);
        src.seek(0).unwrap();
        assert_eq!(src.read_uint(4).unwrap(), 0xffff_fffe);
    }

    #[test]
    fn test_invalid_width_consumes_nothing() {
        let mut src = BufferSource::new(&[1, 2, 3, 4, 5]);
        for width in [0, 5, 8] {
            assert!(matches!(src.read_uint(width), Err(Error::InvalidWidth { .. })));
            assert!(matches!(src.read_sint(width), Err(Error::InvalidWidth { .. })));
        }
        assert_eq!(src.position().unwrap(), 0);
    }

    #[test]
    fn test_float_is_bit_pattern() {
        // 1.5f32 == 0x3fc00000
        let mut src = BufferSource::new(&[0x00, 0x00, 0xc0, 0x3f, 0x00, 0x00, 0x00, 0x80]);
        assert_eq!(src.read_f32().unwrap(), 1.5);
        // Negative zero compares equal to 0.0, so check the bits.
        assert_eq!(src.read_f32().unwrap().to_bits(), 0x8000_0000);
    }

    #[test]
    fn test_dyn_source() {
        let data = [0x34, 0x12];
        let mut buf = BufferSource::new(&data);
        let src: &mut dyn ByteSource = &mut buf;
        assert_eq!(src.read_u16().unwrap(), 0x1234);
        assert_eq!(src.remaining().unwrap(), 0);
    }

    #[test]
    fn test_offset_within() {
        assert_eq!(offset_within(4, -4, 6).unwrap(), 0);
        assert_eq!(offset_within(4, 2, 6).unwrap(), 6);
        assert!(offset_within(4, 3, 6).is_err());
        assert!(offset_within(0, -1, 6).is_err());
    }

    #[test]
    fn test_offset_within_reports_unwrapped_target() {
        assert!(matches!(
            offset_within(u64::MAX, 0, 4),
            Err(Error::SeekOutOfRange { target, size: 4 }) if target == u64::MAX as i128
        ));
        assert!(matches!(
            offset_within(u64::MAX, i64::MAX, 4),
            Err(Error::SeekOutOfRange { target, .. }) if target == u64::MAX as i128 + i64::MAX as i128
        ));
    }

    #[test]
    fn test_negative_sixteen_bit() {
        let mut src = BufferSource::new(&[0x00, 0x80, 0xfe, 0xff]);
        assert_eq!(src.read_sint(2).unwrap(), -0x8000);
        assert_eq!(src.read_sint(2).unwrap(), -2);
        src.seek(0).unwrap();
        assert_eq!(src.read_uint(2).unwrap(), 0x8000);
    }
}
