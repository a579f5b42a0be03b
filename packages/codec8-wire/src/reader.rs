use crate::error::DecodeError;

/// Bounds-checked cursor over a byte slice. Every read advances the cursor
/// by exactly the width it consumed; every read fails cleanly with
/// [`DecodeError::Truncated`] instead of panicking when the buffer runs out.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    cursor: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, cursor: 0 }
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.cursor
    }

    fn require(&self, needed: usize) -> Result<(), DecodeError> {
        if self.remaining() < needed {
            Err(DecodeError::Truncated { at: self.cursor, needed })
        } else {
            Ok(())
        }
    }

    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        self.require(n)?;
        let slice = &self.buf[self.cursor..self.cursor + n];
        self.cursor += n;
        Ok(slice)
    }

    pub fn peek_u8(&self, offset_from_cursor: usize) -> Option<u8> {
        self.buf.get(self.cursor + offset_from_cursor).copied()
    }

    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_slice(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16, DecodeError> {
        let s = self.read_slice(2)?;
        Ok(u16::from_be_bytes([s[0], s[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let s = self.read_slice(4)?;
        Ok(u32::from_be_bytes([s[0], s[1], s[2], s[3]]))
    }

    pub fn read_u64(&mut self) -> Result<u64, DecodeError> {
        let s = self.read_slice(8)?;
        Ok(u64::from_be_bytes(s.try_into().unwrap()))
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(self.read_u32()? as i32)
    }

    /// Reads a 2-byte field and sign-extends it to `i32`. Teltonika's Codec 8
    /// altitude and angle fields are only 2 bytes wide on the wire, even
    /// though they're modeled here as signed 32-bit values for headroom.
    pub fn read_i32_from_u16(&mut self) -> Result<i32, DecodeError> {
        Ok(self.read_u16()? as i16 as i32)
    }
}
