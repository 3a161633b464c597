//! In-memory byte cursors used by the binary codec.
//!
//! [`ByteWriter`] appends little-endian data and supports back-patching a
//! length slot once the framed payload is known. [`ByteReader`] tracks the
//! read offset and turns every overrun into [`Error::CorruptData`].

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use super::value::FixedCodec;
use crate::util::{Error, Result};

/// Output buffer for serialized records.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    /// Get the current write position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.buf.len()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        // Writing into a Vec cannot fail.
        let _ = self.buf.write_i32::<LittleEndian>(value);
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Write a fixed-width value.
    pub fn write_fixed<T: FixedCodec>(&mut self, value: &T) {
        value.encode_into(&mut self.buf);
    }

    /// Write a length or count prefix.
    pub fn write_len(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len)
            .map_err(|_| Error::other(format!("length {len} exceeds i32 range")))?;
        self.write_i32(len);
        Ok(())
    }

    /// Write a length-prefixed UTF-8 string.
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.write_len(s.len())?;
        self.write_bytes(s.as_bytes());
        Ok(())
    }

    /// Reserve an i32 length slot, returning its position for [`patch_len`](Self::patch_len).
    pub fn reserve_len(&mut self) -> usize {
        let pos = self.pos();
        self.write_i32(0);
        pos
    }

    /// Fill a reserved slot with the number of bytes written after it.
    pub fn patch_len(&mut self, slot: usize) -> Result<()> {
        let len = self.pos() - slot - 4;
        let len = i32::try_from(len)
            .map_err(|_| Error::other(format!("framed payload of {len} bytes exceeds i32 range")))?;
        LittleEndian::write_i32(&mut self.buf[slot..slot + 4], len);
        Ok(())
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Bounds-checked reader over a byte slice.
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Absolute offset of `data[0]` in the outermost buffer, for messages.
    base: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            base: 0,
        }
    }

    /// Current absolute offset.
    #[inline]
    pub fn pos(&self) -> usize {
        self.base + self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::truncated(self.pos(), len, self.remaining()));
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    /// Read a fixed-width value.
    pub fn read_fixed<T: FixedCodec>(&mut self) -> Result<T> {
        T::read_le(self.take(T::WIDTH)?)
    }

    /// Read exactly `N` raw bytes.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a non-negative i32 length prefix.
    pub fn read_len(&mut self) -> Result<usize> {
        let at = self.pos();
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| Error::corrupt(format!("negative length {len} at offset {at}")))
    }

    /// Read a list count and check that `count * min_elem` bytes can follow.
    pub fn read_count(&mut self, min_elem: usize) -> Result<usize> {
        let at = self.pos();
        let count = self.read_len()?;
        let needed = count.saturating_mul(min_elem);
        if needed > self.remaining() {
            return Err(Error::corrupt(format!(
                "list of {count} elements at offset {at} needs at least {needed} bytes, {} available",
                self.remaining()
            )));
        }
        Ok(count)
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let at = self.pos();
        let len = self.read_len()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::corrupt(format!("invalid UTF-8 in string at offset {at}: {e}")))
    }

    /// Split off a reader over the next `len` bytes and advance past them.
    pub fn sub_reader(&mut self, len: usize) -> Result<ByteReader<'a>> {
        let base = self.pos();
        let data = self.take(len)?;
        Ok(ByteReader { data, pos: 0, base })
    }
}
