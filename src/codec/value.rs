//! Fixed-width value encoding.
//!
//! Every scalar and geometric kind has an exact little-endian width:
//!
//! | Type | Width |
//! |---|---|
//! | `bool` | 1 |
//! | `i32`, `f32` | 4 |
//! | `i64`, `f64`, [`Timestamp`], [`Vec2`] | 8 |
//! | [`Vec3`] | 12 |
//! | [`Color`], [`Quat`] | 16 |

use byteorder::{ByteOrder, LittleEndian};

use crate::util::{
    ticks_to_timestamp, timestamp_to_ticks, Color, Error, Quat, Result, Timestamp, Vec2, Vec3,
};

/// A value with a fixed-width little-endian byte form.
pub trait FixedCodec: Sized {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Write exactly `WIDTH` bytes into `out[..WIDTH]`.
    fn write_le(&self, out: &mut [u8]);

    /// Read from `bytes[..WIDTH]`. The caller guarantees the length.
    fn read_le(bytes: &[u8]) -> Result<Self>;

    /// Encode into a fresh buffer.
    fn encode(&self) -> Vec<u8> {
        let mut out = vec![0u8; Self::WIDTH];
        self.write_le(&mut out);
        out
    }

    /// Append the encoded bytes to `buf`.
    fn encode_into(&self, buf: &mut Vec<u8>) {
        let start = buf.len();
        buf.resize(start + Self::WIDTH, 0);
        self.write_le(&mut buf[start..]);
    }

    /// Decode one value at `offset`, returning it with the bytes consumed.
    fn decode(bytes: &[u8], offset: usize) -> Result<(Self, usize)> {
        let available = bytes.len().saturating_sub(offset);
        if available < Self::WIDTH {
            return Err(Error::truncated(offset, Self::WIDTH, available));
        }
        let value = Self::read_le(&bytes[offset..offset + Self::WIDTH])?;
        Ok((value, Self::WIDTH))
    }
}

/// Encode into a fixed array. `N` must equal `T::WIDTH`.
pub(crate) fn to_array<T: FixedCodec, const N: usize>(value: &T) -> [u8; N] {
    debug_assert_eq!(N, T::WIDTH);
    let mut out = [0u8; N];
    value.write_le(&mut out);
    out
}

/// Decode from a fixed array produced by [`to_array`].
pub(crate) fn from_array<T: FixedCodec, const N: usize>(bytes: &[u8; N]) -> Result<T> {
    debug_assert_eq!(N, T::WIDTH);
    T::read_le(bytes)
}

impl FixedCodec for i32 {
    const WIDTH: usize = 4;

    fn write_le(&self, out: &mut [u8]) {
        LittleEndian::write_i32(out, *self);
    }

    fn read_le(bytes: &[u8]) -> Result<Self> {
        Ok(LittleEndian::read_i32(bytes))
    }
}

impl FixedCodec for f32 {
    const WIDTH: usize = 4;

    fn write_le(&self, out: &mut [u8]) {
        LittleEndian::write_f32(out, *self);
    }

    fn read_le(bytes: &[u8]) -> Result<Self> {
        Ok(LittleEndian::read_f32(bytes))
    }
}

impl FixedCodec for i64 {
    const WIDTH: usize = 8;

    fn write_le(&self, out: &mut [u8]) {
        LittleEndian::write_i64(out, *self);
    }

    fn read_le(bytes: &[u8]) -> Result<Self> {
        Ok(LittleEndian::read_i64(bytes))
    }
}

impl FixedCodec for f64 {
    const WIDTH: usize = 8;

    fn write_le(&self, out: &mut [u8]) {
        LittleEndian::write_f64(out, *self);
    }

    fn read_le(bytes: &[u8]) -> Result<Self> {
        Ok(LittleEndian::read_f64(bytes))
    }
}

impl FixedCodec for bool {
    const WIDTH: usize = 1;

    fn write_le(&self, out: &mut [u8]) {
        out[0] = u8::from(*self);
    }

    // Any non-zero byte reads as true.
    fn read_le(bytes: &[u8]) -> Result<Self> {
        Ok(bytes[0] != 0)
    }
}

impl FixedCodec for Vec2 {
    const WIDTH: usize = 8;

    fn write_le(&self, out: &mut [u8]) {
        LittleEndian::write_f32_into(&self.to_array(), &mut out[..8]);
    }

    fn read_le(bytes: &[u8]) -> Result<Self> {
        let mut v = [0f32; 2];
        LittleEndian::read_f32_into(&bytes[..8], &mut v);
        Ok(Vec2::from_array(v))
    }
}

impl FixedCodec for Vec3 {
    const WIDTH: usize = 12;

    fn write_le(&self, out: &mut [u8]) {
        LittleEndian::write_f32_into(&self.to_array(), &mut out[..12]);
    }

    fn read_le(bytes: &[u8]) -> Result<Self> {
        let mut v = [0f32; 3];
        LittleEndian::read_f32_into(&bytes[..12], &mut v);
        Ok(Vec3::from_array(v))
    }
}

impl FixedCodec for Color {
    const WIDTH: usize = 16;

    fn write_le(&self, out: &mut [u8]) {
        LittleEndian::write_f32_into(&self.to_array(), &mut out[..16]);
    }

    fn read_le(bytes: &[u8]) -> Result<Self> {
        let mut v = [0f32; 4];
        LittleEndian::read_f32_into(&bytes[..16], &mut v);
        Ok(Color::from(v))
    }
}

/// Component order is x, y, z, w.
impl FixedCodec for Quat {
    const WIDTH: usize = 16;

    fn write_le(&self, out: &mut [u8]) {
        LittleEndian::write_f32_into(&self.to_array(), &mut out[..16]);
    }

    fn read_le(bytes: &[u8]) -> Result<Self> {
        let mut v = [0f32; 4];
        LittleEndian::read_f32_into(&bytes[..16], &mut v);
        Ok(Quat::from_array(v))
    }
}

impl FixedCodec for Timestamp {
    const WIDTH: usize = 8;

    fn write_le(&self, out: &mut [u8]) {
        LittleEndian::write_i64(out, timestamp_to_ticks(*self));
    }

    fn read_le(bytes: &[u8]) -> Result<Self> {
        let ticks = LittleEndian::read_i64(bytes);
        ticks_to_timestamp(ticks)
            .ok_or_else(|| Error::corrupt(format!("timestamp tick count {ticks} out of range")))
    }
}
