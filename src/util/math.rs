//! Value types stored in records.
//!
//! Geometric types come straight from `glam`. [`Color`] is a plain RGBA
//! quadruple and [`Timestamp`] is a calendar date-time without offset,
//! measured on the wire in 100-nanosecond ticks since [`TIMESTAMP_EPOCH`].

pub use glam::{Quat, Vec2, Vec3, Vec4};

use serde::{Deserialize, Serialize};
use std::fmt;
use time::macros::datetime;
use time::{Duration, PrimitiveDateTime};

/// Calendar timestamp (no time zone), 100 ns resolution on the wire.
pub type Timestamp = PrimitiveDateTime;

/// Tick zero: 0001-01-01 00:00:00.
pub const TIMESTAMP_EPOCH: Timestamp = datetime!(0001-01-01 0:00);

/// Ticks (100 ns) per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Convert a timestamp to 100 ns ticks since [`TIMESTAMP_EPOCH`].
///
/// Sub-tick precision is truncated.
pub fn timestamp_to_ticks(ts: Timestamp) -> i64 {
    let elapsed = ts - TIMESTAMP_EPOCH;
    (elapsed.whole_nanoseconds() / 100) as i64
}

/// Convert 100 ns ticks back into a timestamp.
///
/// Returns `None` when the tick count falls outside the calendar range.
pub fn ticks_to_timestamp(ticks: i64) -> Option<Timestamp> {
    let secs = ticks / TICKS_PER_SECOND;
    let rem = ticks % TICKS_PER_SECOND;
    let offset = Duration::seconds(secs) + Duration::nanoseconds(rem * 100);
    TIMESTAMP_EPOCH.checked_add(offset)
}

/// RGBA color with single precision channels.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const CLEAR: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create a color from its four channels.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from three channels.
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<Vec4> for Color {
    #[inline]
    fn from(v: Vec4) -> Self {
        Self::new(v.x, v.y, v.z, v.w)
    }
}

impl From<Color> for Vec4 {
    #[inline]
    fn from(c: Color) -> Self {
        Vec4::new(c.r, c.g, c.b, c.a)
    }
}

impl From<[f32; 4]> for Color {
    #[inline]
    fn from(v: [f32; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl fmt::Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Color({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}
