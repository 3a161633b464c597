//! Kind tags - the single-byte discriminant written before every field value.

use std::fmt;

/// Kind of a tagged value.
///
/// The discriminant is the byte written on the wire and the `"t"` number in
/// JSON documents. Values are stable; never renumber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Kind {
    /// Signed 32-bit integer
    Int32 = 0,
    /// 32-bit floating point
    Float32 = 1,
    /// Signed 64-bit integer
    Int64 = 2,
    /// 64-bit floating point
    Float64 = 3,
    /// Boolean (1 byte)
    Bool = 4,
    /// UTF-8 string
    String = 5,
    /// Three f32 components
    Vector3 = 6,
    /// Two f32 components
    Vector2 = 7,
    /// RGBA, four f32 components
    Color = 8,
    /// Quaternion, four f32 components (x, y, z, w)
    Quaternion = 9,
    /// 100 ns ticks since 0001-01-01
    Timestamp = 10,
    /// Nested record
    Record = 11,
    Int32List = 12,
    Float32List = 13,
    Int64List = 14,
    Float64List = 15,
    BoolList = 16,
    StringList = 17,
    Vector3List = 18,
    Vector2List = 19,
    ColorList = 20,
    QuaternionList = 21,
    TimestampList = 22,
    RecordList = 23,
    /// Absent value, no payload
    Null = 24,
}

impl Kind {
    /// Every kind, in tag order.
    pub const ALL: [Kind; 25] = [
        Self::Int32,
        Self::Float32,
        Self::Int64,
        Self::Float64,
        Self::Bool,
        Self::String,
        Self::Vector3,
        Self::Vector2,
        Self::Color,
        Self::Quaternion,
        Self::Timestamp,
        Self::Record,
        Self::Int32List,
        Self::Float32List,
        Self::Int64List,
        Self::Float64List,
        Self::BoolList,
        Self::StringList,
        Self::Vector3List,
        Self::Vector2List,
        Self::ColorList,
        Self::QuaternionList,
        Self::TimestampList,
        Self::RecordList,
        Self::Null,
    ];

    /// Wire byte for this kind.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Parse a wire byte. Unknown tags return `None`.
    pub const fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::Int32,
            1 => Self::Float32,
            2 => Self::Int64,
            3 => Self::Float64,
            4 => Self::Bool,
            5 => Self::String,
            6 => Self::Vector3,
            7 => Self::Vector2,
            8 => Self::Color,
            9 => Self::Quaternion,
            10 => Self::Timestamp,
            11 => Self::Record,
            12 => Self::Int32List,
            13 => Self::Float32List,
            14 => Self::Int64List,
            15 => Self::Float64List,
            16 => Self::BoolList,
            17 => Self::StringList,
            18 => Self::Vector3List,
            19 => Self::Vector2List,
            20 => Self::ColorList,
            21 => Self::QuaternionList,
            22 => Self::TimestampList,
            23 => Self::RecordList,
            24 => Self::Null,
            _ => return None,
        })
    }

    /// Width in bytes of one payload of this kind, for fixed-width kinds.
    ///
    /// Strings, records, lists and null have no fixed width.
    #[inline]
    pub const fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Bool => Some(1),
            Self::Int32 | Self::Float32 => Some(4),
            Self::Int64 | Self::Float64 | Self::Timestamp | Self::Vector2 => Some(8),
            Self::Vector3 => Some(12),
            Self::Color | Self::Quaternion => Some(16),
            _ => None,
        }
    }

    /// Element kind of a list kind.
    pub const fn element(self) -> Option<Self> {
        match self {
            Self::Int32List => Some(Self::Int32),
            Self::Float32List => Some(Self::Float32),
            Self::Int64List => Some(Self::Int64),
            Self::Float64List => Some(Self::Float64),
            Self::BoolList => Some(Self::Bool),
            Self::StringList => Some(Self::String),
            Self::Vector3List => Some(Self::Vector3),
            Self::Vector2List => Some(Self::Vector2),
            Self::ColorList => Some(Self::Color),
            Self::QuaternionList => Some(Self::Quaternion),
            Self::TimestampList => Some(Self::Timestamp),
            Self::RecordList => Some(Self::Record),
            _ => None,
        }
    }

    /// Returns true for the homogeneous list kinds.
    #[inline]
    pub const fn is_list(self) -> bool {
        self.element().is_some()
    }

    /// Returns true for kinds whose payload is kept as pre-encoded bytes.
    #[inline]
    pub const fn is_encoded(self) -> bool {
        matches!(
            self,
            Self::Vector3 | Self::Vector2 | Self::Color | Self::Quaternion | Self::Timestamp
        )
    }

    /// Display name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int32 => "Int32",
            Self::Float32 => "Float32",
            Self::Int64 => "Int64",
            Self::Float64 => "Float64",
            Self::Bool => "Bool",
            Self::String => "String",
            Self::Vector3 => "Vector3",
            Self::Vector2 => "Vector2",
            Self::Color => "Color",
            Self::Quaternion => "Quaternion",
            Self::Timestamp => "Timestamp",
            Self::Record => "Record",
            Self::Int32List => "Int32List",
            Self::Float32List => "Float32List",
            Self::Int64List => "Int64List",
            Self::Float64List => "Float64List",
            Self::BoolList => "BoolList",
            Self::StringList => "StringList",
            Self::Vector3List => "Vector3List",
            Self::Vector2List => "Vector2List",
            Self::ColorList => "ColorList",
            Self::QuaternionList => "QuaternionList",
            Self::TimestampList => "TimestampList",
            Self::RecordList => "RecordList",
            Self::Null => "Null",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Kind {
    type Error = u8;

    fn try_from(v: u8) -> std::result::Result<Self, u8> {
        Self::from_u8(v).ok_or(v)
    }
}
