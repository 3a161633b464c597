//! Tagged values - a kind plus a payload of matching shape.

use serde::Serialize;
use std::any::Any;

use super::{Kind, Record};
use crate::codec::value::{from_array, to_array};
use crate::util::{Color, Error, Quat, Result, Timestamp, Vec2, Vec3};

/// Pre-encoded [`Vec3`] payload.
pub type Vector3Bytes = [u8; 12];
/// Pre-encoded [`Vec2`] payload.
pub type Vector2Bytes = [u8; 8];
/// Pre-encoded [`Color`] payload.
pub type ColorBytes = [u8; 16];
/// Pre-encoded [`Quat`] payload.
pub type QuaternionBytes = [u8; 16];
/// Pre-encoded [`Timestamp`] payload (i64 ticks).
pub type TimestampBytes = [u8; 8];

/// A value together with its kind.
///
/// Geometric and timestamp kinds keep their payload as fixed-width
/// little-endian bytes so every codec moves them around verbatim.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum TaggedValue {
    Int32(i32),
    Float32(f32),
    Int64(i64),
    Float64(f64),
    Bool(bool),
    String(String),
    Vector3(Vector3Bytes),
    Vector2(Vector2Bytes),
    Color(ColorBytes),
    Quaternion(QuaternionBytes),
    Timestamp(TimestampBytes),
    Record(Record),
    Int32List(Vec<i32>),
    Float32List(Vec<f32>),
    Int64List(Vec<i64>),
    Float64List(Vec<f64>),
    BoolList(Vec<bool>),
    StringList(Vec<String>),
    Vector3List(Vec<Vector3Bytes>),
    Vector2List(Vec<Vector2Bytes>),
    ColorList(Vec<ColorBytes>),
    QuaternionList(Vec<QuaternionBytes>),
    TimestampList(Vec<TimestampBytes>),
    RecordList(Vec<Record>),
    Null,
}

impl TaggedValue {
    /// Kind tag of this value.
    pub fn kind(&self) -> Kind {
        // No wildcard arm: a new variant must be given a kind here.
        match self {
            Self::Int32(_) => Kind::Int32,
            Self::Float32(_) => Kind::Float32,
            Self::Int64(_) => Kind::Int64,
            Self::Float64(_) => Kind::Float64,
            Self::Bool(_) => Kind::Bool,
            Self::String(_) => Kind::String,
            Self::Vector3(_) => Kind::Vector3,
            Self::Vector2(_) => Kind::Vector2,
            Self::Color(_) => Kind::Color,
            Self::Quaternion(_) => Kind::Quaternion,
            Self::Timestamp(_) => Kind::Timestamp,
            Self::Record(_) => Kind::Record,
            Self::Int32List(_) => Kind::Int32List,
            Self::Float32List(_) => Kind::Float32List,
            Self::Int64List(_) => Kind::Int64List,
            Self::Float64List(_) => Kind::Float64List,
            Self::BoolList(_) => Kind::BoolList,
            Self::StringList(_) => Kind::StringList,
            Self::Vector3List(_) => Kind::Vector3List,
            Self::Vector2List(_) => Kind::Vector2List,
            Self::ColorList(_) => Kind::ColorList,
            Self::QuaternionList(_) => Kind::QuaternionList,
            Self::TimestampList(_) => Kind::TimestampList,
            Self::RecordList(_) => Kind::RecordList,
            Self::Null => Kind::Null,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Wrap a runtime-typed value.
    ///
    /// Fails with [`Error::UnsupportedType`] when the concrete type has no
    /// kind mapping. `()` maps to [`TaggedValue::Null`].
    pub fn from_any(value: &dyn Any) -> Result<Self> {
        macro_rules! try_cast {
            ($($ty:ty),* $(,)?) => {
                $(
                    if let Some(v) = value.downcast_ref::<$ty>() {
                        return Ok(v.clone().into_value());
                    }
                )*
            };
        }

        try_cast!(
            i32, f32, i64, f64, bool, String, Vec2, Vec3, Color, Quat, Timestamp, Record,
            Vec<i32>, Vec<f32>, Vec<i64>, Vec<f64>, Vec<bool>, Vec<String>,
            Vec<Vec2>, Vec<Vec3>, Vec<Color>, Vec<Quat>, Vec<Timestamp>, Vec<Record>,
            Option<String>,
        );
        if let Some(s) = value.downcast_ref::<&'static str>() {
            return Ok(Self::String((*s).to_owned()));
        }
        if value.is::<()>() {
            return Ok(Self::Null);
        }
        if let Some(v) = value.downcast_ref::<TaggedValue>() {
            return Ok(v.clone());
        }
        Err(Error::UnsupportedType(format!(
            "no kind mapping for value with {:?}",
            value.type_id()
        )))
    }
}

/// Types that can be written into a record field.
pub trait IntoValue {
    fn into_value(self) -> TaggedValue;
}

/// Types that can be read back out of a record field.
pub trait FromValue: Sized {
    /// Kind this type is stored as.
    const KIND: Kind;

    /// Extract from a value of matching kind; `None` on mismatch.
    fn from_value(value: &TaggedValue) -> Option<Self>;
}

impl IntoValue for TaggedValue {
    fn into_value(self) -> TaggedValue {
        self
    }
}

// Scalars and lists of scalars, stored natively.
macro_rules! impl_native {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> TaggedValue {
                    TaggedValue::$variant(self)
                }
            }

            impl FromValue for $ty {
                const KIND: Kind = Kind::$variant;

                fn from_value(value: &TaggedValue) -> Option<Self> {
                    match value {
                        TaggedValue::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_native!(
    i32 => Int32,
    f32 => Float32,
    i64 => Int64,
    f64 => Float64,
    bool => Bool,
    String => String,
    Record => Record,
    Vec<i32> => Int32List,
    Vec<f32> => Float32List,
    Vec<i64> => Int64List,
    Vec<f64> => Float64List,
    Vec<bool> => BoolList,
    Vec<String> => StringList,
    Vec<Record> => RecordList,
);

// Geometric and timestamp types, stored pre-encoded.
macro_rules! impl_encoded {
    ($($ty:ty => $variant:ident, $list:ident, $n:literal);* $(;)?) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> TaggedValue {
                    TaggedValue::$variant(to_array::<$ty, $n>(&self))
                }
            }

            impl FromValue for $ty {
                const KIND: Kind = Kind::$variant;

                fn from_value(value: &TaggedValue) -> Option<Self> {
                    match value {
                        TaggedValue::$variant(bytes) => from_array::<$ty, $n>(bytes).ok(),
                        _ => None,
                    }
                }
            }

            impl IntoValue for Vec<$ty> {
                fn into_value(self) -> TaggedValue {
                    TaggedValue::$list(self.iter().map(to_array::<$ty, $n>).collect())
                }
            }

            impl FromValue for Vec<$ty> {
                const KIND: Kind = Kind::$list;

                fn from_value(value: &TaggedValue) -> Option<Self> {
                    match value {
                        TaggedValue::$list(items) => items
                            .iter()
                            .map(|bytes| from_array::<$ty, $n>(bytes).ok())
                            .collect(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_encoded!(
    Vec3 => Vector3, Vector3List, 12;
    Vec2 => Vector2, Vector2List, 8;
    Color => Color, ColorList, 16;
    Quat => Quaternion, QuaternionList, 16;
    Timestamp => Timestamp, TimestampList, 8;
);

impl IntoValue for &str {
    fn into_value(self) -> TaggedValue {
        TaggedValue::String(self.to_owned())
    }
}

impl IntoValue for &Record {
    fn into_value(self) -> TaggedValue {
        TaggedValue::Record(self.clone())
    }
}

/// `None` is stored as [`TaggedValue::Null`].
impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> TaggedValue {
        match self {
            Some(v) => v.into_value(),
            None => TaggedValue::Null,
        }
    }
}

/// A Null field reads as `Some(None)`.
impl<T: FromValue> FromValue for Option<T> {
    const KIND: Kind = T::KIND;

    fn from_value(value: &TaggedValue) -> Option<Self> {
        match value {
            TaggedValue::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(5i32.into_value().kind(), Kind::Int32);
        assert_eq!("x".into_value().kind(), Kind::String);
        assert_eq!(Vec3::X.into_value().kind(), Kind::Vector3);
        assert_eq!(vec![Quat::IDENTITY].into_value().kind(), Kind::QuaternionList);
        assert_eq!(Record::new().into_value().kind(), Kind::Record);
        assert_eq!(None::<String>.into_value().kind(), Kind::Null);
    }

    #[test]
    fn test_every_kind_has_a_variant() {
        let samples = vec![
            TaggedValue::Int32(0),
            TaggedValue::Float32(0.0),
            TaggedValue::Int64(0),
            TaggedValue::Float64(0.0),
            TaggedValue::Bool(false),
            TaggedValue::String(String::new()),
            TaggedValue::Vector3([0; 12]),
            TaggedValue::Vector2([0; 8]),
            TaggedValue::Color([0; 16]),
            TaggedValue::Quaternion([0; 16]),
            TaggedValue::Timestamp([0; 8]),
            TaggedValue::Record(Record::new()),
            TaggedValue::Int32List(vec![]),
            TaggedValue::Float32List(vec![]),
            TaggedValue::Int64List(vec![]),
            TaggedValue::Float64List(vec![]),
            TaggedValue::BoolList(vec![]),
            TaggedValue::StringList(vec![]),
            TaggedValue::Vector3List(vec![]),
            TaggedValue::Vector2List(vec![]),
            TaggedValue::ColorList(vec![]),
            TaggedValue::QuaternionList(vec![]),
            TaggedValue::TimestampList(vec![]),
            TaggedValue::RecordList(vec![]),
            TaggedValue::Null,
        ];
        let kinds: Vec<Kind> = samples.iter().map(TaggedValue::kind).collect();
        assert_eq!(kinds, Kind::ALL.to_vec());
    }

    #[test]
    fn test_encoded_payloads() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        match v.into_value() {
            TaggedValue::Vector3(bytes) => assert_eq!(&bytes[..4], &1.0f32.to_le_bytes()),
            other => panic!("unexpected {other:?}"),
        }
        let ts = datetime!(2021-06-01 12:00);
        assert_eq!(Timestamp::from_value(&ts.into_value()), Some(ts));
        let colors = vec![Color::WHITE, Color::BLACK];
        assert_eq!(Vec::<Color>::from_value(&colors.clone().into_value()), Some(colors));
    }

    #[test]
    fn test_mismatch_is_none() {
        assert_eq!(i32::from_value(&TaggedValue::Int64(1)), None);
        assert_eq!(Vec2::from_value(&TaggedValue::Null), None);
    }

    #[test]
    fn test_option_null() {
        assert_eq!(Option::<i32>::from_value(&TaggedValue::Null), Some(None));
        assert_eq!(Option::<i32>::from_value(&TaggedValue::Int32(3)), Some(Some(3)));
        assert_eq!(Option::<i32>::from_value(&TaggedValue::Bool(true)), None);
    }

    #[test]
    fn test_from_any() {
        let n: i32 = 42;
        assert_eq!(TaggedValue::from_any(&n).unwrap(), TaggedValue::Int32(42));
        let s: &'static str = "hi";
        assert_eq!(TaggedValue::from_any(&s).unwrap(), TaggedValue::String("hi".into()));
        assert_eq!(TaggedValue::from_any(&()).unwrap(), TaggedValue::Null);
        let none: Option<String> = None;
        assert_eq!(TaggedValue::from_any(&none).unwrap(), TaggedValue::Null);

        let unsupported: u16 = 7;
        let err = TaggedValue::from_any(&unsupported).unwrap_err();
        assert!(matches!(err, Error::UnsupportedType(_)));
    }
}
