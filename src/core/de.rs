//! serde support for records.
//!
//! Deserialization goes through seeds that carry the nesting depth, so a
//! hostile document cannot recurse past [`MAX_DEPTH`]. Repeated field names
//! and out-of-range timestamp payloads are rejected the same way the binary
//! codec rejects them.

use serde::de::{self, DeserializeSeed, EnumAccess, SeqAccess, Unexpected, VariantAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::{Kind, Record, TaggedValue, TimestampBytes};
use crate::codec::{FixedCodec, MAX_DEPTH};
use crate::util::Timestamp;

/// Variant names of [`TaggedValue`], in declaration order.
const VARIANTS: &[&str] = &[
    "Int32",
    "Float32",
    "Int64",
    "Float64",
    "Bool",
    "String",
    "Vector3",
    "Vector2",
    "Color",
    "Quaternion",
    "Timestamp",
    "Record",
    "Int32List",
    "Float32List",
    "Int64List",
    "Float64List",
    "BoolList",
    "StringList",
    "Vector3List",
    "Vector2List",
    "ColorList",
    "QuaternionList",
    "TimestampList",
    "RecordList",
    "Null",
];

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RecordSeed { depth: 0 }.deserialize(deserializer)
    }
}

impl<'de> Deserialize<'de> for TaggedValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        ValueSeed { depth: 0 }.deserialize(deserializer)
    }
}

#[derive(Clone, Copy)]
struct RecordSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for RecordSeed {
    type Value = Record;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Record, D::Error> {
        if self.depth > MAX_DEPTH {
            return Err(de::Error::custom(format_args!(
                "record nesting deeper than {MAX_DEPTH}"
            )));
        }
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for RecordSeed {
    type Value = Record;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a sequence of (name, value) fields")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Record, A::Error> {
        // Cap the preallocation; the length comes from untrusted input.
        let mut record = Record::with_capacity(seq.size_hint().unwrap_or(0).min(1024));
        while let Some((name, value)) = seq.next_element_seed(FieldSeed { depth: self.depth })? {
            if record.contains(&name) {
                return Err(de::Error::custom(format_args!("duplicate field '{name}'")));
            }
            record.push_raw(name, value);
        }
        Ok(record)
    }
}

#[derive(Clone, Copy)]
struct FieldSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for FieldSeed {
    type Value = (String, TaggedValue);

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_tuple(2, self)
    }
}

impl<'de> Visitor<'de> for FieldSeed {
    type Value = (String, TaggedValue);

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a (name, value) pair")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let name: String = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let value = seq
            .next_element_seed(ValueSeed { depth: self.depth })?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        Ok((name, value))
    }
}

#[derive(Clone, Copy)]
struct RecordListSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for RecordListSeed {
    type Value = Vec<Record>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Vec<Record>, D::Error> {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for RecordListSeed {
    type Value = Vec<Record>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a sequence of records")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<Record>, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1024));
        while let Some(record) = seq.next_element_seed(RecordSeed { depth: self.depth })? {
            items.push(record);
        }
        Ok(items)
    }
}

/// Variant identifier, by index or by name.
struct VariantKind(Kind);

impl<'de> Deserialize<'de> for VariantKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_identifier(VariantVisitor)
    }
}

struct VariantVisitor;

impl<'de> Visitor<'de> for VariantVisitor {
    type Value = VariantKind;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a tagged value variant")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<VariantKind, E> {
        usize::try_from(v)
            .ok()
            .and_then(|i| Kind::ALL.get(i).copied())
            .map(VariantKind)
            .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<VariantKind, E> {
        VARIANTS
            .iter()
            .position(|name| *name == v)
            .map(|i| VariantKind(Kind::ALL[i]))
            .ok_or_else(|| E::unknown_variant(v, VARIANTS))
    }
}

#[derive(Clone, Copy)]
struct ValueSeed {
    depth: usize,
}

impl<'de> DeserializeSeed<'de> for ValueSeed {
    type Value = TaggedValue;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<TaggedValue, D::Error> {
        deserializer.deserialize_enum("TaggedValue", VARIANTS, self)
    }
}

fn checked_timestamp<E: de::Error>(bytes: TimestampBytes) -> Result<TimestampBytes, E> {
    Timestamp::read_le(&bytes).map_err(E::custom)?;
    Ok(bytes)
}

impl<'de> Visitor<'de> for ValueSeed {
    type Value = TaggedValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a tagged value")
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<TaggedValue, A::Error> {
        use TaggedValue as T;

        let (VariantKind(kind), variant) = data.variant()?;
        let nested = self.depth + 1;
        let value = match kind {
            Kind::Int32 => T::Int32(variant.newtype_variant()?),
            Kind::Float32 => T::Float32(variant.newtype_variant()?),
            Kind::Int64 => T::Int64(variant.newtype_variant()?),
            Kind::Float64 => T::Float64(variant.newtype_variant()?),
            Kind::Bool => T::Bool(variant.newtype_variant()?),
            Kind::String => T::String(variant.newtype_variant()?),
            Kind::Vector3 => T::Vector3(variant.newtype_variant()?),
            Kind::Vector2 => T::Vector2(variant.newtype_variant()?),
            Kind::Color => T::Color(variant.newtype_variant()?),
            Kind::Quaternion => T::Quaternion(variant.newtype_variant()?),
            Kind::Timestamp => {
                T::Timestamp(checked_timestamp::<A::Error>(variant.newtype_variant()?)?)
            },
            Kind::Record => T::Record(variant.newtype_variant_seed(RecordSeed { depth: nested })?),
            Kind::Int32List => T::Int32List(variant.newtype_variant()?),
            Kind::Float32List => T::Float32List(variant.newtype_variant()?),
            Kind::Int64List => T::Int64List(variant.newtype_variant()?),
            Kind::Float64List => T::Float64List(variant.newtype_variant()?),
            Kind::BoolList => T::BoolList(variant.newtype_variant()?),
            Kind::StringList => T::StringList(variant.newtype_variant()?),
            Kind::Vector3List => T::Vector3List(variant.newtype_variant()?),
            Kind::Vector2List => T::Vector2List(variant.newtype_variant()?),
            Kind::ColorList => T::ColorList(variant.newtype_variant()?),
            Kind::QuaternionList => T::QuaternionList(variant.newtype_variant()?),
            Kind::TimestampList => {
                let items: Vec<TimestampBytes> = variant.newtype_variant()?;
                for bytes in &items {
                    checked_timestamp::<A::Error>(*bytes)?;
                }
                T::TimestampList(items)
            }
            Kind::RecordList => {
                T::RecordList(variant.newtype_variant_seed(RecordListSeed { depth: nested })?)
            }
            Kind::Null => {
                variant.unit_variant()?;
                T::Null
            }
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<T: Serialize>(value: &T) -> Vec<u8> {
        bincode::serde::encode_to_vec(value, bincode::config::standard()).unwrap()
    }

    fn decode(bytes: &[u8]) -> std::result::Result<Record, bincode::error::DecodeError> {
        bincode::serde::decode_from_slice(bytes, bincode::config::standard()).map(|(r, _)| r)
    }

    #[test]
    fn test_variant_names_follow_kinds() {
        assert_eq!(VARIANTS.len(), Kind::ALL.len());
        for (name, kind) in VARIANTS.iter().zip(Kind::ALL) {
            assert_eq!(format!("{kind:?}"), *name);
        }
    }

    #[test]
    fn test_nested_roundtrip() {
        let mut inner = Record::new();
        inner.write("x", 3.5f32).unwrap();
        let mut r = Record::new();
        r.write("child", inner.clone()).unwrap();
        r.write("kids", vec![inner.clone(), inner]).unwrap();
        r.write("none", None::<String>).unwrap();
        assert_eq!(decode(&encode(&r)).unwrap(), r);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let fields = vec![
            ("hp".to_owned(), TaggedValue::Int32(1)),
            ("hp".to_owned(), TaggedValue::Int32(2)),
        ];
        let err = decode(&encode(&fields)).unwrap_err();
        assert!(err.to_string().contains("duplicate field 'hp'"), "{err}");
    }

    #[test]
    fn test_out_of_range_timestamp_rejected() {
        let fields = vec![(
            "at".to_owned(),
            TaggedValue::Timestamp(i64::MAX.to_le_bytes()),
        )];
        assert!(decode(&encode(&fields)).is_err());

        let fields = vec![(
            "log".to_owned(),
            TaggedValue::TimestampList(vec![0i64.to_le_bytes(), i64::MIN.to_le_bytes()]),
        )];
        assert!(decode(&encode(&fields)).is_err());
    }

    #[test]
    fn test_depth_limit() {
        let mut r = Record::new();
        for _ in 0..MAX_DEPTH {
            let mut outer = Record::new();
            outer.write("c", r).unwrap();
            r = outer;
        }
        assert!(decode(&encode(&r)).is_ok());

        let mut outer = Record::new();
        outer.write("c", r).unwrap();
        let err = decode(&encode(&outer)).unwrap_err();
        assert!(err.to_string().contains("nesting deeper"), "{err}");
    }
}
