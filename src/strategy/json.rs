//! JSON document format.
//!
//! ```json
//! {"fields": {"hp": {"t": 0, "v": 100}, "pos": {"t": 6, "v": [0, 0, 128, 63, ...]}}}
//! ```
//!
//! `t` is the same kind tag as the binary format. Geometric and timestamp
//! payloads are arrays of their encoded bytes, nested records are
//! `{"fields": {...}}` and Null is `"v": null`.

use serde_json::{json, Map, Number, Value};

use super::{utf8, Encryption, SaveFormat, SaveLoadStrategy};
use crate::codec::FixedCodec;
use crate::core::{Kind, Record, TaggedValue};
use crate::util::{Error, Result, Timestamp};

/// JSON text, encrypted with the text form of the cipher.
#[derive(Debug, Clone, Copy)]
pub struct JsonStrategy {
    pub pretty: bool,
}

impl Default for JsonStrategy {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl SaveLoadStrategy for JsonStrategy {
    fn format(&self) -> SaveFormat {
        SaveFormat::Json
    }

    fn encode(&self, record: &Record, encryption: &Encryption<'_>) -> Result<Vec<u8>> {
        let doc = record_to_json(record)?;
        let text = if self.pretty {
            serde_json::to_string_pretty(&doc)?
        } else {
            serde_json::to_string(&doc)?
        };
        Ok(encryption.encrypt_text(text)?.into_bytes())
    }

    fn decode(&self, bytes: &[u8], encryption: &Encryption<'_>) -> Result<Record> {
        let text = encryption.decrypt_text(utf8(bytes)?)?;
        let doc: Value = serde_json::from_str(&text)
            .map_err(|e| Error::corrupt(format!("invalid JSON: {e}")))?;
        record_from_json(&doc)
    }
}

/// Convert a record to its JSON document form.
pub fn record_to_json(record: &Record) -> Result<Value> {
    let mut fields = Map::with_capacity(record.len());
    for (name, value) in record.iter() {
        let entry = json!({ "t": value.kind().as_u8(), "v": value_to_json(value)? });
        fields.insert(name.to_owned(), entry);
    }
    Ok(json!({ "fields": fields }))
}

fn float(v: f64) -> Result<Value> {
    Number::from_f64(v)
        .map(Value::Number)
        .ok_or_else(|| Error::other(format!("non-finite float {v} cannot be stored as JSON")))
}

fn bytes(b: &[u8]) -> Value {
    Value::Array(b.iter().map(|x| Value::from(*x)).collect())
}

fn array<T>(items: &[T], f: impl Fn(&T) -> Result<Value>) -> Result<Value> {
    items.iter().map(f).collect::<Result<Vec<_>>>().map(Value::Array)
}

fn value_to_json(value: &TaggedValue) -> Result<Value> {
    use TaggedValue as T;
    let out = match value {
        T::Int32(v) => Value::from(*v),
        T::Float32(v) => float(f64::from(*v))?,
        T::Int64(v) => Value::from(*v),
        T::Float64(v) => float(*v)?,
        T::Bool(v) => Value::from(*v),
        T::String(s) => Value::from(s.as_str()),
        T::Vector3(b) => bytes(b),
        T::Vector2(b) => bytes(b),
        T::Color(b) => bytes(b),
        T::Quaternion(b) => bytes(b),
        T::Timestamp(b) => bytes(b),
        T::Record(r) => record_to_json(r)?,
        T::Int32List(v) => array(v, |x| Ok(Value::from(*x)))?,
        T::Float32List(v) => array(v, |x| float(f64::from(*x)))?,
        T::Int64List(v) => array(v, |x| Ok(Value::from(*x)))?,
        T::Float64List(v) => array(v, |x| float(*x))?,
        T::BoolList(v) => array(v, |x| Ok(Value::from(*x)))?,
        T::StringList(v) => array(v, |x| Ok(Value::from(x.as_str())))?,
        T::Vector3List(v) => array(v, |b| Ok(bytes(b)))?,
        T::Vector2List(v) => array(v, |b| Ok(bytes(b)))?,
        T::ColorList(v) => array(v, |b| Ok(bytes(b)))?,
        T::QuaternionList(v) => array(v, |b| Ok(bytes(b)))?,
        T::TimestampList(v) => array(v, |b| Ok(bytes(b)))?,
        T::RecordList(v) => array(v, record_to_json)?,
        T::Null => Value::Null,
    };
    Ok(out)
}

/// Parse a JSON document produced by [`record_to_json`].
pub fn record_from_json(doc: &Value) -> Result<Record> {
    let fields = doc
        .get("fields")
        .and_then(Value::as_object)
        .ok_or_else(|| Error::corrupt("expected an object with a \"fields\" map"))?;
    let mut record = Record::with_capacity(fields.len());
    for (name, entry) in fields {
        let value = tagged_from_json(name, entry)?;
        record.push_raw(name.clone(), value);
    }
    Ok(record)
}

fn as_i32(v: &Value) -> Option<i32> {
    v.as_i64().and_then(|n| i32::try_from(n).ok())
}

fn as_f32(v: &Value) -> Option<f32> {
    v.as_f64().map(|x| x as f32)
}

fn as_string(v: &Value) -> Option<String> {
    v.as_str().map(str::to_owned)
}

fn as_bytes<const N: usize>(v: &Value) -> Option<[u8; N]> {
    let items = v.as_array()?;
    if items.len() != N {
        return None;
    }
    let mut out = [0u8; N];
    for (o, x) in out.iter_mut().zip(items) {
        *o = u8::try_from(x.as_u64()?).ok()?;
    }
    Some(out)
}

fn as_timestamp(v: &Value) -> Option<[u8; 8]> {
    let b = as_bytes::<8>(v)?;
    Timestamp::read_le(&b).ok()?;
    Some(b)
}

fn list<T>(v: &Value, f: impl Fn(&Value) -> Option<T>) -> Option<Vec<T>> {
    v.as_array()?.iter().map(f).collect()
}

fn tagged_from_json(name: &str, entry: &Value) -> Result<TaggedValue> {
    use TaggedValue as T;

    let tag = entry
        .get("t")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::corrupt(format!("field '{name}': missing kind tag")))?;
    let kind = u8::try_from(tag)
        .ok()
        .and_then(Kind::from_u8)
        .ok_or_else(|| Error::corrupt(format!("field '{name}': unknown kind tag {tag}")))?;
    let v = entry.get("v").unwrap_or(&Value::Null);

    let parsed = match kind {
        Kind::Int32 => as_i32(v).map(T::Int32),
        Kind::Float32 => as_f32(v).map(T::Float32),
        Kind::Int64 => v.as_i64().map(T::Int64),
        Kind::Float64 => v.as_f64().map(T::Float64),
        Kind::Bool => v.as_bool().map(T::Bool),
        Kind::String => as_string(v).map(T::String),
        Kind::Vector3 => as_bytes(v).map(T::Vector3),
        Kind::Vector2 => as_bytes(v).map(T::Vector2),
        Kind::Color => as_bytes(v).map(T::Color),
        Kind::Quaternion => as_bytes(v).map(T::Quaternion),
        Kind::Timestamp => as_timestamp(v).map(T::Timestamp),
        Kind::Record => Some(T::Record(record_from_json(v)?)),
        Kind::Int32List => list(v, as_i32).map(T::Int32List),
        Kind::Float32List => list(v, as_f32).map(T::Float32List),
        Kind::Int64List => list(v, Value::as_i64).map(T::Int64List),
        Kind::Float64List => list(v, Value::as_f64).map(T::Float64List),
        Kind::BoolList => list(v, Value::as_bool).map(T::BoolList),
        Kind::StringList => list(v, as_string).map(T::StringList),
        Kind::Vector3List => list(v, as_bytes).map(T::Vector3List),
        Kind::Vector2List => list(v, as_bytes).map(T::Vector2List),
        Kind::ColorList => list(v, as_bytes).map(T::ColorList),
        Kind::QuaternionList => list(v, as_bytes).map(T::QuaternionList),
        Kind::TimestampList => list(v, as_timestamp).map(T::TimestampList),
        Kind::RecordList => match v.as_array() {
            Some(items) => Some(T::RecordList(
                items.iter().map(record_from_json).collect::<Result<_>>()?,
            )),
            None => None,
        },
        Kind::Null => v.is_null().then_some(T::Null),
    };
    parsed.ok_or_else(|| Error::corrupt(format!("field '{name}': value does not match kind {kind}")))
}
