//! Tagged binary record format.
//!
//! ```text
//! Record      := fieldCount:i32 Field*
//! Field       := nameLen:i32 name:utf8[nameLen] TaggedValue
//! TaggedValue := kind:u8 Payload(kind)
//!
//! Payload(fixed)      := value bytes, see codec::value
//! Payload(String)     := len:i32 utf8[len]
//! Payload(Record)     := byteLen:i32 Record
//! Payload(List of X)  := count:i32 Payload(X)*   (no per-element tag)
//! Payload(RecordList) := count:i32 (byteLen:i32 Record)*
//! Payload(Null)       := <empty>
//! ```
//!
//! All integers are little-endian. Every nested record carries its byte
//! length, and a nested record must consume exactly that many bytes.

use tracing::trace;

use super::stream::{ByteReader, ByteWriter};
use super::value::FixedCodec;
use crate::core::{Kind, Record, TaggedValue};
use crate::util::{Error, Result, Timestamp};

/// Deepest record nesting accepted when decoding.
pub const MAX_DEPTH: usize = 128;

/// Smallest possible encoded field: empty name prefix plus a kind byte.
const MIN_FIELD_BYTES: usize = 4 + 1;

/// Serialize a record into the tagged binary format.
pub fn serialize(record: &Record) -> Result<Vec<u8>> {
    let mut w = ByteWriter::with_capacity(64);
    write_record(&mut w, record)?;
    let bytes = w.into_inner();
    trace!(fields = record.len(), bytes = bytes.len(), "serialized record");
    Ok(bytes)
}

/// Deserialize a record, rejecting truncated input, unknown kind tags,
/// inconsistent lengths and trailing bytes with [`Error::CorruptData`].
pub fn deserialize(bytes: &[u8]) -> Result<Record> {
    let mut r = ByteReader::new(bytes);
    let record = read_record(&mut r, 0)?;
    if !r.is_empty() {
        return Err(Error::corrupt(format!(
            "{} trailing bytes after record at offset {}",
            r.remaining(),
            r.pos()
        )));
    }
    Ok(record)
}

fn write_record(w: &mut ByteWriter, record: &Record) -> Result<()> {
    w.write_len(record.len())?;
    for (name, value) in record.iter() {
        w.write_str(name)?;
        write_value(w, value)?;
    }
    Ok(())
}

fn write_framed_record(w: &mut ByteWriter, record: &Record) -> Result<()> {
    let slot = w.reserve_len();
    write_record(w, record)?;
    w.patch_len(slot)
}

fn write_fixed_list<T: FixedCodec>(w: &mut ByteWriter, items: &[T]) -> Result<()> {
    w.write_len(items.len())?;
    for item in items {
        w.write_fixed(item);
    }
    Ok(())
}

fn write_encoded_list<const N: usize>(w: &mut ByteWriter, items: &[[u8; N]]) -> Result<()> {
    w.write_len(items.len())?;
    for item in items {
        w.write_bytes(item);
    }
    Ok(())
}

fn write_value(w: &mut ByteWriter, value: &TaggedValue) -> Result<()> {
    w.write_u8(value.kind().as_u8());
    match value {
        TaggedValue::Int32(v) => w.write_fixed(v),
        TaggedValue::Float32(v) => w.write_fixed(v),
        TaggedValue::Int64(v) => w.write_fixed(v),
        TaggedValue::Float64(v) => w.write_fixed(v),
        TaggedValue::Bool(v) => w.write_fixed(v),
        TaggedValue::String(s) => w.write_str(s)?,
        TaggedValue::Vector3(b) => w.write_bytes(b),
        TaggedValue::Vector2(b) => w.write_bytes(b),
        TaggedValue::Color(b) => w.write_bytes(b),
        TaggedValue::Quaternion(b) => w.write_bytes(b),
        TaggedValue::Timestamp(b) => w.write_bytes(b),
        TaggedValue::Record(r) => write_framed_record(w, r)?,
        TaggedValue::Int32List(v) => write_fixed_list(w, v)?,
        TaggedValue::Float32List(v) => write_fixed_list(w, v)?,
        TaggedValue::Int64List(v) => write_fixed_list(w, v)?,
        TaggedValue::Float64List(v) => write_fixed_list(w, v)?,
        TaggedValue::BoolList(v) => write_fixed_list(w, v)?,
        TaggedValue::StringList(items) => {
            w.write_len(items.len())?;
            for s in items {
                w.write_str(s)?;
            }
        }
        TaggedValue::Vector3List(v) => write_encoded_list(w, v)?,
        TaggedValue::Vector2List(v) => write_encoded_list(w, v)?,
        TaggedValue::ColorList(v) => write_encoded_list(w, v)?,
        TaggedValue::QuaternionList(v) => write_encoded_list(w, v)?,
        TaggedValue::TimestampList(v) => write_encoded_list(w, v)?,
        TaggedValue::RecordList(items) => {
            w.write_len(items.len())?;
            for r in items {
                write_framed_record(w, r)?;
            }
        }
        TaggedValue::Null => {}
    }
    Ok(())
}

fn read_record(r: &mut ByteReader<'_>, depth: usize) -> Result<Record> {
    if depth > MAX_DEPTH {
        return Err(Error::corrupt(format!(
            "record nesting deeper than {MAX_DEPTH} at offset {}",
            r.pos()
        )));
    }
    let count = r.read_count(MIN_FIELD_BYTES)?;
    let mut record = Record::with_capacity(count);
    for _ in 0..count {
        let at = r.pos();
        let name = r.read_string()?;
        if record.contains(&name) {
            return Err(Error::corrupt(format!(
                "duplicate field '{name}' at offset {at}"
            )));
        }
        let value = read_value(r, depth)?;
        record.push_raw(name, value);
    }
    Ok(record)
}

fn read_framed_record(r: &mut ByteReader<'_>, depth: usize) -> Result<Record> {
    let len = r.read_len()?;
    let mut sub = r.sub_reader(len)?;
    let record = read_record(&mut sub, depth + 1)?;
    if !sub.is_empty() {
        return Err(Error::corrupt(format!(
            "nested record declares {len} bytes but {} are unused at offset {}",
            sub.remaining(),
            sub.pos()
        )));
    }
    Ok(record)
}

fn read_fixed_list<T: FixedCodec>(r: &mut ByteReader<'_>) -> Result<Vec<T>> {
    let count = r.read_count(T::WIDTH)?;
    (0..count).map(|_| r.read_fixed::<T>()).collect()
}

fn read_encoded_list<const N: usize>(r: &mut ByteReader<'_>) -> Result<Vec<[u8; N]>> {
    let count = r.read_count(N)?;
    (0..count).map(|_| r.read_array::<N>()).collect()
}

fn read_timestamp(r: &mut ByteReader<'_>) -> Result<[u8; 8]> {
    let bytes = r.read_array::<8>()?;
    Timestamp::read_le(&bytes)?;
    Ok(bytes)
}

fn read_value(r: &mut ByteReader<'_>, depth: usize) -> Result<TaggedValue> {
    let at = r.pos();
    let tag = r.read_u8()?;
    let kind = Kind::from_u8(tag)
        .ok_or_else(|| Error::corrupt(format!("unknown kind tag {tag} at offset {at}")))?;

    let value = match kind {
        Kind::Int32 => TaggedValue::Int32(r.read_fixed()?),
        Kind::Float32 => TaggedValue::Float32(r.read_fixed()?),
        Kind::Int64 => TaggedValue::Int64(r.read_fixed()?),
        Kind::Float64 => TaggedValue::Float64(r.read_fixed()?),
        Kind::Bool => TaggedValue::Bool(r.read_fixed()?),
        Kind::String => TaggedValue::String(r.read_string()?),
        Kind::Vector3 => TaggedValue::Vector3(r.read_array()?),
        Kind::Vector2 => TaggedValue::Vector2(r.read_array()?),
        Kind::Color => TaggedValue::Color(r.read_array()?),
        Kind::Quaternion => TaggedValue::Quaternion(r.read_array()?),
        Kind::Timestamp => TaggedValue::Timestamp(read_timestamp(r)?),
        Kind::Record => TaggedValue::Record(read_framed_record(r, depth)?),
        Kind::Int32List => TaggedValue::Int32List(read_fixed_list(r)?),
        Kind::Float32List => TaggedValue::Float32List(read_fixed_list(r)?),
        Kind::Int64List => TaggedValue::Int64List(read_fixed_list(r)?),
        Kind::Float64List => TaggedValue::Float64List(read_fixed_list(r)?),
        Kind::BoolList => TaggedValue::BoolList(read_fixed_list(r)?),
        Kind::StringList => {
            let count = r.read_count(4)?;
            let items = (0..count)
                .map(|_| r.read_string())
                .collect::<Result<Vec<_>>>()?;
            TaggedValue::StringList(items)
        }
        Kind::Vector3List => TaggedValue::Vector3List(read_encoded_list(r)?),
        Kind::Vector2List => TaggedValue::Vector2List(read_encoded_list(r)?),
        Kind::ColorList => TaggedValue::ColorList(read_encoded_list(r)?),
        Kind::QuaternionList => TaggedValue::QuaternionList(read_encoded_list(r)?),
        Kind::TimestampList => {
            let count = r.read_count(8)?;
            let items = (0..count)
                .map(|_| read_timestamp(r))
                .collect::<Result<Vec<_>>>()?;
            TaggedValue::TimestampList(items)
        }
        Kind::RecordList => {
            // Each element is at least a length prefix plus a field count.
            let count = r.read_count(8)?;
            let items = (0..count)
                .map(|_| read_framed_record(r, depth))
                .collect::<Result<Vec<_>>>()?;
            TaggedValue::RecordList(items)
        }
        Kind::Null => TaggedValue::Null,
    };
    Ok(value)
}
