//! Shared helpers for integration tests.

#![allow(dead_code)]

use proptest::prelude::*;
use saveload::{Record, TaggedValue};
use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness. Set `RUST_LOG` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Largest tick count generated: roughly the year 9500.
const MAX_TICKS: i64 = 3_000_000_000_000_000_000;

fn finite_f32() -> impl Strategy<Value = f32> {
    -1.0e6f32..1.0e6f32
}

fn finite_f64() -> impl Strategy<Value = f64> {
    -1.0e12f64..1.0e12f64
}

fn ticks() -> impl Strategy<Value = [u8; 8]> {
    (0..MAX_TICKS).prop_map(i64::to_le_bytes)
}

fn floats<const N: usize>() -> impl Strategy<Value = [u8; N]> {
    prop::collection::vec(finite_f32(), N / 4).prop_map(|fs| {
        let mut out = [0u8; N];
        for (chunk, f) in out.chunks_exact_mut(4).zip(fs) {
            chunk.copy_from_slice(&f.to_le_bytes());
        }
        out
    })
}

fn scalar() -> impl Strategy<Value = TaggedValue> {
    prop_oneof![
        any::<i32>().prop_map(TaggedValue::Int32),
        finite_f32().prop_map(TaggedValue::Float32),
        any::<i64>().prop_map(TaggedValue::Int64),
        finite_f64().prop_map(TaggedValue::Float64),
        any::<bool>().prop_map(TaggedValue::Bool),
        ".{0,12}".prop_map(TaggedValue::String),
        floats::<12>().prop_map(TaggedValue::Vector3),
        floats::<8>().prop_map(TaggedValue::Vector2),
        floats::<16>().prop_map(TaggedValue::Color),
        floats::<16>().prop_map(TaggedValue::Quaternion),
    ]
}

fn list() -> impl Strategy<Value = TaggedValue> {
    use prop::collection::vec;
    prop_oneof![
        ticks().prop_map(TaggedValue::Timestamp),
        vec(any::<i32>(), 0..6).prop_map(TaggedValue::Int32List),
        vec(finite_f32(), 0..6).prop_map(TaggedValue::Float32List),
        vec(any::<i64>(), 0..6).prop_map(TaggedValue::Int64List),
        vec(finite_f64(), 0..6).prop_map(TaggedValue::Float64List),
        vec(any::<bool>(), 0..6).prop_map(TaggedValue::BoolList),
        vec(".{0,6}", 0..4).prop_map(TaggedValue::StringList),
        vec(floats::<12>(), 0..4).prop_map(TaggedValue::Vector3List),
        vec(floats::<8>(), 0..4).prop_map(TaggedValue::Vector2List),
        Just(TaggedValue::Null),
    ]
}

fn encoded_list() -> impl Strategy<Value = TaggedValue> {
    use prop::collection::vec;
    prop_oneof![
        vec(floats::<16>(), 0..4).prop_map(TaggedValue::ColorList),
        vec(floats::<16>(), 0..4).prop_map(TaggedValue::QuaternionList),
        vec(ticks(), 0..4).prop_map(TaggedValue::TimestampList),
    ]
}

fn record_of(values: impl Strategy<Value = TaggedValue>) -> impl Strategy<Value = Record> {
    prop::collection::vec(("[a-z_]{1,8}", values), 0..6).prop_map(|fields| {
        let mut record = Record::new();
        for (name, value) in fields {
            record.update(name, value);
        }
        record
    })
}

/// Any tagged value, nested records included.
pub fn tagged_value() -> impl Strategy<Value = TaggedValue> {
    let leaf = prop_oneof![4 => scalar(), 3 => list(), 1 => encoded_list()];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            record_of(inner.clone()).prop_map(TaggedValue::Record),
            prop::collection::vec(record_of(inner), 0..3).prop_map(TaggedValue::RecordList),
        ]
    })
}

/// Any record, nested records included.
pub fn record() -> impl Strategy<Value = Record> {
    record_of(tagged_value())
}
