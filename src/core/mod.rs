//! Core data model.
//!
//! This module provides:
//! - [`Kind`] - Single-byte kind tags
//! - [`TaggedValue`] - Value plus kind, the unit of the wire format
//! - [`Record`] - Ordered table of named values, nestable
//! - [`Savable`] - Trait for host objects that convert to and from records

mod de;
mod kind;
mod record;
mod traits;
mod value;

pub use kind::Kind;
pub use record::Record;
pub use traits::Savable;
pub use value::{
    ColorBytes, FromValue, IntoValue, QuaternionBytes, TaggedValue, TimestampBytes,
    Vector2Bytes, Vector3Bytes,
};
