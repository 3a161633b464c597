//! Byte-level encoding.
//!
//! - [`value`] - Fixed-width little-endian forms of scalars and geometric types
//! - [`stream`] - Cursor-style writer and bounds-checked reader
//! - [`serialize`] / [`deserialize`] - The tagged binary record format

pub mod stream;
pub mod value;
mod binary;

pub use binary::{deserialize, serialize, MAX_DEPTH};
pub use stream::{ByteReader, ByteWriter};
pub use value::FixedCodec;
