//! Utility types shared across the library.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Value types ([`Vec2`], [`Vec3`], [`Quat`], [`Color`], [`Timestamp`])

mod error;
mod math;

pub use error::*;
pub use math::*;
