//! # saveload
//!
//! Persist runtime-typed application records to disk.
//!
//! A [`Record`] is an ordered table of named, tagged values: scalars,
//! strings, vectors, colors, quaternions, timestamps, nested records and
//! homogeneous lists of each. Records are written in one of three formats
//! (tagged binary, JSON or serde/bincode) with optional encryption, either
//! on the calling thread or through a scheduler that serializes work per
//! save slot.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math types, timestamps
//! - [`core`] - Kinds, tagged values, records, the `Savable` trait
//! - [`codec`] - Fixed-width value codec and the tagged binary format
//! - [`cipher`] - XOR, Caesar and AES ciphers and their registry
//! - [`strategy`] - Save formats and their registry
//! - [`ops`] - Operations and the per-resource scheduler
//! - [`config`] - Manager configuration and storage host
//! - [`manager`] - The `SaveLoadManager` facade
//!
//! ## Example
//!
//! ```ignore
//! use saveload::prelude::*;
//!
//! let manager = SaveLoadManager::new(ManagerConfig::default())?;
//!
//! let mut record = Record::new();
//! record.write("level", 3i32)?;
//! record.write("position", Vec3::new(1.0, 0.0, 2.0))?;
//!
//! let options = SaveOptions::new(SaveFormat::Custom).encrypted(EncryptionMode::Aes);
//! manager.save(&record, "slot1", &options)?;
//!
//! let loaded = manager.load("slot1", &options)?.expect("save exists");
//! assert_eq!(loaded.read::<i32>("level")?, 3);
//! ```

pub mod cipher;
pub mod codec;
pub mod config;
pub mod core;
pub mod manager;
pub mod ops;
pub mod strategy;
pub mod util;

// Re-export commonly used types
pub use cipher::{Cipher, CipherRegistry, EncryptionMode};
pub use config::{DefaultHost, ManagerConfig, StorageHost};
pub use core::{FromValue, IntoValue, Kind, Record, Savable, TaggedValue};
pub use manager::{SaveLoadManager, SaveOptions};
pub use ops::{OperationHandle, OperationStatus, ResourceKey, Scheduler};
pub use strategy::{FormatRegistry, SaveFormat, SaveLoadStrategy};
pub use util::{Error, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cipher::EncryptionMode;
    pub use crate::config::ManagerConfig;
    pub use crate::core::{Record, Savable, TaggedValue};
    pub use crate::manager::{SaveLoadManager, SaveOptions};
    pub use crate::ops::{OperationHandle, OperationStatus};
    pub use crate::strategy::SaveFormat;
    pub use crate::util::{Color, Error, Quat, Result, Timestamp, Vec2, Vec3};
}
