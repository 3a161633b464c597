//! Save formats.
//!
//! A [`SaveLoadStrategy`] turns a [`Record`] into the bytes of a file and
//! back, applying the requested [`Encryption`] along the way.

mod custom;
mod json;
mod native;

pub use custom::CustomStrategy;
pub use json::{record_from_json, record_to_json, JsonStrategy};
pub use native::NativeStrategy;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::cipher::{CipherRegistry, EncryptionMode};
use crate::core::Record;
use crate::util::{Error, Result};

/// On-disk format of a save file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum SaveFormat {
    /// Tagged binary record format.
    #[default]
    Custom = 0,
    Json = 1,
    /// serde + bincode, base64 text on disk.
    Native = 2,
}

impl SaveFormat {
    pub const ALL: [SaveFormat; 3] = [SaveFormat::Custom, SaveFormat::Json, SaveFormat::Native];

    /// File extension including the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Custom => ".cus",
            Self::Json => ".json",
            Self::Native => ".bin",
        }
    }
}

impl fmt::Display for SaveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Custom => "custom",
            Self::Json => "json",
            Self::Native => "native",
        };
        f.write_str(name)
    }
}

/// Cipher selection for one encode or decode.
#[derive(Clone, Copy)]
pub struct Encryption<'a> {
    pub ciphers: &'a CipherRegistry,
    pub mode: EncryptionMode,
    pub key: &'a str,
}

impl<'a> Encryption<'a> {
    pub fn new(ciphers: &'a CipherRegistry, mode: EncryptionMode, key: &'a str) -> Self {
        Self { ciphers, mode, key }
    }

    pub fn encrypt_bytes(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        self.ciphers.encrypt_bytes(self.mode, data, self.key)
    }

    pub fn decrypt_bytes(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        self.ciphers.decrypt_bytes(self.mode, data, self.key)
    }

    pub fn encrypt_text(&self, text: String) -> Result<String> {
        self.ciphers.encrypt_text(self.mode, text, self.key)
    }

    pub fn decrypt_text(&self, text: String) -> Result<String> {
        self.ciphers.decrypt_text(self.mode, text, self.key)
    }
}

/// Converts records to and from file contents.
pub trait SaveLoadStrategy: Send + Sync {
    fn format(&self) -> SaveFormat;

    fn extension(&self) -> &'static str {
        self.format().extension()
    }

    fn encode(&self, record: &Record, encryption: &Encryption<'_>) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8], encryption: &Encryption<'_>) -> Result<Record>;
}

/// Read file contents as UTF-8 text.
pub(crate) fn utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| Error::corrupt(format!("save file is not UTF-8 text: {e}")))
}

/// Maps [`SaveFormat`] to a strategy.
#[derive(Clone)]
pub struct FormatRegistry {
    strategies: HashMap<SaveFormat, Arc<dyn SaveLoadStrategy>>,
}

impl FormatRegistry {
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Register a strategy under its own format, replacing any previous one.
    pub fn register(&mut self, strategy: Arc<dyn SaveLoadStrategy>) {
        self.strategies.insert(strategy.format(), strategy);
    }

    pub fn get(&self, format: SaveFormat) -> Result<&Arc<dyn SaveLoadStrategy>> {
        self.strategies
            .get(&format)
            .ok_or_else(|| Error::other(format!("no strategy registered for {format} format")))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(CustomStrategy));
        registry.register(Arc::new(JsonStrategy::default()));
        registry.register(Arc::new(NativeStrategy));
        registry
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<_> = self.strategies.keys().copied().collect();
        formats.sort_by_key(|f| *f as u8);
        f.debug_struct("FormatRegistry").field("formats", &formats).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions() {
        assert_eq!(SaveFormat::Custom.extension(), ".cus");
        assert_eq!(SaveFormat::Json.extension(), ".json");
        assert_eq!(SaveFormat::Native.extension(), ".bin");
    }

    #[test]
    fn test_registry_covers_all_formats() {
        let reg = FormatRegistry::default();
        for format in SaveFormat::ALL {
            let strategy = reg.get(format).unwrap();
            assert_eq!(strategy.format(), format);
            assert_eq!(strategy.extension(), format.extension());
        }
        assert!(FormatRegistry::empty().get(SaveFormat::Json).is_err());
    }

    #[test]
    fn test_every_format_with_every_cipher() {
        let formats = FormatRegistry::default();
        let ciphers = CipherRegistry::default();

        let mut child = Record::new();
        child.write("x", 3.5f32).unwrap();
        let mut record = Record::new();
        record.write("name", "Ada").unwrap();
        record.write("child", child).unwrap();
        record.write("none", None::<String>).unwrap();

        for format in SaveFormat::ALL {
            for mode in [
                EncryptionMode::None,
                EncryptionMode::Xor,
                EncryptionMode::Aes,
                EncryptionMode::Caesar,
            ] {
                let enc = Encryption::new(&ciphers, mode, "k3y");
                let strategy = formats.get(format).unwrap();
                let bytes = strategy.encode(&record, &enc).unwrap();
                let back = strategy.decode(&bytes, &enc).unwrap();
                assert_eq!(back, record, "{format} / {mode}");
            }
        }
    }
}
