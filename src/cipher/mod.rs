//! Symmetric cipher strategies applied to finished payloads.
//!
//! Each [`Cipher`] has a byte form and a text form. The text form of the
//! byte-oriented ciphers is base64 of the transformed UTF-8 bytes, so the
//! result is always printable.

mod aes;
mod caesar;
mod xor;

pub use aes::AesCipher;
pub use caesar::CaesarCipher;
pub use xor::XorCipher;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::util::{Error, Result};

/// A keyed symmetric transform.
pub trait Cipher: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn encrypt_bytes(&self, data: &[u8], key: &str) -> Result<Vec<u8>>;

    fn decrypt_bytes(&self, data: &[u8], key: &str) -> Result<Vec<u8>>;

    fn encrypt_text(&self, text: &str, key: &str) -> Result<String> {
        let bytes = self.encrypt_bytes(text.as_bytes(), key)?;
        Ok(STANDARD.encode(bytes))
    }

    fn decrypt_text(&self, text: &str, key: &str) -> Result<String> {
        let bytes = decode_base64(text)?;
        let plain = self.decrypt_bytes(&bytes, key)?;
        String::from_utf8(plain)
            .map_err(|e| Error::corrupt(format!("decrypted text is not UTF-8: {e}")))
    }
}

/// Reject a missing key.
pub(crate) fn key_bytes(key: &str) -> Result<&[u8]> {
    if key.is_empty() {
        return Err(Error::InvalidKey);
    }
    Ok(key.as_bytes())
}

pub(crate) fn decode_base64(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| Error::corrupt(format!("invalid base64: {e}")))
}

/// Which cipher a save or load uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum EncryptionMode {
    #[default]
    None = 0,
    Xor = 1,
    Aes = 2,
    Caesar = 3,
}

impl fmt::Display for EncryptionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Xor => "xor",
            Self::Aes => "aes",
            Self::Caesar => "caesar",
        };
        f.write_str(name)
    }
}

/// Maps [`EncryptionMode`] to a cipher instance.
///
/// [`EncryptionMode::None`] and modes with no registered cipher pass data
/// through unchanged.
#[derive(Clone)]
pub struct CipherRegistry {
    ciphers: HashMap<EncryptionMode, Arc<dyn Cipher>>,
}

impl CipherRegistry {
    /// A registry with no ciphers.
    pub fn empty() -> Self {
        Self {
            ciphers: HashMap::new(),
        }
    }

    /// Register (or replace) the cipher for `mode`.
    pub fn register(&mut self, mode: EncryptionMode, cipher: Arc<dyn Cipher>) {
        self.ciphers.insert(mode, cipher);
    }

    pub fn get(&self, mode: EncryptionMode) -> Option<&Arc<dyn Cipher>> {
        if mode == EncryptionMode::None {
            return None;
        }
        let cipher = self.ciphers.get(&mode);
        if cipher.is_none() {
            warn!(%mode, "no cipher registered, data is not encrypted");
        }
        cipher
    }

    pub fn encrypt_bytes(&self, mode: EncryptionMode, data: Vec<u8>, key: &str) -> Result<Vec<u8>> {
        match self.get(mode) {
            Some(c) => c.encrypt_bytes(&data, key),
            None => Ok(data),
        }
    }

    pub fn decrypt_bytes(&self, mode: EncryptionMode, data: Vec<u8>, key: &str) -> Result<Vec<u8>> {
        match self.get(mode) {
            Some(c) => c.decrypt_bytes(&data, key),
            None => Ok(data),
        }
    }

    pub fn encrypt_text(&self, mode: EncryptionMode, text: String, key: &str) -> Result<String> {
        match self.get(mode) {
            Some(c) => c.encrypt_text(&text, key),
            None => Ok(text),
        }
    }

    pub fn decrypt_text(&self, mode: EncryptionMode, text: String, key: &str) -> Result<String> {
        match self.get(mode) {
            Some(c) => c.decrypt_text(&text, key),
            None => Ok(text),
        }
    }
}

impl Default for CipherRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(EncryptionMode::Xor, Arc::new(XorCipher));
        registry.register(EncryptionMode::Aes, Arc::new(AesCipher::default()));
        registry.register(EncryptionMode::Caesar, Arc::new(CaesarCipher));
        registry
    }
}

impl fmt::Debug for CipherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut modes: Vec<_> = self.ciphers.keys().copied().collect();
        modes.sort_by_key(|m| *m as u8);
        f.debug_struct("CipherRegistry").field("modes", &modes).finish()
    }
}
