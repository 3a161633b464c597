//! AES-256-GCM with a passphrase-derived key.
//!
//! Layout: `nonce(12) || ciphertext || tag(16)`. The key is PBKDF2-HMAC-SHA256
//! over the passphrase and a fixed salt.

// aes-gcm relies on generic-array 0.14, so suppress the upstream deprecation locally.
#[allow(deprecated)]
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::Aes256Gcm;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use super::{key_bytes, Cipher};
use crate::util::{Error, Result};

pub const SALT: [u8; 16] = [
    57, 95, 245, 236, 169, 199, 51, 94, 80, 62, 64, 175, 54, 122, 232, 66,
];
pub const DEFAULT_ITERATIONS: u32 = 1000;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct AesCipher {
    iterations: u32,
}

impl Default for AesCipher {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl AesCipher {
    /// Use a different PBKDF2 iteration count. Zero is treated as one.
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    /// PBKDF2-HMAC-SHA256 over the passphrase and [`SALT`].
    pub fn derive_key(&self, passphrase: &str) -> Result<[u8; 32]> {
        let mut key = [0u8; 32];
        pbkdf2_hmac::<Sha256>(key_bytes(passphrase)?, &SALT, self.iterations, &mut key);
        Ok(key)
    }

    fn cipher(&self, passphrase: &str) -> Result<Aes256Gcm> {
        let key = self.derive_key(passphrase)?;
        Aes256Gcm::new_from_slice(&key).map_err(|_| Error::InvalidKey)
    }
}

#[allow(deprecated)]
fn nonce_ref(bytes: &[u8]) -> &GenericArray<u8, <Aes256Gcm as AeadCore>::NonceSize> {
    GenericArray::from_slice(bytes)
}

impl Cipher for AesCipher {
    fn name(&self) -> &'static str {
        "aes"
    }

    fn encrypt_bytes(&self, data: &[u8], key: &str) -> Result<Vec<u8>> {
        let cipher = self.cipher(key)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(&nonce, data)
            .map_err(|_| Error::other("AES encryption failed"))?;
        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn decrypt_bytes(&self, data: &[u8], key: &str) -> Result<Vec<u8>> {
        let cipher = self.cipher(key)?;
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(Error::corrupt(format!(
                "ciphertext of {} bytes is shorter than nonce and tag",
                data.len()
            )));
        }
        let (nonce, sealed) = data.split_at(NONCE_LEN);
        cipher
            .decrypt(nonce_ref(nonce), sealed)
            .map_err(|_| Error::corrupt("AES authentication failed"))
    }
}
