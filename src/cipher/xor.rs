use super::{key_bytes, Cipher};
use crate::util::Result;

/// Repeating-key XOR. Encrypt and decrypt are the same function.
#[derive(Debug, Clone, Copy, Default)]
pub struct XorCipher;

impl XorCipher {
    fn apply(data: &[u8], key: &str) -> Result<Vec<u8>> {
        let key = key_bytes(key)?;
        Ok(data
            .iter()
            .zip(key.iter().cycle())
            .map(|(b, k)| b ^ k)
            .collect())
    }
}

impl Cipher for XorCipher {
    fn name(&self) -> &'static str {
        "xor"
    }

    fn encrypt_bytes(&self, data: &[u8], key: &str) -> Result<Vec<u8>> {
        Self::apply(data, key)
    }

    fn decrypt_bytes(&self, data: &[u8], key: &str) -> Result<Vec<u8>> {
        Self::apply(data, key)
    }
}
