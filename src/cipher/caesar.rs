use super::{key_bytes, Cipher};
use crate::util::Result;

/// Shifted-alphabet cipher.
///
/// The shift is the sum of the key bytes mod 256. Bytes rotate mod 256.
/// Text rotates ASCII letters mod 26, keeps case and leaves everything else
/// alone, so the output is still valid UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaesarCipher;

impl CaesarCipher {
    pub fn shift(key: &str) -> Result<u8> {
        let key = key_bytes(key)?;
        Ok(key.iter().fold(0u8, |acc, b| acc.wrapping_add(*b)))
    }

    fn rotate_text(text: &str, shift: u8) -> String {
        text.chars()
            .map(|c| {
                let base = if c.is_ascii_lowercase() {
                    b'a'
                } else if c.is_ascii_uppercase() {
                    b'A'
                } else {
                    return c;
                };
                let offset = (c as u8 - base + shift) % 26;
                char::from(base + offset)
            })
            .collect()
    }
}

impl Cipher for CaesarCipher {
    fn name(&self) -> &'static str {
        "caesar"
    }

    fn encrypt_bytes(&self, data: &[u8], key: &str) -> Result<Vec<u8>> {
        let shift = Self::shift(key)?;
        Ok(data.iter().map(|b| b.wrapping_add(shift)).collect())
    }

    fn decrypt_bytes(&self, data: &[u8], key: &str) -> Result<Vec<u8>> {
        let shift = Self::shift(key)?;
        Ok(data.iter().map(|b| b.wrapping_sub(shift)).collect())
    }

    fn encrypt_text(&self, text: &str, key: &str) -> Result<String> {
        let shift = Self::shift(key)? % 26;
        Ok(Self::rotate_text(text, shift))
    }

    fn decrypt_text(&self, text: &str, key: &str) -> Result<String> {
        let shift = Self::shift(key)? % 26;
        Ok(Self::rotate_text(text, (26 - shift) % 26))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_from_key() {
        // 'a' + 'b' = 97 + 98 = 195
        assert_eq!(CaesarCipher::shift("ab").unwrap(), 195);
        // 3 * 122 = 366 wraps to 110
        assert_eq!(CaesarCipher::shift("zzz").unwrap(), 110);
    }

    #[test]
    fn test_bytes_wrap() {
        // key "\x01" shifts by one
        let out = CaesarCipher.encrypt_bytes(&[0, 254, 255], "\x01").unwrap();
        assert_eq!(out, [1, 255, 0]);
        assert_eq!(CaesarCipher.decrypt_bytes(&out, "\x01").unwrap(), [0, 254, 255]);
    }

    #[test]
    fn test_text_keeps_case_and_symbols() {
        // "\x03" shifts by three
        let enc = CaesarCipher.encrypt_text("Hello, xyz! 42 ü", "\x03").unwrap();
        assert_eq!(enc, "Khoor, abc! 42 ü");
        assert_eq!(CaesarCipher.decrypt_text(&enc, "\x03").unwrap(), "Hello, xyz! 42 ü");
    }

    #[test]
    fn test_text_shift_multiple_of_26() {
        // 'A' + 'A' = 130 = 5 * 26
        let enc = CaesarCipher.encrypt_text("Same", "AA").unwrap();
        assert_eq!(enc, "Same");
    }
}
