use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::{utf8, Encryption, SaveFormat, SaveLoadStrategy};
use crate::cipher::decode_base64;
use crate::core::Record;
use crate::util::{Error, Result};

/// serde/bincode encoding of the record, encrypted as bytes and stored as
/// base64 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeStrategy;

impl SaveLoadStrategy for NativeStrategy {
    fn format(&self) -> SaveFormat {
        SaveFormat::Native
    }

    fn encode(&self, record: &Record, encryption: &Encryption<'_>) -> Result<Vec<u8>> {
        let bytes = bincode::serde::encode_to_vec(record, bincode::config::standard())
            .map_err(|e| Error::other(format!("bincode encode failed: {e}")))?;
        let sealed = encryption.encrypt_bytes(bytes)?;
        Ok(STANDARD.encode(sealed).into_bytes())
    }

    fn decode(&self, bytes: &[u8], encryption: &Encryption<'_>) -> Result<Record> {
        let sealed = decode_base64(&utf8(bytes)?)?;
        let plain = encryption.decrypt_bytes(sealed)?;
        let (record, used): (Record, usize) =
            bincode::serde::decode_from_slice(&plain, bincode::config::standard())
                .map_err(|e| Error::corrupt(format!("bincode decode failed: {e}")))?;
        if used != plain.len() {
            return Err(Error::corrupt(format!(
                "{} trailing bytes after native record",
                plain.len() - used
            )));
        }
        Ok(record)
    }
}
