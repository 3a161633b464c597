use super::{Encryption, SaveFormat, SaveLoadStrategy};
use crate::codec;
use crate::core::Record;
use crate::util::Result;

/// Tagged binary format, encrypted as raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomStrategy;

impl SaveLoadStrategy for CustomStrategy {
    fn format(&self) -> SaveFormat {
        SaveFormat::Custom
    }

    fn encode(&self, record: &Record, encryption: &Encryption<'_>) -> Result<Vec<u8>> {
        encryption.encrypt_bytes(codec::serialize(record)?)
    }

    fn decode(&self, bytes: &[u8], encryption: &Encryption<'_>) -> Result<Record> {
        let plain = encryption.decrypt_bytes(bytes.to_vec())?;
        codec::deserialize(&plain)
    }
}
