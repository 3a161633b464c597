//! Collaborator traits implemented by host objects.

use super::Record;

/// A domain object that can be saved as a [`Record`] and restored from one.
///
/// Implemented by hand (or by generated code) on host types; the library
/// never inspects objects reflectively.
pub trait Savable {
    /// Capture the object's state.
    fn to_record(&self) -> Record;

    /// Restore state from a loaded record.
    ///
    /// Missing fields should fall back to defaults rather than fail.
    fn load_from_record(&mut self, record: &Record);
}

impl Savable for Record {
    fn to_record(&self) -> Record {
        self.clone()
    }

    fn load_from_record(&mut self, record: &Record) {
        *self = record.clone();
    }
}
