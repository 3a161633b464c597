//! Records - the unit of save/load and of nesting.
//!
//! A record is a table of named [`TaggedValue`]s. Field names are unique.
//! Insertion order is kept (and written to disk in that order) but is not
//! part of equality.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use super::{FromValue, IntoValue, Savable, TaggedValue};
use crate::util::{Error, Result};

/// Ordered table of named values.
#[derive(Clone, Default)]
pub struct Record {
    fields: Vec<(String, TaggedValue)>,
    /// Field name to position in `fields`.
    index: HashMap<String, usize>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Add a new field. Fails with [`Error::DuplicateField`] if the name is taken.
    pub fn write<T: IntoValue>(&mut self, name: impl Into<String>, value: T) -> Result<()> {
        self.insert_new(name.into(), value.into_value())
    }

    /// Set a field, replacing any previous value in place.
    pub fn update<T: IntoValue>(&mut self, name: impl Into<String>, value: T) {
        let name = name.into();
        let value = value.into_value();
        match self.position(&name) {
            Some(pos) => self.fields[pos].1 = value,
            None => self.push_raw(name, value),
        }
    }

    /// Add a runtime-typed field. See [`TaggedValue::from_any`].
    pub fn write_any(&mut self, name: impl Into<String>, value: &dyn Any) -> Result<()> {
        let value = TaggedValue::from_any(value)?;
        self.insert_new(name.into(), value)
    }

    /// Add a savable object as a nested record.
    pub fn write_savable<S: Savable + ?Sized>(
        &mut self,
        name: impl Into<String>,
        object: &S,
    ) -> Result<()> {
        self.insert_new(name.into(), TaggedValue::Record(object.to_record()))
    }

    /// Add a list of savable objects as a record list.
    pub fn write_savable_list<S: Savable>(
        &mut self,
        name: impl Into<String>,
        objects: &[S],
    ) -> Result<()> {
        let records = objects.iter().map(Savable::to_record).collect();
        self.insert_new(name.into(), TaggedValue::RecordList(records))
    }

    fn insert_new(&mut self, name: String, value: TaggedValue) -> Result<()> {
        if self.contains(&name) {
            return Err(Error::DuplicateField(name));
        }
        self.push_raw(name, value);
        Ok(())
    }

    /// Read a typed field.
    ///
    /// Fails with [`Error::FieldNotFound`] or [`Error::TypeMismatch`].
    pub fn read<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self
            .get(name)
            .ok_or_else(|| Error::FieldNotFound(name.to_owned()))?;
        T::from_value(value).ok_or_else(|| Error::TypeMismatch {
            field: name.to_owned(),
            expected: T::KIND,
            actual: value.kind(),
        })
    }

    /// Read a typed field, `None` if absent or of another kind.
    pub fn try_read<T: FromValue>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(T::from_value)
    }

    /// Read a typed field or fall back to `default`.
    pub fn read_or<T: FromValue>(&self, name: &str, default: T) -> T {
        self.try_read(name).unwrap_or(default)
    }

    /// Read a typed field or fall back to `T::default()`.
    pub fn read_or_default<T: FromValue + Default>(&self, name: &str) -> T {
        self.try_read(name).unwrap_or_default()
    }

    /// Restore a savable object from a nested record field.
    pub fn read_into<S: Savable + ?Sized>(&self, name: &str, object: &mut S) -> Result<()> {
        let record: Record = self.read(name)?;
        object.load_from_record(&record);
        Ok(())
    }

    /// Get the raw tagged value of a field.
    pub fn get(&self, name: &str) -> Option<&TaggedValue> {
        self.position(name).map(|pos| &self.fields[pos].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove a field and return its value.
    pub fn remove(&mut self, name: &str) -> Option<TaggedValue> {
        let pos = self.index.remove(name)?;
        let (_, value) = self.fields.remove(pos);
        for (k, _) in &self.fields[pos..] {
            if let Some(i) = self.index.get_mut(k) {
                *i -= 1;
            }
        }
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaggedValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Append a field whose name is known to be new.
    pub(crate) fn push_raw(&mut self, name: String, value: TaggedValue) {
        self.index.insert(name.clone(), self.fields.len());
        self.fields.push((name, value));
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a str, &'a TaggedValue);
    type IntoIter = Box<dyn Iterator<Item = Self::Item> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
