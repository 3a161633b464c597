//! Save/load facade.
//!
//! [`SaveLoadManager`] ties formats, ciphers, storage location and the
//! scheduler together. Synchronous calls run on the caller's thread;
//! `*_async` calls go through the [`Scheduler`] and return an
//! [`OperationHandle`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::cipher::{CipherRegistry, EncryptionMode};
use crate::config::{DefaultHost, ManagerConfig, StorageHost};
use crate::core::{Record, Savable};
use crate::ops::{Operation, OperationHandle, OperationKind, ResourceKey, Scheduler};
use crate::strategy::{Encryption, FormatRegistry, SaveFormat};
use crate::util::{Error, Result};

/// Completion callback for an async save.
pub type SaveCallback = Box<dyn FnOnce() + Send + 'static>;
/// Completion callback for an async load. Receives `None` when the file is
/// missing or the load failed.
pub type LoadCallback = Box<dyn FnOnce(Option<Record>) + Send + 'static>;

/// Per-request settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Target directory. Falls back to the configured storage directory.
    pub dir: Option<PathBuf>,
    pub format: SaveFormat,
    pub encryption: EncryptionMode,
    /// Overrides the configured encryption key.
    pub key: Option<String>,
}

impl SaveOptions {
    pub fn new(format: SaveFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn encrypted(mut self, mode: EncryptionMode) -> Self {
        self.encryption = mode;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

struct Inner {
    config: ManagerConfig,
    formats: FormatRegistry,
    ciphers: CipherRegistry,
    host: Box<dyn StorageHost>,
    scheduler: Scheduler,
}

/// Entry point for saving and loading records.
///
/// Cheap to clone; clones share the scheduler and registries.
#[derive(Clone)]
pub struct SaveLoadManager {
    inner: Arc<Inner>,
}

impl SaveLoadManager {
    /// Manager with the default formats, ciphers and [`DefaultHost`].
    pub fn new(config: ManagerConfig) -> Result<Self> {
        let host = DefaultHost::new(config.app_name.clone());
        Self::with_parts(
            config,
            FormatRegistry::default(),
            CipherRegistry::default(),
            Box::new(host),
        )
    }

    /// Manager with explicit registries and storage host.
    pub fn with_parts(
        config: ManagerConfig,
        formats: FormatRegistry,
        ciphers: CipherRegistry,
        host: Box<dyn StorageHost>,
    ) -> Result<Self> {
        let scheduler = Scheduler::new(config.max_concurrency, config.poll_interval())?;
        debug!(?config, "save/load manager created");
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                formats,
                ciphers,
                host,
                scheduler,
            }),
        })
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.inner.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.inner.scheduler
    }

    /// Resource key for a request: directory, file name and format.
    pub fn resource_key(&self, file_name: &str, options: &SaveOptions) -> ResourceKey {
        let dir = options
            .dir
            .clone()
            .or_else(|| self.inner.config.storage_dir.clone())
            .unwrap_or_else(|| self.inner.host.persistent_data_dir());
        ResourceKey::new(dir, file_name, options.format)
    }

    /// Full path a request reads or writes.
    pub fn path_for(&self, file_name: &str, options: &SaveOptions) -> PathBuf {
        self.resource_key(file_name, options).path()
    }

    /// Save a record on the calling thread.
    pub fn save(&self, record: &Record, file_name: &str, options: &SaveOptions) -> Result<()> {
        let key = self.resource_key(file_name, options);
        let result = self.inner.save_now(record, &key, options);
        if let Err(e) = &result {
            error!(%key, error = %e, "save failed");
        }
        result
    }

    /// Load a record on the calling thread. A missing file is logged and
    /// returns `Ok(None)`.
    pub fn load(&self, file_name: &str, options: &SaveOptions) -> Result<Option<Record>> {
        let key = self.resource_key(file_name, options);
        let result = self.inner.load_now(&key, options);
        if let Err(e) = &result {
            error!(%key, error = %e, "load failed");
        }
        result
    }

    pub fn save_savable<S: Savable + ?Sized>(
        &self,
        object: &S,
        file_name: &str,
        options: &SaveOptions,
    ) -> Result<()> {
        self.save(&object.to_record(), file_name, options)
    }

    /// Load into an existing object. Returns false when the file is missing.
    pub fn load_into<S: Savable + ?Sized>(
        &self,
        object: &mut S,
        file_name: &str,
        options: &SaveOptions,
    ) -> Result<bool> {
        match self.load(file_name, options)? {
            Some(record) => {
                object.load_from_record(&record);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Queue a save. The callback runs once the operation finishes, whether
    /// or not it succeeded; check the handle for the outcome.
    pub fn save_async(
        &self,
        record: Record,
        file_name: &str,
        options: &SaveOptions,
        callback: Option<SaveCallback>,
    ) -> Result<OperationHandle> {
        let key = self.resource_key(file_name, options);
        let inner = Arc::clone(&self.inner);
        let options = options.clone();
        let body_key = key.clone();
        let op = Operation::new(OperationKind::Save, key, move || {
            let result = inner.save_now(&record, &body_key, &options);
            if let Some(callback) = callback {
                callback();
            }
            result
        });
        self.inner.scheduler.submit(op)
    }

    /// Queue a save of a savable object, captured now.
    pub fn save_savable_async<S: Savable + ?Sized>(
        &self,
        object: &S,
        file_name: &str,
        options: &SaveOptions,
        callback: Option<SaveCallback>,
    ) -> Result<OperationHandle> {
        self.save_async(object.to_record(), file_name, options, callback)
    }

    /// Queue a load. The callback receives the record, or `None` if the file
    /// is missing or the load failed.
    pub fn load_async(
        &self,
        file_name: &str,
        options: &SaveOptions,
        callback: Option<LoadCallback>,
    ) -> Result<OperationHandle> {
        let key = self.resource_key(file_name, options);
        let inner = Arc::clone(&self.inner);
        let options = options.clone();
        let body_key = key.clone();
        let op = Operation::new(OperationKind::Load, key, move || {
            let (record, result) = match inner.load_now(&body_key, &options) {
                Ok(record) => (record, Ok(())),
                Err(e) => (None, Err(e)),
            };
            if let Some(callback) = callback {
                callback(record);
            }
            result
        });
        self.inner.scheduler.submit(op)
    }

    /// Block until all queued operations have finished.
    pub fn wait_idle(&self) {
        self.inner.scheduler.wait_idle();
    }
}

impl std::fmt::Debug for SaveLoadManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveLoadManager")
            .field("config", &self.inner.config)
            .field("formats", &self.inner.formats)
            .field("ciphers", &self.inner.ciphers)
            .field("scheduler", &self.inner.scheduler)
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn key_for<'a>(&'a self, options: &'a SaveOptions) -> &'a str {
        options
            .key
            .as_deref()
            .unwrap_or(self.config.encryption_key.as_str())
    }

    #[instrument(level = "debug", skip_all, fields(key = %key))]
    fn save_now(&self, record: &Record, key: &ResourceKey, options: &SaveOptions) -> Result<()> {
        let strategy = self.formats.get(options.format)?;
        let encryption = Encryption::new(&self.ciphers, options.encryption, self.key_for(options));
        let bytes = strategy.encode(record, &encryption)?;

        fs::create_dir_all(&key.dir)?;
        let path = key.path();
        // Replace the previous save only once the new one is fully on disk.
        let staging = staging_path(&path);
        if let Err(e) = fs::write(&staging, &bytes).and_then(|()| fs::rename(&staging, &path)) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }
        info!(
            path = %path.display(),
            bytes = bytes.len(),
            encryption = %options.encryption,
            "saved"
        );
        Ok(())
    }

    #[instrument(level = "debug", skip_all, fields(key = %key))]
    fn load_now(&self, key: &ResourceKey, options: &SaveOptions) -> Result<Option<Record>> {
        let strategy = self.formats.get(options.format)?;
        let path = key.path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("{}", Error::MissingFile(path));
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let encryption = Encryption::new(&self.ciphers, options.encryption, self.key_for(options));
        let record = strategy.decode(&bytes, &encryption)?;
        info!(path = %path.display(), fields = record.len(), "loaded");
        Ok(Some(record))
    }
}

/// Sibling file a save is written to before it replaces `path`.
fn staging_path(path: &Path) -> PathBuf {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    PathBuf::from(staging)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager(dir: &TempDir) -> SaveLoadManager {
        let config = ManagerConfig {
            storage_dir: Some(dir.path().to_path_buf()),
            poll_interval_ms: 1,
            ..Default::default()
        };
        SaveLoadManager::new(config).unwrap()
    }

    #[test]
    fn test_path_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let opts = SaveOptions::new(SaveFormat::Json);
        assert_eq!(m.path_for("slot", &opts), dir.path().join("slot.json"));

        let other = dir.path().join("other");
        let opts = opts.in_dir(&other);
        assert_eq!(m.path_for("slot", &opts), other.join("slot.json"));

        let host_only = SaveLoadManager::with_parts(
            ManagerConfig::default(),
            FormatRegistry::default(),
            CipherRegistry::default(),
            Box::new(dir.path().join("host")),
        )
        .unwrap();
        let opts = SaveOptions::new(SaveFormat::Native);
        assert_eq!(host_only.path_for("s", &opts), dir.path().join("host").join("s.bin"));
    }

    #[test]
    fn test_save_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let mut r = Record::new();
        r.write("a", 1i32).unwrap();
        let opts = SaveOptions::default().in_dir(dir.path().join("a").join("b"));
        m.save(&r, "deep", &opts).unwrap();
        assert!(dir.path().join("a/b/deep.cus").exists());
        assert_eq!(m.load("deep", &opts).unwrap(), Some(r));
    }

    #[test]
    fn test_overwrite_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let opts = SaveOptions::default();
        let mut r = Record::new();
        r.write("v", 1i32).unwrap();
        m.save(&r, "slot", &opts).unwrap();
        r.update("v", 2i32);
        m.save(&r, "slot", &opts).unwrap();

        let path = m.path_for("slot", &opts);
        assert!(!staging_path(&path).exists());
        assert_eq!(m.load("slot", &opts).unwrap(), Some(r));
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let opts = SaveOptions::new(SaveFormat::Json);
        let mut good = Record::new();
        good.write("gold", 100i32).unwrap();
        m.save(&good, "slot", &opts).unwrap();

        // A directory in the staging spot makes the write fail.
        let path = m.path_for("slot", &opts);
        fs::create_dir(staging_path(&path)).unwrap();
        let mut next = Record::new();
        next.write("gold", 0i32).unwrap();
        assert!(matches!(m.save(&next, "slot", &opts), Err(Error::Io(_))));

        assert_eq!(m.load("slot", &opts).unwrap(), Some(good));
    }

    #[test]
    fn test_key_override() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let mut r = Record::new();
        r.write("secret", "value").unwrap();

        let opts = SaveOptions::new(SaveFormat::Custom)
            .encrypted(EncryptionMode::Aes)
            .with_key("per-request");
        m.save(&r, "s", &opts).unwrap();
        assert_eq!(m.load("s", &opts).unwrap(), Some(r));

        let default_key = SaveOptions::new(SaveFormat::Custom).encrypted(EncryptionMode::Aes);
        assert!(matches!(m.load("s", &default_key), Err(Error::CorruptData(_))));
    }

    #[test]
    fn test_empty_key_override_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let m = manager(&dir);
        let opts = SaveOptions::default()
            .encrypted(EncryptionMode::Xor)
            .with_key("");
        let err = m.save(&Record::new(), "x", &opts).unwrap_err();
        assert!(matches!(err, Error::InvalidKey));
        assert!(!m.path_for("x", &opts).exists());
    }
}
