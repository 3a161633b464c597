//! End-to-end save/load through the manager.

mod common;

use std::sync::mpsc;
use std::time::Duration;

use saveload::prelude::*;
use saveload::{CipherRegistry, FormatRegistry};
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(10);

const MODES: [EncryptionMode; 4] = [
    EncryptionMode::None,
    EncryptionMode::Xor,
    EncryptionMode::Aes,
    EncryptionMode::Caesar,
];

fn manager(dir: &TempDir) -> SaveLoadManager {
    common::init_tracing();
    let config = ManagerConfig {
        storage_dir: Some(dir.path().to_path_buf()),
        poll_interval_ms: 1,
        ..Default::default()
    };
    SaveLoadManager::new(config).expect("Failed to create manager")
}

fn sample() -> Record {
    let mut stats = Record::new();
    stats.write("str", 12i32).unwrap();
    stats.write("dex", 9i32).unwrap();

    let mut record = Record::new();
    record.write("name", "Ada").unwrap();
    record.write("gold", 1_000_000i64).unwrap();
    record.write("position", Vec3::new(10.0, 0.5, -3.0)).unwrap();
    record.write("stats", stats).unwrap();
    record.write("inventory", vec!["sword".to_string(), "rope".to_string()]).unwrap();
    record.write("guild", None::<String>).unwrap();
    record
}

#[derive(Debug, Default, PartialEq)]
struct Player {
    name: String,
    level: i32,
    position: Vec3,
    tint: Color,
}

impl Savable for Player {
    fn to_record(&self) -> Record {
        let mut r = Record::new();
        r.update("name", self.name.as_str());
        r.update("level", self.level);
        r.update("position", self.position);
        r.update("tint", self.tint);
        r
    }

    fn load_from_record(&mut self, record: &Record) {
        self.name = record.read_or_default("name");
        self.level = record.read_or("level", 1);
        self.position = record.read_or("position", Vec3::ZERO);
        self.tint = record.read_or("tint", Color::WHITE);
    }
}

#[test]
fn test_missing_file_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager(&dir);
    for format in SaveFormat::ALL {
        let loaded = m.load("nonexistent", &SaveOptions::new(format)).unwrap();
        assert!(loaded.is_none(), "{format}");
    }
}

#[test]
fn test_every_format_and_cipher() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager(&dir);
    let record = sample();

    for format in SaveFormat::ALL {
        for mode in MODES {
            let name = format!("slot_{format}_{mode}");
            let opts = SaveOptions::new(format).encrypted(mode);
            m.save(&record, &name, &opts).unwrap();

            let path = m.path_for(&name, &opts);
            assert!(path.exists(), "{}", path.display());
            assert!(path.to_string_lossy().ends_with(format.extension()));

            let loaded = m.load(&name, &opts).unwrap().expect("save should exist");
            assert_eq!(loaded, record, "{format} / {mode}");
        }
    }
}

#[test]
fn test_encrypted_file_does_not_contain_plaintext() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager(&dir);
    let opts = SaveOptions::new(SaveFormat::Json).encrypted(EncryptionMode::Aes);
    m.save(&sample(), "secret", &opts).unwrap();
    let raw = std::fs::read_to_string(m.path_for("secret", &opts)).unwrap();
    assert!(!raw.contains("Ada"));
    assert!(!raw.contains("fields"));
}

#[test]
fn test_json_file_is_readable() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager(&dir);
    let opts = SaveOptions::new(SaveFormat::Json);
    m.save(&sample(), "plain", &opts).unwrap();
    let raw = std::fs::read_to_string(dir.path().join("plain.json")).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["fields"]["name"]["t"], 5);
    assert_eq!(doc["fields"]["name"]["v"], "Ada");
    assert_eq!(doc["fields"]["guild"]["v"], serde_json::Value::Null);
}

#[test]
fn test_corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager(&dir);
    let opts = SaveOptions::new(SaveFormat::Custom);
    std::fs::write(dir.path().join("broken.cus"), [1, 0, 0, 0, 1, 0]).unwrap();
    assert!(matches!(m.load("broken", &opts), Err(Error::CorruptData(_))));
}

#[test]
fn test_savable_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager(&dir);
    let opts = SaveOptions::new(SaveFormat::Native).encrypted(EncryptionMode::Caesar);

    let player = Player {
        name: "Grace".into(),
        level: 12,
        position: Vec3::new(1.0, 2.0, 3.0),
        tint: Color::rgb(0.2, 0.4, 0.6),
    };
    m.save_savable(&player, "player", &opts).unwrap();

    let mut loaded = Player::default();
    assert!(m.load_into(&mut loaded, "player", &opts).unwrap());
    assert_eq!(loaded, player);

    let mut untouched = Player::default();
    assert!(!m.load_into(&mut untouched, "nobody", &opts).unwrap());
    assert_eq!(untouched, Player::default());
}

#[test]
fn test_async_save_then_load_same_key() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager(&dir);
    let opts = SaveOptions::new(SaveFormat::Custom).encrypted(EncryptionMode::Xor);

    let (saved_tx, saved_rx) = mpsc::channel();
    let (loaded_tx, loaded_rx) = mpsc::channel();

    let save = m
        .save_async(
            sample(),
            "async",
            &opts,
            Some(Box::new(move || saved_tx.send(()).unwrap())),
        )
        .unwrap();
    let load = m
        .load_async(
            "async",
            &opts,
            Some(Box::new(move |record: Option<Record>| loaded_tx.send(record).unwrap())),
        )
        .unwrap();

    saved_rx.recv_timeout(TIMEOUT).expect("save callback");
    let record = loaded_rx.recv_timeout(TIMEOUT).expect("load callback");
    assert_eq!(record, Some(sample()));

    assert!(save.wait_timeout(TIMEOUT));
    assert!(load.wait_timeout(TIMEOUT));
    assert_eq!(save.error(), None);
    assert_eq!(load.status(), OperationStatus::Completed);
}

#[test]
fn test_async_failure_reported_on_handle() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager(&dir);
    std::fs::write(dir.path().join("bad.json"), "{ not json").unwrap();

    let (tx, rx) = mpsc::channel();
    let handle = m
        .load_async(
            "bad",
            &SaveOptions::new(SaveFormat::Json),
            Some(Box::new(move |record: Option<Record>| tx.send(record).unwrap())),
        )
        .unwrap();

    assert_eq!(rx.recv_timeout(TIMEOUT).unwrap(), None);
    assert!(handle.wait_timeout(TIMEOUT));
    assert!(handle.error().unwrap().contains("invalid JSON"));
}

#[test]
fn test_async_missing_file_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager(&dir);
    let handle = m
        .load_async("ghost", &SaveOptions::default(), None)
        .unwrap();
    assert!(handle.wait_timeout(TIMEOUT));
    assert_eq!(handle.error(), None);
}

#[test]
fn test_many_async_saves_then_idle() {
    let dir = tempfile::tempdir().unwrap();
    let m = manager(&dir);
    let opts = SaveOptions::new(SaveFormat::Custom);

    for i in 0..40 {
        let mut r = Record::new();
        r.write("i", i).unwrap();
        m.save_async(r, &format!("slot{}", i % 8), &opts, None).unwrap();
    }
    m.wait_idle();
    assert!(!m.scheduler().is_running());

    // The last write to each slot wins.
    for slot in 0..8 {
        let r = m.load(&format!("slot{slot}"), &opts).unwrap().unwrap();
        assert_eq!(r.read::<i32>("i").unwrap(), 32 + slot);
    }
}

#[test]
fn test_custom_host_directory() {
    let dir = tempfile::tempdir().unwrap();
    let m = SaveLoadManager::with_parts(
        ManagerConfig::default(),
        FormatRegistry::default(),
        CipherRegistry::default(),
        Box::new(dir.path().join("host-data")),
    )
    .unwrap();
    m.save(&sample(), "h", &SaveOptions::default()).unwrap();
    assert!(dir.path().join("host-data").join("h.cus").exists());
}
