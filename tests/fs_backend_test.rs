use noticeboard::store::backend::StorageBackend;
use noticeboard::store::fs_backend::FsBackend;
use noticeboard::store::NoticeStore;
use noticeboard::{Manager, NoticeConfig, NoticeType};
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, FsBackend) {
    let dir = TempDir::new().unwrap();
    let backend = FsBackend::new(dir.path().join("notices"));
    (dir, backend)
}

#[test]
fn test_fs_backend_basic_slot_io() {
    let (_dir, backend) = setup();

    // 1. Missing slot
    assert_eq!(backend.get("shop_notices").unwrap(), None);

    // 2. Write creates the directory
    assert!(backend.set("shop_notices", "{}").unwrap());
    assert_eq!(backend.get("shop_notices").unwrap(), Some("{}".to_string()));

    // 3. Delete
    assert!(backend.delete("shop_notices").unwrap());
    assert!(!backend.delete("shop_notices").unwrap());
    assert_eq!(backend.get("shop_notices").unwrap(), None);
}

#[test]
fn test_fs_backend_atomic_write_artifacts() {
    let (_dir, backend) = setup();

    backend.set("shop_notices", "first").unwrap();
    backend.set("shop_notices", "second").unwrap();

    let expected_path = backend.root().join("shop_notices.json");
    assert_eq!(fs::read_to_string(&expected_path).unwrap(), "second");

    // Verify NO .tmp files are left behind
    for entry in fs::read_dir(backend.root()).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
    }
}

#[test]
fn test_fs_backend_keys_cannot_escape_root() {
    let (dir, backend) = setup();
    backend.set("../outside", "x").unwrap();

    assert!(!dir.path().join("outside.json").exists());
    assert_eq!(backend.get("../outside").unwrap(), Some("x".to_string()));
}

#[test]
fn test_notices_survive_process_restart() {
    let (_dir, backend) = setup();
    let config = NoticeConfig::default();

    let hash = {
        let mut manager = Manager::open(backend.clone(), config.storage_key(), &config).unwrap();
        let hash = manager
            .warning("Backup overdue")
            .unwrap()
            .nag(true)
            .commit();
        manager.close().unwrap();
        hash
    };

    let store = NoticeStore::open(backend.clone(), config.storage_key()).unwrap();
    let notice = store.get(&hash).unwrap();
    assert_eq!(notice.notice_type(), NoticeType::Warning);
    assert!(notice.is_nag());
    store.close().unwrap();
}

#[test]
fn test_flush_removes_the_file() {
    let (_dir, backend) = setup();

    NoticeStore::with_scope(backend.clone(), "shop_notices", |store| {
        store.add(noticeboard::Notice::new("Hi", NoticeType::Info));
        Ok(())
    })
    .unwrap();
    assert!(backend.slot_path("shop_notices").exists());

    let mut store = NoticeStore::open(backend.clone(), "shop_notices").unwrap();
    store.flush().unwrap();
    store.close().unwrap();
    assert!(!backend.slot_path("shop_notices").exists());
}
