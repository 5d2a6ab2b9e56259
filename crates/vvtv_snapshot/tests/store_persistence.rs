//! File-backed snapshot store behavior across restarts.

use std::fs::OpenOptions;
use std::io::Write;
use tempfile::tempdir;
use vvtv_snapshot::{SnapshotError, SnapshotKind, SnapshotStore, StoreOptions, LOG_FILE_NAME};

#[test]
fn snapshots_survive_reopen() {
    let dir = tempdir().unwrap();

    {
        let store = SnapshotStore::open_dir(dir.path(), StoreOptions::default()).unwrap();
        store.upsert_status(br#"{"state":"RUNNING","buffer_minutes":55}"#).unwrap();
        store
            .upsert_daily("2024-01-01", br#"{"date":"2024-01-01","v":1}"#)
            .unwrap();
        store
            .upsert_daily("2024-01-01", br#"{"date":"2024-01-01","v":2}"#)
            .unwrap();
        store.upsert_weekly("2024-W01", br#"{"week":"2024-W01"}"#).unwrap();
    }

    let store = SnapshotStore::open_dir(dir.path(), StoreOptions::default()).unwrap();
    assert_eq!(
        store.get_status().unwrap().payload,
        r#"{"state":"RUNNING","buffer_minutes":55}"#
    );
    assert_eq!(
        store.get_daily("2024-01-01").unwrap().payload,
        r#"{"date":"2024-01-01","v":2}"#
    );
    assert_eq!(store.keys(SnapshotKind::Daily), vec!["2024-01-01".to_string()]);
    assert!(store.get_weekly("2024-W01").is_ok());

    let stats = store.stats().unwrap();
    assert_eq!(stats.daily, 1);
    assert_eq!(stats.log_records, 4);
}

#[test]
fn second_store_on_same_dir_is_refused() {
    let dir = tempdir().unwrap();
    let _first = SnapshotStore::open_dir(dir.path(), StoreOptions::default()).unwrap();

    let second = SnapshotStore::open_dir(dir.path(), StoreOptions::default());
    assert!(matches!(second, Err(SnapshotError::Storage(_))));
}

#[test]
fn torn_tail_is_truncated_on_open() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join(LOG_FILE_NAME);

    {
        let store = SnapshotStore::open_dir(dir.path(), StoreOptions::default()).unwrap();
        store.upsert_status(br#"{"v":1}"#).unwrap();
    }
    let clean_len = std::fs::metadata(&log_path).unwrap().len();

    // Half of a record, as if the process died mid-append.
    {
        let mut file = OpenOptions::new().append(true).open(&log_path).unwrap();
        file.write_all(&[64, 0, 0, 0, 1, 0, 0]).unwrap();
    }

    let store = SnapshotStore::open_dir(dir.path(), StoreOptions::default()).unwrap();
    assert_eq!(store.get_status().unwrap().payload, r#"{"v":1}"#);
    assert_eq!(store.stats().unwrap().log_bytes, clean_len);

    store.upsert_status(br#"{"v":2}"#).unwrap();
    drop(store);

    let store = SnapshotStore::open_dir(dir.path(), StoreOptions::default()).unwrap();
    assert_eq!(store.get_status().unwrap().payload, r#"{"v":2}"#);
}

#[test]
fn damage_before_tail_refuses_to_open() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join(LOG_FILE_NAME);

    {
        let store = SnapshotStore::open_dir(dir.path(), StoreOptions::default()).unwrap();
        store.upsert_status(br#"{"v":1}"#).unwrap();
        store.upsert_status(br#"{"v":2}"#).unwrap();
    }

    let mut bytes = std::fs::read(&log_path).unwrap();
    bytes[10] ^= 0xFF;
    std::fs::write(&log_path, &bytes).unwrap();

    let result = SnapshotStore::open_dir(dir.path(), StoreOptions::default());
    assert!(matches!(result, Err(SnapshotError::Corrupted { offset: 0, .. })));
}

#[test]
fn damaged_first_length_refuses_to_open_and_keeps_log() {
    let dir = tempdir().unwrap();
    let log_path = dir.path().join(LOG_FILE_NAME);

    {
        let store = SnapshotStore::open_dir(dir.path(), StoreOptions::default()).unwrap();
        for date in ["2024-01-01", "2024-01-02", "2024-01-03"] {
            let payload = format!(r#"{{"date":"{date}"}}"#);
            store.upsert_daily(date, payload.as_bytes()).unwrap();
        }
    }

    let mut bytes = std::fs::read(&log_path).unwrap();
    bytes[3] ^= 0x80;
    std::fs::write(&log_path, &bytes).unwrap();

    let result = SnapshotStore::open_dir(dir.path(), StoreOptions::default());
    assert!(matches!(result, Err(SnapshotError::Corrupted { offset: 0, .. })));
    assert_eq!(std::fs::read(&log_path).unwrap(), bytes);
}

#[test]
fn compaction_keeps_latest_per_key() {
    let dir = tempdir().unwrap();

    {
        let store = SnapshotStore::open_dir(dir.path(), StoreOptions::default()).unwrap();
        for v in 0..10 {
            store
                .upsert_status(format!(r#"{{"v":{v}}}"#).as_bytes())
                .unwrap();
        }
        store.upsert_daily("d1", br#"{"date":"d1","v":1}"#).unwrap();
        store.upsert_daily("d1", br#"{"date":"d1","v":2}"#).unwrap();
        store.upsert_weekly("w1", br#"{"week":"w1"}"#).unwrap();

        let stats = store.compact().unwrap();
        assert_eq!(stats.input_records, 13);
        assert_eq!(stats.output_records, 3);
        assert!(stats.bytes_after < stats.bytes_before);
        assert_eq!(store.stats().unwrap().log_records, 3);

        // The store keeps working on the rewritten log.
        store.upsert_daily("d2", br#"{"date":"d2"}"#).unwrap();
    }

    let store = SnapshotStore::open_dir(dir.path(), StoreOptions::default()).unwrap();
    assert_eq!(store.get_status().unwrap().payload, r#"{"v":9}"#);
    assert_eq!(store.get_daily("d1").unwrap().payload, r#"{"date":"d1","v":2}"#);
    assert!(store.get_daily("d2").is_ok());
    assert!(store.get_weekly("w1").is_ok());
    assert_eq!(store.stats().unwrap().log_records, 4);
}

#[test]
fn compaction_preserves_updated_at() {
    let store = SnapshotStore::open_in_memory().unwrap();
    let before = store.upsert_status(b"{}").unwrap();
    store.compact().unwrap();
    assert_eq!(store.get_status().unwrap().updated_at, before.updated_at);
}

#[test]
fn compaction_plan_matches_compaction() {
    let store = SnapshotStore::open_in_memory().unwrap();
    for v in 0..5 {
        store
            .upsert_weekly("w1", format!(r#"{{"week":"w1","v":{v}}}"#).as_bytes())
            .unwrap();
    }
    let size_before = store.stats().unwrap().log_bytes;

    let plan = store.plan_compaction().unwrap();
    assert_eq!(plan.input_records, 5);
    assert_eq!(plan.output_records, 1);
    assert_eq!(store.stats().unwrap().log_bytes, size_before);

    let done = store.compact().unwrap();
    assert_eq!(done, plan);
}
