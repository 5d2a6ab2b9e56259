//! The snapshot store.

use crate::error::{SnapshotError, SnapshotResult};
use crate::kind::{SnapshotKey, SnapshotKind};
use crate::payload::extract_key;
use crate::record::{Decoded, SnapshotRecord};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use vvtv_storage::{FileBackend, InMemoryBackend, StorageBackend};

/// File name of the snapshot log inside a data directory.
pub const LOG_FILE_NAME: &str = "snapshots.log";

/// Status payload served before the first status ingest.
pub const DEFAULT_STATUS_PAYLOAD: &str =
    r#"{"state":"RUNNING","buffer_minutes":60,"source":"default"}"#;

/// A stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Record kind.
    pub kind: SnapshotKind,
    /// Date or week; empty for status.
    pub key: String,
    /// Payload text exactly as ingested.
    pub payload: String,
    /// Time of the last upsert, unix milliseconds.
    pub updated_at: u64,
}

impl From<SnapshotRecord> for Snapshot {
    fn from(record: SnapshotRecord) -> Self {
        Self {
            kind: record.key.kind(),
            key: record.key.id().to_string(),
            payload: record.payload,
            updated_at: record.updated_at,
        }
    }
}

/// Options for opening a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// `sync` the log after every upsert instead of only flushing.
    pub durable_writes: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            durable_writes: true,
        }
    }
}

/// Record counts and log size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    /// 0 or 1.
    pub status: usize,
    /// Distinct daily reports.
    pub daily: usize,
    /// Distinct weekly reports.
    pub weekly: usize,
    /// Records in the log, superseded ones included.
    pub log_records: usize,
    /// Log size in bytes.
    pub log_bytes: u64,
}

/// Outcome of [`SnapshotStore::compact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompactStats {
    /// Records before compaction.
    pub input_records: usize,
    /// Records kept (one per key).
    pub output_records: usize,
    /// Log size before.
    pub bytes_before: u64,
    /// Log size after.
    pub bytes_after: u64,
}

struct Inner {
    backend: Box<dyn StorageBackend>,
    index: HashMap<SnapshotKey, Snapshot>,
    log_records: usize,
    /// Set when a failed append could not be rolled back.
    needs_recovery: Option<String>,
}

impl Inner {
    fn check_writable(&self) -> SnapshotResult<()> {
        match &self.needs_recovery {
            Some(message) => Err(SnapshotError::NeedsRecovery {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Keyed insert-or-replace store for status, daily and weekly snapshots.
///
/// # Concurrency
///
/// Upserts take the writer lock for append + index update, so concurrent
/// upserts to one key serialize and the last to commit wins. `updated_at`
/// is stamped under that lock. Readers observe either the previous or the
/// new snapshot, never a mix.
///
/// # Failed writes
///
/// A failed append is truncated away before the error is returned. If that
/// truncation also fails, the store stops accepting writes and answers
/// [`SnapshotError::NeedsRecovery`]; reopening replays the log and drops
/// the partial record as a torn tail. Reads keep working.
pub struct SnapshotStore {
    inner: RwLock<Inner>,
    options: StoreOptions,
}

impl SnapshotStore {
    /// Opens a store over `backend`, replaying its log.
    ///
    /// A torn final record is truncated away.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read or holds damaged records
    /// before its tail.
    pub fn open(mut backend: Box<dyn StorageBackend>, options: StoreOptions) -> SnapshotResult<Self> {
        let log = backend.read_all()?;
        let mut index = HashMap::new();
        let mut log_records = 0;
        let mut offset = 0;

        while offset < log.len() {
            match SnapshotRecord::decode_at(&log, offset)? {
                Decoded::Record(record, len) => {
                    index.insert(record.key.clone(), Snapshot::from(record));
                    log_records += 1;
                    offset += len;
                }
                Decoded::TornTail => {
                    tracing::warn!(
                        offset,
                        discarded = log.len() - offset,
                        "truncating torn record at end of snapshot log"
                    );
                    backend.truncate(offset as u64)?;
                    break;
                }
            }
        }

        let inner = Inner {
            backend,
            index,
            log_records,
            needs_recovery: None,
        };
        let store = Self {
            inner: RwLock::new(inner),
            options,
        };
        let stats = store.stats()?;
        tracing::info!(
            status = stats.status,
            daily = stats.daily,
            weekly = stats.weekly,
            log_records = stats.log_records,
            "snapshot store opened"
        );
        Ok(store)
    }

    /// Opens an empty, non-persistent store.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches [`open`](Self::open).
    pub fn open_in_memory() -> SnapshotResult<Self> {
        Self::open(Box::new(InMemoryBackend::new()), StoreOptions::default())
    }

    /// Opens the store in `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be created, locked or replayed.
    pub fn open_dir(dir: &Path, options: StoreOptions) -> SnapshotResult<Self> {
        let backend = FileBackend::open_with_create_dirs(&dir.join(LOG_FILE_NAME))?;
        Self::open(Box::new(backend), options)
    }

    /// Returns the status snapshot, if one was ever ingested.
    ///
    /// Absence is the normal first-run state; callers serve
    /// [`DEFAULT_STATUS_PAYLOAD`].
    pub fn get_status(&self) -> Option<Snapshot> {
        self.get(&SnapshotKey::Status)
    }

    /// Returns the daily report for `date`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::NotFound`] if none is stored.
    pub fn get_daily(&self, date: &str) -> SnapshotResult<Snapshot> {
        self.get_report(SnapshotKey::Daily(date.to_string()))
    }

    /// Returns the weekly report for `week`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::NotFound`] if none is stored.
    pub fn get_weekly(&self, week: &str) -> SnapshotResult<Snapshot> {
        self.get_report(SnapshotKey::Weekly(week.to_string()))
    }

    /// Looks up any key.
    pub fn get(&self, key: &SnapshotKey) -> Option<Snapshot> {
        self.inner.read().index.get(key).cloned()
    }

    fn get_report(&self, key: SnapshotKey) -> SnapshotResult<Snapshot> {
        self.get(&key).ok_or_else(|| SnapshotError::NotFound {
            kind: key.kind(),
            key: key.id().to_string(),
        })
    }

    /// Replaces the status snapshot.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `payload` is not a JSON object, or a
    /// storage error if the write fails.
    pub fn upsert_status(&self, payload: &[u8]) -> SnapshotResult<Snapshot> {
        self.ingest(SnapshotKind::Status, payload)
    }

    /// Inserts or replaces the daily report for `date`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `payload` is malformed, has no `date`,
    /// or its `date` differs from `date`; a storage error if the write fails.
    pub fn upsert_daily(&self, date: &str, payload: &[u8]) -> SnapshotResult<Snapshot> {
        self.upsert_keyed(SnapshotKind::Daily, date, payload)
    }

    /// Inserts or replaces the weekly report for `week`.
    ///
    /// # Errors
    ///
    /// Same as [`upsert_daily`](Self::upsert_daily), for the `week` field.
    pub fn upsert_weekly(&self, week: &str, payload: &[u8]) -> SnapshotResult<Snapshot> {
        self.upsert_keyed(SnapshotKind::Weekly, week, payload)
    }

    fn upsert_keyed(&self, kind: SnapshotKind, id: &str, payload: &[u8]) -> SnapshotResult<Snapshot> {
        let extracted = extract_key(kind, payload)?;
        if extracted.as_deref() != Some(id) {
            return Err(SnapshotError::validation(format!(
                "{kind} payload key {:?} does not match {id:?}",
                extracted.unwrap_or_default()
            )));
        }
        self.put(SnapshotKey::new(kind, id), payload)
    }

    /// Validates `payload`, derives its key and upserts it.
    ///
    /// This is the ingest path: the storage key always comes from the
    /// payload's own `date`/`week` field.
    ///
    /// # Errors
    ///
    /// Returns a validation error before touching the log if the payload
    /// is malformed; a storage error if the write fails;
    /// [`SnapshotError::NeedsRecovery`] once a failed write could not be
    /// rolled back.
    pub fn ingest(&self, kind: SnapshotKind, payload: &[u8]) -> SnapshotResult<Snapshot> {
        let id = extract_key(kind, payload)?.unwrap_or_default();
        self.put(SnapshotKey::new(kind, id), payload)
    }

    fn put(&self, key: SnapshotKey, payload: &[u8]) -> SnapshotResult<Snapshot> {
        let payload = std::str::from_utf8(payload)
            .map_err(|_| SnapshotError::validation(format!("{} payload is not UTF-8", key.kind())))?;

        let mut inner = self.inner.write();
        inner.check_writable()?;
        let record = SnapshotRecord {
            key,
            updated_at: unix_millis(),
            payload: payload.to_string(),
        };
        let bytes = record.encode()?;

        let start = inner.backend.size()?;
        if let Err(err) = self.append_record(inner.backend.as_mut(), &bytes) {
            tracing::error!(key = %record.key, error = %err, "snapshot append failed");
            if let Err(rollback) = inner.backend.truncate(start) {
                tracing::error!(error = %rollback, "failed to roll back partial append; refusing writes");
                let message = format!("rollback to {start} bytes failed: {rollback}");
                inner.needs_recovery = Some(message.clone());
                return Err(SnapshotError::NeedsRecovery { message });
            }
            return Err(err);
        }

        let key = record.key.clone();
        let snapshot = Snapshot::from(record);
        inner.index.insert(key.clone(), snapshot.clone());
        inner.log_records += 1;
        tracing::debug!(key = %key, bytes = bytes.len(), "snapshot upserted");

        Ok(snapshot)
    }

    fn append_record(&self, backend: &mut dyn StorageBackend, bytes: &[u8]) -> SnapshotResult<()> {
        backend.append(bytes)?;
        backend.flush()?;
        if self.options.durable_writes {
            backend.sync()?;
        }
        Ok(())
    }

    /// Returns record counts and log size.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the log size cannot be read.
    pub fn stats(&self) -> SnapshotResult<StoreStats> {
        let inner = self.inner.read();
        let mut stats = StoreStats {
            log_records: inner.log_records,
            log_bytes: inner.backend.size()?,
            ..StoreStats::default()
        };
        for key in inner.index.keys() {
            match key.kind() {
                SnapshotKind::Status => stats.status += 1,
                SnapshotKind::Daily => stats.daily += 1,
                SnapshotKind::Weekly => stats.weekly += 1,
            }
        }
        Ok(stats)
    }

    /// Returns the stored keys of `kind`, sorted.
    pub fn keys(&self, kind: SnapshotKind) -> Vec<String> {
        let inner = self.inner.read();
        let mut keys: Vec<String> = inner
            .index
            .keys()
            .filter(|key| key.kind() == kind)
            .map(|key| key.id().to_string())
            .collect();
        keys.sort();
        keys
    }

    /// Reports what [`compact`](Self::compact) would do without writing.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the log size cannot be read.
    pub fn plan_compaction(&self) -> SnapshotResult<CompactStats> {
        let inner = self.inner.read();
        let (log, output_records) = live_log(&inner.index)?;
        Ok(CompactStats {
            input_records: inner.log_records,
            output_records,
            bytes_before: inner.backend.size()?,
            bytes_after: log.len() as u64,
        })
    }

    /// Rewrites the log so it holds only the live record for each key.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the rewrite fails; the previous log is
    /// left in place. Returns [`SnapshotError::NeedsRecovery`] after an
    /// unrecoverable append failure.
    pub fn compact(&self) -> SnapshotResult<CompactStats> {
        let mut inner = self.inner.write();
        inner.check_writable()?;
        let bytes_before = inner.backend.size()?;
        let (log, output_records) = live_log(&inner.index)?;

        inner.backend.rewrite(&log)?;
        let stats = CompactStats {
            input_records: inner.log_records,
            output_records,
            bytes_before,
            bytes_after: log.len() as u64,
        };
        inner.log_records = output_records;
        tracing::info!(
            input_records = stats.input_records,
            output_records = stats.output_records,
            bytes_before,
            bytes_after = stats.bytes_after,
            "snapshot log compacted"
        );

        Ok(stats)
    }
}

/// Encodes the live record of every key, ordered by kind then key.
fn live_log(index: &HashMap<SnapshotKey, Snapshot>) -> SnapshotResult<(Vec<u8>, usize)> {
    let mut live: Vec<&Snapshot> = index.values().collect();
    live.sort_by(|a, b| (a.kind, &a.key).cmp(&(b.kind, &b.key)));

    let mut log = Vec::new();
    for snapshot in &live {
        let record = SnapshotRecord {
            key: SnapshotKey::new(snapshot.kind, snapshot.key.as_str()),
            updated_at: snapshot.updated_at,
            payload: snapshot.payload.clone(),
        };
        log.extend(record.encode()?);
    }
    Ok((log, live.len()))
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
