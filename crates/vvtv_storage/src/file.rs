//! File-backed log with single-writer locking.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A file-based log.
///
/// The file is opened read/write and held under an exclusive advisory
/// lock for the lifetime of the backend, so a second control plane
/// pointed at the same data directory fails fast with
/// [`StorageError::Locked`] instead of interleaving writes.
///
/// # Durability
///
/// - `flush()` pushes buffered data to the OS
/// - `sync()` calls `File::sync_all()`
/// - `rewrite()` writes a sibling temp file, syncs it and renames it over
///   the log
///
/// # Example
///
/// ```no_run
/// use vvtv_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("snapshots.log")).unwrap();
/// backend.append(b"record").unwrap();
/// backend.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: Mutex<File>,
    size: u64,
}

impl FileBackend {
    /// Opens or creates a log file and takes the exclusive lock.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Locked`] if another process holds the lock,
    /// or an I/O error if the file cannot be opened.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        lock_exclusive(&file, path)?;

        let size = file.metadata()?.len();
        tracing::debug!(path = %path.display(), size, "opened snapshot log");

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            size,
        })
    }

    /// Opens a log file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be opened and locked.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".rewrite");
        PathBuf::from(name)
    }
}

fn lock_exclusive(file: &File, path: &Path) -> StorageResult<()> {
    file.try_lock_exclusive().map_err(|_| StorageError::Locked {
        path: path.to_path_buf(),
    })
}

impl StorageBackend for FileBackend {
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(0))?;

        let mut buffer = Vec::with_capacity(self.size as usize);
        file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let offset = self.size;
        if data.is_empty() {
            return Ok(offset);
        }

        let file = self.file.get_mut();
        file.seek(SeekFrom::End(0))?;
        file.write_all(data)?;
        self.size += data.len() as u64;

        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.file.get_mut().flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.file.get_mut().sync_all()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.size)
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        if new_size > self.size {
            return Err(StorageError::InvalidTruncate {
                requested: new_size,
                size: self.size,
            });
        }

        let file = self.file.get_mut();
        file.set_len(new_size)?;
        file.sync_all()?;
        self.size = new_size;

        Ok(())
    }

    fn rewrite(&mut self, data: &[u8]) -> StorageResult<()> {
        let temp_path = self.temp_path();
        let mut temp = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        temp.write_all(data)?;
        temp.sync_all()?;
        lock_exclusive(&temp, &temp_path)?;

        fs::rename(&temp_path, &self.path)?;
        #[cfg(unix)]
        if let Some(parent) = self.path.parent() {
            File::open(parent)?.sync_all()?;
        }

        // Dropping the old handle releases the lock on the replaced inode.
        *self.file.get_mut() = temp;
        self.size = data.len() as u64;
        tracing::debug!(path = %self.path.display(), size = self.size, "rewrote snapshot log");

        Ok(())
    }
}
