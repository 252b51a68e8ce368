use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::errors::StoreResult;

/// Durable home of the single snapshot blob. Writes replace the previous
/// snapshot wholesale.
pub trait SnapshotBackend: Send + Sync {
    fn describe(&self) -> String;
    fn load(&self) -> StoreResult<Option<Vec<u8>>>;
    fn save(&self, bytes: &[u8]) -> StoreResult<()>;
    fn clear(&self) -> StoreResult<()>;
}

/// Snapshot stored as one JSON file.
#[derive(Clone, Debug)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotBackend for FileBackend {
    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn load(&self) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, bytes: &[u8]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let staging = self.staging_path();
        fs::write(&staging, bytes)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Process-local snapshot slot for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slot: Mutex<Option<Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            slot: Mutex::new(Some(bytes.into())),
        }
    }

    pub fn raw(&self) -> Option<Vec<u8>> {
        self.slot.lock().clone()
    }
}

impl SnapshotBackend for MemoryBackend {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn load(&self) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.slot.lock().clone())
    }

    fn save(&self, bytes: &[u8]) -> StoreResult<()> {
        *self.slot.lock() = Some(bytes.to_vec());
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}
