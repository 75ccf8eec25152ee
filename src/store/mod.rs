//! Single-file JSON record store.
//!
//! Every call loads the whole file, lets a closure inspect or change it and
//! writes it back when asked to. One exclusive lock covers the entire cycle,
//! for reads as well as writes, so two callers never observe each other
//! half way through.

pub mod error;
pub mod snapshot;

use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, info};

pub use error::{CredentialFailure, Entity, StoreError, StoreResult};
pub use snapshot::{Counter, Snapshot};

/// What a mutator did to the snapshot it was handed.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Nothing to persist.
    Read(T),
    /// The snapshot changed and must be written back.
    Write(T),
}

#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RecordStore {
    /// Opens the database at `path`, writing an empty snapshot if no file
    /// exists yet. An existing file is never overwritten.
    pub async fn initialize(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();

        match fs::metadata(&path).await {
            Ok(_) => debug!(path = %path.display(), "using existing database"),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                write_snapshot(&path, &Snapshot::new()).await?;
                info!(path = %path.display(), "created empty database");
            }
            Err(err) => return Err(err.into()),
        }

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `mutator` against a freshly loaded snapshot while holding the
    /// store lock. The snapshot is saved only for [`Outcome::Write`]; an
    /// error from the mutator leaves the file untouched.
    pub async fn with_snapshot<T, F>(&self, mutator: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Snapshot) -> StoreResult<Outcome<T>>,
    {
        let _guard = self.lock.lock().await;

        let mut snapshot = self.load().await?;
        match mutator(&mut snapshot)? {
            Outcome::Read(value) => Ok(value),
            Outcome::Write(value) => {
                write_snapshot(&self.path, &snapshot).await?;
                Ok(value)
            }
        }
    }

    async fn load(&self) -> StoreResult<Snapshot> {
        let bytes = fs::read(&self.path).await?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "loaded database");
        serde_json::from_slice(&bytes).map_err(|err| StoreError::CorruptState(err.to_string()))
    }
}

/// Replaces the file in one step: the new contents go to a sibling temp
/// file, are synced to disk, and the temp file is then renamed over the
/// original.
async fn write_snapshot(path: &Path, snapshot: &Snapshot) -> StoreResult<()> {
    let bytes = serde_json::to_vec(snapshot).map_err(std::io::Error::from)?;
    let tmp = temp_path(path);

    let mut file = fs::File::create(&tmp).await?;
    file.write_all(&bytes).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(&tmp, path).await?;

    debug!(path = %path.display(), bytes = bytes.len(), "saved database");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
