//! Directory-backed store for persistent storage.

use crate::backend::StoreBackend;
use crate::error::{StorageError, StorageResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A directory-backed store.
///
/// The store root holds one `meta.<ext>` file for the topology descriptor and
/// one `<addr>.<ext>` file per segment, where `<addr>` is eight lowercase hex
/// digits of the segment address. Data survives process restarts.
///
/// A missing file is reported as `Ok(None)`, never as an error: a fresh
/// directory behaves exactly like an empty store.
///
/// # Example
///
/// ```no_run
/// use arcmap_storage::{FileStore, StoreBackend};
/// use std::path::Path;
///
/// let mut store = FileStore::open(Path::new("data")).unwrap();
/// store.write(0xff, b"payload").unwrap();
/// assert_eq!(store.read(0xff).unwrap().as_deref(), Some(&b"payload"[..]));
/// ```
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    ext: &'static str,
}

impl FileStore {
    /// Opens a store rooted at `dir` with the default `json` extension,
    /// creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: &Path) -> StorageResult<Self> {
        Self::open_with_extension(dir, "json")
    }

    /// Opens a store rooted at `dir` using `ext` for all object files.
    ///
    /// Use `"bin"` when pairing the store with the binary codec so that the
    /// on-disk names reflect the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open_with_extension(dir: &Path, ext: &'static str) -> StorageResult<Self> {
        fs::create_dir_all(dir).map_err(|err| {
            StorageError::unavailable(dir.display().to_string(), err.to_string())
        })?;

        Ok(Self {
            dir: dir.to_path_buf(),
            ext,
        })
    }

    /// Returns the store root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn meta_path(&self) -> PathBuf {
        self.dir.join(format!("meta.{}", self.ext))
    }

    fn segment_path(&self, addr: u64) -> PathBuf {
        self.dir.join(format!("{addr:08x}.{}", self.ext))
    }

    fn read_file(path: &Path) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

impl StoreBackend for FileStore {
    fn read_meta(&self) -> StorageResult<Option<Vec<u8>>> {
        Self::read_file(&self.meta_path())
    }

    fn write_meta(&mut self, data: &[u8]) -> StorageResult<()> {
        fs::write(self.meta_path(), data)?;
        Ok(())
    }

    fn read(&self, addr: u64) -> StorageResult<Option<Vec<u8>>> {
        Self::read_file(&self.segment_path(addr))
    }

    fn write(&mut self, addr: u64, data: &[u8]) -> StorageResult<()> {
        fs::write(self.segment_path(addr), data)?;
        Ok(())
    }
}
