use anyhow::{Context, Result};
use directories::ProjectDirs;
use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

pub struct LocalStorage;

impl LocalStorage {
    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("org", "subpack", "subpack")
    }

    pub fn data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|p| p.data_dir().to_path_buf())
    }

    pub fn config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|p| p.config_dir().to_path_buf())
    }

    /// Atomic write: Write to .tmp file then rename
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }

    /// Runs `f` while holding an exclusive lock on `<path>.lock`.
    pub fn with_lock<T, F>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
        }
        let lock_path = path.with_extension("lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("opening lock file {}", lock_path.display()))?;
        lock_file.lock_exclusive()?;
        let result = f();
        let _ = FileExt::unlock(&lock_file);
        result
    }

    /// Reads JSON from `path`. A missing file yields `None`; an unreadable
    /// or malformed one is an error.
    pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let value = serde_json::from_str(&json)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(value))
    }

    pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        Self::atomic_write(path, json)
    }
}
