// File: ./src/journal.rs
// Append-only log of generated packs, shared between processes.
use crate::model::PackRecord;
use crate::storage::LocalStorage;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Journal {
    pub records: Vec<PackRecord>,
}

impl Journal {
    // Caller holds the lock.
    fn load_internal(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        LocalStorage::with_lock(path, || Self::load_internal(path))
    }

    pub fn append(path: &Path, record: PackRecord) -> Result<()> {
        Self::modify(path, |records| records.push(record))
    }

    /// Load, edit and save under one exclusive lock, so concurrent
    /// generators never drop each other's records.
    pub fn modify<F>(path: &Path, f: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<PackRecord>),
    {
        let path: PathBuf = path.to_path_buf();
        LocalStorage::with_lock(&path, || {
            let mut journal = Self::load_internal(&path)?;
            f(&mut journal.records);
            LocalStorage::save_json(&path, &journal)
        })
    }
}
