use super::backend::StorageBackend;
use crate::error::{NoticeError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// File-backed slots: one `{key}.json` file per storage key under `root`.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The OS-appropriate data directory (via the `directories` crate).
    pub fn default_location() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "noticeboard").ok_or_else(|| {
            NoticeError::Backend("No home directory available for notice storage".to_string())
        })?;
        Ok(Self::new(dirs.data_dir()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`.
    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", slot_file_stem(key)))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(NoticeError::Io)?;
        }
        Ok(())
    }
}

// Keys come from snake-cased names, but anything else must not escape `root`.
fn slot_file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl StorageBackend for FsBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(NoticeError::Io)?;
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<bool> {
        self.ensure_dir()?;

        let target = self.slot_path(key);

        // Atomic write
        let tmp = self.root.join(format!(".slot-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, value).map_err(NoticeError::Io)?;
        fs::rename(&tmp, target).map_err(NoticeError::Io)?;

        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(path).map_err(NoticeError::Io)?;
        Ok(true)
    }
}
