//! # Configuration
//!
//! Settings are loaded with [`confique`], layered in priority order:
//!
//! 1. **Environment variables**: `NOTICEBOARD_APP_NAME`, `DISABLE_NAG_NOTICES`.
//! 2. **TOML file**: optional, passed to [`NoticeConfig::load`].
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `app_name` | `noticeboard` | Names the default manager's storage key |
//! | `disable_nag_notices` | `false` | Treat nag notices like any other after render |
//! | `without_wrapping` | `false` | Default `no-wrap` for every notice |
//! | `data_dir` | OS data dir | Root of the file backend |

use crate::error::{NoticeError, Result};
use crate::str_case;
use crate::store::FsBackend;
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_APP_NAME: &str = "noticeboard";

/// Configuration for notice managers, usually stored in `noticeboard.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NoticeConfig {
    /// Application name; the default manager stores under `{app}_notices`.
    #[config(default = "noticeboard", env = "NOTICEBOARD_APP_NAME")]
    pub app_name: String,

    /// When set, nag notices are deleted after render like any other.
    #[config(default = false, env = "DISABLE_NAG_NOTICES")]
    pub disable_nag_notices: bool,

    /// Do not wrap messages in paragraphs.
    #[config(default = false)]
    pub without_wrapping: bool,

    /// Where the file backend keeps its slots.
    pub data_dir: Option<PathBuf>,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            disable_nag_notices: false,
            without_wrapping: false,
            data_dir: None,
        }
    }
}

impl NoticeConfig {
    /// Env over `file` (when given and present) over defaults.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = file {
            builder = builder.file(path);
        }
        builder
            .load()
            .map_err(|e| NoticeError::Config(e.to_string()))
    }

    /// Storage key of the default manager.
    pub fn storage_key(&self) -> String {
        str_case::app_storage_key(&self.app_name)
    }

    /// File backend rooted at `data_dir`, or the OS data directory.
    pub fn fs_backend(&self) -> Result<FsBackend> {
        match &self.data_dir {
            Some(dir) => Ok(FsBackend::new(dir)),
            None => FsBackend::default_location(),
        }
    }
}
