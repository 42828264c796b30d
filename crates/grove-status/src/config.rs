//! Repository configuration, read from `<control dir>/config.toml`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Name of the configuration file inside the control directory.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroveConfig {
    /// Control directory name at the repository root. Never read from the
    /// config file, which lives inside it.
    #[serde(skip)]
    pub control_dir: String,
    /// Index file, relative to the control directory.
    pub index_file: String,
    /// Loose object directory, relative to the control directory.
    pub objects_dir: String,
    /// Ignore file, relative to the repository root. Optional on disk.
    pub ignore_file: String,
    pub status: StatusOptions,
}

impl Default for GroveConfig {
    fn default() -> Self {
        Self {
            control_dir: ".grove".into(),
            index_file: "index".into(),
            objects_dir: "objects".into(),
            ignore_file: ".groveignore".into(),
            status: StatusOptions::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusOptions {
    /// Trust matching stamps instead of hashing content.
    pub metadata_fast_path: bool,
    /// Require every staged blob to be present in the object store.
    pub verify_index_objects: bool,
}

impl Default for StatusOptions {
    fn default() -> Self {
        Self {
            metadata_fast_path: true,
            verify_index_objects: false,
        }
    }
}

impl GroveConfig {
    /// Load the configuration of the repository at `root`, falling back to
    /// defaults when there is no config file.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = Self::default().control_path(root).join(CONFIG_FILE);
        Self::load_file(&path)
    }

    /// Load a specific config file. A missing file yields defaults.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn control_path(&self, root: &Path) -> PathBuf {
        root.join(&self.control_dir)
    }

    pub fn index_path(&self, root: &Path) -> PathBuf {
        self.control_path(root).join(&self.index_file)
    }

    pub fn objects_path(&self, root: &Path) -> PathBuf {
        self.control_path(root).join(&self.objects_dir)
    }

    pub fn ignore_path(&self, root: &Path) -> PathBuf {
        root.join(&self.ignore_file)
    }
}
