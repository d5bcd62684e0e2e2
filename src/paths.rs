//! XDG-compliant path resolution for narrative-intel.
//!
//! The CLI keeps its extractor config under `$XDG_CONFIG_HOME/narrative-intel/`
//! and its preference store under `$XDG_STATE_HOME/narrative-intel/`.

use std::path::PathBuf;

use crate::error::{PathError, PathResult};

const APP_DIR: &str = "narrative-intel";

/// Global directories for narrative-intel.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// `$XDG_CONFIG_HOME/narrative-intel/`
    pub config_dir: PathBuf,
    /// `$XDG_STATE_HOME/narrative-intel/`
    pub state_dir: PathBuf,
}

impl AppPaths {
    /// Resolve XDG directories from environment variables with standard fallbacks.
    pub fn resolve() -> PathResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve using an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PathResult<Self> {
        let home = || lookup("HOME").map(PathBuf::from).ok_or(PathError::NoHome);

        let config_dir = match lookup("XDG_CONFIG_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => home()?.join(".config"),
        }
        .join(APP_DIR);

        let state_dir = match lookup("XDG_STATE_HOME") {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => home()?.join(".local/state"),
        }
        .join(APP_DIR);

        Ok(Self {
            config_dir,
            state_dir,
        })
    }

    /// Default extractor config file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    /// Default preference store file.
    pub fn prefs_file(&self) -> PathBuf {
        self.state_dir.join("prefs.json")
    }
}
