//! LMDB environment setup.

use std::path::{Path, PathBuf};

use heed::{Env, EnvOpenOptions};
use tracing::info;

use crate::LmdbError;

/// Default map size: plenty for a proposal cache and a few vote maps.
pub const DEFAULT_MAP_SIZE: usize = 64 * 1024 * 1024;

/// Wraps the LMDB environment opened at a data directory.
pub struct LmdbEnvironment {
    env: Env,
    path: PathBuf,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        let mut options = EnvOpenOptions::new();
        options.map_size(map_size).max_dbs(max_dbs);
        // SAFETY: each data directory is opened once per process and is not
        // written to by anything outside this environment while it is open.
        let env = unsafe { options.open(path)? };
        info!(path = %path.display(), "opened LMDB environment");
        Ok(Self {
            env,
            path: path.to_path_buf(),
        })
    }

    /// Open with default sizing.
    pub fn open_default(path: &Path) -> Result<Self, LmdbError> {
        Self::open(path, 4, DEFAULT_MAP_SIZE)
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("cache").join("governdao");

        let environment = LmdbEnvironment::open(&nested, 2, DEFAULT_MAP_SIZE).unwrap();

        assert!(nested.is_dir());
        assert_eq!(environment.path(), nested.as_path());
        assert_eq!(environment.env().info().map_size, DEFAULT_MAP_SIZE);
    }
}
