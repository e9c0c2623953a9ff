//! On-disk layout of the idepack home directory
//!
//! ```text
//! <root>/
//!   config.yaml
//!   repos/<name>/                      installed packages
//!   cache/packages/<name>-<version>.tar.gz
//!   registry/{local,test,official}.json
//!   bin/                               executable symlinks
//! ```

use std::path::{Path, PathBuf};

use crate::error::{CoreError, IoContext, Result};

/// Environment variable overriding the home directory
pub const HOME_ENV: &str = "IDEPACK_HOME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathLayout {
    root: PathBuf,
}

impl PathLayout {
    /// Resolve the root from `$IDEPACK_HOME`, else `~/.idepack`
    pub fn from_env() -> Result<Self> {
        if let Some(root) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::with_root(PathBuf::from(root)));
        }
        let home = dirs::home_dir().ok_or(CoreError::HomeNotFound)?;
        Ok(Self::with_root(home.join(".idepack")))
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.root.join("repos")
    }

    /// Install directory of one package
    pub fn install_dir(&self, name: &str) -> PathBuf {
        self.repos_dir().join(name)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache").join("packages")
    }

    /// Deterministic cache path for a package archive
    pub fn cache_path(&self, name: &str, version: &str) -> PathBuf {
        self.cache_dir().join(format!("{name}-{version}.tar.gz"))
    }

    pub fn registry_dir(&self) -> PathBuf {
        self.root.join("registry")
    }

    pub fn registry_file(&self, tier: &str) -> PathBuf {
        self.registry_dir().join(format!("{tier}.json"))
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Create every directory of the layout
    pub fn ensure(&self) -> Result<()> {
        for dir in [
            self.repos_dir(),
            self.cache_dir(),
            self.registry_dir(),
            self.bin_dir(),
        ] {
            std::fs::create_dir_all(&dir).io_context("create directory", &dir)?;
        }
        Ok(())
    }
}
