//! Default on-disk locations.

use std::path::PathBuf;

const APP_DIR: &str = "wallet-sim";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Neither a data directory nor a home directory could be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// ```text
/// ~/.local/share/wallet-sim/   # data directory
/// └── store/                   # durable records, one file per key
/// ~/.config/wallet-sim/
/// └── wallet.toml              # optional configuration
/// ```
pub struct WalletPaths;

impl WalletPaths {
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn store_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("store"))
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join("wallet.toml"))
            .ok_or(PathError::HomeDirNotFound)
    }
}
