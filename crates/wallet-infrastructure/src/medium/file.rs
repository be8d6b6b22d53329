//! Directory-backed medium: one file per key.
//!
//! Writes go to a temporary sibling file that is synced and then renamed over
//! the target, under an exclusive lock file, so a crash never leaves a
//! half-written value behind.

use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use wallet_core::storage::{KeyValueMedium, MediumError};

const VALUE_EXTENSION: &str = "val";

#[derive(Debug, Clone)]
pub struct FileMedium {
    root: PathBuf,
}

impl FileMedium {
    /// Creates the medium, creating `root` if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, MediumError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| MediumError::Unavailable(format!(
            "cannot create {}: {}",
            root.display(),
            e
        )))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, MediumError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(MediumError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{}.{}", key, VALUE_EXTENSION)))
    }

    fn io_error(key: &str, err: std::io::Error) -> MediumError {
        MediumError::Io {
            key: key.to_string(),
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }

    fn write_atomic(path: &Path, value: &str) -> std::io::Result<()> {
        let _lock = FileLock::acquire(path)?;

        let tmp_path = temp_path(path);
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(value.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, path)
    }
}

impl KeyValueMedium for FileMedium {
    fn get(&self, key: &str) -> Result<Option<String>, MediumError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), MediumError> {
        let path = self.path_for(key)?;
        Self::write_atomic(&path, value).map_err(|e| Self::io_error(key, e))
    }

    fn remove(&self, key: &str) -> Result<(), MediumError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    fn keys(&self) -> Result<Vec<String>, MediumError> {
        let entries = fs::read_dir(&self.root).map_err(|e| Self::io_error("*", e))?;
        let mut keys = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Self::io_error("*", e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(VALUE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", file_name))
}

/// Exclusive lock held for the duration of one write.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> std::io::Result<Self> {
        let lock_path = path.with_extension("lock");
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock happens when the handle closes; the lock file itself is best effort.
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove() {
        let temp_dir = TempDir::new().unwrap();
        let medium = FileMedium::open(temp_dir.path().join("store")).unwrap();

        assert_eq!(medium.get("remeexBalance_v4").unwrap(), None);
        medium.set("remeexBalance_v4", "abc").unwrap();
        assert_eq!(medium.get("remeexBalance_v4").unwrap().as_deref(), Some("abc"));
        assert_eq!(medium.keys().unwrap(), vec!["remeexBalance_v4".to_string()]);

        medium.remove("remeexBalance_v4").unwrap();
        assert_eq!(medium.get("remeexBalance_v4").unwrap(), None);
        medium.remove("remeexBalance_v4").unwrap();
    }

    #[test]
    fn test_no_temp_or_lock_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let medium = FileMedium::open(temp_dir.path()).unwrap();
        medium.set("key", "value").unwrap();

        assert!(!temp_dir.path().join(".key.val.tmp").exists());
        assert!(!temp_dir.path().join("key.lock").exists());
        assert!(temp_dir.path().join("key.val").exists());
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let medium = FileMedium::open(temp_dir.path()).unwrap();
        assert!(matches!(
            medium.set("../escape", "x"),
            Err(MediumError::InvalidKey(_))
        ));
        assert!(matches!(medium.get(""), Err(MediumError::InvalidKey(_))));
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let temp_dir = TempDir::new().unwrap();
        let medium = FileMedium::open(temp_dir.path()).unwrap();
        medium.set("k", "first").unwrap();
        medium.set("k", "second").unwrap();
        assert_eq!(medium.get("k").unwrap().as_deref(), Some("second"));
    }
}
