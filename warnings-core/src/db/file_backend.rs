//! Directory-of-JSON-files backend
//!
//! Each key is stored as `<key>.json` inside the data directory. Writes hold an
//! exclusive lock on `<dir>/.lock` and replace the file through a temporary
//! sibling so a reader never sees a half-written value.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::traits::{validate_key, BackendType, KeyValueBackend};

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY: Duration = Duration::from_millis(100);

/// File backend implementation
pub struct FileBackend {
    dir: PathBuf,
    lock_file_path: PathBuf,
}

impl FileBackend {
    /// Creates a backend rooted at `dir`; the directory is created on first write
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let lock_file_path = dir.join(".lock");
        Self {
            dir,
            lock_file_path,
        }
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Acquire an exclusive lock on the directory for writing.
    /// The returned handle must be held for the duration of the write.
    fn acquire_write_lock(&self) -> Result<File> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data directory: {:?}", self.dir))?;

        let mut lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to create lock file: {:?}", self.lock_file_path))?;

        let start = Instant::now();
        loop {
            match FileExt::try_lock_exclusive(&lock_file) {
                Ok(()) => break,
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        anyhow::bail!(
                            "Timeout waiting for store lock - another process may be writing: {:?}",
                            self.dir
                        );
                    }
                    std::thread::sleep(LOCK_RETRY);
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire lock on {:?}", self.lock_file_path)
                    })
                }
            }
        }

        // Lock holder info, only useful when debugging a stuck lock
        let _ = writeln!(
            lock_file,
            "Locked by PID {} at {}",
            std::process::id(),
            chrono::Utc::now().to_rfc3339()
        );

        Ok(lock_file)
    }

    /// Acquire a shared lock for reading, if a lock file exists at all
    fn acquire_read_lock(&self) -> Result<Option<File>> {
        if !self.lock_file_path.exists() {
            return Ok(None);
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .open(&self.lock_file_path)
            .with_context(|| format!("Failed to open lock file: {:?}", self.lock_file_path))?;

        let start = Instant::now();
        loop {
            match FileExt::try_lock_shared(&lock_file) {
                Ok(()) => return Ok(Some(lock_file)),
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > LOCK_TIMEOUT {
                        anyhow::bail!(
                            "Timeout waiting for store lock - another process may be writing: {:?}",
                            self.dir
                        );
                    }
                    std::thread::sleep(LOCK_RETRY);
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to acquire lock on {:?}", self.lock_file_path)
                    })
                }
            }
        }
    }
}

impl KeyValueBackend for FileBackend {
    fn backend_type(&self) -> BackendType {
        BackendType::File
    }

    fn location(&self) -> &Path {
        &self.dir
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.value_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let _lock = self.acquire_read_lock()?;
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let _lock = self.acquire_write_lock()?;

        let path = self.value_path(key);
        let tmp_path = self.dir.join(format!(".{}.json.tmp", key));
        fs::write(&tmp_path, value).with_context(|| format!("Failed to write {:?}", tmp_path))?;
        fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to replace {:?}", path))?;

        // Lock is released when _lock is dropped
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.value_path(key);
        if !path.exists() {
            return Ok(());
        }

        let _lock = self.acquire_write_lock()?;
        fs::remove_file(&path).with_context(|| format!("Failed to remove {:?}", path))?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list {:?}", self.dir))?
        {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_key(stem).is_ok() {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_backend_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().join("data"));

        assert_eq!(backend.get("warnings").unwrap(), None);

        backend.set("warnings", "[]").unwrap();
        assert_eq!(backend.get("warnings").unwrap(), Some("[]".to_string()));
        assert!(temp_dir.path().join("data").join("warnings.json").exists());
    }

    #[test]
    fn test_file_backend_overwrite_and_remove() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path());

        backend.set("theme", "light").unwrap();
        backend.set("theme", "dark").unwrap();
        assert_eq!(backend.get("theme").unwrap().as_deref(), Some("dark"));

        backend.remove("theme").unwrap();
        assert!(!backend.contains("theme").unwrap());
        // Removing twice is fine
        backend.remove("theme").unwrap();
    }

    #[test]
    fn test_file_backend_keys_ignore_other_files() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path());

        backend.set("templates", "[]").unwrap();
        backend.set("nextWarningNumber", "3").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "hi").unwrap();

        assert_eq!(
            backend.keys().unwrap(),
            vec!["nextWarningNumber".to_string(), "templates".to_string()]
        );
    }

    #[test]
    fn test_file_backend_rejects_path_keys() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path());
        assert!(backend.set("../escape", "x").is_err());
    }
}
