//! Storage backend layer for the warning generator
//!
//! This module provides a trait-based abstraction over key-value stores,
//! allowing the application to keep its data in a directory of JSON files,
//! a SQLite database, or memory, behind one interface.

mod backup;
mod file_backend;
mod memory_backend;
mod sqlite_backend;
mod traits;

pub use backup::{export_backup, import_backup, migrate};
pub use file_backend::FileBackend;
pub use memory_backend::MemoryBackend;
pub use sqlite_backend::SqliteBackend;
pub use traits::{BackendType, KeyValueBackend};

use anyhow::Result;
use std::path::Path;

/// Creates a backend based on an explicit type or the path's extension
pub fn open_backend(
    path: &Path,
    backend_type: Option<BackendType>,
) -> Result<Box<dyn KeyValueBackend>> {
    let bt = backend_type.unwrap_or_else(|| {
        // Infer from file extension; anything else is a data directory
        match path.extension().and_then(|e| e.to_str()) {
            Some("db") | Some("sqlite") | Some("sqlite3") => BackendType::Sqlite,
            _ => BackendType::File,
        }
    });

    log::debug!("Opening {} backend at {:?}", bt, path);
    match bt {
        BackendType::File => Ok(Box::new(FileBackend::new(path))),
        BackendType::Sqlite => Ok(Box::new(SqliteBackend::new(path)?)),
        BackendType::Memory => Ok(Box::new(MemoryBackend::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_backend_infers_type() {
        let temp_dir = TempDir::new().unwrap();

        let sqlite = open_backend(&temp_dir.path().join("store.db"), None).unwrap();
        assert_eq!(sqlite.backend_type(), BackendType::Sqlite);

        let file = open_backend(&temp_dir.path().join("data"), None).unwrap();
        assert_eq!(file.backend_type(), BackendType::File);

        let memory = open_backend(&temp_dir.path().join("x"), Some(BackendType::Memory)).unwrap();
        assert_eq!(memory.backend_type(), BackendType::Memory);
    }
}
