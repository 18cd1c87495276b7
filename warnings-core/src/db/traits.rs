//! Key-value backend abstraction
//!
//! This module defines the core trait that all storage backends must implement.
//! Values are opaque strings; typed access lives in `crate::storage::LocalStore`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Types of storage backends available
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// One JSON file per key in a data directory
    #[default]
    File,
    /// SQLite database with a single key-value table
    Sqlite,
    /// In-process map, nothing persisted
    Memory,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendType::File => write!(f, "File"),
            BackendType::Sqlite => write!(f, "SQLite"),
            BackendType::Memory => write!(f, "Memory"),
        }
    }
}

impl FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "json" => Ok(BackendType::File),
            "sqlite" | "db" => Ok(BackendType::Sqlite),
            "memory" => Ok(BackendType::Memory),
            _ => Err(format!(
                "Unknown backend: {}. Supported backends: file, sqlite, memory",
                s
            )),
        }
    }
}

/// Core trait for key-value storage backends
///
/// Every write replaces the whole value stored under a key. Backends are used
/// from a single thread but must be `Send + Sync` so front ends can hold them
/// in shared application state.
pub trait KeyValueBackend: Send + Sync {
    /// Returns the backend type
    fn backend_type(&self) -> BackendType;

    /// Returns where the data lives (directory, database file, or `:memory:`)
    fn location(&self) -> &Path;

    /// Reads the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Lists stored keys in sorted order
    fn keys(&self) -> Result<Vec<String>>;

    /// Returns true if a value is stored under `key`
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Rejects keys that cannot safely become file names or table keys
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        anyhow::bail!("Invalid storage key: {:?}", key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_from_str() {
        assert_eq!("sqlite".parse::<BackendType>().unwrap(), BackendType::Sqlite);
        assert_eq!("FILE".parse::<BackendType>().unwrap(), BackendType::File);
        assert!("redis".parse::<BackendType>().is_err());
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("nextWarningNumber").is_ok());
        assert!(validate_key("form-draft_2").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a b").is_err());
    }
}
