//! Backup and migration utilities
//!
//! Copies every stored key between backends, and dumps/restores the whole
//! store as a single JSON object for moving data between machines.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::Path;

use super::traits::KeyValueBackend;

/// Copies every key from `source` into `target`, returning how many were copied
pub fn migrate(source: &dyn KeyValueBackend, target: &dyn KeyValueBackend) -> Result<usize> {
    let keys = source.keys().context("Failed to list source keys")?;
    let mut copied = 0;
    for key in &keys {
        if let Some(value) = source.get(key)? {
            target
                .set(key, &value)
                .with_context(|| format!("Failed to copy key '{}'", key))?;
            copied += 1;
        }
    }
    log::info!(
        "Migrated {} keys from {} to {}",
        copied,
        source.backend_type(),
        target.backend_type()
    );
    Ok(copied)
}

/// Writes every key to `path` as one pretty-printed JSON object.
///
/// Values that are themselves JSON are embedded as JSON; anything else (the
/// plain-string theme, say) is embedded as a JSON string.
pub fn export_backup<P: AsRef<Path>>(backend: &dyn KeyValueBackend, path: P) -> Result<usize> {
    let mut object = Map::new();
    for key in backend.keys()? {
        if let Some(raw) = backend.get(&key)? {
            let value = serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
            object.insert(key, value);
        }
    }

    let count = object.len();
    let json = serde_json::to_string_pretty(&Value::Object(object))
        .context("Failed to serialize backup")?;
    std::fs::write(path.as_ref(), json)
        .with_context(|| format!("Failed to write backup: {:?}", path.as_ref()))?;
    Ok(count)
}

/// Restores a backup written by [`export_backup`], returning how many keys were restored.
/// Keys in `allowed` are restored; everything else in the file is skipped.
pub fn import_backup<P: AsRef<Path>>(
    backend: &dyn KeyValueBackend,
    path: P,
    allowed: &[&str],
) -> Result<usize> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read backup: {:?}", path.as_ref()))?;
    let value: Value = serde_json::from_str(&content).context("Failed to parse backup JSON")?;
    let Value::Object(object) = value else {
        anyhow::bail!("Backup file must contain a JSON object");
    };

    let mut restored = 0;
    for (key, value) in object {
        if !allowed.contains(&key.as_str()) {
            log::warn!("Skipping unknown key '{}' in backup", key);
            continue;
        }
        let raw = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        backend.set(&key, &raw)?;
        restored += 1;
    }
    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FileBackend, MemoryBackend, SqliteBackend};
    use tempfile::TempDir;

    #[test]
    fn test_migrate_file_to_sqlite() {
        let temp_dir = TempDir::new().unwrap();
        let file = FileBackend::new(temp_dir.path().join("data"));
        file.set("warnings", "[]").unwrap();
        file.set("theme", "dark").unwrap();

        let sqlite = SqliteBackend::new(temp_dir.path().join("warnings.db")).unwrap();
        let count = migrate(&file, &sqlite).unwrap();

        assert_eq!(count, 2);
        assert_eq!(sqlite.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_backup_export_import() {
        let temp_dir = TempDir::new().unwrap();
        let backup_path = temp_dir.path().join("backup.json");

        let source = MemoryBackend::new();
        source.set("theme", "dark").unwrap();
        source.set("nextWarningNumber", "12").unwrap();
        source.set("warnings", r#"[{"id":"a"}]"#).unwrap();

        assert_eq!(export_backup(&source, &backup_path).unwrap(), 3);

        let target = MemoryBackend::new();
        let restored = import_backup(
            &target,
            &backup_path,
            &["theme", "nextWarningNumber", "warnings"],
        )
        .unwrap();

        assert_eq!(restored, 3);
        assert_eq!(target.get("theme").unwrap().as_deref(), Some("dark"));
        assert_eq!(target.get("nextWarningNumber").unwrap().as_deref(), Some("12"));
        assert_eq!(target.get("warnings").unwrap().as_deref(), Some(r#"[{"id":"a"}]"#));
    }

    #[test]
    fn test_import_skips_unknown_keys() {
        let temp_dir = TempDir::new().unwrap();
        let backup_path = temp_dir.path().join("backup.json");
        std::fs::write(&backup_path, r#"{"theme":"light","other":1}"#).unwrap();

        let target = MemoryBackend::new();
        let restored = import_backup(&target, &backup_path, &["theme"]).unwrap();
        assert_eq!(restored, 1);
        assert!(!target.contains("other").unwrap());
    }

    #[test]
    fn test_import_rejects_non_object() {
        let temp_dir = TempDir::new().unwrap();
        let backup_path = temp_dir.path().join("backup.json");
        std::fs::write(&backup_path, "[1,2]").unwrap();

        let target = MemoryBackend::new();
        assert!(import_backup(&target, &backup_path, &["theme"]).is_err());
    }
}
