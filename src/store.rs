use crate::config::CorruptStorePolicy;
use crate::model::Store;
use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Reads the store at `path` without modifying anything on disk. A missing
/// file, or an unreadable one under `Reset`, yields an empty store labelled
/// `source_label`.
pub fn load_store(path: &Path, policy: CorruptStorePolicy, source_label: &str) -> Result<Store> {
    let Some(content) = read_store_file(path)? else {
        return Ok(Store::new(source_label));
    };

    match serde_json::from_str::<Store>(&content) {
        Ok(store) => Ok(store),
        Err(err) => match policy {
            CorruptStorePolicy::Fail => Err(err)
                .with_context(|| format!("failed to parse store file {}", path.display())),
            CorruptStorePolicy::Reset => {
                warn!(
                    store = %path.display(),
                    error = %err,
                    "store file unreadable; starting from an empty store"
                );
                Ok(Store::new(source_label))
            }
        },
    }
}

/// Moves an unparseable store file to `<stem>.broken.<timestamp>.json`.
/// Returns the backup path, or `None` when the file is absent or parses.
pub fn back_up_broken_store(path: &Path) -> Result<Option<PathBuf>> {
    let Some(content) = read_store_file(path)? else {
        return Ok(None);
    };
    if serde_json::from_str::<Store>(&content).is_ok() {
        return Ok(None);
    }

    let backup = broken_backup_path(path);
    std::fs::rename(path, &backup).with_context(|| {
        format!(
            "failed to move broken store {} to {}",
            path.display(),
            backup.display()
        )
    })?;
    warn!(store = %path.display(), backup = %backup.display(), "broken store moved aside");
    Ok(Some(backup))
}

pub fn save_store(path: &Path, store: &Store) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create store directory {}", parent.display()))?;
    }

    let serialized = serde_json::to_string_pretty(store)?;
    let tmp_path = temp_path(path);
    std::fs::write(&tmp_path, serialized)
        .with_context(|| format!("failed to write temp store {}", tmp_path.display()))?;
    if let Err(err) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err).with_context(|| format!("failed to replace store {}", path.display()));
    }
    Ok(())
}

fn read_store_file(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    std::fs::read_to_string(path)
        .map(Some)
        .with_context(|| format!("failed to read store file {}", path.display()))
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|v| v.to_str())
        .unwrap_or("hijri.json");
    path.with_file_name(format!("{name}.tmp.{}", std::process::id()))
}

fn broken_backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|v| v.to_str())
        .unwrap_or("hijri");
    let tag = Local::now().format("%Y%m%d_%H%M%S");
    path.with_file_name(format!("{stem}.broken.{tag}.json"))
}
