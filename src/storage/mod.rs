//! Local filesystem helpers
//!
//! Shared by the preview rasterizer and the file cache processor. Writes go
//! through a uniquely named temporary sibling followed by a rename, so an
//! existence check never observes a half-written file.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Whether `path` exists and is a directory
pub async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false)
}

/// Whether `path` exists
pub async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

/// Create `path` and its parents.
///
/// A failed creation is only reported when the directory is still missing
/// afterwards; another writer may have created it in between.
pub async fn ensure_directory(path: &Path) -> io::Result<()> {
    if is_dir(path).await {
        return Ok(());
    }

    match tokio::fs::create_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if is_dir(path).await => {
            tracing::debug!(path = %path.display(), error = %e, "Directory appeared concurrently");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Temporary sibling of `target` in the same directory
fn temp_sibling(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()))
}

/// Write `data` to `target` via a temporary sibling and a rename
pub async fn write_atomically(target: &Path, data: &[u8]) -> io::Result<()> {
    let temp = temp_sibling(target);
    if let Err(e) = tokio::fs::write(&temp, data).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e);
    }
    rename_into_place(&temp, target).await
}

/// Copy `source` to `target` via a temporary sibling and a rename
pub async fn copy_atomically(source: &Path, target: &Path) -> io::Result<()> {
    let temp = temp_sibling(target);
    if let Err(e) = tokio::fs::copy(source, &temp).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e);
    }
    rename_into_place(&temp, target).await
}

async fn rename_into_place(temp: &Path, target: &Path) -> io::Result<()> {
    if let Err(e) = tokio::fs::rename(temp, target).await {
        let _ = tokio::fs::remove_file(temp).await;
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ensure_directory_creates_nested() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b").join("c");

        ensure_directory(&nested).await.unwrap();
        assert!(nested.is_dir());

        // Already present
        ensure_directory(&nested).await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_directory_fails_when_blocked_by_file() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = ensure_directory(&blocker.join("child")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_write_and_copy_atomically() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("first.bin");
        let second = temp_dir.path().join("second.bin");

        write_atomically(&first, b"payload").await.unwrap();
        copy_atomically(&first, &second).await.unwrap();

        assert_eq!(std::fs::read(&second).unwrap(), b"payload");
        assert!(exists(&second).await);

        // Only the two targets remain, no temporaries
        let entries = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(entries, 2);
    }

    #[tokio::test]
    async fn test_copy_missing_source_leaves_nothing_behind() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("target.bin");

        assert!(copy_atomically(&temp_dir.path().join("missing"), &target).await.is_err());
        assert!(!exists(&target).await);
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }
}
