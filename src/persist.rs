//! File helpers shared by the stores.
//!
//! Overwrites go through a sibling `*.tmp` file and a rename so readers never
//! see a half-written record. Fresh records use exclusive create so an id
//! already on disk is reported instead of overwritten.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Replace `path` with `contents` via a temporary file and a rename.
pub(crate) async fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let tmp = tmp_path(path);
    fs::write(&tmp, contents).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// Create `path` and write `contents`, failing with `AlreadyExists` if the
/// file is present.
pub(crate) async fn write_new(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(contents).await?;
    file.flush().await
}

/// Read a file, mapping "does not exist" to `None`.
pub(crate) async fn read_optional(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Names and paths of the entries of `dir` accepted by `keep`, sorted by
/// name. A missing directory yields an empty list.
pub(crate) async fn list_dir(
    dir: &Path,
    keep: impl Fn(&str, bool) -> bool,
) -> io::Result<Vec<(String, PathBuf)>> {
    let mut reader = match fs::read_dir(dir).await {
        Ok(reader) => reader,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type().await?.is_dir();
        if keep(&name, is_dir) {
            entries.push((name, entry.path()));
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Subdirectories of `dir`.
pub(crate) async fn subdirectories(dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    list_dir(dir, |_, is_dir| is_dir).await
}

/// Regular files of `dir` with the given extension.
pub(crate) async fn files_with_extension(
    dir: &Path,
    extension: &str,
) -> io::Result<Vec<(String, PathBuf)>> {
    let suffix = format!(".{extension}");
    list_dir(dir, |name, is_dir| !is_dir && name.ends_with(&suffix)).await
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_new_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yaml");
        write_new(&path, b"one").await.unwrap();
        let err = write_new(&path, b"two").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "one");
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        write_atomic(&path, b"{}").await.unwrap();
        write_atomic(&path, b"{\"a\":\"KN-1\"}").await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "{\"a\":\"KN-1\"}");
        assert!(!tmp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_listing_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("02")).await.unwrap();
        fs::create_dir(dir.path().join("01")).await.unwrap();
        fs::write(dir.path().join("b.json"), "{}").await.unwrap();
        fs::write(dir.path().join("a.json"), "{}").await.unwrap();
        fs::write(dir.path().join("a.json.tmp"), "{}").await.unwrap();

        let dirs = subdirectories(dir.path()).await.unwrap();
        let names: Vec<_> = dirs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["01", "02"]);

        let files = files_with_extension(dir.path(), "json").await.unwrap();
        let names: Vec<_> = files.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["a.json", "b.json"]);

        let missing = subdirectories(&dir.path().join("nope")).await.unwrap();
        assert!(missing.is_empty());
        assert!(read_optional(&dir.path().join("nope.json")).await.unwrap().is_none());
    }
}
