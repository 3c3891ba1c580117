//! Remote object storage, behind a narrow contract.
//!
//! Upload, download, and list-by-prefix are all the pipeline needs; the
//! bucket technology behind them is interchangeable. `FsStore` implements
//! the contract over a local directory tree, which is also what the tests
//! exercise.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub trait ObjectStore {
    /// Copy a local file under `key`; returns a URI for the stored object.
    fn upload(&self, local: &Path, key: &str) -> Result<String>;
    /// Fetch the object at `key` into `local`.
    fn download(&self, key: &str, local: &Path) -> Result<()>;
    /// All keys beginning with `prefix`, sorted.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Object store backed by a directory; keys are relative paths.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl ObjectStore for FsStore {
    fn upload(&self, local: &Path, key: &str) -> Result<String> {
        let target = self.object_path(key);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create store path {}", parent.display()))?;
        }
        fs::copy(local, &target).with_context(|| {
            format!("Failed to store {} as {}", local.display(), key)
        })?;
        Ok(format!("file://{}", target.display()))
    }

    fn download(&self, key: &str, local: &Path) -> Result<()> {
        let source = self.object_path(key);
        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::copy(&source, local)
            .with_context(|| format!("Failed to fetch object {}", key))?;
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        collect_keys(&self.root, &self.root, &mut keys)?;
        keys.retain(|key| key.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }
}

fn collect_keys(root: &Path, dir: &Path, keys: &mut Vec<String>) -> Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to list store directory {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            collect_keys(root, &path, keys)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            keys.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_download_round_trip() {
        let store_dir = tempfile::tempdir().unwrap();
        let work_dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(store_dir.path());

        let local = work_dir.path().join("note.txt");
        fs::write(&local, "payload").unwrap();

        let uri = store.upload(&local, "corpus/hindi/note.txt").unwrap();
        assert!(uri.starts_with("file://"));

        let fetched = work_dir.path().join("fetched.txt");
        store.download("corpus/hindi/note.txt", &fetched).unwrap();
        assert_eq!(fs::read_to_string(&fetched).unwrap(), "payload");
    }

    #[test]
    fn list_filters_by_prefix_and_sorts() {
        let store_dir = tempfile::tempdir().unwrap();
        let work_dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(store_dir.path());

        let local = work_dir.path().join("f");
        fs::write(&local, "x").unwrap();
        store.upload(&local, "full_audio/tamil/b.mp3").unwrap();
        store.upload(&local, "full_audio/tamil/a.mp3").unwrap();
        store.upload(&local, "full_audio/hindi/c.mp3").unwrap();
        store.upload(&local, "other/d.mp3").unwrap();

        let keys = store.list("full_audio/tamil/").unwrap();
        assert_eq!(keys, vec!["full_audio/tamil/a.mp3", "full_audio/tamil/b.mp3"]);

        let all = store.list("").unwrap();
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn missing_object_download_is_an_error() {
        let store_dir = tempfile::tempdir().unwrap();
        let work_dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(store_dir.path());
        let target = work_dir.path().join("missing.bin");
        assert!(store.download("nope/missing.bin", &target).is_err());
    }

    #[test]
    fn listing_empty_store_is_empty() {
        let store_dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(store_dir.path().join("not-created-yet"));
        assert!(store.list("").unwrap().is_empty());
    }
}
