use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::KeyValueStore;

/// One `<key>.json` file per key inside a data directory. Writes go to a
/// `<key>.json.tmp` sibling first and are renamed over the target.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
        if !valid {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("invalid storage key '{key}'"),
            ));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).await?;
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, format!("{value}\n")).await?;
        fs::rename(&temp_path, &path).await
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        assert_eq!(store.get("deviceHistory").await.expect("get"), None);
    }

    #[tokio::test]
    async fn set_then_get_round_trips_and_leaves_no_temp_file() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path().join("nested"));
        store.set("recentDevices", "[]").await.expect("set");

        let stored = store.get("recentDevices").await.expect("get");
        assert_eq!(stored.as_deref().map(str::trim_end), Some("[]"));
        assert!(dir.path().join("nested/recentDevices.json").exists());
        assert!(!dir.path().join("nested/recentDevices.json.tmp").exists());
    }

    #[tokio::test]
    async fn set_replaces_previous_value() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        store.set("deviceHistory", "[1]").await.expect("first");
        store.set("deviceHistory", "[1,2]").await.expect("second");
        let stored = store.get("deviceHistory").await.expect("get");
        assert_eq!(stored.as_deref().map(str::trim_end), Some("[1,2]"));
    }

    #[tokio::test]
    async fn rejects_keys_that_escape_the_directory() {
        let dir = tempdir().expect("tempdir");
        let store = FileStore::new(dir.path());
        let err = store.set("../outside", "[]").await.expect_err("bad key");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
