//! Byte-level fixture backends
//!
//! A backend knows nothing about keys or content kinds; it stores named blobs
//! in a flat namespace. [`FsBackend`] keeps them as files in one directory,
//! [`MemoryBackend`] keeps them in a map for tests and ephemeral servers.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::{Result, StoreError};

/// Flat, named blob storage
#[async_trait]
pub trait FixtureBackend: Send + Sync {
    /// Every stored file name, sorted
    async fn list(&self) -> Result<Vec<String>>;

    /// Bytes stored under `file_name`
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if nothing is stored under the name.
    async fn read(&self, file_name: &str) -> Result<Vec<u8>>;

    /// Create or overwrite `file_name`
    async fn write(&self, file_name: &str, bytes: Vec<u8>) -> Result<()>;

    /// Remove `file_name`
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if nothing is stored under the name.
    async fn remove(&self, file_name: &str) -> Result<()>;

    /// Human readable location, for logs
    fn describe(&self) -> String;
}

/// Reject names that are empty or could leave the backend's namespace
///
/// # Errors
///
/// Returns `StoreError::InvalidFileName` for empty names, `.`/`..`, and names
/// containing a path separator or NUL.
pub fn validate_file_name(file_name: &str) -> Result<()> {
    let invalid = file_name.is_empty()
        || file_name == "."
        || file_name == ".."
        || file_name.contains(['/', '\\', '\0']);

    if invalid {
        return Err(StoreError::invalid_file_name(file_name));
    }
    Ok(())
}

/// Fixtures stored as files in a single directory
///
/// Writes and removals hold the lock exclusively and reads share it, so a
/// request never observes a half-written fixture from this process.
#[derive(Debug)]
pub struct FsBackend {
    root: PathBuf,
    lock: RwLock<()>,
}

impl FsBackend {
    /// Open an existing data directory
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidDirectory` if `root` does not exist or is
    /// not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.exists() {
            return Err(StoreError::invalid_directory(format!(
                "Directory does not exist: {}",
                root.display()
            )));
        }

        if !root.is_dir() {
            return Err(StoreError::invalid_directory(format!(
                "Not a directory: {}",
                root.display()
            )));
        }

        debug!(root = %root.display(), "Opened fixture directory");
        Ok(Self {
            root,
            lock: RwLock::new(()),
        })
    }

    /// Directory the fixtures live in
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, file_name: &str) -> Result<PathBuf> {
        validate_file_name(file_name)?;
        Ok(self.root.join(file_name))
    }
}

#[async_trait]
impl FixtureBackend for FsBackend {
    async fn list(&self) -> Result<Vec<String>> {
        let _guard = self.lock.read().await;
        let mut names = Vec::new();

        for entry in WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() || is_hidden(&entry) {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        trace!(count = names.len(), "Listed fixture directory");
        Ok(names)
    }

    async fn read(&self, file_name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(file_name)?;
        let _guard = self.lock.read().await;
        tokio::fs::read(&path)
            .await
            .map_err(|e| not_found_or_io(e, file_name))
    }

    async fn write(&self, file_name: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.path_for(file_name)?;
        let _guard = self.lock.write().await;
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn remove(&self, file_name: &str) -> Result<()> {
        let path = self.path_for(file_name)?;
        let _guard = self.lock.write().await;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or_io(e, file_name))
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

fn not_found_or_io(err: std::io::Error, file_name: &str) -> StoreError {
    if err.kind() == ErrorKind::NotFound {
        StoreError::not_found(file_name)
    } else {
        StoreError::Io(err)
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

/// Fixtures held in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    files: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    /// Create an empty backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-populated with files
    pub fn with_files<I, N, B>(files: I) -> Self
    where
        I: IntoIterator<Item = (N, B)>,
        N: Into<String>,
        B: Into<Vec<u8>>,
    {
        Self {
            files: RwLock::new(
                files
                    .into_iter()
                    .map(|(name, bytes)| (name.into(), bytes.into()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl FixtureBackend for MemoryBackend {
    async fn list(&self) -> Result<Vec<String>> {
        Ok(self.files.read().await.keys().cloned().collect())
    }

    async fn read(&self, file_name: &str) -> Result<Vec<u8>> {
        validate_file_name(file_name)?;
        self.files
            .read()
            .await
            .get(file_name)
            .cloned()
            .ok_or_else(|| StoreError::not_found(file_name))
    }

    async fn write(&self, file_name: &str, bytes: Vec<u8>) -> Result<()> {
        validate_file_name(file_name)?;
        self.files.write().await.insert(file_name.to_string(), bytes);
        Ok(())
    }

    async fn remove(&self, file_name: &str) -> Result<()> {
        validate_file_name(file_name)?;
        self.files
            .write()
            .await
            .remove(file_name)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(file_name))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("get_api_sample.json").is_ok());
        assert!(validate_file_name("..json").is_ok());
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name(".").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name("../secret").is_err());
        assert!(validate_file_name("a\\b").is_err());
    }

    #[test]
    fn test_open_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        let err = FsBackend::open(&missing).unwrap_err();
        assert!(matches!(err, StoreError::InvalidDirectory(_)));
    }

    #[test]
    fn test_open_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        assert!(FsBackend::open(&file).is_err());
    }

    #[tokio::test]
    async fn test_fs_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FsBackend::open(temp_dir.path()).unwrap();

        backend.write("b.json", b"{}".to_vec()).await.unwrap();
        backend.write("a.json", b"[]".to_vec()).await.unwrap();
        std::fs::write(temp_dir.path().join(".hidden"), "x").unwrap();
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();

        assert_eq!(backend.list().await.unwrap(), vec!["a.json", "b.json"]);
        assert_eq!(backend.read("a.json").await.unwrap(), b"[]".to_vec());

        backend.remove("a.json").await.unwrap();
        assert!(matches!(
            backend.read("a.json").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            backend.remove("a.json").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fs_rejects_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FsBackend::open(temp_dir.path()).unwrap();
        assert!(matches!(
            backend.write("../escape.json", vec![]).await,
            Err(StoreError::InvalidFileName(_))
        ));
    }

    #[tokio::test]
    async fn test_memory_backend() {
        let backend = MemoryBackend::with_files([("x.json", "1")]);
        assert_eq!(backend.list().await.unwrap(), vec!["x.json"]);
        backend.write("y.json", b"2".to_vec()).await.unwrap();
        assert_eq!(backend.read("y.json").await.unwrap(), b"2".to_vec());
        backend.remove("x.json").await.unwrap();
        assert!(backend.remove("x.json").await.is_err());
        assert_eq!(backend.describe(), "memory");
    }
}
