use anyhow::{bail, Context, Result};
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};

/// Byte store addressed by root-relative paths, e.g. `input.json` or
/// `inverted_index.json`. Builders and the search snapshot receive one
/// explicitly; nothing opens storage on its own.
pub trait Storage {
    fn read_to_string(&self, path: &str) -> Result<String>;
    fn write(&self, path: &str, contents: &[u8]) -> Result<()>;
    fn exists(&self, path: &str) -> bool;
}

/// Storage rooted at a local directory.
#[derive(Debug)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Fails unless `root` is an existing directory.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            bail!("storage root {} is not a directory", root.display());
        }
        tracing::debug!(root = %root.display(), "storage opened");
        Ok(Self { root })
    }

    pub fn close(self) {
        tracing::debug!(root = %self.root.display(), "storage closed");
    }

    fn resolve(&self, path: &str) -> PathBuf { self.root.join(path) }
}

impl Storage for FsStorage {
    fn read_to_string(&self, path: &str) -> Result<String> {
        let full = self.resolve(path);
        fs::read_to_string(&full).with_context(|| format!("reading {}", full.display()))
    }

    fn write(&self, path: &str, contents: &[u8]) -> Result<()> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&full, contents).with_context(|| format!("writing {}", full.display()))
    }

    fn exists(&self, path: &str) -> bool { self.resolve(path).is_file() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_rejects_missing_root() {
        let dir = tempdir().unwrap();
        assert!(FsStorage::open(dir.path().join("nope")).is_err());
    }

    #[test]
    fn write_creates_parents_and_reads_back() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::open(dir.path()).unwrap();
        storage.write("out/part-0.json", b"{}").unwrap();
        assert!(storage.exists("out/part-0.json"));
        assert_eq!(storage.read_to_string("out/part-0.json").unwrap(), "{}");
        storage.close();
    }

    #[test]
    fn read_error_names_the_path() {
        let dir = tempdir().unwrap();
        let storage = FsStorage::open(dir.path()).unwrap();
        let err = storage.read_to_string("input.json").unwrap_err();
        assert!(format!("{err:#}").contains("input.json"));
    }
}
