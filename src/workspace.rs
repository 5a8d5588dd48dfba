//! Local working copies, one directory per wiki and one file per page.
//!
//! Page names are used verbatim as file names (spaces included), so
//! `Site Map` on `Alex` lives at `<root>/Alex/Site Map`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::app::{Result, SyncError};
use crate::domain::{Encoding, PageKey};

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn page_path(&self, key: &PageKey) -> Result<PathBuf> {
        for part in [&key.wiki, &key.page] {
            if part.is_empty() || part.contains('/') || part == "." || part == ".." {
                return Err(SyncError::Other(format!(
                    "{:?} cannot be used as a local file name",
                    part
                )));
            }
        }
        Ok(self.root.join(&key.wiki).join(&key.page))
    }

    pub fn exists(&self, key: &PageKey) -> Result<bool> {
        Ok(self.page_path(key)?.is_file())
    }

    pub fn read(&self, key: &PageKey, encoding: Encoding) -> Result<String> {
        let bytes = fs::read(self.page_path(key)?)?;
        Ok(encoding.decode(&bytes))
    }

    /// Write the page in the wiki's encoding, creating directories as needed.
    pub fn write(&self, key: &PageKey, content: &str, encoding: Encoding) -> Result<PathBuf> {
        let path = self.page_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, encoding.encode(content))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_path_keeps_spaces() {
        let workspace = Workspace::new("/home/alex/wiki");
        let path = workspace.page_path(&PageKey::new("Alex", "Site Map")).unwrap();
        assert_eq!(path, PathBuf::from("/home/alex/wiki/Alex/Site Map"));
    }

    #[test]
    fn test_page_path_rejects_separators() {
        let workspace = Workspace::new("/tmp");
        assert!(workspace.page_path(&PageKey::new("Alex", "../etc")).is_err());
        assert!(workspace.page_path(&PageKey::new("..", "Contact")).is_err());
        assert!(workspace.page_path(&PageKey::new("Alex", "")).is_err());
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        let key = PageKey::new("Alex", "Contact");

        assert!(!workspace.exists(&key).unwrap());
        let path = workspace.write(&key, "Grüße", Encoding::Latin1).unwrap();

        assert!(workspace.exists(&key).unwrap());
        assert_eq!(fs::read(&path).unwrap().len(), 5);
        assert_eq!(workspace.read(&key, Encoding::Latin1).unwrap(), "Grüße");
    }
}
