use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use super::{DurableStorage, StorageError};

/// Storage file name in the data directory
pub const STORAGE_FILE: &str = "storage.json";

/// All entries live in one JSON object: `{"key": "value", ...}`.
pub struct FileStorage {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    /// Storage file inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(STORAGE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(items)?;

        // Write to a sibling file and rename so a crash never leaves half a file.
        let tmp = self.path.with_extension("json.tmp");
        // A leftover temp file would keep its old permissions
        if tmp.exists() {
            std::fs::remove_file(&tmp)?;
        }
        let mut file = open_private(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Apply `update` to the current contents and write them back.
    /// A corrupt file is replaced rather than blocking every future write.
    fn modify<F>(&self, update: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StorageError::Unavailable("storage lock poisoned".to_string()))?;

        let mut items = match self.read_all() {
            Ok(items) => items,
            Err(StorageError::Parse(e)) => {
                warn!(path = %self.path.display(), error = %e, "Replacing corrupt storage file");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        update(&mut items);
        self.write_all(&items)
    }
}

/// Create `path` readable and writable by the owner only, since it holds the
/// access token.
fn open_private(path: &Path) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

impl DurableStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let items = self.read_all()?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        debug!(key, path = %self.path.display(), "Writing storage entry");
        self.modify(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.modify(|items| {
            items.remove(key);
        })
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        assert_eq!(storage.get_item("anything").unwrap(), None);
    }

    #[test]
    fn test_values_survive_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::in_dir(dir.path()).set_item("token", "abc").unwrap();

        let reopened = FileStorage::in_dir(dir.path());
        assert_eq!(reopened.get_item("token").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let storage = FileStorage::in_dir(&nested);

        storage.set_item("k", "v").unwrap();
        assert!(nested.join(STORAGE_FILE).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_is_private_to_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        // Start from a world-readable file left by an older version
        std::fs::write(storage.path(), "{}").unwrap();
        std::fs::set_permissions(storage.path(), std::fs::Permissions::from_mode(0o644)).unwrap();

        storage.set_item("flavorai_token", "secret").unwrap();

        let mode = std::fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0, "mode was {:o}", mode);
        assert_eq!(storage.get_item("flavorai_token").unwrap().as_deref(), Some("secret"));
    }

    #[test]
    fn test_remove_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        storage.set_item("a", "1").unwrap();
        storage.set_item("b", "2").unwrap();

        storage.remove_item("a").unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);
        assert_eq!(storage.get_item("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_remove_without_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        storage.remove_item("missing").unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_corrupt_file_errors_on_read_and_is_replaced_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::in_dir(dir.path());
        std::fs::write(storage.path(), "{not json").unwrap();

        assert!(matches!(storage.get_item("k"), Err(StorageError::Parse(_))));

        storage.set_item("k", "v").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
    }
}
