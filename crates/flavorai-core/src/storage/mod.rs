//! Durable key-value storage for the session.
//!
//! The session store persists two string entries and reads them back on the
//! next start. Any backend implementing `DurableStorage` can hold them:
//!
//! - `FileStorage`: a JSON object file in the user's data directory (default)
//! - `KeyringStorage`: one OS keychain entry per key
//! - `MemoryStorage`: process-local, forgotten on exit
//!
//! Backends report failures as `StorageError`; callers decide whether a
//! failure matters. The session store logs and ignores them.

pub mod file;
pub mod keychain;
pub mod memory;

use thiserror::Error;

pub use self::file::FileStorage;
pub use self::keychain::KeyringStorage;
pub use self::memory::MemoryStorage;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is corrupt: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Keychain access failed: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// String key-value store that survives process restarts.
pub trait DurableStorage: Send + Sync {
    /// Read a value. A missing key is `Ok(None)`, not an error.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key succeeds.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Short human-readable description for logs and `whoami`.
    fn describe(&self) -> String;
}
