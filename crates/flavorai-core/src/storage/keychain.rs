use keyring::Entry;
use tracing::debug;

use super::{DurableStorage, StorageError};

/// Keychain service name the entries are filed under.
pub const SERVICE_NAME: &str = "flavorai";

/// Stores each key as its own OS keychain entry.
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry, StorageError> {
        Ok(Entry::new(&self.service, key)?)
    }
}

impl Default for KeyringStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl DurableStorage for KeyringStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entry(key)?.set_password(value)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => {
                debug!(key, "No keychain entry to remove");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self) -> String {
        format!("OS keychain (service \"{}\")", self.service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_storage() -> KeyringStorage {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        KeyringStorage::with_service("flavorai-test")
    }

    #[test]
    fn test_missing_entry_reads_none() {
        let storage = mock_storage();
        assert_eq!(storage.get_item("flavorai_token").unwrap(), None);
    }

    #[test]
    fn test_removing_missing_entry_is_ok() {
        let storage = mock_storage();
        storage.remove_item("flavorai_user").unwrap();
    }

    #[test]
    fn test_describe_names_service() {
        assert_eq!(
            KeyringStorage::new().describe(),
            "OS keychain (service \"flavorai\")"
        );
    }
}
