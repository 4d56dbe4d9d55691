//! Credential storage abstraction with optional keyring support
//!
//! Access key secrets and STS tokens may be kept in plaintext in the profile, in
//! the OS keyring (referenced as `keyring:<key>`), or supplied through environment
//! variables which always win.

use super::error::{ConfigError, Result};
use std::env;

/// Prefix that indicates a value should be retrieved from the keyring
const KEYRING_PREFIX: &str = "keyring:";

/// Service name for keyring entries
#[cfg(feature = "secure-storage")]
const SERVICE_NAME: &str = "paictl";

/// Storage backend for credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStorage {
    /// Store in OS keyring
    #[cfg(feature = "secure-storage")]
    Keyring,
    /// Store as plaintext
    Plaintext,
}

/// Credential store abstraction
#[derive(Debug)]
pub struct CredentialStore {
    storage: CredentialStorage,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Create a new credential store with automatic backend selection
    pub fn new() -> Self {
        #[cfg(feature = "secure-storage")]
        {
            if Self::is_keyring_available() {
                return Self {
                    storage: CredentialStorage::Keyring,
                };
            }
        }
        Self {
            storage: CredentialStorage::Plaintext,
        }
    }

    /// Create a store that never touches the keyring
    pub fn plaintext() -> Self {
        Self {
            storage: CredentialStorage::Plaintext,
        }
    }

    #[cfg(feature = "secure-storage")]
    fn is_keyring_available() -> bool {
        match keyring::Entry::new(SERVICE_NAME, "__probe__") {
            Ok(entry) => {
                let _ = entry.get_password();
                true
            }
            Err(_) => false,
        }
    }

    /// Store a credential value, returning the string to persist in the profile
    ///
    /// With the keyring backend this is a `keyring:<key>` reference; otherwise the
    /// value itself.
    pub fn store_credential(&self, key: &str, value: &str) -> Result<String> {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => {
                let entry = keyring::Entry::new(SERVICE_NAME, key)
                    .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
                entry.set_password(value).map_err(|e| {
                    ConfigError::KeyringError(format!(
                        "Failed to store credential in keyring: {}",
                        e
                    ))
                })?;
                Ok(format!("{}{}", KEYRING_PREFIX, key))
            }
            CredentialStorage::Plaintext => {
                let _ = key;
                Ok(value.to_string())
            }
        }
    }

    /// Retrieve a credential value
    ///
    /// Resolution order:
    /// 1. Environment variable (if `env_var` is given and set)
    /// 2. Keyring, when the value starts with `keyring:`
    /// 3. The value itself
    pub fn get_credential(&self, value: &str, env_var: Option<&str>) -> Result<String> {
        if let Some(var) = env_var
            && let Ok(env_value) = env::var(var)
        {
            return Ok(env_value);
        }

        if let Some(key) = value.strip_prefix(KEYRING_PREFIX) {
            #[cfg(feature = "secure-storage")]
            {
                let entry = keyring::Entry::new(SERVICE_NAME, key)
                    .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
                entry.get_password().map_err(|e| {
                    ConfigError::KeyringError(format!(
                        "Failed to retrieve credential '{}' from keyring: {}",
                        key, e
                    ))
                })
            }
            #[cfg(not(feature = "secure-storage"))]
            {
                Err(ConfigError::CredentialError(format!(
                    "Credential '{}' references keyring but secure-storage feature is not enabled",
                    key
                )))
            }
        } else {
            Ok(value.to_string())
        }
    }

    /// Delete a credential from storage; missing entries are not an error
    pub fn delete_credential(&self, key: &str) -> Result<()> {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => {
                let entry = keyring::Entry::new(SERVICE_NAME, key)
                    .map_err(|e| ConfigError::KeyringError(e.to_string()))?;
                match entry.delete_credential() {
                    Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                    Err(e) => Err(ConfigError::KeyringError(format!(
                        "Failed to delete credential from keyring: {}",
                        e
                    ))),
                }
            }
            CredentialStorage::Plaintext => {
                let _ = key;
                Ok(())
            }
        }
    }

    /// Check if a value is a keyring reference
    pub fn is_keyring_reference(value: &str) -> bool {
        value.starts_with(KEYRING_PREFIX)
    }

    /// Name of the active storage backend
    pub fn storage_backend(&self) -> &'static str {
        match self.storage {
            #[cfg(feature = "secure-storage")]
            CredentialStorage::Keyring => "keyring",
            CredentialStorage::Plaintext => "plaintext",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plaintext_storage() {
        let store = CredentialStore::plaintext();
        let result = store.get_credential("LTAI-example", None).unwrap();
        assert_eq!(result, "LTAI-example");
        assert_eq!(store.storage_backend(), "plaintext");
        assert_eq!(store.store_credential("k", "v").unwrap(), "v");
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_override() {
        unsafe {
            env::set_var("PAI_TEST_CREDENTIAL", "env-value");
        }

        let store = CredentialStore::plaintext();
        let result = store
            .get_credential("config-value", Some("PAI_TEST_CREDENTIAL"))
            .unwrap();
        assert_eq!(result, "env-value");

        unsafe {
            env::remove_var("PAI_TEST_CREDENTIAL");
        }
    }

    #[test]
    fn test_keyring_reference_detection() {
        assert!(CredentialStore::is_keyring_reference("keyring:prod-secret"));
        assert!(!CredentialStore::is_keyring_reference("prod-secret"));
        assert!(!CredentialStore::is_keyring_reference(""));
    }

    #[cfg(not(feature = "secure-storage"))]
    #[test]
    fn test_keyring_reference_without_feature_fails() {
        let store = CredentialStore::plaintext();
        let err = store.get_credential("keyring:secret", None).unwrap_err();
        assert!(err.to_string().contains("secure-storage"));
    }
}
