use crate::domain::error::{AppError, Result};
use keyring::Entry;

/// Secrets in the OS credential store, one entry per account under a
/// fixed service name.
pub struct KeyringManager {
    service: String,
}

impl KeyringManager {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, account: &str) -> Result<Entry> {
        Entry::new(&self.service, account)
            .map_err(|e| AppError::SecurityError(format!("Failed to open keyring entry: {}", e)))
    }

    pub fn set_secret(&self, account: &str, secret: &str) -> Result<()> {
        if secret.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Refusing to store an empty secret".to_string(),
            ));
        }
        self.entry(account)?
            .set_password(secret.trim())
            .map_err(|e| AppError::SecurityError(format!("Failed to store secret: {}", e)))
    }

    /// `None` when no secret is stored for `account`.
    pub fn get_secret(&self, account: &str) -> Result<Option<String>> {
        match self.entry(account)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::SecurityError(format!(
                "Failed to read secret: {}",
                e
            ))),
        }
    }

    pub fn delete_secret(&self, account: &str) -> Result<()> {
        match self.entry(account)?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Err(AppError::NotFound(format!(
                "No stored secret for {}",
                account
            ))),
            Err(e) => Err(AppError::SecurityError(format!(
                "Failed to delete secret: {}",
                e
            ))),
        }
    }
}
