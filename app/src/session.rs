//! Session record and its persisted mirror.

use crate::storage::{KeyValueStore, StorageError};
use tracing::{debug, warn};

/// Namespace the session entries live under.
pub const SESSION_NAMESPACE: &str = "vulnerable_bank";

pub const KEY_TOKEN: &str = "token";
pub const KEY_USERNAME: &str = "username";
pub const KEY_ACCOUNT_NUMBER: &str = "account_number";
pub const KEY_IS_ADMIN: &str = "is_admin";

/// All persisted session keys, in write order.
pub const SESSION_KEYS: [&str; 4] = [KEY_TOKEN, KEY_USERNAME, KEY_ACCOUNT_NUMBER, KEY_IS_ADMIN];

/// The authenticated user's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub account_number: String,
    pub is_admin: bool,
    pub token: String,
}

impl Session {
    /// First letter of the username, for avatar-style headers.
    pub fn initial(&self) -> char {
        self.username
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase())
            .unwrap_or('U')
    }
}

/// Mirrors a [`Session`] into key-value storage as four scalar entries.
pub struct SessionStore {
    store: Box<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the persisted session.
    ///
    /// Returns `None` unless token, username and account number are all
    /// present and non-empty. The admin flag is true only for the literal
    /// `"true"`.
    pub fn load(&self) -> Result<Option<Session>, StorageError> {
        let token = self.store.get(KEY_TOKEN)?;
        let username = self.store.get(KEY_USERNAME)?;
        let account_number = self.store.get(KEY_ACCOUNT_NUMBER)?;
        let is_admin = self.store.get(KEY_IS_ADMIN)?;

        match (token, username, account_number) {
            (Some(token), Some(username), Some(account_number))
                if !token.is_empty() && !username.is_empty() && !account_number.is_empty() =>
            {
                Ok(Some(Session {
                    username,
                    account_number,
                    is_admin: is_admin.as_deref() == Some("true"),
                    token,
                }))
            }
            _ => {
                debug!("No complete persisted session");
                Ok(None)
            }
        }
    }

    /// Write all four entries, one after the other.
    ///
    /// Stops at the first failing write; earlier entries stay written.
    pub fn save(&mut self, session: &Session) -> Result<(), StorageError> {
        self.store.set(KEY_TOKEN, &session.token)?;
        self.store.set(KEY_USERNAME, &session.username)?;
        self.store.set(KEY_ACCOUNT_NUMBER, &session.account_number)?;
        self.store
            .set(KEY_IS_ADMIN, if session.is_admin { "true" } else { "false" })?;
        Ok(())
    }

    /// Remove all four entries.
    ///
    /// Every key is attempted even if an earlier removal fails; the first
    /// error is returned.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        let mut first_error = None;
        for key in SESSION_KEYS {
            if let Err(e) = self.store.remove(key) {
                warn!(key, error = %e, "Failed to remove session entry");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Raw access for diagnostics and tests.
    pub fn raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.store.get(key)
    }
}
