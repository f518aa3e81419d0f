//! Session vocabulary on top of a storage backend.

use crate::{SecureStorage, StorageError, StorageKeys, StorageResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Profile of the signed-in user as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

/// Snapshot of everything persisted for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
}

impl Session {
    /// True when an access token is present. Says nothing about validity.
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// True when every part of the session is present.
    pub fn is_complete(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some() && self.user.is_some()
    }
}

/// Reads and writes the session through an injected backend.
///
/// Performs no validation or expiry checks; the request pipeline is the
/// enforcement point.
pub struct TokenStore {
    storage: Box<dyn SecureStorage>,
}

impl TokenStore {
    pub fn new(storage: Box<dyn SecureStorage>) -> Self {
        Self { storage }
    }

    // ==========================================
    // Access token
    // ==========================================

    pub fn get_access_token(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::ACCESS_TOKEN)
    }

    pub fn set_access_token(&self, token: &str) -> StorageResult<()> {
        self.storage.set(StorageKeys::ACCESS_TOKEN, token)
    }

    pub fn clear_access_token(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::ACCESS_TOKEN).map(|_| ())
    }

    // ==========================================
    // Refresh token
    // ==========================================

    pub fn get_refresh_token(&self) -> StorageResult<Option<String>> {
        self.storage.get(StorageKeys::REFRESH_TOKEN)
    }

    pub fn set_refresh_token(&self, token: &str) -> StorageResult<()> {
        self.storage.set(StorageKeys::REFRESH_TOKEN, token)
    }

    pub fn clear_refresh_token(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::REFRESH_TOKEN).map(|_| ())
    }

    // ==========================================
    // User profile
    // ==========================================

    pub fn get_user(&self) -> StorageResult<Option<UserProfile>> {
        match self.storage.get(StorageKeys::USER_PROFILE)? {
            Some(json) => {
                let user = serde_json::from_str(&json)
                    .map_err(|e| StorageError::Encoding(e.to_string()))?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    pub fn set_user(&self, user: &UserProfile) -> StorageResult<()> {
        let json =
            serde_json::to_string(user).map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.storage.set(StorageKeys::USER_PROFILE, &json)
    }

    pub fn clear_user(&self) -> StorageResult<()> {
        self.storage.delete(StorageKeys::USER_PROFILE).map(|_| ())
    }

    // ==========================================
    // Whole session
    // ==========================================

    /// Store a freshly issued session (login or register).
    pub fn set_session(
        &self,
        access_token: &str,
        refresh_token: &str,
        user: &UserProfile,
    ) -> StorageResult<()> {
        self.set_access_token(access_token)?;
        self.set_refresh_token(refresh_token)?;
        self.set_user(user)?;
        debug!(user_id = %user.id, "Stored session");
        Ok(())
    }

    /// Replace both tokens after a refresh, leaving the user untouched.
    pub fn set_tokens(&self, access_token: &str, refresh_token: &str) -> StorageResult<()> {
        self.set_access_token(access_token)?;
        self.set_refresh_token(refresh_token)
    }

    /// Remove every session key.
    ///
    /// All keys are attempted even if one fails; the first failure is returned.
    pub fn clear(&self) -> StorageResult<()> {
        let mut first_err = None;
        for key in StorageKeys::ALL {
            if let Err(e) = self.storage.delete(key) {
                first_err.get_or_insert(e);
            }
        }
        debug!("Cleared session");
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn load_session(&self) -> StorageResult<Session> {
        Ok(Session {
            access_token: self.get_access_token()?,
            refresh_token: self.get_refresh_token()?,
            user: self.get_user()?,
        })
    }

    /// Optimistic check: an access token is present.
    pub fn is_authenticated(&self) -> StorageResult<bool> {
        self.storage.has(StorageKeys::ACCESS_TOKEN)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}
