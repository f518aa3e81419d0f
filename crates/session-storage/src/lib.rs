//! Durable session storage for the Portal client.
//!
//! Backends implement [`SecureStorage`], a plain string key/value contract:
//! - **File**: JSON object on disk, replaced atomically on every write
//! - **Memory**: process-local map for tests and throwaway sessions
//!
//! [`TokenStore`] layers the session vocabulary (access token, refresh token,
//! user profile) on top of whichever backend it is given.

mod file;
mod keys;
mod memory;
mod token_store;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use token_store::{Session, TokenStore, UserProfile};
pub use traits::SecureStorage;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
