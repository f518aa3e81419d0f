//! Storage key constants.

/// Keys under which the session is persisted.
pub struct StorageKeys;

impl StorageKeys {
    /// Bearer access token
    pub const ACCESS_TOKEN: &'static str = "access_token";

    /// Refresh token used to mint new access tokens
    pub const REFRESH_TOKEN: &'static str = "refresh_token";

    /// Cached user profile (JSON)
    pub const USER_PROFILE: &'static str = "user_profile";

    /// Every key owned by the session, in the order they are cleared.
    pub const ALL: [&'static str; 3] = [
        Self::ACCESS_TOKEN,
        Self::REFRESH_TOKEN,
        Self::USER_PROFILE,
    ];
}
