use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::error::AuthError;
use crate::models::UserProfile;

pub const MIN_PARENT_PASSWORD_LEN: usize = 4;

/// Maps an opaque token to the user whose records may be touched.
pub trait AuthProvider {
    fn authenticate(&self, token: &str) -> Result<String, AuthError>;
}

/// Token table taken from the `[tokens]` section of the config file.
#[derive(Debug, Clone, Default)]
pub struct StaticTokens {
    tokens: HashMap<String, String>,
}

impl StaticTokens {
    pub fn new(tokens: HashMap<String, String>) -> StaticTokens {
        StaticTokens { tokens }
    }
}

impl AuthProvider for StaticTokens {
    fn authenticate(&self, token: &str) -> Result<String, AuthError> {
        self.tokens.get(token).cloned().ok_or(AuthError::InvalidToken)
    }
}

/// Picks the user: the token's owner when a token is given, else `default_user`.
pub fn resolve_user(
    auth: &dyn AuthProvider,
    token: Option<&str>,
    default_user: &str,
) -> Result<String, AuthError> {
    match token {
        Some(t) => auth.authenticate(t),
        None => Ok(default_user.to_string()),
    }
}

/// Hex SHA-256 of the password, salted with the user id.
pub fn hash_parent_password(user_id: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Checks `password` against the profile's parent password.
///
/// A profile without a parent password lets every action through.
pub fn verify_parent(profile: &UserProfile, password: Option<&str>) -> Result<(), AuthError> {
    let Some(expected) = &profile.parent_password_hash else {
        return Ok(());
    };
    match password {
        None => Err(AuthError::ParentPasswordRequired),
        Some(p) if hash_parent_password(&profile.user_id, p) == *expected => Ok(()),
        Some(_) => Err(AuthError::WrongParentPassword),
    }
}
