//! Username to password-hash registry.

use std::collections::HashMap;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tokio::sync::RwLock;

use crate::errors::AppError;

/// In-memory credential registry. Only Argon2id PHC strings are kept, never plaintext.
#[derive(Default)]
pub struct CredentialStore {
    users: RwLock<HashMap<String, String>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new user.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), AppError> {
        if self.users.read().await.contains_key(username) {
            return Err(AppError::DuplicateUser);
        }

        let password = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

        // Re-check under the write lock; another registration may have won the race.
        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return Err(AppError::DuplicateUser);
        }
        users.insert(username.to_owned(), password_hash);

        tracing::info!(username, "Registered user");
        Ok(())
    }

    /// Check a username/password pair.
    ///
    /// Unknown users and wrong passwords both yield `InvalidCredentials`.
    pub async fn verify(&self, username: &str, password: &str) -> Result<(), AppError> {
        let stored = self.users.read().await.get(username).cloned();
        let Some(stored) = stored else {
            tracing::debug!(username, "Login for unknown user");
            return Err(AppError::InvalidCredentials);
        };

        let password = password.to_owned();
        let matches =
            tokio::task::spawn_blocking(move || verify_password(&password, &stored)).await??;

        if matches {
            Ok(())
        } else {
            tracing::debug!(username, "Login with wrong password");
            Err(AppError::InvalidCredentials)
        }
    }
}

fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

fn verify_password(password: &str, stored: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
