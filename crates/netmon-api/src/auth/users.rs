//! In-memory user directory with Argon2 password hashes.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};

use netmon_core::Role;

use super::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub username: String,
    pub role: Role,
}

struct UserRecord {
    password_hash: String,
    role: Role,
}

#[derive(Default)]
pub struct UserStore {
    users: RwLock<BTreeMap<String, UserRecord>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account. Usernames are unique and case-sensitive.
    pub fn create(&self, username: &str, password: &str, role: Role) -> Result<UserSummary, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidInput(
                "username and password are required".to_string(),
            ));
        }
        let password_hash = hash_password(password)?;

        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        if users.contains_key(username) {
            return Err(AuthError::UserExists(username.to_string()));
        }
        users.insert(
            username.to_string(),
            UserRecord {
                password_hash,
                role: role.clone(),
            },
        );
        tracing::info!(username = %username, role = %role, "User created");
        Ok(UserSummary {
            username: username.to_string(),
            role,
        })
    }

    /// Check a password and return the account's current role.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Role, AuthError> {
        let (hash, role) = {
            let users = self.users.read().unwrap_or_else(PoisonError::into_inner);
            let record = users
                .get(username.trim())
                .ok_or(AuthError::InvalidCredentials)?;
            (record.password_hash.clone(), record.role.clone())
        };

        let parsed = PasswordHash::new(&hash).map_err(|e| AuthError::Crypto(e.to_string()))?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)?;
        Ok(role)
    }

    /// All accounts, ordered by username.
    pub fn list(&self) -> Vec<UserSummary> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(username, record)| UserSummary {
                username: username.clone(),
                role: record.role.clone(),
            })
            .collect()
    }

    pub fn set_role(&self, username: &str, role: Role) -> Result<UserSummary, AuthError> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let record = users
            .get_mut(username)
            .ok_or_else(|| AuthError::UserNotFound(username.to_string()))?;
        record.role = role.clone();
        tracing::info!(username = %username, role = %role, "User role updated");
        Ok(UserSummary {
            username: username.to_string(),
            role,
        })
    }

    pub fn len(&self) -> usize {
        self.users.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Crypto(e.to_string()))
}
