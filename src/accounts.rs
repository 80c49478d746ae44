//! Signup and login over the account store.
//!
//! Passwords are stored as salted Argon2id PHC strings and verified with the
//! library's constant-time check. No session tokens are issued; each request
//! re-supplies identity by email or id.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AppError>;

    async fn insert(&self, name: &str, email: &str, password_hash: &str) -> Result<(), AppError>;
}

pub async fn signup(
    store: &dyn AccountStore,
    name: &str,
    email: &str,
    password: &str,
) -> Result<(), AppError> {
    if store.find_by_email(email).await?.is_some() {
        return Err(AppError::DuplicateAccount);
    }

    let hash = hash_password(password)?;

    store.insert(name, email, &hash).await
}

pub async fn login(
    store: &dyn AccountStore,
    email: &str,
    password: &str,
) -> Result<Account, AppError> {
    let account = store
        .find_by_email(email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(password, &account.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    Ok(account)
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(Box::new(e)))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
