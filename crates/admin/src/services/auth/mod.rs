//! Admin authentication service.
//!
//! Console users log in with email and password and receive an opaque bearer
//! token. Tokens are stored as SHA-256 digests and expire after the configured
//! lifetime. There is no self-registration: admins are created by a super
//! admin through the console or with `kr-cli admin create`.

mod error;

pub use error::AdminAuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use kirana_core::Email;

use crate::db::{AdminUserRepository, RepositoryError};
use crate::models::{AdminRole, AdminUser, CurrentAdmin};

/// Admins get a longer minimum than customers.
const MIN_PASSWORD_LENGTH: usize = 12;

const MAX_PASSWORD_LENGTH: usize = 128;

const MAX_NAME_LENGTH: usize = 120;

const TOKEN_BYTES: usize = 32;

/// A newly issued bearer token.
#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Admin authentication service.
pub struct AdminAuthService<'a> {
    users: AdminUserRepository<'a>,
}

impl<'a> AdminAuthService<'a> {
    /// Create a new admin authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: AdminUserRepository::new(pool),
        }
    }

    /// Check an email and password.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<AdminUser, AdminAuthError> {
        let email = Email::parse(email).map_err(|_| AdminAuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password(&email)
            .await?
            .ok_or(AdminAuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;
        Ok(user)
    }

    /// Issue a bearer token valid for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::Repository` if the token cannot be stored.
    pub async fn issue_token(
        &self,
        user: &AdminUser,
        ttl: Duration,
    ) -> Result<IssuedToken, AdminAuthError> {
        let token = generate_token();
        let expires_at = Utc::now() + ttl;
        self.users
            .insert_token(user.id, &hash_token(&token), expires_at)
            .await?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Resolve a bearer token to its admin.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidToken` if the token is unknown or expired.
    pub async fn authenticate(&self, token: &str) -> Result<CurrentAdmin, AdminAuthError> {
        self.users
            .find_by_token(&hash_token(token))
            .await?
            .ok_or(AdminAuthError::InvalidToken)
    }

    /// Revoke a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::Repository` if the delete fails.
    pub async fn logout(&self, token: &str) -> Result<(), AdminAuthError> {
        self.users.delete_token(&hash_token(token)).await?;
        Ok(())
    }

    /// Create an admin user with a password.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidEmail`, `WeakPassword` or `InvalidName`
    /// for bad input, `AdminAuthError::UserAlreadyExists` if the email is taken.
    pub async fn create_admin(
        &self,
        email: &str,
        name: &str,
        role: AdminRole,
        password: &str,
    ) -> Result<AdminUser, AdminAuthError> {
        let email = Email::parse(email)?;
        let name = validate_name(name)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.users
            .create(&email, name, role, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AdminAuthError::UserAlreadyExists,
                other => AdminAuthError::Repository(other),
            })
    }
}

fn validate_name(name: &str) -> Result<&str, AdminAuthError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(AdminAuthError::InvalidName(format!(
            "name must be 1 to {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name)
}

/// Validate password strength.
///
/// # Errors
///
/// Returns `AdminAuthError::WeakPassword` if the password is too short or too long.
pub fn validate_password(password: &str) -> Result<(), AdminAuthError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(AdminAuthError::WeakPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, AdminAuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AdminAuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AdminAuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AdminAuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AdminAuthError::InvalidCredentials)
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_passwords_need_twelve_chars() {
        assert!(validate_password("elevenchars").is_err());
        assert!(validate_password("twelve chars").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("a long admin password").unwrap();
        assert!(verify_password("a long admin password", &hash).is_ok());
        assert!(matches!(
            verify_password("a wrong admin password", &hash),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("whatever", "not-a-phc-string"),
            Err(AdminAuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_name_is_trimmed_and_bounded() {
        assert_eq!(validate_name("  Asha  ").unwrap(), "Asha");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"n".repeat(121)).is_err());
    }

    #[test]
    fn test_tokens_are_random_and_hashed() {
        let a = generate_token();
        assert_ne!(a, generate_token());
        assert_eq!(a.len(), 43);
        assert_eq!(hash_token(&a).len(), 64);
        assert_eq!(hash_token(&a), hash_token(&a));
    }
}
