use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::ErrorMessage;

/// Minimum accepted password length in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted password length in characters
///
/// Argon2 is deliberately slow, so very long inputs are refused before hashing.
pub const MAX_PASSWORD_LENGTH: usize = 64;

/// Checks the length rules shared by registration, password change and reset.
pub fn validate(password: &str) -> Result<(), ErrorMessage> {
    let length = password.chars().count();
    if length == 0 {
        return Err(ErrorMessage::EmptyPassword);
    }
    if length < MIN_PASSWORD_LENGTH {
        return Err(ErrorMessage::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH));
    }
    Ok(())
}

/// Hash a password with Argon2id and a fresh random salt
///
/// The returned PHC string embeds algorithm, parameters and salt, e.g.
/// `$argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>`, so it is the only thing
/// that needs to be stored.
pub fn hash(password: impl Into<String>) -> Result<String, ErrorMessage> {
    let password = password.into();
    validate(&password)?;

    let salt = SaltString::generate(&mut OsRng);

    let hashed_password = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| ErrorMessage::HashingError)?
        .to_string();

    Ok(hashed_password)
}

/// Verify a password against a stored PHC hash (constant-time comparison)
///
/// Returns `Ok(false)` on mismatch; errors only for empty/oversized input or
/// a corrupt stored hash.
pub fn compare(password: &str, hashed_password: &str) -> Result<bool, ErrorMessage> {
    if password.is_empty() {
        return Err(ErrorMessage::EmptyPassword);
    }

    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH));
    }

    let parsed_hash =
        PasswordHash::new(hashed_password).map_err(|_| ErrorMessage::InvalidHashFormat)?;

    let password_matched = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok();

    Ok(password_matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_compare() {
        let hashed = hash("correct horse battery").unwrap();
        assert!(hashed.starts_with("$argon2id$"));
        assert!(compare("correct horse battery", &hashed).unwrap());
        assert!(!compare("wrong horse battery", &hashed).unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        let first = hash("s3cret-password").unwrap();
        let second = hash("s3cret-password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn length_rules() {
        assert_eq!(validate(""), Err(ErrorMessage::EmptyPassword));
        assert_eq!(
            validate("short"),
            Err(ErrorMessage::PasswordTooShort(MIN_PASSWORD_LENGTH))
        );
        assert_eq!(
            validate(&"x".repeat(MAX_PASSWORD_LENGTH + 1)),
            Err(ErrorMessage::ExceededMaxPasswordLength(MAX_PASSWORD_LENGTH))
        );
        assert!(validate("long enough").is_ok());
    }

    #[test]
    fn corrupt_hash_is_reported() {
        assert_eq!(
            compare("whatever1", "not-a-phc-string"),
            Err(ErrorMessage::InvalidHashFormat)
        );
    }
}
