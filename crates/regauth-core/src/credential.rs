/// Password hashing and verification using Argon2id
///
/// The cost parameters are the `argon2` crate defaults (19 MiB memory,
/// 2 iterations, 1 lane) and are deliberately not configurable per call.
/// Every hash gets a fresh 16-byte salt from the OS RNG and is returned as a
/// PHC string, so the salt and parameters travel with the hash.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Failed to verify password: {0}")]
    Verification(String),
}

/// Hash a plaintext password
///
/// # Returns
///
/// * `Ok(String)` - PHC string (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`)
/// * `Err(CredentialError::Hashing)` - If the primitive cannot complete
///
/// # Example
///
/// ```no_run
/// use regauth_core::credential::hash_password;
///
/// let hash = hash_password("SecureP4ssword").expect("Failed to hash password");
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CredentialError::Hashing(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against a stored hash
///
/// The comparison is constant time. Callers should treat `Ok(false)` and any
/// `Err` the same way: authentication denied.
///
/// # Returns
///
/// * `Ok(true)` - Password matches
/// * `Ok(false)` - Password does not match
/// * `Err(CredentialError)` - Stored hash is not a valid PHC string
pub fn verify_password(password: &str, hash: &str) -> Result<bool, CredentialError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| CredentialError::InvalidHashFormat)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CredentialError::Verification(e.to_string())),
    }
}

/// Validate password strength at registration time
///
/// Requires at least 8 characters with one uppercase letter, one lowercase
/// letter and one digit.
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_hash_and_verify_password() {
        let password = "SecureP4ssword";
        let hash = hash_password(password).expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(password, &hash).expect("Verification failed"));
        assert!(!verify_password("WrongPassword1", &hash).expect("Verification failed"));
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        let password = "SamePassword123";

        let hash1 = hash_password(password).unwrap();
        let hash2 = hash_password(password).unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password(password, &hash1).unwrap());
        assert!(verify_password(password, &hash2).unwrap());
    }

    #[test]
    fn test_hash_never_contains_plaintext() {
        let password = "VisibleSecret99";
        let hash = hash_password(password).unwrap();
        assert!(!hash.contains(password));
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("password", "invalid-hash-format");
        assert!(matches!(result, Err(CredentialError::InvalidHashFormat)));
    }

    #[test]
    fn test_empty_password_round_trip() {
        let hash = hash_password("").unwrap();
        assert!(verify_password("", &hash).unwrap());
        assert!(!verify_password(" ", &hash).unwrap());
    }

    #[test]
    fn test_password_strength_validation() {
        assert!(validate_password_strength("SecureP4ssword").is_ok());
        assert!(validate_password_strength("Abcdefg1").is_ok());

        // Too short
        assert!(validate_password_strength("Abc123").is_err());
        // No uppercase
        assert!(validate_password_strength("password123").is_err());
        // No lowercase
        assert!(validate_password_strength("PASSWORD123").is_err());
        // No digit
        assert!(validate_password_strength("Password").is_err());
    }

    proptest! {
        // Argon2 is intentionally slow; a handful of cases is enough.
        #![proptest_config(ProptestConfig::with_cases(4))]

        #[test]
        fn prop_hash_then_verify_matches(password in "\\PC{0,24}") {
            let hash = hash_password(&password).unwrap();
            prop_assert!(verify_password(&password, &hash).unwrap());
        }

        #[test]
        fn prop_distinct_passwords_do_not_match(p in "[a-zA-Z0-9]{1,16}", q in "[a-zA-Z0-9]{1,16}") {
            prop_assume!(p != q);
            let hash = hash_password(&q).unwrap();
            prop_assert!(!verify_password(&p, &hash).unwrap());
        }
    }
}
