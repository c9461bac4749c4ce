use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use secrecy::{ExposeSecret, Secret};

/// Hash a plaintext password with Argon2id and a fresh random salt.
pub fn hash_password(password: &Secret<String>) -> Result<String, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(hash)
}

/// True iff `password` matches the stored PHC-format `hash`.
///
/// A malformed stored hash is treated as a mismatch and logged.
pub fn verify_password(password: &Secret<String>, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash is malformed");
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> Secret<String> {
        Secret::new(s.to_string())
    }

    #[test]
    fn hash_is_argon2_phc_string() {
        let hash = hash_password(&secret("correct horse")).unwrap();
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn verifies_only_the_original_password() {
        let hash = hash_password(&secret("correct horse")).unwrap();

        assert!(verify_password(&secret("correct horse"), &hash));
        assert!(!verify_password(&secret("battery staple"), &hash));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let first = hash_password(&secret("pw")).unwrap();
        let second = hash_password(&secret("pw")).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password(&secret("pw"), "not-a-hash"));
    }
}
