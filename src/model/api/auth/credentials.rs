use argon2::Config;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Pseudonyms that collide with fixed `/user/...` routes.
pub const RESERVED_PSEUDOS: &[&str] = &["me", "friends"];

/// Check a chosen pseudo is non-empty and not reserved.
pub fn check_pseudo(pseudo: &str) -> Result<(), &'static str> {
    let pseudo = pseudo.trim();
    if pseudo.is_empty() {
        return Err("Please provide a pseudo");
    }
    if RESERVED_PSEUDOS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(pseudo))
    {
        return Err("This pseudo is reserved");
    }
    Ok(())
}

/// Sign-up form. The password is plaintext and is never stored.
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[serde(default)]
    pub pseudo: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

impl SignupRequest {
    /// Check the form is complete and consistent, returning the reason if not.
    pub fn validate(&self) -> Result<(), &'static str> {
        check_pseudo(&self.pseudo)?;
        if self.password.is_empty() {
            return Err("Please provide a password");
        }
        if self.password_confirm.is_empty() {
            return Err("Please confirm your password");
        }
        if self.password != self.password_confirm {
            return Err("Passwords do not match");
        }
        Ok(())
    }
}

/// Log-in form.
#[derive(Clone, Deserialize, Serialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub pseudo: String,
    #[serde(default)]
    pub password: String,
}

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::Error> {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    argon2::hash_encoded(password.as_bytes(), &salt, &Config::default())
}
