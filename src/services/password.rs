//! Salted password and one-time-code hashing with Argon2id.
//!
//! Hashes are PHC strings (`$argon2id$v=19$...`) that carry their own salt
//! and parameters, so verification works across parameter changes. Hashing
//! runs on the blocking pool to keep request workers free.

use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

use tokio::sync::OnceCell;

use crate::error::AppError;

#[derive(Clone, Default)]
pub struct SecretHasher {
    argon2: Argon2<'static>,
    /// Hash checked when there is no real one, built on first use.
    decoy: Arc<OnceCell<String>>,
}

impl SecretHasher {
    /// Minimum-cost parameters so tests do not spend seconds per hash.
    #[cfg(test)]
    pub fn fast_for_tests() -> Self {
        let params = argon2::Params::new(8, 1, 1, None).expect("valid argon2 params");
        Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
            decoy: Arc::default(),
        }
    }

    pub async fn hash(&self, secret: &str) -> Result<String, AppError> {
        let argon2 = self.argon2.clone();
        let secret = secret.to_owned();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(secret.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AppError::Internal(format!("hashing failed: {e}")))
        })
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
    }

    /// `Ok(false)` on mismatch; `Err` only if the stored hash is unreadable.
    pub async fn verify(&self, secret: &str, hash: &str) -> Result<bool, AppError> {
        let argon2 = self.argon2.clone();
        let secret = secret.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&hash)
                .map_err(|e| AppError::Internal(format!("stored hash is malformed: {e}")))?;
            Ok(argon2.verify_password(secret.as_bytes(), &parsed).is_ok())
        })
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))?
    }

    /// Spend the cost of one verification without a stored hash, so a
    /// lookup miss takes as long as a wrong password.
    pub async fn verify_decoy(&self, secret: &str) -> Result<(), AppError> {
        let decoy = self
            .decoy
            .get_or_try_init(|| self.hash("decoy-secret"))
            .await?;
        self.verify(secret, decoy).await?;
        Ok(())
    }

    #[cfg(test)]
    pub fn decoy_ready(&self) -> bool {
        self.decoy.initialized()
    }
}
