use crate::error::AppError;

/// bcrypt wrapper with a fixed work factor.
///
/// bcrypt is deliberately slow, so both operations run on the blocking thread pool
/// instead of the worker that is serving the request.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_owned();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::InternalServerError(format!("Hashing task failed: {}", e)))?
            .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
    }

    /// Checks `password` against a stored hash.
    ///
    /// Never fails: a malformed hash, or a hashing task that did not complete, counts as a
    /// mismatch. The digest comparison inside bcrypt is constant-time.
    pub async fn verify(&self, password: &str, hashed_password: &str) -> bool {
        let password = password.to_owned();
        let hashed_password = hashed_password.to_owned();

        match tokio::task::spawn_blocking(move || bcrypt::verify(password, &hashed_password)).await
        {
            Ok(Ok(matches)) => matches,
            Ok(Err(e)) => {
                log::warn!("Stored password hash could not be verified: {}", e);
                false
            }
            Err(e) => {
                log::error!("Password verification task failed: {}", e);
                false
            }
        }
    }

    /// Spends the same bcrypt work as [`verify`](Self::verify) and always returns `false`.
    ///
    /// Used when the account does not exist, so response time does not reveal which
    /// usernames are registered.
    pub async fn verify_absent(&self, password: &str) -> bool {
        let password = password.to_owned();
        let cost = self.cost;

        if let Err(e) = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await {
            log::error!("Password verification task failed: {}", e);
        }
        false
    }
}
