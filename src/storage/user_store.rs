//! User storage and credential verification.
//!
//! Users are provisioned out-of-band (the `add-user` binary); the server
//! only ever reads them to authorize the sync endpoint.

use crate::auth::{Identity, Role};
use crate::storage::db::Db;
use crate::storage::StorageError;

/// Storage facade for the users table.
#[derive(Clone)]
pub struct UserStore {
    db: Db,
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore").finish_non_exhaustive()
    }
}

impl UserStore {
    /// Create a new user store.
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert a new user with a bcrypt-hashed password.
    ///
    /// Fails if the username is already taken.
    pub async fn create(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<(), StorageError> {
        let hash = hash_password(password.to_owned()).await?;

        sqlx::query("INSERT INTO users (username, password_hash, role) VALUES (?, ?, ?)")
            .bind(username)
            .bind(hash)
            .bind(role.as_ref())
            .execute(self.db.inner())
            .await?;

        tracing::info!(username, role = %role, "User created");
        Ok(())
    }

    /// Verify a username/password pair.
    ///
    /// Returns `None` for an unknown user or a wrong password; `Some`
    /// carries the caller identity with its stored role. Unknown role text
    /// in the database is treated as non-admin.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Identity>, StorageError> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT password_hash, role FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(self.db.inner())
                .await?;

        let Some((hash, role)) = row else {
            return Ok(None);
        };

        // bcrypt verification is CPU-bound; keep it off the async workers.
        let password = password.to_owned();
        let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| StorageError::Internal(format!("verify task failed: {e}")))?
            .map_err(|e| StorageError::Internal(format!("stored password hash rejected: {e}")))?;

        if !verified {
            return Ok(None);
        }

        Ok(Some(Identity {
            username: username.to_string(),
            role: role.parse().unwrap_or(Role::Staff),
        }))
    }
}

/// Hash a password with bcrypt on a blocking thread.
async fn hash_password(password: String) -> Result<String, StorageError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| StorageError::Internal(format!("hash task failed: {e}")))?
        .map_err(|e| StorageError::Internal(format!("password hashing failed: {e}")))
}
