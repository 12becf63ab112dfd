use super::DBClient;
use crate::models::{User, UserRole};
use chrono::{DateTime, Utc};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password, role, \
                            reset_token, token_expires_at, created_at, updated_at";

/// User database operations trait
pub trait UserExt {
    /// Get single user by ID, username, email, or reset token
    /// The first given key wins; None when no row matches
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    /// Create a regular user; fails with a unique violation on a taken username
    async fn save_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, sqlx::Error>;

    /// Update the editable profile fields
    async fn update_profile(
        &self,
        user_id: Uuid,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, sqlx::Error>;

    /// Store a new password hash and invalidate any pending reset token
    async fn update_user_password(&self, user_id: Uuid, password: &str)
    -> Result<User, sqlx::Error>;

    async fn update_user_role(&self, username: &str, role: UserRole) -> Result<User, sqlx::Error>;

    /// Store a password reset token
    async fn add_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error>;

    /// Drop reset tokens past their expiry, returning how many were cleared
    async fn clear_expired_reset_tokens(&self) -> Result<u64, sqlx::Error>;
}

impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
        token: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE id = $1",
                USER_COLUMNS
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(username) = username {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE username = $1",
                USER_COLUMNS
            ))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            // Emails are not unique; take the oldest account
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE email <> '' AND LOWER(email) = LOWER($1) \
                 ORDER BY created_at LIMIT 1",
                USER_COLUMNS
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(token) = token {
            user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE reset_token = $1 AND token_expires_at > NOW()",
                USER_COLUMNS
            ))
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn save_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, email, password) VALUES ($1, $2, $3, $4) \
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(password)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        username: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET username = $1, email = $2, first_name = $3, last_name = $4, \
             updated_at = NOW() WHERE id = $5 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(username)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user_password(
        &self,
        user_id: Uuid,
        password: &str,
    ) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET password = $1, reset_token = NULL, token_expires_at = NULL, \
             updated_at = NOW() WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(password)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user_role(&self, username: &str, role: UserRole) -> Result<User, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $1, updated_at = NOW() WHERE username = $2 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(role)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn add_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET reset_token = $1, token_expires_at = $2, updated_at = NOW() \
             WHERE id = $3",
        )
        .bind(token)
        .bind(expires_at)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_expired_reset_tokens(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET reset_token = NULL, token_expires_at = NULL \
             WHERE reset_token IS NOT NULL AND token_expires_at < NOW()",
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
