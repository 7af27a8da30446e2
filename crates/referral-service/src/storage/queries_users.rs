//! User queries.

use referral_core::db::{DatabaseError, unix_timestamp};
use sqlx::SqliteExecutor;

use super::db::ReferralDatabase;
use super::models::{NewUser, RoleKind, User};
use super::tx::UnitOfWork;

const SELECT_BY_EMAIL_AND_ROLE: &str = "SELECT u.* FROM users u \
     JOIN roles r ON u.role_id = r.id AND r.deleted_at IS NULL \
     WHERE u.email = ? AND r.name = ? AND u.deleted_at IS NULL";

async fn fetch_user_by_email_and_role<'e>(
    executor: impl SqliteExecutor<'e>,
    email: &str,
    kind: RoleKind,
) -> Result<Option<User>, DatabaseError> {
    let user = sqlx::query_as::<_, User>(SELECT_BY_EMAIL_AND_ROLE)
        .bind(email)
        .bind(kind.as_str())
        .fetch_optional(executor)
        .await?;

    Ok(user)
}

impl ReferralDatabase {
    /// Create a user inside a transaction.
    ///
    /// Fails with [`DatabaseError::Conflict`] when a live user with the same
    /// email and role already exists.
    pub async fn create_user(
        &self,
        tx: &mut UnitOfWork,
        params: &NewUser<'_>,
    ) -> Result<User, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, role_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(params.id)
        .bind(params.email)
        .bind(params.password_hash)
        .bind(params.role_id)
        .bind(now)
        .bind(now)
        .execute(tx.conn())
        .await?;

        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(params.id)
            .fetch_one(tx.conn())
            .await
            .map_err(Into::into)
    }

    /// Find a live user by email and role inside a transaction.
    pub async fn find_user_by_email_and_role(
        &self,
        tx: &mut UnitOfWork,
        email: &str,
        kind: RoleKind,
    ) -> Result<Option<User>, DatabaseError> {
        fetch_user_by_email_and_role(tx.conn(), email, kind).await
    }

    /// Find a live user by email and role.
    pub async fn get_user_by_email_and_role(
        &self,
        email: &str,
        kind: RoleKind,
    ) -> Result<Option<User>, DatabaseError> {
        fetch_user_by_email_and_role(self.pool(), email, kind).await
    }

    /// Get a live user by ID.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, DatabaseError> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ? AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(self.pool())
                .await?;

        Ok(user)
    }

    /// Count live users with the given email, across roles.
    pub async fn count_users_by_email(&self, email: &str) -> Result<i64, DatabaseError> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ? AND deleted_at IS NULL")
                .bind(email)
                .fetch_one(self.pool())
                .await?;

        Ok(row.0)
    }
}
