//! Role queries.

use sqlx::SqliteExecutor;

use super::db::ReferralDatabase;
use super::models::{Role, RoleKind};
use super::tx::UnitOfWork;
use referral_core::db::DatabaseError;

async fn fetch_role_by_name<'e>(
    executor: impl SqliteExecutor<'e>,
    kind: RoleKind,
) -> Result<Option<Role>, DatabaseError> {
    let role =
        sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE name = ? AND deleted_at IS NULL")
            .bind(kind.as_str())
            .fetch_optional(executor)
            .await?;

    Ok(role)
}

impl ReferralDatabase {
    /// Resolve a role by name inside a transaction.
    pub async fn find_role_by_name(
        &self,
        tx: &mut UnitOfWork,
        kind: RoleKind,
    ) -> Result<Option<Role>, DatabaseError> {
        fetch_role_by_name(tx.conn(), kind).await
    }

    /// Resolve a role by name.
    pub async fn get_role_by_name(&self, kind: RoleKind) -> Result<Option<Role>, DatabaseError> {
        fetch_role_by_name(self.pool(), kind).await
    }

    /// Get a role by ID.
    pub async fn get_role(&self, id: &str) -> Result<Option<Role>, DatabaseError> {
        let role =
            sqlx::query_as::<_, Role>("SELECT * FROM roles WHERE id = ? AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(self.pool())
                .await?;

        Ok(role)
    }
}
