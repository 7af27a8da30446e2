//! Referral link queries.

use referral_core::db::{DatabaseError, unix_timestamp};

use super::db::ReferralDatabase;
use super::models::{NewReferralLink, ReferralLink, RoleKind};
use super::tx::UnitOfWork;

impl ReferralDatabase {
    /// Insert a referral link inside a transaction.
    ///
    /// The caller retires any previous active link first; a second active link
    /// for the same generator, or a reused code, is a [`DatabaseError::Conflict`].
    pub async fn create_referral_link(
        &self,
        tx: &mut UnitOfWork,
        params: &NewReferralLink<'_>,
    ) -> Result<ReferralLink, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO referral_links (id, generator_id, code, expired_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(params.id)
        .bind(params.generator_id)
        .bind(params.code)
        .bind(params.expired_at)
        .bind(now)
        .bind(now)
        .execute(tx.conn())
        .await?;

        sqlx::query_as::<_, ReferralLink>("SELECT * FROM referral_links WHERE id = ?")
            .bind(params.id)
            .fetch_one(tx.conn())
            .await
            .map_err(Into::into)
    }

    /// Find the live referral link carrying `code` inside a transaction.
    ///
    /// Soft-deleted links are treated as absent.
    pub async fn find_referral_link_by_code(
        &self,
        tx: &mut UnitOfWork,
        code: &str,
    ) -> Result<Option<ReferralLink>, DatabaseError> {
        let link = sqlx::query_as::<_, ReferralLink>(
            "SELECT * FROM referral_links WHERE code = ? AND deleted_at IS NULL",
        )
        .bind(code)
        .fetch_optional(tx.conn())
        .await?;

        Ok(link)
    }

    /// Find the active code owned by the generator registered under `email`.
    pub async fn find_active_code_by_email(
        &self,
        tx: &mut UnitOfWork,
        email: &str,
    ) -> Result<Option<String>, DatabaseError> {
        let code: Option<String> = sqlx::query_scalar(
            "SELECT rl.code FROM referral_links rl \
             JOIN users u ON rl.generator_id = u.id AND u.deleted_at IS NULL \
             JOIN roles r ON u.role_id = r.id \
             WHERE u.email = ? AND r.name = ? AND rl.deleted_at IS NULL",
        )
        .bind(email)
        .bind(RoleKind::Generator.as_str())
        .fetch_optional(tx.conn())
        .await?;

        Ok(code)
    }

    /// Retire every active link owned by `generator_id` inside a transaction.
    ///
    /// Returns the number of links retired.
    pub async fn soft_delete_referral_links_by_generator(
        &self,
        tx: &mut UnitOfWork,
        generator_id: &str,
    ) -> Result<u64, DatabaseError> {
        let now = unix_timestamp();

        let result = sqlx::query(
            "UPDATE referral_links SET deleted_at = ?, updated_at = ? WHERE generator_id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(generator_id)
        .execute(tx.conn())
        .await?;

        Ok(result.rows_affected())
    }

    /// Get the active referral link for a generator.
    pub async fn get_active_referral_link(
        &self,
        generator_id: &str,
    ) -> Result<Option<ReferralLink>, DatabaseError> {
        let link = sqlx::query_as::<_, ReferralLink>(
            "SELECT * FROM referral_links WHERE generator_id = ? AND deleted_at IS NULL",
        )
        .bind(generator_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(link)
    }

    /// List every link a generator has held, retired ones included, oldest first.
    pub async fn list_referral_links(
        &self,
        generator_id: &str,
    ) -> Result<Vec<ReferralLink>, DatabaseError> {
        let links = sqlx::query_as::<_, ReferralLink>(
            "SELECT * FROM referral_links WHERE generator_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(generator_id)
        .fetch_all(self.pool())
        .await?;

        Ok(links)
    }
}
