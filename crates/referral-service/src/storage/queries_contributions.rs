//! Contribution queries.

use referral_core::db::{DatabaseError, unix_timestamp};

use super::db::ReferralDatabase;
use super::models::{Contribution, NewContribution};
use super::tx::UnitOfWork;

impl ReferralDatabase {
    /// Record a contribution inside a transaction.
    ///
    /// A second live contribution for the same link and contributor is a
    /// [`DatabaseError::Conflict`].
    pub async fn create_contribution(
        &self,
        tx: &mut UnitOfWork,
        params: &NewContribution<'_>,
    ) -> Result<Contribution, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO contributions (id, referral_link_id, contributor_id, accessed_at, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(params.id)
        .bind(params.referral_link_id)
        .bind(params.contributor_id)
        .bind(params.accessed_at)
        .bind(now)
        .bind(now)
        .execute(tx.conn())
        .await?;

        sqlx::query_as::<_, Contribution>("SELECT * FROM contributions WHERE id = ?")
            .bind(params.id)
            .fetch_one(tx.conn())
            .await
            .map_err(Into::into)
    }

    /// Find a live contribution by contributor email and referral code inside
    /// a transaction.
    pub async fn find_contribution_by_email_and_code(
        &self,
        tx: &mut UnitOfWork,
        email: &str,
        code: &str,
    ) -> Result<Option<Contribution>, DatabaseError> {
        let contribution = sqlx::query_as::<_, Contribution>(
            "SELECT c.* FROM contributions c \
             JOIN referral_links rl ON c.referral_link_id = rl.id \
             JOIN users u ON c.contributor_id = u.id AND u.deleted_at IS NULL \
             WHERE u.email = ? AND rl.code = ? AND c.deleted_at IS NULL",
        )
        .bind(email)
        .bind(code)
        .fetch_optional(tx.conn())
        .await?;

        Ok(contribution)
    }

    /// Count live contributions made through the link carrying `code`.
    pub async fn count_contributions_for_code(&self, code: &str) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM contributions c \
             JOIN referral_links rl ON c.referral_link_id = rl.id \
             WHERE rl.code = ? AND c.deleted_at IS NULL",
        )
        .bind(code)
        .fetch_one(self.pool())
        .await?;

        Ok(row.0)
    }
}
