//! Generator registration and contributor redemption.

use referral_core::db::unix_timestamp;
use tracing::{info, instrument};

use super::error::ReferralError;
use super::{GeneratorRegistration, ReferralEngine, finish, validation};
use crate::auth::password;
use crate::storage::{
    NewContribution, NewUser, ReferralLink, Role, RoleKind, UnitOfWork, User,
};

impl ReferralEngine {
    /// Register a generator and issue its first referral link.
    ///
    /// The user row and the link row are written in one transaction. The
    /// session token is issued only after the commit.
    #[instrument(skip_all, fields(email = %email))]
    pub async fn register_generator(
        &self,
        email: &str,
        password: &str,
    ) -> Result<GeneratorRegistration, ReferralError> {
        validation::validate_generator_input(email, password)?;

        let mut tx = self.db.begin().await?;
        let result = self.create_generator(&mut tx, email, password).await;
        let (user, role, referral_link) = finish(tx, result).await?;

        let token = self.issue_token(&user.id, &role.id)?;

        info!(
            user_id = %user.id,
            referral_code = %referral_link.code,
            "Generator registered"
        );

        Ok(GeneratorRegistration {
            user,
            role,
            referral_link,
            token,
        })
    }

    async fn create_generator(
        &self,
        tx: &mut UnitOfWork,
        email: &str,
        password: &str,
    ) -> Result<(User, Role, ReferralLink), ReferralError> {
        if self
            .db
            .find_user_by_email_and_role(tx, email, RoleKind::Generator)
            .await?
            .is_some()
        {
            return Err(ReferralError::EmailAlreadyExists);
        }

        let hash = password::hash_password(password)
            .map_err(|e| ReferralError::Credential(e.to_string()))?;

        let role = self
            .db
            .find_role_by_name(tx, RoleKind::Generator)
            .await?
            .ok_or(ReferralError::InvalidRole(RoleKind::Generator))?;

        let user_id = uuid::Uuid::new_v4().to_string();
        let user = self
            .db
            .create_user(
                tx,
                &NewUser {
                    id: &user_id,
                    email,
                    password_hash: Some(&hash),
                    role_id: &role.id,
                },
            )
            .await
            .map_err(|e| ReferralError::on_conflict(e, ReferralError::EmailAlreadyExists))?;

        let referral_link = self.issue_referral_link(tx, &user.id).await?;

        Ok((user, role, referral_link))
    }

    /// Redeem `referral_code` for the contributor identified by `email`.
    ///
    /// Creates the contributor user (without a password) when none exists yet.
    /// No session token is issued.
    #[instrument(skip_all, fields(email = %email, referral_code = %referral_code))]
    pub async fn register_contributor(
        &self,
        email: &str,
        referral_code: &str,
    ) -> Result<User, ReferralError> {
        validation::validate_contributor_input(email, referral_code)?;

        let accessed_at = unix_timestamp();

        let mut tx = self.db.begin().await?;
        let result = self
            .redeem(&mut tx, email, referral_code, accessed_at)
            .await;
        let user = finish(tx, result).await?;

        info!(user_id = %user.id, "Referral code redeemed");

        Ok(user)
    }

    async fn redeem(
        &self,
        tx: &mut UnitOfWork,
        email: &str,
        referral_code: &str,
        accessed_at: i64,
    ) -> Result<User, ReferralError> {
        let link = self
            .db
            .find_referral_link_by_code(tx, referral_code)
            .await?
            .ok_or(ReferralError::ReferralCodeNotFound)?;

        let own_code = self.db.find_active_code_by_email(tx, email).await?;
        if own_code.as_deref() == Some(referral_code) {
            return Err(ReferralError::CantReferToOwnCode);
        }

        if self
            .db
            .find_contribution_by_email_and_code(tx, email, referral_code)
            .await?
            .is_some()
        {
            return Err(ReferralError::CantSubmitReferralMultipleTimes);
        }

        let role = self
            .db
            .find_role_by_name(tx, RoleKind::Contributor)
            .await?
            .ok_or(ReferralError::InvalidRole(RoleKind::Contributor))?;

        let user = match self
            .db
            .find_user_by_email_and_role(tx, email, RoleKind::Contributor)
            .await?
        {
            Some(user) => user,
            None => {
                let user_id = uuid::Uuid::new_v4().to_string();
                self.db
                    .create_user(
                        tx,
                        &NewUser {
                            id: &user_id,
                            email,
                            password_hash: None,
                            role_id: &role.id,
                        },
                    )
                    .await?
            }
        };

        let contribution_id = uuid::Uuid::new_v4().to_string();
        self.db
            .create_contribution(
                tx,
                &NewContribution {
                    id: &contribution_id,
                    referral_link_id: &link.id,
                    contributor_id: &user.id,
                    accessed_at,
                },
            )
            .await
            .map_err(|e| {
                ReferralError::on_conflict(e, ReferralError::CantSubmitReferralMultipleTimes)
            })?;

        Ok(user)
    }
}
