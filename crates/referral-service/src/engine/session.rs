//! Generator login, token checks and referral link rotation.

use tracing::{debug, error, info, instrument, warn};

use super::error::ReferralError;
use super::{ReferralEngine, finish};
use crate::auth::{Claims, password};
use crate::storage::{ReferralLink, RoleKind, UnitOfWork, User};

impl ReferralEngine {
    /// Verify generator credentials and issue a session token.
    ///
    /// Unknown emails, contributor-only emails and wrong passwords all fail
    /// with [`ReferralError::InvalidCredentials`].
    #[instrument(skip_all, fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ReferralError> {
        let user = self
            .db
            .get_user_by_email_and_role(email, RoleKind::Generator)
            .await?;

        let Some((user, hash)) = user.and_then(|u| {
            let hash = u.password_hash.clone()?;
            Some((u, hash))
        }) else {
            password::verify_against_dummy(password);
            warn!("Login failed: unknown generator");
            return Err(ReferralError::InvalidCredentials);
        };

        let valid = password::verify_password(password, &hash).map_err(|e| {
            error!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
            ReferralError::Credential(e.to_string())
        })?;
        if !valid {
            warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(ReferralError::InvalidCredentials);
        }

        let token = self.issue_token(&user.id, &user.role_id)?;
        info!(user_id = %user.id, "Generator logged in");
        Ok(token)
    }

    /// Validate a session token and return its claims.
    pub fn authenticate(&self, token: &str) -> Result<Claims, ReferralError> {
        self.jwt.validate(token).map_err(|e| {
            warn!(error = %e, "Token rejected");
            ReferralError::Unauthorized
        })
    }

    /// Retire the caller's active link and issue a new one in its place.
    ///
    /// Only a generator token is accepted. The retired link keeps its row and
    /// its contributions.
    #[instrument(skip_all)]
    pub async fn rotate_referral_link(&self, token: &str) -> Result<ReferralLink, ReferralError> {
        let generator = self.authorized_generator(token).await?;

        let mut tx = self.db.begin().await?;
        let result = self.replace_link(&mut tx, &generator.id).await;
        let link = finish(tx, result).await?;

        info!(
            user_id = %generator.id,
            referral_code = %link.code,
            "Referral link rotated"
        );
        Ok(link)
    }

    /// The caller's currently active referral link.
    #[instrument(skip_all)]
    pub async fn active_referral_link(&self, token: &str) -> Result<ReferralLink, ReferralError> {
        let generator = self.authorized_generator(token).await?;
        self.db
            .get_active_referral_link(&generator.id)
            .await?
            .ok_or(ReferralError::ReferralCodeNotFound)
    }

    async fn replace_link(
        &self,
        tx: &mut UnitOfWork,
        generator_id: &str,
    ) -> Result<ReferralLink, ReferralError> {
        let retired = self
            .db
            .soft_delete_referral_links_by_generator(tx, generator_id)
            .await?;
        debug!(retired, "Retired previous referral links");

        self.issue_referral_link(tx, generator_id).await
    }

    /// Resolve `token` to a live generator user.
    async fn authorized_generator(&self, token: &str) -> Result<User, ReferralError> {
        let claims = self.authenticate(token)?;

        let user = self
            .db
            .get_user(&claims.sub)
            .await?
            .ok_or(ReferralError::Unauthorized)?;

        let role = self
            .db
            .get_role_by_name(RoleKind::Generator)
            .await?
            .ok_or(ReferralError::InvalidRole(RoleKind::Generator))?;

        if user.role_id != role.id || claims.role_id != role.id {
            warn!(user_id = %user.id, "Token does not belong to a generator");
            return Err(ReferralError::Unauthorized);
        }

        Ok(user)
    }
}
