//! Registration & redemption engine.
//!
//! Orchestrates validation, cross-entity invariant checks, and the atomic
//! multi-row writes behind generator registration, contributor redemption,
//! login, and referral link rotation.
//!
//! The engine holds no mutable state of its own. Each write path opens exactly
//! one [`UnitOfWork`], performs every read and write through it, and either
//! commits or rolls back before returning.

mod error;
mod registration;
mod session;
pub mod validation;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod session_tests;
#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::auth::JwtManager;
use crate::auth::code::generate_code;
use crate::storage::{NewReferralLink, ReferralDatabase, ReferralLink, Role, UnitOfWork, User};

pub use error::{ErrorKind, ReferralError};

/// Codes tried per link before a collision is reported.
const CODE_ATTEMPTS: u32 = 2;

/// Service-wide settings fixed when the engine is built.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Absolute expiry (Unix seconds) stamped on every link this engine issues.
    pub referral_link_expires_at: i64,
}

/// Outcome of a successful generator registration.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratorRegistration {
    pub user: User,
    pub role: Role,
    pub referral_link: ReferralLink,
    pub token: String,
}

#[derive(Clone)]
pub struct ReferralEngine {
    db: ReferralDatabase,
    jwt: Arc<JwtManager>,
    config: EngineConfig,
}

impl ReferralEngine {
    pub const fn new(db: ReferralDatabase, jwt: Arc<JwtManager>, config: EngineConfig) -> Self {
        Self { db, jwt, config }
    }

    pub const fn database(&self) -> &ReferralDatabase {
        &self.db
    }

    /// Insert a fresh link for `generator_id` carrying the configured expiry.
    ///
    /// The caller must already have retired any active link in `tx`.
    async fn issue_referral_link(
        &self,
        tx: &mut UnitOfWork,
        generator_id: &str,
    ) -> Result<ReferralLink, ReferralError> {
        self.insert_referral_link(tx, generator_id, generate_code)
            .await
    }

    /// Insert a link using codes from `next_code`. A code already taken by any
    /// past link is replaced once before the conflict is surfaced.
    async fn insert_referral_link(
        &self,
        tx: &mut UnitOfWork,
        generator_id: &str,
        mut next_code: impl FnMut() -> String,
    ) -> Result<ReferralLink, ReferralError> {
        let mut attempts_left = CODE_ATTEMPTS;
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            let code = next_code();
            let result = self
                .db
                .create_referral_link(
                    tx,
                    &NewReferralLink {
                        id: &id,
                        generator_id,
                        code: &code,
                        expired_at: self.config.referral_link_expires_at,
                    },
                )
                .await;

            attempts_left -= 1;
            match result {
                Ok(link) => return Ok(link),
                Err(e) if e.is_conflict() && attempts_left > 0 => {
                    warn!(generator_id = %generator_id, "Referral code collided, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn issue_token(&self, user_id: &str, role_id: &str) -> Result<String, ReferralError> {
        self.jwt.issue_token(user_id, role_id).map_err(|e| {
            error!(user_id = %user_id, error = %e, "Token creation failed");
            ReferralError::Token(e.to_string())
        })
    }
}

/// Commit `tx` if `result` succeeded, otherwise roll it back and return the
/// original error.
async fn finish<T>(tx: UnitOfWork, result: Result<T, ReferralError>) -> Result<T, ReferralError> {
    match result {
        Ok(value) => {
            tx.commit().await.inspect_err(|e| {
                error!(error = %e, "Transaction commit failed");
            })?;
            Ok(value)
        }
        Err(err) => {
            if err.kind() == ErrorKind::Infrastructure {
                error!(error = %err, "Operation failed, rolling back");
            } else {
                info!(error = %err, "Operation rejected, rolling back");
            }
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(err)
        }
    }
}
