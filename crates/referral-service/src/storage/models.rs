//! Data models for referral storage.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two kinds of user a role row can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    Generator,
    Contributor,
}

impl RoleKind {
    /// Name stored in `roles.name`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generator => "generator",
            Self::Contributor => "contributor",
        }
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    /// Absent for contributors created by redemption.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub role_id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReferralLink {
    pub id: String,
    pub generator_id: String,
    pub code: String,
    pub expired_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl ReferralLink {
    pub const fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contribution {
    pub id: String,
    pub referral_link_id: String,
    pub contributor_id: String,
    pub accessed_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

/// Parameters for creating a user.
pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
    pub role_id: &'a str,
}

/// Parameters for creating a referral link.
pub struct NewReferralLink<'a> {
    pub id: &'a str,
    pub generator_id: &'a str,
    pub code: &'a str,
    pub expired_at: i64,
}

/// Parameters for recording a contribution.
pub struct NewContribution<'a> {
    pub id: &'a str,
    pub referral_link_id: &'a str,
    pub contributor_id: &'a str,
    pub accessed_at: i64,
}
