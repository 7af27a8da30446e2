//! Classified errors returned by the registration & redemption engine.

use referral_core::db::DatabaseError;
use thiserror::Error;

use crate::storage::RoleKind;

/// Broad error classes a boundary must keep apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input; no I/O was attempted.
    Validation,
    /// The request contradicts existing state.
    Conflict,
    /// A referenced row does not exist.
    NotFound,
    /// Bad credentials or an unusable token.
    Authentication,
    /// Store, hashing, or signing failure.
    Infrastructure,
}

impl ErrorKind {
    /// Process exit code used by the command-line boundary.
    pub const fn exit_code(self) -> u8 {
        match self {
            Self::Infrastructure => 1,
            Self::Validation => 2,
            Self::Conflict => 3,
            Self::NotFound => 4,
            Self::Authentication => 5,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReferralError {
    #[error("email is required")]
    EmailRequired,

    #[error("password is required")]
    PasswordRequired,

    #[error("referral code required")]
    ReferralCodeRequired,

    #[error("invalid email format")]
    InvalidEmail,

    #[error("email already exist")]
    EmailAlreadyExists,

    #[error("can't submit to your own referral")]
    CantReferToOwnCode,

    #[error("can't submit the same referral more than once")]
    CantSubmitReferralMultipleTimes,

    #[error("referral code not found")]
    ReferralCodeNotFound,

    /// The role row is missing from the store; a deployment defect.
    #[error("invalid role: {0}")]
    InvalidRole(RoleKind),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unauthorized")]
    Unauthorized,

    #[error("storage error: {0}")]
    Storage(#[from] DatabaseError),

    #[error("credential error: {0}")]
    Credential(String),

    #[error("token error: {0}")]
    Token(String),
}

impl ReferralError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmailRequired
            | Self::PasswordRequired
            | Self::ReferralCodeRequired
            | Self::InvalidEmail => ErrorKind::Validation,
            Self::EmailAlreadyExists
            | Self::CantReferToOwnCode
            | Self::CantSubmitReferralMultipleTimes => ErrorKind::Conflict,
            Self::ReferralCodeNotFound | Self::InvalidRole(_) => ErrorKind::NotFound,
            Self::InvalidCredentials | Self::Unauthorized => ErrorKind::Authentication,
            Self::Storage(_) | Self::Credential(_) | Self::Token(_) => ErrorKind::Infrastructure,
        }
    }

    /// HTTP status an HTTP boundary should answer with.
    ///
    /// Self-referral keeps its own 412 so clients can tell it from duplicate
    /// submissions. A missing role is a server fault, not a client one.
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::CantReferToOwnCode => 412,
            Self::InvalidRole(_) => 500,
            _ => match self.kind() {
                ErrorKind::Validation => 400,
                ErrorKind::Conflict => 409,
                ErrorKind::NotFound => 404,
                ErrorKind::Authentication => 401,
                ErrorKind::Infrastructure => 500,
            },
        }
    }

    /// Message safe to show a caller. Infrastructure details stay in the logs.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Infrastructure => "something went wrong".to_string(),
            _ => self.to_string(),
        }
    }

    /// Map a store failure, turning a unique-constraint rejection into
    /// `conflict`.
    pub(crate) fn on_conflict(err: DatabaseError, conflict: Self) -> Self {
        if err.is_conflict() {
            conflict
        } else {
            Self::Storage(err)
        }
    }
}
