//! Local input validation. No I/O happens here.

use std::sync::LazyLock;

use regex::Regex;

use super::error::ReferralError;

#[allow(clippy::expect_used)]
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("static regex is valid")
});

/// `local@domain.tld` with a TLD of at least two letters.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate_generator_input(email: &str, password: &str) -> Result<(), ReferralError> {
    if email.is_empty() {
        return Err(ReferralError::EmailRequired);
    }
    if password.is_empty() {
        return Err(ReferralError::PasswordRequired);
    }
    if !is_valid_email(email) {
        return Err(ReferralError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_contributor_input(email: &str, referral_code: &str) -> Result<(), ReferralError> {
    if email.is_empty() {
        return Err(ReferralError::EmailRequired);
    }
    if referral_code.is_empty() {
        return Err(ReferralError::ReferralCodeRequired);
    }
    if !is_valid_email(email) {
        return Err(ReferralError::InvalidEmail);
    }
    Ok(())
}
