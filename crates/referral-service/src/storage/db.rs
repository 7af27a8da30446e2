//! SQLite database for the referral service.

referral_core::define_database!(ReferralDatabase, "Referral database migrations complete");
