//! Referral Service Library
//!
//! Core functionality for the referral service:
//! - SQLite storage for users, roles, referral links and contributions
//! - JWT session tokens, password hashing and referral code generation
//! - The registration & redemption engine enforcing referral rules

pub mod auth;
pub mod engine;
pub mod storage;
