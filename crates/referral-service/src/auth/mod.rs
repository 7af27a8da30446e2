//! Authentication building blocks for the referral service.
//!
//! Provides JWT session tokens, password hashing, and referral code
//! generation.

pub mod claims;
pub mod code;
pub mod jwt;
pub mod password;

pub use claims::Claims;
pub use jwt::JwtManager;
