//! SQLite persistence gateway for the referral service.
//!
//! Entity stores for users, roles, referral links and contributions, plus the
//! transaction coordinator. Methods that take a [`UnitOfWork`] run inside that
//! transaction; the rest read straight from the pool.
//!
//! Lookups return `Ok(None)` when no row matches, keeping "not found" apart
//! from execution failures.

mod db;
mod models;
mod queries_contributions;
mod queries_referral_links;
mod queries_roles;
mod queries_users;
mod tx;


pub use db::ReferralDatabase;
pub use models::*;
pub use referral_core::db::DatabaseError;
pub use tx::UnitOfWork;
