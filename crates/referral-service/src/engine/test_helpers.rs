//! Shared fixtures for engine tests.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use super::{EngineConfig, ReferralEngine};
use crate::auth::JwtManager;
use crate::storage::ReferralDatabase;

pub const TEST_SECRET: &[u8] = b"test-secret";
pub const TEST_LINK_EXPIRY: i64 = 1_900_000_000;

pub fn test_jwt() -> Arc<JwtManager> {
    Arc::new(JwtManager::new(TEST_SECRET, 3600))
}

pub async fn test_engine() -> ReferralEngine {
    let db = ReferralDatabase::open_in_memory().await.unwrap();
    engine_on(db)
}

/// Engine backed by a file database with a multi-connection pool.
///
/// The returned `TempDir` must outlive the engine.
pub async fn file_engine() -> (ReferralEngine, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = ReferralDatabase::open(&dir.path().join("referral.db"))
        .await
        .unwrap();
    (engine_on(db), dir)
}

fn engine_on(db: ReferralDatabase) -> ReferralEngine {
    ReferralEngine::new(
        db,
        test_jwt(),
        EngineConfig {
            referral_link_expires_at: TEST_LINK_EXPIRY,
        },
    )
}

pub async fn count(engine: &ReferralEngine, table: &str) -> i64 {
    let row: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(engine.database().pool())
        .await
        .unwrap();
    row.0
}
