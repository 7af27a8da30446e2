//! Transaction coordinator.

use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::debug;

use super::db::ReferralDatabase;
use referral_core::db::DatabaseError;

/// One logical unit of work over a single connection.
///
/// Every write of a multi-entity operation goes through the same handle.
/// `commit` and `rollback` consume it; a handle dropped without either is
/// rolled back when the underlying transaction is dropped.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    /// Make every write performed through this handle durable.
    pub async fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit().await?;
        debug!("Transaction committed");
        Ok(())
    }

    /// Discard every write performed through this handle.
    pub async fn rollback(self) -> Result<(), DatabaseError> {
        self.tx.rollback().await?;
        debug!("Transaction rolled back");
        Ok(())
    }

    pub(super) fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }
}

impl ReferralDatabase {
    /// Begin a write transaction.
    ///
    /// Takes the write lock up front (`BEGIN IMMEDIATE`). A competing writer
    /// waits on the busy timeout and then reads committed state.
    pub async fn begin(&self) -> Result<UnitOfWork, DatabaseError> {
        let tx = self.pool().begin_with("BEGIN IMMEDIATE").await?;
        Ok(UnitOfWork { tx })
    }
}
