//! Service layer wrapping the database handle.
//!
//! `ChairService` wraps `ChairDb` (raw database access). All repo methods are
//! implemented as `impl ChairService` blocks in `crate::repos`.

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::ChairDb;
use crate::error::DatabaseError;

/// Query service over the application tables.
///
/// Reads and the provisioning transaction share one libSQL connection. The
/// gate keeps readers out while a transaction is open so that no reader can
/// observe a half-provisioned profile, and keeps two transactions from
/// interleaving on the connection.
pub struct ChairService {
    db: ChairDb,
    gate: RwLock<()>,
}

impl ChairService {
    /// Create a new service over a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` — Path to the libSQL database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = ChairDb::open_local(db_path).await?;
        Ok(Self::from_db(db))
    }

    /// Create from an existing `ChairDb`.
    #[must_use]
    pub fn from_db(db: ChairDb) -> Self {
        Self {
            db,
            gate: RwLock::new(()),
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &ChairDb {
        &self.db
    }

    pub(crate) async fn read_gate(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read().await
    }

    pub(crate) async fn write_gate(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write().await
    }
}
