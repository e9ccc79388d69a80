//! Defines the persistence collaborator trait and its implementations.
//!
//! Persistence is a single [TransactionStore] trait with swappable
//! implementations: [MemoryTransactionStore] for sessions without a backend
//! and for tests, [SqliteTransactionStore] for real persistence.

use async_trait::async_trait;

use crate::{
    Error,
    session::SessionIdentity,
    transaction::{Transaction, TransactionDraft, TransactionId},
};

mod memory;
mod sqlite;

pub use memory::MemoryTransactionStore;
pub use sqlite::{SqliteTransactionStore, initialize};

/// Handles the persistence of transactions, scoped per session identity.
///
/// Implementations enforce the scoping: a session can only read, update and
/// delete its own records, and any mismatch reports [Error::NotFound] without
/// revealing whether the record exists for someone else.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Prepare the store's backing storage, e.g. create missing tables.
    ///
    /// Called best-effort before a load; failures do not affect the
    /// correctness of already-existing storage, so callers log and ignore
    /// them. The default implementation does nothing.
    async fn prepare(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Retrieve every transaction owned by `session`, newest created first.
    async fn fetch_all(&self, session: &SessionIdentity) -> Result<Vec<Transaction>, Error>;

    /// Persist a new transaction for `session`, assigning its ID and creation
    /// timestamp and deriving the charge, and return the canonical record.
    async fn create(
        &self,
        session: &SessionIdentity,
        draft: TransactionDraft,
    ) -> Result<Transaction, Error>;

    /// Replace the editable fields of the transaction `id` owned by
    /// `session`, rederiving the charge, and return the canonical record.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `id` does not refer to a transaction
    /// owned by `session`.
    async fn update(
        &self,
        session: &SessionIdentity,
        id: TransactionId,
        changes: TransactionDraft,
    ) -> Result<Transaction, Error>;

    /// Delete the transaction `id` owned by `session`.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `id` does not refer to a transaction
    /// owned by `session`.
    async fn delete(&self, session: &SessionIdentity, id: TransactionId) -> Result<(), Error>;
}
