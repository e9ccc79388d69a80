//! Implements an in-memory transaction store.
//!
//! Backs sessions that run without a remote backend and doubles as the test
//! store. IDs are assigned locally, monotonic by creation.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    Error,
    session::SessionIdentity,
    stores::TransactionStore,
    transaction::{Transaction, TransactionDraft, TransactionId},
};

/// Stores transactions in memory, scoped per session identity.
#[derive(Debug, Default)]
pub struct MemoryTransactionStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: TransactionId,
    rows: HashMap<SessionIdentity, Vec<Transaction>>,
}

impl MemoryTransactionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for MemoryTransactionStore {
    async fn fetch_all(&self, session: &SessionIdentity) -> Result<Vec<Transaction>, Error> {
        let inner = self.inner.lock().map_err(|_| Error::DatabaseLock)?;

        Ok(inner.rows.get(session).cloned().unwrap_or_default())
    }

    async fn create(
        &self,
        session: &SessionIdentity,
        draft: TransactionDraft,
    ) -> Result<Transaction, Error> {
        let mut inner = self.inner.lock().map_err(|_| Error::DatabaseLock)?;

        inner.next_id += 1;
        let transaction =
            Transaction::from_draft(inner.next_id, OffsetDateTime::now_utc(), draft);

        // Newest created first, matching the remote store's fetch order.
        inner
            .rows
            .entry(*session)
            .or_default()
            .insert(0, transaction.clone());

        Ok(transaction)
    }

    async fn update(
        &self,
        session: &SessionIdentity,
        id: TransactionId,
        changes: TransactionDraft,
    ) -> Result<Transaction, Error> {
        let mut inner = self.inner.lock().map_err(|_| Error::DatabaseLock)?;

        let rows = inner.rows.entry(*session).or_default();
        let row = rows
            .iter_mut()
            .find(|transaction| transaction.id() == id)
            .ok_or(Error::NotFound)?;

        let updated = Transaction::from_draft(id, row.created_at(), changes);
        *row = updated.clone();

        Ok(updated)
    }

    async fn delete(&self, session: &SessionIdentity, id: TransactionId) -> Result<(), Error> {
        let mut inner = self.inner.lock().map_err(|_| Error::DatabaseLock)?;

        let rows = inner.rows.entry(*session).or_default();
        let position = rows
            .iter()
            .position(|transaction| transaction.id() == id)
            .ok_or(Error::NotFound)?;
        rows.remove(position);

        Ok(())
    }
}
