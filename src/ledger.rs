//! The ledger store: the single source of truth for a session's transactions.
//!
//! The ledger owns the in-memory transaction collection and mediates every
//! create/update/delete against the persistence store, keeping the two
//! consistent. Mutations are serialised through one async mutex held across
//! the remote call and the in-memory apply, so concurrent operations cannot
//! interleave their read-modify-write of the collection. Reloads are
//! optimistic: they fetch without the lock and only apply wholesale when no
//! mutation landed in the meantime (see [Ledger::load]).

use std::time::Duration;

use tokio::sync::Mutex;

use crate::{
    Error,
    partition::{self, PeriodFilter},
    session::{AuthEvent, SessionIdentity},
    stores::TransactionStore,
    transaction::{Transaction, TransactionDraft, TransactionId},
};

/// Tunables for the ledger's remote calls.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// How long to wait on a single persistence store call before reporting
    /// the store unreachable.
    pub remote_timeout: Duration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            remote_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Default)]
struct LedgerInner {
    transactions: Vec<Transaction>,
    /// Bumped on every in-memory mutation. [Ledger::load] uses it to detect
    /// mutations that landed while its fetch was in flight.
    epoch: u64,
}

/// Owns the in-memory transaction collection for the current session and
/// keeps it consistent with the persistence store `S`.
///
/// All views handed out are snapshots; no caller can mutate the collection
/// except through [Ledger::add], [Ledger::update] and [Ledger::remove].
#[derive(Debug)]
pub struct Ledger<S> {
    store: S,
    config: LedgerConfig,
    inner: Mutex<LedgerInner>,
}

impl<S: TransactionStore> Ledger<S> {
    /// Create an empty ledger backed by `store` with the default config.
    pub fn new(store: S) -> Self {
        Self::with_config(store, LedgerConfig::default())
    }

    /// Create an empty ledger backed by `store`.
    pub fn with_config(store: S, config: LedgerConfig) -> Self {
        Self {
            store,
            config,
            inner: Mutex::new(LedgerInner::default()),
        }
    }

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = Result<T, Error>>,
    ) -> Result<T, Error> {
        match tokio::time::timeout(self.config.remote_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::RemoteUnavailable(format!(
                "the persistence store did not respond within {:?}",
                self.config.remote_timeout
            ))),
        }
    }

    /// Replace the in-memory collection with the authoritative one for
    /// `session` and return it.
    ///
    /// If a mutation completes while the fetch is in flight, the fetched
    /// collection is stale and must not clobber the mutation; the ledger
    /// fetches again while holding the collection lock so nothing can
    /// interleave with the second attempt.
    ///
    /// # Errors
    /// Returns [Error::RemoteUnavailable] if the persistence store cannot be
    /// reached; the in-memory collection is then empty, never a partially
    /// merged state.
    pub async fn load(&self, session: &SessionIdentity) -> Result<Vec<Transaction>, Error> {
        // Schema bootstrap is best-effort: a failure here does not affect
        // reads or writes against already-existing storage.
        if let Err(error) = self.with_timeout(self.store.prepare()).await {
            tracing::warn!("could not prepare the persistence store, continuing: {error}");
        }

        let epoch = self.inner.lock().await.epoch;
        let fetched = self.with_timeout(self.store.fetch_all(session)).await;

        let mut inner = self.inner.lock().await;
        let fetched = match fetched {
            Ok(transactions) if inner.epoch == epoch => Ok(transactions),
            // Stale: a mutation landed mid-fetch. Retry under the lock.
            Ok(_) => {
                tracing::debug!("discarding stale reload, fetching again");
                self.with_timeout(self.store.fetch_all(session)).await
            }
            Err(error) => Err(error),
        };

        match fetched {
            Ok(transactions) => {
                inner.transactions = transactions.clone();
                inner.epoch += 1;
                Ok(transactions)
            }
            Err(error) => {
                tracing::error!("could not load transactions: {error}");
                inner.transactions.clear();
                inner.epoch += 1;
                Err(remote_unavailable(error))
            }
        }
    }

    /// Validate `draft`, persist it for `session` and prepend the canonical
    /// transaction to the in-memory collection.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::MissingFields] or [Error::NegativeAmount] if the draft is
    ///   invalid,
    /// - [Error::RemoteUnavailable] if the persistence store timed out,
    /// - or [Error::Persistence] if the store rejected the write.
    ///
    /// On any failure the in-memory collection is left untouched: a failed
    /// write never ghost-inserts.
    pub async fn add(
        &self,
        session: &SessionIdentity,
        draft: TransactionDraft,
    ) -> Result<Transaction, Error> {
        draft.validate()?;

        let mut inner = self.inner.lock().await;

        let created = self
            .with_timeout(self.store.create(session, draft))
            .await
            .map_err(persistence_failure)?;

        inner.transactions.insert(0, created.clone());
        inner.epoch += 1;

        Ok(created)
    }

    /// Validate `changes`, persist the full field replacement for the
    /// transaction `id` owned by `session`, and replace the in-memory entry
    /// in place, preserving its position in the collection.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::MissingFields] or [Error::NegativeAmount] if the changes are
    ///   invalid,
    /// - [Error::NotFound] if `id` is stale or owned by another session,
    /// - [Error::RemoteUnavailable] if the persistence store timed out,
    /// - or [Error::Persistence] if the store rejected the write.
    pub async fn update(
        &self,
        session: &SessionIdentity,
        id: TransactionId,
        changes: TransactionDraft,
    ) -> Result<Transaction, Error> {
        changes.validate()?;

        let mut inner = self.inner.lock().await;

        let updated = self
            .with_timeout(self.store.update(session, id, changes))
            .await
            .map_err(persistence_failure)?;

        match inner
            .transactions
            .iter_mut()
            .find(|transaction| transaction.id() == id)
        {
            Some(entry) => *entry = updated.clone(),
            // The store accepted the update but the local view predates the
            // record, e.g. after a failed load. Surface it at the head.
            None => inner.transactions.insert(0, updated.clone()),
        }
        inner.epoch += 1;

        Ok(updated)
    }

    /// Delete the transaction `id` owned by `session` and remove it from the
    /// in-memory collection.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if `id` is stale or owned by another
    /// session; the in-memory collection is then left untouched.
    pub async fn remove(&self, session: &SessionIdentity, id: TransactionId) -> Result<(), Error> {
        let mut inner = self.inner.lock().await;

        self.with_timeout(self.store.delete(session, id))
            .await
            .map_err(persistence_failure)?;

        inner.transactions.retain(|transaction| transaction.id() != id);
        inner.epoch += 1;

        Ok(())
    }

    /// A snapshot of the in-memory collection, newest created first.
    pub async fn transactions(&self) -> Vec<Transaction> {
        self.inner.lock().await.transactions.clone()
    }

    /// The distinct years present in the collection, newest first.
    pub async fn available_years(&self) -> Vec<i32> {
        partition::available_years(&self.inner.lock().await.transactions)
    }

    /// The transactions that fall inside `period`, preserving collection
    /// order.
    pub async fn filtered(&self, period: &PeriodFilter) -> Vec<Transaction> {
        partition::filter(&self.inner.lock().await.transactions, period)
    }

    /// React to a change in who is signed in.
    ///
    /// Signing out resets the collection to empty, the same as loading an
    /// empty ledger. Signing in leaves the collection alone; the caller
    /// should follow up with [Ledger::load] for the new identity.
    pub async fn handle_auth_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(user_id) => {
                tracing::debug!("user {user_id} signed in, awaiting reload");
            }
            AuthEvent::SignedOut => {
                let mut inner = self.inner.lock().await;
                inner.transactions.clear();
                inner.epoch += 1;
                tracing::info!("signed out, ledger reset to empty");
            }
        }
    }
}

/// Keep the caller-actionable error kinds; everything else a write can
/// surface is a persistence failure.
fn persistence_failure(error: Error) -> Error {
    match error {
        Error::NotFound
        | Error::RemoteUnavailable(_)
        | Error::MissingFields(_)
        | Error::NegativeAmount(_)
        | Error::Persistence(_) => error,
        other => Error::Persistence(other.to_string()),
    }
}

fn remote_unavailable(error: Error) -> Error {
    match error {
        error @ Error::RemoteUnavailable(_) => error,
        other => Error::RemoteUnavailable(other.to_string()),
    }
}

#[cfg(test)]
mod ledger_tests {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    use async_trait::async_trait;
    use time::macros::date;
    use tokio::sync::Notify;

    use super::{Ledger, LedgerConfig};
    use crate::{
        Error,
        partition::PeriodFilter,
        session::{AuthEvent, SessionIdentity},
        stores::{MemoryTransactionStore, TransactionStore},
        transaction::{DebitType, Transaction, TransactionDraft, TransactionId},
    };

    const SESSION: SessionIdentity = SessionIdentity::User(1);

    fn ledger() -> Ledger<MemoryTransactionStore> {
        Ledger::new(MemoryTransactionStore::new())
    }

    #[tokio::test]
    async fn add_validates_computes_charge_and_prepends() {
        let ledger = ledger();

        let credit = ledger
            .add(&SESSION, TransactionDraft::credit(date!(2025 - 01 - 05), 500.0))
            .await
            .unwrap();
        assert_eq!(credit.charge(), 0.0);
        assert_eq!(credit.debit_amount(), None);

        let debit = ledger
            .add(
                &SESSION,
                TransactionDraft::debit(date!(2025 - 02 - 10), 1000.0, DebitType::Npsb),
            )
            .await
            .unwrap();
        assert_eq!(debit.charge(), 10.0);

        let transactions = ledger.transactions().await;
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].id(), debit.id(), "newest should come first");
    }

    #[tokio::test]
    async fn add_rejects_invalid_draft_without_touching_memory() {
        let ledger = ledger();

        let result = ledger.add(&SESSION, TransactionDraft::default()).await;

        assert!(matches!(result, Err(Error::MissingFields(_))));
        assert!(ledger.transactions().await.is_empty());
    }

    #[tokio::test]
    async fn add_then_load_round_trips_the_transaction() {
        let ledger = ledger();

        let added = ledger
            .add(
                &SESSION,
                TransactionDraft::debit(date!(2025 - 02 - 10), 1000.0, DebitType::Npsb),
            )
            .await
            .unwrap();

        let loaded = ledger.load(&SESSION).await.unwrap();

        assert_eq!(loaded, vec![added]);
    }

    #[tokio::test]
    async fn year_filter_matches_without_month() {
        let ledger = ledger();

        ledger
            .add(
                &SESSION,
                TransactionDraft::debit(date!(2025 - 07 - 01), 500.0, DebitType::Rtgs),
            )
            .await
            .unwrap();

        let filtered = ledger.filtered(&PeriodFilter::year(2025)).await;
        assert_eq!(filtered.len(), 1);

        let other_year = ledger.filtered(&PeriodFilter::year(2024)).await;
        assert!(other_year.is_empty());

        assert_eq!(ledger.available_years().await, vec![2025]);
    }

    #[tokio::test]
    async fn update_recomputes_charge_and_preserves_position() {
        let ledger = ledger();

        let _newest_after_target = ledger
            .add(&SESSION, TransactionDraft::credit(date!(2025 - 01 - 01), 100.0))
            .await
            .unwrap();
        let target = ledger
            .add(
                &SESSION,
                TransactionDraft::debit(date!(2025 - 03 - 01), 2000.0, DebitType::Beftn),
            )
            .await
            .unwrap();
        let newest = ledger
            .add(&SESSION, TransactionDraft::credit(date!(2025 - 04 - 01), 300.0))
            .await
            .unwrap();
        assert_eq!(target.charge(), 0.0);

        let updated = ledger
            .update(
                &SESSION,
                target.id(),
                TransactionDraft::debit(date!(2025 - 03 - 01), 2000.0, DebitType::Rtgs),
            )
            .await
            .unwrap();

        assert_eq!(updated.charge(), 100.0);
        assert_eq!(updated.debit_amount(), Some(2000.0));
        assert_eq!(updated.debit_date(), target.debit_date());
        assert_eq!(updated.created_at(), target.created_at());

        let transactions = ledger.transactions().await;
        assert_eq!(transactions[0].id(), newest.id());
        assert_eq!(transactions[1].id(), updated.id(), "position should not change");
        assert_eq!(transactions[1].charge(), 100.0);
    }

    #[tokio::test]
    async fn remove_of_unknown_id_leaves_collection_untouched() {
        let ledger = ledger();

        ledger
            .add(&SESSION, TransactionDraft::credit(date!(2025 - 01 - 05), 500.0))
            .await
            .unwrap();
        let before = ledger.transactions().await;

        let result = ledger.remove(&SESSION, 999).await;

        assert_eq!(result, Err(Error::NotFound));
        assert_eq!(ledger.transactions().await, before);
    }

    #[tokio::test]
    async fn remove_deletes_from_store_and_memory() {
        let ledger = ledger();

        let transaction = ledger
            .add(&SESSION, TransactionDraft::credit(date!(2025 - 01 - 05), 500.0))
            .await
            .unwrap();

        ledger.remove(&SESSION, transaction.id()).await.unwrap();

        assert!(ledger.transactions().await.is_empty());
        assert!(ledger.load(&SESSION).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sign_out_resets_the_collection() {
        let ledger = ledger();

        ledger
            .add(&SESSION, TransactionDraft::credit(date!(2025 - 01 - 05), 500.0))
            .await
            .unwrap();

        ledger.handle_auth_event(AuthEvent::SignedOut).await;

        assert!(ledger.transactions().await.is_empty());
    }

    /// A store whose reads and writes always fail, for the error paths.
    struct UnreachableStore;

    #[async_trait]
    impl TransactionStore for UnreachableStore {
        async fn fetch_all(
            &self,
            _session: &SessionIdentity,
        ) -> Result<Vec<Transaction>, Error> {
            Err(Error::SqlError(rusqlite::Error::InvalidQuery))
        }

        async fn create(
            &self,
            _session: &SessionIdentity,
            _draft: TransactionDraft,
        ) -> Result<Transaction, Error> {
            Err(Error::SqlError(rusqlite::Error::InvalidQuery))
        }

        async fn update(
            &self,
            _session: &SessionIdentity,
            _id: TransactionId,
            _changes: TransactionDraft,
        ) -> Result<Transaction, Error> {
            Err(Error::SqlError(rusqlite::Error::InvalidQuery))
        }

        async fn delete(
            &self,
            _session: &SessionIdentity,
            _id: TransactionId,
        ) -> Result<(), Error> {
            Err(Error::SqlError(rusqlite::Error::InvalidQuery))
        }
    }

    #[tokio::test]
    async fn failed_load_empties_the_collection_and_surfaces_remote_unavailable() {
        let ledger = Ledger::new(UnreachableStore);

        let result = ledger.load(&SESSION).await;

        assert!(matches!(result, Err(Error::RemoteUnavailable(_))));
        assert!(ledger.transactions().await.is_empty());
    }

    #[tokio::test]
    async fn failed_add_does_not_ghost_insert() {
        let ledger = Ledger::new(UnreachableStore);

        let result = ledger
            .add(&SESSION, TransactionDraft::credit(date!(2025 - 01 - 05), 500.0))
            .await;

        assert!(matches!(result, Err(Error::Persistence(_))));
        assert!(ledger.transactions().await.is_empty());
    }

    /// A store that never responds, for the timeout path.
    struct StalledStore;

    #[async_trait]
    impl TransactionStore for StalledStore {
        async fn fetch_all(
            &self,
            _session: &SessionIdentity,
        ) -> Result<Vec<Transaction>, Error> {
            std::future::pending().await
        }

        async fn create(
            &self,
            _session: &SessionIdentity,
            _draft: TransactionDraft,
        ) -> Result<Transaction, Error> {
            std::future::pending().await
        }

        async fn update(
            &self,
            _session: &SessionIdentity,
            _id: TransactionId,
            _changes: TransactionDraft,
        ) -> Result<Transaction, Error> {
            std::future::pending().await
        }

        async fn delete(
            &self,
            _session: &SessionIdentity,
            _id: TransactionId,
        ) -> Result<(), Error> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_store_surfaces_remote_unavailable() {
        let ledger = Ledger::with_config(
            StalledStore,
            LedgerConfig {
                remote_timeout: std::time::Duration::from_millis(100),
            },
        );

        let result = ledger.load(&SESSION).await;

        assert!(matches!(result, Err(Error::RemoteUnavailable(_))));
    }

    /// Wraps the memory store and blocks the first `fetch_all` until
    /// released, to stage a reload racing a mutation.
    struct GatedStore {
        inner: MemoryTransactionStore,
        gate: Arc<Notify>,
        first_fetch_pending: AtomicBool,
    }

    impl GatedStore {
        fn new(gate: Arc<Notify>) -> Self {
            Self {
                inner: MemoryTransactionStore::new(),
                gate,
                first_fetch_pending: AtomicBool::new(true),
            }
        }
    }

    #[async_trait]
    impl TransactionStore for GatedStore {
        async fn fetch_all(
            &self,
            session: &SessionIdentity,
        ) -> Result<Vec<Transaction>, Error> {
            // Snapshot before waiting: the result models a fetch that was
            // already answered by the remote end when the mutation landed.
            let stale = self.inner.fetch_all(session).await;

            if self.first_fetch_pending.swap(false, Ordering::SeqCst) {
                self.gate.notified().await;
                return stale;
            }

            self.inner.fetch_all(session).await
        }

        async fn create(
            &self,
            session: &SessionIdentity,
            draft: TransactionDraft,
        ) -> Result<Transaction, Error> {
            self.inner.create(session, draft).await
        }

        async fn update(
            &self,
            session: &SessionIdentity,
            id: TransactionId,
            changes: TransactionDraft,
        ) -> Result<Transaction, Error> {
            self.inner.update(session, id, changes).await
        }

        async fn delete(
            &self,
            session: &SessionIdentity,
            id: TransactionId,
        ) -> Result<(), Error> {
            self.inner.delete(session, id).await
        }
    }

    #[tokio::test]
    async fn reload_completing_after_a_mutation_does_not_clobber_it() {
        let gate = Arc::new(Notify::new());
        let ledger = Arc::new(Ledger::new(GatedStore::new(gate.clone())));

        let load_handle = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move { ledger.load(&SESSION).await })
        };

        // Let the load reach its gated fetch, then race an add past it.
        tokio::task::yield_now().await;
        let added = ledger
            .add(&SESSION, TransactionDraft::credit(date!(2025 - 01 - 05), 500.0))
            .await
            .unwrap();
        gate.notify_one();

        let loaded = load_handle.await.unwrap().unwrap();

        assert_eq!(loaded, vec![added.clone()]);
        assert_eq!(ledger.transactions().await, vec![added]);
    }
}
