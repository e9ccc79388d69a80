//! Implements a SQLite backed transaction store.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{Connection, Row, params};
use time::OffsetDateTime;

use crate::{
    Error,
    session::SessionIdentity,
    stores::TransactionStore,
    transaction::{DebitType, Transaction, TransactionDraft, TransactionId},
};

/// Stores transactions in a SQLite database, scoped per session identity.
///
/// Records created by the anonymous identity are stored with a NULL
/// `user_id`.
#[derive(Debug, Clone)]
pub struct SqliteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    ///
    /// The schema is created lazily by [TransactionStore::prepare]; call
    /// [initialize] directly to create it eagerly.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|_| Error::DatabaseLock)
    }
}

/// Create the transaction table and its indices in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL
/// error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER,
                credit_date TEXT,
                credit_amount REAL,
                debit_date TEXT,
                debit_amount REAL,
                debit_type TEXT,
                charge REAL NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Composite index used by every per-session fetch.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_created
             ON \"transaction\"(user_id, created_at);",
        (),
    )?;

    Ok(())
}

const COLUMNS: &str =
    "id, credit_date, credit_amount, debit_date, debit_amount, debit_type, charge, created_at";

/// Map a database row to a [Transaction].
///
/// Debit type tags outside the known set are dropped with a warning, which
/// keeps their fee-0 behaviour without failing the whole query.
fn map_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let debit_type = row
        .get::<_, Option<String>>(5)?
        .and_then(|tag| match DebitType::from_tag(&tag) {
            Some(debit_type) => Some(debit_type),
            None => {
                tracing::warn!("dropping unrecognised debit type tag {tag:?}");
                None
            }
        });

    Ok(Transaction::new_unchecked(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        debit_type,
        row.get(6)?,
        row.get(7)?,
    ))
}

#[async_trait]
impl TransactionStore for SqliteTransactionStore {
    async fn prepare(&self) -> Result<(), Error> {
        let connection = self.lock()?;

        initialize(&connection).map_err(Error::from)
    }

    async fn fetch_all(&self, session: &SessionIdentity) -> Result<Vec<Transaction>, Error> {
        let connection = self.lock()?;

        connection
            .prepare(&format!(
                "SELECT {COLUMNS} FROM \"transaction\"
                 WHERE user_id IS ?1
                 ORDER BY created_at DESC, id DESC"
            ))?
            .query_map(params![session.user_id()], map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
            .collect()
    }

    async fn create(
        &self,
        session: &SessionIdentity,
        draft: TransactionDraft,
    ) -> Result<Transaction, Error> {
        let connection = self.lock()?;

        let charge = crate::charge::charge_for(draft.debit_amount, draft.debit_type);
        let transaction = connection
            .prepare(&format!(
                "INSERT INTO \"transaction\"
                 (user_id, credit_date, credit_amount, debit_date, debit_amount, debit_type, charge, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 RETURNING {COLUMNS}"
            ))?
            .query_row(
                params![
                    session.user_id(),
                    draft.credit_date,
                    draft.credit_amount,
                    draft.debit_date,
                    draft.debit_amount,
                    draft.debit_type.map(|debit_type| debit_type.to_string()),
                    charge,
                    OffsetDateTime::now_utc(),
                ],
                map_row,
            )?;

        Ok(transaction)
    }

    async fn update(
        &self,
        session: &SessionIdentity,
        id: TransactionId,
        changes: TransactionDraft,
    ) -> Result<Transaction, Error> {
        let connection = self.lock()?;

        // Resolves ownership and fetches the immutable creation timestamp in
        // one step; a missing or foreign row surfaces as NotFound.
        let created_at: OffsetDateTime = connection
            .prepare("SELECT created_at FROM \"transaction\" WHERE id = ?1 AND user_id IS ?2")?
            .query_row(params![id, session.user_id()], |row| row.get(0))?;

        let transaction = Transaction::from_draft(id, created_at, changes);

        connection.execute(
            "UPDATE \"transaction\"
             SET credit_date = ?1, credit_amount = ?2, debit_date = ?3,
                 debit_amount = ?4, debit_type = ?5, charge = ?6
             WHERE id = ?7 AND user_id IS ?8",
            params![
                transaction.credit_date(),
                transaction.credit_amount(),
                transaction.debit_date(),
                transaction.debit_amount(),
                transaction.debit_type().map(|debit_type| debit_type.to_string()),
                transaction.charge(),
                id,
                session.user_id(),
            ],
        )?;

        Ok(transaction)
    }

    async fn delete(&self, session: &SessionIdentity, id: TransactionId) -> Result<(), Error> {
        let connection = self.lock()?;

        let deleted = connection.execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id IS ?2",
            params![id, session.user_id()],
        )?;

        if deleted == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}
