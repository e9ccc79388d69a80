//! Defines the crate level error type.

/// The errors that may occur while working with the ledger.
///
/// None of these are fatal: every variant is reported upward for the calling
/// application to render, and the in-memory collection is left in a known
/// state (see [crate::ledger::Ledger] for the exact guarantees per
/// operation).
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A transaction draft did not satisfy the shape invariants.
    ///
    /// The payload names the fields that were missing. Callers should fix the
    /// draft and retry; nothing was persisted.
    #[error("transaction draft is missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A negative amount was used in a transaction draft.
    ///
    /// Credit and debit amounts record how much money moved, so they must be
    /// zero or positive.
    #[error("{0} must not be negative")]
    NegativeAmount(&'static str),

    /// There was no transaction matching the given ID that is owned by the
    /// current session.
    ///
    /// Callers should refresh their view: the record may have been deleted
    /// from another device, or it belongs to someone else.
    #[error("a transaction with the given ID could not be found")]
    NotFound,

    /// The persistence store could not be reached while loading the ledger.
    ///
    /// The in-memory collection falls back to empty rather than holding a
    /// partially merged state.
    #[error("the persistence store is unreachable: {0}")]
    RemoteUnavailable(String),

    /// The persistence store rejected a write.
    ///
    /// The in-memory collection is left exactly as it was before the call.
    #[error("the persistence store rejected the write: {0}")]
    Persistence(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// A transaction collection could not be encoded as CSV.
    #[error("could not encode CSV: {0}")]
    Csv(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error::Csv(value.to_string())
    }
}
