//! A personal-finance transaction ledger engine.
//!
//! Tracks money-transfer transactions where each record can carry a credit
//! leg, a debit leg, or both. Debits incur a flat service charge by transfer
//! type (BEFTN, NPSB, RTGS), derived by the engine and never trusted from
//! input. The collection can be partitioned by year and month, summarised
//! into credit/debit/charge totals, exported as CSV, and persisted through a
//! swappable [stores::TransactionStore] while the [Ledger] keeps the
//! in-memory view consistent under concurrent edits.

#![warn(missing_docs)]

pub mod charge;
pub mod error;
pub mod export;
pub mod ledger;
pub mod logging;
pub mod partition;
pub mod session;
pub mod stores;
pub mod summary;
pub mod transaction;

pub use error::Error;
pub use ledger::{Ledger, LedgerConfig};
pub use session::{AuthEvent, SessionIdentity, UserId};
pub use transaction::{DebitType, Transaction, TransactionDraft, TransactionId};
