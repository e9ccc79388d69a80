//! Defines the core data model: transactions, drafts and debit types.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, charge};

/// Alias for the integer type used for transaction IDs.
///
/// IDs are assigned by the persistence store (or locally, monotonic by
/// creation, for the in-memory store) and are unique for the lifetime of the
/// ledger.
pub type TransactionId = i64;

/// The kind of interbank transfer used for the debit leg of a transaction.
///
/// The set is closed: these are the transfer rails the fee schedule in
/// [crate::charge] knows about. Tags read from storage that do not match any
/// variant are dropped with a warning and the row loads without a debit
/// type, so it keeps the fee of 0 such rows always had.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum DebitType {
    /// Bangladesh Electronic Funds Transfer Network, free of charge.
    Beftn,
    /// National Payment Switch Bangladesh, small flat fee.
    Npsb,
    /// Real Time Gross Settlement, larger flat fee.
    Rtgs,
}

impl DebitType {
    /// Parse a stored tag such as `"NPSB"` into a debit type.
    ///
    /// Returns `None` for tags outside the known set.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "BEFTN" => Some(DebitType::Beftn),
            "NPSB" => Some(DebitType::Npsb),
            "RTGS" => Some(DebitType::Rtgs),
            _ => None,
        }
    }
}

impl Display for DebitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            DebitType::Beftn => "BEFTN",
            DebitType::Npsb => "NPSB",
            DebitType::Rtgs => "RTGS",
        };

        write!(f, "{tag}")
    }
}

/// A credit into or a debit out of the tracked account, as stored in the
/// ledger.
///
/// Fields are private so that `charge` can never drift out of sync with the
/// debit amount and type: the only ways to build a `Transaction` are
/// [Transaction::from_draft], which recomputes the charge, and
/// [Transaction::new_unchecked], which is reserved for store row mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    credit_date: Option<Date>,
    credit_amount: Option<f64>,
    debit_date: Option<Date>,
    debit_amount: Option<f64>,
    debit_type: Option<DebitType>,
    charge: f64,
    created_at: OffsetDateTime,
}

impl Transaction {
    /// Build a transaction from a validated draft, computing the charge from
    /// the draft's debit amount and type.
    ///
    /// `id` and `created_at` come from the persistence store that accepted
    /// the draft.
    pub fn from_draft(id: TransactionId, created_at: OffsetDateTime, draft: TransactionDraft) -> Self {
        let charge = charge::charge_for(draft.debit_amount, draft.debit_type);

        Self {
            id,
            credit_date: draft.credit_date,
            credit_amount: draft.credit_amount,
            debit_date: draft.debit_date,
            debit_amount: draft.debit_amount,
            debit_type: draft.debit_type,
            charge,
            created_at,
        }
    }

    /// Build a transaction from raw field values without recomputing the
    /// charge.
    ///
    /// Only intended for mapping rows out of a persistence store that already
    /// holds a consistent charge.
    #[allow(clippy::too_many_arguments)]
    pub fn new_unchecked(
        id: TransactionId,
        credit_date: Option<Date>,
        credit_amount: Option<f64>,
        debit_date: Option<Date>,
        debit_amount: Option<f64>,
        debit_type: Option<DebitType>,
        charge: f64,
        created_at: OffsetDateTime,
    ) -> Self {
        Self {
            id,
            credit_date,
            credit_amount,
            debit_date,
            debit_amount,
            debit_type,
            charge,
            created_at,
        }
    }

    /// The ID of the transaction.
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// When money came into the account, if this transaction has a credit leg.
    pub fn credit_date(&self) -> Option<Date> {
        self.credit_date
    }

    /// How much money came into the account.
    pub fn credit_amount(&self) -> Option<f64> {
        self.credit_amount
    }

    /// When money left the account, if this transaction has a debit leg.
    pub fn debit_date(&self) -> Option<Date> {
        self.debit_date
    }

    /// How much money left the account.
    pub fn debit_amount(&self) -> Option<f64> {
        self.debit_amount
    }

    /// The transfer rail used for the debit leg.
    pub fn debit_type(&self) -> Option<DebitType> {
        self.debit_type
    }

    /// The service charge assessed on the debit leg.
    ///
    /// Derived from the debit amount and type by [crate::charge::charge_for],
    /// never set directly by callers.
    pub fn charge(&self) -> f64 {
        self.charge
    }

    /// When the transaction was recorded. Set once at creation and immutable
    /// thereafter, including across updates.
    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// The date used for time-partitioning: the credit date if present,
    /// otherwise the debit date.
    ///
    /// `None` means the transaction is excluded from any time-partitioned
    /// view but still exists in the raw collection.
    pub fn effective_date(&self) -> Option<Date> {
        self.credit_date.or(self.debit_date)
    }
}

/// The caller-editable fields of a transaction.
///
/// A draft carries no ID, no charge and no creation timestamp: those are
/// assigned or derived when the draft is accepted into the ledger. The same
/// type is used for creating a transaction and for the full replacement of
/// fields on update.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransactionDraft {
    /// When money came into the account.
    pub credit_date: Option<Date>,
    /// How much money came into the account. Must not be negative.
    pub credit_amount: Option<f64>,
    /// When money left the account.
    pub debit_date: Option<Date>,
    /// How much money left the account. Must not be negative.
    pub debit_amount: Option<f64>,
    /// The transfer rail used for the debit leg. Required whenever
    /// `debit_amount` is present.
    pub debit_type: Option<DebitType>,
}

impl TransactionDraft {
    /// Shortcut for a credit-only draft.
    pub fn credit(date: Date, amount: f64) -> Self {
        Self {
            credit_date: Some(date),
            credit_amount: Some(amount),
            ..Default::default()
        }
    }

    /// Shortcut for a debit-only draft.
    pub fn debit(date: Date, amount: f64, debit_type: DebitType) -> Self {
        Self {
            debit_date: Some(date),
            debit_amount: Some(amount),
            debit_type: Some(debit_type),
            ..Default::default()
        }
    }

    /// Check the draft against the shape invariants for a valid transaction.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::MissingFields] naming the missing fields if the draft has no
    ///   date, no amount, or a debit amount without a debit type,
    /// - or [Error::NegativeAmount] if either amount is below zero.
    pub fn validate(&self) -> Result<(), Error> {
        let mut missing = Vec::new();

        if self.credit_date.is_none() && self.debit_date.is_none() {
            missing.push("credit_date or debit_date");
        }

        if self.credit_amount.is_none() && self.debit_amount.is_none() {
            missing.push("credit_amount or debit_amount");
        }

        if self.debit_amount.is_some() && self.debit_type.is_none() {
            missing.push("debit_type");
        }

        if !missing.is_empty() {
            return Err(Error::MissingFields(missing));
        }

        if self.credit_amount.is_some_and(|amount| amount < 0.0) {
            return Err(Error::NegativeAmount("credit_amount"));
        }

        if self.debit_amount.is_some_and(|amount| amount < 0.0) {
            return Err(Error::NegativeAmount("debit_amount"));
        }

        Ok(())
    }
}
