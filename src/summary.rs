//! Aggregation of transaction collections into dashboard totals.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    partition,
    transaction::{DebitType, Transaction},
};

/// Summed amounts over a transaction collection.
///
/// Sums are commutative, so the totals do not depend on the iteration order
/// of the input collection.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Totals {
    /// The sum of all credit amounts.
    pub credit: f64,
    /// The sum of all debit amounts.
    pub debit: f64,
    /// The sum of all service charges.
    pub charges: f64,
}

impl Totals {
    /// What is left after debits and charges are taken out of the credits.
    pub fn net_balance(&self) -> f64 {
        self.credit - self.debit - self.charges
    }
}

/// Compute the [Totals] over a collection. Absent amounts contribute zero.
pub fn totals(transactions: &[Transaction]) -> Totals {
    transactions.iter().fold(Totals::default(), |totals, transaction| Totals {
        credit: totals.credit + transaction.credit_amount().unwrap_or(0.0),
        debit: totals.debit + transaction.debit_amount().unwrap_or(0.0),
        charges: totals.charges + transaction.charge(),
    })
}

/// Sum debit amounts per debit type, e.g. for a distribution pie chart.
///
/// Transactions without a debit type or debit amount are skipped.
pub fn debit_type_breakdown(transactions: &[Transaction]) -> BTreeMap<DebitType, f64> {
    let mut breakdown = BTreeMap::new();

    for transaction in transactions {
        if let (Some(debit_type), Some(amount)) =
            (transaction.debit_type(), transaction.debit_amount())
        {
            *breakdown.entry(debit_type).or_insert(0.0) += amount;
        }
    }

    breakdown
}

/// The totals for a single `"YYYY-MM"` partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    /// The `"YYYY-MM"` partition key.
    pub month: String,
    /// The totals over the partition's transactions.
    pub totals: Totals,
}

/// Compute per-month totals, ascending by month key.
///
/// Transactions without an effective date are excluded, the same as in
/// [partition::group_by_month].
pub fn monthly_series(transactions: &[Transaction]) -> Vec<MonthlySummary> {
    partition::group_by_month(transactions)
        .into_iter()
        .map(|(month, group)| MonthlySummary {
            month,
            totals: totals(&group),
        })
        .collect()
}
