//! Year/month partitioning of transactions for filtering, grouping and the
//! year picker.

use std::collections::{BTreeMap, BTreeSet};

use time::{Date, Month};

use crate::transaction::Transaction;

/// The year of a transaction's effective date, or `None` if it has no dates.
pub fn year_of(transaction: &Transaction) -> Option<i32> {
    transaction.effective_date().map(|date| date.year())
}

/// The `"YYYY-MM"` key of a transaction's effective date, or `None` if it has
/// no dates.
pub fn month_key_of(transaction: &Transaction) -> Option<String> {
    transaction.effective_date().map(month_key)
}

/// Format a date as a zero-padded `"YYYY-MM"` partition key.
///
/// Keys compare lexicographically in chronological order.
pub fn month_key(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), date.month() as u8)
}

/// The distinct years present in the collection's effective dates, newest
/// first.
pub fn available_years(transactions: &[Transaction]) -> Vec<i32> {
    let years: BTreeSet<i32> = transactions.iter().filter_map(year_of).collect();

    years.into_iter().rev().collect()
}

/// A year and/or month to restrict a transaction view to.
///
/// A month on its own matches that month in any year; the month value does
/// not carry a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodFilter {
    /// Keep transactions dated in this year.
    pub year: Option<i32>,
    /// Keep transactions dated in this month (of any year unless `year` is
    /// also set).
    pub month: Option<Month>,
}

impl PeriodFilter {
    /// Filter by year only.
    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            month: None,
        }
    }

    /// Filter by month only, matching that month in any year.
    pub fn month(month: Month) -> Self {
        Self {
            year: None,
            month: Some(month),
        }
    }

    /// Filter by an exact year and month pair.
    pub fn year_and_month(year: i32, month: Month) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
        }
    }

    fn is_empty(&self) -> bool {
        self.year.is_none() && self.month.is_none()
    }

    fn matches_date(&self, date: Date) -> bool {
        if self.year.is_some_and(|year| date.year() != year) {
            return false;
        }

        if self.month.is_some_and(|month| date.month() != month) {
            return false;
        }

        true
    }

    /// Whether `transaction` falls inside the filter window.
    ///
    /// A transaction matches when either of its dates satisfies the filter,
    /// not only the effective date: an edit that moves the credit leg outside
    /// the window while the debit leg still falls inside must keep the
    /// transaction visible.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        if self.is_empty() {
            return true;
        }

        transaction
            .credit_date()
            .is_some_and(|date| self.matches_date(date))
            || transaction
                .debit_date()
                .is_some_and(|date| self.matches_date(date))
    }
}

/// The subsequence of `transactions` that fall inside `period`, preserving
/// the original relative order.
///
/// An empty filter returns the full collection.
pub fn filter(transactions: &[Transaction], period: &PeriodFilter) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| period.matches(transaction))
        .cloned()
        .collect()
}

/// Group transactions by the `"YYYY-MM"` key of their effective date.
///
/// Keys enumerate in ascending order. Transactions without an effective date
/// are silently excluded.
pub fn group_by_month(transactions: &[Transaction]) -> BTreeMap<String, Vec<Transaction>> {
    let mut groups: BTreeMap<String, Vec<Transaction>> = BTreeMap::new();

    for transaction in transactions {
        if let Some(key) = month_key_of(transaction) {
            groups.entry(key).or_default().push(transaction.clone());
        }
    }

    groups
}
