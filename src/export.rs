//! Encodes a transaction collection as CSV for download.

use time::Month;

use crate::{Error, transaction::Transaction};

/// The MIME type to serve an encoded export as.
pub const CSV_MIME_TYPE: &str = "text/csv";

const HEADER: [&str; 6] = [
    "Credit Date",
    "Credit Amount",
    "Debit Date",
    "Debit Amount",
    "Debit Type",
    "Charge",
];

/// Encode `transactions` as CSV text.
///
/// The column order is fixed: credit date, credit amount, debit date, debit
/// amount, debit type, charge. A header row comes first, missing fields are
/// rendered empty, and fields are quoted per RFC 4180 when needed.
///
/// # Errors
/// Returns an [Error::Csv] if a record cannot be written.
pub fn encode(transactions: &[Transaction]) -> Result<String, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(HEADER)?;

    for transaction in transactions {
        writer.write_record([
            transaction
                .credit_date()
                .map(|date| date.to_string())
                .unwrap_or_default(),
            transaction
                .credit_amount()
                .map(|amount| amount.to_string())
                .unwrap_or_default(),
            transaction
                .debit_date()
                .map(|date| date.to_string())
                .unwrap_or_default(),
            transaction
                .debit_amount()
                .map(|amount| amount.to_string())
                .unwrap_or_default(),
            transaction
                .debit_type()
                .map(|debit_type| debit_type.to_string())
                .unwrap_or_default(),
            transaction.charge().to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::Csv(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::Csv(error.to_string()))
}

/// The download filename for a single month's export, e.g.
/// `TakaLedger_February_2025.csv`.
pub fn month_export_filename(product: &str, year: i32, month: Month) -> String {
    format!("{product}_{month}_{year}.csv")
}

/// The download filename for a full year's export, e.g. `TakaLedger_2025.csv`.
pub fn year_export_filename(product: &str, year: i32) -> String {
    format!("{product}_{year}.csv")
}
