//! The fee schedule for interbank transfers.
//!
//! Charges are flat fees keyed only by the transfer rail, matching how the
//! banks price them. The fee does not scale with the amount: sending 1 taka
//! over RTGS costs the same as sending a million.

use crate::transaction::DebitType;

impl DebitType {
    /// The flat fee assessed on a debit sent over this rail.
    pub fn flat_fee(&self) -> f64 {
        match self {
            DebitType::Beftn => 0.0,
            DebitType::Npsb => 10.0,
            DebitType::Rtgs => 100.0,
        }
    }
}

/// Compute the service charge for a debit of `amount` sent over `debit_type`.
///
/// Returns `0` when the debit type is absent, the amount is absent, or the
/// amount is not positive. Otherwise the fee depends only on the debit type.
pub fn charge_for(amount: Option<f64>, debit_type: Option<DebitType>) -> f64 {
    match (amount, debit_type) {
        (Some(amount), Some(debit_type)) if amount > 0.0 => debit_type.flat_fee(),
        _ => 0.0,
    }
}
