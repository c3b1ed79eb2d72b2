use hashlab_core::{Admission, AdmitError, TransactionPool};
use tracing::info;

#[derive(Clone, Debug, PartialEq)]
pub struct DoubleSpendReport {
    pub spender: String,
    pub balance_before: Option<f64>,
    pub balance_after: Option<f64>,
    pub first: Result<Admission, AdmitError>,
    pub second: Result<Admission, AdmitError>,
}

impl DoubleSpendReport {
    /// True when the pool refused the second spend for lack of funds.
    pub fn rejected(&self) -> bool {
        matches!(self.second, Err(AdmitError::InsufficientBalance { .. }))
    }
}

/// Submit two payments of `amount` from `spender` to different recipients on
/// a copy of `pool`.
pub fn double_spend(
    pool: &TransactionPool,
    spender: &str,
    recipients: (&str, &str),
    amount: f64,
    timestamp: u64,
) -> DoubleSpendReport {
    let mut pool = pool.clone();
    let balance_before = pool.balance_of(spender);

    let tx = pool.draft(spender, recipients.0, amount, timestamp);
    let first = pool.admit(tx);
    let tx = pool.draft(spender, recipients.1, amount, timestamp);
    let second = pool.admit(tx);

    let report = DoubleSpendReport {
        spender: spender.to_string(),
        balance_before,
        balance_after: pool.balance_of(spender),
        first,
        second,
    };
    info!(
        "Double spend of {} by {}: first {}, second {}",
        amount,
        spender,
        if report.first.is_ok() { "accepted" } else { "rejected" },
        if report.second.is_ok() { "accepted" } else { "rejected" }
    );
    report
}
