use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub timestamp: u64,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: f64,
        timestamp: u64,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            amount,
            timestamp,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdmitError {
    #[error("insufficient balance in {account}: requested {requested}, available {available}")]
    InsufficientBalance {
        account: String,
        requested: f64,
        available: f64,
    },
    #[error("invalid amount {amount}: must be a finite non-negative number")]
    InvalidAmount { amount: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Admission {
    pub id: String,
    /// Sender balance after the debit; `None` for untracked senders.
    pub remaining_balance: Option<f64>,
}

/// Balances of the accounts the pool checks. Senders missing from this map
/// are external and are never checked.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Balances(BTreeMap<String, f64>);

impl Balances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, account: impl Into<String>, balance: f64) {
        self.0.insert(account.into(), balance);
    }

    pub fn get(&self, account: &str) -> Option<f64> {
        self.0.get(account).copied()
    }

    /// Adds `amount` to a tracked account; untracked accounts are ignored.
    pub fn credit(&mut self, account: &str, amount: f64) -> Option<f64> {
        self.0.get_mut(account).map(|balance| {
            *balance += amount;
            *balance
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionPool {
    balances: Balances,
    pending: Vec<Transaction>,
    issued: u64,
}

impl TransactionPool {
    pub fn new(balances: Balances) -> Self {
        Self {
            balances,
            pending: Vec::new(),
            issued: 0,
        }
    }

    /// Build a transaction with the next sequential id (`tx-000001`, ...).
    pub fn draft(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: f64,
        timestamp: u64,
    ) -> Transaction {
        self.issued += 1;
        Transaction::new(format!("tx-{:06}", self.issued), from, to, amount, timestamp)
    }

    /// Accept `tx` into the pending set, debiting a tracked sender. On
    /// rejection nothing changes.
    pub fn admit(&mut self, tx: Transaction) -> Result<Admission, AdmitError> {
        if !tx.amount.is_finite() || tx.amount < 0.0 {
            warn!(id = %tx.id, amount = tx.amount, "transaction rejected: invalid amount");
            return Err(AdmitError::InvalidAmount { amount: tx.amount });
        }

        let remaining_balance = match self.balances.0.get_mut(&tx.from) {
            Some(balance) if tx.amount > *balance => {
                warn!(
                    id = %tx.id,
                    from = %tx.from,
                    requested = tx.amount,
                    available = *balance,
                    "transaction rejected: insufficient balance"
                );
                return Err(AdmitError::InsufficientBalance {
                    account: tx.from.clone(),
                    requested: tx.amount,
                    available: *balance,
                });
            }
            Some(balance) => {
                *balance -= tx.amount;
                Some(*balance)
            }
            None => None,
        };

        debug!(
            id = %tx.id,
            from = %tx.from,
            to = %tx.to,
            amount = tx.amount,
            "transaction admitted"
        );
        let admission = Admission {
            id: tx.id.clone(),
            remaining_balance,
        };
        self.pending.push(tx);
        Ok(admission)
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn pending_ids(&self) -> Vec<&str> {
        self.pending.iter().map(|tx| tx.id.as_str()).collect()
    }

    /// Drain the pending set, typically once its Merkle root is in a block.
    pub fn take_pending(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.pending)
    }

    pub fn balances(&self) -> &Balances {
        &self.balances
    }

    pub fn balance_of(&self, account: &str) -> Option<f64> {
        self.balances.get(account)
    }

    pub fn track(&mut self, account: impl Into<String>, balance: f64) {
        self.balances.track(account, balance);
    }

    pub fn credit(&mut self, account: &str, amount: f64) -> Option<f64> {
        self.balances.credit(account, amount)
    }
}
