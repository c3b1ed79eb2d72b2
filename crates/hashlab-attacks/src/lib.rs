//! Local demonstrations of what the engine's validator and pool reject. Every
//! simulation works on a copy of the chain or pool and reports what
//! `hashlab_core::validate` or `TransactionPool::admit` concluded.

pub mod double_spend;
pub mod majority;
pub mod retroactive;

use hashlab_core::EngineError;
use thiserror::Error;

pub use double_spend::{double_spend, DoubleSpendReport};
pub use majority::{majority_attack_cost, MajorityCost};
pub use retroactive::{retroactive_edit, retroactive_edit_with, TamperMode, TamperReport};

#[derive(Debug, Error)]
pub enum AttackError {
    #[error("index {index} is outside a chain of {len} blocks")]
    IndexOutOfRange { index: u64, len: usize },

    #[error("attacker share {0} must lie between 0 and 1")]
    InvalidShare(f64),

    #[error("re-mining block {height} was cancelled after {attempts} attempts")]
    Cancelled { height: u64, attempts: u64 },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, AttackError>;
