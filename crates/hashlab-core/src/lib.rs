//! Proof-of-work block-chaining engine: hashing, nonce search, Merkle roots,
//! chain validation, reward halving and a balance-checked transaction pool.

pub mod block;
pub mod chain;
pub mod config;
pub mod constants;
pub mod digest;
pub mod error;
pub mod merkle;
pub mod mine;
pub mod pool;
pub mod reward;
pub mod session;
pub mod validate;

pub use block::{Block, BlockTemplate, Difficulty};
pub use chain::{Chain, ChainSnapshot};
pub use config::EngineConfig;
pub use constants::ZERO_HASH;
pub use digest::sha256_hex as digest;
pub use error::{EngineError, Result};
pub use merkle::merkle_root;
pub use mine::{
    mine, CancelToken, MineOutcome, MinedBlock, Miner, MiningObserver, MiningProgress, MiningStats,
    Unbounded,
};
pub use pool::{Admission, AdmitError, Balances, Transaction, TransactionPool};
pub use reward::{reward_at, RewardSchedule};
pub use session::Session;
pub use validate::{validate, Finding, InvalidReason, ValidationReport};
