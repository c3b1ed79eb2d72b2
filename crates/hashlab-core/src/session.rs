use std::collections::BTreeMap;

use tracing::info;

use crate::block::{Block, BlockTemplate, Difficulty};
use crate::chain::{Chain, ChainSnapshot};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::merkle::merkle_root;
use crate::mine::{MineOutcome, Miner, MiningObserver};
use crate::pool::{Admission, AdmitError, Balances, Transaction, TransactionPool};
use crate::reward::RewardSchedule;
use crate::validate::ValidationReport;

/// Single-writer owner of a chain and its transaction pool. All mutation
/// goes through `&mut self`, so appends, pool changes and validation never
/// overlap on the same state.
#[derive(Debug)]
pub struct Session {
    config: EngineConfig,
    miner: Miner,
    rewards: RewardSchedule,
    difficulty: Difficulty,
    chain: Chain,
    pool: TransactionPool,
    confirmed: BTreeMap<u64, Vec<Transaction>>,
    total_attempts: u64,
}

impl Session {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let mut balances = Balances::new();
        balances.track(config.miner_account.clone(), config.initial_balance);
        Ok(Self {
            miner: config.miner()?,
            rewards: config.reward_schedule()?,
            difficulty: config.initial_difficulty()?,
            chain: Chain::new(),
            pool: TransactionPool::new(balances),
            confirmed: BTreeMap::new(),
            total_attempts: 0,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn pool(&self) -> &TransactionPool {
        &self.pool
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Result<()> {
        if difficulty.zeros() > self.config.max_difficulty {
            return Err(EngineError::InvalidDifficulty(format!(
                "{difficulty} (ceiling is {})",
                self.config.max_difficulty
            )));
        }
        self.difficulty = difficulty;
        Ok(())
    }

    /// Step difficulty up by one, stopping at the configured ceiling.
    pub fn raise_difficulty(&mut self) -> Difficulty {
        let next = (self.difficulty.zeros() + 1).min(self.config.max_difficulty);
        if let Ok(d) = Difficulty::new(next) {
            self.difficulty = d;
        }
        info!("Difficulty is now {}", self.difficulty);
        self.difficulty
    }

    /// Reward the next mined block will pay.
    pub fn current_reward(&self) -> f64 {
        self.rewards.at(self.chain.next_height())
    }

    pub fn miner_balance(&self) -> f64 {
        self.pool.balance_of(&self.config.miner_account).unwrap_or_default()
    }

    /// Nonce attempts spent on every mining run of this session, cancelled ones included.
    pub fn total_attempts(&self) -> u64 {
        self.total_attempts
    }

    pub fn draft(
        &mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: f64,
        timestamp: u64,
    ) -> Transaction {
        self.pool.draft(from, to, amount, timestamp)
    }

    pub fn submit(&mut self, tx: Transaction) -> std::result::Result<Admission, AdmitError> {
        self.pool.admit(tx)
    }

    /// Merkle root over the ids of the pending transactions.
    pub fn pending_root(&self) -> String {
        merkle_root(&self.pool.pending_ids())
    }

    /// Mine `payload` on top of the tip and append it.
    pub fn mine_data<O>(
        &mut self,
        payload: impl Into<String>,
        timestamp: u64,
        observer: &mut O,
    ) -> Result<MineOutcome>
    where
        O: MiningObserver + ?Sized,
    {
        let template = BlockTemplate::new(
            self.chain.next_height(),
            timestamp,
            payload,
            self.chain.tip_hash(),
        );
        let outcome = self.miner.mine_with(template, self.difficulty, observer)?;
        self.total_attempts += outcome.stats().attempts;
        if let MineOutcome::Mined(mined) = &outcome {
            self.commit(mined.block.clone())?;
        }
        Ok(outcome)
    }

    /// Mine a block whose payload is the Merkle root of the pending set. The
    /// pending set is only consumed when the block is appended.
    pub fn mine_pending<O>(&mut self, timestamp: u64, observer: &mut O) -> Result<MineOutcome>
    where
        O: MiningObserver + ?Sized,
    {
        let root = self.pending_root();
        let outcome = self.mine_data(root, timestamp, observer)?;
        if let MineOutcome::Mined(mined) = &outcome {
            let txs = self.pool.take_pending();
            info!("Block {} confirmed {} transactions", mined.block.height, txs.len());
            self.confirmed.insert(mined.block.height, txs);
        }
        Ok(outcome)
    }

    /// Transactions embedded in the block at `height` through `mine_pending`.
    pub fn transactions_at(&self, height: u64) -> &[Transaction] {
        self.confirmed.get(&height).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn validate(&self) -> ValidationReport {
        self.chain.validate()
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        self.chain.snapshot()
    }

    /// Owned copy of the pool for what-if admissions.
    pub fn pool_snapshot(&self) -> TransactionPool {
        self.pool.clone()
    }

    fn commit(&mut self, block: Block) -> Result<()> {
        let reward = self.rewards.at(block.height);
        let height = self.chain.append(block)?.height;
        let balance = self.pool.credit(&self.config.miner_account, reward);
        info!(height, reward, ?balance, "block reward credited");
        Ok(())
    }
}
