use std::fmt::Write as _;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::block::{Block, BlockTemplate, Difficulty};
use crate::constants::CHECKPOINT_INTERVAL;
use crate::digest::sha256_hex;
use crate::error::{EngineError, Result};

/// Work spent on one nonce search. `attempts` doubles as the energy figure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MiningStats {
    pub attempts: u64,
    pub elapsed: Duration,
}

impl MiningStats {
    /// Attempts per second; zero when nothing measurable elapsed.
    pub fn hash_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.attempts as f64 / secs
        } else {
            0.0
        }
    }
}

/// Snapshot passed to the observer at each checkpoint.
#[derive(Clone, Debug)]
pub struct MiningProgress<'a> {
    pub height: u64,
    pub nonce: u64,
    pub last_hash: &'a str,
    pub stats: MiningStats,
}

/// Checkpoint hook called every `checkpoint_interval` attempts. Returning
/// `ControlFlow::Break` aborts the search.
pub trait MiningObserver {
    fn checkpoint(&mut self, progress: &MiningProgress<'_>) -> ControlFlow<()>;
}

impl<F> MiningObserver for F
where
    F: FnMut(&MiningProgress<'_>) -> ControlFlow<()>,
{
    fn checkpoint(&mut self, progress: &MiningProgress<'_>) -> ControlFlow<()> {
        self(progress)
    }
}

/// Observer that never stops the search.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbounded;

impl MiningObserver for Unbounded {
    fn checkpoint(&mut self, _progress: &MiningProgress<'_>) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

/// Shared cancellation flag; clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl MiningObserver for CancelToken {
    fn checkpoint(&mut self, _progress: &MiningProgress<'_>) -> ControlFlow<()> {
        if self.is_cancelled() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinedBlock {
    pub block: Block,
    pub stats: MiningStats,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MineOutcome {
    Mined(MinedBlock),
    /// Search aborted at a checkpoint; no block was produced.
    Cancelled(MiningStats),
}

impl MineOutcome {
    pub fn stats(&self) -> MiningStats {
        match self {
            MineOutcome::Mined(mined) => mined.stats,
            MineOutcome::Cancelled(stats) => *stats,
        }
    }

    pub fn mined(self) -> Option<MinedBlock> {
        match self {
            MineOutcome::Mined(mined) => Some(mined),
            MineOutcome::Cancelled(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, MineOutcome::Cancelled(_))
    }

    pub fn into_block(self) -> Option<Block> {
        match self {
            MineOutcome::Mined(mined) => Some(mined.block),
            MineOutcome::Cancelled(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Miner {
    checkpoint_interval: u64,
}

impl Default for Miner {
    fn default() -> Self {
        Self {
            checkpoint_interval: CHECKPOINT_INTERVAL,
        }
    }
}

impl Miner {
    pub fn new(checkpoint_interval: u64) -> Result<Self> {
        if checkpoint_interval == 0 {
            return Err(EngineError::InvalidConfig(
                "checkpoint_interval must be greater than zero".into(),
            ));
        }
        Ok(Self { checkpoint_interval })
    }

    pub fn checkpoint_interval(&self) -> u64 {
        self.checkpoint_interval
    }

    /// Increment the nonce from zero until the hash has `difficulty` leading
    /// hex zeros, consulting `observer` every `checkpoint_interval` attempts.
    pub fn mine_with<O>(
        &self,
        template: BlockTemplate,
        difficulty: Difficulty,
        observer: &mut O,
    ) -> Result<MineOutcome>
    where
        O: MiningObserver + ?Sized,
    {
        template.check()?;
        let started = Instant::now();
        let prefix = template.preimage_prefix();
        let mut buf = String::with_capacity(prefix.len() + 20);
        let mut attempts = 0u64;

        for nonce in 0..=u64::MAX {
            buf.clear();
            buf.push_str(&prefix);
            // Writing into a String cannot fail.
            let _ = write!(buf, "{nonce}");
            let hash = sha256_hex(&buf);
            attempts += 1;

            if difficulty.is_met_by(&hash) {
                let stats = MiningStats {
                    attempts,
                    elapsed: started.elapsed(),
                };
                info!(
                    "Mined block {} with nonce {} and hash {} after {} attempts",
                    template.height, nonce, hash, attempts
                );
                return Ok(MineOutcome::Mined(MinedBlock {
                    block: template.seal(nonce, hash, difficulty),
                    stats,
                }));
            }

            if attempts % self.checkpoint_interval == 0 {
                let progress = MiningProgress {
                    height: template.height,
                    nonce,
                    last_hash: &hash,
                    stats: MiningStats {
                        attempts,
                        elapsed: started.elapsed(),
                    },
                };
                debug!(height = template.height, nonce, attempts, "mining checkpoint");
                if observer.checkpoint(&progress).is_break() {
                    info!(height = template.height, attempts, "mining cancelled");
                    return Ok(MineOutcome::Cancelled(progress.stats));
                }
            }
        }

        Err(EngineError::NonceSpaceExhausted {
            height: template.height,
        })
    }

    /// Searches the nonce space on the rayon pool. Any satisfying nonce may
    /// win, so the result is valid but not necessarily the smallest nonce.
    /// `attempts` is counted per checkpoint interval and is approximate.
    pub fn mine_parallel(
        &self,
        template: BlockTemplate,
        difficulty: Difficulty,
        cancel: &CancelToken,
    ) -> Result<MineOutcome> {
        template.check()?;
        let started = Instant::now();
        let prefix = template.preimage_prefix();
        let interval = self.checkpoint_interval;
        let attempts = AtomicU64::new(0);

        enum Found {
            Nonce(u64, String),
            Cancelled,
        }

        let found = (0u64..u64::MAX).into_par_iter().find_map_any(|nonce| {
            if nonce % interval == 0 {
                attempts.fetch_add(interval, Ordering::Relaxed);
                if cancel.is_cancelled() {
                    return Some(Found::Cancelled);
                }
            }
            let hash = sha256_hex(format!("{prefix}{nonce}"));
            difficulty.is_met_by(&hash).then_some(Found::Nonce(nonce, hash))
        });

        let stats = MiningStats {
            attempts: attempts.load(Ordering::Relaxed).max(1),
            elapsed: started.elapsed(),
        };
        match found {
            Some(Found::Nonce(nonce, hash)) => {
                info!(
                    "Mined block {} in parallel with nonce {} and hash {}",
                    template.height, nonce, hash
                );
                Ok(MineOutcome::Mined(MinedBlock {
                    block: template.seal(nonce, hash, difficulty),
                    stats,
                }))
            }
            Some(Found::Cancelled) => Ok(MineOutcome::Cancelled(stats)),
            None => Err(EngineError::NonceSpaceExhausted {
                height: template.height,
            }),
        }
    }
}

/// Mine a block with the default checkpoint interval and no observer.
pub fn mine(
    height: u64,
    timestamp: u64,
    payload: impl Into<String>,
    previous_hash: impl Into<String>,
    difficulty: Difficulty,
) -> Result<MineOutcome> {
    let template = BlockTemplate::new(height, timestamp, payload, previous_hash);
    Miner::default().mine_with(template, difficulty, &mut Unbounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ZERO_HASH;

    fn d(zeros: u32) -> Difficulty {
        Difficulty::new(zeros).unwrap()
    }

    fn mine_ok(height: u64, timestamp: u64, payload: &str, difficulty: Difficulty) -> MinedBlock {
        mine(height, timestamp, payload, ZERO_HASH, difficulty).unwrap().mined().unwrap()
    }

    #[test]
    fn difficulty_zero_accepts_first_nonce() {
        let mined = mine_ok(0, 1_700_000_000_000, "genesis", Difficulty::ZERO);
        assert_eq!(mined.block.nonce, 0);
        assert_eq!(mined.stats.attempts, 1);
        assert!(mined.block.has_consistent_hash());
    }

    #[test]
    fn mined_block_meets_difficulty() {
        let mined = mine_ok(1, 1_700_000_000_000, "tx1", d(3));
        assert!(mined.block.hash.starts_with("000"));
        assert!(mined.block.meets_difficulty());
        assert!(mined.block.has_consistent_hash());
        assert_eq!(mined.stats.attempts, mined.block.nonce + 1);
    }

    #[test]
    fn mining_is_deterministic() {
        let a = mine_ok(2, 42, "same", d(2));
        let b = mine_ok(2, 42, "same", d(2));
        assert_eq!(a.block, b.block);
    }

    #[test]
    fn malformed_previous_hash_is_rejected_before_mining() {
        let err = mine(1, 0, "x", "not-a-hash", d(1)).unwrap_err();
        assert!(matches!(err, EngineError::MalformedBlock { .. }));
    }

    #[test]
    fn observer_is_called_at_checkpoints_and_can_cancel() {
        let miner = Miner::new(10).unwrap();
        let template = BlockTemplate::new(1, 0, "never", ZERO_HASH);
        let mut calls = 0;
        let mut stop_after_three = |p: &MiningProgress<'_>| {
            calls += 1;
            assert_eq!(p.stats.attempts % 10, 0);
            if calls == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        let outcome = miner.mine_with(template, Difficulty::MAX, &mut stop_after_three).unwrap();
        assert!(outcome.is_cancelled());
        assert_eq!(outcome.stats().attempts, 30);
        assert!(outcome.into_block().is_none());
        assert_eq!(calls, 3);
    }

    #[test]
    fn cancel_token_stops_search() {
        let token = CancelToken::new();
        token.cancel();
        let miner = Miner::new(5).unwrap();
        let mut observer = token.clone();
        let outcome = miner
            .mine_with(BlockTemplate::new(0, 0, "x", ZERO_HASH), Difficulty::MAX, &mut observer)
            .unwrap();
        assert!(matches!(outcome, MineOutcome::Cancelled(stats) if stats.attempts == 5));
    }

    #[test]
    fn parallel_mining_finds_valid_block() {
        let miner = Miner::default();
        let outcome = miner
            .mine_parallel(BlockTemplate::new(4, 99, "par", ZERO_HASH), d(2), &CancelToken::new())
            .unwrap();
        let block = outcome.into_block().unwrap();
        assert!(block.meets_difficulty());
        assert!(block.has_consistent_hash());
    }

    #[test]
    fn parallel_mining_honours_cancellation() {
        let token = CancelToken::new();
        token.cancel();
        let outcome = Miner::default()
            .mine_parallel(BlockTemplate::new(0, 0, "x", ZERO_HASH), Difficulty::MAX, &token)
            .unwrap();
        assert!(matches!(outcome, MineOutcome::Cancelled(_)));
    }

    #[test]
    fn zero_checkpoint_interval_is_invalid() {
        assert!(matches!(Miner::new(0), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn hash_rate_handles_zero_elapsed() {
        let stats = MiningStats {
            attempts: 10,
            elapsed: Duration::ZERO,
        };
        assert_eq!(stats.hash_rate(), 0.0);
    }
}
