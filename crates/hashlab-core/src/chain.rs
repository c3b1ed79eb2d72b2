use serde::{Deserialize, Serialize};
use tracing::info;

use crate::block::Block;
use crate::constants::ZERO_HASH;
use crate::error::{EngineError, Result};
use crate::validate::{check_block, validate, InvalidReason, ValidationReport};

/// Append-only arena of blocks indexed by height. Every successful append
/// bumps `version`, which snapshots use to tell whether they are stale.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    blocks: Vec<Block>,
    version: u64,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get(&self, height: u64) -> Option<&Block> {
        usize::try_from(height).ok().and_then(|h| self.blocks.get(h))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Height the next block must carry.
    pub fn next_height(&self) -> u64 {
        self.blocks.len() as u64
    }

    /// Previous hash the next block must carry.
    pub fn tip_hash(&self) -> &str {
        self.tip().map_or(ZERO_HASH, |b| b.hash.as_str())
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Append a block that continues the tip and carries a valid proof-of-work.
    pub fn append(&mut self, block: Block) -> Result<&Block> {
        let expected = self.next_height();
        if block.height != expected || block.previous_hash != self.tip_hash() {
            return Err(EngineError::DoesNotExtendTip {
                expected,
                got: block.height,
            });
        }
        match check_block(&block, self.blocks.len(), self.tip()) {
            None => {}
            Some(InvalidReason::HashMismatch) => {
                return Err(EngineError::MalformedBlock {
                    field: "hash",
                    reason: "does not match the block's fields".into(),
                })
            }
            Some(InvalidReason::DifficultyNotMet) => {
                return Err(EngineError::MalformedBlock {
                    field: "hash",
                    reason: format!("fewer than {} leading zeros", block.difficulty),
                })
            }
            Some(InvalidReason::BrokenLink) => {
                return Err(EngineError::DoesNotExtendTip {
                    expected,
                    got: block.height,
                })
            }
        }
        info!("Appended block {} with hash {}", block.height, block.hash);
        self.blocks.push(block);
        self.version += 1;
        Ok(&self.blocks[self.blocks.len() - 1])
    }

    pub fn validate(&self) -> ValidationReport {
        validate(&self.blocks)
    }

    /// Owned copy for tampering; nothing done to it reaches this chain.
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            base_version: self.version,
            blocks: self.blocks.clone(),
        }
    }

    pub fn is_current(&self, snapshot: &ChainSnapshot) -> bool {
        snapshot.base_version == self.version
    }
}

/// Divergent copy of a [`Chain`]. Blocks may be edited freely; the copy is
/// discarded rather than written back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    base_version: u64,
    blocks: Vec<Block>,
}

impl ChainSnapshot {
    pub fn base_version(&self) -> u64 {
        self.base_version
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn block_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn validate(&self) -> ValidationReport {
        validate(&self.blocks)
    }
}
