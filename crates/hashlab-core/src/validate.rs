use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::block::Block;
use crate::constants::ZERO_HASH;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidReason {
    /// Stored previous hash (or height) does not continue the preceding block.
    BrokenLink,
    /// Stored hash differs from the digest of the block's own fields.
    HashMismatch,
    /// Stored hash lacks the leading zeros its stored difficulty demands.
    DifficultyNotMet,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub index: usize,
    pub reason: InvalidReason,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub finding: Option<Finding>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.finding.is_none()
    }

    pub fn first_invalid_index(&self) -> Option<usize> {
        self.finding.map(|f| f.index)
    }

    pub fn reason(&self) -> Option<InvalidReason> {
        self.finding.map(|f| f.reason)
    }
}

/// Check a single block against its predecessor (`None` for the first block).
pub fn check_block(block: &Block, index: usize, previous: Option<&Block>) -> Option<InvalidReason> {
    if !block.has_consistent_hash() {
        return Some(InvalidReason::HashMismatch);
    }
    let expected_prev = previous.map_or(ZERO_HASH, |p| p.hash.as_str());
    if block.previous_hash != expected_prev || block.height != index as u64 {
        return Some(InvalidReason::BrokenLink);
    }
    if !block.meets_difficulty() {
        return Some(InvalidReason::DifficultyNotMet);
    }
    None
}

/// Recheck every block from the first to the tip; the lowest failing index
/// wins. An empty chain is valid.
pub fn validate(chain: &[Block]) -> ValidationReport {
    for (index, block) in chain.iter().enumerate() {
        let previous = index.checked_sub(1).map(|p| &chain[p]);
        if let Some(reason) = check_block(block, index, previous) {
            warn!(index, ?reason, "chain validation failed");
            return ValidationReport {
                finding: Some(Finding { index, reason }),
            };
        }
    }
    ValidationReport::default()
}
