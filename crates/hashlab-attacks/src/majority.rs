use hashlab_core::Chain;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AttackError, Result};

/// Estimated cost of rewriting a chain from `from_height` to its tip.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MajorityCost {
    pub from_height: u64,
    pub blocks_to_redo: u64,
    /// Expected nonce attempts to redo those blocks, `Σ 16^difficulty`.
    pub cumulative_work: f64,
    /// `cumulative_work` in units of one block at the tip's difficulty.
    pub multiplier: f64,
    pub attacker_share: f64,
    /// Chance of ever overtaking the honest chain, `(q/p)^z` below a majority.
    pub catch_up_probability: f64,
}

impl MajorityCost {
    pub fn has_majority(&self) -> bool {
        self.attacker_share > 0.5
    }
}

pub fn majority_attack_cost(
    chain: &Chain,
    from_height: u64,
    attacker_share: f64,
) -> Result<MajorityCost> {
    if !(0.0..=1.0).contains(&attacker_share) {
        return Err(AttackError::InvalidShare(attacker_share));
    }
    let len = chain.len();
    let start = usize::try_from(from_height)
        .ok()
        .filter(|start| *start <= len)
        .ok_or(AttackError::IndexOutOfRange {
            index: from_height,
            len,
        })?;

    let redo = &chain.blocks()[start..];
    let cumulative_work: f64 = redo.iter().map(|b| b.difficulty.expected_attempts()).sum();
    let per_block = chain.tip().map_or(1.0, |b| b.difficulty.expected_attempts());
    let blocks_to_redo = redo.len() as u64;

    let q = attacker_share;
    let p = 1.0 - q;
    let catch_up_probability = if q >= p {
        1.0
    } else {
        (q / p).powi(blocks_to_redo.min(i32::MAX as u64) as i32)
    };

    let cost = MajorityCost {
        from_height,
        blocks_to_redo,
        cumulative_work,
        multiplier: cumulative_work / per_block,
        attacker_share,
        catch_up_probability,
    };
    info!(
        "Rewriting {} blocks from height {} costs ~{} hashes; catch-up probability {:.6}",
        blocks_to_redo, from_height, cumulative_work, catch_up_probability
    );
    Ok(cost)
}
