use hashlab_core::{
    Block, BlockTemplate, Chain, ChainSnapshot, Miner, MiningObserver, Unbounded, ValidationReport,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{AttackError, Result};

/// How much the attacker repairs after editing a block's payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TamperMode {
    /// Leave the stored hash as it was.
    PayloadOnly,
    /// Recompute the edited block's own hash without proof-of-work.
    RehashTarget,
    /// Redo proof-of-work for the edited block only; later blocks keep
    /// pointing at the old hash.
    RemineTarget,
    /// Relink and rehash every block from the edit onward, skipping
    /// proof-of-work.
    RehashDownstream,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TamperReport {
    pub index: usize,
    pub mode: TamperMode,
    /// Hash computations the attacker spent on repairs.
    pub work: u64,
    pub validation: ValidationReport,
    pub tampered: ChainSnapshot,
}

impl TamperReport {
    pub fn detected(&self) -> bool {
        !self.validation.is_valid()
    }
}

/// Edit the payload of block `index` in a snapshot of `chain`, apply `mode`,
/// and validate the snapshot. `chain` itself is never modified.
pub fn retroactive_edit(
    chain: &Chain,
    index: usize,
    new_payload: &str,
    mode: TamperMode,
) -> Result<TamperReport> {
    retroactive_edit_with(chain, index, new_payload, mode, &Miner::default(), &mut Unbounded)
}

/// Like [`retroactive_edit`], with the miner and observer used by
/// `RemineTarget`. A cancelled re-mine yields `AttackError::Cancelled`.
pub fn retroactive_edit_with<O>(
    chain: &Chain,
    index: usize,
    new_payload: &str,
    mode: TamperMode,
    miner: &Miner,
    observer: &mut O,
) -> Result<TamperReport>
where
    O: MiningObserver + ?Sized,
{
    let mut tampered = chain.snapshot();
    if index >= tampered.len() {
        return Err(AttackError::IndexOutOfRange {
            index: index as u64,
            len: tampered.len(),
        });
    }

    let blocks = tampered.blocks_mut();
    blocks[index].payload = new_payload.to_string();

    let work = match mode {
        TamperMode::PayloadOnly => 0,
        TamperMode::RehashTarget => {
            blocks[index].hash = blocks[index].compute_hash();
            1
        }
        TamperMode::RemineTarget => {
            let (block, attempts) = remine(&blocks[index], miner, observer)?;
            blocks[index] = block;
            attempts
        }
        TamperMode::RehashDownstream => {
            for i in index..blocks.len() {
                if i > index {
                    blocks[i].previous_hash = blocks[i - 1].hash.clone();
                }
                blocks[i].hash = blocks[i].compute_hash();
            }
            (blocks.len() - index) as u64
        }
    };

    let validation = tampered.validate();
    info!(
        "Tampered block {} with {:?}: spent {} hashes, validation {:?}",
        index, mode, work, validation.finding
    );
    Ok(TamperReport {
        index,
        mode,
        work,
        validation,
        tampered,
    })
}

fn remine<O>(block: &Block, miner: &Miner, observer: &mut O) -> Result<(Block, u64)>
where
    O: MiningObserver + ?Sized,
{
    let template = BlockTemplate::new(
        block.height,
        block.timestamp,
        block.payload.clone(),
        block.previous_hash.clone(),
    );
    let outcome = miner.mine_with(template, block.difficulty, observer)?;
    let attempts = outcome.stats().attempts;
    let mined = outcome.mined().ok_or(AttackError::Cancelled {
        height: block.height,
        attempts,
    })?;
    Ok((mined.block, attempts))
}
