use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::HASH_HEX_SIZE;
use crate::digest::{is_hash_hex, leading_hex_zeros, sha256_hex};
use crate::error::{EngineError, Result};

/// Required number of leading hex zeros in a block hash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Difficulty(u32);

impl Difficulty {
    pub const ZERO: Difficulty = Difficulty(0);
    pub const MAX: Difficulty = Difficulty(HASH_HEX_SIZE as u32);

    pub fn new(zeros: u32) -> Result<Self> {
        if zeros > Self::MAX.0 {
            return Err(EngineError::InvalidDifficulty(zeros.to_string()));
        }
        Ok(Self(zeros))
    }

    pub fn zeros(self) -> u32 {
        self.0
    }

    /// Expected nonce attempts to find a hash at this difficulty (16^d).
    pub fn expected_attempts(self) -> f64 {
        16f64.powi(self.0 as i32)
    }

    pub fn is_met_by(self, hash: &str) -> bool {
        leading_hex_zeros(hash) >= self.0
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = EngineError;

    fn try_from(zeros: u32) -> Result<Self> {
        Self::new(zeros)
    }
}

impl TryFrom<i64> for Difficulty {
    type Error = EngineError;

    fn try_from(zeros: i64) -> Result<Self> {
        u32::try_from(zeros)
            .map_err(|_| EngineError::InvalidDifficulty(zeros.to_string()))
            .and_then(Self::new)
    }
}

impl TryFrom<f64> for Difficulty {
    type Error = EngineError;

    fn try_from(zeros: f64) -> Result<Self> {
        if !zeros.is_finite() || zeros.fract() != 0.0 || zeros < 0.0 || zeros > u32::MAX as f64 {
            return Err(EngineError::InvalidDifficulty(zeros.to_string()));
        }
        Self::new(zeros as u32)
    }
}

impl From<Difficulty> for u32 {
    fn from(d: Difficulty) -> u32 {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical hashing input: every field except the hash, concatenated as text.
pub fn preimage(
    height: u64,
    timestamp: u64,
    payload: &str,
    previous_hash: &str,
    nonce: u64,
) -> String {
    format!("{height}{timestamp}{payload}{previous_hash}{nonce}")
}

/// Fields of a block that are fixed before the nonce search starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTemplate {
    pub height: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub payload: String,
    pub previous_hash: String,
}

impl BlockTemplate {
    pub fn new(
        height: u64,
        timestamp: u64,
        payload: impl Into<String>,
        previous_hash: impl Into<String>,
    ) -> Self {
        Self {
            height,
            timestamp,
            payload: payload.into(),
            previous_hash: previous_hash.into(),
        }
    }

    pub fn check(&self) -> Result<()> {
        if !is_hash_hex(&self.previous_hash) {
            return Err(EngineError::MalformedBlock {
                field: "previous_hash",
                reason: format!(
                    "expected {HASH_HEX_SIZE} hex characters, got {:?}",
                    self.previous_hash
                ),
            });
        }
        Ok(())
    }

    /// Everything in the preimage before the nonce; the miner appends nonces to it.
    pub(crate) fn preimage_prefix(&self) -> String {
        format!("{}{}{}{}", self.height, self.timestamp, self.payload, self.previous_hash)
    }

    pub fn seal(self, nonce: u64, hash: String, difficulty: Difficulty) -> Block {
        Block {
            height: self.height,
            timestamp: self.timestamp,
            payload: self.payload,
            previous_hash: self.previous_hash,
            nonce,
            hash,
            difficulty,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    pub timestamp: u64,
    pub payload: String,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
    pub difficulty: Difficulty,
}

impl Block {
    pub fn preimage(&self) -> String {
        preimage(self.height, self.timestamp, &self.payload, &self.previous_hash, self.nonce)
    }

    pub fn compute_hash(&self) -> String {
        sha256_hex(self.preimage())
    }

    pub fn has_consistent_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }

    pub fn meets_difficulty(&self) -> bool {
        self.difficulty.is_met_by(&self.hash)
    }
}
