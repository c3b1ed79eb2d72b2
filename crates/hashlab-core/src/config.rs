use std::io::Read;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::Difficulty;
use crate::constants::*;
use crate::error::{EngineError, Result};
use crate::mine::Miner;
use crate::reward::RewardSchedule;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub difficulty: u32,
    pub max_difficulty: u32,
    pub base_reward: f64,
    pub halving_interval: u64,
    pub checkpoint_interval: u64,
    pub miner_account: String,
    pub initial_balance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            max_difficulty: MAX_DIFFICULTY,
            base_reward: BASE_REWARD,
            halving_interval: HALVING_INTERVAL,
            checkpoint_interval: CHECKPOINT_INTERVAL,
            miner_account: MINER_ACCOUNT.to_string(),
            initial_balance: INITIAL_BALANCE,
        }
    }
}

/// Keys whose numeric values must form a valid [`Difficulty`].
const DIFFICULTY_KEYS: [&str; 2] = ["difficulty", "max_difficulty"];

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_value(serde_json::from_reader(reader)?)
    }

    /// Negative, fractional or out-of-range difficulties fail with
    /// `InvalidDifficulty`, the same as at every other entry point; other
    /// type mismatches stay `Json` errors.
    fn from_value(mut value: Value) -> Result<Self> {
        if let Value::Object(fields) = &mut value {
            for key in DIFFICULTY_KEYS {
                if let Some(raw) = fields.get_mut(key).filter(|raw| raw.is_number()) {
                    *raw = Value::from(check_difficulty(raw)?.zeros());
                }
            }
        }
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let max = Difficulty::new(self.max_difficulty).map_err(|_| {
            EngineError::InvalidConfig(format!(
                "max_difficulty {} exceeds 64",
                self.max_difficulty
            ))
        })?;
        if self.difficulty > max.zeros() {
            return Err(EngineError::InvalidConfig(format!(
                "difficulty {} exceeds max_difficulty {}",
                self.difficulty, self.max_difficulty
            )));
        }
        if !self.initial_balance.is_finite() || self.initial_balance < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "initial_balance must be a non-negative number, got {}",
                self.initial_balance
            )));
        }
        if self.miner_account.is_empty() {
            return Err(EngineError::InvalidConfig("miner_account must not be empty".into()));
        }
        self.reward_schedule()?;
        self.miner()?;
        Ok(())
    }

    pub fn initial_difficulty(&self) -> Result<Difficulty> {
        Difficulty::new(self.difficulty)
    }

    pub fn reward_schedule(&self) -> Result<RewardSchedule> {
        RewardSchedule::new(self.base_reward, self.halving_interval)
    }

    pub fn miner(&self) -> Result<Miner> {
        Miner::new(self.checkpoint_interval)
    }
}

fn check_difficulty(raw: &Value) -> Result<Difficulty> {
    if let Some(zeros) = raw.as_i64() {
        Difficulty::try_from(zeros)
    } else if let Some(zeros) = raw.as_f64() {
        Difficulty::try_from(zeros)
    } else {
        Err(EngineError::InvalidDifficulty(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.miner_account, "Wallet");
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{"difficulty": 3, "halving_interval": 5}"#).unwrap();
        assert_eq!(config.difficulty, 3);
        assert_eq!(config.halving_interval, 5);
        assert_eq!(config.base_reward, 50.0);
    }

    #[test]
    fn invalid_values_are_rejected() {
        for json in [
            r#"{"halving_interval": 0}"#,
            r#"{"checkpoint_interval": 0}"#,
            r#"{"difficulty": 6}"#,
            r#"{"max_difficulty": 4, "difficulty": 5}"#,
            r#"{"initial_balance": -5.0}"#,
            r#"{"miner_account": ""}"#,
        ] {
            assert!(
                matches!(EngineConfig::from_json_str(json), Err(EngineError::InvalidConfig(_))),
                "{json} should be rejected"
            );
        }
    }

    #[test]
    fn out_of_range_difficulty_is_invalid_difficulty() {
        for json in [
            r#"{"difficulty": -1}"#,
            r#"{"difficulty": 2.5}"#,
            r#"{"difficulty": 65}"#,
            r#"{"max_difficulty": 65, "difficulty": 1}"#,
            r#"{"max_difficulty": 18446744073709551615}"#,
        ] {
            let err = EngineConfig::from_json_str(json).unwrap_err();
            assert!(
                matches!(err, EngineError::InvalidDifficulty(_)),
                "{json} should be an invalid difficulty, got {err}"
            );
        }
        let err = EngineConfig::from_reader(&br#"{"difficulty": -3}"#[..]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDifficulty(ref raw) if raw == "-3"));

        let config = EngineConfig::from_json_str(r#"{"difficulty": 3.0}"#).unwrap();
        assert_eq!(config.difficulty, 3);
    }

    #[test]
    fn unknown_or_malformed_json_is_a_parse_error() {
        for json in [r#"{"difficulty": "2"}"#, r#"{"dificulty": 1}"#, "not json"] {
            assert!(matches!(
                EngineConfig::from_json_str(json),
                Err(EngineError::Json(_))
            ));
        }
    }

    #[test]
    fn reads_from_reader() {
        let json = br#"{"miner_account": "Alice", "initial_balance": 10.0}"#;
        let config = EngineConfig::from_reader(&json[..]).unwrap();
        assert_eq!(config.miner_account, "Alice");
    }
}
