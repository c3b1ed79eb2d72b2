use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// `base / 2^floor(height / halving_interval)`. Fractions are kept as is.
pub fn reward_at(height: u64, base: f64, halving_interval: u64) -> Result<f64> {
    Ok(RewardSchedule::new(base, halving_interval)?.at(height))
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RewardSchedule {
    base: f64,
    halving_interval: u64,
}

impl RewardSchedule {
    pub fn new(base: f64, halving_interval: u64) -> Result<Self> {
        if halving_interval == 0 {
            return Err(EngineError::InvalidConfig(
                "halving_interval must be greater than zero".into(),
            ));
        }
        if !base.is_finite() || base < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "base reward must be a non-negative number, got {base}"
            )));
        }
        Ok(Self {
            base,
            halving_interval,
        })
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn halving_interval(&self) -> u64 {
        self.halving_interval
    }

    pub fn halvings(&self, height: u64) -> u64 {
        height / self.halving_interval
    }

    pub fn at(&self, height: u64) -> f64 {
        // Past ~1075 halvings every f64 reward underflows to zero anyway.
        let halvings = self.halvings(height).min(i32::MAX as u64) as i32;
        self.base * 0.5f64.powi(halvings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halving_examples() {
        assert_eq!(reward_at(0, 50.0, 10).unwrap(), 50.0);
        assert_eq!(reward_at(9, 50.0, 10).unwrap(), 50.0);
        assert_eq!(reward_at(10, 50.0, 10).unwrap(), 25.0);
        assert_eq!(reward_at(25, 50.0, 10).unwrap(), 12.5);
    }

    #[test]
    fn reward_is_non_increasing() {
        let schedule = RewardSchedule::new(50.0, 3).unwrap();
        let rewards: Vec<f64> = (0..200).map(|h| schedule.at(h)).collect();
        assert!(rewards.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(schedule.at(u64::MAX), 0.0);
    }

    #[test]
    fn zero_interval_is_invalid() {
        assert!(matches!(reward_at(1, 50.0, 0), Err(EngineError::InvalidConfig(_))));
        assert!(RewardSchedule::new(-1.0, 10).is_err());
    }
}
