use thiserror::Error;

/// Caller errors: malformed input or invalid configuration. Validation findings
/// and cancelled mining runs are reported as values, not through this type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid difficulty {0}: expected a whole number between 0 and 64")]
    InvalidDifficulty(String),

    #[error("malformed block field `{field}`: {reason}")]
    MalformedBlock { field: &'static str, reason: String },

    #[error("block at height {got} does not extend the tip (expected height {expected})")]
    DoesNotExtendTip { expected: u64, got: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("nonce space exhausted at height {height}")]
    NonceSpaceExhausted { height: u64 },

    #[error("configuration parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
