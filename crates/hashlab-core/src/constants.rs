pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// Previous-hash sentinel for height 0, also the root of an empty Merkle set.
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

pub const DEFAULT_DIFFICULTY: u32 = 2;
pub const MAX_DIFFICULTY: u32 = 5;
pub const BASE_REWARD: f64 = 50.0;
pub const HALVING_INTERVAL: u64 = 10;
pub const CHECKPOINT_INTERVAL: u64 = 1000;
pub const MINER_ACCOUNT: &str = "Wallet";
pub const INITIAL_BALANCE: f64 = 100.0;
