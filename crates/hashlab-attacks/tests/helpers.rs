use std::sync::Once;

use hashlab_core::{mine, Chain, Difficulty};
use tracing_subscriber::{fmt, EnvFilter};

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Mine one block per payload, each on top of the previous one.
pub fn mined_chain(payloads: &[&str], difficulty: u32) -> Chain {
    let difficulty = Difficulty::new(difficulty).expect("difficulty");
    let mut chain = Chain::new();
    for payload in payloads {
        let block = mine(
            chain.next_height(),
            1_700_000_000_000 + chain.next_height() * 1_000,
            *payload,
            chain.tip_hash(),
            difficulty,
        )
        .expect("mine")
        .into_block()
        .expect("not cancelled");
        chain.append(block).expect("append");
    }
    chain
}
