mod helpers;

use hashlab_attacks::{retroactive_edit, TamperMode};
use hashlab_core::{EngineConfig, InvalidReason, Session, Unbounded};

#[test]
fn test_three_block_chain_and_tamper() -> anyhow::Result<()> {
    helpers::init_tracing();
    let chain = helpers::mined_chain(&["tx1", "tx2", "tx3"], 2);
    assert_eq!(chain.len(), 3);
    assert!(chain.blocks().iter().all(|b| b.hash.starts_with("00")));
    assert!(chain.validate().is_valid());

    let naive = retroactive_edit(&chain, 1, "tx1-evil", TamperMode::PayloadOnly)?;
    assert!(!naive.validation.is_valid());
    assert_eq!(naive.validation.first_invalid_index(), Some(1));
    assert_eq!(naive.validation.reason(), Some(InvalidReason::HashMismatch));

    let patched = retroactive_edit(&chain, 1, "tx1-evil", TamperMode::RemineTarget)?;
    assert_eq!(patched.validation.first_invalid_index(), Some(2));
    assert_eq!(patched.validation.reason(), Some(InvalidReason::BrokenLink));

    // The canonical chain is untouched by either attempt.
    assert!(chain.validate().is_valid());
    assert_eq!(chain.blocks()[1].payload, "tx2");
    Ok(())
}

#[test]
fn test_session_workflow() -> anyhow::Result<()> {
    helpers::init_tracing();
    let config = EngineConfig::from_json_str(r#"{"difficulty": 1, "halving_interval": 10}"#)?;
    let mut session = Session::new(config)?;

    let tx = session.draft("Wallet", "Bob", 60.0, 1);
    session.submit(tx)?;
    let tx = session.draft("Wallet", "Carol", 60.0, 2);
    assert!(session.submit(tx).is_err());

    session.mine_pending(10, &mut Unbounded)?;
    session.mine_data("notes", 20, &mut Unbounded)?;
    assert!(session.validate().is_valid());
    assert_eq!(session.transactions_at(0)[0].to, "Bob");
    assert_eq!(session.miner_balance(), 40.0 + 50.0 + 50.0);

    let snapshot = session.snapshot();
    let report = retroactive_edit(session.chain(), 0, "forged", TamperMode::PayloadOnly)?;
    assert!(report.detected());
    assert!(session.chain().is_current(&snapshot));
    assert!(session.validate().is_valid());
    Ok(())
}
