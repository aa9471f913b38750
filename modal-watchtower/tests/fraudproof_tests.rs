mod common;

use std::sync::Arc;

use common::{proposer, Devnet};
use modal_watchtower::crypto::Ed25519Key;
use modal_watchtower::{
    inspect_fraudproof, BlockBuilder, BlockSource, BuilderError, ChainStore, Ed25519TxSigner,
    Hash, NoBlockValidation, SigningKey, TransactionSigner, TxKind, TxPool, WatchTower,
    Watchtower, WatchtowerError, WatchtowerIdentity, KEY_BEGIN_DISPUTE_RESOLUTION_OF,
    KEY_FRAUD_PROOF_OF, KEY_SIGNATURE,
};

#[test]
fn test_fraudproof_for_known_parent() {
    let devnet = Devnet::new(3);
    let watchtower = devnet.watchtower();
    let malicious = devnet.malicious_block(devnet.genesis.hash(), proposer(), 8_000_000);

    let fraudproof = watchtower.construct_fraudproof(&malicious).unwrap();

    assert_eq!(fraudproof.transactions.len(), 1);
    let tx = &fraudproof.transactions[0];
    assert_eq!(tx.nonce, 3);
    assert_eq!(tx.from, watchtower.account());
    assert_eq!(tx.gas_limit, 8_000_000);
    assert_eq!(tx.kind, TxKind::BeginDisputeResolution { accused: proposer() });
    assert_eq!(Ed25519TxSigner.sender(tx).unwrap(), devnet.key.address());
    assert_eq!(
        tx.signature.as_ref().unwrap().public_key,
        devnet.key.public_key()
    );

    assert_eq!(fraudproof.header.miner_address(), watchtower.account());
    assert_eq!(fraudproof.header.gas_limit, 8_000_000);
    assert_eq!(fraudproof.parent_hash(), devnet.genesis.hash());
    assert_eq!(fraudproof.number(), malicious.number());
    assert_eq!(
        fraudproof.header.extra_data.get(KEY_FRAUD_PROOF_OF),
        Some(malicious.hash().as_bytes())
    );
    assert_eq!(
        fraudproof.header.extra_data.get(KEY_BEGIN_DISPUTE_RESOLUTION_OF),
        Some(tx.hash().as_bytes())
    );
    assert_eq!(fraudproof.header.verify_seal().unwrap(), watchtower.account());
}

#[test]
fn test_dispute_tx_is_submitted_to_pool() {
    let devnet = Devnet::new(3);
    let watchtower = devnet.watchtower();
    let malicious = devnet.malicious_block(devnet.genesis.hash(), proposer(), 8_000_000);

    let fraudproof = watchtower.construct_fraudproof(&malicious).unwrap();

    let pending = devnet.txpool.pending(&devnet.key.address());
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0], fraudproof.transactions[0]);
}

#[test]
fn test_unknown_parent_fails_without_pool_submission() {
    let devnet = Devnet::new(0);
    let watchtower = devnet.watchtower();
    let missing = Hash::digest(b"missing parent");
    let malicious = devnet.malicious_block(missing, proposer(), 8_000_000);

    let err = watchtower.construct_fraudproof(&malicious).unwrap_err();

    assert!(matches!(err, WatchtowerError::ParentBlockNotFound(hash) if hash == missing));
    assert!(devnet.txpool.is_empty());
}

#[test]
fn test_nonce_is_read_at_parent_state() {
    let devnet = Devnet::new(3);
    let watchtower = devnet.watchtower_without_pool();

    let block1 = devnet.sequencer_block(&devnet.genesis.header, vec![devnet.watchtower_transfer(3)]);
    watchtower.apply(&block1).unwrap();

    let on_block1 = devnet.malicious_block(block1.hash(), proposer(), 8_000_000);
    let on_genesis = devnet.malicious_block(devnet.genesis.hash(), proposer(), 8_000_000);

    let fp1 = watchtower.construct_fraudproof(&on_block1).unwrap();
    let fp0 = watchtower.construct_fraudproof(&on_genesis).unwrap();

    assert_eq!(fp1.transactions[0].nonce, 4);
    assert_eq!(fp0.transactions[0].nonce, 3);
}

#[test]
fn test_sequential_fraudproofs_do_not_reuse_submitted_nonce() {
    let devnet = Devnet::new(5);
    let watchtower = devnet.watchtower();
    let first = devnet.malicious_block(devnet.genesis.hash(), proposer(), 8_000_000);
    let second = devnet.malicious_block(devnet.genesis.hash(), common::sequencer_key().address(), 6_000_000);

    let fp = watchtower.construct_fraudproof(&first).unwrap();
    assert_eq!(fp.transactions[0].nonce, 5);

    let err = watchtower.construct_fraudproof(&second).unwrap_err();
    assert!(matches!(err, WatchtowerError::PoolSubmission(_)));
    assert_eq!(devnet.txpool.len(), 1);
}

#[test]
fn test_each_call_produces_fresh_artifact() {
    let devnet = Devnet::new(1);
    let watchtower = devnet.watchtower_without_pool();
    let malicious = devnet.malicious_block(devnet.genesis.hash(), proposer(), 8_000_000);

    let a = watchtower.construct_fraudproof(&malicious).unwrap();
    let b = watchtower.construct_fraudproof(&malicious).unwrap();

    assert_eq!(a.transactions[0].nonce, b.transactions[0].nonce);
    assert_eq!(a.fraud_proof_of(), b.fraud_proof_of());
}

#[test]
fn test_signing_error_when_key_does_not_control_account() {
    let devnet = Devnet::new(0);
    let stranger = Arc::new(Ed25519Key::from_bytes(&[99u8; 32]));
    let identity = WatchtowerIdentity::new(devnet.key.address(), stranger);
    let watchtower = Watchtower::new(
        devnet.chain.clone(),
        devnet.executor.clone(),
        Some(devnet.txpool.clone()),
        Arc::new(NoBlockValidation),
        identity,
    );
    let malicious = devnet.malicious_block(devnet.genesis.hash(), proposer(), 8_000_000);

    let err = watchtower.construct_fraudproof(&malicious).unwrap_err();

    assert!(matches!(err, WatchtowerError::Signing(_)));
    assert!(devnet.txpool.is_empty());
}

#[test]
fn test_builder_error_returns_no_block() {
    let devnet = Devnet::new(0);
    let watchtower = devnet.watchtower_without_pool();
    let malicious = devnet.malicious_block(devnet.genesis.hash(), proposer(), 0);

    let err = watchtower.construct_fraudproof(&malicious).unwrap_err();

    assert!(matches!(err, WatchtowerError::Builder(_)));
}

#[test]
fn test_builder_error_keeps_pool_submission() {
    let devnet = Devnet::new(0);
    let watchtower = devnet.watchtower();
    let malicious = devnet.malicious_block(devnet.genesis.hash(), proposer(), 0);

    assert!(watchtower.construct_fraudproof(&malicious).is_err());
    assert_eq!(devnet.txpool.len(), 1);
}

#[test]
fn test_accusing_zero_proposer_fails() {
    let devnet = Devnet::new(0);
    let watchtower = devnet.watchtower();
    let mut malicious = devnet.malicious_block(devnet.genesis.hash(), proposer(), 8_000_000);
    malicious.header.miner = vec![];

    let err = watchtower.construct_fraudproof(&malicious).unwrap_err();

    assert!(matches!(err, WatchtowerError::DisputeTransaction(_)));
    assert!(devnet.txpool.is_empty());
}

#[test]
fn test_inspect_accepts_constructed_fraudproof() {
    let devnet = Devnet::new(3);
    let watchtower = devnet.watchtower();
    let malicious = devnet.malicious_block(devnet.genesis.hash(), proposer(), 8_000_000);
    let fraudproof = watchtower.construct_fraudproof(&malicious).unwrap();

    let summary = inspect_fraudproof(&fraudproof, &Ed25519TxSigner).unwrap();

    assert_eq!(summary.malicious_block, malicious.hash());
    assert_eq!(summary.dispute_tx, fraudproof.transactions[0].hash());
    assert_eq!(summary.accuser, watchtower.account());
    assert_eq!(summary.accused, proposer());
    assert_eq!(summary.nonce, 3);
}

#[test]
fn test_inspect_rejects_tampered_fraudproof() {
    let devnet = Devnet::new(3);
    let watchtower = devnet.watchtower_without_pool();
    let malicious = devnet.malicious_block(devnet.genesis.hash(), proposer(), 8_000_000);
    let fraudproof = watchtower.construct_fraudproof(&malicious).unwrap();

    let mut retargeted = fraudproof.clone();
    retargeted.transactions[0].kind = TxKind::BeginDisputeResolution {
        accused: common::sequencer_key().address(),
    };
    assert!(matches!(
        inspect_fraudproof(&retargeted, &Ed25519TxSigner),
        Err(WatchtowerError::InvalidFraudproof(_))
    ));

    let mut unsealed = fraudproof.clone();
    unsealed
        .header
        .extra_data
        .insert(KEY_FRAUD_PROOF_OF, Hash::digest(b"another block").to_vec());
    assert!(inspect_fraudproof(&unsealed, &Ed25519TxSigner).is_err());

    assert!(inspect_fraudproof(&devnet.genesis, &Ed25519TxSigner).is_err());
}

#[test]
fn test_fraudproof_block_extends_parent() {
    let devnet = Devnet::new(3);
    let watchtower = devnet.watchtower();
    let malicious = devnet.malicious_block(devnet.genesis.hash(), proposer(), 8_000_000);
    let fraudproof = watchtower.construct_fraudproof(&malicious).unwrap();

    devnet.chain.write_block(&fraudproof, BlockSource::Sequencer).unwrap();
    devnet.txpool.reset_with_header(&fraudproof.header);

    assert_eq!(devnet.chain.head().hash(), fraudproof.hash());
    assert!(devnet.txpool.is_empty());
}

#[test]
fn test_fraudproof_on_parent_at_max_timestamp_fails_cleanly() {
    let devnet = Devnet::new(0);
    let watchtower = devnet.watchtower_without_pool();
    let sequencer = common::sequencer_key();
    let last = BlockBuilder::new(devnet.genesis.header.clone(), devnet.executor.clone())
        .set_coinbase_address(sequencer.address())
        .set_timestamp(u64::MAX)
        .sign_with(Arc::new(sequencer))
        .build()
        .unwrap();
    watchtower.check_block_fully(Some(&last)).unwrap();
    watchtower.apply(&last).unwrap();

    let malicious = devnet.malicious_block(last.hash(), proposer(), 8_000_000);
    let err = watchtower.construct_fraudproof(&malicious).unwrap_err();

    match err {
        WatchtowerError::Builder(BuilderError::InvalidConfiguration(msg)) => {
            assert!(msg.contains("timestamp"))
        }
        other => panic!("unexpected error: {}", other),
    }

    // later requests are unaffected
    let sibling = devnet.malicious_block(devnet.genesis.hash(), proposer(), 8_000_000);
    assert!(watchtower.construct_fraudproof(&sibling).is_ok());
}

#[test]
fn test_inspect_rejects_dispute_not_sent_to_staking_contract() {
    let devnet = Devnet::new(3);
    let watchtower = devnet.watchtower_without_pool();
    let malicious = devnet.malicious_block(devnet.genesis.hash(), proposer(), 8_000_000);
    let mut fraudproof = watchtower.construct_fraudproof(&malicious).unwrap();

    // re-point the dispute and re-sign everything so only the target differs
    let mut tx = fraudproof.transactions[0].clone();
    tx.to = Some(common::sequencer_key().address());
    let tx = Ed25519TxSigner.sign_tx(tx, &*devnet.key).unwrap();
    fraudproof
        .header
        .extra_data
        .insert(KEY_BEGIN_DISPUTE_RESOLUTION_OF, tx.hash().to_vec());
    fraudproof.transactions = vec![tx];
    let seal = devnet
        .key
        .sign(fraudproof.header.seal_hash().as_bytes())
        .unwrap();
    fraudproof.header.extra_data.insert(KEY_SIGNATURE, seal.to_bytes());

    match inspect_fraudproof(&fraudproof, &Ed25519TxSigner) {
        Err(WatchtowerError::InvalidFraudproof(msg)) => assert!(msg.contains("staking contract")),
        other => panic!("unexpected result: {:?}", other),
    }
}
