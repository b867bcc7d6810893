use assert_matches::assert_matches;
use nonempty::NonEmpty;
use proptest::prelude::*;

use zcash_protocol::{
    consensus::{testing::arb_branch_id, BranchId},
    constants::{ENC_CIPHERTEXT_SIZE, OUT_CIPHERTEXT_SIZE},
    value::{ZatBalance, Zatoshis},
};

use super::{
    components::{
        orchard,
        sapling::{self, SpendDescription},
        sprout::testing::arb_bundle as arb_sprout_bundle,
        transparent::{self, OutPoint, Script, TxIn, TxOut},
        GROTH_PROOF_SIZE,
    },
    deserialize, serialize,
    sighash::{signature_hash, SighashType, SignableInput, TransparentInput},
    testing::arb_tx,
    util::sha256d::sha256d,
    SaplingTx, SproutTx, Transaction, TransactionData, TxVersion, Zip225Tx,
};
use crate::Error;

pub(crate) mod data;

fn txin(tag: u8) -> TxIn {
    TxIn {
        prevout: OutPoint::new([tag; 32], u32::from(tag)),
        script_sig: Script(vec![0x51, tag]),
        sequence: 0xffff_fff0 | u32::from(tag),
    }
}

fn txout(value: u64, tag: u8) -> TxOut {
    TxOut {
        value: Zatoshis::from_u64(value).unwrap(),
        script_pubkey: Script(vec![0x76, tag, 0xac]),
    }
}

fn two_by_two() -> transparent::Bundle {
    transparent::Bundle {
        vin: vec![txin(1), txin(2)],
        vout: vec![txout(1000, 3), txout(2000, 4)],
    }
}

fn v4_data(bundle: transparent::Bundle) -> TransactionData {
    TransactionData::Sapling(SaplingTx {
        transparent_bundle: Some(bundle),
        lock_time: 0,
        expiry_height: 0u32.into(),
        sapling_bundle: None,
        sprout_bundle: None,
    })
}

fn v5_data(bundle: transparent::Bundle) -> TransactionData {
    TransactionData::Zip225(Zip225Tx {
        consensus_branch_id: BranchId::Nu5,
        lock_time: 0,
        expiry_height: 0u32.into(),
        transparent_bundle: Some(bundle),
        sapling_bundle: None,
        orchard_bundle: None,
    })
}

fn spend(anchor: [u8; 32]) -> SpendDescription {
    SpendDescription {
        cv: [1; 32],
        anchor,
        nullifier: [2; 32],
        rk: [3; 32],
        zkproof: [4; GROTH_PROOF_SIZE],
        spend_auth_sig: [5; 64],
    }
}

fn sighash(tx: &TransactionData, hash_type: SighashType, index: usize) -> [u8; 32] {
    let script_code = Script(data::SCRIPT_CODE.to_vec());
    let input = SignableInput::Transparent(TransparentInput::new(
        hash_type,
        index,
        &script_code,
        Zatoshis::from_u64(data::SPENT_VALUE).unwrap(),
    ));
    let branch_id = tx.consensus_branch_id().unwrap_or(BranchId::Sapling);
    *signature_hash(tx, &input, branch_id).unwrap().as_ref()
}

fn check_roundtrip(tx: Transaction) -> Result<(), TestCaseError> {
    let txn_bytes = serialize(&tx);
    let txo = deserialize(&txn_bytes).unwrap();

    prop_assert_eq!(&*tx, &*txo);
    prop_assert_eq!(tx.txid(), txo.txid());
    prop_assert_eq!(serialize(&txo), txn_bytes);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]
    #[test]
    fn tx_serialization_roundtrip_sprout(tx in arb_tx(BranchId::Sprout)) {
        check_roundtrip(tx)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]
    #[test]
    fn tx_serialization_roundtrip_overwinter(tx in arb_tx(BranchId::Overwinter)) {
        check_roundtrip(tx)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]
    #[test]
    fn tx_serialization_roundtrip_sapling(tx in arb_tx(BranchId::Sapling)) {
        check_roundtrip(tx)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]
    #[test]
    fn tx_serialization_roundtrip_nu5(tx in arb_tx(BranchId::Nu5)) {
        check_roundtrip(tx)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]
    #[test]
    fn tx_version_follows_branch(
        (branch_id, tx) in arb_branch_id().prop_flat_map(|b| (Just(b), arb_tx(b)))
    ) {
        match tx.version() {
            TxVersion::Zip225 => {
                prop_assert_eq!(tx.consensus_branch_id(), Some(branch_id));
            }
            TxVersion::Sapling if matches!(branch_id, BranchId::Nu5 | BranchId::Nu6) => {}
            TxVersion::Sprout(v) => {
                prop_assert_eq!(branch_id, BranchId::Sprout);
                prop_assert!(v == 1 || v == 2);
            }
            version => {
                prop_assert_eq!(version, TxVersion::suggested_for_branch(branch_id));
            }
        }
        check_roundtrip(tx)?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]
    #[test]
    fn legacy_txid_is_double_sha256(tx in arb_tx(BranchId::Canopy)) {
        let mut expected = sha256d(&serialize(&tx));
        let txid = tx.txid();
        prop_assert_eq!(txid.as_ref(), &expected);

        expected.reverse();
        prop_assert_eq!(tx.txid().to_string(), hex::encode(expected));
        prop_assert_eq!(tx.auth_commitment(), [0xFF; 32]);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]
    #[test]
    fn v5_txid_ignores_authorizing_data(tx in arb_tx(BranchId::Nu5)) {
        let txid = tx.txid();
        let auth = tx.auth_commitment();

        if let TransactionData::Zip225(mut v5) = tx.into_data() {
            if let Some(bundle) = v5.orchard_bundle.as_mut() {
                bundle.binding_sig[0] ^= 1;
                let resigned = TransactionData::Zip225(v5.clone()).freeze().unwrap();
                prop_assert_eq!(resigned.txid(), txid);
                prop_assert_ne!(resigned.auth_commitment(), auth);

                v5.orchard_bundle.as_mut().unwrap().actions.head.nullifier[0] ^= 1;
                let modified = TransactionData::Zip225(v5).freeze().unwrap();
                prop_assert_ne!(modified.txid(), txid);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]
    #[test]
    fn joinsplits_require_v2(bundle in arb_sprout_bundle(false).prop_filter_map("no joinsplits", |b| b)) {
        let v1 = TransactionData::Sprout(SproutTx {
            version: 1,
            transparent_bundle: None,
            lock_time: 0,
            sprout_bundle: Some(bundle.clone()),
        });
        assert_matches!(v1.freeze(), Err(Error::InvariantViolation(_)));

        let v2 = TransactionData::Sprout(SproutTx {
            version: 2,
            transparent_bundle: None,
            lock_time: 0,
            sprout_bundle: Some(bundle.clone()),
        });
        prop_assert!(v2.freeze().is_ok());

        // v4 JoinSplits carry Groth16 proofs.
        let v4 = TransactionData::Sapling(SaplingTx {
            transparent_bundle: None,
            lock_time: 0,
            expiry_height: 0u32.into(),
            sapling_bundle: None,
            sprout_bundle: Some(bundle),
        });
        assert_matches!(v4.freeze(), Err(Error::InvariantViolation(_)));
    }
}

#[test]
fn suggested_versions() {
    assert_eq!(
        TxVersion::suggested_for_branch(BranchId::Sprout),
        TxVersion::Sprout(2)
    );
    assert_eq!(
        TxVersion::suggested_for_branch(BranchId::Overwinter),
        TxVersion::Overwinter
    );
    for branch_id in [
        BranchId::Sapling,
        BranchId::Blossom,
        BranchId::Heartwood,
        BranchId::Canopy,
    ] {
        assert_eq!(TxVersion::suggested_for_branch(branch_id), TxVersion::Sapling);
    }
    assert_eq!(TxVersion::suggested_for_branch(BranchId::Nu6), TxVersion::Zip225);
}

#[test]
fn v4_vector() {
    let bytes = hex::decode(data::v4::TX).unwrap();
    let tx = deserialize(&bytes).unwrap();

    assert_eq!(tx.txid().to_string(), data::v4::TXID);
    assert_eq!(tx.consensus_branch_id(), None);
    assert_eq!(tx.sapling_bundle(), None);
    assert_eq!(tx.lock_time(), 0x1122_3344);
    assert_eq!(u32::from(tx.expiry_height()), 1_700_000);
    assert_eq!(serialize(&tx), bytes);

    let sign = |hash_type| hex::encode(sighash(&tx, hash_type, 0));
    assert_eq!(sign(SighashType::ALL), data::v4::SIGHASH_ALL);
    assert_eq!(
        sign(SighashType::SINGLE_ANYONECANPAY),
        data::v4::SIGHASH_SINGLE_ANYONECANPAY
    );
    assert_eq!(
        hex::encode(
            signature_hash(&tx, &SignableInput::Shielded, BranchId::Sapling)
                .unwrap()
                .as_ref()
        ),
        data::v4::SIGHASH_SHIELDED
    );
}

#[test]
fn v5_vector() {
    let bytes = hex::decode(data::v5::TX).unwrap();
    let tx = deserialize(&bytes).unwrap();

    assert_eq!(tx.txid().to_string(), data::v5::TXID);
    assert_eq!(tx.consensus_branch_id(), Some(BranchId::Nu5));
    assert_eq!(serialize(&tx), bytes);
    assert_eq!(hex::encode(tx.auth_commitment()), data::v5::AUTH_COMMITMENT);

    assert_eq!(
        hex::encode(sighash(&tx, SighashType::ALL, 0)),
        data::v5::SIGHASH_ALL
    );

    // A shielded signature hash over a v5 transaction is its txid.
    let shielded = signature_hash(&tx, &SignableInput::Shielded, BranchId::Nu5).unwrap();
    assert_eq!(shielded.as_ref(), tx.txid().as_ref());
}

#[test]
fn v5_txid_commits_to_orchard_nullifiers() {
    let action = orchard::Action {
        cv_net: [0; 32],
        nullifier: [0; 32],
        rk: [0; 32],
        cmx: [0; 32],
        ephemeral_key: [0; 32],
        enc_ciphertext: [0; ENC_CIPHERTEXT_SIZE],
        out_ciphertext: [0; OUT_CIPHERTEXT_SIZE],
        spend_auth_sig: [0; 64],
    };
    let build = |actions| {
        TransactionData::Zip225(Zip225Tx {
            consensus_branch_id: BranchId::Nu5,
            lock_time: 0,
            expiry_height: 0u32.into(),
            transparent_bundle: Some(transparent::Bundle {
                vin: vec![txin(1)],
                vout: vec![txout(1000, 2)],
            }),
            sapling_bundle: None,
            orchard_bundle: Some(orchard::Bundle {
                actions,
                flags: orchard::Flags::from_parts(true, true),
                value_balance: ZatBalance::zero(),
                anchor: [0; 32],
                proof: vec![],
                binding_sig: [0; 64],
            }),
        })
        .freeze()
        .unwrap()
    };

    let actions = NonEmpty {
        head: action.clone(),
        tail: vec![action.clone()],
    };
    let tx = build(actions.clone());
    assert_eq!(build(actions.clone()).txid(), tx.txid());
    assert_eq!(deserialize(&serialize(&tx)).unwrap().txid(), tx.txid());

    let mut flipped = actions;
    flipped.tail[0].nullifier[5] ^= 0x01;
    assert_ne!(build(flipped).txid(), tx.txid());
}

#[test]
fn empty_v5_transaction() {
    let tx = TransactionData::Zip225(Zip225Tx {
        consensus_branch_id: BranchId::Nu6,
        lock_time: 0,
        expiry_height: 0u32.into(),
        transparent_bundle: None,
        sapling_bundle: None,
        orchard_bundle: None,
    })
    .freeze()
    .unwrap();

    let bytes = serialize(&tx);
    assert_eq!(
        hex::encode(&bytes),
        "050000800a27a7265510e7c80000000000000000000000000000"
    );

    let txo = deserialize(&bytes).unwrap();
    assert_eq!(txo.transparent_bundle(), None);
    assert_eq!(txo.sapling_bundle(), None);
    assert_eq!(txo.orchard_bundle(), None);
    assert_eq!(txo.txid(), tx.txid());
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut bytes = hex::decode(data::v5::TX).unwrap();
    bytes.extend_from_slice(&[0, 0]);
    assert_matches!(deserialize(&bytes), Err(Error::TrailingBytes(2)));

    // A reader is left positioned after the transaction.
    let mut reader = &bytes[..];
    assert!(Transaction::read(&mut reader).is_ok());
    assert_eq!(reader, &[0u8, 0][..]);
}

#[test]
fn truncated_transaction_fails_to_parse() {
    let bytes = hex::decode(data::v4::TX).unwrap();
    for len in [0, 3, 7, 50, bytes.len() - 1] {
        assert_matches!(deserialize(&bytes[..len]), Err(Error::Parse(_)));
    }
}

#[test]
fn unsupported_versions() {
    assert_matches!(
        deserialize(&[0, 0, 0, 0]),
        Err(Error::UnsupportedVersion {
            header: 0,
            version_group_id: 0
        })
    );

    // A v4 header with the v5 version group.
    assert_matches!(
        deserialize(&hex::decode("040000800a27a726").unwrap()),
        Err(Error::UnsupportedVersion {
            header: 0x8000_0004,
            version_group_id: 0x26a7_270a
        })
    );

    // Overwintered version 6 does not exist.
    assert_matches!(
        deserialize(&hex::decode("060000800a27a726").unwrap()),
        Err(Error::UnsupportedVersion {
            header: 0x8000_0006,
            ..
        })
    );
}

#[test]
fn unknown_v5_consensus_branch() {
    let mut bytes = hex::decode(data::v5::TX).unwrap();
    bytes[8..12].copy_from_slice(&0xdead_beefu32.to_le_bytes());
    assert_matches!(
        deserialize(&bytes),
        Err(Error::UnknownConsensusBranch(0xdead_beef))
    );

    // Sprout is not a valid v5 branch.
    bytes[8..12].copy_from_slice(&[0; 4]);
    assert_matches!(deserialize(&bytes), Err(Error::UnknownConsensusBranch(0)));
}

#[test]
fn v4_value_balance_without_shielded_data() {
    let mut bytes = hex::decode(data::v4::TX).unwrap();
    // valueBalance follows nExpiryHeight, 8 bytes before the three empty vectors.
    let vb = bytes.len() - 11;
    bytes[vb] = 1;
    assert_matches!(deserialize(&bytes), Err(Error::Parse(_)));
}

#[test]
fn structural_invariants() {
    let empty_transparent = v4_data(transparent::Bundle {
        vin: vec![],
        vout: vec![],
    });
    assert_matches!(
        empty_transparent.freeze(),
        Err(Error::InvariantViolation(_))
    );

    let empty_sapling = TransactionData::Sapling(SaplingTx {
        transparent_bundle: None,
        lock_time: 0,
        expiry_height: 0u32.into(),
        sapling_bundle: Some(sapling::Bundle {
            shielded_spends: vec![],
            shielded_outputs: vec![],
            value_balance: ZatBalance::zero(),
            binding_sig: [0; 64],
        }),
        sprout_bundle: None,
    });
    assert_matches!(empty_sapling.validate(), Err(Error::InvariantViolation(_)));
    let mut sink = vec![];
    assert_matches!(
        empty_sapling.write(&mut sink),
        Err(Error::InvariantViolation(_))
    );
    assert!(sink.is_empty());

    let sprout_v0 = TransactionData::Sprout(SproutTx {
        version: 0,
        transparent_bundle: Some(two_by_two()),
        lock_time: 0,
        sprout_bundle: None,
    });
    assert_matches!(sprout_v0.freeze(), Err(Error::InvariantViolation(_)));
}

#[test]
fn v5_spends_share_an_anchor() {
    let v5 = |spends| {
        TransactionData::Zip225(Zip225Tx {
            consensus_branch_id: BranchId::Nu5,
            lock_time: 0,
            expiry_height: 0u32.into(),
            transparent_bundle: None,
            sapling_bundle: Some(sapling::Bundle {
                shielded_spends: spends,
                shielded_outputs: vec![],
                value_balance: ZatBalance::from_i64(10).unwrap(),
                binding_sig: [6; 64],
            }),
            orchard_bundle: None,
        })
    };

    assert_matches!(
        v5(vec![spend([7; 32]), spend([8; 32])]).freeze(),
        Err(Error::InvariantViolation(_))
    );

    let tx = v5(vec![spend([7; 32]), spend([7; 32])]).freeze().unwrap();
    let txo = deserialize(&serialize(&tx)).unwrap();
    assert_eq!(*txo, *tx);

    // The same spends are representable in v4, where each spend carries its own anchor.
    let v4 = TransactionData::Sapling(SaplingTx {
        transparent_bundle: None,
        lock_time: 0,
        expiry_height: 0u32.into(),
        sapling_bundle: Some(sapling::Bundle {
            shielded_spends: vec![spend([7; 32]), spend([8; 32])],
            shielded_outputs: vec![],
            value_balance: ZatBalance::from_i64(10).unwrap(),
            binding_sig: [6; 64],
        }),
        sprout_bundle: None,
    });
    assert!(v4.freeze().is_ok());
}

#[test]
fn anyonecanpay_ignores_other_inputs() {
    for build in [v4_data, v5_data] {
        let tx = build(two_by_two());
        let mut other = two_by_two();
        other.vin[1].prevout = OutPoint::new([9; 32], 9);
        other.vin[1].sequence = 0;
        let modified = build(other);

        for hash_type in [
            SighashType::ALL_ANYONECANPAY,
            SighashType::NONE_ANYONECANPAY,
            SighashType::SINGLE_ANYONECANPAY,
        ] {
            assert_eq!(sighash(&tx, hash_type, 0), sighash(&modified, hash_type, 0));
        }
        assert_ne!(
            sighash(&tx, SighashType::ALL, 0),
            sighash(&modified, SighashType::ALL, 0)
        );
    }
}

#[test]
fn none_and_single_ignore_other_outputs() {
    for build in [v4_data, v5_data] {
        let tx = build(two_by_two());
        let mut other = two_by_two();
        other.vout[1] = txout(5, 5);
        let modified = build(other);

        assert_eq!(
            sighash(&tx, SighashType::NONE, 0),
            sighash(&modified, SighashType::NONE, 0)
        );
        assert_eq!(
            sighash(&tx, SighashType::SINGLE, 0),
            sighash(&modified, SighashType::SINGLE, 0)
        );
        assert_ne!(
            sighash(&tx, SighashType::SINGLE, 1),
            sighash(&modified, SighashType::SINGLE, 1)
        );
        assert_ne!(
            sighash(&tx, SighashType::ALL, 0),
            sighash(&modified, SighashType::ALL, 0)
        );
    }
}

#[test]
fn single_without_matching_output() {
    for build in [v4_data, v5_data] {
        let mut bundle = two_by_two();
        bundle.vout.truncate(1);
        let tx = build(bundle);

        // Input 1 has no corresponding output, so no outputs are signed.
        let mut bundle = two_by_two();
        bundle.vout.truncate(1);
        bundle.vout[0] = txout(7, 7);
        let modified = build(bundle);

        assert_eq!(
            sighash(&tx, SighashType::SINGLE, 1),
            sighash(&modified, SighashType::SINGLE, 1)
        );
    }
}

#[test]
fn sighash_rejects_bad_inputs() {
    let script_code = Script(data::SCRIPT_CODE.to_vec());
    let input = |index| {
        SignableInput::Transparent(TransparentInput::new(
            SighashType::ALL,
            index,
            &script_code,
            Zatoshis::ZERO,
        ))
    };

    let v5 = v5_data(two_by_two());
    assert_matches!(
        signature_hash(&v5, &input(2), BranchId::Nu5),
        Err(Error::InvariantViolation(_))
    );
    assert_matches!(
        signature_hash(&v5, &input(0), BranchId::Nu6),
        Err(Error::InvariantViolation(_))
    );
    assert!(signature_hash(&v5, &input(1), BranchId::Nu5).is_ok());

    let v4 = v4_data(two_by_two());
    assert_matches!(
        signature_hash(&v4, &input(2), BranchId::Canopy),
        Err(Error::InvariantViolation(_))
    );

    let sprout = TransactionData::Sprout(SproutTx {
        version: 1,
        transparent_bundle: Some(two_by_two()),
        lock_time: 0,
        sprout_bundle: None,
    });
    assert_matches!(
        signature_hash(&sprout, &input(0), BranchId::Sprout),
        Err(Error::UnsupportedVersion { header: 1, .. })
    );
}

#[test]
fn v4_sighash_commits_to_branch() {
    let tx = v4_data(two_by_two());
    let script_code = Script(data::SCRIPT_CODE.to_vec());
    let input = SignableInput::Transparent(TransparentInput::new(
        SighashType::ALL,
        0,
        &script_code,
        Zatoshis::ZERO,
    ));

    assert_ne!(
        signature_hash(&tx, &input, BranchId::Sapling).unwrap(),
        signature_hash(&tx, &input, BranchId::Canopy).unwrap()
    );
}
